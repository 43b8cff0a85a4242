use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use super::engine::{RecommendError, RecommendReviewers};
use super::request::{non_blank, RecommendRequest};
use super::response::RecommendResponse;
use crate::snapshot::SearchTypeRow;

/// Named search preset selecting a role filter and an optional required caller role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchType {
    pub search_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_by_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchTypes {
    types: Vec<SearchType>,
}

impl SearchTypes {
    pub fn new(types: Vec<SearchType>) -> Self {
        Self { types }
    }

    pub fn from_rows(rows: &[SearchTypeRow]) -> Self {
        let types = rows
            .iter()
            .filter(|row| !row.search_type.trim().is_empty())
            .map(|row| SearchType {
                search_type: row.search_type.trim().to_string(),
                title: row
                    .title
                    .clone()
                    .unwrap_or_else(|| row.search_type.trim().to_string()),
                filter_by_role: row.filter_by_role.clone(),
                required_role: row.required_role.clone(),
            })
            .collect();
        Self { types }
    }

    pub fn get(&self, search_type: &str) -> Option<&SearchType> {
        self.types
            .iter()
            .find(|candidate| candidate.search_type == search_type.trim())
    }

    pub fn all(&self) -> &[SearchType] {
        &self.types
    }
}

/// Outcome of checking a caller against a search type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAccess {
    Granted { filter_by_role: Option<String> },
    Forbidden { required_role: String },
    UnknownSearchType(String),
}

/// Error raised by the recommendation service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("at least one of manuscript_no, subject_area, keywords or abstract is required")]
    MissingCriteria,
    #[error(transparent)]
    Recommend(#[from] RecommendError),
}

/// Service wrapping the engine with search types and a response cache.
pub struct RecommendationService {
    engine: Arc<RecommendReviewers>,
    search_types: SearchTypes,
    cache: Mutex<HashMap<RecommendRequest, Arc<RecommendResponse>>>,
    cache_capacity: usize,
}

impl RecommendationService {
    /// A `cache_capacity` of zero disables caching.
    pub fn new(
        engine: Arc<RecommendReviewers>,
        search_types: SearchTypes,
        cache_capacity: usize,
    ) -> Self {
        Self {
            engine,
            search_types,
            cache: Mutex::new(HashMap::new()),
            cache_capacity,
        }
    }

    pub fn engine(&self) -> &RecommendReviewers {
        &self.engine
    }

    pub fn search_types(&self) -> &[SearchType] {
        self.search_types.all()
    }

    pub fn keywords(&self) -> Vec<String> {
        self.engine.get_all_keywords().iter().cloned().collect()
    }

    pub fn subject_areas(&self) -> Vec<String> {
        self.engine.get_all_subject_areas().into_iter().collect()
    }

    pub fn user_roles(&self, email: &str) -> BTreeSet<String> {
        self.engine.get_user_roles_by_email(email)
    }

    /// Resolve the role filter for `search_type`, checking the caller's role when required.
    pub fn authorize(&self, search_type: Option<&str>, email: Option<&str>) -> SearchAccess {
        let Some(name) = non_blank(search_type) else {
            return SearchAccess::Granted {
                filter_by_role: None,
            };
        };

        let Some(search_type) = self.search_types.get(name) else {
            return SearchAccess::UnknownSearchType(name.to_string());
        };

        if let Some(required_role) = search_type.required_role.as_deref() {
            let allowed = non_blank(email)
                .map(|email| self.engine.user_has_role_by_email(email, required_role))
                .unwrap_or(false);
            if !allowed {
                return SearchAccess::Forbidden {
                    required_role: required_role.to_string(),
                };
            }
        }

        SearchAccess::Granted {
            filter_by_role: search_type.filter_by_role.clone(),
        }
    }

    /// Recommend, answering identical requests from the cache.
    pub fn recommend(
        &self,
        request: RecommendRequest,
    ) -> Result<Arc<RecommendResponse>, ServiceError> {
        if !request.has_criteria() {
            return Err(ServiceError::MissingCriteria);
        }

        if let Some(cached) = self.cached(&request) {
            debug!(?request, "serving cached recommendation");
            return Ok(cached);
        }

        let response = Arc::new(self.engine.recommend(&request)?);
        self.store(request, response.clone());
        Ok(response)
    }

    fn cached(&self, request: &RecommendRequest) -> Option<Arc<RecommendResponse>> {
        let cache = self.cache.lock().ok()?;
        cache.get(request).cloned()
    }

    fn store(&self, request: RecommendRequest, response: Arc<RecommendResponse>) {
        if self.cache_capacity == 0 {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            if cache.len() >= self.cache_capacity {
                cache.clear();
            }
            cache.insert(request, response);
        }
    }
}
