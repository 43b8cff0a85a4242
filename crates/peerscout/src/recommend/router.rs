use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::request::RecommendRequest;
use super::service::{RecommendationService, SearchAccess, ServiceError};

/// Header carrying the authenticated caller's e-mail address.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Query parameters accepted by the recommendation endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendQuery {
    pub manuscript_no: Option<String>,
    pub subject_area: Option<String>,
    pub keywords: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub limit: Option<usize>,
    pub search_type: Option<String>,
}

/// Router builder exposing keyword, subject area, search type and recommendation endpoints.
pub fn recommendation_router(service: Arc<RecommendationService>) -> Router {
    Router::new()
        .route("/api/v1/keywords", get(keywords_handler))
        .route("/api/v1/subject-areas", get(subject_areas_handler))
        .route("/api/v1/search-types", get(search_types_handler))
        .route("/api/v1/recommend-reviewers", get(recommend_handler))
        .route("/api/v1/user/roles", get(user_roles_handler))
        .with_state(service)
}

pub(crate) async fn keywords_handler(
    State(service): State<Arc<RecommendationService>>,
) -> Response {
    (StatusCode::OK, axum::Json(service.keywords())).into_response()
}

pub(crate) async fn subject_areas_handler(
    State(service): State<Arc<RecommendationService>>,
) -> Response {
    (StatusCode::OK, axum::Json(service.subject_areas())).into_response()
}

pub(crate) async fn search_types_handler(
    State(service): State<Arc<RecommendationService>>,
) -> Response {
    (StatusCode::OK, axum::Json(service.search_types().to_vec())).into_response()
}

pub(crate) async fn recommend_handler(
    State(service): State<Arc<RecommendationService>>,
    headers: HeaderMap,
    Query(query): Query<RecommendQuery>,
) -> Response {
    let email = caller_email(&headers);

    let role = match service.authorize(query.search_type.as_deref(), email) {
        SearchAccess::Granted { filter_by_role } => filter_by_role,
        SearchAccess::Forbidden { required_role } => {
            let payload = json!({
                "error": format!("search type requires role '{required_role}'"),
            });
            return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
        }
        SearchAccess::UnknownSearchType(search_type) => {
            let payload = json!({
                "error": format!("unknown search type '{search_type}'"),
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let request = RecommendRequest {
        manuscript_no: query.manuscript_no,
        subject_area: query.subject_area,
        keywords: query.keywords,
        abstract_text: query.abstract_text,
        role,
        limit: query.limit,
        relationship_types: None,
        stage_names: None,
    };

    // Similarity lookups may be slow; keep them off the async workers.
    let worker = Arc::clone(&service);
    let outcome = tokio::task::spawn_blocking(move || worker.recommend(request)).await;

    match outcome {
        Ok(Ok(response)) => (StatusCode::OK, axum::Json(response.as_ref())).into_response(),
        Ok(Err(ServiceError::MissingCriteria)) => {
            let payload = json!({
                "error": ServiceError::MissingCriteria.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
        Ok(Err(other)) => {
            warn!(error = %other, "recommendation failed");
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        Err(join_error) => {
            warn!(error = %join_error, "recommendation task aborted");
            let payload = json!({
                "error": "recommendation task aborted",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn user_roles_handler(
    State(service): State<Arc<RecommendationService>>,
    headers: HeaderMap,
) -> Response {
    match caller_email(&headers) {
        Some(email) => {
            let payload = json!({
                "email": email,
                "roles": service.user_roles(email),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        None => {
            let payload = json!({
                "error": format!("missing {USER_EMAIL_HEADER} header"),
            });
            (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
        }
    }
}

fn caller_email(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
}
