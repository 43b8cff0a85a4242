use crate::domain::RelationshipType;

/// Typed arguments for one recommendation call.
///
/// Requests are `Hash + Eq` so identical calls can be served from the response cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RecommendRequest {
    pub manuscript_no: Option<String>,
    pub subject_area: Option<String>,
    /// Comma separated keyword list.
    pub keywords: Option<String>,
    pub abstract_text: Option<String>,
    pub role: Option<String>,
    pub limit: Option<usize>,
    /// Relationship types used for candidate discovery; defaults to authorship.
    pub relationship_types: Option<Vec<RelationshipType>>,
    /// Workflow stages used for candidate discovery; defaults to "Review Received".
    pub stage_names: Option<Vec<String>>,
}

impl RecommendRequest {
    pub fn by_manuscript_no(manuscript_no: impl Into<String>) -> Self {
        Self {
            manuscript_no: Some(manuscript_no.into()),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The manuscript number when it is present and not blank.
    pub fn manuscript_no(&self) -> Option<&str> {
        non_blank(self.manuscript_no.as_deref())
    }

    /// True when any of manuscript number, subject area, keywords or abstract is given.
    pub fn has_criteria(&self) -> bool {
        self.manuscript_no().is_some()
            || non_blank(self.subject_area.as_deref()).is_some()
            || non_blank(self.keywords.as_deref()).is_some()
            || non_blank(self.abstract_text.as_deref()).is_some()
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Split a comma separated keyword string, trimming each entry.
pub(crate) fn parse_keywords(keywords: Option<&str>) -> Vec<String> {
    match non_blank(keywords) {
        Some(keywords) => keywords
            .split(',')
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}
