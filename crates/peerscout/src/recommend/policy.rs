use crate::config::RecommendationConfig;

/// Engine tunables for similarity cutoffs and early-career handling.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendPolicy {
    /// Restrict manuscript-number searches to the manuscript's own subject areas.
    pub filter_by_subject_area: bool,
    pub similarity_threshold: f64,
    pub max_similar_manuscripts: usize,
    /// Widen the candidate pool with early-career researchers in scope.
    pub early_career_inclusion: bool,
    /// Alternate early-career and other candidates in the final order.
    pub early_career_interleaving: bool,
}

impl Default for RecommendPolicy {
    fn default() -> Self {
        Self {
            filter_by_subject_area: false,
            similarity_threshold: 0.5,
            max_similar_manuscripts: 50,
            early_career_inclusion: true,
            early_career_interleaving: true,
        }
    }
}

impl From<&RecommendationConfig> for RecommendPolicy {
    fn from(config: &RecommendationConfig) -> Self {
        Self {
            filter_by_subject_area: config.filter_by_subject_area,
            similarity_threshold: config.similarity_threshold,
            max_similar_manuscripts: config.max_similar_manuscripts,
            early_career_inclusion: config.early_career_inclusion,
            early_career_interleaving: config.early_career_interleaving,
        }
    }
}
