//! Text similarity lookups used to find manuscripts close to a query.

mod terms;

pub use terms::TermSimilarity;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::VersionId;

/// One row of a similarity table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarManuscript {
    pub version_id: VersionId,
    pub similarity: f64,
}

/// Error enumeration for similarity backends.
#[derive(Debug, thiserror::Error)]
pub enum SimilarityError {
    #[error("similarity backend unavailable: {0}")]
    Unavailable(String),
    #[error("similarity backend returned invalid score {score} for version {version_id}")]
    InvalidScore { version_id: VersionId, score: f64 },
}

/// Similarity backend consulted by the recommendation engine.
///
/// A request calls exactly one of the two lookups. Failures are not retried.
pub trait SimilarityOracle: Send + Sync {
    /// Other manuscripts similar to any of `version_ids`.
    fn find_similar_manuscripts(
        &self,
        version_ids: &BTreeSet<VersionId>,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError>;

    fn find_similar_manuscripts_to_abstract(
        &self,
        text: &str,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError>;
}

/// Backend used when similarity search is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSimilarity;

impl SimilarityOracle for NoSimilarity {
    fn find_similar_manuscripts(
        &self,
        _version_ids: &BTreeSet<VersionId>,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        Ok(Vec::new())
    }

    fn find_similar_manuscripts_to_abstract(
        &self,
        _text: &str,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        Ok(Vec::new())
    }
}
