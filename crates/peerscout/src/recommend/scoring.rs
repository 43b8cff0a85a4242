use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::response::ManuscriptScore;
use crate::domain::VersionId;

/// Blend of keyword and similarity signals, capped at 1.0. Missing similarity counts as 0.
pub fn combined_score(keyword: f64, similarity: Option<f64>) -> f64 {
    (keyword + 0.5 * similarity.unwrap_or(0.0)).min(1.0)
}

pub(crate) fn manuscript_score(
    version_id: VersionId,
    keyword: f64,
    similarity: Option<f64>,
) -> ManuscriptScore {
    ManuscriptScore {
        version_id,
        keyword,
        similarity,
        combined: combined_score(keyword, similarity),
    }
}

/// Scores for every manuscript with a keyword score or a similarity value.
pub(crate) fn combine_manuscript_scores(
    keyword_by_version_id: &BTreeMap<VersionId, f64>,
    similarity_by_version_id: &BTreeMap<VersionId, f64>,
) -> BTreeMap<VersionId, ManuscriptScore> {
    keyword_by_version_id
        .keys()
        .chain(similarity_by_version_id.keys())
        .map(|version_id| {
            let score = manuscript_score(
                version_id.clone(),
                keyword_by_version_id.get(version_id).copied().unwrap_or(0.0),
                similarity_by_version_id.get(version_id).copied(),
            );
            (version_id.clone(), score)
        })
        .collect()
}

/// Descending similarity where a missing value ranks below any present one.
pub(crate) fn similarity_descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub(crate) fn sort_manuscript_scores_descending(scores: &mut [ManuscriptScore]) {
    scores.sort_by(|a, b| {
        b.combined
            .total_cmp(&a.combined)
            .then_with(|| b.keyword.total_cmp(&a.keyword))
            .then_with(|| similarity_descending(a.similarity, b.similarity))
            .then_with(|| a.version_id.cmp(&b.version_id))
    });
}

/// Reviewer-level (keyword, similarity, combined) from the person's direct keyword score
/// and their best manuscript score.
pub(crate) fn reviewer_score(
    person_keyword: Option<f64>,
    best_manuscript: Option<&ManuscriptScore>,
) -> (f64, Option<f64>, f64) {
    let keyword = person_keyword
        .unwrap_or(0.0)
        .max(best_manuscript.map(|score| score.keyword).unwrap_or(0.0));
    let similarity = best_manuscript.and_then(|score| score.similarity);
    (keyword, similarity, combined_score(keyword, similarity))
}
