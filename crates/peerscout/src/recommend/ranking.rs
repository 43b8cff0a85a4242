use std::cmp::Ordering;

use super::response::PotentialReviewer;
use super::scoring::similarity_descending;

/// Order candidates by score, then review speed, then name.
///
/// Candidates without a mean review duration are ranked as if they had the mean of all
/// candidates that do.
pub(crate) fn sort_potential_reviewers(reviewers: &mut [PotentialReviewer]) {
    let durations: Vec<f64> = reviewers
        .iter()
        .filter_map(mean_review_duration)
        .collect();
    let population_mean = if durations.is_empty() {
        None
    } else {
        Some(durations.iter().sum::<f64>() / durations.len() as f64)
    };

    let duration_or_mean =
        |reviewer: &PotentialReviewer| mean_review_duration(reviewer).or(population_mean);

    reviewers.sort_by(|a, b| {
        b.scores
            .combined
            .total_cmp(&a.scores.combined)
            .then_with(|| b.scores.keyword.total_cmp(&a.scores.keyword))
            .then_with(|| similarity_descending(a.scores.similarity, b.scores.similarity))
            .then_with(|| compare_duration(duration_or_mean(a), duration_or_mean(b)))
            .then_with(|| first_name(a).cmp(first_name(b)))
            .then_with(|| last_name(a).cmp(last_name(b)))
            .then_with(|| a.person_id.cmp(&b.person_id))
    });
}

/// Alternate other candidates and early-career researchers, others first.
///
/// Each group keeps its relative order; the longer group fills the tail.
pub(crate) fn interleave_early_career(reviewers: Vec<PotentialReviewer>) -> Vec<PotentialReviewer> {
    let (early_career, others): (Vec<_>, Vec<_>) = reviewers
        .into_iter()
        .partition(PotentialReviewer::is_early_career_researcher);

    let mut result = Vec::with_capacity(early_career.len() + others.len());
    let mut others = others.into_iter();
    let mut early_career = early_career.into_iter();
    loop {
        match (others.next(), early_career.next()) {
            (None, None) => break,
            (other, early) => {
                result.extend(other);
                result.extend(early);
            }
        }
    }
    result
}

fn mean_review_duration(reviewer: &PotentialReviewer) -> Option<f64> {
    reviewer
        .person
        .as_ref()
        .and_then(|person| person.mean_review_duration())
}

fn compare_duration(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn first_name(reviewer: &PotentialReviewer) -> &str {
    reviewer
        .person
        .as_ref()
        .map(|person| person.first_name.as_str())
        .unwrap_or("")
}

fn last_name(reviewer: &PotentialReviewer) -> &str {
    reviewer
        .person
        .as_ref()
        .map(|person| person.last_name.as_str())
        .unwrap_or("")
}
