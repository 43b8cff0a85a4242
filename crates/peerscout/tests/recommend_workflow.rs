use std::sync::Arc;

use chrono::NaiveDate;
use peerscout::domain::ManuscriptModel;
use peerscout::recommend::{
    RecommendPolicy, RecommendRequest, RecommendReviewers, RecommendationContext,
    RecommendationService, SearchAccess, SearchTypes,
};
use peerscout::similarity::{NoSimilarity, SimilarityOracle, TermSimilarity};
use peerscout::snapshot::{Snapshot, SnapshotLoader};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn snapshot() -> Snapshot {
    SnapshotLoader::from_dir(FIXTURES).expect("fixtures load")
}

fn build_engine(snapshot: &Snapshot, similarity: Arc<dyn SimilarityOracle>) -> RecommendReviewers {
    let today = NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date");
    let context = RecommendationContext::build(snapshot, &ManuscriptModel::default(), today);
    RecommendReviewers::new(Arc::new(context), similarity, RecommendPolicy::default())
}

fn ids(engine: &RecommendReviewers, request: &RecommendRequest) -> Vec<String> {
    engine
        .recommend(request)
        .expect("recommendation succeeds")
        .potential_reviewers
        .iter()
        .map(|reviewer| reviewer.person_id.as_str().to_string())
        .collect()
}

#[test]
fn manuscript_recommendation_from_csv_snapshot() {
    let snapshot = snapshot();
    let engine = build_engine(&snapshot, Arc::new(NoSimilarity));

    let response = engine
        .recommend(&RecommendRequest::by_manuscript_no("20003"))
        .expect("recommendation succeeds");

    let matching = response.matching_manuscripts.expect("matching manuscripts");
    assert_eq!(matching[0].version_id.as_str(), "20003-1");
    assert_eq!(matching[0].subject_areas.len(), 1);

    let ids: Vec<&str> = response
        .potential_reviewers
        .iter()
        .map(|reviewer| reviewer.person_id.as_str())
        .collect();
    assert_eq!(ids, vec!["p1", "p4", "p2"]);

    let ada = &response.potential_reviewers[0];
    assert_eq!(ada.scores.keyword, 1.0);
    assert_eq!(ada.scores.combined, 1.0);
    assert_eq!(ada.author_of_manuscripts.len(), 1);
    let latest = &ada.author_of_manuscripts[0];
    assert_eq!(latest.version_id.as_str(), "20001-2");
    assert_eq!(latest.doi.as_deref(), Some("10.7554/eLife.20001"));
    assert_eq!(latest.alternatives.len(), 1);
    assert_eq!(latest.alternatives[0].version_id.as_str(), "20001-1");
    assert_eq!(ada.scores.by_manuscript.len(), 1);
    assert_eq!(ada.scores.by_manuscript[0].version_id.as_str(), "20001-2");

    let grace = &response.potential_reviewers[2];
    assert_eq!(grace.scores.keyword, 0.5);
    assert_eq!(
        grace
            .person
            .as_ref()
            .and_then(|person| person.mean_review_duration()),
        Some(30.0)
    );
}

#[test]
fn manuscript_authors_and_editors_are_not_recommended() {
    let snapshot = snapshot();
    let engine = build_engine(&snapshot, Arc::new(NoSimilarity));

    let ids = ids(&engine, &RecommendRequest::by_manuscript_no("20003"));

    assert!(!ids.contains(&"p3".to_string()), "author of the manuscript");
    assert!(!ids.contains(&"p5".to_string()), "editor of the manuscript");
}

#[test]
fn stage_history_surfaces_past_reviewers() {
    let snapshot = snapshot();
    let engine = build_engine(&snapshot, Arc::new(NoSimilarity));
    let request = RecommendRequest {
        keywords: Some("memory".to_string()),
        ..RecommendRequest::default()
    };

    let ids = ids(&engine, &request);

    assert!(ids.contains(&"p2".to_string()), "author of the matching paper");
    assert!(ids.contains(&"p3".to_string()), "reviewer of the matching paper");
    assert!(
        !ids.contains(&"p1".to_string()),
        "invited reviewers without a received review"
    );
}

#[test]
fn abstract_search_uses_term_similarity() {
    let snapshot = snapshot();
    let oracle = TermSimilarity::from_snapshot(&snapshot, &ManuscriptModel::default());
    let engine = build_engine(&snapshot, Arc::new(oracle));
    let request = RecommendRequest {
        abstract_text: Some("Hippocampal replay during sleep consolidates memory".to_string()),
        ..RecommendRequest::default()
    };

    let response = engine.recommend(&request).expect("recommendation succeeds");

    let first = &response.potential_reviewers[0];
    assert_eq!(first.person_id.as_str(), "p1");
    let similarity = first.scores.similarity.expect("similarity present");
    assert!(similarity > 0.99, "similarity was {similarity}");
    assert!(response
        .potential_reviewers
        .iter()
        .any(|reviewer| reviewer.is_early_career_researcher()));
}

#[test]
fn service_applies_search_types_from_snapshot() {
    let snapshot = snapshot();
    let engine = Arc::new(build_engine(&snapshot, Arc::new(NoSimilarity)));
    let service =
        RecommendationService::new(engine, SearchTypes::from_rows(&snapshot.search_types), 16);

    assert_eq!(
        service.authorize(Some("senior-editor"), Some("kurt@example.org")),
        SearchAccess::Granted {
            filter_by_role: None
        }
    );
    assert!(matches!(
        service.authorize(Some("senior-editor"), Some("ada@example.org")),
        SearchAccess::Forbidden { .. }
    ));

    let SearchAccess::Granted { filter_by_role } =
        service.authorize(Some("reviewing-editor"), None)
    else {
        panic!("reviewing editor search is open to everyone");
    };
    let request = RecommendRequest {
        role: filter_by_role,
        ..RecommendRequest::by_manuscript_no("20003")
    };
    let response = service.recommend(request).expect("recommendation succeeds");
    let ids: Vec<&str> = response
        .potential_reviewers
        .iter()
        .map(|reviewer| reviewer.person_id.as_str())
        .collect();
    assert_eq!(ids, vec!["p2"]);
}
