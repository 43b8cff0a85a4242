use super::common::*;
use crate::recommend::router::{recommend_handler, user_roles_handler};
use crate::recommend::{
    RecommendPolicy, RecommendQuery, RecommendationService, SearchTypes, USER_EMAIL_HEADER,
};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use crate::domain::VersionId;
use crate::similarity::{SimilarManuscript, SimilarityError, SimilarityOracle};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, email: &str) -> Request<Body> {
    Request::get(uri)
        .header(USER_EMAIL_HEADER, email)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn recommend_without_criteria_is_bad_request() {
    let router = router_with_service(build_service(0));

    let response = router
        .oneshot(get("/api/v1/recommend-reviewers"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("manuscript_no"));
}

#[tokio::test]
async fn unknown_manuscript_number_returns_not_found_payload() {
    let router = router_with_service(build_service(0));

    let response = router
        .oneshot(get("/api/v1/recommend-reviewers?manuscript_no=99999"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json_body(response).await,
        json!({
            "manuscripts_not_found": ["99999"],
            "matching_manuscripts": [],
            "potential_reviewers": [],
        })
    );
}

#[tokio::test]
async fn keyword_query_returns_ranked_reviewers() {
    let router = router_with_service(build_service(0));

    let response = router
        .oneshot(get("/api/v1/recommend-reviewers?keywords=neurons&limit=3"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let ids: Vec<&str> = payload["potential_reviewers"]
        .as_array()
        .expect("reviewers array")
        .iter()
        .filter_map(|reviewer| reviewer["person_id"].as_str())
        .collect();
    assert_eq!(ids, vec!["author1", "ecr1", "reviewer1"]);
    assert_eq!(payload["search"]["keywords"], json!(["neurons"]));
}

#[tokio::test]
async fn unknown_search_type_is_bad_request() {
    let router = router_with_service(build_service(0));

    let response = router
        .oneshot(get(
            "/api/v1/recommend-reviewers?manuscript_no=10003&search_type=bogus",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_type_requiring_role_is_forbidden_without_it() {
    let router = router_with_service(build_service(0));

    let response = router
        .oneshot(get_as(
            "/api/v1/recommend-reviewers?keywords=neurons&search_type=senior-editor-only",
            "bob@example.org",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn search_type_requiring_role_is_allowed_with_it() {
    let router = router_with_service(build_service(0));

    let response = router
        .oneshot(get_as(
            "/api/v1/recommend-reviewers?keywords=neurons&search_type=senior-editor-only",
            "editor@example.org",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_type_applies_its_role_filter() {
    let service = Arc::new(build_service(0));
    let query = RecommendQuery {
        keywords: Some("neurons".to_string()),
        search_type: Some("reviewing-editor".to_string()),
        ..RecommendQuery::default()
    };

    let response = recommend_handler(State(service), HeaderMap::new(), Query(query)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let ids: Vec<&str> = payload["potential_reviewers"]
        .as_array()
        .expect("reviewers array")
        .iter()
        .filter_map(|reviewer| reviewer["person_id"].as_str())
        .collect();
    assert_eq!(ids, vec!["author2", "reviewer1"]);
}

/// Oracle remembering which threads ran its lookups.
#[derive(Default)]
struct ThreadRecordingSimilarity {
    threads: Mutex<Vec<ThreadId>>,
}

impl ThreadRecordingSimilarity {
    fn record(&self) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        self.threads
            .lock()
            .expect("threads mutex")
            .push(thread::current().id());
        Ok(Vec::new())
    }
}

impl SimilarityOracle for ThreadRecordingSimilarity {
    fn find_similar_manuscripts(
        &self,
        _version_ids: &BTreeSet<VersionId>,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        self.record()
    }

    fn find_similar_manuscripts_to_abstract(
        &self,
        _text: &str,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        self.record()
    }
}

#[tokio::test]
async fn similarity_lookups_run_off_the_request_thread() {
    let oracle = Arc::new(ThreadRecordingSimilarity::default());
    let engine = engine_with(oracle.clone(), RecommendPolicy::default());
    let service = RecommendationService::new(Arc::new(engine), SearchTypes::default(), 0);
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/recommend-reviewers?abstract=sleep"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let threads = oracle.threads.lock().expect("threads mutex").clone();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0], thread::current().id());
}

#[tokio::test]
async fn oracle_failure_is_bad_gateway() {
    let engine = engine_with(Arc::new(FailingSimilarity), RecommendPolicy::default());
    let service = RecommendationService::new(Arc::new(engine), SearchTypes::default(), 0);
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/recommend-reviewers?keywords=neurons"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("model offline"));
}

#[tokio::test]
async fn reference_endpoints_list_keywords_subject_areas_and_search_types() {
    let router = router_with_service(build_service(0));

    let response = router
        .clone()
        .oneshot(get("/api/v1/subject-areas"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json_body(response).await,
        json!(["Ecology", "Neuroscience"])
    );

    let response = router.clone().oneshot(get("/api/v1/keywords")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let keywords = read_json_body(response).await;
    assert!(keywords
        .as_array()
        .expect("keywords array")
        .contains(&json!("synapse")));

    let response = router.oneshot(get("/api/v1/search-types")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json_body(response).await,
        json!([
            {
                "search_type": "reviewing-editor",
                "title": "Reviewing Editor",
                "filter_by_role": "Reviewing Editor",
            },
            {
                "search_type": "senior-editor-only",
                "title": "senior-editor-only",
                "required_role": "Senior Editor",
            },
        ])
    );
}

#[tokio::test]
async fn user_roles_requires_caller_email() {
    let service = Arc::new(build_service(0));

    let response = user_roles_handler(State(service.clone()), HeaderMap::new()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut headers = HeaderMap::new();
    headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("bob@example.org"));
    let response = user_roles_handler(State(service), headers).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json_body(response).await,
        json!({ "email": "bob@example.org", "roles": ["Reviewing Editor"] })
    );
}
