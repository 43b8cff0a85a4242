use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::{ManuscriptModel, PersonId, VersionId};
use crate::recommend::{
    recommendation_router, PotentialReviewer, RecommendPolicy, RecommendReviewers,
    RecommendationContext, RecommendationService, SearchTypes,
};
use crate::similarity::{SimilarManuscript, SimilarityError, SimilarityOracle};
use crate::snapshot::{
    AuthorRow, DatesNotAvailableRow, ManuscriptKeywordRow, ManuscriptSubjectAreaRow,
    ManuscriptVersionRow, PersonKeywordRow, PersonRoleRow, PersonRow, PersonSubjectAreaRow,
    PotentialReviewerRow, ReviewStatsRow, SearchTypeRow, Snapshot, StageRow, VersionPersonRow,
};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn person_id(id: &str) -> PersonId {
    PersonId::new(id)
}

pub(super) fn version_id(id: &str) -> VersionId {
    VersionId::new(id)
}

fn person(
    id: &str,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
    ecr: bool,
) -> PersonRow {
    PersonRow {
        person_id: person_id(id),
        title: None,
        first_name: first_name.to_string(),
        middle_name: None,
        last_name: last_name.to_string(),
        institution: Some("Institute of Examples".to_string()),
        status: Some("Active".to_string()),
        email: email.map(str::to_string),
        is_early_career_researcher: ecr,
    }
}

fn manuscript(
    id: &str,
    version: u32,
    title: &str,
    abstract_text: Option<&str>,
    decision: Option<&str>,
    decision_date: Option<NaiveDate>,
) -> ManuscriptVersionRow {
    let manuscript_id = id.split('-').next().unwrap_or(id);
    ManuscriptVersionRow {
        version_id: version_id(id),
        manuscript_id: crate::domain::ManuscriptId::new(manuscript_id),
        version: Some(version),
        title: Some(title.to_string()),
        abstract_text: abstract_text.map(str::to_string),
        decision: decision.map(str::to_string),
        manuscript_type: Some("Research Article".to_string()),
        decision_date,
        doi: None,
    }
}

pub(super) fn author(version: &str, person: &str, seq: u32) -> AuthorRow {
    AuthorRow {
        version_id: version_id(version),
        person_id: person_id(person),
        seq: Some(seq),
        is_corresponding_author: seq == 1,
    }
}

pub(super) fn version_person(version: &str, person: &str) -> VersionPersonRow {
    VersionPersonRow {
        version_id: version_id(version),
        person_id: person_id(person),
    }
}

fn keyword(version: &str, keyword: &str) -> ManuscriptKeywordRow {
    ManuscriptKeywordRow {
        version_id: version_id(version),
        keyword: keyword.to_string(),
    }
}

fn subject_area(version: &str, subject_area: &str) -> ManuscriptSubjectAreaRow {
    ManuscriptSubjectAreaRow {
        version_id: version_id(version),
        subject_area: subject_area.to_string(),
    }
}

fn stats(person: &str, reviewed_count: u32, mean: Option<f64>) -> ReviewStatsRow {
    ReviewStatsRow {
        person_id: person_id(person),
        reviewed_count,
        reviewed_duration_min: mean.map(|mean| mean / 2.0),
        reviewed_duration_max: mean.map(|mean| mean * 2.0),
        reviewed_duration_avg: mean,
        awaiting_review_count: 1,
        awaiting_accept_count: 0,
        declined_count: 2,
    }
}

/// Editorial snapshot shared by the engine, service and routing tests.
///
/// Manuscript 10003 is under review (two versions); 10001 and 10002 are published
/// neuroscience papers, 10004 a published ecology paper.
pub(super) fn snapshot() -> Snapshot {
    Snapshot {
        manuscript_versions: vec![
            manuscript(
                "10001-1",
                1,
                "Cortical neurons",
                Some("Cortical neurons fire synchronised bursts during sleep"),
                Some("Accept Full Submission"),
                Some(date(2022, 1, 1)),
            ),
            manuscript(
                "10002-1",
                1,
                "Synaptic plasticity",
                Some("Synaptic plasticity of cortical neurons during sleep"),
                Some("Accept Full Submission"),
                Some(date(2023, 3, 1)),
            ),
            manuscript(
                "10003-1",
                1,
                "Sleep and synapses (draft)",
                None,
                Some("Revise Full Submission"),
                None,
            ),
            manuscript(
                "10003-2",
                2,
                "Sleep and synapses",
                Some("Synaptic bursts of cortical neurons in sleep"),
                None,
                None,
            ),
            manuscript(
                "10004-1",
                1,
                "Alpine soil microbiome",
                Some("Soil microbiome diversity across alpine meadows"),
                Some("Auto-Accept"),
                Some(date(2021, 7, 1)),
            ),
        ],
        persons: vec![
            person("author1", "Alice", "Author", Some("alice@example.org"), false),
            person("author2", "Bob", "Builder", Some("bob@example.org"), false),
            person("reviewer1", "Carol", "Critic", Some("carol@example.org"), false),
            person("editor1", "Dan", "Editor", Some("editor@example.org"), false),
            person("senior1", "Sam", "Senior", None, false),
            person("submitter", "Sue", "Submitter", None, false),
            person("suggested1", "Pat", "Pending", None, false),
            person("keyword_person", "Kim", "Keyword", None, false),
            person("ecologist", "Olive", "Oak", None, false),
            person("ecr1", "Erin", "Early", None, true),
            person("ecr2", "Evan", "Eager", None, true),
        ],
        manuscript_authors: vec![
            author("10001-1", "author1", 1),
            author("10002-1", "author2", 1),
            author("10003-2", "submitter", 1),
            author("10003-2", "author1", 2),
            author("10004-1", "ecologist", 1),
        ],
        manuscript_editors: vec![version_person("10003-2", "editor1")],
        manuscript_senior_editors: vec![version_person("10003-2", "senior1")],
        manuscript_stages: vec![StageRow {
            version_id: version_id("10002-1"),
            person_id: person_id("reviewer1"),
            stage_name: "Review Received".to_string(),
        }],
        manuscript_keywords: vec![
            keyword("10001-1", "neurons"),
            keyword("10002-1", "Neurons"),
            keyword("10002-1", "synapse"),
            keyword("10003-2", "synapse"),
            keyword("10003-2", "sleep"),
            keyword("10004-1", "soil"),
        ],
        person_keywords: vec![PersonKeywordRow {
            person_id: person_id("keyword_person"),
            keyword: "neurons".to_string(),
            score: Some(0.6),
        }],
        manuscript_subject_areas: vec![
            subject_area("10001-1", "Neuroscience"),
            subject_area("10002-1", "Neuroscience"),
            subject_area("10003-2", "Neuroscience"),
            subject_area("10004-1", "Ecology"),
        ],
        person_subject_areas: vec![
            PersonSubjectAreaRow {
                person_id: person_id("ecr1"),
                subject_area: "neuroscience".to_string(),
            },
            PersonSubjectAreaRow {
                person_id: person_id("ecr2"),
                subject_area: "Ecology".to_string(),
            },
            PersonSubjectAreaRow {
                person_id: person_id("author2"),
                subject_area: "Neuroscience".to_string(),
            },
        ],
        person_roles: vec![
            PersonRoleRow {
                person_id: person_id("author2"),
                role: "Reviewing Editor".to_string(),
            },
            PersonRoleRow {
                person_id: person_id("reviewer1"),
                role: "Reviewing Editor".to_string(),
            },
            PersonRoleRow {
                person_id: person_id("editor1"),
                role: "Senior Editor".to_string(),
            },
        ],
        person_memberships: Vec::new(),
        person_dates_not_available: vec![
            DatesNotAvailableRow {
                person_id: person_id("author2"),
                start_date: Some(date(2019, 12, 1)),
                end_date: date(2020, 1, 1),
            },
            DatesNotAvailableRow {
                person_id: person_id("author2"),
                start_date: None,
                end_date: date(2030, 1, 1),
            },
        ],
        person_review_stats_overall: vec![
            stats("author1", 3, Some(10.0)),
            stats("author2", 2, Some(20.0)),
            stats("reviewer1", 0, None),
        ],
        person_review_stats_last12m: Vec::new(),
        manuscript_potential_reviewers: vec![PotentialReviewerRow {
            version_id: version_id("10003-2"),
            person_id: person_id("suggested1"),
            status: Some("Invited".to_string()),
            suggested_to_exclude: false,
        }],
        search_types: vec![
            SearchTypeRow {
                search_type: "reviewing-editor".to_string(),
                title: Some("Reviewing Editor".to_string()),
                filter_by_role: Some("Reviewing Editor".to_string()),
                required_role: None,
            },
            SearchTypeRow {
                search_type: "senior-editor-only".to_string(),
                title: None,
                filter_by_role: None,
                required_role: Some("Senior Editor".to_string()),
            },
        ],
    }
}

pub(super) fn context() -> Arc<RecommendationContext> {
    context_for(&snapshot())
}

pub(super) fn context_for(snapshot: &Snapshot) -> Arc<RecommendationContext> {
    Arc::new(RecommendationContext::build(
        snapshot,
        &ManuscriptModel::default(),
        today(),
    ))
}

/// Oracle returning a fixed table and recording which lookup was used.
#[derive(Default)]
pub(super) struct FixedSimilarity {
    rows: Vec<SimilarManuscript>,
    calls: Mutex<Vec<String>>,
}

impl FixedSimilarity {
    pub(super) fn new(rows: &[(&str, f64)]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|(id, similarity)| SimilarManuscript {
                    version_id: version_id(id),
                    similarity: *similarity,
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex").clone()
    }
}

impl SimilarityOracle for FixedSimilarity {
    fn find_similar_manuscripts(
        &self,
        version_ids: &BTreeSet<VersionId>,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        let ids: Vec<&str> = version_ids.iter().map(VersionId::as_str).collect();
        self.calls
            .lock()
            .expect("calls mutex")
            .push(format!("manuscripts:{}", ids.join(",")));
        Ok(self.rows.clone())
    }

    fn find_similar_manuscripts_to_abstract(
        &self,
        text: &str,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        self.calls
            .lock()
            .expect("calls mutex")
            .push(format!("abstract:{text}"));
        Ok(self.rows.clone())
    }
}

pub(super) struct FailingSimilarity;

impl SimilarityOracle for FailingSimilarity {
    fn find_similar_manuscripts(
        &self,
        _version_ids: &BTreeSet<VersionId>,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        Err(SimilarityError::Unavailable("model offline".to_string()))
    }

    fn find_similar_manuscripts_to_abstract(
        &self,
        _text: &str,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        Err(SimilarityError::Unavailable("model offline".to_string()))
    }
}

pub(super) fn engine() -> RecommendReviewers {
    engine_with(Arc::new(FixedSimilarity::default()), RecommendPolicy::default())
}

pub(super) fn engine_with(
    similarity: Arc<dyn SimilarityOracle>,
    policy: RecommendPolicy,
) -> RecommendReviewers {
    RecommendReviewers::new(context(), similarity, policy)
}

pub(super) fn build_service(cache_capacity: usize) -> RecommendationService {
    RecommendationService::new(
        Arc::new(engine()),
        SearchTypes::from_rows(&snapshot().search_types),
        cache_capacity,
    )
}

pub(super) fn router_with_service(service: RecommendationService) -> axum::Router {
    recommendation_router(Arc::new(service))
}

pub(super) fn reviewer_ids(reviewers: &[PotentialReviewer]) -> Vec<&str> {
    reviewers
        .iter()
        .map(|reviewer| reviewer.person_id.as_str())
        .collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
