use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Author, ManuscriptId, Person, PersonId, PersonReference, VersionId};

/// Externally visible manuscript version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManuscriptView {
    pub version_id: VersionId,
    pub manuscript_id: ManuscriptId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manuscript_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    pub authors: Vec<Author>,
    pub senior_editors: Vec<PersonReference>,
    pub subject_areas: BTreeSet<String>,
    pub is_published: bool,
    /// Other versions sharing this title.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<ManuscriptView>,
}

/// Score of one manuscript against the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManuscriptScore {
    pub version_id: VersionId,
    pub keyword: f64,
    pub similarity: Option<f64>,
    pub combined: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewerScores {
    pub keyword: f64,
    pub similarity: Option<f64>,
    pub combined: f64,
    pub by_manuscript: Vec<ManuscriptScore>,
}

/// Prior potential-reviewer assignment on the queried manuscript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub version_id: VersionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub excluded: bool,
}

/// Ranked candidate in a recommendation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PotentialReviewer {
    pub person_id: PersonId,
    /// `None` when the id has no person record in the snapshot.
    pub person: Option<Person>,
    pub author_of_manuscripts: Vec<ManuscriptView>,
    pub scores: ReviewerScores,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<Assignment>,
}

impl PotentialReviewer {
    pub fn is_early_career_researcher(&self) -> bool {
        self.person
            .as_ref()
            .map(|person| person.is_early_career_researcher)
            .unwrap_or(false)
    }
}

/// Effective free-text criteria echoed back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchEcho {
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub subject_areas: BTreeSet<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manuscripts_not_found: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_manuscripts: Option<Vec<ManuscriptView>>,
    pub potential_reviewers: Vec<PotentialReviewer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchEcho>,
}

impl RecommendResponse {
    pub(crate) fn manuscript_not_found(manuscript_no: &str) -> Self {
        Self {
            manuscripts_not_found: Some(vec![manuscript_no.to_string()]),
            matching_manuscripts: Some(Vec::new()),
            potential_reviewers: Vec::new(),
            search: None,
        }
    }
}
