use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of one submitted or revised iteration of a manuscript.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub String);

impl VersionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Manuscript number shared by all versions of a submission.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManuscriptId(pub String);

impl ManuscriptId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a person is attached to a manuscript version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Author,
    Editor,
    SeniorEditor,
    ReviewerHistory,
    AssignedPotentialReviewer,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 5] = [
        RelationshipType::Author,
        RelationshipType::Editor,
        RelationshipType::SeniorEditor,
        RelationshipType::ReviewerHistory,
        RelationshipType::AssignedPotentialReviewer,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RelationshipType::Author => "author",
            RelationshipType::Editor => "editor",
            RelationshipType::SeniorEditor => "senior_editor",
            RelationshipType::ReviewerHistory => "reviewer_history",
            RelationshipType::AssignedPotentialReviewer => "assigned_potential_reviewer",
        }
    }
}

/// Workflow stage names the engine looks up by default.
pub mod stage_names {
    pub const REVIEW_RECEIVED: &str = "Review Received";
}

/// Rules deciding which versions count as valid and which as published.
///
/// An empty list accepts any value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManuscriptModel {
    pub valid_decisions: Vec<String>,
    pub valid_manuscript_types: Vec<String>,
    pub published_decisions: Vec<String>,
    pub published_manuscript_types: Vec<String>,
}

impl Default for ManuscriptModel {
    fn default() -> Self {
        Self {
            valid_decisions: Vec::new(),
            valid_manuscript_types: Vec::new(),
            published_decisions: vec![
                "Accept Full Submission".to_string(),
                "Auto-Accept".to_string(),
            ],
            published_manuscript_types: Vec::new(),
        }
    }
}

impl ManuscriptModel {
    pub fn is_valid(&self, decision: Option<&str>, manuscript_type: Option<&str>) -> bool {
        accepts(&self.valid_decisions, decision)
            && accepts(&self.valid_manuscript_types, manuscript_type)
    }

    pub fn is_published(&self, decision: Option<&str>, manuscript_type: Option<&str>) -> bool {
        self.is_valid(decision, manuscript_type)
            && accepts(&self.published_decisions, decision)
            && accepts(&self.published_manuscript_types, manuscript_type)
    }
}

fn accepts(allowed: &[String], value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match value {
        Some(value) => allowed
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(value.trim())),
        None => false,
    }
}

/// Aggregated review turnaround for a person in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDuration {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub count: u32,
}

/// Review activity counters for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    #[serde(rename = "review-duration", skip_serializing_if = "Option::is_none")]
    pub review_duration: Option<ReviewDuration>,
    pub reviews_in_progress: u32,
    pub waiting_to_be_accepted: u32,
    pub declined: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonStats {
    pub overall: Option<ReviewStats>,
    pub last_12m: Option<ReviewStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub member_type: String,
    pub member_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
}

/// A person as rendered in recommendation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: PersonId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_early_career_researcher: bool,
    pub memberships: Vec<Membership>,
    pub dates_not_available: Vec<DateRange>,
    pub stats: PersonStats,
}

impl Person {
    /// Mean overall review duration, when the person has completed reviews.
    pub fn mean_review_duration(&self) -> Option<f64> {
        self.stats
            .overall
            .as_ref()
            .and_then(|stats| stats.review_duration.as_ref())
            .and_then(|duration| duration.mean)
    }
}

/// Person attached to a manuscript. `person` is `None` when the id has no person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonReference {
    pub person_id: PersonId,
    pub person: Option<Person>,
}

/// Author entry on a manuscript, carrying author-only attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub person_id: PersonId,
    pub person: Option<Person>,
    pub is_corresponding_author: bool,
}
