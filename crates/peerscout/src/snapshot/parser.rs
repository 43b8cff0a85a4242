use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::domain::{ManuscriptId, PersonId, VersionId};

pub(crate) fn parse_rows<T, R>(reader: R) -> Result<Vec<T>, csv::Error>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader.deserialize::<T>().collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManuscriptVersionRow {
    pub version_id: VersionId,
    pub manuscript_id: ManuscriptId,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", default, deserialize_with = "empty_string_as_none")]
    pub abstract_text: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub decision: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub manuscript_type: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub decision_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub doi: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonRow {
    pub person_id: PersonId,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_early_career_researcher: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorRow {
    pub version_id: VersionId,
    pub person_id: PersonId,
    #[serde(default)]
    pub seq: Option<u32>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_corresponding_author: bool,
}

/// Editor and senior editor tables share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionPersonRow {
    pub version_id: VersionId,
    pub person_id: PersonId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageRow {
    pub version_id: VersionId,
    pub person_id: PersonId,
    pub stage_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManuscriptKeywordRow {
    pub version_id: VersionId,
    pub keyword: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonKeywordRow {
    pub person_id: PersonId,
    pub keyword: String,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManuscriptSubjectAreaRow {
    pub version_id: VersionId,
    pub subject_area: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonSubjectAreaRow {
    pub person_id: PersonId,
    pub subject_area: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonRoleRow {
    pub person_id: PersonId,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembershipRow {
    pub person_id: PersonId,
    pub member_type: String,
    pub member_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatesNotAvailableRow {
    pub person_id: PersonId,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "required_date")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewStatsRow {
    pub person_id: PersonId,
    #[serde(default, deserialize_with = "count")]
    pub reviewed_count: u32,
    #[serde(default)]
    pub reviewed_duration_min: Option<f64>,
    #[serde(default)]
    pub reviewed_duration_max: Option<f64>,
    #[serde(default)]
    pub reviewed_duration_avg: Option<f64>,
    #[serde(default, deserialize_with = "count")]
    pub awaiting_review_count: u32,
    #[serde(default, deserialize_with = "count")]
    pub awaiting_accept_count: u32,
    #[serde(default, deserialize_with = "count")]
    pub declined_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PotentialReviewerRow {
    pub version_id: VersionId,
    pub person_id: PersonId,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub suggested_to_exclude: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchTypeRow {
    pub search_type: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub filter_by_role: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub required_role: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "n" | "0" => Ok(false),
        "true" | "yes" | "y" | "1" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "'{other}' is not a recognised boolean"
        ))),
    }
}

fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<u32>().map_err(serde::de::Error::custom)
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("'{value}' is not a date"))),
    }
}

fn required_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(raw.trim())
        .ok_or_else(|| serde::de::Error::custom(format!("'{raw}' is not a date")))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc().date());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
