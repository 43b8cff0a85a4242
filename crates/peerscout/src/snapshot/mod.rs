//! Tabular snapshot of the editorial database, read from a directory of CSV extracts.

pub(crate) mod normalizer;
mod parser;

pub use parser::{
    AuthorRow, DatesNotAvailableRow, ManuscriptKeywordRow, ManuscriptSubjectAreaRow,
    ManuscriptVersionRow, MembershipRow, PersonKeywordRow, PersonRoleRow, PersonRow,
    PersonSubjectAreaRow, PotentialReviewerRow, ReviewStatsRow, SearchTypeRow, StageRow,
    VersionPersonRow,
};

use serde::de::DeserializeOwned;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Every table the recommendation context is built from.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub manuscript_versions: Vec<ManuscriptVersionRow>,
    pub persons: Vec<PersonRow>,
    pub manuscript_authors: Vec<AuthorRow>,
    pub manuscript_editors: Vec<VersionPersonRow>,
    pub manuscript_senior_editors: Vec<VersionPersonRow>,
    pub manuscript_stages: Vec<StageRow>,
    pub manuscript_keywords: Vec<ManuscriptKeywordRow>,
    pub person_keywords: Vec<PersonKeywordRow>,
    pub manuscript_subject_areas: Vec<ManuscriptSubjectAreaRow>,
    pub person_subject_areas: Vec<PersonSubjectAreaRow>,
    pub person_roles: Vec<PersonRoleRow>,
    pub person_memberships: Vec<MembershipRow>,
    pub person_dates_not_available: Vec<DatesNotAvailableRow>,
    pub person_review_stats_overall: Vec<ReviewStatsRow>,
    pub person_review_stats_last12m: Vec<ReviewStatsRow>,
    pub manuscript_potential_reviewers: Vec<PotentialReviewerRow>,
    pub search_types: Vec<SearchTypeRow>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot table '{table}': {source}")]
    Io {
        table: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("invalid CSV data in snapshot table '{table}': {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },
}

impl SnapshotError {
    pub fn table(&self) -> &'static str {
        match self {
            SnapshotError::Io { table, .. } | SnapshotError::Csv { table, .. } => table,
        }
    }
}

pub struct SnapshotLoader;

impl SnapshotLoader {
    /// Read all tables from `dir`. Only manuscript versions and persons are mandatory.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Snapshot, SnapshotError> {
        let dir = dir.as_ref();

        let snapshot = Snapshot {
            manuscript_versions: read_table(dir, "manuscript_versions", true)?,
            persons: read_table(dir, "persons", true)?,
            manuscript_authors: read_table(dir, "manuscript_authors", false)?,
            manuscript_editors: read_table(dir, "manuscript_editors", false)?,
            manuscript_senior_editors: read_table(dir, "manuscript_senior_editors", false)?,
            manuscript_stages: read_table(dir, "manuscript_stages", false)?,
            manuscript_keywords: read_table(dir, "manuscript_keywords", false)?,
            person_keywords: read_table(dir, "person_keywords", false)?,
            manuscript_subject_areas: read_table(dir, "manuscript_subject_areas", false)?,
            person_subject_areas: read_table(dir, "person_subject_areas", false)?,
            person_roles: read_table(dir, "person_roles", false)?,
            person_memberships: read_table(dir, "person_memberships", false)?,
            person_dates_not_available: read_table(dir, "person_dates_not_available", false)?,
            person_review_stats_overall: read_table(dir, "person_review_stats_overall", false)?,
            person_review_stats_last12m: read_table(dir, "person_review_stats_last12m", false)?,
            manuscript_potential_reviewers: read_table(
                dir,
                "manuscript_potential_reviewers",
                false,
            )?,
            search_types: read_table(dir, "search_types", false)?,
        };

        debug!(
            manuscript_versions = snapshot.manuscript_versions.len(),
            persons = snapshot.persons.len(),
            stages = snapshot.manuscript_stages.len(),
            "snapshot loaded"
        );

        Ok(snapshot)
    }

    /// Parse a single table from any reader, e.g. an uploaded extract.
    pub fn read_rows<T, R>(table: &'static str, reader: R) -> Result<Vec<T>, SnapshotError>
    where
        T: DeserializeOwned,
        R: Read,
    {
        parser::parse_rows(reader).map_err(|source| SnapshotError::Csv { table, source })
    }
}

fn read_table<T: DeserializeOwned>(
    dir: &Path,
    table: &'static str,
    required: bool,
) -> Result<Vec<T>, SnapshotError> {
    let path = dir.join(format!("{table}.csv"));
    let file = match std::fs::File::open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            debug!(table, path = %path.display(), "optional snapshot table missing");
            return Ok(Vec::new());
        }
        Err(source) => return Err(SnapshotError::Io { table, source }),
    };

    SnapshotLoader::read_rows(table, file)
}
