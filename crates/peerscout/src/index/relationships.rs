use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::domain::{stage_names, PersonId, RelationshipType, VersionId};
use crate::snapshot::normalizer::label_key;
use crate::snapshot::Snapshot;

type PersonIdsByVersionId = BTreeMap<VersionId, BTreeSet<PersonId>>;

/// Prior potential-reviewer assignment on a manuscript version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignedReviewer {
    pub person_id: PersonId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub excluded: bool,
}

/// Persons attached to manuscript versions, by relationship type and by workflow stage.
#[derive(Debug, Clone, Default)]
pub struct RelationshipIndex {
    by_relationship_type: HashMap<RelationshipType, PersonIdsByVersionId>,
    by_stage_name: HashMap<String, PersonIdsByVersionId>,
    assigned_reviewers: BTreeMap<VersionId, Vec<AssignedReviewer>>,
}

impl RelationshipIndex {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let mut index = Self::default();

        for row in &snapshot.manuscript_authors {
            index.link(RelationshipType::Author, &row.version_id, &row.person_id);
        }
        for row in &snapshot.manuscript_editors {
            index.link(RelationshipType::Editor, &row.version_id, &row.person_id);
        }
        for row in &snapshot.manuscript_senior_editors {
            index.link(RelationshipType::SeniorEditor, &row.version_id, &row.person_id);
        }

        let review_received = label_key(stage_names::REVIEW_RECEIVED);
        for row in &snapshot.manuscript_stages {
            let stage = label_key(&row.stage_name);
            if stage == review_received {
                index.link(
                    RelationshipType::ReviewerHistory,
                    &row.version_id,
                    &row.person_id,
                );
            }
            index
                .by_stage_name
                .entry(stage)
                .or_default()
                .entry(row.version_id.clone())
                .or_default()
                .insert(row.person_id.clone());
        }

        for row in &snapshot.manuscript_potential_reviewers {
            index.link(
                RelationshipType::AssignedPotentialReviewer,
                &row.version_id,
                &row.person_id,
            );
            index
                .assigned_reviewers
                .entry(row.version_id.clone())
                .or_default()
                .push(AssignedReviewer {
                    person_id: row.person_id.clone(),
                    status: row.status.clone(),
                    excluded: row.suggested_to_exclude,
                });
        }

        index
    }

    fn link(
        &mut self,
        relationship_type: RelationshipType,
        version_id: &VersionId,
        person_id: &PersonId,
    ) {
        self.by_relationship_type
            .entry(relationship_type)
            .or_default()
            .entry(version_id.clone())
            .or_default()
            .insert(person_id.clone());
    }

    /// Union of persons holding any of `relationship_types`; versions without a match are omitted.
    pub fn get_person_ids_by_version_id_for_relationship_types<'a, I>(
        &self,
        version_ids: I,
        relationship_types: &[RelationshipType],
    ) -> PersonIdsByVersionId
    where
        I: IntoIterator<Item = &'a VersionId>,
    {
        let sources: Vec<&PersonIdsByVersionId> = relationship_types
            .iter()
            .filter_map(|relationship_type| self.by_relationship_type.get(relationship_type))
            .collect();
        collect_person_ids(version_ids, &sources)
    }

    /// Like the relationship lookup, keyed by workflow stage occurrences instead.
    pub fn get_person_ids_by_version_id_for_stage_names<'a, I, S>(
        &self,
        version_ids: I,
        stage_names: &[S],
    ) -> PersonIdsByVersionId
    where
        I: IntoIterator<Item = &'a VersionId>,
        S: AsRef<str>,
    {
        let sources: Vec<&PersonIdsByVersionId> = stage_names
            .iter()
            .filter_map(|stage_name| self.by_stage_name.get(&label_key(stage_name.as_ref())))
            .collect();
        collect_person_ids(version_ids, &sources)
    }

    pub fn assigned_reviewers(&self, version_id: &VersionId) -> &[AssignedReviewer] {
        self.assigned_reviewers
            .get(version_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn collect_person_ids<'a, I>(
    version_ids: I,
    sources: &[&PersonIdsByVersionId],
) -> PersonIdsByVersionId
where
    I: IntoIterator<Item = &'a VersionId>,
{
    let mut result = PersonIdsByVersionId::new();
    if sources.is_empty() {
        return result;
    }

    for version_id in version_ids {
        for source in sources {
            if let Some(person_ids) = source.get(version_id) {
                result
                    .entry(version_id.clone())
                    .or_default()
                    .extend(person_ids.iter().cloned());
            }
        }
    }

    result
}
