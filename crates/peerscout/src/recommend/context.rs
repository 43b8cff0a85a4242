use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::manuscripts::duplicate_titles_as_alternatives;
use super::response::ManuscriptView;
use crate::domain::{
    Author, DateRange, ManuscriptId, ManuscriptModel, Membership, Person, PersonId,
    PersonReference, PersonStats, ReviewDuration, ReviewStats, VersionId,
};
use crate::index::{KeywordIndex, RelationshipIndex, RoleIndex, SubjectAreaIndex};
use crate::snapshot::normalizer::label_key;
use crate::snapshot::{ReviewStatsRow, Snapshot};

/// Manuscript version with the editor list that never leaves the engine.
#[derive(Debug, Clone)]
pub struct ManuscriptRecord {
    pub manuscript: ManuscriptView,
    pub version: Option<u32>,
    pub is_valid: bool,
    pub keywords: BTreeSet<String>,
    pub editors: Vec<PersonReference>,
}

impl ManuscriptRecord {
    /// External form, without editors.
    pub fn view(&self) -> ManuscriptView {
        self.manuscript.clone()
    }

    /// Authors, editors and senior editors of this version.
    pub fn attached_person_ids(&self) -> BTreeSet<PersonId> {
        let authors = self.manuscript.authors.iter().map(|author| &author.person_id);
        let editors = self
            .editors
            .iter()
            .chain(&self.manuscript.senior_editors)
            .map(|editor| &editor.person_id);
        authors.chain(editors).cloned().collect()
    }
}

/// Immutable, pre-indexed snapshot the engine queries.
#[derive(Debug, Clone)]
pub struct RecommendationContext {
    persons: BTreeMap<PersonId, Person>,
    manuscripts: BTreeMap<VersionId, ManuscriptRecord>,
    latest_version_by_manuscript_id: BTreeMap<ManuscriptId, VersionId>,
    manuscripts_by_author: BTreeMap<PersonId, Vec<ManuscriptView>>,
    manuscript_keywords: KeywordIndex<VersionId>,
    person_keywords: KeywordIndex<PersonId>,
    manuscript_subject_areas: SubjectAreaIndex<VersionId>,
    early_career_subject_areas: SubjectAreaIndex<PersonId>,
    early_career_person_ids: BTreeSet<PersonId>,
    relationships: RelationshipIndex,
    roles: RoleIndex,
    all_keywords: BTreeSet<String>,
}

impl RecommendationContext {
    /// Index `snapshot`; unavailability ranges ending before `today` are dropped.
    pub fn build(snapshot: &Snapshot, model: &ManuscriptModel, today: NaiveDate) -> Self {
        let persons = build_persons(snapshot, today);

        let valid_version_ids: BTreeSet<VersionId> = snapshot
            .manuscript_versions
            .iter()
            .filter(|row| model.is_valid(row.decision.as_deref(), row.manuscript_type.as_deref()))
            .map(|row| row.version_id.clone())
            .collect();

        let manuscript_keywords = KeywordIndex::from_entries(
            snapshot
                .manuscript_keywords
                .iter()
                .filter(|row| valid_version_ids.contains(&row.version_id))
                .map(|row| (row.version_id.clone(), row.keyword.as_str(), 1.0)),
        );
        let person_keywords = KeywordIndex::from_entries(
            snapshot
                .person_keywords
                .iter()
                .map(|row| (row.person_id.clone(), row.keyword.as_str(), row.score.unwrap_or(1.0))),
        );
        let all_subject_areas_by_version = SubjectAreaIndex::from_entries(
            snapshot
                .manuscript_subject_areas
                .iter()
                .map(|row| (row.version_id.clone(), row.subject_area.as_str())),
        );
        let manuscript_subject_areas = SubjectAreaIndex::from_entries(
            snapshot
                .manuscript_subject_areas
                .iter()
                .filter(|row| valid_version_ids.contains(&row.version_id))
                .map(|row| (row.version_id.clone(), row.subject_area.as_str())),
        );

        let early_career_person_ids: BTreeSet<PersonId> = snapshot
            .persons
            .iter()
            .filter(|row| row.is_early_career_researcher)
            .map(|row| row.person_id.clone())
            .collect();
        let early_career_subject_areas = SubjectAreaIndex::from_entries(
            snapshot
                .person_subject_areas
                .iter()
                .filter(|row| early_career_person_ids.contains(&row.person_id))
                .map(|row| (row.person_id.clone(), row.subject_area.as_str())),
        );

        let relationships = RelationshipIndex::from_snapshot(snapshot);
        let roles = RoleIndex::from_rows(&snapshot.persons, &snapshot.person_roles);

        let mut keywords_by_version: BTreeMap<&VersionId, BTreeSet<String>> = BTreeMap::new();
        for row in &snapshot.manuscript_keywords {
            let keyword = row.keyword.trim();
            if !keyword.is_empty() {
                keywords_by_version
                    .entry(&row.version_id)
                    .or_default()
                    .insert(keyword.to_string());
            }
        }

        let people = PeopleByVersion::from_snapshot(snapshot, &persons);

        let mut doi_by_manuscript_id: BTreeMap<&ManuscriptId, &str> = BTreeMap::new();
        for row in &snapshot.manuscript_versions {
            if let Some(doi) = row.doi.as_deref() {
                doi_by_manuscript_id.entry(&row.manuscript_id).or_insert(doi);
            }
        }

        let mut manuscripts = BTreeMap::new();
        for row in &snapshot.manuscript_versions {
            let decision = row.decision.as_deref();
            let manuscript_type = row.manuscript_type.as_deref();
            let manuscript = ManuscriptView {
                version_id: row.version_id.clone(),
                manuscript_id: row.manuscript_id.clone(),
                title: row.title.clone(),
                abstract_text: row.abstract_text.clone(),
                decision: row.decision.clone(),
                manuscript_type: row.manuscript_type.clone(),
                published_date: row.decision_date,
                doi: row.doi.clone().or_else(|| {
                    doi_by_manuscript_id
                        .get(&row.manuscript_id)
                        .map(|doi| doi.to_string())
                }),
                authors: people.authors(&row.version_id),
                senior_editors: people.senior_editors(&row.version_id),
                subject_areas: all_subject_areas_by_version
                    .get_subject_areas_by_id(&row.version_id),
                is_published: model.is_published(decision, manuscript_type),
                alternatives: Vec::new(),
            };

            manuscripts.insert(
                row.version_id.clone(),
                ManuscriptRecord {
                    manuscript,
                    version: row.version,
                    is_valid: valid_version_ids.contains(&row.version_id),
                    keywords: keywords_by_version
                        .get(&row.version_id)
                        .cloned()
                        .unwrap_or_default(),
                    editors: people.editors(&row.version_id),
                },
            );
        }

        let mut latest_version_by_manuscript_id: BTreeMap<ManuscriptId, VersionId> =
            BTreeMap::new();
        for record in manuscripts.values() {
            let manuscript_id = &record.manuscript.manuscript_id;
            let is_later = match latest_version_by_manuscript_id.get(manuscript_id) {
                Some(current) => manuscripts
                    .get(current)
                    .map(|current| version_key(record) > version_key(current))
                    .unwrap_or(true),
                None => true,
            };
            if is_later {
                latest_version_by_manuscript_id
                    .insert(manuscript_id.clone(), record.manuscript.version_id.clone());
            }
        }

        let mut authored: BTreeMap<PersonId, Vec<ManuscriptView>> = BTreeMap::new();
        for record in manuscripts.values() {
            if !record.is_valid || !record.manuscript.is_published {
                continue;
            }
            for author in &record.manuscript.authors {
                authored
                    .entry(author.person_id.clone())
                    .or_default()
                    .push(record.view());
            }
        }
        let manuscripts_by_author = authored
            .into_iter()
            .map(|(person_id, views)| (person_id, duplicate_titles_as_alternatives(views)))
            .collect();

        let mut keywords_by_key: BTreeMap<String, String> = BTreeMap::new();
        for keyword in manuscript_keywords
            .get_all_keywords()
            .into_iter()
            .chain(person_keywords.get_all_keywords())
        {
            keywords_by_key.entry(label_key(&keyword)).or_insert(keyword);
        }
        let all_keywords = keywords_by_key.into_values().collect();

        debug!(
            persons = persons.len(),
            manuscripts = manuscripts.len(),
            valid_manuscripts = valid_version_ids.len(),
            early_career_researchers = early_career_person_ids.len(),
            keyword_manuscripts = manuscript_keywords.len(),
            keyword_persons = person_keywords.len(),
            "recommendation context built"
        );

        Self {
            persons,
            manuscripts,
            latest_version_by_manuscript_id,
            manuscripts_by_author,
            manuscript_keywords,
            person_keywords,
            manuscript_subject_areas,
            early_career_subject_areas,
            early_career_person_ids,
            relationships,
            roles,
            all_keywords,
        }
    }

    pub fn person(&self, person_id: &PersonId) -> Option<&Person> {
        self.persons.get(person_id)
    }

    /// Latest version recorded for a manuscript number.
    pub fn latest_version(&self, manuscript_no: &str) -> Option<&ManuscriptRecord> {
        self.latest_version_by_manuscript_id
            .get(&ManuscriptId::new(manuscript_no.trim()))
            .and_then(|version_id| self.manuscripts.get(version_id))
    }

    pub fn is_published(&self, version_id: &VersionId) -> bool {
        self.manuscripts
            .get(version_id)
            .map(|record| record.manuscript.is_published)
            .unwrap_or(false)
    }

    /// Valid, published manuscripts of an author, newest first with duplicate titles collapsed.
    pub fn authored_manuscripts(&self, person_id: &PersonId) -> &[ManuscriptView] {
        self.manuscripts_by_author
            .get(person_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Early-career researchers in any of `subject_areas`, or all of them when empty.
    pub fn early_career_researchers_by_subject_areas(
        &self,
        subject_areas: &BTreeSet<String>,
    ) -> BTreeSet<PersonId> {
        if subject_areas.is_empty() {
            return self.early_career_person_ids.clone();
        }
        self.early_career_subject_areas
            .get_ids_by_subject_areas(subject_areas)
    }

    pub fn manuscript_keywords(&self) -> &KeywordIndex<VersionId> {
        &self.manuscript_keywords
    }

    pub fn person_keywords(&self) -> &KeywordIndex<PersonId> {
        &self.person_keywords
    }

    pub fn manuscript_subject_areas(&self) -> &SubjectAreaIndex<VersionId> {
        &self.manuscript_subject_areas
    }

    pub fn relationships(&self) -> &RelationshipIndex {
        &self.relationships
    }

    pub fn roles(&self) -> &RoleIndex {
        &self.roles
    }

    pub fn all_keywords(&self) -> &BTreeSet<String> {
        &self.all_keywords
    }
}

fn version_key(record: &ManuscriptRecord) -> (u32, &VersionId) {
    (record.version.unwrap_or(0), &record.manuscript.version_id)
}

fn build_persons(snapshot: &Snapshot, today: NaiveDate) -> BTreeMap<PersonId, Person> {
    let mut memberships: BTreeMap<&PersonId, Vec<Membership>> = BTreeMap::new();
    for row in &snapshot.person_memberships {
        memberships.entry(&row.person_id).or_default().push(Membership {
            member_type: row.member_type.clone(),
            member_id: row.member_id.clone(),
        });
    }

    let mut dates_not_available: BTreeMap<&PersonId, Vec<DateRange>> = BTreeMap::new();
    for row in &snapshot.person_dates_not_available {
        if row.end_date < today {
            continue;
        }
        dates_not_available
            .entry(&row.person_id)
            .or_default()
            .push(DateRange {
                start_date: row.start_date,
                end_date: row.end_date,
            });
    }
    for ranges in dates_not_available.values_mut() {
        ranges.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.end_date.cmp(&b.end_date)));
    }

    let overall = stats_by_person(&snapshot.person_review_stats_overall);
    let last_12m = stats_by_person(&snapshot.person_review_stats_last12m);

    snapshot
        .persons
        .iter()
        .map(|row| {
            let person = Person {
                person_id: row.person_id.clone(),
                title: row.title.clone(),
                first_name: row.first_name.clone(),
                middle_name: row.middle_name.clone(),
                last_name: row.last_name.clone(),
                institution: row.institution.clone(),
                status: row.status.clone(),
                email: row.email.clone(),
                is_early_career_researcher: row.is_early_career_researcher,
                memberships: memberships.remove(&row.person_id).unwrap_or_default(),
                dates_not_available: dates_not_available
                    .remove(&row.person_id)
                    .unwrap_or_default(),
                stats: PersonStats {
                    overall: overall.get(&row.person_id).cloned(),
                    last_12m: last_12m.get(&row.person_id).cloned(),
                },
            };
            (row.person_id.clone(), person)
        })
        .collect()
}

fn stats_by_person(rows: &[ReviewStatsRow]) -> BTreeMap<&PersonId, ReviewStats> {
    rows.iter()
        .map(|row| {
            let review_duration = (row.reviewed_count > 0).then(|| ReviewDuration {
                min: row.reviewed_duration_min,
                max: row.reviewed_duration_max,
                mean: row.reviewed_duration_avg,
                count: row.reviewed_count,
            });
            let stats = ReviewStats {
                review_duration,
                reviews_in_progress: row.awaiting_review_count,
                waiting_to_be_accepted: row.awaiting_accept_count,
                declined: row.declined_count,
            };
            (&row.person_id, stats)
        })
        .collect()
}

/// People attached to each version, resolved against the person table.
struct PeopleByVersion<'a> {
    persons: &'a BTreeMap<PersonId, Person>,
    authors: BTreeMap<&'a VersionId, Vec<(Option<u32>, &'a PersonId, bool)>>,
    editors: BTreeMap<&'a VersionId, Vec<&'a PersonId>>,
    senior_editors: BTreeMap<&'a VersionId, Vec<&'a PersonId>>,
}

impl<'a> PeopleByVersion<'a> {
    fn from_snapshot(snapshot: &'a Snapshot, persons: &'a BTreeMap<PersonId, Person>) -> Self {
        let mut people = Self {
            persons,
            authors: BTreeMap::new(),
            editors: BTreeMap::new(),
            senior_editors: BTreeMap::new(),
        };

        for row in &snapshot.manuscript_authors {
            people.authors.entry(&row.version_id).or_default().push((
                row.seq,
                &row.person_id,
                row.is_corresponding_author,
            ));
        }
        for authors in people.authors.values_mut() {
            authors.sort_by_key(|(seq, _, _)| seq.unwrap_or(u32::MAX));
        }

        for row in &snapshot.manuscript_editors {
            people.editors.entry(&row.version_id).or_default().push(&row.person_id);
        }
        for row in &snapshot.manuscript_senior_editors {
            people
                .senior_editors
                .entry(&row.version_id)
                .or_default()
                .push(&row.person_id);
        }

        people
    }

    fn authors(&self, version_id: &VersionId) -> Vec<Author> {
        self.authors
            .get(version_id)
            .into_iter()
            .flatten()
            .map(|(_, person_id, is_corresponding_author)| Author {
                person_id: (*person_id).clone(),
                person: self.lookup(version_id, person_id, "author"),
                is_corresponding_author: *is_corresponding_author,
            })
            .collect()
    }

    fn editors(&self, version_id: &VersionId) -> Vec<PersonReference> {
        self.resolve(&self.editors, version_id, "editor")
    }

    fn senior_editors(&self, version_id: &VersionId) -> Vec<PersonReference> {
        self.resolve(&self.senior_editors, version_id, "senior_editor")
    }

    fn resolve(
        &self,
        source: &BTreeMap<&'a VersionId, Vec<&'a PersonId>>,
        version_id: &VersionId,
        relationship: &str,
    ) -> Vec<PersonReference> {
        source
            .get(version_id)
            .into_iter()
            .flatten()
            .map(|person_id| PersonReference {
                person_id: (*person_id).clone(),
                person: self.lookup(version_id, person_id, relationship),
            })
            .collect()
    }

    fn lookup(
        &self,
        version_id: &VersionId,
        person_id: &PersonId,
        relationship: &str,
    ) -> Option<Person> {
        let person = self.persons.get(person_id).cloned();
        if person.is_none() {
            warn!(
                version_id = %version_id,
                person_id = %person_id,
                relationship,
                "manuscript references unknown person"
            );
        }
        person
    }
}
