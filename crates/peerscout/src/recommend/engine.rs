use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use super::context::RecommendationContext;
use super::policy::RecommendPolicy;
use super::ranking::{interleave_early_career, sort_potential_reviewers};
use super::request::{non_blank, parse_keywords, RecommendRequest};
use super::response::{
    Assignment, ManuscriptScore, PotentialReviewer, RecommendResponse, ReviewerScores, SearchEcho,
};
use super::scoring::{combine_manuscript_scores, reviewer_score, sort_manuscript_scores_descending};
use crate::domain::{stage_names, PersonId, RelationshipType, VersionId};
use crate::similarity::{SimilarManuscript, SimilarityError, SimilarityOracle};

type PersonIdsByVersionId = BTreeMap<VersionId, BTreeSet<PersonId>>;

const DEFAULT_RELATIONSHIP_TYPES: [RelationshipType; 1] = [RelationshipType::Author];

/// Error raised while computing a recommendation.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error(transparent)]
    Similarity(#[from] SimilarityError),
}

/// Reviewer recommendation over a fixed [`RecommendationContext`].
///
/// Holds no mutable state, so one instance can serve concurrent requests.
pub struct RecommendReviewers {
    context: Arc<RecommendationContext>,
    similarity: Arc<dyn SimilarityOracle>,
    policy: RecommendPolicy,
}

/// Effective inputs of the shared scoring procedure.
struct Criteria<'a> {
    subject_areas: BTreeSet<String>,
    keyword_list: Vec<String>,
    abstract_text: Option<&'a str>,
    manuscript_version_ids: BTreeSet<VersionId>,
    include_person_ids: BTreeSet<PersonId>,
    exclude_person_ids: BTreeSet<PersonId>,
    early_career_subject_areas: BTreeSet<String>,
    assignments: BTreeMap<PersonId, Vec<Assignment>>,
    role: Option<&'a str>,
    relationship_types: &'a [RelationshipType],
    stage_names: Vec<String>,
    limit: Option<usize>,
}

/// Matching manuscripts with the scores gathered while finding them.
struct ManuscriptMatches {
    version_ids: BTreeSet<VersionId>,
    keyword_by_version_id: BTreeMap<VersionId, f64>,
    similarity_by_version_id: BTreeMap<VersionId, f64>,
}

impl RecommendReviewers {
    pub fn new(
        context: Arc<RecommendationContext>,
        similarity: Arc<dyn SimilarityOracle>,
        policy: RecommendPolicy,
    ) -> Self {
        Self {
            context,
            similarity,
            policy,
        }
    }

    pub fn context(&self) -> &RecommendationContext {
        &self.context
    }

    pub fn policy(&self) -> &RecommendPolicy {
        &self.policy
    }

    pub fn get_all_keywords(&self) -> &BTreeSet<String> {
        self.context.all_keywords()
    }

    pub fn get_all_subject_areas(&self) -> BTreeSet<String> {
        self.context.manuscript_subject_areas().get_all_subject_areas()
    }

    pub fn user_has_role_by_email(&self, email: &str, role: &str) -> bool {
        self.context.roles().user_has_role_by_email(email, role)
    }

    pub fn get_user_roles_by_email(&self, email: &str) -> BTreeSet<String> {
        self.context.roles().get_user_roles_by_email(email)
    }

    /// Recommend reviewers for a manuscript number, or for free-text criteria when none is given.
    pub fn recommend(
        &self,
        request: &RecommendRequest,
    ) -> Result<RecommendResponse, RecommendError> {
        match request.manuscript_no() {
            Some(manuscript_no) => self.recommend_using_manuscript_no(manuscript_no, request),
            None => self.recommend_using_search_criteria(request),
        }
    }

    fn recommend_using_manuscript_no(
        &self,
        manuscript_no: &str,
        request: &RecommendRequest,
    ) -> Result<RecommendResponse, RecommendError> {
        let Some(record) = self.context.latest_version(manuscript_no) else {
            debug!(manuscript_no, "manuscript not found");
            return Ok(RecommendResponse::manuscript_not_found(manuscript_no));
        };

        let version_id = record.manuscript.version_id.clone();
        let matching_version_ids = BTreeSet::from([version_id.clone()]);
        let manuscript_subject_areas = record.manuscript.subject_areas.clone();

        let mut assignments: BTreeMap<PersonId, Vec<Assignment>> = BTreeMap::new();
        for assigned in self.context.relationships().assigned_reviewers(&version_id) {
            assignments
                .entry(assigned.person_id.clone())
                .or_default()
                .push(Assignment {
                    version_id: version_id.clone(),
                    status: assigned.status.clone(),
                    excluded: assigned.excluded,
                });
        }

        let exclude_person_ids = record.attached_person_ids();

        let criteria = Criteria {
            subject_areas: if self.policy.filter_by_subject_area {
                manuscript_subject_areas.clone()
            } else {
                BTreeSet::new()
            },
            keyword_list: record.keywords.iter().cloned().collect(),
            abstract_text: None,
            manuscript_version_ids: matching_version_ids,
            include_person_ids: assignments.keys().cloned().collect(),
            exclude_person_ids,
            early_career_subject_areas: manuscript_subject_areas,
            assignments,
            role: request.role.as_deref(),
            relationship_types: requested_relationship_types(request),
            stage_names: requested_stage_names(request),
            limit: request.limit,
        };

        let potential_reviewers = self.recommend_using_criteria(criteria)?;

        Ok(RecommendResponse {
            manuscripts_not_found: None,
            matching_manuscripts: Some(vec![record.view()]),
            potential_reviewers,
            search: None,
        })
    }

    fn recommend_using_search_criteria(
        &self,
        request: &RecommendRequest,
    ) -> Result<RecommendResponse, RecommendError> {
        let subject_areas: BTreeSet<String> = non_blank(request.subject_area.as_deref())
            .map(|subject_area| BTreeSet::from([subject_area.to_string()]))
            .unwrap_or_default();
        let keyword_list = parse_keywords(request.keywords.as_deref());

        let search = SearchEcho {
            subject_areas: subject_areas.clone(),
            keywords: keyword_list.clone(),
            abstract_text: request
                .abstract_text
                .clone()
                .filter(|text| !text.trim().is_empty()),
        };

        let criteria = Criteria {
            early_career_subject_areas: subject_areas.clone(),
            subject_areas,
            keyword_list,
            abstract_text: request.abstract_text.as_deref(),
            manuscript_version_ids: BTreeSet::new(),
            include_person_ids: BTreeSet::new(),
            exclude_person_ids: BTreeSet::new(),
            assignments: BTreeMap::new(),
            role: request.role.as_deref(),
            relationship_types: requested_relationship_types(request),
            stage_names: requested_stage_names(request),
            limit: request.limit,
        };

        let potential_reviewers = self.recommend_using_criteria(criteria)?;

        Ok(RecommendResponse {
            manuscripts_not_found: None,
            matching_manuscripts: None,
            potential_reviewers,
            search: Some(search),
        })
    }

    fn recommend_using_criteria(
        &self,
        criteria: Criteria<'_>,
    ) -> Result<Vec<PotentialReviewer>, RecommendError> {
        let matches = self.find_matching_manuscripts(&criteria)?;

        let person_ids_by_version_id = self.person_ids_by_matching_manuscripts(
            &matches.version_ids,
            criteria.relationship_types,
            &criteria.stage_names,
        );

        let person_keyword_scores = self
            .context
            .person_keywords()
            .get_keyword_scores(&criteria.keyword_list);

        let candidate_ids = self.find_potential_reviewer_ids(
            &criteria,
            &person_ids_by_version_id,
            &person_keyword_scores,
        );

        let manuscript_scores = combine_manuscript_scores(
            &matches.keyword_by_version_id,
            &matches.similarity_by_version_id,
        );

        let mut version_ids_by_person_id: BTreeMap<&PersonId, BTreeSet<&VersionId>> =
            BTreeMap::new();
        for (version_id, person_ids) in &person_ids_by_version_id {
            for person_id in person_ids {
                version_ids_by_person_id
                    .entry(person_id)
                    .or_default()
                    .insert(version_id);
            }
        }

        let mut potential_reviewers: Vec<PotentialReviewer> = candidate_ids
            .into_iter()
            .map(|person_id| {
                let version_ids = version_ids_by_person_id
                    .get(&person_id)
                    .cloned()
                    .unwrap_or_default();
                let person_keyword = person_keyword_scores.get(&person_id).copied();
                let assignments = criteria
                    .assignments
                    .get(&person_id)
                    .cloned()
                    .unwrap_or_default();
                self.populate_potential_reviewer(
                    person_id,
                    &version_ids,
                    person_keyword,
                    &manuscript_scores,
                    assignments,
                )
            })
            .collect();

        sort_potential_reviewers(&mut potential_reviewers);
        if self.policy.early_career_interleaving {
            potential_reviewers = interleave_early_career(potential_reviewers);
        }

        if let Some(limit) = criteria.limit.filter(|limit| *limit > 0) {
            potential_reviewers.truncate(limit);
        }

        debug!(
            matching_manuscripts = matches.version_ids.len(),
            potential_reviewers = potential_reviewers.len(),
            "recommendation computed"
        );

        Ok(potential_reviewers)
    }

    fn find_matching_manuscripts(
        &self,
        criteria: &Criteria<'_>,
    ) -> Result<ManuscriptMatches, RecommendError> {
        let (keyword_version_ids, keyword_by_version_id) =
            self.find_manuscripts_by_subject_areas_and_keywords(criteria);

        let (similar_version_ids, similarity_by_version_id) =
            self.find_most_similar_manuscripts(criteria)?;

        let version_ids: BTreeSet<VersionId> = keyword_version_ids
            .into_iter()
            .chain(similar_version_ids)
            .collect();

        Ok(ManuscriptMatches {
            version_ids,
            keyword_by_version_id,
            similarity_by_version_id,
        })
    }

    /// Keyword matches, narrowed to the subject areas when both are given. Subject areas
    /// alone match every manuscript tagged with them, without a keyword score.
    fn find_manuscripts_by_subject_areas_and_keywords(
        &self,
        criteria: &Criteria<'_>,
    ) -> (BTreeSet<VersionId>, BTreeMap<VersionId, f64>) {
        let subject_area_index = self.context.manuscript_subject_areas();

        if !criteria.keyword_list.is_empty() {
            let keyword_by_version_id = self
                .context
                .manuscript_keywords()
                .get_keyword_scores(&criteria.keyword_list);
            let mut version_ids: BTreeSet<VersionId> =
                keyword_by_version_id.keys().cloned().collect();
            if !criteria.subject_areas.is_empty() && !version_ids.is_empty() {
                let in_subject_areas =
                    subject_area_index.get_ids_by_subject_areas(&criteria.subject_areas);
                version_ids.retain(|version_id| in_subject_areas.contains(version_id));
            }
            (version_ids, keyword_by_version_id)
        } else if !criteria.subject_areas.is_empty() {
            let version_ids = subject_area_index.get_ids_by_subject_areas(&criteria.subject_areas);
            (version_ids, BTreeMap::new())
        } else {
            (BTreeSet::new(), BTreeMap::new())
        }
    }

    /// Manuscripts above the similarity threshold, plus every similarity the oracle returned.
    fn find_most_similar_manuscripts(
        &self,
        criteria: &Criteria<'_>,
    ) -> Result<(BTreeSet<VersionId>, BTreeMap<VersionId, f64>), RecommendError> {
        let abstract_text = criteria.abstract_text.filter(|text| !text.trim().is_empty());
        let all_similar = match abstract_text {
            Some(text) => self.similarity.find_similar_manuscripts_to_abstract(text)?,
            None => self
                .similarity
                .find_similar_manuscripts(&criteria.manuscript_version_ids)?,
        };
        validate_similarity(&all_similar)?;

        let in_subject_areas = (!criteria.subject_areas.is_empty()).then(|| {
            self.context
                .manuscript_subject_areas()
                .get_ids_by_subject_areas(&criteria.subject_areas)
        });

        let mut most_similar: Vec<&SimilarManuscript> = all_similar
            .iter()
            .filter(|similar| {
                in_subject_areas
                    .as_ref()
                    .map(|ids| ids.contains(&similar.version_id))
                    .unwrap_or(true)
            })
            .filter(|similar| similar.similarity >= self.policy.similarity_threshold)
            .collect();

        debug!(
            all_similar = all_similar.len(),
            above_threshold = most_similar.len(),
            threshold = self.policy.similarity_threshold,
            "similar manuscripts found"
        );

        if most_similar.len() > self.policy.max_similar_manuscripts {
            most_similar.sort_by(|a, b| {
                b.similarity
                    .total_cmp(&a.similarity)
                    .then_with(|| a.version_id.cmp(&b.version_id))
            });
            most_similar.truncate(self.policy.max_similar_manuscripts);
        }

        let version_ids = most_similar
            .into_iter()
            .map(|similar| similar.version_id.clone())
            .collect();
        let similarity_by_version_id = all_similar
            .iter()
            .map(|similar| (similar.version_id.clone(), similar.similarity))
            .collect();

        Ok((version_ids, similarity_by_version_id))
    }

    /// Relationship types resolve over published matches only; stage names over all matches.
    fn person_ids_by_matching_manuscripts(
        &self,
        version_ids: &BTreeSet<VersionId>,
        relationship_types: &[RelationshipType],
        stage_names: &[String],
    ) -> PersonIdsByVersionId {
        let relationships = self.context.relationships();
        let published_version_ids: Vec<&VersionId> = version_ids
            .iter()
            .filter(|version_id| self.context.is_published(version_id))
            .collect();

        let by_relationship_types = relationships
            .get_person_ids_by_version_id_for_relationship_types(
                published_version_ids.iter().copied(),
                relationship_types,
            );
        let by_stage_names =
            relationships.get_person_ids_by_version_id_for_stage_names(version_ids, stage_names);

        debug!(
            version_ids = version_ids.len(),
            published_version_ids = published_version_ids.len(),
            by_relationship_types = count_values(&by_relationship_types),
            by_stage_names = count_values(&by_stage_names),
            "candidate persons resolved from matching manuscripts"
        );

        let mut result = by_relationship_types;
        for (version_id, person_ids) in by_stage_names {
            result.entry(version_id).or_default().extend(person_ids);
        }
        result
    }

    fn find_potential_reviewer_ids(
        &self,
        criteria: &Criteria<'_>,
        person_ids_by_version_id: &PersonIdsByVersionId,
        person_keyword_scores: &BTreeMap<PersonId, f64>,
    ) -> BTreeSet<PersonId> {
        let mut person_ids: BTreeSet<PersonId> = person_ids_by_version_id
            .values()
            .flatten()
            .cloned()
            .collect();
        person_ids.extend(person_keyword_scores.keys().cloned());

        if self.policy.early_career_inclusion {
            let early_career = self
                .context
                .early_career_researchers_by_subject_areas(&criteria.early_career_subject_areas);
            debug!(
                early_career_researchers = early_career.len(),
                subject_areas = ?criteria.early_career_subject_areas,
                "early career researchers in scope"
            );
            person_ids.extend(early_career);
        }

        person_ids.extend(criteria.include_person_ids.iter().cloned());
        person_ids.retain(|person_id| !criteria.exclude_person_ids.contains(person_id));

        self.context
            .roles()
            .filter_person_ids_by_role(person_ids, criteria.role)
    }

    fn populate_potential_reviewer(
        &self,
        person_id: PersonId,
        version_ids: &BTreeSet<&VersionId>,
        person_keyword: Option<f64>,
        manuscript_scores: &BTreeMap<VersionId, ManuscriptScore>,
        assignments: Vec<Assignment>,
    ) -> PotentialReviewer {
        let mut by_manuscript: Vec<ManuscriptScore> = version_ids
            .iter()
            .filter_map(|version_id| manuscript_scores.get(*version_id))
            .cloned()
            .collect();
        sort_manuscript_scores_descending(&mut by_manuscript);

        let (keyword, similarity, combined) = reviewer_score(person_keyword, by_manuscript.first());

        let author_of_manuscripts = self.context.authored_manuscripts(&person_id).to_vec();
        let authored_version_ids: BTreeSet<&VersionId> = author_of_manuscripts
            .iter()
            .map(|manuscript| &manuscript.version_id)
            .collect();
        by_manuscript.retain(|score| authored_version_ids.contains(&score.version_id));

        let person = self.context.person(&person_id).cloned();
        if person.is_none() {
            warn!(person_id = %person_id, "person id not found");
        }

        PotentialReviewer {
            person_id,
            person,
            author_of_manuscripts,
            scores: ReviewerScores {
                keyword,
                similarity,
                combined,
                by_manuscript,
            },
            assignments,
        }
    }
}

fn requested_relationship_types(request: &RecommendRequest) -> &[RelationshipType] {
    request
        .relationship_types
        .as_deref()
        .unwrap_or(&DEFAULT_RELATIONSHIP_TYPES)
}

fn requested_stage_names(request: &RecommendRequest) -> Vec<String> {
    request
        .stage_names
        .clone()
        .unwrap_or_else(|| vec![stage_names::REVIEW_RECEIVED.to_string()])
}

fn validate_similarity(similar: &[SimilarManuscript]) -> Result<(), SimilarityError> {
    match similar.iter().find(|row| !row.similarity.is_finite()) {
        Some(row) => Err(SimilarityError::InvalidScore {
            version_id: row.version_id.clone(),
            score: row.similarity,
        }),
        None => Ok(()),
    }
}

fn count_values(map: &PersonIdsByVersionId) -> usize {
    map.values().map(BTreeSet::len).sum()
}
