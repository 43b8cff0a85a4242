use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use super::{SimilarManuscript, SimilarityError, SimilarityOracle};
use crate::domain::{ManuscriptModel, VersionId};
use crate::snapshot::Snapshot;

type TermVector = HashMap<String, f64>;

/// TF-IDF cosine similarity over manuscript abstracts, falling back to titles.
#[derive(Debug, Clone, Default)]
pub struct TermSimilarity {
    idf: HashMap<String, f64>,
    vectors: BTreeMap<VersionId, TermVector>,
}

impl TermSimilarity {
    /// Index the text of every valid manuscript version in the snapshot.
    pub fn from_snapshot(snapshot: &Snapshot, model: &ManuscriptModel) -> Self {
        let documents = snapshot
            .manuscript_versions
            .iter()
            .filter(|row| model.is_valid(row.decision.as_deref(), row.manuscript_type.as_deref()))
            .filter_map(|row| {
                row.abstract_text
                    .as_deref()
                    .or(row.title.as_deref())
                    .map(|text| (row.version_id.clone(), text))
            });

        Self::from_documents(documents)
    }

    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (VersionId, &'a str)>,
    {
        let mut term_counts: BTreeMap<VersionId, HashMap<String, usize>> = BTreeMap::new();
        for (version_id, text) in documents {
            let counts = term_counts.entry(version_id).or_default();
            for token in tokenize(text) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
        term_counts.retain(|_, counts| !counts.is_empty());

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for counts in term_counts.values() {
            for term in counts.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let document_count = term_counts.len() as f64;
        let idf: HashMap<String, f64> = document_frequency
            .into_iter()
            .map(|(term, frequency)| {
                let weight = ((1.0 + document_count) / (1.0 + frequency as f64)).ln() + 1.0;
                (term, weight)
            })
            .collect();

        let vectors = term_counts
            .into_iter()
            .map(|(version_id, counts)| (version_id, weigh(&counts, &idf)))
            .collect::<BTreeMap<_, _>>();

        debug!(
            documents = vectors.len(),
            terms = idf.len(),
            "term similarity index built"
        );

        Self { idf, vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn vectorize(&self, text: &str) -> TermVector {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for token in tokenize(text) {
            if self.idf.contains_key(&token) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
        weigh(&counts, &self.idf)
    }
}

impl SimilarityOracle for TermSimilarity {
    fn find_similar_manuscripts(
        &self,
        version_ids: &BTreeSet<VersionId>,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        let queries: Vec<&TermVector> = version_ids
            .iter()
            .filter_map(|version_id| self.vectors.get(version_id))
            .collect();
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let mut similar = Vec::new();
        for (version_id, vector) in &self.vectors {
            if version_ids.contains(version_id) {
                continue;
            }
            let best = queries
                .iter()
                .map(|query| dot(query, vector))
                .fold(0.0_f64, f64::max);
            if best > 0.0 {
                similar.push(SimilarManuscript {
                    version_id: version_id.clone(),
                    similarity: best,
                });
            }
        }

        Ok(ranked(similar))
    }

    fn find_similar_manuscripts_to_abstract(
        &self,
        text: &str,
    ) -> Result<Vec<SimilarManuscript>, SimilarityError> {
        let query = self.vectorize(text);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let similar = self
            .vectors
            .iter()
            .map(|(version_id, vector)| SimilarManuscript {
                version_id: version_id.clone(),
                similarity: dot(&query, vector),
            })
            .filter(|candidate| candidate.similarity > 0.0)
            .collect();

        Ok(ranked(similar))
    }
}

/// Lowercase alphanumeric runs longer than two characters.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 2)
        .map(str::to_lowercase)
}

/// L2-normalised TF-IDF weights, so cosine similarity reduces to a dot product.
fn weigh(counts: &HashMap<String, usize>, idf: &HashMap<String, f64>) -> TermVector {
    let mut vector: TermVector = counts
        .iter()
        .filter_map(|(term, count)| {
            idf.get(term)
                .map(|weight| (term.clone(), *count as f64 * weight))
        })
        .collect();

    let norm = vector.values().map(|weight| weight * weight).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
    vector
}

fn dot(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let result: f64 = small
        .iter()
        .filter_map(|(term, weight)| large.get(term).map(|other| weight * other))
        .sum();

    if result.is_finite() {
        result.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn ranked(mut similar: Vec<SimilarManuscript>) -> Vec<SimilarManuscript> {
    similar.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.version_id.cmp(&b.version_id))
    });
    similar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::NoSimilarity;

    fn oracle() -> TermSimilarity {
        TermSimilarity::from_documents(vec![
            (
                VersionId::new("m1"),
                "Cortical neurons fire in synchronised bursts during sleep",
            ),
            (
                VersionId::new("m2"),
                "Synchronised bursts of cortical neurons during slow wave sleep",
            ),
            (
                VersionId::new("m3"),
                "Soil microbiome diversity across alpine meadows",
            ),
            (VersionId::new("m4"), "a of"),
        ])
    }

    #[test]
    fn short_tokens_are_ignored() {
        let tokens: Vec<String> = tokenize("An RNA-seq of T cells").collect();
        assert_eq!(tokens, vec!["rna", "seq", "cells"]);
        assert_eq!(oracle().len(), 3);
    }

    #[test]
    fn abstract_lookup_ranks_related_text_first() {
        let similar = oracle()
            .find_similar_manuscripts_to_abstract("bursts of cortical neurons in sleep")
            .expect("lookup succeeds");

        assert_eq!(similar.len(), 2);
        assert!(similar[0].similarity >= similar[1].similarity);
        assert!(similar.iter().all(|row| row.version_id != VersionId::new("m3")));
        assert!(similar.iter().all(|row| row.similarity <= 1.0));
    }

    #[test]
    fn manuscript_lookup_excludes_queried_versions() {
        let similar = oracle()
            .find_similar_manuscripts(&BTreeSet::from([VersionId::new("m1")]))
            .expect("lookup succeeds");

        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].version_id, VersionId::new("m2"));
        assert!(similar[0].similarity > 0.0);
    }

    #[test]
    fn unknown_inputs_yield_empty_tables() {
        let oracle = oracle();
        assert!(oracle
            .find_similar_manuscripts(&BTreeSet::from([VersionId::new("missing")]))
            .expect("lookup succeeds")
            .is_empty());
        assert!(oracle
            .find_similar_manuscripts_to_abstract("quantum chromodynamics")
            .expect("lookup succeeds")
            .is_empty());
        assert!(NoSimilarity
            .find_similar_manuscripts_to_abstract("cortical neurons")
            .expect("lookup succeeds")
            .is_empty());
    }

    #[test]
    fn identical_text_is_fully_similar() {
        let oracle = TermSimilarity::from_documents(vec![
            (VersionId::new("a"), "hippocampal place cells"),
            (VersionId::new("b"), "hippocampal place cells"),
        ]);
        let similar = oracle
            .find_similar_manuscripts(&BTreeSet::from([VersionId::new("a")]))
            .expect("lookup succeeds");

        assert!((similar[0].similarity - 1.0).abs() < 1e-9);
    }
}
