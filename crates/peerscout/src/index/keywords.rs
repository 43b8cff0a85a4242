use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::snapshot::normalizer::{clean_label, label_key};

/// Keyword associations for one kind of entity (manuscript versions or persons).
///
/// An entity's score for a query of `n` distinct keywords is the sum of its matched
/// keyword weights divided by `n`, capped at 1.0.
#[derive(Debug, Clone)]
pub struct KeywordIndex<Id> {
    weights_by_keyword: HashMap<String, BTreeMap<Id, f64>>,
    keywords_by_id: BTreeMap<Id, BTreeSet<String>>,
    display_by_keyword: BTreeMap<String, String>,
}

impl<Id: Ord + Clone> Default for KeywordIndex<Id> {
    fn default() -> Self {
        Self {
            weights_by_keyword: HashMap::new(),
            keywords_by_id: BTreeMap::new(),
            display_by_keyword: BTreeMap::new(),
        }
    }
}

impl<Id: Ord + Clone> KeywordIndex<Id> {
    /// Build from `(id, keyword, weight)` triples; repeated pairs keep the highest weight.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Id, &'a str, f64)>,
    {
        let mut index = Self::default();

        for (id, keyword, weight) in entries {
            let key = label_key(keyword);
            if key.is_empty() {
                continue;
            }
            let weight = if weight.is_finite() {
                weight.clamp(0.0, 1.0)
            } else {
                0.0
            };

            let display = index
                .display_by_keyword
                .entry(key.clone())
                .or_insert_with(|| clean_label(keyword))
                .clone();
            index
                .keywords_by_id
                .entry(id.clone())
                .or_default()
                .insert(display);

            let slot = index
                .weights_by_keyword
                .entry(key)
                .or_default()
                .entry(id)
                .or_insert(0.0);
            if weight > *slot {
                *slot = weight;
            }
        }

        index
    }

    /// Relevance of every entity matching at least one keyword; absent ids score zero.
    pub fn get_keyword_scores<S: AsRef<str>>(&self, keyword_list: &[S]) -> BTreeMap<Id, f64> {
        let query: BTreeSet<String> = keyword_list
            .iter()
            .map(|keyword| label_key(keyword.as_ref()))
            .filter(|key| !key.is_empty())
            .collect();

        if query.is_empty() {
            return BTreeMap::new();
        }

        let mut totals: BTreeMap<Id, f64> = BTreeMap::new();
        for key in &query {
            if let Some(weights) = self.weights_by_keyword.get(key) {
                for (id, weight) in weights {
                    *totals.entry(id.clone()).or_insert(0.0) += *weight;
                }
            }
        }

        let count = query.len() as f64;
        totals
            .into_iter()
            .map(|(id, total)| (id, (total / count).min(1.0)))
            .filter(|(_, score)| *score > 0.0)
            .collect()
    }

    pub fn get_all_keywords(&self) -> BTreeSet<String> {
        self.display_by_keyword.values().cloned().collect()
    }

    pub fn get_keywords_by_ids<'a, I>(&self, ids: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        ids.into_iter()
            .filter_map(|id| self.keywords_by_id.get(id))
            .flat_map(|keywords| keywords.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keywords_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords_by_id.is_empty()
    }
}
