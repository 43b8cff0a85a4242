use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::snapshot::normalizer::{clean_label, label_key};

/// Many-to-many mapping between entities and case-insensitive subject areas.
///
/// An empty query yields an empty id set. Callers that mean "no restriction" must skip
/// the lookup instead of passing an empty set.
#[derive(Debug, Clone)]
pub struct SubjectAreaIndex<Id> {
    ids_by_subject_area: HashMap<String, BTreeSet<Id>>,
    subject_areas_by_id: BTreeMap<Id, BTreeSet<String>>,
    display_by_subject_area: BTreeMap<String, String>,
}

impl<Id: Ord + Clone> Default for SubjectAreaIndex<Id> {
    fn default() -> Self {
        Self {
            ids_by_subject_area: HashMap::new(),
            subject_areas_by_id: BTreeMap::new(),
            display_by_subject_area: BTreeMap::new(),
        }
    }
}

impl<Id: Ord + Clone> SubjectAreaIndex<Id> {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Id, &'a str)>,
    {
        let mut index = Self::default();

        for (id, subject_area) in entries {
            let key = label_key(subject_area);
            if key.is_empty() {
                continue;
            }

            let display = index
                .display_by_subject_area
                .entry(key.clone())
                .or_insert_with(|| clean_label(subject_area))
                .clone();
            index
                .subject_areas_by_id
                .entry(id.clone())
                .or_default()
                .insert(display);
            index.ids_by_subject_area.entry(key).or_default().insert(id);
        }

        index
    }

    pub fn get_ids_by_subject_areas<I, S>(&self, subject_areas: I) -> BTreeSet<Id>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        subject_areas
            .into_iter()
            .filter_map(|subject_area| {
                self.ids_by_subject_area
                    .get(&label_key(subject_area.as_ref()))
            })
            .flat_map(|ids| ids.iter().cloned())
            .collect()
    }

    pub fn get_subject_areas_by_id(&self, id: &Id) -> BTreeSet<String> {
        self.subject_areas_by_id.get(id).cloned().unwrap_or_default()
    }

    pub fn get_all_subject_areas(&self) -> BTreeSet<String> {
        self.display_by_subject_area.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SubjectAreaIndex<u32> {
        SubjectAreaIndex::from_entries(vec![
            (1, "Neuroscience"),
            (2, "neuroscience "),
            (2, "Cell Biology"),
            (3, "Ecology"),
        ])
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let ids = index().get_ids_by_subject_areas(["NEUROSCIENCE"]);
        assert_eq!(ids, BTreeSet::from([1, 2]));
    }

    #[test]
    fn empty_subject_area_set_matches_nothing() {
        let empty: BTreeSet<String> = BTreeSet::new();
        assert!(index().get_ids_by_subject_areas(&empty).is_empty());
    }

    #[test]
    fn unknown_id_has_no_subject_areas() {
        assert!(index().get_subject_areas_by_id(&99).is_empty());
        assert_eq!(
            index().get_subject_areas_by_id(&2),
            BTreeSet::from(["Cell Biology".to_string(), "Neuroscience".to_string()])
        );
    }

    #[test]
    fn all_subject_areas_are_sorted_and_deduplicated() {
        let all: Vec<String> = index().get_all_subject_areas().into_iter().collect();
        assert_eq!(all, vec!["Cell Biology", "Ecology", "Neuroscience"]);
    }
}
