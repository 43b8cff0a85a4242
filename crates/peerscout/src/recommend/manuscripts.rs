use std::collections::HashMap;

use super::response::ManuscriptView;
use crate::snapshot::normalizer::label_key;

/// Most recent first: published date, then title, then version id, all descending.
pub(crate) fn sort_manuscripts_by_date(manuscripts: &mut [ManuscriptView]) {
    manuscripts.sort_by(|a, b| {
        b.published_date
            .cmp(&a.published_date)
            .then_with(|| b.title.cmp(&a.title))
            .then_with(|| b.version_id.cmp(&a.version_id))
    });
}

/// Collapse versions sharing a title into the most recent one's `alternatives`.
pub(crate) fn duplicate_titles_as_alternatives(
    mut manuscripts: Vec<ManuscriptView>,
) -> Vec<ManuscriptView> {
    sort_manuscripts_by_date(&mut manuscripts);

    let mut result: Vec<ManuscriptView> = Vec::with_capacity(manuscripts.len());
    let mut position_by_title: HashMap<String, usize> = HashMap::new();

    for manuscript in manuscripts {
        let title_key = manuscript
            .title
            .as_deref()
            .map(label_key)
            .filter(|key| !key.is_empty());

        match title_key {
            Some(key) => match position_by_title.get(&key) {
                Some(&position) => result[position].alternatives.push(manuscript),
                None => {
                    position_by_title.insert(key, result.len());
                    result.push(manuscript);
                }
            },
            None => result.push(manuscript),
        }
    }

    result
}
