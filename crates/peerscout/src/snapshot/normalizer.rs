/// Canonical display form of a label: invisible characters removed and whitespace collapsed.
pub(crate) fn clean_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive lookup key for keywords, subject areas, and stage names.
pub(crate) fn label_key(value: &str) -> String {
    clean_label(value).to_lowercase()
}

pub(crate) fn email_key(value: &str) -> String {
    value.trim().to_lowercase()
}
