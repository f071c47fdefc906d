use std::collections::HashSet;

use crate::ValidationError;

/// Trim a required field, rejecting it when nothing is left.
pub fn required(field: &'static str, value: impl AsRef<str>) -> Result<String, ValidationError> {
    let trimmed = value.as_ref().trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty(field));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional field. Whitespace-only values collapse to `None`.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim every item and drop the empty ones. Duplicates are kept.
pub fn clean_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Normalize a type-tag list: trim, upper-case, drop empties.
///
/// Unlike [`clean_list`], a repeated tag is an error rather than being
/// collapsed; the first repeat in input order is reported.
pub fn normalize_types<I, S>(field: &'static str, items: I) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for item in items {
        let tag = item.as_ref().trim().to_uppercase();
        if tag.is_empty() {
            continue;
        }
        if !seen.insert(tag.clone()) {
            return Err(ValidationError::DuplicateTypeTag { field, tag });
        }
        tags.push(tag);
    }

    Ok(tags)
}

/// Use the caller's identifier if it survives trimming, otherwise mint one.
pub fn id_or_generate(field: &'static str, id: Option<String>) -> Result<String, ValidationError> {
    match id {
        Some(id) => required(field, id),
        None => Ok(generate_id()),
    }
}

/// Random process-unique identifier. Not sequential, not sortable.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
