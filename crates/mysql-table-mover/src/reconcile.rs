//! Common column projection between the two sides of a table.

use std::collections::HashSet;

/// Columns present on both sides, in source order, minus `skip`.
///
/// An empty result means there is nothing to migrate for the table.
pub fn reconcile<S: AsRef<str>>(
    source_columns: &[String],
    target_columns: &[String],
    skip: &[S],
) -> Vec<String> {
    let target: HashSet<&str> = target_columns.iter().map(String::as_str).collect();
    let skip: HashSet<&str> = skip.iter().map(AsRef::as_ref).collect();
    let mut seen = HashSet::new();

    source_columns
        .iter()
        .filter(|c| target.contains(c.as_str()) && !skip.contains(c.as_str()))
        .filter(|c| seen.insert(c.as_str()))
        .cloned()
        .collect()
}
