//! Filesystem name normalization
//!
//! Maps arbitrary warehouse identifiers to filesystem-safe tokens.
//! Distinct from the branch token rules in the engine crate: this one
//! never collapses repeated underscores, so `a--b` and `a-b` map to
//! different paths.

/// Normalize an object name for use as a path component.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, then the whole
/// token is lowercased. Total and idempotent.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
