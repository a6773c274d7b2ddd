//! Branch-aware database name resolution
//!
//! Each feature branch queries an isolated database clone named
//! `<base>_<BRANCH_TOKEN>`, while trunk branches query the base
//! database directly. File paths always use the base database name, so
//! repository layout stays stable across branches.
//!
//! The token conversion here is deliberately stricter than the
//! filesystem normalizer in `ddlsync-core`: it must produce a valid
//! warehouse identifier, so it collapses underscore runs, forces a
//! letter/underscore start, and caps the length.

/// Branches that query the base database unmodified
pub fn is_trunk_branch(branch: &str) -> bool {
    branch == "main" || branch == "master"
}

/// Convert a branch name to a warehouse identifier token.
///
/// Output always matches `^[A-Z_][A-Z0-9_]*$`, is at most 50
/// characters, and is `BRANCH` for empty input.
pub fn branch_token(branch: &str) -> String {
    if branch.is_empty() {
        return "BRANCH".to_string();
    }

    let replaced: String = branch
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let prefixed = match replaced.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => replaced,
        _ => format!("branch_{}", replaced),
    };

    let mut collapsed = String::with_capacity(prefixed.len());
    let mut prev_underscore = false;
    for c in prefixed.chars() {
        if c == '_' {
            if !prev_underscore {
                collapsed.push(c);
            }
            prev_underscore = true;
        } else {
            collapsed.push(c);
            prev_underscore = false;
        }
    }

    let stripped = collapsed.trim_matches('_');
    let mut token = if stripped.is_empty() {
        "branch".to_string()
    } else {
        stripped.to_string()
    };
    token.truncate(50);
    token.to_ascii_uppercase()
}

/// Which database one sync run queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDatabaseName {
    /// Database name from the profile; file paths always use this
    pub base_database: String,

    /// Converted branch token, absent on a trunk branch
    pub branch_token: Option<String>,

    /// Database name to query
    pub resolved_name: String,
}

/// Derive the database to query from the active branch.
///
/// A missing branch (detached HEAD, not a repository) is treated as a
/// non-trunk branch and resolves with the literal `BRANCH` token.
pub fn resolve_database(base_database: &str, branch: Option<&str>) -> BranchDatabaseName {
    match branch {
        Some(name) if is_trunk_branch(name) => BranchDatabaseName {
            base_database: base_database.to_string(),
            branch_token: None,
            resolved_name: base_database.to_string(),
        },
        other => {
            let token = branch_token(other.unwrap_or(""));
            BranchDatabaseName {
                base_database: base_database.to_string(),
                resolved_name: format!("{}_{}", base_database, token),
                branch_token: Some(token),
            }
        }
    }
}
