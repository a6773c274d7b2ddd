//! Object records produced by DDL extraction

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The kinds of database objects ddlsync extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    Table,
    View,
    MaterializedView,
    Stage,
    Pipe,
    Procedure,
}

impl ObjectKind {
    /// Every kind, in extraction order
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::MaterializedView,
        ObjectKind::Stage,
        ObjectKind::Pipe,
        ObjectKind::Procedure,
    ];

    /// Canonical uppercase name, used in file paths and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::MaterializedView => "MATERIALIZED_VIEW",
            ObjectKind::Stage => "STAGE",
            ObjectKind::Pipe => "PIPE",
            ObjectKind::Procedure => "PROCEDURE",
        }
    }

    /// The `SHOW` statement that lists objects of this kind in a schema.
    ///
    /// Mapped explicitly per kind; mechanical pluralization of the kind
    /// name breaks for irregular plurals. Procedures are not listed via
    /// `SHOW` at all (they are reconstructed from the catalog) and
    /// return `None`.
    pub fn list_statement(&self, database: &str, schema: &str) -> Option<String> {
        let keyword = match self {
            ObjectKind::Table => "TABLES",
            ObjectKind::View => "VIEWS",
            ObjectKind::MaterializedView => "MATERIALIZED VIEWS",
            ObjectKind::Stage => "STAGES",
            ObjectKind::Pipe => "PIPES",
            ObjectKind::Procedure => return None,
        };
        Some(format!("SHOW {} IN SCHEMA {}.{}", keyword, database, schema))
    }

    /// The object-type argument for `GET_DDL`.
    ///
    /// Snowflake reconstructs materialized views through the `VIEW`
    /// path. Procedures have no introspection shortcut and return
    /// `None`.
    pub fn get_ddl_type(&self) -> Option<&'static str> {
        match self {
            ObjectKind::Table => Some("TABLE"),
            ObjectKind::View | ObjectKind::MaterializedView => Some("VIEW"),
            ObjectKind::Stage => Some("STAGE"),
            ObjectKind::Pipe => Some("PIPE"),
            ObjectKind::Procedure => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One extracted database object.
///
/// At most one of `ddl` / `error` is populated: a record either carries
/// the object's DDL text or the reason retrieval failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    pub kind: ObjectKind,
    pub database: String,
    pub schema: String,

    /// Canonical DDL text, absent when retrieval failed
    pub ddl: Option<String>,

    /// Implementation language, procedures only
    pub language: Option<String>,

    /// Retrieval failure description, absent on success
    pub error: Option<String>,
}

impl ObjectRecord {
    /// Create a successful record carrying DDL text
    pub fn with_ddl(
        name: impl Into<String>,
        kind: ObjectKind,
        database: impl Into<String>,
        schema: impl Into<String>,
        ddl: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            database: database.into(),
            schema: schema.into(),
            ddl: Some(ddl.into()),
            language: None,
            error: None,
        }
    }

    /// Create a failed record carrying the failure description
    pub fn with_error(
        name: impl Into<String>,
        kind: ObjectKind,
        database: impl Into<String>,
        schema: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            database: database.into(),
            schema: schema.into(),
            ddl: None,
            language: None,
            error: Some(error.into()),
        }
    }

    /// Set the implementation language
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Fully qualified name
    pub fn fqn(&self) -> String {
        format!("{}.{}.{}", self.database, self.schema, self.name)
    }

    /// True when the record carries DDL and no error
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.ddl.is_some()
    }
}

/// Aggregate result of one synchronization run
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Objects seen, plus one per object kind whose listing failed
    pub total: usize,
    pub successful: usize,
    pub failed: usize,

    /// Paths written during this run (empty in dry-run mode)
    pub written: Vec<PathBuf>,

    /// Per-object failure descriptions, `<KIND> <name>: <reason>`
    pub failures: Vec<String>,

    /// Whether a commit was made for this run
    pub committed: bool,

    /// Staging/commit failure, reported without reverting written files
    pub vcs_error: Option<String>,
}

impl SyncOutcome {
    /// Record a successfully materialized object
    pub fn record_success(&mut self, path: Option<PathBuf>) {
        self.total += 1;
        self.successful += 1;
        if let Some(path) = path {
            self.written.push(path);
        }
    }

    /// Record a failed object with its triage description
    pub fn record_failure(&mut self, description: impl Into<String>) {
        self.total += 1;
        self.failed += 1;
        self.failures.push(description.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_list_statements_are_explicit() {
        assert_eq!(
            ObjectKind::Table.list_statement("DB", "S").as_deref(),
            Some("SHOW TABLES IN SCHEMA DB.S")
        );
        assert_eq!(
            ObjectKind::MaterializedView.list_statement("DB", "S").as_deref(),
            Some("SHOW MATERIALIZED VIEWS IN SCHEMA DB.S")
        );
        assert_eq!(
            ObjectKind::Pipe.list_statement("DB", "S").as_deref(),
            Some("SHOW PIPES IN SCHEMA DB.S")
        );
        assert_eq!(ObjectKind::Procedure.list_statement("DB", "S"), None);
    }

    #[test]
    fn get_ddl_types() {
        assert_eq!(ObjectKind::Table.get_ddl_type(), Some("TABLE"));
        assert_eq!(ObjectKind::MaterializedView.get_ddl_type(), Some("VIEW"));
        assert_eq!(ObjectKind::Procedure.get_ddl_type(), None);
    }

    #[test]
    fn record_success_and_error_are_exclusive() {
        let ok = ObjectRecord::with_ddl("T", ObjectKind::Table, "DB", "S", "CREATE TABLE T ();");
        assert!(ok.is_success());
        assert!(ok.error.is_none());

        let bad = ObjectRecord::with_error("T", ObjectKind::Table, "DB", "S", "boom");
        assert!(!bad.is_success());
        assert!(bad.ddl.is_none());
        assert_eq!(bad.fqn(), "DB.S.T");
    }

    #[test]
    fn outcome_aggregation() {
        let mut outcome = SyncOutcome::default();
        outcome.record_success(Some(PathBuf::from("/tmp/a.sql")));
        outcome.record_success(None);
        outcome.record_failure("TABLE BAD: listing failed");

        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.successful, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.written.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
    }
}
