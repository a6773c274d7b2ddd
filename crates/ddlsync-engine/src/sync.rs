//! Sync orchestrator
//!
//! Drives one full synchronization pass:
//! resolve configuration -> construct adapter -> resolve branch
//! database -> extract per kind -> materialize -> optionally commit.
//!
//! Failure boundaries, from inner to outer: a per-object DDL failure is
//! data on the record (the adapter's boundary); a kind-level failure is
//! caught here, counted, and the loop continues with the next kind;
//! only structural problems (no repository path, no database/schema, no
//! adapter) abort the run.

use crate::branch::resolve_database;
use crate::layout::{write_ddl_file, DDL_EXTENSION};
use ddlsync_catalog::{AdapterRegistry, CatalogError};
use ddlsync_core::{ObjectKind, ProfileConfig, SyncOutcome};
use ddlsync_vcs::GitManager;
use std::path::Path;

/// Fatal orchestration errors; anything else degrades into counts on
/// the outcome
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Per-run switches
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Perform every step except file writes and git staging/commit
    pub dry_run: bool,

    /// Stage and commit written files at the end of the run
    pub commit: bool,

    /// Override for the commit message
    pub commit_message: Option<String>,
}

fn required<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, SyncError> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SyncError::Configuration(format!("No {} configured in profile", what)))
}

/// Run one synchronization pass for a profile.
///
/// Object kinds are extracted sequentially; a fatal error for one kind
/// never prevents the remaining kinds from running. Returns the
/// aggregate outcome; staging/commit failures are reported on the
/// outcome and never revert already-written files.
pub async fn run_sync(
    profile: &ProfileConfig,
    registry: &AdapterRegistry,
    options: &SyncOptions,
) -> Result<SyncOutcome, SyncError> {
    let repo_path = required(&profile.repo_path, "repository path")?;
    let base_database = required(&profile.database, "database")?;
    let schema = required(&profile.schema, "schema")?;

    // Adapter construction failure is structural.
    let mut adapter = registry.resolve(profile)?;

    let git = GitManager::new(repo_path);
    let branch = git.current_branch();
    let target = resolve_database(base_database, branch.as_deref());

    tracing::info!(
        platform = adapter.platform(),
        branch = branch.as_deref().unwrap_or("<none>"),
        database = %target.resolved_name,
        schema = %schema,
        dry_run = options.dry_run,
        "starting sync"
    );

    let mut outcome = SyncOutcome::default();

    for kind in ObjectKind::ALL {
        let records = match adapter.extract(kind, &target.resolved_name, schema).await {
            Ok(records) => records,
            Err(e) => {
                // Kind-level failure; the next kind still runs.
                tracing::warn!(kind = %kind, error = %e, "extraction failed for kind");
                outcome.record_failure(format!("{}: {}", kind, e));
                continue;
            }
        };

        tracing::debug!(kind = %kind, count = records.len(), "extracted records");

        for record in records {
            if !record.is_success() {
                let reason = record
                    .error
                    .as_deref()
                    .unwrap_or("no DDL returned")
                    .to_string();
                outcome.record_failure(format!("{} {}: {}", kind, record.name, reason));
                continue;
            }

            // `ddl` is present on a successful record
            let Some(ddl) = record.ddl.as_deref() else {
                outcome.record_failure(format!("{} {}: no DDL returned", kind, record.name));
                continue;
            };

            if options.dry_run {
                outcome.record_success(None);
                continue;
            }

            // Files are keyed by the base database name, not the
            // branch clone that was queried.
            match write_ddl_file(
                Path::new(repo_path),
                base_database,
                schema,
                kind.as_str(),
                &record.name,
                ddl,
                DDL_EXTENSION,
                true,
            ) {
                Ok(path) => outcome.record_success(Some(path)),
                Err(e) => {
                    tracing::warn!(kind = %kind, object = %record.name, error = %e, "write failed");
                    outcome.record_failure(format!("{} {}: {}", kind, record.name, e));
                }
            }
        }
    }

    adapter.disconnect().await;

    if options.commit && !options.dry_run && !outcome.written.is_empty() {
        let message = options
            .commit_message
            .clone()
            .unwrap_or_else(|| format!("Sync DDL for {}.{}", base_database, schema));

        let staged_and_committed = git.add_files(&outcome.written).and_then(|()| {
            git.commit(
                &message,
                profile.author_name.as_deref(),
                profile.author_email.as_deref(),
            )
        });

        match staged_and_committed {
            Ok(()) => outcome.committed = true,
            Err(e) => {
                // Written files stay on disk; the sync is not
                // transactional across the git boundary.
                tracing::warn!(error = %e, "staging/commit failed");
                outcome.vcs_error = Some(e.to_string());
            }
        }
    }

    tracing::info!(
        total = outcome.total,
        successful = outcome.successful,
        failed = outcome.failed,
        committed = outcome.committed,
        "sync finished"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddlsync_catalog::{DatabaseAdapter, MockAdapter};
    use ddlsync_core::ObjectRecord;

    fn profile(repo: &Path) -> ProfileConfig {
        ProfileConfig {
            platform: "mock".to_string(),
            database: Some("DB".to_string()),
            schema: Some("S".to_string()),
            repo_path: Some(repo.display().to_string()),
            author_name: Some("ddlsync".to_string()),
            author_email: Some("ddlsync@example.com".to_string()),
            ..ProfileConfig::default()
        }
    }

    fn registry_with<F>(build: F) -> AdapterRegistry
    where
        F: Fn() -> MockAdapter + Send + Sync + 'static,
    {
        let mut registry = AdapterRegistry::new();
        registry.register("mock", move |_| {
            Ok(Box::new(build()) as Box<dyn DatabaseAdapter>)
        });
        registry
    }

    fn table(name: &str) -> ObjectRecord {
        ObjectRecord::with_ddl(
            name,
            ObjectKind::Table,
            "DB",
            "S",
            format!("CREATE TABLE {} ();", name),
        )
    }

    #[tokio::test]
    async fn happy_path_writes_files_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(|| {
            MockAdapter::new()
                .with_records(ObjectKind::Table, vec![table("T1"), table("T2")])
                .with_records(
                    ObjectKind::View,
                    vec![ObjectRecord::with_ddl(
                        "V1",
                        ObjectKind::View,
                        "DB",
                        "S",
                        "CREATE VIEW V1 AS SELECT 1;",
                    )],
                )
        });

        let outcome = run_sync(&profile(dir.path()), &registry, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.successful, 3);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.written.len(), 3);
        assert!(dir.path().join("db/s/table/t1.sql").exists());
        assert!(dir.path().join("db/s/view/v1.sql").exists());
    }

    #[tokio::test]
    async fn kind_failure_does_not_stop_other_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(|| {
            MockAdapter::new()
                .with_kind_failure(ObjectKind::Table, "SHOW TABLES failed")
                .with_records(
                    ObjectKind::View,
                    vec![ObjectRecord::with_ddl(
                        "V1",
                        ObjectKind::View,
                        "DB",
                        "S",
                        "CREATE VIEW V1 AS SELECT 1;",
                    )],
                )
        });

        let outcome = run_sync(&profile(dir.path()), &registry, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.successful, 1);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.failures[0].contains("TABLE"));
        assert!(dir.path().join("db/s/view/v1.sql").exists());
    }

    #[tokio::test]
    async fn error_records_are_counted_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(|| {
            MockAdapter::new().with_records(
                ObjectKind::Table,
                vec![
                    table("GOOD"),
                    ObjectRecord::with_error("BAD", ObjectKind::Table, "DB", "S", "GET_DDL failed"),
                ],
            )
        });

        let outcome = run_sync(&profile(dir.path()), &registry, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.successful, 1);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.failures[0].contains("BAD"));
        assert!(outcome.failures[0].contains("GET_DDL failed"));
        assert!(!dir.path().join("db/s/table/bad.sql").exists());
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(|| {
            MockAdapter::new().with_records(ObjectKind::Table, vec![table("T1")])
        });

        let options = SyncOptions {
            dry_run: true,
            commit: true,
            ..SyncOptions::default()
        };
        let outcome = run_sync(&profile(dir.path()), &registry, &options)
            .await
            .unwrap();

        assert_eq!(outcome.successful, 1);
        assert!(outcome.written.is_empty());
        assert!(!outcome.committed);
        assert!(!dir.path().join("db").exists());
    }

    #[tokio::test]
    async fn missing_repo_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(MockAdapter::new);
        let mut profile = profile(dir.path());
        profile.repo_path = None;

        let err = run_sync(&profile, &registry, &SyncOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("repository path"));
    }

    #[tokio::test]
    async fn missing_database_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(MockAdapter::new);
        let mut profile = profile(dir.path());
        profile.database = None;

        assert!(run_sync(&profile, &registry, &SyncOptions::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn unknown_platform_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let registry = AdapterRegistry::new();

        let err = run_sync(&profile(dir.path()), &registry, &SyncOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No adapter registered"));
    }

    #[tokio::test]
    async fn connection_failure_degrades_to_per_kind_failures() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(|| MockAdapter::new().with_connection_failure());

        let outcome = run_sync(&profile(dir.path()), &registry, &SyncOptions::default())
            .await
            .unwrap();

        // Every kind fails to connect; the run itself completes.
        assert_eq!(outcome.failed, ObjectKind::ALL.len());
        assert_eq!(outcome.successful, 0);
    }

    #[tokio::test]
    async fn commit_on_sync_commits_written_files() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitManager::new(dir.path());
        git.init_repository().unwrap();

        let registry = registry_with(|| {
            MockAdapter::new().with_records(ObjectKind::Table, vec![table("T1")])
        });

        let options = SyncOptions {
            commit: true,
            ..SyncOptions::default()
        };
        let outcome = run_sync(&profile(dir.path()), &registry, &options)
            .await
            .unwrap();

        assert!(outcome.committed);
        assert!(outcome.vcs_error.is_none());
        assert!(!git.status().unwrap().dirty);
    }

    #[tokio::test]
    async fn commit_failure_is_reported_without_reverting() {
        // Not a git repository, so staging fails.
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(|| {
            MockAdapter::new().with_records(ObjectKind::Table, vec![table("T1")])
        });

        let options = SyncOptions {
            commit: true,
            ..SyncOptions::default()
        };
        let outcome = run_sync(&profile(dir.path()), &registry, &options)
            .await
            .unwrap();

        assert!(!outcome.committed);
        assert!(outcome.vcs_error.is_some());
        assert!(dir.path().join("db/s/table/t1.sql").exists());
    }

    #[tokio::test]
    async fn feature_branch_files_use_base_database_name() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitManager::new(dir.path());
        git.init_repository().unwrap();

        // Seed a commit so a feature branch can be created.
        std::fs::write(dir.path().join(".keep"), "").unwrap();
        git.add_files(&[dir.path().join(".keep")]).unwrap();
        git.commit("init", Some("t"), Some("t@example.com")).unwrap();
        std::process::Command::new("git")
            .args(["-C", &dir.path().display().to_string()])
            .args(["checkout", "-b", "feature/add-new-table"])
            .output()
            .unwrap();

        let registry = registry_with(|| {
            // The mock echoes whatever database it was asked for.
            MockAdapter::new().with_records(ObjectKind::Table, vec![table("T1")])
        });

        let outcome = run_sync(&profile(dir.path()), &registry, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.successful, 1);
        // Path uses the base database name, not DB_FEATURE_ADD_NEW_TABLE.
        assert!(dir.path().join("db/s/table/t1.sql").exists());
    }
}
