//! ddlsync engine
//!
//! The synchronization core: branch-aware database name resolution,
//! deterministic DDL file layout, and the orchestrator that drives one
//! full extraction pass.

pub mod branch;
pub mod layout;
pub mod sync;

pub use branch::{branch_token, is_trunk_branch, resolve_database, BranchDatabaseName};
pub use layout::{ddl_file_path, write_ddl_file, MaterializeError, DDL_EXTENSION};
pub use sync::{run_sync, SyncError, SyncOptions};
