//! ddlsync core
//!
//! Domain model shared by every other crate: object records produced by
//! extraction, sync outcome aggregation, profile configuration, and the
//! filesystem name normalizer.

pub mod config;
pub mod naming;
pub mod record;

pub use config::{ConfigError, ConfigManager, ProfileConfig};
pub use naming::normalize_name;
pub use record::{ObjectKind, ObjectRecord, SyncOutcome};
