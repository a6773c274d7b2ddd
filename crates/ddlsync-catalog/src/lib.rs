//! Warehouse catalog adapters for DDL extraction
//!
//! This crate defines the capability contract every warehouse
//! integration must satisfy, a registry mapping platform identifiers to
//! adapter constructors, and the Snowflake reference adapter.
//!
//! ## Features
//!
//! Warehouse SDKs are compiled in via Cargo features:
//! - `snowflake` - Snowflake support via `snowflake-api`
//!
//! Without the feature, the Snowflake adapter still constructs (so
//! registry and orchestration logic stay testable) but its network
//! operations fail with a descriptive configuration error.

pub mod adapter;
pub mod mock;
pub mod registry;
pub mod snowflake;

pub use adapter::{CatalogError, DatabaseAdapter};
pub use mock::MockAdapter;
pub use registry::{AdapterConstructor, AdapterRegistry};
pub use snowflake::{procedure_record, ProcedureRow, SnowflakeAdapter};
