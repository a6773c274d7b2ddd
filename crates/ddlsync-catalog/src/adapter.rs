//! Adapter contract for warehouse integrations

use async_trait::async_trait;
use ddlsync_core::{ObjectKind, ObjectRecord};

/// Errors surfaced by catalog adapters
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// Auth failure, unreachable warehouse, unsupported auth variant,
    /// or a failed listing/catalog query. Fatal to the extraction call
    /// it occurs in.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Missing or invalid configuration for the adapter
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Capability set required of any warehouse integration.
///
/// Each extraction operation lazily connects when no live session
/// exists; all operations block until the warehouse answers. Per-object
/// DDL retrieval failures never surface as `Err`; they are captured on
/// the individual [`ObjectRecord`]. Only a failed listing or catalog
/// query fails the whole call.
#[async_trait]
pub trait DatabaseAdapter: Send + std::fmt::Debug {
    /// Platform identifier this adapter serves, e.g. "snowflake"
    fn platform(&self) -> &'static str;

    /// Establish a session with the warehouse
    async fn connect(&mut self) -> Result<(), CatalogError>;

    /// Drop the session. Safe to call when not connected; underlying
    /// close errors are swallowed.
    async fn disconnect(&mut self);

    /// Issue a trivial round-trip query. Failure is always an error,
    /// never a boolean.
    async fn test_connection(&mut self) -> Result<(), CatalogError>;

    async fn get_tables(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError>;

    async fn get_views(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError>;

    async fn get_materialized_views(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError>;

    async fn get_stages(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError>;

    /// Continuous-ingest pipes (Snowflake-specific object kind)
    async fn get_snowpipes(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError>;

    async fn get_stored_procedures(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError>;

    /// Dispatch extraction by object kind
    async fn extract(
        &mut self,
        kind: ObjectKind,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        match kind {
            ObjectKind::Table => self.get_tables(database, schema).await,
            ObjectKind::View => self.get_views(database, schema).await,
            ObjectKind::MaterializedView => self.get_materialized_views(database, schema).await,
            ObjectKind::Stage => self.get_stages(database, schema).await,
            ObjectKind::Pipe => self.get_snowpipes(database, schema).await,
            ObjectKind::Procedure => self.get_stored_procedures(database, schema).await,
        }
    }
}
