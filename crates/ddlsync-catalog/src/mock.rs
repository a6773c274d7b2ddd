//! Mock adapter for testing
//!
//! Returns preloaded records without touching a warehouse. Supports
//! simulating a failed connection and kind-level listing failures, so
//! the orchestrator's partial-failure boundaries can be exercised.

use crate::adapter::{CatalogError, DatabaseAdapter};
use async_trait::async_trait;
use ddlsync_core::{ObjectKind, ObjectRecord};
use std::collections::HashMap;

/// In-memory adapter returning canned extraction results
#[derive(Debug, Default)]
pub struct MockAdapter {
    records: HashMap<ObjectKind, Vec<ObjectRecord>>,
    kind_failures: HashMap<ObjectKind, String>,
    fail_connection: bool,
    connected: bool,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload records to return for a kind
    pub fn with_records(mut self, kind: ObjectKind, records: Vec<ObjectRecord>) -> Self {
        self.records.insert(kind, records);
        self
    }

    /// Make extraction of one kind fail fatally, as a failed listing would
    pub fn with_kind_failure(mut self, kind: ObjectKind, message: impl Into<String>) -> Self {
        self.kind_failures.insert(kind, message.into());
        self
    }

    /// Make connect and test_connection fail
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Whether a (lazy) connect has happened
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    async fn fetch(
        &mut self,
        kind: ObjectKind,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        if !self.connected {
            self.connect().await?;
        }
        if let Some(message) = self.kind_failures.get(&kind) {
            return Err(CatalogError::Connection(message.clone()));
        }
        Ok(self.records.get(&kind).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DatabaseAdapter for MockAdapter {
    fn platform(&self) -> &'static str {
        "mock"
    }

    async fn connect(&mut self) -> Result<(), CatalogError> {
        if self.fail_connection {
            return Err(CatalogError::Connection(
                "Simulated connection failure".to_string(),
            ));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }

    async fn test_connection(&mut self) -> Result<(), CatalogError> {
        self.connect().await
    }

    async fn get_tables(
        &mut self,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.fetch(ObjectKind::Table).await
    }

    async fn get_views(
        &mut self,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.fetch(ObjectKind::View).await
    }

    async fn get_materialized_views(
        &mut self,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.fetch(ObjectKind::MaterializedView).await
    }

    async fn get_stages(
        &mut self,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.fetch(ObjectKind::Stage).await
    }

    async fn get_snowpipes(
        &mut self,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.fetch(ObjectKind::Pipe).await
    }

    async fn get_stored_procedures(
        &mut self,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.fetch(ObjectKind::Procedure).await
    }
}
