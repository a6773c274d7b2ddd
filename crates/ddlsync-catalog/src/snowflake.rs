//! Snowflake adapter
//!
//! Generic object kinds (tables, views, materialized views, stages,
//! pipes) are discovered with `SHOW ... IN SCHEMA` and their canonical
//! DDL fetched one object at a time with `GET_DDL`. A failed listing
//! fails the whole kind; a failed `GET_DDL` only marks that object's
//! record and extraction continues with its siblings.
//!
//! Stored procedures have no `GET_DDL`-style shortcut. Their DDL is
//! reconstructed from `INFORMATION_SCHEMA.PROCEDURES` rows: name,
//! argument signature, language, body and return type. A row missing
//! any of those fields fails only that procedure's record.
//!
//! ## Authentication
//!
//! Password, key-pair (PEM file read from `private_key_path`) and
//! `externalbrowser`. The browser variant is recognized but rejected at
//! connect time: `snowflake-api` has no interactive SSO flow. Anything
//! else is a hard connection error.
//!
//! Compiled against the warehouse only with the `snowflake` feature;
//! without it, network operations return a configuration error.

use crate::adapter::{CatalogError, DatabaseAdapter};
use async_trait::async_trait;
use ddlsync_core::{ObjectKind, ObjectRecord, ProfileConfig};

#[cfg(feature = "snowflake")]
use snowflake_api::{QueryResult, SnowflakeApi};

#[cfg(feature = "snowflake")]
use arrow_array::cast::AsArray;

#[cfg(feature = "snowflake")]
use arrow_array::{Array, RecordBatch, StringArray};

/// Authentication variants the adapter recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthMethod {
    Password,
    PrivateKey,
    ExternalBrowser,
}

impl AuthMethod {
    /// Parse the profile's `auth_method` field; absent means password.
    fn parse(raw: Option<&str>) -> Result<Self, CatalogError> {
        match raw.unwrap_or("password").to_ascii_lowercase().as_str() {
            "password" => Ok(AuthMethod::Password),
            "private_key" | "key_pair" => Ok(AuthMethod::PrivateKey),
            "externalbrowser" => Ok(AuthMethod::ExternalBrowser),
            other => Err(CatalogError::Connection(format!(
                "Unsupported authentication method '{}'",
                other
            ))),
        }
    }
}

/// One raw row of the procedure catalog query. Every field is optional
/// because the warehouse can return NULL for any of them; validation
/// happens during reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureRow {
    pub name: Option<String>,
    pub argument_signature: Option<String>,
    pub language: Option<String>,
    pub body: Option<String>,
    pub return_type: Option<String>,
}

/// Rebuild a `CREATE OR REPLACE PROCEDURE` statement from a catalog row.
///
/// Non-SQL bodies (JavaScript, Python, ...) are fenced in `$$` markers:
/// they may contain characters that would otherwise terminate the
/// surrounding statement. Native SQL bodies are appended directly.
///
/// Returns the DDL text and the language, or the reason the row could
/// not be reconstructed.
fn rebuild_procedure_ddl(
    database: &str,
    schema: &str,
    row: &ProcedureRow,
) -> Result<(String, String), String> {
    fn require<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, String> {
        value
            .as_deref()
            .ok_or_else(|| format!("missing {} in procedure catalog row", field))
    }

    let name = require("PROCEDURE_NAME", &row.name)?;
    let signature = require("ARGUMENT_SIGNATURE", &row.argument_signature)?;
    let language = require("PROCEDURE_LANGUAGE", &row.language)?;
    let body = require("PROCEDURE_DEFINITION", &row.body)?;
    let return_type = require("DATA_TYPE", &row.return_type)?;

    let mut ddl = format!(
        "CREATE OR REPLACE PROCEDURE {}.{}.{} {}\nRETURNS {}\nLANGUAGE {}\nAS\n",
        database, schema, name, signature, return_type, language
    );

    if language.eq_ignore_ascii_case("sql") {
        ddl.push_str(body.trim());
    } else {
        ddl.push_str("$$\n");
        ddl.push_str(body.trim());
        ddl.push_str("\n$$");
    }

    Ok((ddl, language.to_string()))
}

/// Turn a catalog row into an object record, capturing reconstruction
/// failures on the record rather than failing the batch.
pub fn procedure_record(database: &str, schema: &str, row: &ProcedureRow) -> ObjectRecord {
    let name = row.name.clone().unwrap_or_else(|| "<unknown>".to_string());
    match rebuild_procedure_ddl(database, schema, row) {
        Ok((ddl, language)) => {
            ObjectRecord::with_ddl(name, ObjectKind::Procedure, database, schema, ddl)
                .with_language(language)
        }
        Err(reason) => {
            ObjectRecord::with_error(name, ObjectKind::Procedure, database, schema, reason)
        }
    }
}

/// Snowflake warehouse adapter
#[derive(Debug)]
pub struct SnowflakeAdapter {
    account: String,
    username: String,
    auth_method: Option<String>,
    password: Option<String>,
    private_key_path: Option<String>,
    warehouse: Option<String>,
    role: Option<String>,

    #[cfg(feature = "snowflake")]
    api: Option<SnowflakeApi>,
}

impl SnowflakeAdapter {
    /// Build an adapter from a profile. Only connection fields are read
    /// here; database and schema arrive per extraction call.
    pub fn from_profile(profile: &ProfileConfig) -> Result<Self, CatalogError> {
        let account = profile
            .account
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing_field("account"))?;
        let username = profile
            .username
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing_field("username"))?;

        Ok(Self {
            account,
            username,
            auth_method: profile.auth_method.clone(),
            password: profile.password.clone(),
            private_key_path: profile.private_key_path.clone(),
            warehouse: profile.warehouse.clone(),
            role: profile.role.clone(),
            #[cfg(feature = "snowflake")]
            api: None,
        })
    }
}

fn missing_field(field: &str) -> CatalogError {
    CatalogError::Configuration(format!("Snowflake profile missing required field: {}", field))
}

#[cfg(feature = "snowflake")]
impl SnowflakeAdapter {
    async fn connect_impl(&mut self) -> Result<(), CatalogError> {
        if self.api.is_some() {
            return Ok(());
        }

        let api = match AuthMethod::parse(self.auth_method.as_deref())? {
            AuthMethod::Password => {
                let password = self.password.as_deref().filter(|s| !s.is_empty()).ok_or_else(
                    || {
                        CatalogError::Connection(
                            "Password authentication requires the 'password' profile field"
                                .to_string(),
                        )
                    },
                )?;
                SnowflakeApi::with_password_auth(
                    &self.account,
                    self.warehouse.as_deref(),
                    None,
                    None,
                    &self.username,
                    self.role.as_deref(),
                    password,
                )
                .map_err(|e| {
                    CatalogError::Connection(format!(
                        "Failed to connect to Snowflake account '{}': {}",
                        self.account, e
                    ))
                })?
            }
            AuthMethod::PrivateKey => {
                let path = self
                    .private_key_path
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        CatalogError::Connection(
                            "Key-pair authentication requires the 'private_key_path' profile field"
                                .to_string(),
                        )
                    })?;
                let pem = std::fs::read_to_string(path).map_err(|e| {
                    CatalogError::Connection(format!(
                        "Cannot read private key file '{}': {}",
                        path, e
                    ))
                })?;
                SnowflakeApi::with_certificate_auth(
                    &self.account,
                    self.warehouse.as_deref(),
                    None,
                    None,
                    &self.username,
                    self.role.as_deref(),
                    &pem,
                )
                .map_err(|e| {
                    CatalogError::Connection(format!(
                        "Failed to authenticate with key-pair for account '{}': {}",
                        self.account, e
                    ))
                })?
            }
            AuthMethod::ExternalBrowser => {
                return Err(CatalogError::Connection(
                    "externalbrowser authentication is not supported by this driver; \
                     use password or private_key"
                        .to_string(),
                ));
            }
        };

        tracing::debug!(account = %self.account, "opened snowflake session");
        self.api = Some(api);
        Ok(())
    }

    /// Run a query on the live session, connecting first if needed
    async fn exec(&mut self, sql: &str) -> Result<QueryResult, CatalogError> {
        self.connect_impl().await?;
        let api = self
            .api
            .as_ref()
            .ok_or_else(|| CatalogError::Connection("no live Snowflake session".to_string()))?;
        api.exec(sql)
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))
    }

    async fn probe(&mut self) -> Result<(), CatalogError> {
        self.exec("SELECT 1").await.map_err(|e| match e {
            CatalogError::Connection(msg) => {
                CatalogError::Connection(format!("Connection test failed: {}", msg))
            }
            other => other,
        })?;
        Ok(())
    }

    /// Names returned by a `SHOW` statement
    async fn list_names(&mut self, list_sql: &str) -> Result<Vec<String>, CatalogError> {
        let result = self.exec(list_sql).await?;
        let mut names = Vec::new();
        match result {
            QueryResult::Arrow(batches) => {
                for batch in &batches {
                    let column = string_column(batch, "name")?;
                    for row in 0..batch.num_rows() {
                        if !column.is_null(row) {
                            names.push(column.value(row).to_string());
                        }
                    }
                }
            }
            QueryResult::Empty => {}
            QueryResult::Json(_) => {
                return Err(CatalogError::Connection(
                    "Unexpected JSON result format from listing query".to_string(),
                ));
            }
        }
        Ok(names)
    }

    /// First column of the first row, as text (`GET_DDL` result shape)
    async fn fetch_scalar(&mut self, sql: &str) -> Result<String, CatalogError> {
        let result = self.exec(sql).await?;
        match result {
            QueryResult::Arrow(batches) => {
                for batch in &batches {
                    if batch.num_columns() > 0 && batch.num_rows() > 0 {
                        let column = batch.column(0).as_string::<i32>();
                        if !column.is_null(0) {
                            return Ok(column.value(0).to_string());
                        }
                    }
                }
                Err(CatalogError::Connection("empty result".to_string()))
            }
            QueryResult::Empty => Err(CatalogError::Connection("empty result".to_string())),
            QueryResult::Json(_) => Err(CatalogError::Connection(
                "Unexpected JSON result format".to_string(),
            )),
        }
    }

    /// SHOW + per-object GET_DDL extraction for the generic kinds
    async fn extract_generic(
        &mut self,
        kind: ObjectKind,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        let list_sql = kind
            .list_statement(database, schema)
            .ok_or_else(|| CatalogError::Configuration(format!("{} has no listing statement", kind)))?;
        let ddl_type = kind
            .get_ddl_type()
            .ok_or_else(|| CatalogError::Configuration(format!("{} has no GET_DDL type", kind)))?;

        // Listing failure means the whole kind is inaccessible.
        let names = self.list_names(&list_sql).await.map_err(|e| match e {
            CatalogError::Connection(msg) => CatalogError::Connection(format!(
                "Failed to list {} objects in {}.{}: {}",
                kind, database, schema, msg
            )),
            other => other,
        })?;

        let mut records = Vec::with_capacity(names.len());
        for name in names {
            let sql = format!(
                "SELECT GET_DDL('{}', '{}.{}.{}')",
                ddl_type, database, schema, name
            );
            match self.fetch_scalar(&sql).await {
                Ok(ddl) => {
                    records.push(ObjectRecord::with_ddl(name, kind, database, schema, ddl));
                }
                Err(e) => {
                    // Isolated object problem; siblings continue.
                    tracing::warn!(kind = %kind, object = %name, error = %e, "DDL fetch failed");
                    records.push(ObjectRecord::with_error(
                        name,
                        kind,
                        database,
                        schema,
                        e.to_string(),
                    ));
                }
            }
        }
        Ok(records)
    }

    async fn extract_procedures(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        let sql = format!(
            "SELECT PROCEDURE_NAME, ARGUMENT_SIGNATURE, PROCEDURE_LANGUAGE, \
             PROCEDURE_DEFINITION, DATA_TYPE \
             FROM {}.INFORMATION_SCHEMA.PROCEDURES \
             WHERE PROCEDURE_SCHEMA = '{}' \
             ORDER BY PROCEDURE_NAME",
            database,
            schema.to_uppercase()
        );

        // Only a failed catalog query is fatal; bad rows become
        // per-record errors below.
        let result = self.exec(&sql).await.map_err(|e| match e {
            CatalogError::Connection(msg) => CatalogError::Connection(format!(
                "Failed to query procedure catalog for {}.{}: {}",
                database, schema, msg
            )),
            other => other,
        })?;

        let mut records = Vec::new();
        match result {
            QueryResult::Arrow(batches) => {
                for batch in &batches {
                    let names = string_column(batch, "PROCEDURE_NAME")?;
                    let signatures = string_column(batch, "ARGUMENT_SIGNATURE")?;
                    let languages = string_column(batch, "PROCEDURE_LANGUAGE")?;
                    let bodies = string_column(batch, "PROCEDURE_DEFINITION")?;
                    let return_types = string_column(batch, "DATA_TYPE")?;

                    for row in 0..batch.num_rows() {
                        let raw = ProcedureRow {
                            name: optional_value(names, row),
                            argument_signature: optional_value(signatures, row),
                            language: optional_value(languages, row),
                            body: optional_value(bodies, row),
                            return_type: optional_value(return_types, row),
                        };
                        records.push(procedure_record(database, schema, &raw));
                    }
                }
            }
            QueryResult::Empty => {}
            QueryResult::Json(_) => {
                return Err(CatalogError::Connection(
                    "Unexpected JSON result format from procedure catalog query".to_string(),
                ));
            }
        }
        Ok(records)
    }
}

#[cfg(feature = "snowflake")]
fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, CatalogError> {
    let schema = batch.schema_ref();
    let index = schema
        .fields()
        .iter()
        .position(|f| f.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            CatalogError::Connection(format!("Malformed result set: missing column '{}'", name))
        })?;
    Ok(batch.column(index).as_string::<i32>())
}

#[cfg(feature = "snowflake")]
fn optional_value(column: &StringArray, row: usize) -> Option<String> {
    if column.is_null(row) {
        None
    } else {
        Some(column.value(row).to_string())
    }
}

#[cfg(not(feature = "snowflake"))]
impl SnowflakeAdapter {
    fn not_compiled() -> CatalogError {
        CatalogError::Configuration(
            "Snowflake support not compiled. Rebuild with: cargo build --features snowflake"
                .to_string(),
        )
    }

    async fn connect_impl(&mut self) -> Result<(), CatalogError> {
        // Surface an unsupported auth variant even without the SDK.
        AuthMethod::parse(self.auth_method.as_deref())?;
        Err(Self::not_compiled())
    }

    async fn probe(&mut self) -> Result<(), CatalogError> {
        Err(Self::not_compiled())
    }

    async fn extract_generic(
        &mut self,
        _kind: ObjectKind,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        Err(Self::not_compiled())
    }

    async fn extract_procedures(
        &mut self,
        _database: &str,
        _schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        Err(Self::not_compiled())
    }
}

#[async_trait]
impl DatabaseAdapter for SnowflakeAdapter {
    fn platform(&self) -> &'static str {
        "snowflake"
    }

    async fn connect(&mut self) -> Result<(), CatalogError> {
        self.connect_impl().await
    }

    async fn disconnect(&mut self) {
        #[cfg(feature = "snowflake")]
        {
            // Dropping the client closes the session; close errors are
            // irrelevant to a disconnect.
            self.api = None;
        }
    }

    async fn test_connection(&mut self) -> Result<(), CatalogError> {
        self.probe().await
    }

    async fn get_tables(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.extract_generic(ObjectKind::Table, database, schema).await
    }

    async fn get_views(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.extract_generic(ObjectKind::View, database, schema).await
    }

    async fn get_materialized_views(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.extract_generic(ObjectKind::MaterializedView, database, schema)
            .await
    }

    async fn get_stages(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.extract_generic(ObjectKind::Stage, database, schema).await
    }

    async fn get_snowpipes(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.extract_generic(ObjectKind::Pipe, database, schema).await
    }

    async fn get_stored_procedures(
        &mut self,
        database: &str,
        schema: &str,
    ) -> Result<Vec<ObjectRecord>, CatalogError> {
        self.extract_procedures(database, schema).await
    }
}
