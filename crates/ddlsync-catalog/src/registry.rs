//! Registry mapping platform identifiers to adapter constructors
//!
//! Constructed once at process start and passed to whatever resolves
//! adapters; there is no ambient global registry.

use crate::adapter::{CatalogError, DatabaseAdapter};
use crate::snowflake::SnowflakeAdapter;
use ddlsync_core::ProfileConfig;
use std::collections::HashMap;

/// Builds an adapter from a profile. The whole profile is passed
/// through; the adapter reads only the fields it needs.
pub type AdapterConstructor =
    Box<dyn Fn(&ProfileConfig) -> Result<Box<dyn DatabaseAdapter>, CatalogError> + Send + Sync>;

/// Platform identifier -> adapter constructor map.
///
/// Lookup is case-insensitive. Re-registration is legal and replaces
/// the prior constructor, which is how tests install doubles.
pub struct AdapterRegistry {
    constructors: HashMap<String, AdapterConstructor>,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with every built-in adapter registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("snowflake", |profile| {
            Ok(Box::new(SnowflakeAdapter::from_profile(profile)?) as Box<dyn DatabaseAdapter>)
        });
        registry
    }

    /// Insert or replace the constructor for a platform identifier
    pub fn register<F>(&mut self, platform_id: &str, constructor: F)
    where
        F: Fn(&ProfileConfig) -> Result<Box<dyn DatabaseAdapter>, CatalogError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(platform_id.to_lowercase(), Box::new(constructor));
    }

    /// Construct the adapter for a profile's platform
    pub fn resolve(&self, profile: &ProfileConfig) -> Result<Box<dyn DatabaseAdapter>, CatalogError> {
        let platform = profile.platform.trim();
        if platform.is_empty() {
            return Err(CatalogError::Configuration(
                "No platform specified in config".to_string(),
            ));
        }

        match self.constructors.get(&platform.to_lowercase()) {
            Some(constructor) => constructor(profile),
            None => Err(CatalogError::Configuration(format!(
                "No adapter registered for platform '{}'",
                platform
            ))),
        }
    }

    /// Registered platform identifiers
    pub fn platforms(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAdapter;
    use pretty_assertions::assert_eq;

    fn profile_for(platform: &str) -> ProfileConfig {
        ProfileConfig {
            platform: platform.to_string(),
            account: Some("acct".to_string()),
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
            database: Some("DB".to_string()),
            schema: Some("S".to_string()),
            ..ProfileConfig::default()
        }
    }

    #[test]
    fn resolves_builtin_snowflake() {
        let registry = AdapterRegistry::with_defaults();
        let adapter = registry.resolve(&profile_for("snowflake")).unwrap();
        assert_eq!(adapter.platform(), "snowflake");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = AdapterRegistry::with_defaults();
        assert!(registry.resolve(&profile_for("SnowFlake")).is_ok());
    }

    #[test]
    fn unknown_platform_is_an_error() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry.resolve(&profile_for("unknown")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: No adapter registered for platform 'unknown'"
        );
    }

    #[test]
    fn missing_platform_is_an_error() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry.resolve(&ProfileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No platform specified in config"));
    }

    #[test]
    fn reregistration_replaces_constructor() {
        let mut registry = AdapterRegistry::with_defaults();
        registry.register("snowflake", |_| {
            Ok(Box::new(MockAdapter::new()) as Box<dyn DatabaseAdapter>)
        });

        let adapter = registry.resolve(&profile_for("snowflake")).unwrap();
        assert_eq!(adapter.platform(), "mock");
    }

    #[test]
    fn platforms_lists_registered_ids() {
        let mut registry = AdapterRegistry::new();
        registry.register("Dummy", |_| {
            Ok(Box::new(MockAdapter::new()) as Box<dyn DatabaseAdapter>)
        });
        assert_eq!(registry.platforms(), vec!["dummy"]);
    }
}
