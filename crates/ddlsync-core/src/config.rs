//! Profile configuration (~/.ddlsync.toml)
//!
//! One TOML file holds every connection profile plus the name of the
//! active one. Each profile is a table keyed by profile name:
//!
//! ```toml
//! active_profile = "prod"
//!
//! [prod]
//! platform = "snowflake"
//! account = "xy12345"
//! username = "deploy"
//! database = "ANALYTICS"
//! schema = "PUBLIC"
//! repo_path = "/srv/ddl-repo"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Connection and repository settings for one named profile.
///
/// Which fields are required depends on `platform`; the adapter reads
/// only the fields it needs. Validation happens on `set_profile` and
/// on demand via [`ConfigManager::validate_profile`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Warehouse platform identifier, e.g. "snowflake"
    #[serde(default)]
    pub platform: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Authentication variant: "password" (default), "private_key",
    /// or "externalbrowser"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,

    /// PEM key file path, private_key auth only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Local git repository DDL files are written into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,

    /// Stage and commit written files at the end of each sync
    #[serde(default)]
    pub commit_on_sync: bool,
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid TOML configuration file: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_profile: Option<String>,

    #[serde(flatten)]
    profiles: BTreeMap<String, ProfileConfig>,
}

/// Loads, validates and persists the profile file.
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
    file: ConfigFile,
}

impl ConfigManager {
    /// Load from the default location (`~/.ddlsync.toml`)
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(Self::default_path())
    }

    /// Load from an explicit path; a missing file yields an empty store
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let file = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
            let file: ConfigFile =
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
            Self::validate_structure(&file)?;
            file
        } else {
            ConfigFile::default()
        };
        Ok(Self { path, file })
    }

    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ddlsync.toml")
    }

    /// Path this manager reads and writes
    pub fn config_path(&self) -> &Path {
        &self.path
    }

    fn validate_structure(file: &ConfigFile) -> Result<(), ConfigError> {
        if let Some(active) = &file.active_profile {
            if !active.is_empty() && !file.profiles.contains_key(active) {
                return Err(ConfigError::Invalid(format!(
                    "Active profile '{}' does not exist",
                    active
                )));
            }
        }
        Ok(())
    }

    fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        let contents = toml::to_string_pretty(&self.file)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(&self.path, contents).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Name of the active profile, if one is set
    pub fn get_active_profile(&self) -> Option<&str> {
        self.file.active_profile.as_deref().filter(|s| !s.is_empty())
    }

    /// Set the active profile; it must exist
    pub fn set_active_profile(&mut self, profile_name: &str) -> Result<(), ConfigError> {
        if !self.profile_exists(profile_name) {
            return Err(ConfigError::Invalid(format!(
                "Profile '{}' does not exist",
                profile_name
            )));
        }
        self.file.active_profile = Some(profile_name.to_string());
        self.save()
    }

    /// Configuration for a specific profile
    pub fn get_profile(&self, profile_name: &str) -> Option<&ProfileConfig> {
        self.file.profiles.get(profile_name)
    }

    /// Configuration for the active profile
    pub fn get_active_profile_config(&self) -> Option<&ProfileConfig> {
        self.get_active_profile().and_then(|name| {
            // validate_structure guarantees presence for loaded files
            self.file.profiles.get(name)
        })
    }

    /// Insert or replace a profile after validating it
    pub fn set_profile(
        &mut self,
        profile_name: &str,
        profile: ProfileConfig,
    ) -> Result<(), ConfigError> {
        if profile_name.is_empty() {
            return Err(ConfigError::Invalid(
                "Profile name must be a non-empty string".to_string(),
            ));
        }
        Self::validate_profile_config(&profile)?;
        self.file.profiles.insert(profile_name.to_string(), profile);
        self.save()
    }

    /// All profile names, sorted
    pub fn list_profiles(&self) -> Vec<&str> {
        self.file.profiles.keys().map(String::as_str).collect()
    }

    /// Remove a profile; the active profile cannot be removed
    pub fn delete_profile(&mut self, profile_name: &str) -> Result<(), ConfigError> {
        if !self.profile_exists(profile_name) {
            return Err(ConfigError::Invalid(format!(
                "Profile '{}' does not exist",
                profile_name
            )));
        }
        if self.get_active_profile() == Some(profile_name) {
            return Err(ConfigError::Invalid(format!(
                "Cannot delete active profile '{}'. Set a different active profile first.",
                profile_name
            )));
        }
        self.file.profiles.remove(profile_name);
        self.save()
    }

    pub fn profile_exists(&self, profile_name: &str) -> bool {
        self.file.profiles.contains_key(profile_name)
    }

    /// Validate a stored profile, returning every problem found
    pub fn validate_profile(&self, profile_name: &str) -> Vec<String> {
        let Some(profile) = self.get_profile(profile_name) else {
            return vec![format!("Profile '{}' does not exist", profile_name)];
        };
        match Self::validate_profile_config(profile) {
            Ok(()) => Vec::new(),
            Err(e) => vec![e.to_string()],
        }
    }

    /// Check the platform-specific required fields
    pub fn validate_profile_config(profile: &ProfileConfig) -> Result<(), ConfigError> {
        if profile.platform.is_empty() {
            return Err(ConfigError::Invalid(
                "Platform must be a non-empty string".to_string(),
            ));
        }

        if profile.platform.eq_ignore_ascii_case("snowflake") {
            let required = [
                ("account", &profile.account),
                ("username", &profile.username),
                ("database", &profile.database),
                ("schema", &profile.schema),
            ];
            for (field, value) in required {
                if value.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::Invalid(format!(
                        "Snowflake profile missing required field: {}",
                        field
                    )));
                }
            }
        }

        Ok(())
    }
}
