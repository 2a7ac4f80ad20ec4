//! Configuration types for Supago.
//!
//! Configuration is read from a flat YAML file (`app.yaml` by default) whose
//! keys mirror the environment variables that can override them:
//!
//! ```yaml
//! SERVER_HOST: "localhost"
//! SERVER_PORT: "8080"
//! MAX_SERVER_REQUEST_BODY_SIZE: 1048576
//! SUPABASE_PROJECT_ID: "abcdefghijklmnop"
//! SUPABASE_API_KEY: "<service role key>"
//! SUPABASE_ANON_KEY: "<anon key>"
//! SUPABASE_ACCESS_TOKEN: "<personal access token>"
//! ```
//!
//! The loaded configuration is immutable for the lifetime of the process.

pub mod server;
pub mod supabase;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use server::ServerConfig;
pub use supabase::SupabaseConfig;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "app.yaml";

/// Where to obtain a Management API access token.
pub const ACCESS_TOKEN_URL: &str = "https://supabase.com/dashboard/account/tokens";

/// Complete Supago configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupagoConfig {
    /// Settings for `supago server`.
    #[serde(flatten)]
    pub server: ServerConfig,

    /// Supabase project and credentials.
    #[serde(flatten)]
    pub supabase: SupabaseConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{key} is required{hint}")]
    MissingCredential { key: &'static str, hint: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SupagoConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Override file values with environment variables of the same name.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override file values from an arbitrary lookup (environment, test maps).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.server.apply_overrides(&lookup)?;
        self.supabase.apply_overrides(&lookup);
        Ok(())
    }
}

/// Replace `target` with the looked-up value when present and non-empty.
pub(crate) fn override_string<F>(lookup: &F, key: &str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
        *target = value;
    }
}
