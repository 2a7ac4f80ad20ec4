//! Supabase project settings.
//!
//! Two endpoints are derived from the project id:
//! - the row-level REST base, `https://{project}.supabase.co`, authenticated
//!   with the anon/service API keys;
//! - the Management API base, `https://api.supabase.com/v1/projects/{project}`,
//!   authenticated with a personal access token.

use serde::{Deserialize, Serialize};

use super::{ACCESS_TOKEN_URL, ConfigError, override_string};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project reference (the subdomain of `*.supabase.co`).
    #[serde(rename = "SUPABASE_PROJECT_ID", default)]
    pub project_id: String,

    /// Service role key. Used for RPC calls.
    #[serde(rename = "SUPABASE_API_KEY", default)]
    pub service_key: String,

    /// Anonymous key. Used for row-level reads.
    #[serde(rename = "SUPABASE_ANON_KEY", default)]
    pub anon_key: String,

    /// Personal access token for the Management API.
    #[serde(rename = "SUPABASE_ACCESS_TOKEN", default)]
    pub access_token: String,

    /// Replaces the derived REST base (self-hosted gateways, tests).
    #[serde(
        rename = "SUPABASE_URL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rest_url_override: Option<String>,

    /// Replaces the derived Management API base.
    #[serde(
        rename = "SUPABASE_MANAGEMENT_URL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub management_url_override: Option<String>,
}

impl SupabaseConfig {
    /// Row-level REST base URL, without trailing slash.
    pub fn rest_url(&self) -> String {
        match self.rest_url_override.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.supabase.co", self.project_id),
        }
    }

    /// Management API base URL for this project, without trailing slash.
    pub fn management_url(&self) -> String {
        match self
            .management_url_override
            .as_deref()
            .filter(|u| !u.is_empty())
        {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://api.supabase.com/v1/projects/{}", self.project_id),
        }
    }

    /// Fail fast when the Management API cannot be used.
    ///
    /// Must be checked before any provisioning call so that a half-configured
    /// project is rejected up front instead of failing mid-sequence.
    pub fn ensure_management_access(&self) -> Result<(), ConfigError> {
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingCredential {
                key: "SUPABASE_ACCESS_TOKEN",
                hint: format!(
                    " for database setup. Get it from: {}",
                    ACCESS_TOKEN_URL
                ),
            });
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingCredential {
                key: "SUPABASE_PROJECT_ID",
                hint: ". It is the project reference shown in the dashboard URL".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        override_string(lookup, "SUPABASE_PROJECT_ID", &mut self.project_id);
        override_string(lookup, "SUPABASE_API_KEY", &mut self.service_key);
        override_string(lookup, "SUPABASE_ANON_KEY", &mut self.anon_key);
        override_string(lookup, "SUPABASE_ACCESS_TOKEN", &mut self.access_token);

        if let Some(url) = lookup("SUPABASE_URL").filter(|v| !v.is_empty()) {
            self.rest_url_override = Some(url);
        }
        if let Some(url) = lookup("SUPABASE_MANAGEMENT_URL").filter(|v| !v.is_empty()) {
            self.management_url_override = Some(url);
        }
    }
}
