//! Settings for the `supago server` HTTP listener.

use serde::{Deserialize, Deserializer, Serialize};

use super::{ConfigError, override_string};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host or address to bind.
    #[serde(rename = "SERVER_HOST", default = "default_host")]
    pub host: String,

    /// Port to bind. Accepts `8080`, `"8080"` or `":8080"`.
    #[serde(
        rename = "SERVER_PORT",
        default = "default_port",
        deserialize_with = "string_or_number"
    )]
    pub port: String,

    /// Maximum accepted request body, in bytes.
    #[serde(
        rename = "MAX_SERVER_REQUEST_BODY_SIZE",
        default = "default_max_request_body_size"
    )]
    pub max_request_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_body_size: default_max_request_body_size(),
        }
    }
}

impl ServerConfig {
    /// `host:port` socket address string.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port.trim_start_matches(':'))
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_string(lookup, "SERVER_HOST", &mut self.host);
        override_string(lookup, "SERVER_PORT", &mut self.port);

        if let Some(raw) = lookup("MAX_SERVER_REQUEST_BODY_SIZE").filter(|v| !v.is_empty()) {
            self.max_request_body_size = raw.parse().map_err(|_| {
                ConfigError::Config(format!(
                    "MAX_SERVER_REQUEST_BODY_SIZE must be a byte count, got '{}'",
                    raw
                ))
            })?;
        }
        Ok(())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> String {
    "8080".to_string()
}

fn default_max_request_body_size() -> usize {
    4 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_joins_host_and_port() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: "3000".to_string(),
            ..Default::default()
        };
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_address_tolerates_leading_colon() {
        let config = ServerConfig {
            port: ":8080".to_string(),
            ..Default::default()
        };
        assert_eq!(config.address(), "localhost:8080");
    }
}
