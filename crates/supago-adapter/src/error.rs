//! Error types for the adapter crate.

use std::fmt;

use supago_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while talking to a Supabase project.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Rejected before any HTTP call (empty table name, missing credential).
    #[error("validation error: {0}")]
    Validation(String),

    /// Connection refused, timeout, or an unreadable response.
    #[error("failed to execute request: {0}")]
    Transport(String),

    /// HTTP 404. The requested view, table or function does not exist.
    #[error("request failed with status 404: {body}")]
    NotFound { url: String, body: String },

    /// Any other non-2xx response.
    #[error("request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body does not have the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Every probing tier ran without producing a definitive answer.
    #[error("could not determine whether function '{function}' exists: {reason}")]
    AmbiguousProbe { function: String, reason: String },

    /// Request payload could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A schema resolution step failed.
    #[error("{step} failed for table '{table}': {source}")]
    Resolve {
        table: String,
        step: ResolveStep,
        #[source]
        source: Box<SupabaseError>,
    },
}

/// The schema-resolution step an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStep {
    CheckingView,
    CreatingView,
    FetchingColumns,
    ListingTables,
}

impl fmt::Display for ResolveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveStep::CheckingView => write!(f, "checking schema view"),
            ResolveStep::CreatingView => write!(f, "creating schema view"),
            ResolveStep::FetchingColumns => write!(f, "fetching columns"),
            ResolveStep::ListingTables => write!(f, "listing tables"),
        }
    }
}

impl From<ConfigError> for SupabaseError {
    fn from(err: ConfigError) -> Self {
        SupabaseError::Validation(err.to_string())
    }
}

impl SupabaseError {
    /// Build the error for a non-2xx response.
    pub fn from_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        if status == 404 {
            SupabaseError::NotFound {
                url: url.into(),
                body: body.into(),
            }
        } else {
            SupabaseError::HttpStatus {
                status,
                body: body.into(),
            }
        }
    }

    /// Tag this error with the resolution step it came from.
    pub fn during(self, table: &str, step: ResolveStep) -> Self {
        SupabaseError::Resolve {
            table: table.to_string(),
            step,
            source: Box::new(self),
        }
    }

    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SupabaseError::NotFound { .. } => Some(404),
            SupabaseError::HttpStatus { status, .. } => Some(*status),
            SupabaseError::Resolve { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Response body of a status error.
    pub fn body(&self) -> Option<&str> {
        match self {
            SupabaseError::NotFound { body, .. } | SupabaseError::HttpStatus { body, .. } => {
                Some(body)
            }
            SupabaseError::Resolve { source, .. } => source.body(),
            _ => None,
        }
    }

    /// Whether the server reported the resource as absent.
    ///
    /// A 404 is the primary signal. PostgREST schema-cache misses are also
    /// recognised by their "Could not find" message whatever the status code;
    /// that text match depends on upstream wording.
    pub fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404))
            || self.body().is_some_and(|b| b.contains("Could not find"))
    }

    /// Whether PostgREST reported the called RPC function as absent.
    pub fn is_missing_function(&self) -> bool {
        self.body()
            .is_some_and(|b| b.contains("Could not find the function"))
    }
}

pub type Result<T, E = SupabaseError> = std::result::Result<T, E>;
