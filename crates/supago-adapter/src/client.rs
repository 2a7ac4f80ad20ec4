//! Supabase client: read/write/update/delete over the REST API and raw SQL
//! over the Management API.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use supago_core::SupabaseConfig;

use crate::builder::RequestBuilder;
use crate::error::{Result, SupabaseError};
use crate::transport::{HttpTransport, Method, Transport};

#[derive(Clone)]
pub struct SupabaseClient {
    settings: Arc<SupabaseConfig>,
    transport: Arc<dyn Transport>,
}

impl SupabaseClient {
    /// Client over the default HTTP transport.
    pub fn new(settings: SupabaseConfig) -> Self {
        Self::with_transport(Arc::new(settings), Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(settings: Arc<SupabaseConfig>, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    pub fn settings(&self) -> &SupabaseConfig {
        &self.settings
    }

    /// Fresh REST request descriptor. Every sub-request of a logical
    /// operation starts from here.
    pub fn request(&self) -> RequestBuilder {
        RequestBuilder::new(Arc::clone(&self.settings))
    }

    /// Shorthand for `request().from(table)`.
    pub fn from(&self, table: &str) -> RequestBuilder {
        self.request().from(table)
    }

    /// GET.
    pub async fn read(&self, request: &RequestBuilder) -> Result<Vec<u8>> {
        self.transport.send(Method::Get, request).await
    }

    /// POST, with the payload as body when present.
    pub async fn write(&self, request: &RequestBuilder) -> Result<Vec<u8>> {
        self.transport.send(Method::Post, request).await
    }

    /// PATCH, with the payload as body when present.
    pub async fn update(&self, request: &RequestBuilder) -> Result<Vec<u8>> {
        self.transport.send(Method::Patch, request).await
    }

    /// DELETE, without body.
    pub async fn delete(&self, request: &RequestBuilder) -> Result<Vec<u8>> {
        self.transport.send(Method::Delete, request).await
    }

    /// Run `query` through `POST {management}/database/query`.
    ///
    /// Rejected without any HTTP call when the access token or project id
    /// is missing.
    pub async fn execute_sql(&self, query: &str) -> Result<Vec<u8>> {
        self.settings.ensure_management_access()?;
        let request = RequestBuilder::sql(Arc::clone(&self.settings), query);
        self.transport.send(Method::Post, &request).await
    }
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("rest_url", &self.settings.rest_url())
            .field("management_url", &self.settings.management_url())
            .finish_non_exhaustive()
    }
}

/// Parse a JSON response body.
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| SupabaseError::Decode(format!("failed to parse {what}: {e}")))
}
