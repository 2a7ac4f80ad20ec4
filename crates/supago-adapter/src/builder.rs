//! Request descriptors for the Supabase REST and Management APIs.
//!
//! A [`RequestBuilder`] is a plain value: every method consumes it and
//! returns the updated descriptor. Forking a request means cloning it, which
//! deep-copies the URL, payload and headers while sharing the read-only
//! settings. The REST, RPC and Management shapes therefore never leak into
//! each other between calls of one logical operation.
//!
//! Filters follow the PostgREST query-string convention:
//!
//! ```text
//! /rest/v1/blogs?select=id,title&status=eq.published&order=created_at.desc&limit=10
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};
use supago_core::SupabaseConfig;

pub const HEADER_API_KEY: &str = "apikey";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_PREFER: &str = "Prefer";

/// `Accept` value asking PostgREST for a single object instead of an array.
pub const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
/// `Prefer` value for insert-or-merge.
pub const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    url: String,
    payload: Option<Value>,
    headers: BTreeMap<String, String>,
    settings: Arc<SupabaseConfig>,
}

impl RequestBuilder {
    /// Base REST request, authenticated with the anonymous key.
    pub fn new(settings: Arc<SupabaseConfig>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(HEADER_API_KEY.to_string(), settings.anon_key.clone());
        headers.insert(
            HEADER_AUTHORIZATION.to_string(),
            format!("Bearer {}", settings.anon_key),
        );
        headers.insert(HEADER_CONTENT_TYPE.to_string(), "application/json".to_string());

        Self {
            url: settings.rest_url(),
            payload: None,
            headers,
            settings,
        }
    }

    /// Raw SQL execution through the Management API
    /// (`POST {management}/database/query` with `{"query": ...}`),
    /// authenticated with the access token instead of the API keys.
    pub fn sql(settings: Arc<SupabaseConfig>, query: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            HEADER_AUTHORIZATION.to_string(),
            format!("Bearer {}", settings.access_token),
        );
        headers.insert(HEADER_CONTENT_TYPE.to_string(), "application/json".to_string());

        Self {
            url: format!("{}/database/query", settings.management_url()),
            payload: Some(json!({ "query": query })),
            headers,
            settings,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn settings(&self) -> &SupabaseConfig {
        &self.settings
    }

    pub fn set_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn set_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Target `{rest}/rest/v1/{table}`, discarding any previous URL state.
    pub fn from(mut self, table: &str) -> Self {
        self.url = format!("{}/rest/v1/{}", self.settings.rest_url(), table);
        self
    }

    pub fn select(self, columns: &str) -> Self {
        self.append_param(format!("select={}", columns))
    }

    pub fn eq(self, column: &str, value: &str) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: &str) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: &str) -> Self {
        self.filter(column, "gt", value)
    }

    pub fn lt(self, column: &str, value: &str) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn order(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.append_param(format!("order={}.{}", column, direction))
    }

    pub fn limit(self, limit: u64) -> Self {
        self.append_param(format!("limit={}", limit))
    }

    pub fn offset(self, offset: u64) -> Self {
        self.append_param(format!("offset={}", offset))
    }

    pub fn insert(self, data: Value) -> Self {
        self.set_payload(data)
    }

    pub fn upsert(self, data: Value) -> Self {
        self.set_payload(data)
            .add_header(HEADER_PREFER, MERGE_DUPLICATES)
    }

    pub fn single(self) -> Self {
        self.add_header(HEADER_ACCEPT, SINGLE_OBJECT)
    }

    /// Target `{rest}/rest/v1/rpc/{function}` with `params` as the JSON body,
    /// authenticated with the service key.
    pub fn rpc(mut self, function: &str, params: Option<Value>) -> Self {
        self.url = format!("{}/rest/v1/rpc/{}", self.settings.rest_url(), function);
        self.payload = params;
        let bearer = format!("Bearer {}", self.settings.service_key);
        self.add_header(HEADER_AUTHORIZATION, bearer)
    }

    fn filter(self, column: &str, op: &str, value: &str) -> Self {
        let param = format!("{}={}.{}", column, op, urlencoding::encode(value));
        self.append_param(param)
    }

    /// Append one query parameter; `?` for the first, `&` afterwards.
    /// No-op until a target URL is set.
    fn append_param(mut self, param: String) -> Self {
        if self.url.is_empty() {
            return self;
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        self.url.push(separator);
        self.url.push_str(&param);
        self
    }
}
