//! Recording in-memory transport for unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use supago_core::SupabaseConfig;

use crate::builder::RequestBuilder;
use crate::client::SupabaseClient;
use crate::error::{Result, SupabaseError};
use crate::transport::{Method, Transport};

pub(crate) fn settings() -> SupabaseConfig {
    SupabaseConfig {
        project_id: "test-project".to_string(),
        service_key: "test-api-key".to_string(),
        anon_key: "test-anon-key".to_string(),
        access_token: "test-access-token".to_string(),
        rest_url_override: Some("http://rest.test".to_string()),
        management_url_override: Some("http://mgmt.test/v1/projects/test-project".to_string()),
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body(String),
    Status(u16, String),
    Network(String),
}

impl Reply {
    pub(crate) fn json(value: Value) -> Self {
        Reply::Body(value.to_string())
    }

    pub(crate) fn not_found(body: &str) -> Self {
        Reply::Status(404, body.to_string())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Option<Value>,
}

impl RecordedCall {
    pub(crate) fn sql(&self) -> Option<&str> {
        self.payload.as_ref()?.get("query")?.as_str()
    }
}

#[derive(Debug)]
struct Route {
    method: Method,
    url_fragment: String,
    body_fragment: Option<String>,
    reply: Reply,
}

#[derive(Debug, Default)]
struct State {
    routes: Vec<Route>,
    calls: Vec<RecordedCall>,
}

/// Routes are matched in insertion order on method, URL substring and an
/// optional payload substring. Unmatched calls answer `[]`.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn client(&self, settings: SupabaseConfig) -> SupabaseClient {
        SupabaseClient::with_transport(Arc::new(settings), Arc::new(self.clone()))
    }

    pub(crate) fn on(&self, method: Method, url_fragment: &str, reply: Reply) -> &Self {
        self.push(method, url_fragment, None, reply)
    }

    pub(crate) fn on_sql(&self, sql_fragment: &str, reply: Reply) -> &Self {
        self.push(Method::Post, "/database/query", Some(sql_fragment), reply)
    }

    fn push(
        &self,
        method: Method,
        url_fragment: &str,
        body_fragment: Option<&str>,
        reply: Reply,
    ) -> &Self {
        self.state.lock().unwrap().routes.push(Route {
            method,
            url_fragment: url_fragment.to_string(),
            body_fragment: body_fragment.map(str::to_string),
            reply,
        });
        self
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls whose URL contains `url_fragment`.
    pub(crate) fn count(&self, method: Method, url_fragment: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.url.contains(url_fragment))
            .count()
    }

    /// Management API SQL statements, in call order.
    pub(crate) fn sql_calls(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|c| c.url.ends_with("/database/query"))
            .filter_map(|c| c.sql().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, method: Method, request: &RequestBuilder) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        let call = RecordedCall {
            method,
            url: request.url().to_string(),
            headers: request.headers().clone(),
            payload: request.payload().cloned(),
        };
        // Match SQL against the statement text, not its JSON encoding.
        let body_text = match call.sql() {
            Some(sql) => sql.to_string(),
            None => call
                .payload
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_default(),
        };

        let reply = state
            .routes
            .iter()
            .find(|r| {
                r.method == method
                    && call.url.contains(&r.url_fragment)
                    && r
                        .body_fragment
                        .as_ref()
                        .is_none_or(|f| body_text.contains(f.as_str()))
            })
            .map(|r| r.reply.clone())
            .unwrap_or_else(|| Reply::Body("[]".to_string()));
        state.calls.push(call);

        match reply {
            Reply::Body(body) => Ok(body.into_bytes()),
            Reply::Status(status, body) => {
                Err(SupabaseError::from_status(status, request.url(), body))
            }
            Reply::Network(reason) => Err(SupabaseError::Transport(reason)),
        }
    }
}
