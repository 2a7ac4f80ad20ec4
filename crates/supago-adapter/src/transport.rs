//! HTTP transport.
//!
//! One authenticated round trip per call. Non-2xx statuses come back as
//! [`SupabaseError::NotFound`] / [`SupabaseError::HttpStatus`] carrying the
//! raw body; network failures come back as [`SupabaseError::Transport`].

use std::fmt;

use async_trait::async_trait;

use crate::builder::RequestBuilder;
use crate::error::{Result, SupabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    /// Whether the request carries the builder's payload as its body.
    pub fn sends_body(self) -> bool {
        matches!(self, Method::Post | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Patch => write!(f, "PATCH"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one round trip and return the raw 2xx response body.
    async fn send(&self, method: Method, request: &RequestBuilder) -> Result<Vec<u8>>;
}

/// `reqwest`-backed transport. No timeout beyond the client's defaults and
/// no retries.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: Method, request: &RequestBuilder) -> Result<Vec<u8>> {
        let http_method = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut req = self.client.request(http_method, request.url());
        for (name, value) in request.headers() {
            req = req.header(name.as_str(), value.as_str());
        }
        if method.sends_body()
            && let Some(payload) = request.payload()
        {
            req = req.body(serde_json::to_vec(payload)?);
        }

        tracing::debug!(method = %method, url = %request.url(), "supabase request");

        let resp = req
            .send()
            .await
            .map_err(|e| SupabaseError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| SupabaseError::Transport(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body).into_owned();
            tracing::debug!(status = status.as_u16(), url = %request.url(), "supabase request failed");
            return Err(SupabaseError::from_status(status.as_u16(), request.url(), text));
        }

        Ok(body.to_vec())
    }
}
