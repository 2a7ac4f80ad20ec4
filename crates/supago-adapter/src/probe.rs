//! Function existence probing.
//!
//! Whether a function exists in the `public` schema is decided by an
//! ordered decision table. Each row is tried until one gives a definitive
//! answer:
//!
//! | step | condition                                        | next                |
//! |------|--------------------------------------------------|---------------------|
//! | 1    | `exec_sql` RPC ok, body is `[{"exists": b}, ..]` | answer `b`          |
//! | 1    | RPC error "Could not find the function"          | step 3              |
//! | 1    | any other RPC error                              | step 3              |
//! | 2    | RPC ok, body empty, `null` or `[]`               | step 3              |
//! | 2    | RPC ok, body of any other shape                  | step 3              |
//! | 3    | Management API listing ok                        | exact name match    |
//! | 3    | listing empty                                    | answer `false`      |
//! | 3    | listing unparseable                              | `AmbiguousProbe`    |
//! | 3    | listing request failed                           | propagate the error |
//!
//! Step 2 exists because `exec_sql` is declared `RETURNS void`: when it is
//! provisioned the RPC succeeds with an empty body, which says nothing about
//! the probed function.

use serde::Deserialize;
use serde_json::json;

use crate::client::{SupabaseClient, decode};
use crate::error::{Result, SupabaseError};
use crate::sql;

/// Which probe produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTier {
    /// `pg_catalog` count through the `exec_sql` RPC.
    ExecSqlRpc,
    /// Function listing through the Management API.
    ManagementListing,
}

/// Why the primary probe handed over to the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallthrough {
    /// `exec_sql` itself is not provisioned.
    ExecSqlMissing,
    /// The RPC failed for another reason.
    PrimaryFailed(String),
    /// `exec_sql` answered with no rows.
    EmptyResponse,
    /// The RPC answered with something other than `[{"exists": bool}]`.
    UnexpectedShape(String),
}

/// Verdict of the primary probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryVerdict {
    Answer(bool),
    FallBack(Fallthrough),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAnswer {
    pub function: String,
    pub exists: bool,
    pub tier: ProbeTier,
    /// Set when the listing answered.
    pub fallthrough: Option<Fallthrough>,
}

#[derive(Debug, Deserialize)]
struct ExistsRow {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct FunctionRow {
    #[serde(default)]
    function_name: Option<String>,
}

/// Steps 1 and 2: classify the outcome of the `exec_sql` RPC.
pub fn interpret_primary(outcome: Result<Vec<u8>>) -> PrimaryVerdict {
    let body = match outcome {
        Ok(body) => body,
        Err(err) if err.is_missing_function() => {
            return PrimaryVerdict::FallBack(Fallthrough::ExecSqlMissing);
        }
        Err(err) => return PrimaryVerdict::FallBack(Fallthrough::PrimaryFailed(err.to_string())),
    };

    let text = String::from_utf8_lossy(&body);
    let text = text.trim();
    if text.is_empty() || text == "null" || text == "[]" {
        return PrimaryVerdict::FallBack(Fallthrough::EmptyResponse);
    }

    match serde_json::from_str::<Vec<ExistsRow>>(text) {
        Ok(rows) => match rows.first() {
            Some(row) => PrimaryVerdict::Answer(row.exists),
            None => PrimaryVerdict::FallBack(Fallthrough::EmptyResponse),
        },
        Err(e) => PrimaryVerdict::FallBack(Fallthrough::UnexpectedShape(e.to_string())),
    }
}

/// Step 3: look for `function` in the Management API listing.
pub fn interpret_listing(function: &str, body: &[u8]) -> Result<bool> {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() || text == "[]" {
        return Ok(false);
    }

    let rows: Vec<FunctionRow> =
        decode(text.as_bytes(), "function listing").map_err(|e| SupabaseError::AmbiguousProbe {
            function: function.to_string(),
            reason: e.to_string(),
        })?;

    Ok(rows
        .iter()
        .any(|r| r.function_name.as_deref() == Some(function)))
}

/// Answers "does this function exist in `public`?".
#[derive(Debug, Clone)]
pub struct FunctionProber {
    client: SupabaseClient,
}

impl FunctionProber {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn exists(&self, function: &str) -> Result<bool> {
        Ok(self.probe(function).await?.exists)
    }

    pub async fn probe(&self, function: &str) -> Result<ProbeAnswer> {
        let request = self.client.request().rpc(
            "exec_sql",
            Some(json!({ "query": sql::function_exists_query(function) })),
        );
        let outcome = self.client.write(&request).await;

        let reason = match interpret_primary(outcome) {
            PrimaryVerdict::Answer(exists) => {
                tracing::debug!(function = %function, exists, tier = ?ProbeTier::ExecSqlRpc, "function probe answered");
                return Ok(ProbeAnswer {
                    function: function.to_string(),
                    exists,
                    tier: ProbeTier::ExecSqlRpc,
                    fallthrough: None,
                });
            }
            PrimaryVerdict::FallBack(reason) => reason,
        };

        tracing::debug!(function = %function, reason = ?reason, "falling back to management API function listing");

        let body = self.client.execute_sql(sql::LIST_PUBLIC_FUNCTIONS).await?;
        let exists = interpret_listing(function, &body)?;

        tracing::debug!(function = %function, exists, tier = ?ProbeTier::ManagementListing, "function probe answered");
        Ok(ProbeAnswer {
            function: function.to_string(),
            exists,
            tier: ProbeTier::ManagementListing,
            fallthrough: Some(reason),
        })
    }
}
