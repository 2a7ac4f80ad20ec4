//! Supabase access for supago.
//!
//! [`SupabaseClient`] speaks two HTTP surfaces: the project's PostgREST API
//! (`/rest/v1`) for table reads and RPC calls, and the Management API
//! (`/database/query`) for raw SQL. On top of it:
//!
//! - [`FunctionProber`] answers whether a function exists in `public`.
//! - [`Provisioner`] creates the `exec_sql` and `get_table_schema` helpers.
//! - [`SchemaResolver`] returns a table's columns, creating the
//!   `<table>_schema` view on first use.

pub mod builder;
pub mod client;
pub mod error;
pub mod probe;
pub mod provision;
pub mod resolver;
pub mod sql;
pub mod transport;

#[cfg(test)]
mod testing;

pub use builder::RequestBuilder;
pub use client::SupabaseClient;
pub use error::{ResolveStep, Result, SupabaseError};
pub use probe::{Fallthrough, FunctionProber, ProbeAnswer, ProbeTier};
pub use provision::{HelperFunction, ProvisionReport, Provisioner};
pub use resolver::{SchemaResolver, TableOutcome};
pub use transport::{HttpTransport, Method, Transport};
