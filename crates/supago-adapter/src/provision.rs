//! Idempotent creation of the server-side helper functions.
//!
//! `get_table_schema` is required for table introspection, so a failure to
//! create it aborts provisioning. `exec_sql` only makes later probes cheaper;
//! a failure to create it is reported and provisioning carries on.

use std::fmt;

use crate::client::SupabaseClient;
use crate::error::Result;
use crate::sql;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelperFunction {
    ExecSql,
    GetTableSchema,
}

impl HelperFunction {
    pub const ALL: [HelperFunction; 2] = [HelperFunction::GetTableSchema, HelperFunction::ExecSql];

    pub fn name(self) -> &'static str {
        match self {
            HelperFunction::ExecSql => "exec_sql",
            HelperFunction::GetTableSchema => "get_table_schema",
        }
    }

    pub fn signature(self) -> &'static str {
        match self {
            HelperFunction::ExecSql => "exec_sql(query TEXT)",
            HelperFunction::GetTableSchema => "get_table_schema(p_table_name TEXT)",
        }
    }

    pub fn create_sql(self) -> &'static str {
        match self {
            HelperFunction::ExecSql => sql::EXEC_SQL_FUNCTION,
            HelperFunction::GetTableSchema => sql::GET_TABLE_SCHEMA_FUNCTION,
        }
    }

    /// Whether provisioning fails when this function cannot be created.
    pub fn is_required(self) -> bool {
        matches!(self, HelperFunction::GetTableSchema)
    }
}

impl fmt::Display for HelperFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a provisioning run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<HelperFunction>,
    pub skipped: Vec<HelperFunction>,
    /// Optional functions that could not be created, with the reason.
    pub failed: Vec<(HelperFunction, String)>,
}

impl ProvisionReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Provisioner {
    client: SupabaseClient,
}

impl Provisioner {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Run `function`'s `CREATE OR REPLACE` through the Management API.
    pub async fn create(&self, function: HelperFunction) -> Result<()> {
        self.client.settings().ensure_management_access()?;

        let body = self.client.execute_sql(function.create_sql()).await?;
        tracing::info!(
            function = %function,
            response = %String::from_utf8_lossy(&body),
            "helper function created"
        );
        Ok(())
    }

    pub async fn create_exec_sql_function(&self) -> Result<()> {
        self.create(HelperFunction::ExecSql).await
    }

    pub async fn create_table_schema_function(&self) -> Result<()> {
        self.create(HelperFunction::GetTableSchema).await
    }

    /// Create both functions unconditionally.
    pub async fn initialize(&self) -> Result<ProvisionReport> {
        self.initialize_selective(false, false).await
    }

    /// Create only the functions whose existence flag is false.
    pub async fn initialize_selective(
        &self,
        schema_fn_exists: bool,
        exec_fn_exists: bool,
    ) -> Result<ProvisionReport> {
        self.client.settings().ensure_management_access()?;

        let mut report = ProvisionReport::default();

        if exec_fn_exists {
            report.skipped.push(HelperFunction::ExecSql);
        } else {
            match self.create(HelperFunction::ExecSql).await {
                Ok(()) => report.created.push(HelperFunction::ExecSql),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to create exec_sql function");
                    report.failed.push((HelperFunction::ExecSql, e.to_string()));
                }
            }
        }

        if schema_fn_exists {
            report.skipped.push(HelperFunction::GetTableSchema);
        } else {
            self.create(HelperFunction::GetTableSchema).await?;
            report.created.push(HelperFunction::GetTableSchema);
        }

        Ok(report)
    }
}
