//! Table schema resolution.
//!
//! The primary path goes through a per-table `<table>_schema` view:
//!
//! ```text
//! CheckingView ──exists──────────────────► FetchingColumns ──► Done
//!      │                                        ▲
//!      └─absent─► CreatingView ─────────────────┘
//! any step ──error──► Failed (tagged with the step)
//! ```
//!
//! The RPC path (`get_table_schema`) and the raw `information_schema.columns`
//! path need no view.

use serde::Deserialize;
use serde_json::json;
use supago_core::{ColumnSchema, TableSchemaResult};

use crate::client::{SupabaseClient, decode};
use crate::error::{ResolveStep, Result, SupabaseError};
use crate::sql;

/// Result of one table in a batch.
#[derive(Debug)]
pub struct TableOutcome {
    pub table: String,
    pub result: Result<TableSchemaResult>,
}

#[derive(Debug, Deserialize)]
struct TableNameRow {
    table_name: String,
}

/// A row of `information_schema.columns`.
#[derive(Debug, Deserialize)]
struct InformationSchemaColumn {
    column_name: String,
    data_type: String,
    is_nullable: String,
    column_default: Option<String>,
}

impl From<InformationSchemaColumn> for ColumnSchema {
    fn from(raw: InformationSchemaColumn) -> Self {
        ColumnSchema {
            column_name: raw.column_name,
            data_type: raw.data_type,
            is_nullable: raw.is_nullable == "YES",
            column_default: raw.column_default.unwrap_or_default(),
        }
    }
}

fn validate_table_name(table: &str) -> Result<()> {
    if table.trim().is_empty() {
        return Err(SupabaseError::Validation(
            "table name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SchemaResolver {
    client: SupabaseClient,
}

impl SchemaResolver {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Resolve `table`'s columns through its `<table>_schema` view, creating
    /// the view first when it does not exist.
    pub async fn get_table_schema(&self, table: &str) -> Result<TableSchemaResult> {
        validate_table_name(table)?;

        let exists = self.view_exists(table).await?;
        if !exists {
            self.create_schema_view(table).await?;
        }

        let columns = self.fetch_view_columns(table).await?;
        tracing::debug!(table = %table, columns = columns.len(), "table schema resolved");

        Ok(TableSchemaResult::new(table, columns))
    }

    /// Whether `<table>_schema` is readable through the REST API.
    ///
    /// "Not found" answers mean the view is absent; any other failure is
    /// returned.
    pub async fn view_exists(&self, table: &str) -> Result<bool> {
        let request = self
            .client
            .from(&sql::schema_view_name(table))
            .select(sql::SCHEMA_VIEW_COLUMNS);

        match self.client.read(&request).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => {
                tracing::debug!(table = %table, "schema view not found");
                Ok(false)
            }
            Err(e) => Err(e.during(table, ResolveStep::CheckingView)),
        }
    }

    /// Create or replace `<table>_schema` through the Management API.
    pub async fn create_schema_view(&self, table: &str) -> Result<()> {
        validate_table_name(table)?;

        let body = self
            .client
            .execute_sql(&sql::create_schema_view(table))
            .await
            .map_err(|e| e.during(table, ResolveStep::CreatingView))?;

        // DDL responses have no fixed shape; anything but a transport
        // failure counts as success.
        if serde_json::from_slice::<serde_json::Value>(&body).is_err() {
            tracing::info!(
                table = %table,
                response = %String::from_utf8_lossy(&body),
                "unexpected view creation response"
            );
        }
        tracing::info!(table = %table, view = %sql::schema_view_name(table), "schema view created");
        Ok(())
    }

    /// Read every row of `<table>_schema`.
    pub async fn fetch_view_columns(&self, table: &str) -> Result<Vec<ColumnSchema>> {
        let request = self
            .client
            .from(&sql::schema_view_name(table))
            .select("*");

        let body = self
            .client
            .read(&request)
            .await
            .map_err(|e| e.during(table, ResolveStep::FetchingColumns))?;

        decode(&body, "columns").map_err(|e| e.during(table, ResolveStep::FetchingColumns))
    }

    /// Names of all base tables in `public`, sorted.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let request = self
            .client
            .from("information_schema.tables")
            .select("table_name")
            .eq("table_schema", "public")
            .eq("table_type", "BASE TABLE")
            .order("table_name", true);

        let body = self
            .client
            .read(&request)
            .await
            .map_err(|e| e.during("information_schema.tables", ResolveStep::ListingTables))?;
        let rows: Vec<TableNameRow> = decode(&body, "table names")
            .map_err(|e| e.during("information_schema.tables", ResolveStep::ListingTables))?;

        Ok(rows.into_iter().map(|r| r.table_name).collect())
    }

    /// Resolve every public table, one after another.
    ///
    /// A failing table is logged and reported in its outcome; the rest are
    /// still processed. Only a failure to list the tables fails the batch.
    pub async fn get_all_table_schemas(&self) -> Result<Vec<TableOutcome>> {
        let tables = self.list_tables().await?;
        let mut outcomes = Vec::with_capacity(tables.len());

        for table in tables {
            let result = self.get_table_schema(&table).await;
            if let Err(e) = &result {
                tracing::warn!(table = %table, error = %e, "failed to get table schema");
            }
            outcomes.push(TableOutcome { table, result });
        }

        Ok(outcomes)
    }

    pub async fn drop_schema_view(&self, table: &str) -> Result<()> {
        validate_table_name(table)?;
        self.client.execute_sql(&sql::drop_schema_view(table)).await?;
        tracing::info!(table = %table, "schema view dropped");
        Ok(())
    }

    /// Drop and recreate `<table>_schema`.
    pub async fn refresh_schema_view(&self, table: &str) -> Result<()> {
        self.drop_schema_view(table).await?;
        self.create_schema_view(table).await
    }

    /// Resolve through the `get_table_schema` RPC function.
    pub async fn get_table_schema_via_rpc(&self, table: &str) -> Result<TableSchemaResult> {
        validate_table_name(table)?;

        let request = self
            .client
            .request()
            .rpc("get_table_schema", Some(json!({ "p_table_name": table })));
        let body = self.client.write(&request).await?;

        decode(&body, "schema")
    }

    /// Resolve every table through the `get_all_table_schemas` RPC function.
    pub async fn get_all_table_schemas_via_rpc(&self) -> Result<Vec<TableSchemaResult>> {
        let request = self.client.request().rpc("get_all_table_schemas", None);
        let body = self.client.write(&request).await?;

        decode(&body, "schemas")
    }

    /// Read `information_schema.columns` directly, without creating a view.
    pub async fn get_table_info(&self, table: &str) -> Result<TableSchemaResult> {
        validate_table_name(table)?;

        let request = self
            .client
            .from("information_schema.columns")
            .select(sql::SCHEMA_VIEW_COLUMNS)
            .eq("table_schema", "public")
            .eq("table_name", table)
            .order("ordinal_position", true);
        let body = self.client.read(&request).await?;

        let raw: Vec<InformationSchemaColumn> = decode(&body, "columns")?;
        Ok(TableSchemaResult::new(
            table,
            raw.into_iter().map(ColumnSchema::from).collect(),
        ))
    }
}
