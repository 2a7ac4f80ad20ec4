//! `supago pull` - table schema discovery and helper-function setup.
//!
//! - `supago pull <table>`: print the table's columns and generate a Rust model
//! - `supago pull --all`: the same for every public base table
//! - `supago pull setup`: create the missing database helper functions
//! - `supago pull check`: verify the helper functions exist

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use supago_adapter::{
    FunctionProber, HelperFunction, Provisioner, SchemaResolver, SupabaseClient, TableOutcome,
};
use supago_core::config::ACCESS_TOKEN_URL;
use supago_core::{SupagoConfig, TableSchemaResult};

use crate::codegen;

/// Where column metadata is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SchemaSource {
    /// The `<table>_schema` view, created on first use.
    #[default]
    View,
    /// The `get_table_schema` RPC function (needs `supago pull setup`).
    Rpc,
    /// `information_schema.columns`, read directly.
    Info,
}

#[derive(Debug, Clone)]
pub struct PullOptions {
    pub table: Option<String>,
    pub all: bool,
    pub source: SchemaSource,
    pub out_dir: PathBuf,
    /// Print the schema as JSON instead of the column table.
    pub json: bool,
}

pub async fn run(config: &SupagoConfig, opts: &PullOptions) -> Result<()> {
    let table = match opts.table.as_deref() {
        Some(table) => Some(table),
        None if opts.all => None,
        None => bail!(
            "table_name is required\n\nUsage:\n  supago pull <table_name>\n\nExample:\n  supago pull blogs"
        ),
    };

    let client = SupabaseClient::new(config.supabase.clone());
    ensure_functions(&client).await;

    let resolver = SchemaResolver::new(client);

    let Some(table) = table else {
        return run_all(&resolver, opts).await;
    };

    let schema = resolve(&resolver, opts.source, table)
        .await
        .context("failed to get table schema")?;

    if schema.columns.is_empty() {
        bail!(
            "table '{}' has no columns in the public schema (does it exist?)",
            schema.table_name
        );
    }

    emit(&schema, opts)?;
    Ok(())
}

async fn run_all(resolver: &SchemaResolver, opts: &PullOptions) -> Result<()> {
    let outcomes = resolve_all(resolver, opts.source)
        .await
        .context("failed to list tables")?;

    if outcomes.is_empty() {
        println!("⚠ No tables found in the public schema");
        return Ok(());
    }

    let mut generated = 0;
    let mut failed = 0;
    for outcome in outcomes {
        match outcome.result {
            Ok(schema) if schema.columns.is_empty() => {
                println!("⚠ {}: no columns, skipped", outcome.table);
            }
            Ok(schema) => {
                emit(&schema, opts)?;
                generated += 1;
            }
            Err(e) => {
                println!("⚠ {}: {}", outcome.table, e);
                failed += 1;
            }
        }
    }

    println!();
    println!("✓ Generated {} model(s), {} table(s) failed", generated, failed);
    Ok(())
}

async fn resolve(
    resolver: &SchemaResolver,
    source: SchemaSource,
    table: &str,
) -> supago_adapter::Result<TableSchemaResult> {
    match source {
        SchemaSource::View => resolver.get_table_schema(table).await,
        SchemaSource::Rpc => resolver.get_table_schema_via_rpc(table).await,
        SchemaSource::Info => resolver.get_table_info(table).await,
    }
}

async fn resolve_all(
    resolver: &SchemaResolver,
    source: SchemaSource,
) -> supago_adapter::Result<Vec<TableOutcome>> {
    match source {
        SchemaSource::View => resolver.get_all_table_schemas().await,
        SchemaSource::Rpc => Ok(resolver
            .get_all_table_schemas_via_rpc()
            .await?
            .into_iter()
            .map(|schema| TableOutcome {
                table: schema.table_name.clone(),
                result: Ok(schema),
            })
            .collect()),
        SchemaSource::Info => {
            let mut outcomes = Vec::new();
            for table in resolver.list_tables().await? {
                let result = resolver.get_table_info(&table).await;
                outcomes.push(TableOutcome { table, result });
            }
            Ok(outcomes)
        }
    }
}

fn emit(schema: &TableSchemaResult, opts: &PullOptions) -> Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(schema)?);
    } else {
        print!("{}", column_table(schema));
    }

    let path = codegen::write_struct(schema, &opts.out_dir)?;
    println!("✓ Generated model: {}", path.display());
    Ok(())
}

/// Human-readable column listing.
pub fn column_table(schema: &TableSchemaResult) -> String {
    let mut out = format!(
        "\n📋 Table: {}\nColumns:\n",
        codegen::to_pascal_case(&schema.table_name)
    );
    for col in &schema.columns {
        let nullable = if col.is_nullable { "NULL" } else { "NOT NULL" };
        let default = if col.has_default() {
            col.column_default.as_str()
        } else {
            "-"
        };
        out.push_str(&format!(
            "  • {:<20} {:<15} {:<10} default: {}\n",
            col.column_name, col.data_type, nullable, default
        ));
    }
    out
}

/// Warn, without failing, when the schema function has not been provisioned.
async fn ensure_functions(client: &SupabaseClient) {
    let prober = FunctionProber::new(client.clone());
    match prober.exists(HelperFunction::GetTableSchema.name()).await {
        Ok(true) => {}
        Ok(false) => {
            println!("⚠ get_table_schema function not found");
            println!("   Views will be created using Management API directly");
            println!("   Run 'supago pull setup' to create the function");
        }
        Err(e) => tracing::debug!(error = %e, "could not check get_table_schema"),
    }
}

/// Probe a helper function, treating a failed probe as "absent".
async fn probe_or_absent(prober: &FunctionProber, function: HelperFunction) -> bool {
    match prober.exists(function.name()).await {
        Ok(exists) => exists,
        Err(e) => {
            println!("⚠ Could not check {} existence: {}", function, e);
            println!("   Proceeding with setup...");
            false
        }
    }
}

pub async fn setup(config: &SupagoConfig) -> Result<()> {
    config.supabase.ensure_management_access()?;

    let client = SupabaseClient::new(config.supabase.clone());
    let prober = FunctionProber::new(client.clone());

    println!("🔍 Checking existing database functions...");
    let schema_exists = probe_or_absent(&prober, HelperFunction::GetTableSchema).await;
    let exec_exists = probe_or_absent(&prober, HelperFunction::ExecSql).await;

    if schema_exists && exec_exists {
        println!();
        println!("✓ All database functions already exist:");
        for function in HelperFunction::ALL {
            println!("  • {}", function.signature());
        }
        println!();
        println!("No action needed. You can run: supago pull <table_name>");
        return Ok(());
    }

    println!();
    println!("⚙️  Initializing database functions...");
    let report = Provisioner::new(client)
        .initialize_selective(schema_exists, exec_exists)
        .await?;

    for function in &report.skipped {
        println!("   {} already exists, skipping", function);
    }
    for function in &report.created {
        println!("   ✓ {}", function.signature());
    }
    for (function, reason) in &report.failed {
        println!("   ⚠ {} could not be created: {}", function.signature(), reason);
    }

    println!();
    println!("✓ Database functions ready. You can now run: supago pull <table_name>");
    Ok(())
}

/// Printed when `supago pull setup` fails.
pub fn print_setup_troubleshooting(config_path: &Path) {
    println!();
    println!("Troubleshooting:");
    println!(
        "1. Make sure SUPABASE_ACCESS_TOKEN is set in {}",
        config_path.display()
    );
    println!("2. Get your token from: {}", ACCESS_TOKEN_URL);
    println!("3. Make sure SUPABASE_PROJECT_ID is correct");
}

pub async fn check(config: &SupagoConfig) -> Result<()> {
    let client = SupabaseClient::new(config.supabase.clone());
    let prober = FunctionProber::new(client);

    println!("🔍 Checking database setup...");

    let schema_exists = prober
        .exists(HelperFunction::GetTableSchema.name())
        .await
        .context("failed to check get_table_schema function")?;

    if !schema_exists {
        println!("✗ get_table_schema function not found");
        println!("   Run: supago pull setup");
        bail!("database not properly set up");
    }
    println!("✓ get_table_schema function exists");

    match prober.exists(HelperFunction::ExecSql.name()).await {
        Ok(true) => println!("✓ exec_sql function exists"),
        _ => println!("⚠ exec_sql function not found (optional)"),
    }

    println!();
    println!("✓ Database setup is complete!");
    Ok(())
}
