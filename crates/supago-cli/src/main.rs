use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use supago_core::SupagoConfig;
use supago_core::config::DEFAULT_CONFIG_FILE;
use tracing_subscriber::EnvFilter;

mod codegen;
mod commands;

use commands::pull::{self, PullOptions, SchemaSource};
use commands::server::SupagoServer;

#[derive(Parser, Debug)]
#[command(name = "supago", version, about = "Supabase schema discovery and model generation")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pull a table schema from Supabase and generate a Rust model.
    ///
    /// Example: supago pull blogs
    Pull(PullArgs),

    /// Start the Supago HTTP server.
    Server,
}

#[derive(Args, Debug)]
#[command(args_conflicts_with_subcommands = true)]
struct PullArgs {
    #[command(subcommand)]
    cmd: Option<PullCommand>,

    /// Table in the public schema
    table_name: Option<String>,

    /// Pull every base table in the public schema
    #[arg(long, conflicts_with = "table_name", default_value_t = false)]
    all: bool,

    /// Where column metadata is read from
    #[arg(long, value_enum, default_value_t = SchemaSource::View)]
    source: SchemaSource,

    /// Directory for generated models
    #[arg(long = "out-dir", default_value = codegen::DEFAULT_OUT_DIR)]
    out_dir: PathBuf,

    /// Print the schema as JSON instead of a column table
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum PullCommand {
    /// Create the database helper functions through the Management API.
    Setup,

    /// Verify that the database helper functions are set up.
    Check,
}

fn load_config(path: &Path) -> Result<SupagoConfig> {
    SupagoConfig::load(path).with_context(|| format!("load config failed: {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&cli.config)?;

    match cli.cmd {
        Command::Pull(args) => match args.cmd {
            Some(PullCommand::Setup) => {
                if let Err(e) = pull::setup(&config).await {
                    println!();
                    println!("❌ Setup failed: {:#}", e);
                    pull::print_setup_troubleshooting(&cli.config);
                    return Err(e);
                }
            }
            Some(PullCommand::Check) => pull::check(&config).await?,
            None => {
                let opts = PullOptions {
                    table: args.table_name,
                    all: args.all,
                    source: args.source,
                    out_dir: args.out_dir,
                    json: args.json,
                };
                pull::run(&config, &opts).await?
            }
        },

        Command::Server => SupagoServer::new(config.server).run().await?,
    }

    Ok(())
}
