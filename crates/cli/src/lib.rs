pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fieldquote_core::config::LoadOptions;
use fieldquote_core::fixtures::DEMO_TENANT;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "fieldquote",
    about = "Fieldquote operator CLI",
    long_about = "Operate the Fieldquote quote engine: migrations, demo catalogs, config inspection, catalog checks, and one-off quotes.",
    after_help = "Examples:\n  fieldquote migrate\n  fieldquote seed --tenant demo\n  fieldquote quote --request request.json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a fieldquote.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Replace a tenant's catalog with the deterministic demo catalog")]
    Seed {
        #[arg(long, default_value = DEMO_TENANT)]
        tenant: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(subcommand, about = "Inspect stored catalogs")]
    Catalog(CatalogCommand),
    #[command(about = "Resolve a JSON quote request against a tenant's stored catalog")]
    Quote {
        #[arg(long, help = "Path to a JSON quote request")]
        request: PathBuf,
        #[arg(long, default_value = DEMO_TENANT)]
        tenant: String,
    },
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
    #[command(about = "Build the catalog snapshot and report integrity issues")]
    Check {
        #[arg(long, default_value = DEMO_TENANT)]
        tenant: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&options),
        Command::Seed { tenant } => commands::seed::run(&options, &tenant),
        Command::Config => commands::config::run(&options),
        Command::Catalog(CatalogCommand::Check { tenant }) => {
            commands::catalog::check(&options, &tenant)
        }
        Command::Quote { request, tenant } => commands::quote::run(&options, &request, &tenant),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Compact stderr logs so stdout stays a single JSON payload.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
