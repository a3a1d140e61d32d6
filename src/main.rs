//! Task Tracker server
//!
//! REST API for employees, their tasks and a completion dashboard.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use task_tracker::api;
use task_tracker::cli::{Cli, Command, SummaryArgs};
use task_tracker::config::{Config, ConfigLoader, ENV_CONFIG_PATH};
use task_tracker::db::Database;
use task_tracker::format::format_summary;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    // If explicit config path given, set it as env var for ConfigLoader to pick up
    if let Some(config_path) = &cli.config {
        // SAFETY: no task has been spawned yet, so nothing reads the environment concurrently
        unsafe {
            std::env::set_var(ENV_CONFIG_PATH, config_path);
        }
    }
    let mut loader = ConfigLoader::load()?;
    for source in loader.sources() {
        info!("Config: {}", source.display());
    }

    // Command-line flags take precedence over every config tier
    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    let config = loader.into_config();

    match cli.command {
        Some(Command::Summary(args)) => run_summary(&config, args),
        Some(Command::Serve) | None => run_server(config).await,
    }
}

/// Initialize logging based on the --log option.
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {}
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)
                .with_context(|| format!("Failed to open log file {filename}"))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path).with_context(|| {
        format!(
            "Failed to open database {}",
            config.server.db_path.display()
        )
    })?;
    info!("Database: {:?}", config.server.db_path);
    Ok(db)
}

/// Run the HTTP server until Ctrl-C.
async fn run_server(config: Config) -> Result<()> {
    info!("Starting Task Tracker v{}", env!("CARGO_PKG_VERSION"));

    let db = Arc::new(open_database(&config)?);

    let handle = api::start_server(db, config.server.bind_address, config.server.port)
        .await
        .with_context(|| {
            format!(
                "Failed to bind {}:{}",
                config.server.bind_address, config.server.port
            )
        })?;

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received");
    handle.shutdown().await;

    Ok(())
}

/// Print the dashboard summary to stdout.
fn run_summary(config: &Config, args: SummaryArgs) -> Result<()> {
    let db = open_database(config)?;
    let summary = db.get_dashboard_summary()?;
    println!("{}", format_summary(&summary, args.format)?);
    Ok(())
}
