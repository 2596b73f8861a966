pub mod check;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::{config, AppConfig};
use crate::database::{DatabaseManager, DocumentStore};
use crate::schema;
use crate::seed::{self, SeedOutcome};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "officescapes-api")]
#[command(about = "OfficeScapes API server and data maintenance")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output reports in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Listen on this port instead of the configured one")]
        port: Option<u16>,

        #[arg(long, help = "Do not seed empty collections on startup")]
        no_seed: bool,
    },

    #[command(about = "Load demo data into empty collections")]
    Seed,

    #[command(about = "Create tables, indexes and id sequences")]
    Migrate,

    #[command(about = "Validate every stored document against its collection schema")]
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = config().clone();
    config.validate().context("invalid configuration")?;

    match cli.command.unwrap_or(Commands::Serve {
        port: None,
        no_seed: false,
    }) {
        Commands::Serve { port, no_seed } => serve(config, port, no_seed).await,
        Commands::Seed => {
            let store = open(&config).await?;
            let outcomes = seed::seed(store, config.security.bcrypt_cost).await?;
            print_seed_report(&outcomes, output_format);
            Ok(())
        }
        Commands::Migrate => {
            let store = open(&config).await?;
            print_report(
                output_format,
                &json!({ "backend": store.backend(), "collections": schema::ALL.len() }),
                &format!("Prepared {} collections on {}", schema::ALL.len(), store.backend()),
            );
            Ok(())
        }
        Commands::Check => {
            let store = open(&config).await?;
            let reports = check::check_store(&store).await?;
            let invalid: usize = reports.iter().map(|r| r.invalid.len()).sum();
            check::print(&reports, output_format);
            if invalid > 0 {
                anyhow::bail!("{} stored documents fail validation", invalid);
            }
            Ok(())
        }
    }
}

/// Opens the configured store and makes sure every collection exists.
async fn open(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store = DatabaseManager::open_store(&config.database)
        .await
        .context("failed to open document store")?;
    store.prepare(schema::ALL).await.context("failed to prepare collections")?;
    Ok(store)
}

async fn serve(config: AppConfig, port: Option<u16>, no_seed: bool) -> anyhow::Result<()> {
    if crate::is_production!() && config.database.url.is_none() {
        anyhow::bail!("DATABASE_URL must be set in production");
    }

    info!("Starting OfficeScapes API in {:?} mode", config.environment);
    let store = open(&config).await?;

    if config.seed.on_startup && !no_seed {
        match seed::seed(store.clone(), config.security.bcrypt_cost).await {
            Ok(outcomes) => {
                let inserted: usize = outcomes.iter().map(|o| o.inserted).sum();
                info!("Startup seed inserted {} records", inserted);
            }
            Err(e) => warn!("Startup seed failed: {}", e),
        }
    }

    let port = port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("OfficeScapes API listening on http://{}", bind_addr);

    let app = crate::app(AppState::new(config, store));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn print_seed_report(outcomes: &[SeedOutcome], format: OutputFormat) {
    #[derive(Serialize)]
    struct Row<'a> {
        collection: &'a str,
        inserted: usize,
        skipped: bool,
    }

    match format {
        OutputFormat::Json => {
            let rows: Vec<Row> = outcomes
                .iter()
                .map(|o| Row {
                    collection: o.collection,
                    inserted: o.inserted,
                    skipped: o.skipped,
                })
                .collect();
            println!("{}", json!({ "collections": rows }));
        }
        OutputFormat::Text => {
            for outcome in outcomes {
                if outcome.skipped {
                    println!("{:<20} skipped (not empty)", outcome.collection);
                } else {
                    println!("{:<20} {} inserted", outcome.collection, outcome.inserted);
                }
            }
        }
    }
}

fn print_report(format: OutputFormat, data: &serde_json::Value, text: &str) {
    match format {
        OutputFormat::Json => println!("{}", data),
        OutputFormat::Text => println!("{}", text),
    }
}
