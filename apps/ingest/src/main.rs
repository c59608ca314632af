mod chunking;
mod commands;
mod config;
mod db;
mod download;
mod embeddings;
mod errors;
mod loaders;
mod matching;
mod models;
mod normalize;
mod parsers;
mod report;
mod routes;
mod state;
mod vectorstore;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "ingest",
    about = "Internship dataset ingestion and retrieval pipeline",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download all configured datasets (falls back to bundled samples)
    Download,
    /// Normalize raw datasets and cut text into tagged chunks
    Clean,
    /// Embed chunk text and store the vector index
    Embed,
    /// Load normalized tables into SQLite
    LoadDb,
    /// Write the ingestion report
    Report,
    /// Embed a query and print the top matches
    Query {
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        /// Metadata filter, e.g. country=India,mode=online
        #[arg(long)]
        filter: Option<String>,
    },
    /// Serve the HTTP search API
    Serve {
        /// Overrides the PORT environment variable
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the full pipeline end to end
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; logging verbosity comes from it.
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ingest v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Download => commands::run_download(&config).await?,
        Command::Clean => commands::run_clean(&config)?,
        Command::Embed => commands::run_embed(&config).await?,
        Command::LoadDb => commands::run_load_db(&config).await?,
        Command::Report => commands::run_report(&config)?,
        Command::Query {
            text,
            top_k,
            filter,
        } => commands::run_query(&config, &text, top_k, filter.as_deref()).await?,
        Command::Serve { port } => {
            commands::run_serve(&config, port.unwrap_or(config.port)).await?
        }
        Command::All => {
            commands::run_download(&config).await?;
            commands::run_clean(&config)?;
            commands::run_embed(&config).await?;
            commands::run_load_db(&config).await?;
            commands::run_report(&config)?;
        }
    }

    Ok(())
}
