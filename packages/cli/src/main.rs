#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the crime correlation engine.
//!
//! ```text
//! crime_corr report [--format text|json]
//! crime_corr export <output.json>
//! crime_corr options
//! crime_corr serve [--bind-addr 127.0.0.1] [--port 8080]
//! ```
//!
//! Every subcommand reads the event database given by `--db` (or
//! `CRIME_DB_PATH`). Running with no subcommand enters interactive mode.

mod export;
mod options;
mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use crime_corr_analytics::snapshot::Snapshot;
use crime_corr_server::{DEFAULT_BIND_ADDR, DEFAULT_PORT, ServerConfig};
use crime_corr_source::EventSource;
use crime_corr_source::duckdb_source::DuckDbEventSource;
use dialoguer::{Input, Select};
use strum::IntoEnumIterator as _;

use crate::report::OutputFormat;

#[derive(Parser)]
#[command(
    name = "crime_corr",
    about = "City/offense association and correlation reports for crime data"
)]
struct Cli {
    /// Event database file
    #[arg(long, global = true, env = "CRIME_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the contingency table, chi-square test, correlations, and centroids
    Report {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Write the full snapshot as JSON
    Export {
        /// Destination file
        output: PathBuf,
    },
    /// List the cities, offense types, and date range in the database
    Options,
    /// Start the API server
    Serve {
        /// Address to bind
        #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
        bind_addr: String,
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

/// Tools offered in interactive mode.
enum Tool {
    Report,
    Export,
    Options,
    Serve,
}

impl Tool {
    const ALL: &[Self] = &[Self::Report, Self::Export, Self::Options, Self::Serve];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Report => "Print correlation report",
            Self::Export => "Export snapshot as JSON",
            Self::Options => "List cities and offense types",
            Self::Serve => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let db_path = cli
        .db
        .unwrap_or_else(crime_corr_source::paths::default_db_path);

    let Some(command) = cli.command else {
        return interactive(db_path).await;
    };

    match command {
        Commands::Report { format } => {
            let snapshot = build_snapshot(db_path).await?;
            print!("{}", report::render(&snapshot, format)?);
        }
        Commands::Export { output } => {
            let snapshot = build_snapshot(db_path).await?;
            export::write_export(&snapshot, &output)?;
            println!("Wrote {}", output.display());
        }
        Commands::Options => {
            let source = open_source(&db_path)?;
            let text = tokio::task::spawn_blocking(move || {
                options::render_options(source.as_ref()).map_err(|e| e.to_string())
            })
            .await??;
            print!("{text}");
        }
        Commands::Serve { bind_addr, port } => {
            serve(ServerConfig {
                db_path,
                bind_addr,
                port,
            })
            .await?;
        }
    }

    Ok(())
}

async fn interactive(db_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Crime Correlation Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Report => {
            let formats: Vec<OutputFormat> = OutputFormat::iter().collect();
            let format_labels: Vec<String> = formats.iter().map(ToString::to_string).collect();
            let choice = Select::new()
                .with_prompt("Output format")
                .items(&format_labels)
                .default(0)
                .interact()?;
            let snapshot = build_snapshot(db_path).await?;
            print!("{}", report::render(&snapshot, formats[choice])?);
        }
        Tool::Export => {
            let output: String = Input::new()
                .with_prompt("Output file")
                .default("snapshot.json".to_string())
                .interact_text()?;
            let snapshot = build_snapshot(db_path).await?;
            export::write_export(&snapshot, Path::new(&output))?;
            println!("Wrote {output}");
        }
        Tool::Options => {
            let source = open_source(&db_path)?;
            print!("{}", options::render_options(source.as_ref())?);
        }
        Tool::Serve => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(crime_corr_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}

fn open_source(db_path: &Path) -> Result<Arc<dyn EventSource>, Box<dyn std::error::Error>> {
    Ok(Arc::new(DuckDbEventSource::open_read_only(db_path)?))
}

/// Opens the database and builds a snapshot off the async runtime.
async fn build_snapshot(db_path: PathBuf) -> Result<Snapshot, Box<dyn std::error::Error>> {
    let source = open_source(&db_path)?;
    let snapshot = tokio::task::spawn_blocking(move || Snapshot::load(source.as_ref())).await??;
    Ok(snapshot)
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(crime_corr_server::run_with_config(config))
    })
    .await??;
    Ok(())
}
