use analytics::{AnalyticsError, MetricsEngine};
use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::{Config, LogFormat};
use core_types::{Bar, Series};
use dashboard::{Dashboard, SymbolEntry, display};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::process::ExitCode;

/// The main entry point for the stockdash application.
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load STOCKDASH__* overrides from a .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => configuration::load_config_from(path),
        None => configuration::load_config(),
    }
    .context("Failed to load configuration")?;

    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = configuration::init_tracing(&config.logging)?;
    tracing::debug!(config = ?config, "Configuration loaded.");

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Snapshot(args) => handle_snapshot(args, &config).await,
        Commands::Metrics(args) => handle_metrics(args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A stock dashboard: live quotes, daily history and derived metrics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file. Defaults to `config.toml` when present.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Console log format, overriding `logging.format`.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Fetch every dashboard symbol once and print the results.
    Snapshot(SnapshotArgs),
    /// Compute metrics offline from a JSON array of daily bars.
    Metrics(MetricsArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Interface to bind, overriding `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct SnapshotArgs {
    /// Comma-separated symbols (e.g., "AAPL,MSFT"). Defaults to `dashboard.symbols`.
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,
}

#[derive(Parser)]
struct MetricsArgs {
    /// A JSON file holding an array of `{date, open, high, low, close, volume}` bars.
    #[arg(long)]
    file: PathBuf,

    /// Market cap to pass through into the result.
    #[arg(long)]
    market_cap: Option<Decimal>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<ExitCode> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    web_server::run_server(&config).await?;
    Ok(ExitCode::SUCCESS)
}

async fn handle_snapshot(args: SnapshotArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let symbols = if args.symbols.is_empty() {
        config.dashboard.symbols.clone()
    } else {
        args.symbols
    };

    let dashboard = Dashboard::from_config(config)?;

    // Set up the progress bar
    let progress_bar = ProgressBar::new(symbols.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let state = dashboard
        .refresh_with(&symbols, |symbol, entry| {
            progress_bar.inc(1);
            let outcome = match entry {
                SymbolEntry::Loaded(_) => "loaded",
                SymbolEntry::Failed { .. } => "failed",
            };
            progress_bar.set_message(format!("{symbol} {outcome}"));
        })
        .await;

    progress_bar.finish_with_message("Snapshot complete!");

    println!("{}", display::summary_table(&state));
    for snapshot in state.loaded() {
        println!("{}", display::metrics_table(snapshot));
    }

    if state.loaded().next().is_none() {
        eprintln!("No symbol could be loaded.");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_metrics(args: MetricsArgs) -> anyhow::Result<ExitCode> {
    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let bars: Vec<Bar> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of bars", args.file.display()))?;
    let series = Series::from_unordered(bars);

    match MetricsEngine::new().compute_metrics(&series, args.market_cap) {
        Ok(metrics) => {
            println!("{}", serde_json::to_string_pretty(&metrics)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(AnalyticsError::EmptySeries) => {
            eprintln!("No data available: {} contains no bars.", args.file.display());
            Ok(ExitCode::FAILURE)
        }
    }
}
