// In app/src/main.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use api_client::{BarRequest, CachedProvider, CsvProvider, MarketDataProvider, OkxClient};
use app_config::{BacktestSettings, Settings};
use backtester::run_pipeline;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use core_types::{Bar, FillPolicy, Timeframe, TradingPair};
use rust_decimal::Decimal;
use tracing_subscriber::prelude::*;

mod analyzer;
mod optimizer;
mod render;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Backtests an SMA crossover strategy on OKX spot data.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs one backtest and prints the report.
    Backtest {
        #[command(flatten)]
        run: RunArgs,

        /// The short SMA window.
        #[arg(long)]
        short_window: Option<usize>,

        /// The long SMA window.
        #[arg(long)]
        long_window: Option<usize>,

        /// Write the full outcome (chart, trades, equity curve, report) as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Serves the backtest API for the dashboard.
    Serve,

    /// Runs every window combination of a grid and ranks the results.
    Optimize {
        #[command(flatten)]
        run: RunArgs,

        /// The optimizer grid definition.
        #[arg(long, default_value = "config/optimizer.toml")]
        config: PathBuf,
    },
}

/// Overrides for the `[backtest]` section, shared by `backtest` and `optimize`.
#[derive(Args, Debug)]
struct RunArgs {
    /// The trading pair (e.g., "BTC-USDT").
    #[arg(short, long)]
    pair: Option<TradingPair>,

    /// The bar interval ("1h", "4h" or "1d").
    #[arg(short, long)]
    timeframe: Option<Timeframe>,

    #[arg(long)]
    starting_capital: Option<Decimal>,

    /// "signal-bar-close" or "next-bar-open".
    #[arg(long)]
    fill_policy: Option<FillPolicy>,

    /// Number of most recent bars to fetch.
    #[arg(long)]
    limit: Option<usize>,

    /// Read bars from a CSV file instead of OKX.
    #[arg(long)]
    csv: Option<PathBuf>,
}

impl RunArgs {
    fn apply(&self, settings: &mut BacktestSettings) {
        if let Some(pair) = self.pair {
            settings.pair = pair;
        }
        if let Some(timeframe) = self.timeframe {
            settings.timeframe = timeframe;
        }
        if let Some(capital) = self.starting_capital {
            settings.starting_capital = capital;
        }
        if let Some(fill_policy) = self.fill_policy {
            settings.fill_policy = fill_policy;
        }
        if let Some(limit) = self.limit {
            settings.limit = limit;
        }
    }
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings().context("Failed to load config/base.toml")?;
    init_tracing(&settings.app.log_level);
    tracing::info!(environment = %settings.app.environment, "Starting AlgoCraft");

    // Match on the parsed command and call the appropriate handler.
    match cli.command {
        Commands::Backtest { run, short_window, long_window, json } => {
            handle_backtest(settings, run, short_window, long_window, json).await?;
        }
        Commands::Serve => {
            handle_serve(settings).await?;
        }
        Commands::Optimize { run, config } => {
            handle_optimize(settings, run, config).await?;
        }
    }

    tracing::info!("AlgoCraft has finished successfully.");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let level = log_level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("hyper", tracing::Level::WARN)
            .with_target("reqwest", tracing::Level::WARN)
            .with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();
}

/// The OKX client, or the CSV file when one is given.
fn build_provider(settings: &Settings, csv: Option<&PathBuf>) -> Result<Arc<dyn MarketDataProvider>> {
    let provider: Arc<dyn MarketDataProvider> = match csv {
        Some(path) => Arc::new(CsvProvider::new(path.clone())),
        None => Arc::new(OkxClient::new(&settings.okx)?),
    };
    Ok(provider)
}

async fn fetch_bars(provider: &dyn MarketDataProvider, backtest: &BacktestSettings) -> Result<Vec<Bar>> {
    let request = BarRequest::latest(backtest.pair, backtest.timeframe, backtest.limit, Utc::now())?;
    tracing::info!(
        provider = provider.name(),
        pair = %request.pair,
        timeframe = %request.timeframe,
        from = %request.start,
        to = %request.end,
        "Fetching bars."
    );
    let bars = provider.fetch_bars(&request).await?;
    tracing::info!("Loaded {} bars.", bars.len());
    Ok(bars)
}

// --- "Backtest" Subcommand Logic ---

async fn handle_backtest(
    mut settings: Settings,
    run: RunArgs,
    short_window: Option<usize>,
    long_window: Option<usize>,
    json: Option<PathBuf>,
) -> Result<()> {
    run.apply(&mut settings.backtest);
    if let Some(short) = short_window {
        settings.backtest.short_window = short;
    }
    if let Some(long) = long_window {
        settings.backtest.long_window = long;
    }
    let config = settings.pipeline_config()?;

    let provider = build_provider(&settings, run.csv.as_ref())?;
    let bars = fetch_bars(provider.as_ref(), &settings.backtest).await?;

    let outcome = run_pipeline(settings.backtest.pair, &bars, &config)?;
    render::print_outcome(&outcome);

    if let Some(path) = json {
        let body = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote backtest outcome.");
    }
    Ok(())
}

// --- "Serve" Subcommand Logic ---

async fn handle_serve(settings: Settings) -> Result<()> {
    let okx = OkxClient::new(&settings.okx)?;
    let provider = CachedProvider::from_settings(okx, &settings.cache);

    let app_state = web_server::AppState {
        provider: Arc::new(provider),
        defaults: settings.backtest.clone(),
        simulation: settings.simulation,
    };
    web_server::run(&settings.server, app_state).await?;
    Ok(())
}

// --- "Optimize" Subcommand Logic ---

async fn handle_optimize(mut settings: Settings, run: RunArgs, config_path: PathBuf) -> Result<()> {
    let start_time = Instant::now();
    tracing::info!("Starting optimization job...");

    run.apply(&mut settings.backtest);
    let base = settings.pipeline_config()?;
    let optimizer_config = optimizer::load_optimizer_config(&config_path)?;
    let param_sets = optimizer::generate_parameter_sets(&optimizer_config.sma_crossover_params);
    if param_sets.is_empty() {
        anyhow::bail!("No valid parameter sets were generated.");
    }
    tracing::info!(job = %optimizer_config.job.name, "Starting optimization with {} parameter sets", param_sets.len());

    let provider = build_provider(&settings, run.csv.as_ref())?;
    let bars = fetch_bars(provider.as_ref(), &settings.backtest).await?;

    // Move the parallel work off the async runtime.
    let cores = settings.app.optimizer_cores as usize;
    let pair = settings.backtest.pair;
    let results = tokio::task::spawn_blocking(move || {
        optimizer::run_optimization(cores, pair, &bars, &base, &param_sets)
    })
    .await??;

    let ranked = analyzer::rank_results(results, optimizer_config.job.min_trades);
    render::print_optimization_report(&ranked, optimizer_config.job.top);

    tracing::info!(duration = ?start_time.elapsed(), "Optimization job and analysis finished.");
    Ok(())
}
