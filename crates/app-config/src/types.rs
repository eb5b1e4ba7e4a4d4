// In crates/app-config/src/types.rs

use analytics::MetricsConfig;
use backtester::{BacktestConfig, PipelineConfig};
use core_types::{FillPolicy, Timeframe, TradingPair};
use execution::SimulationSettings;
use rust_decimal::Decimal;
use serde::Deserialize;
use strategies::SmaCrossoverSettings;

/// Upper bound on `[backtest].limit`, to keep a single fetch cheap.
pub const MAX_LIMIT: usize = 10_000;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the OKX market data API.
    pub okx: OkxSettings,
    /// The default backtest run.
    pub backtest: BacktestSettings,
    /// Fee and slippage model applied to every fill.
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Builds the pipeline configuration for the default run, validating it.
    pub fn pipeline_config(&self) -> core_types::Result<PipelineConfig> {
        self.backtest.pipeline_config(self.simulation)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
    /// Worker threads for the parameter optimizer. 0 lets rayon decide.
    #[serde(default)]
    pub optimizer_cores: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OkxSettings {
    /// The REST API base URL for OKX.
    pub rest_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a failed page request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// The `[backtest]` section: what a run fetches and how it is simulated.
#[derive(Deserialize, Debug, Clone)]
pub struct BacktestSettings {
    pub pair: TradingPair,
    pub timeframe: Timeframe,
    pub short_window: usize,
    pub long_window: usize,
    pub starting_capital: Decimal,
    #[serde(default)]
    pub fill_policy: FillPolicy,
    /// Number of most recent bars to fetch.
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub exclude_forced_close: bool,
}

impl BacktestSettings {
    /// Validates the run, including `limit`, and builds its pipeline configuration.
    pub fn pipeline_config(&self, simulation: SimulationSettings) -> core_types::Result<PipelineConfig> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(core_types::Error::invalid(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, self.limit
            )));
        }
        let config = PipelineConfig {
            strategy: SmaCrossoverSettings::new(self.short_window, self.long_window)?,
            backtest: BacktestConfig {
                starting_capital: self.starting_capital,
                fill_policy: self.fill_policy,
                simulation,
            },
            metrics: MetricsConfig {
                exclude_forced_close: self.exclude_forced_close,
            },
        };
        config.backtest.validate()?;
        Ok(config)
    }
}

/// Market data cache used by the web server.
#[derive(Deserialize, Debug, Clone)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 300, max_entries: 64 }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

fn default_timeout_secs() -> u64 { 10 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 500 }
fn default_limit() -> usize { 1000 }
