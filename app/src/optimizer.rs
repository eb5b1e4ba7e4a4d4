// In app/src/optimizer.rs

use std::fs;
use std::path::Path;

use analytics::PerformanceReport;
use anyhow::{Context, Result};
use backtester::{PipelineConfig, run_pipeline};
use core_types::{Bar, TradingPair};
use itertools::iproduct;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Deserialize;
use strategies::SmaCrossoverSettings;

// --- Structs for deserializing optimizer.toml ---

#[derive(Deserialize, Debug)]
pub struct OptimizerConfig {
    pub job: JobSettings,
    pub sma_crossover_params: SmaCrossoverParams,
}

#[derive(Deserialize, Debug)]
pub struct JobSettings {
    pub name: String,
    /// Runs with fewer trades are left out of the ranking.
    #[serde(default)]
    pub min_trades: u32,
    /// How many ranked results to print.
    #[serde(default = "default_top")]
    pub top: usize,
}

#[derive(Deserialize, Debug)]
pub struct SmaCrossoverParams {
    pub short_window: ParamValue,
    pub long_window: ParamValue,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)] // Allows serde to try parsing as one variant, then the next
pub enum ParamValue {
    Fixed(usize),
    Range { start: usize, end: usize, step: Option<usize> },
}

impl ParamValue {
    /// Every value the parameter takes, `end` included.
    pub fn expand(&self) -> Vec<usize> {
        match *self {
            ParamValue::Fixed(v) => vec![v],
            ParamValue::Range { start, end, step } => (start..=end).step_by(step.unwrap_or(1).max(1)).collect(),
        }
    }
}

fn default_top() -> usize { 5 }

// --- Public API for the Optimizer Module ---

pub fn load_optimizer_config(path: &Path) -> Result<OptimizerConfig> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Every valid (short < long) window combination of the grid.
pub fn generate_parameter_sets(params: &SmaCrossoverParams) -> Vec<SmaCrossoverSettings> {
    iproduct!(params.short_window.expand(), params.long_window.expand())
        .filter_map(|(short, long)| SmaCrossoverSettings::new(short, long).ok())
        .collect()
}

/// Runs the pipeline once per parameter set, in parallel, over the same bars.
///
/// A failed run is logged and left out; the others still complete.
pub fn run_optimization(
    cores: usize,
    pair: TradingPair,
    bars: &[Bar],
    base: &PipelineConfig,
    param_sets: &[SmaCrossoverSettings],
) -> Result<Vec<(SmaCrossoverSettings, PerformanceReport)>> {
    tracing::info!(cores, runs = param_sets.len(), "Configuring Rayon thread pool.");
    let pool = ThreadPoolBuilder::new()
        .num_threads(cores)
        .build()
        .context("Failed to build Rayon thread pool")?;

    let results = pool.install(|| {
        param_sets
            .par_iter()
            .filter_map(|params| {
                let config = PipelineConfig { strategy: *params, ..*base };
                match run_pipeline(pair, bars, &config) {
                    Ok(outcome) => Some((*params, outcome.report)),
                    Err(e) => {
                        tracing::error!(error = %e, ?params, "A single backtest run failed.");
                        None
                    }
                }
            })
            .collect()
    });
    Ok(results)
}
