// In crates/backtester/src/pipeline.rs

use analytics::{AnalyticsEngine, EquityPoint, MetricsConfig, PerformanceReport, Trade};
use chrono::{DateTime, Utc};
use core_types::{Bar, Error, Result, Signal, TradingPair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strategies::ma_crossover::ensure_sufficient_data;
use strategies::{SmaCrossover, SmaCrossoverSettings, Strategy};

use crate::{BacktestConfig, Backtester};

/// Everything one pipeline run depends on besides the bars themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub strategy: SmaCrossoverSettings,
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// One row of the price chart: the close, both averages and the signal, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
    pub short_sma: Option<Decimal>,
    pub long_sma: Option<Decimal>,
    /// `None` while the long average is still warming up.
    pub signal: Option<Signal>,
}

/// The full output of a run, ready to be serialized for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestOutcome {
    pub pair: TradingPair,
    pub config: PipelineConfig,
    pub chart: Vec<ChartPoint>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub report: PerformanceReport,
    pub warnings: Vec<String>,
}

/// Rejects unordered, duplicated or non-positive bars.
pub fn validate_bars(bars: &[Bar]) -> Result<()> {
    for (i, bar) in bars.iter().enumerate() {
        if bar.open <= Decimal::ZERO || bar.close <= Decimal::ZERO {
            return Err(Error::invalid(format!(
                "bar at {} has a non-positive price (open {}, close {})",
                bar.timestamp, bar.open, bar.close
            )));
        }
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(Error::invalid(format!(
                "bar timestamps must be strictly increasing ({} follows {})",
                bar.timestamp,
                bars[i - 1].timestamp
            )));
        }
    }
    Ok(())
}

/// Runs validate -> SMA -> signals -> simulation -> metrics over `bars`.
///
/// Pure: the same inputs always produce the same outcome. Too few bars for
/// the long window is not an error; the run completes with no signals and a
/// warning.
pub fn run_pipeline(pair: TradingPair, bars: &[Bar], config: &PipelineConfig) -> Result<BacktestOutcome> {
    validate_bars(bars)?;
    let strategy = SmaCrossover::new(config.strategy)?;
    let backtester = Backtester::new(pair, config.backtest)?;

    let mut warnings = Vec::new();
    if let Err(err @ Error::InsufficientData { .. }) = ensure_sufficient_data(bars.len(), config.strategy.long_window) {
        tracing::warn!(%pair, error = %err, "Not enough bars for the long window; no signals will fire.");
        warnings.push(err.to_string());
    }

    let assessment = strategy.assess(bars)?;
    let result = backtester.run(bars, &assessment.signals)?;
    if result.skipped_entries > 0 {
        warnings.push(format!(
            "{} BUY signal(s) skipped: no bar left to fill or close the position",
            result.skipped_entries
        ));
    }

    let report = AnalyticsEngine::new(config.metrics).calculate(
        config.backtest.starting_capital,
        &result.trades,
        &result.equity_curve,
    );

    let offset = bars.len() - assessment.signals.len();
    let chart = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| ChartPoint {
            timestamp: bar.timestamp,
            close: bar.close,
            short_sma: assessment.smas.short[i],
            long_sma: assessment.smas.long[i],
            signal: i.checked_sub(offset).map(|k| assessment.signals[k].signal),
        })
        .collect();

    Ok(BacktestOutcome {
        pair,
        config: *config,
        chart,
        trades: result.trades,
        equity_curve: result.equity_curve,
        report,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn bars(closes: &[Decimal]) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: dec!(100),
            })
            .collect()
    }

    fn config(short: usize, long: usize) -> PipelineConfig {
        PipelineConfig {
            strategy: SmaCrossoverSettings::new(short, long).unwrap(),
            backtest: BacktestConfig {
                starting_capital: dec!(1000),
                ..BacktestConfig::default()
            },
            metrics: MetricsConfig::default(),
        }
    }

    #[test]
    fn chart_has_one_row_per_bar() {
        let data = bars(&[dec!(10), dec!(11), dec!(12), dec!(9), dec!(8)]);
        let outcome = run_pipeline(TradingPair::BtcUsdt, &data, &config(2, 3)).unwrap();
        assert_eq!(outcome.chart.len(), 5);
        assert_eq!(outcome.chart[0].short_sma, None);
        assert_eq!(outcome.chart[1].short_sma, Some(dec!(10.5)));
        assert_eq!(outcome.chart[1].signal, None);
        assert_eq!(outcome.chart[2].signal, Some(Signal::Hold));
        assert_eq!(outcome.chart[3].signal, Some(Signal::Sell));
    }

    #[test]
    fn short_history_warns_instead_of_failing() {
        let data = bars(&[dec!(10), dec!(11)]);
        let outcome = run_pipeline(TradingPair::EthUsdt, &data, &config(2, 5)).unwrap();
        assert!(outcome.trades.is_empty());
        assert_eq!(outcome.report.win_rate, None);
        assert_eq!(outcome.equity_curve.len(), 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].starts_with("Insufficient data"));
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let outcome = run_pipeline(TradingPair::BnbUsdt, &[], &config(2, 3)).unwrap();
        assert!(outcome.chart.is_empty());
        assert_eq!(outcome.report.final_equity, dec!(1000));
    }

    #[test]
    fn unordered_bars_are_rejected() {
        let mut data = bars(&[dec!(10), dec!(11), dec!(12)]);
        data.swap(0, 1);
        assert!(matches!(
            run_pipeline(TradingPair::BtcUsdt, &data, &config(2, 3)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn duplicate_timestamps_are_rejected() {
        let mut data = bars(&[dec!(10), dec!(11)]);
        data[1].timestamp = data[0].timestamp;
        assert!(validate_bars(&data).is_err());
    }

    #[test]
    fn non_positive_close_is_rejected() {
        let data = bars(&[dec!(10), dec!(0), dec!(12)]);
        assert!(matches!(validate_bars(&data), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn invalid_windows_fail_before_simulation() {
        let mut cfg = config(2, 3);
        cfg.strategy = SmaCrossoverSettings { short_window: 5, long_window: 5 };
        let data = bars(&[dec!(10); 10]);
        assert!(matches!(
            run_pipeline(TradingPair::BtcUsdt, &data, &cfg),
            Err(Error::InvalidParameter(_))
        ));
    }
}
