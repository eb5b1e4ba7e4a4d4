// In crates/analytics/src/engine.rs

use crate::types::{EquityPoint, PerformanceReport, Trade};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Leave forced closes out of the trade statistics (win rate, profit
    /// factor, expectancy, average duration). `total_trades` and the equity
    /// based metrics still include them.
    #[serde(default)]
    pub exclude_forced_close: bool,
}

/// The engine responsible for calculating performance metrics from trade data.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {
    config: MetricsConfig,
}

impl AnalyticsEngine {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    /// Calculates a full performance report from a trade log and an equity curve.
    pub fn calculate(
        &self,
        starting_capital: Decimal,
        trades: &[Trade],
        equity_curve: &[EquityPoint],
    ) -> PerformanceReport {
        let mut report = PerformanceReport::new();
        report.starting_capital = starting_capital;
        report.final_equity = equity_curve.last().map_or(starting_capital, |p| p.value);

        // 1. Total return & net P&L
        report.net_pnl_absolute = report.final_equity - starting_capital;
        if starting_capital > dec!(0) {
            report.total_return = (report.final_equity / starting_capital - dec!(1))
                .to_f64()
                .unwrap_or(0.0);
        }

        // 2. Trade counts & win rate
        report.total_trades = trades.len() as u32;
        report.forced_closes = trades.iter().filter(|t| t.forced_close).count() as u32;
        let counted: Vec<&Trade> = trades
            .iter()
            .filter(|t| !(self.config.exclude_forced_close && t.forced_close))
            .collect();
        report.winning_trades = counted.iter().filter(|t| t.is_win()).count() as u32;
        report.win_rate = win_rate(&counted);

        // 3. Max drawdown (fraction & absolute) and its longest duration
        let drawdown = scan_drawdown(starting_capital, equity_curve);
        report.max_drawdown = drawdown.max_fraction;
        report.max_drawdown_absolute = drawdown.max_absolute;
        report.drawdown_duration_secs = drawdown.longest_secs;

        // 4. Sharpe ratio (periodic, not annualized)
        report.sharpe_ratio = sharpe_ratio(equity_curve);

        if counted.is_empty() {
            return report; // Trade statistics below need at least one trade.
        }

        // 5. Profit factor & expectancy
        let gross_profit: Decimal = counted.iter().filter(|t| t.pnl > dec!(0)).map(|t| t.pnl).sum();
        let gross_loss: Decimal = counted.iter().filter(|t| t.pnl < dec!(0)).map(|t| t.pnl).sum::<Decimal>().abs();
        report.profit_factor = if gross_loss > dec!(0) {
            (gross_profit / gross_loss).to_f64()
        } else {
            None
        };
        let realized: Decimal = counted.iter().map(|t| t.pnl).sum();
        report.expectancy = Some(realized / Decimal::from(counted.len()));

        // 6. Average trade duration
        let total_duration_secs: i64 = counted.iter().map(|t| (t.exit_time - t.entry_time).num_seconds()).sum();
        report.avg_trade_duration_secs = Some(total_duration_secs as f64 / counted.len() as f64);

        report
    }
}

fn win_rate(trades: &[&Trade]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    Some(wins as f64 / trades.len() as f64)
}

#[derive(Debug, Default)]
struct DrawdownScan {
    max_fraction: f64,
    max_absolute: Decimal,
    longest_secs: i64,
}

/// One pass over the curve, tracking the running peak (seeded with the
/// starting capital) and the largest `(peak - value) / peak`.
fn scan_drawdown(starting_capital: Decimal, equity_curve: &[EquityPoint]) -> DrawdownScan {
    let mut scan = DrawdownScan::default();
    let mut peak = starting_capital;
    let mut max_fraction = Decimal::ZERO;
    let mut drawdown_start: Option<DateTime<Utc>> = None;

    for point in equity_curve {
        if point.value >= peak {
            if let Some(start) = drawdown_start.take() {
                let secs = (point.timestamp - start).num_seconds();
                scan.longest_secs = scan.longest_secs.max(secs);
            }
            peak = point.value;
            continue;
        }

        if drawdown_start.is_none() {
            drawdown_start = Some(point.timestamp);
        }
        let absolute = peak - point.value;
        scan.max_absolute = scan.max_absolute.max(absolute);
        if peak > Decimal::ZERO {
            max_fraction = max_fraction.max(absolute / peak);
        }
    }

    // Still under water at the end of the data.
    if let (Some(start), Some(last)) = (drawdown_start, equity_curve.last()) {
        scan.longest_secs = scan.longest_secs.max((last.timestamp - start).num_seconds());
    }

    scan.max_fraction = max_fraction.min(Decimal::ONE).to_f64().unwrap_or(0.0);
    scan
}

fn sharpe_ratio(equity_curve: &[EquityPoint]) -> f64 {
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .filter_map(|w| w[1].value.checked_div(w[0].value))
        .filter_map(|ratio| (ratio - dec!(1)).to_f64())
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let mean_return = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean_return).powi(2)).sum::<f64>() / returns.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev > 0.0 { mean_return / std_dev } else { 0.0 }
}
