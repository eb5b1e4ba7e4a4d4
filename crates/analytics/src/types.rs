// In crates/analytics/src/types.rs

use chrono::{DateTime, Utc};
use core_types::TradingPair;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A record of a single closed long trade, from entry to exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub pair: TradingPair,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    /// Realized P&L, net of entry and exit fees.
    pub pnl: Decimal,
    pub fees: Decimal,
    /// Set when the position was still open at the end of the data and was
    /// settled at the last close rather than by a SELL signal.
    pub forced_close: bool,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

/// A point in the portfolio's equity curve. There is one per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// A report of a strategy's performance over a backtest period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformanceReport {
    pub starting_capital: Decimal,
    pub final_equity: Decimal,
    /// `final_equity / starting_capital - 1`.
    pub total_return: f64,
    pub net_pnl_absolute: Decimal,
    /// Winning / closed trades. `None` means "no trades".
    pub win_rate: Option<f64>,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub forced_closes: u32,
    /// Largest peak-to-trough decline, as a fraction of the peak.
    pub max_drawdown: f64,
    pub max_drawdown_absolute: Decimal,
    pub drawdown_duration_secs: i64,

    // Supplementary metrics
    /// `None` when there are no losing trades.
    pub profit_factor: Option<f64>,
    pub expectancy: Option<Decimal>,
    pub sharpe_ratio: f64,
    pub avg_trade_duration_secs: Option<f64>,
}

impl PerformanceReport {
    /// Creates a new, empty report with zero values.
    pub fn new() -> Self {
        Self::default()
    }
}
