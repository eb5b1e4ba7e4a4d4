// In crates/backtester/src/logger.rs

use analytics::types::{EquityPoint, Trade};
use chrono::{DateTime, Utc};
use execution::{Execution, Position};
use rust_decimal::Decimal;

/// A logger responsible for recording trades and equity changes during a backtest.
#[derive(Debug, Default)]
pub struct TradeLogger {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl TradeLogger {
    /// Creates a new, empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a point in the equity curve.
    pub fn record_equity(&mut self, timestamp: DateTime<Utc>, value: Decimal) {
        self.equity_curve.push(EquityPoint { timestamp, value });
    }

    /// Records a completed trade by combining the entry position and the closing execution.
    ///
    /// P&L is measured against the cash committed on entry, so both fees are included.
    pub fn record_trade(&mut self, open_pos: &Position, close_exec: &Execution, forced_close: bool) -> &Trade {
        let proceeds = close_exec.quantity * close_exec.price - close_exec.fee;
        let trade = Trade {
            pair: open_pos.pair,
            entry_time: open_pos.entry_time,
            exit_time: close_exec.timestamp,
            entry_price: open_pos.entry_price,
            exit_price: close_exec.price,
            quantity: open_pos.quantity,
            pnl: proceeds - open_pos.cost_basis,
            fees: open_pos.entry_fee + close_exec.fee,
            forced_close,
        };
        self.trades.push(trade);
        &self.trades[self.trades.len() - 1]
    }
}
