// In crates/execution/src/types.rs

use chrono::{DateTime, Utc};
use core_types::TradingPair;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// The taker fee charged on each fill's notional (e.g., 0.0004 for 0.04%).
    #[serde(default)]
    pub taker_fee: f64,

    /// The simulated slippage for market fills (e.g., 0.0005 for 0.05%).
    #[serde(default)]
    pub slippage_percent: f64,
}

/// Direction of a simulated order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// An order submitted to an executor. Orders are all-in: a buy spends the
/// whole cash balance, a sell closes the whole position.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub pair: TradingPair,
    pub side: OrderSide,
}

/// The result of a fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Execution {
    pub pair: TradingPair,
    pub side: OrderSide,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// An open long position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub pair: TradingPair,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    /// Cash committed on entry, fee included. Realized P&L is measured against it.
    pub cost_basis: Decimal,
    pub entry_fee: Decimal,
}

/// Represents the state of the simulated portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    /// Cash not committed to a position (quote currency, e.g. USDT).
    pub cash: Decimal,
    /// At most one open position; there is no pyramiding.
    pub position: Option<Position>,
}

impl Portfolio {
    /// Creates a new flat portfolio with an initial cash balance.
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            cash: initial_cash,
            position: None,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Cash plus the open position valued at `mark_price`.
    pub fn equity(&self, mark_price: Decimal) -> Decimal {
        match &self.position {
            Some(position) => self.cash + position.quantity * mark_price,
            None => self.cash,
        }
    }
}
