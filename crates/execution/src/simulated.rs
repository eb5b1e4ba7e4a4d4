// In crates/execution/src/simulated.rs

use crate::types::{Execution, OrderRequest, OrderSide, Portfolio, Position, SimulationSettings};
use crate::{Error, Executor, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal_macros::dec;

/// Fills orders against historical prices, applying a taker fee and slippage.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    fee_rate: Decimal,
    slippage: Decimal,
}

impl SimulatedExecutor {
    pub fn new(settings: SimulationSettings) -> Result<Self> {
        Ok(Self {
            fee_rate: rate("taker_fee", settings.taker_fee)?,
            slippage: rate("slippage_percent", settings.slippage_percent)?,
        })
    }

    /// Opens a long position with the whole cash balance.
    fn process_entry(
        &self,
        order: &OrderRequest,
        current_price: Decimal,
        current_time: DateTime<Utc>,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Option<Position>)> {
        if portfolio.cash <= Decimal::ZERO {
            return Err(Error::ExecutionFailed {
                reason: "No cash available to open a position".to_string(),
            });
        }

        // For a long entry, slippage makes the price worse (higher).
        let execution_price = current_price * (dec!(1) + self.slippage);

        // The fee comes out of the committed cash: notional + fee == cash.
        let cost_basis = portfolio.cash;
        let fee = cost_basis * self.fee_rate / (dec!(1) + self.fee_rate);
        let notional = cost_basis - fee;
        let quantity = notional.checked_div(execution_price).ok_or_else(|| Error::ExecutionFailed {
            reason: format!("Cannot fill at price {}", execution_price),
        })?;

        let position = Position {
            pair: order.pair,
            quantity,
            entry_price: execution_price,
            entry_time: current_time,
            cost_basis,
            entry_fee: fee,
        };
        portfolio.cash = Decimal::ZERO;
        portfolio.position = Some(position);

        let execution = Execution {
            pair: order.pair,
            side: OrderSide::Buy,
            price: execution_price,
            quantity,
            fee,
            timestamp: current_time,
        };
        tracing::debug!(?execution, "Simulated entry filled.");
        Ok((execution, None))
    }

    /// Closes the open position.
    fn process_close(
        &self,
        order: &OrderRequest,
        current_price: Decimal,
        current_time: DateTime<Utc>,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Option<Position>)> {
        let open_position = portfolio.position.take().ok_or_else(|| Error::ExecutionFailed {
            reason: format!("No open position found for {}", order.pair),
        })?;

        // To close a long, we sell. Slippage makes the price worse (lower).
        let execution_price = current_price * (dec!(1) - self.slippage);
        let proceeds = open_position.quantity * execution_price;
        let fee = proceeds * self.fee_rate;
        portfolio.cash += proceeds - fee;

        let execution = Execution {
            pair: order.pair,
            side: OrderSide::Sell,
            price: execution_price,
            quantity: open_position.quantity,
            fee,
            timestamp: current_time,
        };
        tracing::debug!(?execution, "Simulated exit filled.");
        Ok((execution, Some(open_position)))
    }

    /// Closes the open position at `mark_price` with no fee and no slippage.
    ///
    /// Used to settle a position that is still open when the data runs out.
    pub fn close_at_mark(
        &self,
        pair: core_types::TradingPair,
        mark_price: Decimal,
        current_time: DateTime<Utc>,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Position)> {
        let open_position = portfolio.position.take().ok_or_else(|| Error::ExecutionFailed {
            reason: format!("No open position found for {}", pair),
        })?;
        portfolio.cash += open_position.quantity * mark_price;

        let execution = Execution {
            pair,
            side: OrderSide::Sell,
            price: mark_price,
            quantity: open_position.quantity,
            fee: Decimal::ZERO,
            timestamp: current_time,
        };
        Ok((execution, open_position))
    }
}

impl Executor for SimulatedExecutor {
    fn name(&self) -> &'static str {
        "SimulatedExecutor"
    }

    /// Routes the order to the entry or close logic.
    fn execute(
        &mut self,
        order_request: &OrderRequest,
        current_price: Decimal,
        current_time: DateTime<Utc>,
        portfolio: &mut Portfolio,
    ) -> Result<(Execution, Option<Position>)> {
        if current_price <= Decimal::ZERO {
            return Err(Error::ExecutionFailed {
                reason: format!("Non-positive fill price {}", current_price),
            });
        }

        match (order_request.side, portfolio.is_flat()) {
            (OrderSide::Buy, true) => self.process_entry(order_request, current_price, current_time, portfolio),
            (OrderSide::Sell, false) => self.process_close(order_request, current_price, current_time, portfolio),
            (OrderSide::Buy, false) => Err(Error::ExecutionFailed {
                reason: format!("A position in {} is already open", order_request.pair),
            }),
            (OrderSide::Sell, true) => Err(Error::ExecutionFailed {
                reason: format!("No open position found for {}", order_request.pair),
            }),
        }
    }
}

fn rate(name: &str, value: f64) -> Result<Decimal> {
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(Error::InvalidSettings(format!("{} must be in [0, 1), got {}", name, value)));
    }
    Decimal::from_f64(value).ok_or_else(|| Error::InvalidSettings(format!("{} is not representable", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::TradingPair;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn frictionless() -> SimulatedExecutor {
        SimulatedExecutor {
            fee_rate: Decimal::ZERO,
            slippage: Decimal::ZERO,
        }
    }

    fn order(side: OrderSide) -> OrderRequest {
        OrderRequest { pair: TradingPair::BtcUsdt, side }
    }

    #[test]
    fn frictionless_round_trip_returns_price_change() {
        let mut executor = frictionless();
        let mut portfolio = Portfolio::new(dec!(1000));

        let (entry, closed) = executor.execute(&order(OrderSide::Buy), dec!(10), t(0), &mut portfolio).unwrap();
        assert!(closed.is_none());
        assert_eq!(entry.quantity, dec!(100));
        assert_eq!(portfolio.cash, Decimal::ZERO);
        assert_eq!(portfolio.equity(dec!(12)), dec!(1200));

        let (exit, closed) = executor.execute(&order(OrderSide::Sell), dec!(12), t(1), &mut portfolio).unwrap();
        assert_eq!(exit.price, dec!(12));
        assert_eq!(closed.unwrap().entry_price, dec!(10));
        assert_eq!(portfolio.cash, dec!(1200));
        assert!(portfolio.is_flat());
    }

    #[test]
    fn fees_and_slippage_worsen_both_fills() {
        let mut executor = SimulatedExecutor::new(SimulationSettings {
            taker_fee: 0.001,
            slippage_percent: 0.01,
        })
        .unwrap();
        let mut portfolio = Portfolio::new(dec!(1001));

        let (entry, _) = executor.execute(&order(OrderSide::Buy), dec!(100), t(0), &mut portfolio).unwrap();
        assert_eq!(entry.price, dec!(101));
        assert_eq!(entry.fee, dec!(1));
        assert_eq!((entry.quantity * entry.price).round_dp(10), dec!(1000));

        let (exit, _) = executor.execute(&order(OrderSide::Sell), dec!(100), t(1), &mut portfolio).unwrap();
        assert_eq!(exit.price, dec!(99));
        assert!(portfolio.cash < dec!(1001));
    }

    #[test]
    fn selling_while_flat_is_rejected() {
        let mut executor = frictionless();
        let mut portfolio = Portfolio::new(dec!(1000));
        let result = executor.execute(&order(OrderSide::Sell), dec!(10), t(0), &mut portfolio);
        assert!(matches!(result, Err(Error::ExecutionFailed { .. })));
    }

    #[test]
    fn buying_twice_is_rejected() {
        let mut executor = frictionless();
        let mut portfolio = Portfolio::new(dec!(1000));
        executor.execute(&order(OrderSide::Buy), dec!(10), t(0), &mut portfolio).unwrap();
        let result = executor.execute(&order(OrderSide::Buy), dec!(10), t(1), &mut portfolio);
        assert!(result.is_err());
    }

    #[test]
    fn mark_close_charges_nothing() {
        let mut executor = SimulatedExecutor::new(SimulationSettings {
            taker_fee: 0.0,
            slippage_percent: 0.05,
        })
        .unwrap();
        let mut portfolio = Portfolio::new(dec!(1050));
        executor.execute(&order(OrderSide::Buy), dec!(100), t(0), &mut portfolio).unwrap();
        let (exec, position) = executor
            .close_at_mark(TradingPair::BtcUsdt, dec!(105), t(2), &mut portfolio)
            .unwrap();
        assert_eq!(exec.fee, Decimal::ZERO);
        assert_eq!(position.quantity, dec!(10));
        assert_eq!(portfolio.cash, dec!(1050));
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let bad = SimulationSettings { taker_fee: -0.1, slippage_percent: 0.0 };
        assert!(matches!(SimulatedExecutor::new(bad), Err(Error::InvalidSettings(_))));
        let bad = SimulationSettings { taker_fee: 0.0, slippage_percent: f64::NAN };
        assert!(SimulatedExecutor::new(bad).is_err());
    }
}
