pub mod logger;
pub mod pipeline;

use analytics::types::{EquityPoint, Trade};
use core_types::{Bar, Error, FillPolicy, Result, Signal, SignalPoint, TradingPair};
use execution::{Executor, OrderRequest, OrderSide, Portfolio, SimulatedExecutor, SimulationSettings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::logger::TradeLogger;

pub use pipeline::{BacktestOutcome, ChartPoint, PipelineConfig, run_pipeline};

/// Settings for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Must be strictly positive.
    pub starting_capital: Decimal,
    pub fill_policy: FillPolicy,
    #[serde(default)]
    pub simulation: SimulationSettings,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            starting_capital: Decimal::from(10_000),
            fill_policy: FillPolicy::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.starting_capital <= Decimal::ZERO {
            return Err(Error::invalid(format!(
                "starting capital must be positive, got {}",
                self.starting_capital
            )));
        }
        Ok(())
    }
}

/// The trade log and equity curve produced by a run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// BUY signals that could not be acted upon (entry would land on the final bar).
    pub skipped_entries: usize,
}

/// Replays signals against a bar series.
///
/// Two states: FLAT (no position) and LONG (one open position). A BUY while
/// FLAT opens a position, a SELL while LONG closes it, anything else is a
/// no-op. A position still open after the last bar is closed at the last
/// close and flagged as a forced close.
pub struct Backtester {
    /// The pair being tested.
    pub pair: TradingPair,
    config: BacktestConfig,
    executor: SimulatedExecutor,
    logger: TradeLogger,
    portfolio: Portfolio,
    skipped_entries: usize,
}

impl Backtester {
    pub fn new(pair: TradingPair, config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        let executor = SimulatedExecutor::new(config.simulation)?;
        Ok(Self {
            pair,
            config,
            executor,
            logger: TradeLogger::new(),
            portfolio: Portfolio::new(config.starting_capital),
            skipped_entries: 0,
        })
    }

    /// Runs the simulation. `signals` must cover the tail of `bars`, one per bar,
    /// as produced by the signal generator.
    pub fn run(mut self, bars: &[Bar], signals: &[SignalPoint]) -> Result<BacktestResult> {
        let per_bar = align_signals(bars, signals)?;
        let last_index = bars.len().saturating_sub(1);
        let mut pending: Option<Signal> = None;

        for (i, bar) in bars.iter().enumerate() {
            // --- 1. Fill the order carried over from the previous bar ---
            if let Some(signal) = pending.take() {
                self.act(signal, bar.open, bar, i == last_index)?;
            }

            // --- 2. React to this bar's signal ---
            if let Some(signal) = per_bar[i].filter(|s| *s != Signal::Hold) {
                match self.config.fill_policy {
                    FillPolicy::SignalBarClose => self.act(signal, bar.close, bar, i == last_index)?,
                    FillPolicy::NextBarOpen if i < last_index => pending = Some(signal),
                    FillPolicy::NextBarOpen => {
                        tracing::debug!(time = %bar.timestamp, ?signal, "Signal on the final bar has no next bar to fill at.");
                        if signal == Signal::Buy && self.portfolio.is_flat() {
                            self.skipped_entries += 1;
                        }
                    }
                }
            }

            // --- 3. Mark the portfolio to this bar's close ---
            self.logger.record_equity(bar.timestamp, self.portfolio.equity(bar.close));
        }

        // --- 4. Settle a position that is still open ---
        if let Some(last_bar) = bars.last() {
            if !self.portfolio.is_flat() {
                let (execution, position) =
                    self.executor
                        .close_at_mark(self.pair, last_bar.close, last_bar.timestamp, &mut self.portfolio)?;
                let trade = self.logger.record_trade(&position, &execution, true);
                tracing::info!(pnl = %trade.pnl, exit_price = %trade.exit_price, "Open position force-closed at the end of the data.");
            }
        }

        tracing::info!(
            pair = %self.pair,
            bars = bars.len(),
            trades = self.logger.trades.len(),
            final_cash = %self.portfolio.cash,
            "Backtest finished."
        );

        Ok(BacktestResult {
            trades: self.logger.trades,
            equity_curve: self.logger.equity_curve,
            skipped_entries: self.skipped_entries,
        })
    }

    /// Applies one BUY/SELL at `price` on `bar`.
    fn act(&mut self, signal: Signal, price: Decimal, bar: &Bar, is_final_bar: bool) -> Result<()> {
        let side = match (signal, self.portfolio.is_flat()) {
            (Signal::Buy, true) if is_final_bar => {
                tracing::warn!(time = %bar.timestamp, "BUY on the final bar skipped: no later bar to close against.");
                self.skipped_entries += 1;
                return Ok(());
            }
            (Signal::Buy, true) => OrderSide::Buy,
            (Signal::Sell, false) => OrderSide::Sell,
            _ => return Ok(()),
        };

        let order = OrderRequest { pair: self.pair, side };
        let (execution, closed) = self.executor.execute(&order, price, bar.timestamp, &mut self.portfolio)?;
        match closed {
            Some(position) => {
                let trade = self.logger.record_trade(&position, &execution, false);
                tracing::debug!(pnl = %trade.pnl, time = %bar.timestamp, "Position closed.");
            }
            None => {
                tracing::debug!(price = %execution.price, quantity = %execution.quantity, time = %bar.timestamp, "Position opened.");
            }
        }
        Ok(())
    }
}

/// Spreads the signal list over the bars. Bars before the first signal get `None`.
fn align_signals(bars: &[Bar], signals: &[SignalPoint]) -> Result<Vec<Option<Signal>>> {
    let offset = bars
        .len()
        .checked_sub(signals.len())
        .ok_or_else(|| Error::invalid("more signals than bars"))?;

    let mut per_bar = vec![None; bars.len()];
    for (k, point) in signals.iter().enumerate() {
        let bar = &bars[offset + k];
        if bar.timestamp != point.timestamp {
            return Err(Error::invalid(format!(
                "signal at {} does not line up with bar at {}",
                point.timestamp, bar.timestamp
            )));
        }
        per_bar[offset + k] = Some(point.signal);
    }
    Ok(per_bar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn t(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64)
    }

    fn bar(i: usize, open: Decimal, close: Decimal) -> Bar {
        Bar {
            timestamp: t(i),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: dec!(1),
        }
    }

    fn flat_bars(closes: &[Decimal]) -> Vec<Bar> {
        closes.iter().enumerate().map(|(i, c)| bar(i, *c, *c)).collect()
    }

    fn signals(bars: &[Bar], raw: &[Signal]) -> Vec<SignalPoint> {
        let offset = bars.len() - raw.len();
        raw.iter()
            .enumerate()
            .map(|(k, s)| SignalPoint { timestamp: bars[offset + k].timestamp, signal: *s })
            .collect()
    }

    fn config(fill_policy: FillPolicy) -> BacktestConfig {
        BacktestConfig {
            starting_capital: dec!(1000),
            fill_policy,
            simulation: SimulationSettings::default(),
        }
    }

    fn run(bars: &[Bar], raw: &[Signal], policy: FillPolicy) -> BacktestResult {
        Backtester::new(TradingPair::BtcUsdt, config(policy))
            .unwrap()
            .run(bars, &signals(bars, raw))
            .unwrap()
    }

    use Signal::{Buy, Hold, Sell};

    #[test]
    fn buy_then_sell_at_signal_close() {
        let bars = flat_bars(&[dec!(10), dec!(20), dec!(25), dec!(15)]);
        let result = run(&bars, &[Buy, Hold, Sell, Hold], FillPolicy::SignalBarClose);

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.entry_price, dec!(10));
        assert_eq!(trade.exit_price, dec!(25));
        assert_eq!(trade.pnl, dec!(1500));
        assert!(!trade.forced_close);

        let equity: Vec<_> = result.equity_curve.iter().map(|p| p.value).collect();
        assert_eq!(equity, vec![dec!(1000), dec!(2000), dec!(2500), dec!(2500)]);
    }

    #[test]
    fn next_bar_open_fills_one_bar_later() {
        let bars = vec![
            bar(0, dec!(10), dec!(10)),
            bar(1, dec!(20), dec!(22)),
            bar(2, dec!(24), dec!(30)),
            bar(3, dec!(40), dec!(35)),
        ];
        let result = run(&bars, &[Buy, Sell, Hold, Hold], FillPolicy::NextBarOpen);

        let trade = &result.trades[0];
        assert_eq!(trade.entry_time, t(1));
        assert_eq!(trade.entry_price, dec!(20));
        assert_eq!(trade.exit_time, t(2));
        assert_eq!(trade.exit_price, dec!(24));
        // Flat on bar 0, long over bar 1 (50 units at 22), flat afterwards.
        let equity: Vec<_> = result.equity_curve.iter().map(|p| p.value).collect();
        assert_eq!(equity, vec![dec!(1000), dec!(1100), dec!(1200), dec!(1200)]);
    }

    #[test]
    fn open_position_is_force_closed_at_last_close() {
        let bars = flat_bars(&[dec!(10), dec!(12), dec!(8)]);
        let result = run(&bars, &[Buy, Hold, Hold], FillPolicy::SignalBarClose);

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert!(trade.forced_close);
        assert_eq!(trade.exit_price, dec!(8));
        assert_eq!(trade.exit_time, t(2));
        assert_eq!(trade.pnl, dec!(-200));
        assert_eq!(result.equity_curve.last().unwrap().value, dec!(800));
    }

    #[test]
    fn buy_on_final_bar_is_skipped() {
        let bars = flat_bars(&[dec!(10), dec!(11), dec!(12)]);
        let result = run(&bars, &[Hold, Hold, Buy], FillPolicy::SignalBarClose);
        assert!(result.trades.is_empty());
        assert_eq!(result.skipped_entries, 1);
        assert!(result.equity_curve.iter().all(|p| p.value == dec!(1000)));
    }

    #[test]
    fn next_bar_open_skips_entry_landing_on_final_bar() {
        let bars = flat_bars(&[dec!(10), dec!(11), dec!(12)]);
        let result = run(&bars, &[Hold, Buy, Hold], FillPolicy::NextBarOpen);
        assert!(result.trades.is_empty());
        assert_eq!(result.skipped_entries, 1);
    }

    #[test]
    fn sell_while_flat_and_buy_while_long_are_ignored() {
        let bars = flat_bars(&[dec!(10), dec!(11), dec!(12), dec!(13), dec!(9)]);
        let result = run(&bars, &[Sell, Buy, Buy, Sell, Sell], FillPolicy::SignalBarClose);
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].entry_time, t(1));
        assert_eq!(result.trades[0].exit_time, t(3));
    }

    #[test]
    fn equity_curve_has_one_point_per_bar_even_without_signals() {
        let bars = flat_bars(&[dec!(10), dec!(11), dec!(12), dec!(13)]);
        let result = run(&bars, &[], FillPolicy::SignalBarClose);
        assert_eq!(result.equity_curve.len(), bars.len());
        assert!(result.trades.is_empty());
    }

    #[test]
    fn non_positive_capital_is_rejected() {
        let mut cfg = config(FillPolicy::SignalBarClose);
        cfg.starting_capital = Decimal::ZERO;
        assert!(matches!(
            Backtester::new(TradingPair::EthUsdt, cfg),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn misaligned_signals_are_rejected() {
        let bars = flat_bars(&[dec!(10), dec!(11)]);
        let wrong = vec![SignalPoint { timestamp: t(0), signal: Buy }];
        let result = Backtester::new(TradingPair::BtcUsdt, config(FillPolicy::SignalBarClose))
            .unwrap()
            .run(&bars, &wrong);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
