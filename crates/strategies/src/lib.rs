// In crates/strategies/src/lib.rs

use core_types::{Bar, Result, SignalPoint};
use serde::Serialize;

pub mod indicators;
pub mod ma_crossover;
pub mod types;

pub use indicators::SmaPair;
pub use ma_crossover::SmaCrossover;
pub use types::SmaCrossoverSettings;

/// What a strategy derives from a bar series: the indicator values it used
/// and one signal per bar from the point its indicators are available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub smas: SmaPair,
    pub signals: Vec<SignalPoint>,
}

/// The universal interface for a trading strategy.
///
/// A strategy is a pure function of the bar series: it keeps no state between
/// calls, so assessing the same bars twice yields the same signals.
pub trait Strategy {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    fn assess(&self, bars: &[Bar]) -> Result<Assessment>;
}
