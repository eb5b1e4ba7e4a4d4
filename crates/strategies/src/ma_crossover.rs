// In crates/strategies/src/ma_crossover.rs

use crate::indicators::{SmaPair, sma_pair};
use crate::types::SmaCrossoverSettings;
use crate::{Assessment, Strategy};
use chrono::{DateTime, Utc};
use core_types::{Bar, Error, Result, Signal, SignalPoint};
use std::cmp::Ordering;

// The last strict relation between the short and the long average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Above,
    Below,
}

/// The SMA crossover strategy: BUY when the short average crosses above the
/// long one, SELL when it crosses below.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    settings: SmaCrossoverSettings,
}

impl SmaCrossover {
    /// Creates a new `SmaCrossover`, rejecting invalid windows.
    pub fn new(settings: SmaCrossoverSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> &'static str {
        "sma_crossover"
    }

    fn assess(&self, bars: &[Bar]) -> Result<Assessment> {
        let closes: Vec<_> = bars.iter().map(|b| b.close).collect();
        let timestamps: Vec<_> = bars.iter().map(|b| b.timestamp).collect();
        let smas = sma_pair(&closes, self.settings.short_window, self.settings.long_window)?;
        let signals = generate_signals(&timestamps, &smas);
        tracing::debug!(
            strategy = self.name(),
            bars = bars.len(),
            signals = signals.len(),
            "Assessed bar series."
        );
        Ok(Assessment { smas, signals })
    }
}

/// Returns `InsufficientData` when there are fewer bars than the long window.
///
/// Signal generation itself still succeeds (with no signals); callers are
/// expected to surface this as a warning.
pub fn ensure_sufficient_data(bars: usize, long_window: usize) -> Result<()> {
    if bars < long_window {
        return Err(Error::InsufficientData { bars, required: long_window });
    }
    Ok(())
}

/// Derives one signal per bar, starting at the first bar where both averages exist.
///
/// Only strict crossovers fire. Bars where the averages are equal never fire
/// and do not reset the remembered side, so BUY and SELL always alternate.
/// The first strict relation observed only sets the baseline.
pub fn generate_signals(timestamps: &[DateTime<Utc>], smas: &SmaPair) -> Vec<SignalPoint> {
    let mut last_relation: Option<Relation> = None;
    let mut signals = Vec::with_capacity(smas.len().saturating_sub(smas.long_window.saturating_sub(1)));

    for (i, timestamp) in timestamps.iter().enumerate().take(smas.len()) {
        let (Some(short), Some(long)) = (smas.short[i], smas.long[i]) else {
            continue;
        };

        let relation = match short.cmp(&long) {
            Ordering::Greater => Some(Relation::Above),
            Ordering::Less => Some(Relation::Below),
            Ordering::Equal => None,
        };

        let signal = match (last_relation, relation) {
            (Some(Relation::Below), Some(Relation::Above)) => Signal::Buy,
            (Some(Relation::Above), Some(Relation::Below)) => Signal::Sell,
            _ => Signal::Hold,
        };

        if relation.is_some() {
            last_relation = relation;
        }

        signals.push(SignalPoint { timestamp: *timestamp, signal });
    }

    signals
}
