// In crates/strategies/src/indicators.rs

use std::collections::VecDeque;

use core_types::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;

/// A simple moving average over a fixed trailing window, updated one value at a time.
///
/// Kept in exact decimal arithmetic so two averages can be compared for equality.
#[derive(Debug, Clone)]
pub struct RollingSma {
    window: usize,
    buf: VecDeque<Decimal>,
    sum: Decimal,
}

impl RollingSma {
    pub fn new(window: usize) -> Result<Self> {
        if window < 1 {
            return Err(Error::invalid("SMA window must be at least 1"));
        }
        Ok(Self {
            window,
            buf: VecDeque::with_capacity(window),
            sum: Decimal::ZERO,
        })
    }

    /// Feeds the next value. Returns the average once the window is full.
    pub fn next(&mut self, value: Decimal) -> Option<Decimal> {
        self.buf.push_back(value);
        self.sum += value;
        if self.buf.len() > self.window {
            if let Some(front) = self.buf.pop_front() {
                self.sum -= front;
            }
        }

        if self.buf.len() == self.window {
            Some(self.sum / Decimal::from(self.window))
        } else {
            None
        }
    }
}

/// Computes an SMA series aligned with `values`.
///
/// The first `window - 1` entries are `None` (not yet available), never zero.
pub fn sma(values: &[Decimal], window: usize) -> Result<Vec<Option<Decimal>>> {
    let mut rolling = RollingSma::new(window)?;
    Ok(values.iter().map(|v| rolling.next(*v)).collect())
}

/// The short and long SMA series of a close-price sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmaPair {
    pub short_window: usize,
    pub long_window: usize,
    pub short: Vec<Option<Decimal>>,
    pub long: Vec<Option<Decimal>>,
}

impl SmaPair {
    pub fn len(&self) -> usize {
        self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty()
    }
}

/// Computes both averages. Fails when `short >= long` or either window is zero.
pub fn sma_pair(closes: &[Decimal], short_window: usize, long_window: usize) -> Result<SmaPair> {
    if short_window < 1 || long_window < 1 {
        return Err(Error::invalid(format!(
            "SMA windows must be at least 1 (short = {}, long = {})",
            short_window, long_window
        )));
    }
    if short_window >= long_window {
        return Err(Error::invalid(format!(
            "short window ({}) must be smaller than long window ({})",
            short_window, long_window
        )));
    }

    Ok(SmaPair {
        short_window,
        long_window,
        short: sma(closes, short_window)?,
        long: sma(closes, long_window)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    /// Index of the first bar where both averages exist.
    fn first_available(pair: &SmaPair) -> Option<usize> {
        pair.short
            .iter()
            .zip(&pair.long)
            .position(|(s, l)| s.is_some() && l.is_some())
    }

    #[test]
    fn sma_marks_warmup_as_unavailable() {
        let closes = [dec!(10), dec!(11), dec!(12), dec!(9)];
        let series = sma(&closes, 3).unwrap();
        assert_eq!(series, vec![None, None, Some(dec!(11)), Some(dec!(32) / dec!(3))]);
    }

    #[test]
    fn window_of_one_is_the_input() {
        let closes = [dec!(1.5), dec!(2.5)];
        assert_eq!(sma(&closes, 1).unwrap(), vec![Some(dec!(1.5)), Some(dec!(2.5))]);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(matches!(sma(&[dec!(1)], 0), Err(Error::InvalidParameter(_))));
        assert!(matches!(sma_pair(&[dec!(1)], 0, 3), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn pair_rejects_short_not_below_long() {
        let closes = [dec!(1), dec!(2), dec!(3)];
        assert!(matches!(sma_pair(&closes, 3, 3), Err(Error::InvalidParameter(_))));
        assert!(matches!(sma_pair(&closes, 5, 2), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn pair_reports_first_bar_with_both_values() {
        let closes = [dec!(10), dec!(11), dec!(12), dec!(9), dec!(8)];
        let pair = sma_pair(&closes, 2, 3).unwrap();
        assert_eq!(pair.len(), 5);
        assert_eq!(first_available(&pair), Some(2));
        assert_eq!(pair.short[1], Some(dec!(10.5)));
    }

    #[test]
    fn series_shorter_than_window_has_no_values() {
        let pair = sma_pair(&[dec!(1), dec!(2)], 2, 5).unwrap();
        assert_eq!(first_available(&pair), None);
        assert!(pair.long.iter().all(Option::is_none));
    }

    proptest! {
        #[test]
        fn available_count_is_n_minus_window_plus_one(
            prices in prop::collection::vec(1u32..100_000, 0..120),
            window in 1usize..40,
        ) {
            let closes: Vec<Decimal> = prices.iter().map(|p| Decimal::from(*p)).collect();
            let series = sma(&closes, window).unwrap();
            let available = series.iter().filter(|v| v.is_some()).count();
            prop_assert_eq!(series.len(), closes.len());
            prop_assert_eq!(available, (closes.len() + 1).saturating_sub(window));
        }
    }
}
