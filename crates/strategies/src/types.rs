// In crates/strategies/src/types.rs

use core_types::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)] // Copy is handy for the optimizer grid
pub struct SmaCrossoverSettings {
    /// Bars in the fast moving average.
    pub short_window: usize,
    /// Bars in the slow moving average. Must be strictly larger than `short_window`.
    pub long_window: usize,
}

impl SmaCrossoverSettings {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self> {
        let settings = Self { short_window, long_window };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.short_window < 1 || self.long_window < 1 {
            return Err(Error::invalid(format!(
                "SMA windows must be at least 1 (short = {}, long = {})",
                self.short_window, self.long_window
            )));
        }
        if self.short_window >= self.long_window {
            return Err(Error::invalid(format!(
                "short window ({}) must be smaller than long window ({})",
                self.short_window, self.long_window
            )));
        }
        Ok(())
    }
}

impl Default for SmaCrossoverSettings {
    fn default() -> Self {
        // Matches the dashboard slider defaults.
        Self { short_window: 20, long_window: 50 }
    }
}
