// In crates/core-types/src/types.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The trading pairs the demo knows how to fetch and backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingPair {
    #[serde(rename = "BTC-USDT")]
    BtcUsdt,
    #[serde(rename = "ETH-USDT")]
    EthUsdt,
    #[serde(rename = "BNB-USDT")]
    BnbUsdt,
}

impl TradingPair {
    pub const ALL: [TradingPair; 3] = [TradingPair::BtcUsdt, TradingPair::EthUsdt, TradingPair::BnbUsdt];

    /// The instrument id, as used by OKX (`BTC-USDT`).
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingPair::BtcUsdt => "BTC-USDT",
            TradingPair::EthUsdt => "ETH-USDT",
            TradingPair::BnbUsdt => "BNB-USDT",
        }
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingPair {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['/', '_'], "-");
        TradingPair::ALL
            .into_iter()
            .find(|pair| pair.as_str() == normalized)
            .ok_or_else(|| Error::invalid(format!("unsupported trading pair '{}'", s)))
    }
}

/// The bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::OneHour, Timeframe::FourHours, Timeframe::OneDay];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
            Timeframe::OneDay => "1d",
        }
    }

    /// The `bar` query value OKX expects. Daily bars use the UTC-aligned variant.
    pub fn okx_bar(&self) -> &'static str {
        match self {
            Timeframe::OneHour => "1H",
            Timeframe::FourHours => "4H",
            Timeframe::OneDay => "1Dutc",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::OneHour => Duration::hours(1),
            Timeframe::FourHours => Duration::hours(4),
            Timeframe::OneDay => Duration::days(1),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == normalized)
            .ok_or_else(|| Error::invalid(format!("unsupported timeframe '{}'", s)))
    }
}

/// Which price a signal is filled at.
///
/// Backtest results are sensitive to this choice, so it is always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillPolicy {
    /// Fill at the close of the bar that produced the signal.
    #[default]
    SignalBarClose,
    /// Fill at the open of the bar after the signal bar.
    NextBarOpen,
}

impl FillPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillPolicy::SignalBarClose => "signal-bar-close",
            FillPolicy::NextBarOpen => "next-bar-open",
        }
    }
}

impl fmt::Display for FillPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signal-bar-close" | "close" => Ok(FillPolicy::SignalBarClose),
            "next-bar-open" | "open" => Ok(FillPolicy::NextBarOpen),
            other => Err(Error::invalid(format!("unknown fill policy '{}'", other))),
        }
    }
}

/// A single OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// The action suggested by a strategy for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// A signal attached to the timestamp of the bar that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub timestamp: DateTime<Utc>,
    pub signal: Signal,
}
