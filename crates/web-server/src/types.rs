// In crates/web-server/src/types.rs

use std::str::FromStr;

use app_config::BacktestSettings;
use backtester::PipelineConfig;
use core_types::{Error, FillPolicy, Result, Timeframe, TradingPair};
use execution::SimulationSettings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strategies::SmaCrossoverSettings;

/// The dashboard controls, as query parameters of `GET /api/backtest`.
///
/// Every field is optional; missing ones fall back to the configured defaults.
/// Values arrive as strings so a typo produces our own 400 body.
#[derive(Debug, Default, Deserialize)]
pub struct BacktestQuery {
    pub pair: Option<String>,
    pub timeframe: Option<String>,
    pub short_window: Option<String>,
    pub long_window: Option<String>,
    pub starting_capital: Option<String>,
    pub fill_policy: Option<String>,
    pub limit: Option<String>,
}

/// A fully resolved request: what to fetch and how to run it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBacktest {
    pub pair: TradingPair,
    pub timeframe: Timeframe,
    pub limit: usize,
    pub config: PipelineConfig,
}

impl BacktestQuery {
    /// Applies the query over `defaults` and validates the result.
    pub fn resolve(&self, defaults: &BacktestSettings, simulation: SimulationSettings) -> Result<ResolvedBacktest> {
        let mut settings = defaults.clone();
        if let Some(pair) = &self.pair {
            settings.pair = pair.parse()?;
        }
        if let Some(timeframe) = &self.timeframe {
            settings.timeframe = timeframe.parse()?;
        }
        if let Some(fill_policy) = &self.fill_policy {
            settings.fill_policy = fill_policy.parse()?;
        }
        if let Some(value) = &self.short_window {
            settings.short_window = parse_number("short_window", value)?;
        }
        if let Some(value) = &self.long_window {
            settings.long_window = parse_number("long_window", value)?;
        }
        if let Some(value) = &self.starting_capital {
            settings.starting_capital = parse_number("starting_capital", value)?;
        }
        if let Some(value) = &self.limit {
            settings.limit = parse_number("limit", value)?;
        }

        // Also checks `limit` against `MAX_LIMIT`.
        let config = settings.pipeline_config(simulation)?;
        Ok(ResolvedBacktest {
            pair: settings.pair,
            timeframe: settings.timeframe,
            limit: settings.limit,
            config,
        })
    }
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid(format!("{} must be a number, got '{}'", field, value)))
}

/// The response of `GET /api/options`: what the dashboard controls may offer.
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub pairs: Vec<TradingPair>,
    pub timeframes: Vec<Timeframe>,
    pub fill_policies: Vec<FillPolicy>,
    pub defaults: Defaults,
}

#[derive(Debug, Serialize)]
pub struct Defaults {
    pub pair: TradingPair,
    pub timeframe: Timeframe,
    pub strategy: SmaCrossoverSettings,
    pub starting_capital: Decimal,
    pub fill_policy: FillPolicy,
    pub limit: usize,
}

impl From<&BacktestSettings> for Defaults {
    fn from(settings: &BacktestSettings) -> Self {
        Self {
            pair: settings.pair,
            timeframe: settings.timeframe,
            strategy: SmaCrossoverSettings {
                short_window: settings.short_window,
                long_window: settings.long_window,
            },
            starting_capital: settings.starting_capital,
            fill_policy: settings.fill_policy,
            limit: settings.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn defaults() -> BacktestSettings {
        BacktestSettings {
            pair: TradingPair::BtcUsdt,
            timeframe: Timeframe::OneHour,
            short_window: 20,
            long_window: 50,
            starting_capital: dec!(10000),
            fill_policy: FillPolicy::SignalBarClose,
            limit: 1000,
            exclude_forced_close: false,
        }
    }

    fn query(pairs: &[(&str, &str)]) -> BacktestQuery {
        let mut query = BacktestQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "short_window" => query.short_window = value,
                "long_window" => query.long_window = value,
                "starting_capital" => query.starting_capital = value,
                "limit" => query.limit = value,
                "timeframe" => query.timeframe = value,
                _ => unreachable!(),
            }
        }
        query
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let resolved = BacktestQuery::default().resolve(&defaults(), SimulationSettings::default()).unwrap();
        assert_eq!(resolved.pair, TradingPair::BtcUsdt);
        assert_eq!(resolved.limit, 1000);
        assert_eq!(resolved.config.strategy.long_window, 50);
    }

    #[test]
    fn numeric_fields_are_parsed() {
        let resolved = query(&[
            ("short_window", "5"),
            ("long_window", "15"),
            ("starting_capital", "250.5"),
            ("limit", "300"),
            ("timeframe", "4h"),
        ])
        .resolve(&defaults(), SimulationSettings::default())
            .unwrap();
        assert_eq!(resolved.config.strategy.short_window, 5);
        assert_eq!(resolved.config.strategy.long_window, 15);
        assert_eq!(resolved.config.backtest.starting_capital, dec!(250.5));
        assert_eq!(resolved.limit, 300);
        assert_eq!(resolved.timeframe, Timeframe::FourHours);
    }

    #[test]
    fn non_numeric_fields_are_invalid() {
        for field in ["short_window", "long_window", "starting_capital", "limit"] {
            let err = query(&[(field, "abc")]).resolve(&defaults(), SimulationSettings::default()).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(ref msg) if msg.contains(field)), "{}", err);
        }
    }

    #[test]
    fn limit_must_be_in_range() {
        for limit in ["0", "10001", "200000000"] {
            let err = query(&[("limit", limit)]).resolve(&defaults(), SimulationSettings::default()).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "{}", err);
        }
        let max = query(&[("limit", "10000")]).resolve(&defaults(), SimulationSettings::default()).unwrap();
        assert_eq!(max.limit, app_config::MAX_LIMIT);
    }
}
