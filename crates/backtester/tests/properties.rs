use analytics::MetricsConfig;
use backtester::{BacktestConfig, PipelineConfig, run_pipeline};
use chrono::{Duration, TimeZone, Utc};
use core_types::{Bar, FillPolicy, Signal, TradingPair};
use execution::SimulationSettings;
use proptest::prelude::*;
use rust_decimal::Decimal;
use strategies::SmaCrossoverSettings;

fn bars(closes: &[u32]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let close = Decimal::from(*c);
            Bar {
                timestamp: start + Duration::hours(4 * i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: Decimal::ONE,
            }
        })
        .collect()
}

fn config(short: usize, long: usize, taker_fee: f64) -> PipelineConfig {
    PipelineConfig {
        strategy: SmaCrossoverSettings::new(short, long).unwrap(),
        backtest: BacktestConfig {
            starting_capital: Decimal::from(10_000),
            fill_policy: FillPolicy::SignalBarClose,
            simulation: SimulationSettings { taker_fee, slippage_percent: 0.0 },
        },
        metrics: MetricsConfig::default(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn equity_curve_matches_bar_count(
        closes in prop::collection::vec(1u32..500, 0..120),
        short in 1usize..6,
        extra in 1usize..10,
    ) {
        let data = bars(&closes);
        let outcome = run_pipeline(TradingPair::BtcUsdt, &data, &config(short, short + extra, 0.0)).unwrap();
        prop_assert_eq!(outcome.equity_curve.len(), data.len());
        prop_assert_eq!(outcome.chart.len(), data.len());
    }

    #[test]
    fn trades_follow_completed_buy_sell_pairs(
        closes in prop::collection::vec(1u32..500, 0..120),
        short in 1usize..6,
        extra in 1usize..10,
    ) {
        let data = bars(&closes);
        let outcome = run_pipeline(TradingPair::BtcUsdt, &data, &config(short, short + extra, 0.0)).unwrap();

        let last = data.len().saturating_sub(1);
        let mut long = false;
        let mut completed = 0;
        for (i, point) in outcome.chart.iter().enumerate() {
            match point.signal {
                Some(Signal::Buy) if !long && i != last => long = true,
                Some(Signal::Sell) if long => {
                    long = false;
                    completed += 1;
                }
                _ => {}
            }
        }

        let forced = outcome.trades.iter().filter(|t| t.forced_close).count();
        prop_assert!(forced <= 1);
        prop_assert_eq!(forced, usize::from(long));
        prop_assert_eq!(outcome.trades.len(), completed + forced);
        if forced == 1 {
            prop_assert!(outcome.trades.last().unwrap().forced_close);
        }
    }

    #[test]
    fn trades_never_overlap_and_always_move_forward(
        closes in prop::collection::vec(1u32..500, 0..120),
        short in 1usize..6,
        extra in 1usize..10,
    ) {
        let data = bars(&closes);
        let outcome = run_pipeline(TradingPair::EthUsdt, &data, &config(short, short + extra, 0.0005)).unwrap();
        for trade in &outcome.trades {
            prop_assert!(trade.exit_time > trade.entry_time);
        }
        for pair in outcome.trades.windows(2) {
            prop_assert!(pair[1].entry_time > pair[0].exit_time);
        }
    }

    #[test]
    fn metrics_stay_within_bounds(
        closes in prop::collection::vec(1u32..500, 0..120),
        short in 1usize..6,
        extra in 1usize..10,
    ) {
        let data = bars(&closes);
        let outcome = run_pipeline(TradingPair::BnbUsdt, &data, &config(short, short + extra, 0.001)).unwrap();
        let report = &outcome.report;
        prop_assert!((0.0..=1.0).contains(&report.max_drawdown));
        match report.win_rate {
            Some(rate) => prop_assert!((0.0..=1.0).contains(&rate)),
            None => prop_assert!(outcome.trades.is_empty()),
        }
        prop_assert!(outcome.equity_curve.iter().all(|p| p.value >= Decimal::ZERO));
    }
}
