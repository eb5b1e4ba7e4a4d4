// In app/src/analyzer.rs

use analytics::PerformanceReport;
use serde::Serialize;
use strategies::SmaCrossoverSettings;

#[derive(Debug, Serialize)]
pub struct RankedReport {
    pub score: f64,
    pub parameters: SmaCrossoverSettings,
    pub report: PerformanceReport,
}

/// Scores every run with at least `min_trades` trades and sorts best first.
pub fn rank_results(results: Vec<(SmaCrossoverSettings, PerformanceReport)>, min_trades: u32) -> Vec<RankedReport> {
    let total_reports = results.len();

    let mut ranked_reports: Vec<RankedReport> = results
        .into_iter()
        .filter(|(_, report)| report.total_trades >= min_trades)
        .map(|(parameters, report)| RankedReport {
            score: calculate_score(&report),
            parameters,
            report,
        })
        .collect();

    tracing::info!(
        total_reports,
        passing_reports = ranked_reports.len(),
        "Finished scoring reports."
    );

    // Higher is better. Ties keep the smaller windows first.
    ranked_reports.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.parameters.short_window.cmp(&b.parameters.short_window))
            .then(a.parameters.long_window.cmp(&b.parameters.long_window))
    });

    ranked_reports
}

/// The multi-objective scoring function.
/// Higher scores are better.
fn calculate_score(report: &PerformanceReport) -> f64 {
    const PROFIT_FACTOR_WEIGHT: f64 = 40.0;
    const SHARPE_RATIO_WEIGHT: f64 = 30.0;
    const MAX_DRAWDOWN_WEIGHT: f64 = -35.0; // Negative weight penalizes drawdown
    const TOTAL_RETURN_WEIGHT: f64 = 15.0;

    // No losing trades means an unbounded profit factor; treat it as the cap.
    let capped_profit_factor = report.profit_factor.unwrap_or(5.0).min(5.0);
    let capped_sharpe = report.sharpe_ratio.min(5.0);
    let capped_return = report.total_return.clamp(-1.0, 5.0);

    (capped_profit_factor * PROFIT_FACTOR_WEIGHT)
        + (capped_sharpe * SHARPE_RATIO_WEIGHT)
        + (report.max_drawdown * MAX_DRAWDOWN_WEIGHT)
        + (capped_return * TOTAL_RETURN_WEIGHT)
}
