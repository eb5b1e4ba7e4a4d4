// In app/src/render.rs

use analytics::PerformanceReport;
use backtester::BacktestOutcome;

use crate::analyzer::RankedReport;

/// Prints the metrics panel and the trade history of a single run.
pub fn print_outcome(outcome: &BacktestOutcome) {
    let strategy = &outcome.config.strategy;
    println!(
        "\n{} | SMA {}/{} | fill: {}",
        outcome.pair, strategy.short_window, strategy.long_window, outcome.config.backtest.fill_policy
    );
    if let (Some(first), Some(last)) = (outcome.chart.first(), outcome.chart.last()) {
        println!("{} bars, {} -> {}", outcome.chart.len(), first.timestamp, last.timestamp);
    }
    print_report(&outcome.report);
    print_trades(outcome);
    for warning in &outcome.warnings {
        println!("Warning: {}", warning);
    }
}

fn print_report(report: &PerformanceReport) {
    println!("\n--- Backtest Performance Report ---");
    println!("-----------------------------------");
    println!("Starting Capital:      ${:.2}", report.starting_capital);
    println!("Final Equity:          ${:.2}", report.final_equity);
    println!("Total Return:          {:.2}%", report.total_return * 100.0);
    println!("Net P&L:               ${:.2}", report.net_pnl_absolute);
    println!("Max Drawdown:          {:.2}% (${:.2})", report.max_drawdown * 100.0, report.max_drawdown_absolute);
    match report.win_rate {
        Some(rate) => println!("Win Rate:              {:.2}%", rate * 100.0),
        None => println!("Win Rate:              no trades"),
    }
    println!("Total Trades:          {} ({} forced close)", report.total_trades, report.forced_closes);
    println!("-----------------------------------");
    match report.profit_factor {
        Some(pf) => println!("Profit Factor:         {:.2}", pf),
        None => println!("Profit Factor:         n/a"),
    }
    println!("Sharpe Ratio:          {:.3}", report.sharpe_ratio);
    if let Some(expectancy) = report.expectancy {
        println!("Expectancy:            ${:.2}", expectancy);
    }
    if let Some(secs) = report.avg_trade_duration_secs {
        println!("Avg. Trade Duration:   {:.1}h", secs / 3600.0);
    }
    println!("Max Drawdown Duration: {}h", report.drawdown_duration_secs / 3600);
    println!("-----------------------------------");
}

fn print_trades(outcome: &BacktestOutcome) {
    if outcome.trades.is_empty() {
        return;
    }
    println!("\n--- Trade History ---");
    println!(
        "{:<25} {:>14} {:<25} {:>14} {:>12}",
        "Entry", "Entry Price", "Exit", "Exit Price", "P&L"
    );
    for trade in &outcome.trades {
        println!(
            "{:<25} {:>14.2} {:<25} {:>14.2} {:>12.2}{}",
            trade.entry_time.format("%Y-%m-%d %H:%M").to_string(),
            trade.entry_price,
            trade.exit_time.format("%Y-%m-%d %H:%M").to_string(),
            trade.exit_price,
            trade.pnl,
            if trade.forced_close { " (forced)" } else { "" }
        );
    }
}

/// Helper function to print the final optimization summary.
pub fn print_optimization_report(results: &[RankedReport], top: usize) {
    println!("\n--- Optimization Job Complete ---");
    println!("---------------------------------");
    println!("Top {} Parameter Sets by Score:", top);
    println!("---------------------------------");

    for (i, ranked) in results.iter().take(top).enumerate() {
        let report = &ranked.report;
        println!(
            "\n[Rank {} | Score: {:.2}] SMA {}/{}",
            i + 1,
            ranked.score,
            ranked.parameters.short_window,
            ranked.parameters.long_window
        );
        println!(
            "  - Return: {:.2}% | Max Drawdown: {:.2}% | Sharpe: {:.2} | Trades: {}",
            report.total_return * 100.0,
            report.max_drawdown * 100.0,
            report.sharpe_ratio,
            report.total_trades
        );
    }
    println!("\n---------------------------------");

    match results.first() {
        Some(best) => println!(
            "Recommendation: short_window = {}, long_window = {}",
            best.parameters.short_window, best.parameters.long_window
        ),
        None => println!("Recommendation: No parameter sets passed the minimum threshold."),
    }
}
