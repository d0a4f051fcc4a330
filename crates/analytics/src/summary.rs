//! Plain-text summaries for people reading the output directory.

use crate::validation::StatisticsReport;
use inst_flow_data::{ExposureReturnPair, InferredTrade};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Renders one security's trades as one block per manager.
#[must_use]
pub fn render_trades_by_manager(security_id: &str, trades: &[InferredTrade]) -> String {
    let mut by_manager: BTreeMap<&str, Vec<&InferredTrade>> = BTreeMap::new();
    for trade in trades.iter().filter(|t| t.security_id == security_id) {
        by_manager.entry(trade.manager_id.as_str()).or_default().push(trade);
    }

    let mut output = String::new();
    let _ = writeln!(
        output,
        "=== {security_id} (position changes per manager; proxy = shares or value in $K) ===\n"
    );

    if by_manager.is_empty() {
        output.push_str("No inferred trades.\n");
        return output;
    }

    for (manager, mut group) in by_manager {
        group.sort_by_key(|t| t.period);

        let heading = format!("MANAGER: {manager}");
        let _ = writeln!(output, "{heading}");
        let _ = writeln!(output, "{}", "-".repeat(heading.len()));
        output.push_str("period | filed_date | action | prev_qty | qty | delta | proxy_source\n");

        for trade in group {
            let filed = trade
                .filed_date
                .map_or_else(|| "-".to_string(), |d| d.to_string());
            let _ = writeln!(
                output,
                "{} | {} | {} | {:.0} | {:.0} | {:+.0} | {}",
                trade.period,
                filed,
                trade.action.as_str(),
                trade.previous_proxy_quantity,
                trade.proxy_quantity,
                trade.delta,
                trade.proxy_source.as_str()
            );
        }
        output.push('\n');
    }

    output
}

/// Renders aligned pairs grouped by security.
#[must_use]
pub fn render_exposure_summary(pairs: &[ExposureReturnPair]) -> String {
    if pairs.is_empty() {
        return "No aligned pairs. Price history may not overlap the disclosure periods.\n".to_string();
    }

    let mut by_security: BTreeMap<&str, Vec<&ExposureReturnPair>> = BTreeMap::new();
    for pair in pairs {
        by_security.entry(pair.security_id.as_str()).or_default().push(pair);
    }

    let mut output = String::new();
    for (security_id, group) in by_security {
        let _ = writeln!(output, "=== {security_id}: Net Exposure vs Next-Period Return ===\n");
        output.push_str("period | next_period | net_exposure | next_return | signal\n");
        let _ = writeln!(output, "{}", "-".repeat(64));

        for pair in group {
            let pct = (pair.forward_return * Decimal::ONE_HUNDRED).round_dp(2);
            let _ = writeln!(
                output,
                "{} | {} | {:>14.0} | {:>8.2}% | {}",
                pair.period,
                pair.next_period,
                pair.net_exposure_change,
                pct,
                pair.signal.as_str()
            );
        }
        output.push_str("\n\n");
    }

    output
}

/// Concatenates the text form of every report.
#[must_use]
pub fn render_statistics(reports: &[StatisticsReport]) -> String {
    reports
        .iter()
        .map(StatisticsReport::to_text)
        .collect::<Vec<_>>()
        .join("\n")
}
