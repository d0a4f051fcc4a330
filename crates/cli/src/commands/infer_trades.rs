//! Infer trades CLI command.
//!
//! Derives per-manager buys, sells and holds from successive disclosures
//! and writes them as CSV plus one readable text file per ticker.

use super::common::{load_observations, write_text, InputArgs, OutputFormat};
use anyhow::Result;
use clap::Args;
use inst_flow_analytics::{infer_trades, render_trades_by_manager, select_observations};
use inst_flow_data::{CsvStorage, InferredTrade, TradeAction};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Arguments for the infer-trades command.
#[derive(Args, Debug, Clone)]
pub struct InferTradesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output directory (overrides output.dir)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Trade counts for one security.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TradeCounts {
    pub managers: usize,
    pub buys: usize,
    pub sells: usize,
    pub holds: usize,
}

/// Counts trades per security, in ticker order.
pub fn count_trades(trades: &[InferredTrade]) -> BTreeMap<String, TradeCounts> {
    let mut counts: BTreeMap<String, TradeCounts> = BTreeMap::new();
    let mut managers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for trade in trades {
        let entry = counts.entry(trade.security_id.clone()).or_default();
        match trade.action {
            TradeAction::Buy => entry.buys += 1,
            TradeAction::Sell => entry.sells += 1,
            TradeAction::Hold => entry.holds += 1,
        }
        managers
            .entry(trade.security_id.as_str())
            .or_default()
            .push(trade.manager_id.as_str());
    }

    for (security_id, mut list) in managers {
        list.sort_unstable();
        list.dedup();
        if let Some(entry) = counts.get_mut(security_id) {
            entry.managers = list.len();
        }
    }

    counts
}

/// Runs the infer-trades command.
///
/// # Errors
/// Returns an error if inputs cannot be read or outputs cannot be written.
pub async fn run_infer_trades(args: InferTradesArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let config = args.input.load_config()?;
    let output_dir = PathBuf::from(args.output_dir.unwrap_or_else(|| config.output.dir.clone()));

    let observations = load_observations(&config.data.holdings_path).await?;
    let selected = select_observations(&observations, &config.universe, &config.analysis);
    let inference = infer_trades(&selected);

    std::fs::create_dir_all(&output_dir)?;
    CsvStorage::write_records(output_dir.join("trades.csv"), &inference.trades)?;

    let counts = count_trades(&inference.trades);
    let tickers: Vec<String> = if config.universe.tickers.is_empty() {
        counts.keys().cloned().collect()
    } else {
        config.universe.tickers.clone()
    };
    for ticker in &tickers {
        let text = render_trades_by_manager(ticker, &inference.trades);
        write_text(&output_dir, &format!("{ticker}_trades.txt"), &text)?;
    }

    for group in &inference.flagged {
        tracing::warn!(
            "Skipped {}/{}: {}",
            group.manager_id,
            group.security_id,
            group.reason
        );
    }

    match format {
        OutputFormat::Text => {
            println!();
            println!(
                "{:<10} {:>10} {:>8} {:>8} {:>8}",
                "Ticker", "Managers", "Buys", "Sells", "Holds"
            );
            println!("{}", "-".repeat(48));
            for (ticker, c) in &counts {
                println!(
                    "{:<10} {:>10} {:>8} {:>8} {:>8}",
                    ticker, c.managers, c.buys, c.sells, c.holds
                );
            }
            println!();
            println!(
                "{} trades written to {}",
                inference.trades.len(),
                output_dir.display()
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "counts": counts,
                "trades": inference.trades,
                "flagged_groups": inference.flagged,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
