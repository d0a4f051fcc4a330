//! Data status CLI command.
//!
//! Shows, per ticker, the disclosure periods held and the price history
//! available. Used to check that price coverage spans the holdings periods
//! before running an analysis.

use super::common::{load_holdings, load_prices, InputArgs};
use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use inst_flow_core::UniverseConfig;
use inst_flow_data::{HoldingsStore, PriceCoverage, PriceStore};
use std::collections::BTreeSet;
use std::path::Path;

/// Arguments for the data-status command.
#[derive(Args, Debug, Clone)]
pub struct DataStatusArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// End-of-day prices CSV (overrides data.prices_path)
    #[arg(long)]
    pub prices: Option<String>,
}

/// Holdings and price bounds for a single ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerStatus {
    pub security_id: String,
    pub observations: usize,
    pub managers: usize,
    pub first_period: Option<NaiveDate>,
    pub last_period: Option<NaiveDate>,
    pub price_first: Option<NaiveDate>,
    pub price_last: Option<NaiveDate>,
    pub price_rows: usize,
}

impl TickerStatus {
    fn format_date(date: Option<NaiveDate>) -> String {
        date.map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// True if closes exist from the first disclosure period through the last.
    pub fn prices_cover_holdings(&self) -> bool {
        match (
            self.first_period,
            self.last_period,
            self.price_first,
            self.price_last,
        ) {
            (Some(first), Some(last), Some(price_first), Some(price_last)) => {
                price_first <= first && price_last >= last
            }
            _ => false,
        }
    }
}

/// Builds one status row per ticker.
///
/// With an empty universe every ticker seen in holdings or prices is listed.
pub fn build_status(
    holdings: &HoldingsStore,
    coverage: &[PriceCoverage],
    universe: &UniverseConfig,
) -> Vec<TickerStatus> {
    let tickers: BTreeSet<String> = if universe.tickers.is_empty() {
        holdings
            .securities()
            .into_iter()
            .chain(coverage.iter().map(|c| c.security_id.clone()))
            .collect()
    } else {
        universe.normalized_tickers().into_iter().collect()
    };

    tickers
        .into_iter()
        .map(|security_id| {
            let held: Vec<_> = holdings
                .observations()
                .filter(|o| o.security_id == security_id)
                .collect();
            let managers: BTreeSet<&str> = held.iter().map(|o| o.manager_id.as_str()).collect();
            let periods = holdings.periods_for(&security_id);
            let prices = coverage.iter().find(|c| c.security_id == security_id);

            TickerStatus {
                observations: held.len(),
                managers: managers.len(),
                first_period: periods.first().copied(),
                last_period: periods.last().copied(),
                price_first: prices.map(|c| c.first_date),
                price_last: prices.map(|c| c.last_date),
                price_rows: prices.map_or(0, |c| c.rows),
                security_id,
            }
        })
        .collect()
}

/// Runs the data-status command.
///
/// # Errors
/// Returns an error if the holdings file cannot be read.
pub async fn run_data_status(args: DataStatusArgs) -> Result<()> {
    let mut config = args.input.load_config()?;
    if let Some(prices) = &args.prices {
        config.data.prices_path.clone_from(prices);
    }

    let (holdings, ingest) = load_holdings(&config.data.holdings_path)?;

    let prices = if Path::new(&config.data.prices_path).exists() {
        load_prices(&config.data.prices_path, None)?
    } else {
        tracing::warn!("Price file {} not found", config.data.prices_path);
        PriceStore::new()
    };

    let statuses = build_status(&holdings, &prices.coverage(), &config.universe);

    print_status_report(&statuses, &ingest.summary());
    print_recommendations(&statuses);

    Ok(())
}

fn print_status_report(statuses: &[TickerStatus], ingest_summary: &str) {
    println!();
    println!("{}", "=".repeat(100));
    println!("DATA STATUS REPORT");
    println!("Holdings ingest: {}", ingest_summary);
    println!("{}", "=".repeat(100));
    println!();

    println!(
        "{:<10} {:>8} {:>9} {:>12} {:>12} {:>12} {:>12} {:>10}",
        "Ticker", "Obs", "Managers", "First Q", "Last Q", "Price From", "Price To", "Rows"
    );
    println!("{}", "-".repeat(100));

    for status in statuses {
        println!(
            "{:<10} {:>8} {:>9} {:>12} {:>12} {:>12} {:>12} {:>10}",
            status.security_id,
            status.observations,
            status.managers,
            TickerStatus::format_date(status.first_period),
            TickerStatus::format_date(status.last_period),
            TickerStatus::format_date(status.price_first),
            TickerStatus::format_date(status.price_last),
            status.price_rows
        );
    }

    println!("{}", "=".repeat(100));
    println!();
}

fn print_recommendations(statuses: &[TickerStatus]) {
    println!("ANALYSIS READINESS:");
    println!("{}", "-".repeat(60));

    for status in statuses {
        let note = if status.observations == 0 {
            "no holdings".to_string()
        } else if status.price_rows == 0 {
            "no prices - load end-of-day closes".to_string()
        } else if status.prices_cover_holdings() {
            "ready".to_string()
        } else {
            "price history does not span all disclosure periods".to_string()
        };
        println!("  {:<10}: {}", status.security_id, note);
    }
    println!();
}
