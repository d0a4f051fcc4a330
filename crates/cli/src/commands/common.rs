//! Argument groups and loading shared by the commands.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use inst_flow_core::config_loader::DEFAULT_CONFIG_PATH;
use inst_flow_core::{AppConfig, ConfigLoader};
use inst_flow_data::{
    CsvStorage, DisclosureObservation, HoldingsSource, HoldingsStore, IngestStats, PriceStore,
};
use std::path::{Path, PathBuf};

/// Config and holdings arguments common to every command.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Holdings CSV (overrides data.holdings_path)
    #[arg(long)]
    pub holdings: Option<String>,

    /// Comma-separated tickers (overrides universe.tickers)
    #[arg(long, value_delimiter = ',')]
    pub tickers: Option<Vec<String>>,
}

impl InputArgs {
    /// Loads the config file and applies the flags on top.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be parsed.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = ConfigLoader::load_from(&self.config)
            .with_context(|| format!("Failed to load config from {}", self.config))?;

        if let Some(holdings) = &self.holdings {
            config.data.holdings_path.clone_from(holdings);
        }
        if let Some(tickers) = &self.tickers {
            config.universe.tickers.clone_from(tickers);
        }
        config.universe.tickers = config.universe.normalized_tickers();

        tracing::info!(
            "Universe: {}",
            if config.universe.tickers.is_empty() {
                "all securities".to_string()
            } else {
                config.universe.tickers.join(", ")
            }
        );
        Ok(config)
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!(
                "Unknown format: '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}

/// Reads the holdings CSV into a deduplicated store.
///
/// # Errors
/// Returns an error if the CSV cannot be read.
pub fn load_holdings(path: impl AsRef<Path>) -> Result<(HoldingsStore, IngestStats)> {
    let rows = CsvStorage::read_holdings(path)?;
    let mut store = HoldingsStore::new();
    let stats = store.ingest(rows);
    Ok((store, stats))
}

/// Reads the holdings CSV and returns its observations.
///
/// # Errors
/// Returns an error if the CSV cannot be read.
pub async fn load_observations(path: impl AsRef<Path>) -> Result<Vec<DisclosureObservation>> {
    let (store, _) = load_holdings(path)?;
    store.fetch_disclosure_observations().await
}

/// Reads the price CSV into an as-of price store.
///
/// # Errors
/// Returns an error if the CSV cannot be read.
pub fn load_prices(path: impl AsRef<Path>, max_staleness_days: Option<i64>) -> Result<PriceStore> {
    let rows = CsvStorage::read_prices(path)?;
    let received = rows.len();
    let mut store = PriceStore::new().with_max_staleness_days(max_staleness_days);
    let stored = store.extend(rows);
    tracing::info!("Loaded {} of {} price rows", stored, received);
    Ok(store)
}

/// Writes a text file into `dir`, creating the directory if needed.
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn write_text(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved {}", path.display());
    Ok(path)
}
