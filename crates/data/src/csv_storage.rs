use crate::models::{PriceObservation, RawHolding};
use anyhow::{Context, Result};
use csv::{Reader, Writer};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

pub struct CsvStorage;

impl CsvStorage {
    /// Reads holding rows.
    ///
    /// Format: filing_id,manager_id,security_id,period,filed_at,shares,value_thousands
    ///
    /// Empty `filed_at`, `shares` and `value_thousands` fields read as absent.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row is malformed
    pub fn read_holdings(path: impl AsRef<Path>) -> Result<Vec<RawHolding>> {
        let path = path.as_ref();
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open holdings CSV: {}", path.display()))?;

        let mut rows = Vec::new();
        for (line, result) in reader.deserialize::<RawHolding>().enumerate() {
            let row = result.with_context(|| {
                format!("Malformed holding on data row {} of {}", line + 1, path.display())
            })?;
            rows.push(row);
        }

        tracing::debug!("Read {} holding rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Reads end-of-day closes.
    ///
    /// Format: security_id,trading_date,close_price
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row is malformed
    pub fn read_prices(path: impl AsRef<Path>) -> Result<Vec<PriceObservation>> {
        let path = path.as_ref();
        let mut reader = Reader::from_path(path)
            .with_context(|| format!("Failed to open prices CSV: {}", path.display()))?;

        let mut rows = Vec::new();
        for (line, result) in reader.deserialize::<PriceObservation>().enumerate() {
            let mut row = result.with_context(|| {
                format!("Malformed price on data row {} of {}", line + 1, path.display())
            })?;
            row.security_id = row.security_id.trim().to_uppercase();
            rows.push(row);
        }

        // Chronological order so that later rows for the same day win on upsert
        rows.sort_by(|a, b| {
            (&a.security_id, a.trading_date).cmp(&(&b.security_id, b.trading_date))
        });

        tracing::debug!("Read {} price rows from {}", rows.len(), path.display());
        Ok(rows)
    }

    /// Writes serializable records with a header row taken from the field names.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_records<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        for record in records {
            writer.serialize(record)?;
        }

        writer.flush()?;
        Ok(())
    }
}
