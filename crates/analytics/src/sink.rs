//! Result sinks: where a pipeline run's records go.

use crate::validation::StatisticsReport;
use anyhow::{Context, Result};
use async_trait::async_trait;
use inst_flow_data::{CsvStorage, ExposureReturnPair, InferredTrade};
use std::path::{Path, PathBuf};

pub const TRADES_FILE: &str = "trades.csv";
pub const PAIRS_FILE: &str = "exposure_vs_next_q_return.csv";
pub const STATISTICS_FILE: &str = "statistics.json";

/// Consumer of a pipeline run's results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn emit_results(
        &self,
        trades: &[InferredTrade],
        pairs: &[ExposureReturnPair],
        statistics: &[StatisticsReport],
    ) -> Result<()>;
}

/// Writes results as CSV and JSON files into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn emit_results(
        &self,
        trades: &[InferredTrade],
        pairs: &[ExposureReturnPair],
        statistics: &[StatisticsReport],
    ) -> Result<()> {
        self.ensure_dir()?;

        let trades_path = self.dir.join(TRADES_FILE);
        CsvStorage::write_records(&trades_path, trades)?;

        let pairs_path = self.dir.join(PAIRS_FILE);
        CsvStorage::write_records(&pairs_path, pairs)?;

        let stats_path = self.dir.join(STATISTICS_FILE);
        let json = serde_json::to_string_pretty(statistics)?;
        std::fs::write(&stats_path, json)
            .with_context(|| format!("Failed to write {}", stats_path.display()))?;

        tracing::info!(
            "Wrote {} trades, {} pairs and {} reports to {}",
            trades.len(),
            pairs.len(),
            statistics.len(),
            self.dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{ReportScope, StatisticalTest, TestOutcome};
    use chrono::NaiveDate;
    use inst_flow_data::SignalClass;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn file_sink_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("out"));

        let pairs = vec![ExposureReturnPair {
            security_id: "T".to_string(),
            period: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            next_period: NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
            net_exposure_change: dec!(500),
            start_price: dec!(10.00),
            end_price: dec!(11.00),
            forward_return: dec!(0.1),
            signal: SignalClass::Match,
        }];
        let stats = vec![StatisticsReport::generate(
            ReportScope::Pooled,
            &pairs,
            &StatisticalTest::ALL,
            8,
        )];

        sink.emit_results(&[], &pairs, &stats).await.unwrap();

        let out = dir.path().join("out");
        assert!(out.join(TRADES_FILE).exists());

        let csv = std::fs::read_to_string(out.join(PAIRS_FILE)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "security_id,period,next_period,net_exposure_change,start_price,end_price,forward_return,signal"
        );
        assert_eq!(
            lines.next().unwrap(),
            "T,2024-06-30,2024-09-30,500,10.00,11.00,0.1,MATCH"
        );

        let json = std::fs::read_to_string(out.join(STATISTICS_FILE)).unwrap();
        let parsed: Vec<StatisticsReport> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].n_pairs, 1);
    }

    fn pair(period: NaiveDate, exposure: rust_decimal::Decimal, ret: rust_decimal::Decimal) -> ExposureReturnPair {
        ExposureReturnPair {
            security_id: "T".to_string(),
            period,
            next_period: period,
            net_exposure_change: exposure,
            start_price: dec!(10),
            end_price: dec!(10),
            forward_return: ret,
            signal: SignalClass::classify(exposure, ret),
        }
    }

    #[tokio::test]
    async fn statistics_with_perfect_rank_fit_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());

        // Monotone but not linear: Spearman is exactly 1, Pearson is not.
        let pairs = vec![
            pair(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), dec!(-100), dec!(-0.005)),
            pair(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(), dec!(20), dec!(0.001)),
            pair(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(), dec!(300), dec!(0.0012)),
        ];
        let stats = vec![StatisticsReport::generate(
            ReportScope::Security("T".to_string()),
            &pairs,
            &StatisticalTest::ALL,
            3,
        )];
        let spearman = stats[0].spearman.as_ref().and_then(TestOutcome::computed).unwrap();
        assert_eq!(spearman.ic_t_stat, f64::INFINITY);

        sink.emit_results(&[], &pairs, &stats).await.unwrap();

        let json = std::fs::read_to_string(sink.dir().join(STATISTICS_FILE)).unwrap();
        assert!(json.contains("\"ic_t_stat\": \"inf\""), "{json}");

        let parsed: Vec<StatisticsReport> = serde_json::from_str(&json).unwrap();
        let reread = parsed[0].spearman.as_ref().and_then(TestOutcome::computed).unwrap();
        assert_eq!(reread.ic_t_stat, f64::INFINITY);
        assert_eq!(reread.ic_p_value, 0.0);
        assert_eq!(parsed[0].recommendation, stats[0].recommendation);
    }
}
