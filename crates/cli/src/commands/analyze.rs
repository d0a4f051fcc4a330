//! Analyze CLI command.
//!
//! Runs the full pipeline: trade inference, exposure aggregation, alignment
//! with next-period returns and the statistical test suite. Writes the
//! records through the file sink plus readable text summaries.

use super::common::{load_observations, load_prices, write_text, InputArgs, OutputFormat};
use anyhow::{anyhow, Result};
use clap::Args;
use inst_flow_analytics::{
    render_exposure_summary, render_statistics, render_trades_by_manager, run_pipeline_with_tests,
    FileSink, Recommendation, ReportScope, ResultSink, StatisticalTest, StatisticsReport,
};
use inst_flow_core::GapPolicy;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Arguments for the analyze command.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// End-of-day prices CSV (overrides data.prices_path)
    #[arg(long)]
    pub prices: Option<String>,

    /// Gap policy: adjacent, consecutive-quarters (overrides analysis.gap_policy)
    #[arg(long)]
    pub gap_policy: Option<String>,

    /// Minimum aligned pairs before a recommendation (overrides analysis.min_samples)
    #[arg(long)]
    pub min_samples: Option<usize>,

    /// Comma-separated tests to run: pearson, spearman, regression, directional (default: all)
    #[arg(long, default_value = "all")]
    pub tests: String,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Output directory (overrides output.dir)
    #[arg(long)]
    pub output_dir: Option<String>,
}

/// Parses the `--tests` list.
pub fn parse_tests(s: &str) -> Result<Vec<StatisticalTest>> {
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok(StatisticalTest::ALL.to_vec());
    }

    let mut tests = s
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| StatisticalTest::from_str(t).map_err(|e| anyhow!(e)))
        .collect::<Result<Vec<_>>>()?;
    tests.sort();
    tests.dedup();

    if tests.is_empty() {
        return Err(anyhow!("No statistical tests selected"));
    }
    Ok(tests)
}

/// Recommendation counts across per-security reports.
#[derive(Debug, Default)]
pub struct StatisticsSummary {
    pub total_securities: usize,
    pub approved: usize,
    pub conditional: usize,
    pub needs_data: usize,
    pub rejected: usize,
    /// Pooled verdict, if a pooled report was present
    pub pooled: Option<Recommendation>,
    pub by_recommendation: HashMap<Recommendation, Vec<String>>,
}

impl StatisticsSummary {
    /// Builds the summary from pipeline reports.
    pub fn from_reports(reports: &[StatisticsReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match &report.scope {
                ReportScope::Pooled => summary.pooled = Some(report.recommendation),
                ReportScope::Security(ticker) => summary.add(ticker, report.recommendation),
            }
        }
        summary
    }

    /// Adds a security's result to the summary.
    pub fn add(&mut self, security_id: &str, recommendation: Recommendation) {
        self.total_securities += 1;

        match recommendation {
            Recommendation::Approved => self.approved += 1,
            Recommendation::ConditionalApproval => self.conditional += 1,
            Recommendation::NeedsMoreData => self.needs_data += 1,
            Recommendation::Rejected => self.rejected += 1,
        }

        self.by_recommendation
            .entry(recommendation)
            .or_default()
            .push(security_id.to_string());
    }

    /// Formats a text summary.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("=== FLOW SIGNAL SUMMARY ===\n");
        output.push_str(&format!("Securities tested:       {:>6}\n", self.total_securities));
        output.push_str(&format!("APPROVED (p < 0.05):     {:>6}\n", self.approved));
        output.push_str(&format!("CONDITIONAL (p < 0.10):  {:>6}\n", self.conditional));
        output.push_str(&format!("NEEDS MORE DATA:         {:>6}\n", self.needs_data));
        output.push_str(&format!("REJECTED:                {:>6}\n", self.rejected));
        if let Some(pooled) = self.pooled {
            output.push_str(&format!("Pooled: {:?} - {}\n", pooled, pooled.description()));
        }

        for (label, recommendation) in [
            ("APPROVED", Recommendation::Approved),
            ("CONDITIONAL", Recommendation::ConditionalApproval),
            ("NEEDS DATA", Recommendation::NeedsMoreData),
            ("REJECTED", Recommendation::Rejected),
        ] {
            if let Some(tickers) = self.by_recommendation.get(&recommendation) {
                output.push_str(&format!("  {}: {}\n", label, tickers.join(", ")));
            }
        }

        output
    }
}

/// Runs the analyze command.
///
/// # Errors
/// Returns an error if inputs cannot be read, an option is invalid, or
/// outputs cannot be written.
pub async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let tests = parse_tests(&args.tests)?;

    let mut config = args.input.load_config()?;
    if let Some(prices) = &args.prices {
        config.data.prices_path.clone_from(prices);
    }
    if let Some(policy) = &args.gap_policy {
        config.analysis.gap_policy = GapPolicy::from_str(policy)?;
    }
    if let Some(min_samples) = args.min_samples {
        config.analysis.min_samples = min_samples;
    }
    let output_dir = PathBuf::from(args.output_dir.unwrap_or_else(|| config.output.dir.clone()));

    tracing::info!(
        "Gap policy: {}, min samples: {}, tests: {:?}",
        config.analysis.gap_policy,
        config.analysis.min_samples,
        tests
    );

    let observations = load_observations(&config.data.holdings_path).await?;
    let prices = load_prices(
        &config.data.prices_path,
        config.analysis.max_price_staleness_days,
    )?;

    let output = run_pipeline_with_tests(&observations, &prices, &config, &tests);

    let sink = FileSink::new(&output_dir);
    sink.emit_results(&output.trades, &output.pairs, &output.statistics)
        .await?;

    let mut tickers: Vec<&str> = output.trades.iter().map(|t| t.security_id.as_str()).collect();
    tickers.dedup();
    for ticker in tickers {
        let text = render_trades_by_manager(ticker, &output.trades);
        write_text(&output_dir, &format!("{ticker}_trades.txt"), &text)?;
    }
    write_text(
        &output_dir,
        "exposure_summary.txt",
        &render_exposure_summary(&output.pairs),
    )?;
    write_text(
        &output_dir,
        "stats_summary.txt",
        &render_statistics(&output.statistics),
    )?;

    let summary = StatisticsSummary::from_reports(&output.statistics);

    match format {
        OutputFormat::Text => {
            println!("{}", render_statistics(&output.statistics));
            println!("Alignment: {}", output.alignment.summary());
            println!("{}", summary.to_text());
            println!("Results written to {}", sink.dir().display());
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "statistics": output.statistics,
                "alignment": output.alignment,
                "flagged_groups": output.flagged_groups,
                "summary": {
                    "securities": summary.total_securities,
                    "approved": summary.approved,
                    "conditional": summary.conditional,
                    "needs_data": summary.needs_data,
                    "rejected": summary.rejected,
                    "pooled": summary.pooled,
                }
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    match summary.pooled {
        Some(r) if r.is_usable() => tracing::info!("Analysis complete: pooled flow signal is usable"),
        Some(Recommendation::NeedsMoreData) | None => {
            tracing::info!("Analysis complete: need more aligned quarters")
        }
        Some(_) => tracing::warn!("Analysis complete: no significant flow/return relationship"),
    }

    Ok(())
}
