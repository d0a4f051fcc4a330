use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub universe: UniverseConfig,
    pub analysis: AnalysisConfig,
    pub data: DataConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Rejects settings the pipeline cannot run with.
    ///
    /// # Errors
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.analysis.validate()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// Securities to analyze. Empty means every security present in the holdings data.
    pub tickers: Vec<String>,
}

impl UniverseConfig {
    /// Returns the ticker list upper-cased, trimmed and without empties.
    #[must_use]
    pub fn normalized_tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self
            .tickers
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        tickers.sort();
        tickers.dedup();
        tickers
    }

    /// Returns true if the security belongs to the configured universe.
    #[must_use]
    pub fn contains(&self, security_id: &str) -> bool {
        self.tickers.is_empty()
            || self
                .tickers
                .iter()
                .any(|t| t.trim().eq_ignore_ascii_case(security_id))
    }
}

/// How the alignment engine treats a missing disclosure quarter between two periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Pair each period with the next period that has data, whatever the distance.
    #[default]
    Adjacent,
    /// Pair only when the next period is exactly the following calendar quarter end.
    ConsecutiveQuarters,
}

impl std::str::FromStr for GapPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "adjacent" | "skip" => Ok(Self::Adjacent),
            "consecutive_quarters" | "consecutive" | "strict" => Ok(Self::ConsecutiveQuarters),
            _ => Err(anyhow::anyhow!(
                "Invalid gap policy: '{}'. Valid values: adjacent, consecutive-quarters",
                s
            )),
        }
    }
}

impl std::fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Adjacent => write!(f, "adjacent"),
            Self::ConsecutiveQuarters => write!(f, "consecutive-quarters"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Only periods within this many days of `as_of` are analyzed.
    pub lookback_days: Option<i64>,
    /// Anchor for the lookback window. Defaults to the latest period in the data.
    pub as_of: Option<NaiveDate>,
    pub gap_policy: GapPolicy,
    /// Oldest acceptable close, in days before a reference date, for an as-of price lookup.
    pub max_price_staleness_days: Option<i64>,
    /// Pairs required before a report can recommend the signal.
    pub min_samples: usize,
}

impl AnalysisConfig {
    /// Checks that the day counts are non-negative and representable as a duration.
    ///
    /// # Errors
    /// Returns an error naming the offending setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_days("analysis.lookback_days", self.lookback_days)?;
        check_days("analysis.max_price_staleness_days", self.max_price_staleness_days)
    }
}

fn check_days(name: &str, days: Option<i64>) -> anyhow::Result<()> {
    match days {
        Some(d) if d < 0 => anyhow::bail!("{name} must not be negative, got {d}"),
        Some(d) if Duration::try_days(d).is_none() => {
            anyhow::bail!("{name} is out of range, got {d}")
        }
        _ => Ok(()),
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_days: None,
            as_of: None,
            gap_policy: GapPolicy::Adjacent,
            max_price_staleness_days: Some(10),
            min_samples: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub holdings_path: String,
    pub prices_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            holdings_path: "data/holdings.csv".to_string(),
            prices_path: "data/prices_eod.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
        }
    }
}
