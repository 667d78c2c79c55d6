//! Challenge Specification Schema
//!
//! The YAML document a lab pins to content-addressed storage when posting a
//! challenge. The indexer parses it once per `ChallengeCreated` event and
//! copies its metadata onto the challenge row.
//!
//! # Example
//!
//! ```yaml
//! title: Epigenetic age prediction
//! domain: longevity
//! type: prediction
//! description: Predict chronological age from methylation arrays.
//! dataset:
//!   train: ipfs://QmTrain
//!   test: ipfs://QmTest
//! scoring:
//!   container: ghcr.io/hermes/scorer-rmse:1
//!   metric: rmse
//! reward:
//!   total: 500
//!   distribution: winner_take_all
//! deadline: 2026-12-31T00:00:00Z
//! ```

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, CoreResult};

/// Default dispute window in hours
pub const DEFAULT_DISPUTE_WINDOW_HOURS: u32 = 48;

/// Upper bound on the dispute window
pub const MAX_DISPUTE_WINDOW_HOURS: i64 = 168;

/// Default and maximum submissions per wallet
pub const MAX_SUBMISSIONS_PER_WALLET: u32 = 3;

/// Maximum decimals of a USDC reward
pub const MAX_REWARD_DECIMALS: u32 = 6;

/// Scientific domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Longevity,
    DrugDiscovery,
    ProteinDesign,
    Omics,
    Neuroscience,
    Other,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Longevity => "longevity",
            Domain::DrugDiscovery => "drug_discovery",
            Domain::ProteinDesign => "protein_design",
            Domain::Omics => "omics",
            Domain::Neuroscience => "neuroscience",
            Domain::Other => "other",
        }
    }
}

/// Kind of computational task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    Reproducibility,
    Prediction,
    Docking,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Reproducibility => "reproducibility",
            ChallengeType::Prediction => "prediction",
            ChallengeType::Docking => "docking",
        }
    }
}

/// Metric computed by the scoring container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMetric {
    Rmse,
    Mae,
    R2,
    Pearson,
    Spearman,
    Custom,
}

impl ScoringMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringMetric::Rmse => "rmse",
            ScoringMetric::Mae => "mae",
            ScoringMetric::R2 => "r2",
            ScoringMetric::Pearson => "pearson",
            ScoringMetric::Spearman => "spearman",
            ScoringMetric::Custom => "custom",
        }
    }
}

/// Payout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardDistribution {
    WinnerTakeAll,
    #[serde(rename = "top_3")]
    Top3,
    Proportional,
}

impl RewardDistribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardDistribution::WinnerTakeAll => "winner_take_all",
            RewardDistribution::Top3 => "top_3",
            RewardDistribution::Proportional => "proportional",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub train: String,
    pub test: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringSpec {
    /// OCI image reference of the scorer
    pub container: String,
    pub metric: ScoringMetric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSpec {
    /// Total reward in USDC. Accepts a YAML number or a numeric string.
    #[serde(deserialize_with = "de::decimal")]
    pub total: Decimal,
    pub distribution: RewardDistribution,
}

/// Parsed challenge specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSpec {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub domain: Domain,
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
    pub description: String,
    pub dataset: DatasetSpec,
    pub scoring: ScoringSpec,
    pub reward: RewardSpec,
    /// RFC 3339 timestamp with offset
    pub deadline: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "de::opt_decimal")]
    pub minimum_score: Option<Decimal>,
    #[serde(default)]
    pub dispute_window_hours: Option<i64>,
    #[serde(default)]
    pub max_submissions_per_wallet: Option<i64>,
    #[serde(default)]
    pub lab_tba: Option<String>,
}

impl ChallengeSpec {
    /// Parse and validate a YAML document
    pub fn from_yaml(text: &str) -> CoreResult<Self> {
        let spec: ChallengeSpec = serde_yaml::from_str(text)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Check every schema rule, reporting all violations at once
    pub fn validate(&self) -> CoreResult<()> {
        let mut violations = Vec::new();

        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("scoring.container", &self.scoring.container),
        ] {
            if value.trim().is_empty() {
                violations.push(format!("{field}: must not be empty"));
            }
        }

        for (field, uri) in [("dataset.train", &self.dataset.train), ("dataset.test", &self.dataset.test)] {
            if !is_dataset_uri(uri) {
                violations.push(format!("{field}: must start with ipfs:// or https://"));
            }
        }

        if self.reward.total <= Decimal::ZERO {
            violations.push("reward.total: must be positive".to_string());
        }
        if self.reward.total.normalize().scale() > MAX_REWARD_DECIMALS {
            violations.push(format!(
                "reward.total: at most {MAX_REWARD_DECIMALS} decimal places"
            ));
        }

        if DateTime::parse_from_rfc3339(self.deadline.trim()).is_err() {
            violations.push("deadline: must be an RFC 3339 timestamp with offset".to_string());
        }

        if let Some(hours) = self.dispute_window_hours {
            if !(1..=MAX_DISPUTE_WINDOW_HOURS).contains(&hours) {
                violations.push(format!(
                    "dispute_window_hours: must be between 1 and {MAX_DISPUTE_WINDOW_HOURS}"
                ));
            }
        }

        if let Some(max) = self.max_submissions_per_wallet {
            if !(1..=i64::from(MAX_SUBMISSIONS_PER_WALLET)).contains(&max) {
                violations.push(format!(
                    "max_submissions_per_wallet: must be between 1 and {MAX_SUBMISSIONS_PER_WALLET}"
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::SpecInvalid { violations })
        }
    }

    /// Deadline in UTC
    pub fn deadline_utc(&self) -> CoreResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.deadline.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CoreError::SpecInvalid {
                violations: vec![format!("deadline: {e}")],
            })
    }

    /// Dispute window, defaulting to 48 hours
    pub fn dispute_window_hours(&self) -> u32 {
        self.dispute_window_hours
            .and_then(|h| u32::try_from(h).ok())
            .unwrap_or(DEFAULT_DISPUTE_WINDOW_HOURS)
    }

    /// Per-wallet submission cap, defaulting to 3
    pub fn max_submissions_per_wallet(&self) -> u32 {
        self.max_submissions_per_wallet
            .and_then(|m| u32::try_from(m).ok())
            .unwrap_or(MAX_SUBMISSIONS_PER_WALLET)
    }
}

fn is_dataset_uri(uri: &str) -> bool {
    uri.starts_with("ipfs://") || uri.starts_with("https://")
}

mod de {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Int(i64),
        Float(f64),
        Text(String),
    }

    impl NumberOrText {
        fn into_decimal(self) -> Result<Decimal, String> {
            match self {
                NumberOrText::Int(i) => Ok(Decimal::from(i)),
                // Display prints the shortest round-trip form, so 0.1 stays 0.1
                NumberOrText::Float(f) => {
                    Decimal::from_str(&f.to_string()).map_err(|e| format!("{f}: {e}"))
                }
                NumberOrText::Text(s) => {
                    Decimal::from_str(s.trim()).map_err(|e| format!("{s:?}: {e}"))
                }
            }
        }
    }

    pub fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        NumberOrText::deserialize(deserializer)?
            .into_decimal()
            .map_err(serde::de::Error::custom)
    }

    pub fn opt_decimal<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        Option::<NumberOrText>::deserialize(deserializer)?
            .map(NumberOrText::into_decimal)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
title: Epigenetic age prediction
domain: longevity
type: prediction
description: Predict chronological age from methylation arrays.
dataset:
  train: ipfs://QmTrain
  test: https://data.example.org/test.csv
scoring:
  container: ghcr.io/hermes/scorer-rmse:1
  metric: rmse
reward:
  total: "500.25"
  distribution: top_3
deadline: 2026-12-31T00:00:00Z
minimum_score: 0.8
tags: [aging, methylation]
"#;

    #[test]
    fn test_parse_valid_spec() {
        let spec = ChallengeSpec::from_yaml(VALID).unwrap();
        assert_eq!(spec.domain, Domain::Longevity);
        assert_eq!(spec.challenge_type, ChallengeType::Prediction);
        assert_eq!(spec.reward.total, Decimal::new(50025, 2));
        assert_eq!(spec.reward.distribution, RewardDistribution::Top3);
        assert_eq!(spec.minimum_score, Some(Decimal::new(8, 1)));
        assert_eq!(spec.dispute_window_hours(), 48);
        assert_eq!(spec.max_submissions_per_wallet(), 3);
        assert_eq!(spec.tags.len(), 2);
        assert_eq!(
            spec.deadline_utc().unwrap().to_rfc3339(),
            "2026-12-31T00:00:00+00:00"
        );
    }

    #[test]
    fn test_reward_total_accepts_numbers() {
        let yaml = VALID.replace("total: \"500.25\"", "total: 12.5");
        let spec = ChallengeSpec::from_yaml(&yaml).unwrap();
        assert_eq!(spec.reward.total, Decimal::new(125, 1));
    }

    #[test]
    fn test_reward_precision_limit() {
        let yaml = VALID.replace("total: \"500.25\"", "total: \"1.0000001\"");
        let err = ChallengeSpec::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("reward.total"));
    }

    #[test]
    fn test_collects_all_violations() {
        let yaml = VALID
            .replace("ipfs://QmTrain", "ftp://nope")
            .replace("2026-12-31T00:00:00Z", "\"next tuesday\"")
            .replace("minimum_score: 0.8", "dispute_window_hours: 200");
        match ChallengeSpec::from_yaml(&yaml) {
            Err(CoreError::SpecInvalid { violations }) => {
                assert_eq!(violations.len(), 3);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_deadline_requires_offset() {
        let yaml = VALID.replace("2026-12-31T00:00:00Z", "\"2026-12-31T00:00:00\"");
        assert!(matches!(
            ChallengeSpec::from_yaml(&yaml),
            Err(CoreError::SpecInvalid { .. })
        ));
    }

    #[test]
    fn test_submission_cap() {
        let yaml = format!("{VALID}max_submissions_per_wallet: 4\n");
        assert!(ChallengeSpec::from_yaml(&yaml).is_err());

        let yaml = format!("{VALID}max_submissions_per_wallet: 2\n");
        assert_eq!(
            ChallengeSpec::from_yaml(&yaml).unwrap().max_submissions_per_wallet(),
            2
        );
    }

    #[test]
    fn test_unknown_domain_is_parse_error() {
        let yaml = VALID.replace("domain: longevity", "domain: astrology");
        assert!(matches!(
            ChallengeSpec::from_yaml(&yaml),
            Err(CoreError::SpecParse(_))
        ));
    }

    #[test]
    fn test_missing_required_field() {
        let yaml = VALID.replace("title: Epigenetic age prediction\n", "");
        assert!(matches!(
            ChallengeSpec::from_yaml(&yaml),
            Err(CoreError::SpecParse(_))
        ));
    }
}
