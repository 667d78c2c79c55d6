//! Structured Logging
//!
//! JSON output for production, pretty-printed output for development.
//! `RUST_LOG` overrides the configured filter when set.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{IndexerError, IndexerResult};

/// Log format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty-printed for development
    #[default]
    Pretty,
    /// JSON for production
    Json,
    /// Compact single-line
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = IndexerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(IndexerError::config(format!("unknown log format: {other}"))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Level applied to the hermes crates (e.g. "info", "debug")
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file/line
    pub include_source: bool,
    /// Full filter directive, overrides `level`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_source: false,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Filter directive handed to `EnvFilter`
    pub fn directive(&self) -> String {
        match &self.filter {
            Some(filter) => filter.clone(),
            None => ["hermes_indexer", "hermes_chain", "hermes_store", "hermes_core"]
                .iter()
                .map(|target| format!("{target}={}", self.level))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Install the global subscriber
pub fn init_logging(config: &LogConfig) -> IndexerResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.directive())
            .map_err(|e| IndexerError::Logging(format!("invalid filter: {e}")))?,
    };

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_file(config.include_source)
                    .with_line_number(config.include_source),
            )
            .try_init(),
    };

    result.map_err(|e| IndexerError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_from_level() {
        let config = LogConfig::default().with_level("debug");
        let directive = config.directive();
        assert!(directive.contains("hermes_indexer=debug"));
        assert!(directive.contains("hermes_store=debug"));
    }

    #[test]
    fn test_filter_overrides_level() {
        let config = LogConfig {
            filter: Some("hermes_chain=trace,warn".to_string()),
            ..LogConfig::default()
        };
        assert_eq!(config.directive(), "hermes_chain=trace,warn");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
