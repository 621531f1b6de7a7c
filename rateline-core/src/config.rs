//! Session configuration loaded from TOML.
//!
//! Every key is optional; an empty file yields the defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{Timeframe, DEFAULT_LOOKBACK_DAYS};
use crate::session::{FetchMode, SessionOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// What to fetch and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub timeframe: Timeframe,
    pub lookback_days: u32,
    /// RFC 3339, e.g. `2024-01-01T00:00:00Z`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    pub mode: FetchMode,
    /// Name patterns excluded when resolving the universe at fetch time.
    pub exclusions: Vec<String>,
    /// Explicit instruments; empty means "the resolved universe".
    pub symbols: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::default(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            start: None,
            end: None,
            mode: FetchMode::default(),
            exclusions: Vec::new(),
            symbols: Vec::new(),
        }
    }
}

impl SessionConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Session construction parameters carried by this config.
    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            start: self.start,
            lookback_days: self.lookback_days,
            timeframe: self.timeframe,
            end: self.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = SessionConfig::from_toml("").unwrap();
        assert_eq!(cfg, SessionConfig::default());
        assert_eq!(cfg.lookback_days, 250);
        assert_eq!(cfg.timeframe, Timeframe::D1);
        assert_eq!(cfg.mode, FetchMode::FromAnchor);
    }

    #[test]
    fn parses_every_key() {
        let cfg = SessionConfig::from_toml(
            r#"
timeframe = "H4"
lookback_days = 30
start = "2024-01-01T00:00:00Z"
end = "2024-12-31T00:00:00Z"
mode = "range"
exclusions = ["USD", "EUR"]
symbols = ["EURUSD", "GBPUSD"]
"#,
        )
        .unwrap();

        assert_eq!(cfg.timeframe, Timeframe::H4);
        assert_eq!(cfg.lookback_days, 30);
        assert_eq!(cfg.start, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(cfg.end, Some(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()));
        assert_eq!(cfg.mode, FetchMode::Range);
        assert_eq!(cfg.exclusions, vec!["USD", "EUR"]);
        assert_eq!(cfg.symbols, vec!["EURUSD", "GBPUSD"]);

        let opts = cfg.options();
        assert_eq!(opts.timeframe, Timeframe::H4);
        assert_eq!(opts.lookback_days, 30);
        assert_eq!(opts.start, cfg.start);
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let err = SessionConfig::from_toml(r#"mode = "sideways""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = SessionConfig {
            timeframe: Timeframe::M15,
            start: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
            exclusions: vec!["JPY".into()],
            ..Default::default()
        };
        let text = cfg.to_toml().unwrap();
        assert_eq!(SessionConfig::from_toml(&text).unwrap(), cfg);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeframe = \"W1\"\nlookback_days = 10").unwrap();

        let cfg = SessionConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.timeframe, Timeframe::W1);
        assert_eq!(cfg.lookback_days, 10);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = SessionConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
