//! Run configuration and JSON config file support.
//!
//! A [`Config`] captures the serializable options of a send run: the raw
//! message, pacing interval, repeat count, split rule, indexing and verbosity
//! flags. Hooks and locator strategy sets are code, not data, and live on the
//! sender builder instead.
//!
//! Durations are written in a human-friendly format: `"500ms"`, `"2s"`,
//! `"1m"`, or a bare integer meaning milliseconds.

use crate::error::{CmsError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// How a raw message is divided into fragments before sending.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitRule {
    /// Send the message as-is, in a single fragment.
    #[default]
    Disabled,
    /// Split on newlines; fragments are trimmed and empty ones dropped.
    Newline,
    /// Split on a literal delimiter string; fragments are trimmed and empty
    /// ones dropped.
    Delimiter(String),
}

/// Serializable options for a send run.
///
/// # Example
///
/// ```json
/// {
///   "message": "first line\nsecond line",
///   "interval": "2s",
///   "repeat_count": 3,
///   "show_index": true,
///   "split_rule": "newline",
///   "verbose": true
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Raw text to send.
    pub message: String,

    /// Pacing delay between consecutive send attempts.
    #[serde(default = "default_interval", with = "duration_format")]
    pub interval: Duration,

    /// Number of times the full batch is resent. Clamped to at least 1 when a
    /// run is built.
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,

    /// Prefix each fragment with a 1-based ordinal ("1. ", "2. ", ...).
    #[serde(default)]
    pub show_index: bool,

    /// Message splitting rule.
    #[serde(default)]
    pub split_rule: SplitRule,

    /// Emit a diagnostic line per successful send.
    #[serde(default)]
    pub verbose: bool,
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_repeat_count() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            message: String::new(),
            interval: default_interval(),
            repeat_count: default_repeat_count(),
            show_index: false,
            split_rule: SplitRule::Disabled,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| CmsError::config_load(path, e.to_string()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CmsError::config_load(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CmsError::config_save(path, e.to_string()))?;
        fs::write(path, content).map_err(|e| CmsError::config_save(path, e.to_string()))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if let SplitRule::Delimiter(d) = &self.split_rule {
            if d.is_empty() {
                return Err(CmsError::config_validation(
                    "split delimiter cannot be empty",
                ));
            }
        }
        Ok(())
    }

    /// Return a copy with out-of-range values clamped: `repeat_count` is
    /// raised to at least 1.
    pub fn normalized(mut self) -> Self {
        self.repeat_count = self.repeat_count.max(1);
        self
    }
}

/// Parse a duration string: `"500ms"`, `"2s"`, `"1m"`, or a bare integer
/// meaning milliseconds. Case-insensitive, surrounding whitespace ignored,
/// negative values rejected.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(CmsError::invalid_duration(value, "empty duration string"));
    }

    let (amount, multiplier_ms) = if let Some(n) = trimmed.strip_suffix("ms") {
        (n, 1u64)
    } else if let Some(n) = trimmed.strip_suffix('s') {
        (n, 1000)
    } else if let Some(n) = trimmed.strip_suffix('m') {
        (n, 60_000)
    } else {
        (trimmed.as_str(), 1)
    };

    let amount: u64 = amount.trim().parse().map_err(|_| {
        CmsError::invalid_duration(value, "expected a non-negative integer amount")
    })?;

    Ok(Duration::from_millis(amount * multiplier_ms))
}

/// Format a duration in the same grammar `parse_duration` accepts.
pub fn format_duration(duration: &Duration) -> String {
    let ms = duration.as_millis();
    if ms > 0 && ms % 60_000 == 0 {
        format!("{}m", ms / 60_000)
    } else if ms > 0 && ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}

mod duration_format {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_duration(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("250").unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_format_duration_roundtrip() {
        for d in [
            Duration::from_millis(0),
            Duration::from_millis(100),
            Duration::from_secs(2),
            Duration::from_secs(90),
            Duration::from_secs(120),
        ] {
            assert_eq!(parse_duration(&format_duration(&d)).unwrap(), d);
        }
    }

    #[test]
    fn test_split_rule_json_forms() {
        let config: Config = serde_json::from_str(
            r#"{"message": "a", "split_rule": "newline"}"#,
        )
        .unwrap();
        assert_eq!(config.split_rule, SplitRule::Newline);

        let config: Config = serde_json::from_str(
            r#"{"message": "a", "split_rule": {"delimiter": ";"}}"#,
        )
        .unwrap();
        assert_eq!(config.split_rule, SplitRule::Delimiter(";".to_string()));
    }

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.repeat_count, 1);
        assert!(!config.show_index);
        assert_eq!(config.split_rule, SplitRule::Disabled);
        assert!(!config.verbose);
    }

    #[test]
    fn test_validate_empty_delimiter() {
        let config = Config {
            message: "a;b".to_string(),
            split_rule: SplitRule::Delimiter(String::new()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalized_clamps_repeat_count() {
        let config = Config {
            repeat_count: 0,
            ..Config::default()
        };
        assert_eq!(config.normalized().repeat_count, 1);
    }
}
