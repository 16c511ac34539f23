use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::chain::fetcher::TimeRange;
use crate::chain::retry::RetryPolicy;
use crate::constants::{
    DAY_MS, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_STORE_PATH, GENESIS_TIME_MS, LONG_GAP_THRESHOLD_MIN,
};
use crate::error::ConfigError;

/// Run configuration. Every field has a default, so a TOML file only needs
/// the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_base_url: String,
    pub store_path: PathBuf,
    pub start_time_ms: u64,
    /// Exclusive end of the fetch window. `None` means "now".
    pub end_time_ms: Option<u64>,
    pub step_ms: u64,
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub long_gap_threshold_min: f64,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            start_time_ms: GENESIS_TIME_MS,
            end_time_ms: None,
            step_ms: DAY_MS,
            retries: DEFAULT_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            long_gap_threshold_min: LONG_GAP_THRESHOLD_MIN,
        };
    }
}

impl Config {
    /// Reads a TOML config file on top of the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text: String = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        return Self::from_toml(&text);
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        return Ok(config);
    }

    /// Rejects settings under which a stage cannot make progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid(String::from("api_base_url must not be empty")));
        }
        if self.step_ms == 0 {
            return Err(ConfigError::Invalid(String::from("step_ms must be positive")));
        }
        if self.retries == 0 {
            return Err(ConfigError::Invalid(String::from("retries must be at least 1")));
        }
        if self.long_gap_threshold_min <= 0.0 || !self.long_gap_threshold_min.is_finite() {
            return Err(ConfigError::Invalid(String::from("long_gap_threshold_min must be a positive number")));
        }
        if let Some(end) = self.end_time_ms {
            if end <= self.start_time_ms {
                return Err(ConfigError::Invalid(format!(
                    "end_time_ms ({}) must be after start_time_ms ({})",
                    end, self.start_time_ms
                )));
            }
        }
        return Ok(());
    }

    /// The fetch window, resolving an open end to the current time.
    pub fn time_range(&self) -> TimeRange {
        let end_ms: u64 = self.end_time_ms.unwrap_or_else(|| Utc::now().timestamp_millis().max(0) as u64);
        return TimeRange {
            start_ms: self.start_time_ms,
            end_ms,
            step_ms: self.step_ms,
        };
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        return RetryPolicy::new(self.retries, Duration::from_millis(self.retry_delay_ms));
    }

    pub fn request_timeout(&self) -> Duration {
        return Duration::from_millis(self.request_timeout_ms);
    }
}
