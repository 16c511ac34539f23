use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single upstream request. Always transient: callers retry it
/// and, once the retry budget is spent, skip the unit of work.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Status code for log lines, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        return match self {
            FetchError::Status(code) => Some(*code),
            FetchError::Http(err) => err.status().map(|s| s.as_u16()),
            FetchError::Decode(_) => None,
        };
    }
}

/// Record store failures. These abort the running stage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access record store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt page at {path}:{line}: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode page: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Degenerate input for the aggregator ("insufficient data").
#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("insufficient data: {0} record(s), at least 2 are required")]
    InsufficientRecords(usize),
    #[error("insufficient data: block interval series has zero variance")]
    ZeroVariance,
    #[error("insufficient data: no interval reached {threshold} minutes")]
    NoLongGaps { threshold: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("cannot write report: {0}")]
    Report(#[source] io::Error),
}
