use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::ConfigError;

/// Block interval analysis: fetch, reconcile, aggregate.
#[derive(Parser, Debug, Clone)]
#[command(name = "blockgaps", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file; flags below override its values
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Record store (JSON Lines)
    #[arg(long = "store", value_name = "FILE", global = true)]
    pub store: Option<PathBuf>,

    /// Base URL of the block explorer API
    #[arg(long = "api", value_name = "URL", global = true)]
    pub api: Option<String>,

    /// First fetch step, milliseconds since epoch
    #[arg(long = "start-ms", value_name = "MS", global = true)]
    pub start_ms: Option<u64>,

    /// End of the fetch window (exclusive), milliseconds since epoch
    #[arg(long = "end-ms", value_name = "MS", global = true)]
    pub end_ms: Option<u64>,

    /// Attempts per fetch unit
    #[arg(long = "retries", value_name = "COUNT", global = true)]
    pub retries: Option<u32>,

    /// Pause between attempts
    #[arg(long = "retry-delay-ms", value_name = "MS", global = true)]
    pub retry_delay_ms: Option<u64>,

    /// Interval length counted as a long gap
    #[arg(long = "threshold-min", value_name = "MINUTES", global = true)]
    pub threshold_min: Option<f64>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Walk the time window day by day and append every page to the store
    Fetch,
    /// Re-fetch every index missing from the store and rewrite it
    Reconcile,
    /// Print interval statistics for the stored records
    Aggregate {
        /// Also save the report as pretty JSON to FILE
        #[arg(long = "json", value_name = "FILE")]
        json: Option<PathBuf>,
    },
    /// Fetch, reconcile and aggregate in one go
    Run {
        #[arg(long = "json", value_name = "FILE")]
        json: Option<PathBuf>,
    },
}

impl Args {
    /// Resolves the effective configuration: defaults, then the config file,
    /// then command line overrides.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config: Config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        if let Some(api) = &self.api {
            config.api_base_url = api.clone();
        }
        if let Some(start_ms) = self.start_ms {
            config.start_time_ms = start_ms;
        }
        if self.end_ms.is_some() {
            config.end_time_ms = self.end_ms;
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(delay) = self.retry_delay_ms {
            config.retry_delay_ms = delay;
        }
        if let Some(threshold) = self.threshold_min {
            config.long_gap_threshold_min = threshold;
        }
        config.validate()?;
        return Ok(config);
    }
}
