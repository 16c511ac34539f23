pub mod chain {
    pub mod aggregator;
    pub mod client;
    pub mod fetcher;
    pub mod reconciler;
    pub mod record;
    pub mod retry;
    pub mod store;
}
pub mod helpers {
    pub mod args;
    pub mod output;
}
pub mod config;
pub mod constants;
pub mod error;
pub mod pipeline;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use constants::{DAY_MS, GENESIS_TIME_MS, LONG_GAP_THRESHOLD_MIN};
pub use error::Error;
