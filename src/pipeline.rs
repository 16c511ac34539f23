use std::path::Path;

use tracing::info;

use crate::chain::aggregator::{Statistics, aggregate};
use crate::chain::client::{ApiClient, BlockSource};
use crate::chain::fetcher::{FetchSummary, TimeRange, fetch_range};
use crate::chain::reconciler::{ReconcileSummary, reconcile};
use crate::chain::record::Record;
use crate::chain::store::RecordStore;
use crate::config::Config;
use crate::error::Error;
use crate::helpers::output::{print_fetch_summary, print_reconcile_summary, print_statistics, save_json};

/// Builds the HTTP source described by `config`.
pub fn api_client(config: &Config) -> Result<ApiClient, Error> {
    return ApiClient::new(&config.api_base_url, config.request_timeout()).map_err(Error::Client);
}

pub fn run_fetch<S: BlockSource>(source: &S, config: &Config) -> Result<FetchSummary, Error> {
    let store: RecordStore = RecordStore::new(&config.store_path);
    let range: TimeRange = config.time_range();
    info!(store = %store.path().display(), start_ms = range.start_ms, end_ms = range.end_ms, "bulk fetch started");

    let summary: FetchSummary = fetch_range(source, &store, &range, &config.retry_policy())?;
    print_fetch_summary(&summary).map_err(Error::Report)?;
    return Ok(summary);
}

pub fn run_reconcile<S: BlockSource>(source: &S, config: &Config) -> Result<ReconcileSummary, Error> {
    let store: RecordStore = RecordStore::new(&config.store_path);
    info!(store = %store.path().display(), "gap reconciliation started");

    let summary: ReconcileSummary = reconcile(source, &store, &config.retry_policy())?;
    print_reconcile_summary(&summary).map_err(Error::Report)?;
    return Ok(summary);
}

/// Loads the store, computes the interval statistics and reports them,
/// optionally exporting them as JSON.
pub fn run_aggregate(config: &Config, json: Option<&Path>) -> Result<Statistics, Error> {
    let store: RecordStore = RecordStore::new(&config.store_path);
    let records: Vec<Record> = store.load()?;
    info!(store = %store.path().display(), records = records.len(), "aggregation started");

    let stats: Statistics = aggregate(&records, config.long_gap_threshold_min)?;
    print_statistics(&stats).map_err(Error::Report)?;

    if let Some(path) = json {
        save_json(&stats, path).map_err(Error::Report)?;
        info!(path = %path.display(), "report saved");
    }
    return Ok(stats);
}
