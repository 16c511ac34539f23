use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::chain::client::BlockSource;
use crate::chain::record::Record;
use crate::chain::retry::{FetchOutcome, RetryPolicy, retry};
use crate::chain::store::RecordStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Distinct indices present before the pass.
    pub observed: u64,
    /// Gaps found before the pass, ascending.
    pub missing: Vec<u64>,
    /// Records recovered at the index they were requested for.
    pub recovered_records: u64,
    /// Every gap left after the pass, ascending; a later run has to retry them.
    pub still_missing: Vec<u64>,
}

/// Indices in `0..=max(index)` that no record carries, in ascending order.
///
/// An empty input has no expected range and therefore no gaps.
pub fn missing_indices(records: &[Record]) -> Vec<u64> {
    let observed: BTreeSet<u64> = records.iter().map(|r| r.index).collect();
    let max_index: u64 = match observed.last() {
        Some(max) => *max,
        None => return Vec::new(),
    };
    return (0..=max_index).filter(|i| !observed.contains(i)).collect();
}

/// Gap reconciliation stage.
///
/// Loads the whole store, re-fetches every missing index through the "block
/// by height" endpoint, and rewrites the store with old and recovered
/// records together. Every record returned for an index is kept, so
/// alternate-chain blocks sharing it all land in the store.
///
/// # Parameters
/// - `source`: Upstream to request missing indices from.
/// - `store`: Store to read and rewrite. It must already exist.
/// - `policy`: Retry bound and delay applied to every index.
///
/// # Returns
/// A summary listing what was missing and what still is. Fails only on store I/O.
pub fn reconcile<S: BlockSource>(source: &S, store: &RecordStore, policy: &RetryPolicy) -> Result<ReconcileSummary, StoreError> {
    let mut records: Vec<Record> = store.load()?;
    let observed: u64 = records.iter().map(|r| r.index).collect::<BTreeSet<u64>>().len() as u64;
    let missing: Vec<u64> = missing_indices(&records);

    info!(records = records.len(), observed, missing = missing.len(), "reconciling gaps");

    let mut summary: ReconcileSummary = ReconcileSummary {
        observed,
        missing: missing.clone(),
        ..ReconcileSummary::default()
    };

    for index in missing.iter().copied() {
        let unit: String = format!("block-height/{}", index);
        match retry(policy, &unit, |_| source.blocks_at_height(index)) {
            FetchOutcome::Recovered(found) => {
                for block in &found {
                    if block.index == index {
                        debug!(%block, "recovered");
                        summary.recovered_records += 1;
                    } else {
                        warn!(index, %block, "lookup returned a block at another index");
                    }
                }
                records.extend(found);
            }
            FetchOutcome::Exhausted { attempts, last_error } => {
                error!(index, attempts, error = %last_error, "giving up on index");
            }
        }
    }

    // Blocks at unexpected indices can both leave a gap open and widen the range.
    summary.still_missing = missing_indices(&records);

    store.rewrite(&records)?;

    info!(
        recovered = summary.recovered_records,
        still_missing = summary.still_missing.len(),
        "reconciliation finished"
    );
    return Ok(summary);
}
