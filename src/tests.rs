use std::collections::BTreeSet;
use std::time::Duration;

use crate::chain::aggregator::{Statistics, aggregate};
use crate::chain::client::BlockSource;
use crate::chain::fetcher::{FetchSummary, TimeRange, fetch_range};
use crate::chain::reconciler::{ReconcileSummary, missing_indices, reconcile};
use crate::chain::record::Record;
use crate::chain::retry::RetryPolicy;
use crate::chain::store::RecordStore;
use crate::error::{FetchError, StatsError};

use tempfile::TempDir;

/// In-memory upstream: one block every ten minutes with a two hour stall
/// after every seventh block. Period lookups for the listed steps always fail.
struct SimulatedChain {
    blocks: Vec<Record>,
    failing_steps: BTreeSet<u64>,
}

impl SimulatedChain {
    fn new(count: u64, failing_steps: &[u64]) -> Self {
        let mut blocks: Vec<Record> = Vec::new();
        let mut time: i64 = 0;
        for index in 0..count {
            blocks.push(Record::new(index, &format!("{:064x}", index), index, time));
            time += if index % 7 == 6 { 7_200 } else { 600 };
        }
        return Self {
            blocks,
            failing_steps: failing_steps.iter().cloned().collect(),
        };
    }
}

impl BlockSource for SimulatedChain {
    /// Blocks mined within the hour starting at `timestamp_ms`.
    fn blocks_for_period(&self, timestamp_ms: u64) -> Result<Vec<Record>, FetchError> {
        if self.failing_steps.contains(&timestamp_ms) {
            return Err(FetchError::Status(502));
        }
        let from: i64 = (timestamp_ms / 1000) as i64;
        return Ok(self
            .blocks
            .iter()
            .filter(|b| b.timestamp >= from && b.timestamp < from + 3_600)
            .cloned()
            .collect());
    }

    fn blocks_at_height(&self, height: u64) -> Result<Vec<Record>, FetchError> {
        return Ok(self.blocks.iter().filter(|b| b.height == height).cloned().collect());
    }
}

/// Walks a simulated chain with one failing step, reconciles the hole it
/// leaves, and checks that the statistics see every interval.
#[test]
fn fetch_reconcile_aggregate() -> () {
    let dir: TempDir = TempDir::new().unwrap();
    let store: RecordStore = RecordStore::new(dir.path().join("blocks.jsonl"));
    let chain: SimulatedChain = SimulatedChain::new(50, &[3_600_000]);
    let range: TimeRange = TimeRange {
        start_ms: 0,
        end_ms: 48 * 3_600_000,
        step_ms: 3_600_000,
    };
    let policy: RetryPolicy = RetryPolicy::new(5, Duration::ZERO);

    let fetched: FetchSummary = fetch_range(&chain, &store, &range, &policy).unwrap();
    assert_eq!(fetched.exhausted, vec![3_600_000]);
    assert!(!missing_indices(&store.load().unwrap()).is_empty());

    let reconciled: ReconcileSummary = reconcile(&chain, &store, &policy).unwrap();
    assert!(reconciled.still_missing.is_empty());

    let records: Vec<Record> = store.load().unwrap();
    let indices: BTreeSet<u64> = records.iter().map(|r| r.index).collect();
    assert_eq!(indices, (0..50).collect::<BTreeSet<u64>>());

    let stats: Statistics = aggregate(&records, 120.0).unwrap();
    assert_eq!(stats.delta_count, 49);
    assert_eq!(stats.long_gap_count, 7);
}

/// Records at the tail of the range that no fetch returned are not gaps:
/// the expected range stops at the highest index seen.
#[test]
fn gaps_are_bounded_by_highest_index() -> () {
    let records: Vec<Record> = vec![Record::new(0, "a", 0, 0), Record::new(2, "c", 2, 1_200)];
    assert_eq!(missing_indices(&records), vec![1]);
}

/// Equal timestamps everywhere must not yield a NaN report.
#[test]
fn identical_timestamps_are_rejected() -> () {
    let records: Vec<Record> = (0..10).map(|i| Record::new(i, "h", i, 1_231_006_505)).collect();

    assert_eq!(aggregate(&records, 120.0), Err(StatsError::ZeroVariance));
}
