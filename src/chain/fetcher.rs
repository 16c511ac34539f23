use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::chain::client::BlockSource;
use crate::chain::record::Record;
use crate::chain::retry::{FetchOutcome, RetryPolicy, retry};
use crate::chain::store::RecordStore;
use crate::error::StoreError;

/// Half-open time window `[start_ms, end_ms)` walked in `step_ms` strides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: u64,
    pub end_ms: u64,
    pub step_ms: u64,
}

impl TimeRange {
    /// Every step timestamp in the window, in ascending order.
    pub fn steps(&self) -> impl Iterator<Item = u64> {
        let TimeRange { start_ms, end_ms, step_ms } = *self;
        return (0..)
            .map(move |i: u64| i.saturating_mul(step_ms).saturating_add(start_ms))
            .take_while(move |t| step_ms > 0 && *t < end_ms);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub steps: u64,
    pub pages_appended: u64,
    pub records_appended: u64,
    /// Step timestamps whose every attempt failed; the reconciler picks their blocks up later.
    pub exhausted: Vec<u64>,
}

/// Bulk fetch stage: one "blocks for period" request per step.
///
/// # Parameters
/// - `source`: Upstream to request pages from.
/// - `store`: Store each successful page is appended to.
/// - `range`: Time window and stride.
/// - `policy`: Retry bound and delay applied to every step.
///
/// # Returns
/// A summary of the run. Exhausted steps are recorded there and never abort
/// the stage; only a store write failure does.
pub fn fetch_range<S: BlockSource>(
    source: &S,
    store: &RecordStore,
    range: &TimeRange,
    policy: &RetryPolicy,
) -> Result<FetchSummary, StoreError> {
    let mut summary: FetchSummary = FetchSummary::default();

    for timestamp_ms in range.steps() {
        summary.steps += 1;
        info!(step = summary.steps, timestamp_ms, day = %format_day(timestamp_ms), "fetching blocks");

        let unit: String = format!("blocks/{}", timestamp_ms);
        let outcome: FetchOutcome<Vec<Record>> = retry(policy, &unit, |_| source.blocks_for_period(timestamp_ms));

        match outcome {
            FetchOutcome::Recovered(page) => {
                store.append_page(&page)?;
                summary.pages_appended += 1;
                summary.records_appended += page.len() as u64;
            }
            FetchOutcome::Exhausted { attempts, last_error } => {
                error!(timestamp_ms, attempts, error = %last_error, "giving up on step");
                summary.exhausted.push(timestamp_ms);
            }
        }
    }

    info!(
        steps = summary.steps,
        pages = summary.pages_appended,
        records = summary.records_appended,
        exhausted = summary.exhausted.len(),
        "bulk fetch finished"
    );
    return Ok(summary);
}

fn format_day(timestamp_ms: u64) -> String {
    return match DateTime::<Utc>::from_timestamp_millis(timestamp_ms as i64) {
        Some(datetime) => datetime.format("%Y-%m-%d").to_string(),
        None => String::from("?"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::error::FetchError;

    use tempfile::TempDir;

    /// Fails each timestamp a scripted number of times before answering.
    struct FlakySource {
        failures: HashMap<u64, u32>,
        calls: RefCell<HashMap<u64, u32>>,
    }

    impl FlakySource {
        fn new(failures: &[(u64, u32)]) -> Self {
            return Self {
                failures: failures.iter().cloned().collect(),
                calls: RefCell::new(HashMap::new()),
            };
        }
    }

    impl BlockSource for FlakySource {
        fn blocks_for_period(&self, timestamp_ms: u64) -> Result<Vec<Record>, FetchError> {
            let mut calls = self.calls.borrow_mut();
            let seen: &mut u32 = calls.entry(timestamp_ms).or_insert(0);
            *seen += 1;
            if *seen <= self.failures.get(&timestamp_ms).copied().unwrap_or(0) {
                return Err(FetchError::Status(500));
            }
            let index: u64 = timestamp_ms / 10;
            return Ok(vec![Record::new(index, "h", index, (timestamp_ms / 1000) as i64)]);
        }

        fn blocks_at_height(&self, _height: u64) -> Result<Vec<Record>, FetchError> {
            return Ok(Vec::new());
        }
    }

    fn policy() -> RetryPolicy {
        return RetryPolicy::new(5, Duration::ZERO);
    }

    #[test]
    fn steps_are_half_open() -> () {
        let range: TimeRange = TimeRange { start_ms: 0, end_ms: 30, step_ms: 10 };
        assert_eq!(range.steps().collect::<Vec<u64>>(), vec![0, 10, 20]);

        let empty: TimeRange = TimeRange { start_ms: 30, end_ms: 30, step_ms: 10 };
        assert_eq!(empty.steps().count(), 0);
    }

    #[test]
    fn four_failures_then_success_appends_once() -> () {
        let dir: TempDir = TempDir::new().unwrap();
        let store: RecordStore = RecordStore::new(dir.path().join("blocks.jsonl"));
        let source: FlakySource = FlakySource::new(&[(0, 4)]);
        let range: TimeRange = TimeRange { start_ms: 0, end_ms: 10, step_ms: 10 };

        let summary: FetchSummary = fetch_range(&source, &store, &range, &policy()).unwrap();

        assert_eq!(summary.pages_appended, 1);
        assert!(summary.exhausted.is_empty());
        assert_eq!(store.load().unwrap().len(), 1);
        assert_eq!(source.calls.borrow()[&0], 5);
    }

    #[test]
    fn five_failures_skip_the_step_and_continue() -> () {
        let dir: TempDir = TempDir::new().unwrap();
        let store: RecordStore = RecordStore::new(dir.path().join("blocks.jsonl"));
        let source: FlakySource = FlakySource::new(&[(10, 5)]);
        let range: TimeRange = TimeRange { start_ms: 0, end_ms: 30, step_ms: 10 };

        let summary: FetchSummary = fetch_range(&source, &store, &range, &policy()).unwrap();

        assert_eq!(summary.steps, 3);
        assert_eq!(summary.pages_appended, 2);
        assert_eq!(summary.exhausted, vec![10]);
        let indices: Vec<u64> = store.load().unwrap().iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn every_step_exhausted_writes_nothing() -> () {
        let dir: TempDir = TempDir::new().unwrap();
        let store: RecordStore = RecordStore::new(dir.path().join("blocks.jsonl"));
        let source: FlakySource = FlakySource::new(&[(0, 5)]);
        let range: TimeRange = TimeRange { start_ms: 0, end_ms: 10, step_ms: 10 };

        let summary: FetchSummary = fetch_range(&source, &store, &range, &policy()).unwrap();

        assert_eq!(summary.pages_appended, 0);
        assert!(!store.exists());
    }

    /// Period lookups that succeed with no blocks at all.
    struct QuietSource {
        calls: RefCell<u32>,
    }

    impl BlockSource for QuietSource {
        fn blocks_for_period(&self, _timestamp_ms: u64) -> Result<Vec<Record>, FetchError> {
            *self.calls.borrow_mut() += 1;
            return Ok(Vec::new());
        }

        fn blocks_at_height(&self, _height: u64) -> Result<Vec<Record>, FetchError> {
            return Ok(Vec::new());
        }
    }

    #[test]
    fn empty_page_is_a_success() -> () {
        let dir: TempDir = TempDir::new().unwrap();
        let store: RecordStore = RecordStore::new(dir.path().join("blocks.jsonl"));
        let source: QuietSource = QuietSource { calls: RefCell::new(0) };
        let range: TimeRange = TimeRange { start_ms: 0, end_ms: 10, step_ms: 10 };

        let summary: FetchSummary = fetch_range(&source, &store, &range, &policy()).unwrap();

        assert_eq!(*source.calls.borrow(), 1);
        assert_eq!(summary.pages_appended, 1);
        assert_eq!(summary.records_appended, 0);
        assert!(summary.exhausted.is_empty());
        assert!(store.load().unwrap().is_empty());
    }
}
