use std::f64::consts::SQRT_2;

use serde::Serialize;

use crate::chain::record::Record;
use crate::constants::{MINUTES_PER_DAY, SECONDS_PER_MINUTE};
use crate::error::StatsError;

/// Descriptive statistics of the inter-block interval series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub record_count: usize,
    pub delta_count: usize,
    /// Mean interval in minutes.
    pub mean: f64,
    /// Sample (n - 1) standard deviation in minutes.
    pub stdev: f64,
    pub min_delta: f64,
    pub max_delta: f64,
    pub threshold_min: f64,
    /// P(X >= threshold) for a normal distribution with the series' mean and stdev.
    pub theoretical_tail_prob: f64,
    /// Share of intervals at or above the threshold.
    pub empirical_tail_prob: f64,
    pub long_gap_count: usize,
    /// `round(mean / empirical_tail_prob / 60)`: one long gap every this many hours.
    pub hours_between_long_gaps: f64,
    /// The same expectation expressed in days.
    pub days_between_long_gaps: f64,
}

/// Minutes between consecutive records once sorted by index.
///
/// Records sharing an index (alternate-chain blocks) are ordered by their
/// timestamp so that the result does not depend on storage order.
pub fn time_deltas(records: &[Record]) -> Vec<f64> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by_key(|r| (r.index, r.timestamp));

    return sorted
        .windows(2)
        .map(|pair| (pair[1].timestamp as f64 - pair[0].timestamp as f64) / SECONDS_PER_MINUTE)
        .collect();
}

pub fn mean(values: &[f64]) -> f64 {
    return values.iter().sum::<f64>() / values.len() as f64;
}

/// Unbiased sample standard deviation. Zero for fewer than two values.
pub fn sample_stdev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    return (squares / (values.len() - 1) as f64).sqrt();
}

/// Complementary error function.
///
/// Chebyshev fit with fractional error below 1.2e-7 over the whole real
/// line, which keeps far-tail probabilities meaningful where `1 - erf(x)`
/// would cancel to zero.
pub fn erfc(x: f64) -> f64 {
    let z: f64 = x.abs();
    let t: f64 = 1.0 / (1.0 + 0.5 * z);
    let poly: f64 = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98 + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans: f64 = t * poly.exp();
    return if x >= 0.0 { ans } else { 2.0 - ans };
}

/// `1 - cdf(x)` of a normal distribution, evaluated through `erfc` to avoid
/// cancellation.
pub fn normal_tail(x: f64, mean: f64, stdev: f64) -> f64 {
    return 0.5 * erfc((x - mean) / (stdev * SQRT_2));
}

/// Number of intervals at or above `threshold` minutes.
pub fn long_gap_count(deltas: &[f64], threshold: f64) -> usize {
    return deltas.iter().filter(|d| **d >= threshold).count();
}

/// Aggregation stage over an in-memory record set.
///
/// # Parameters
/// - `records`: Records in any order; they are sorted by index first.
/// - `threshold_min`: Interval length, in minutes, that counts as a long gap.
///
/// # Returns
/// The statistics, or an "insufficient data" error when there are fewer than
/// two records, every interval is identical, or no interval reaches the
/// threshold. Never a NaN or infinite result.
pub fn aggregate(records: &[Record], threshold_min: f64) -> Result<Statistics, StatsError> {
    if records.len() < 2 {
        return Err(StatsError::InsufficientRecords(records.len()));
    }

    let deltas: Vec<f64> = time_deltas(records);
    let mean: f64 = mean(&deltas);
    let stdev: f64 = sample_stdev(&deltas, mean);
    if stdev <= 0.0 || !stdev.is_finite() {
        return Err(StatsError::ZeroVariance);
    }

    let long_gap_count: usize = long_gap_count(&deltas, threshold_min);
    if long_gap_count == 0 {
        return Err(StatsError::NoLongGaps { threshold: threshold_min });
    }
    let empirical_tail_prob: f64 = long_gap_count as f64 / deltas.len() as f64;
    let minutes_between_long_gaps: f64 = mean / empirical_tail_prob;

    let min_delta: f64 = deltas.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_delta: f64 = deltas.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    return Ok(Statistics {
        record_count: records.len(),
        delta_count: deltas.len(),
        mean,
        stdev,
        min_delta,
        max_delta,
        threshold_min,
        theoretical_tail_prob: normal_tail(threshold_min, mean, stdev),
        empirical_tail_prob,
        long_gap_count,
        hours_between_long_gaps: (minutes_between_long_gaps / SECONDS_PER_MINUTE).round(),
        days_between_long_gaps: minutes_between_long_gaps / MINUTES_PER_DAY,
    });
}
