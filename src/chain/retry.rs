use std::thread;
use std::time::Duration;

use crate::error::FetchError;

use tracing::warn;

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        return Self { attempts, delay };
    }
}

/// Result of driving one unit of work (one day, one index) through the
/// retry policy.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Recovered(T),
    Exhausted { attempts: u32, last_error: FetchError },
}

/// Runs `op` until it succeeds or the policy's attempts are spent.
///
/// # Parameters
/// - `policy`: How many attempts to make and how long to sleep between them.
/// - `unit`: A label for the unit of work, used in log lines only.
/// - `op`: The request to perform. Receives the 1-based attempt number.
///
/// # Returns
/// `Recovered` with the first successful value, or `Exhausted` with the error
/// of the final attempt. No error ever escapes as a `Result`.
pub fn retry<T, F>(policy: &RetryPolicy, unit: &str, mut op: F) -> FetchOutcome<T>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let attempts: u32 = policy.attempts.max(1);
    let mut attempt: u32 = 1;

    loop {
        match op(attempt) {
            Ok(value) => return FetchOutcome::Recovered(value),
            Err(err) => {
                warn!(unit, attempt, status = ?err.status(), error = %err, "request failed");
                if attempt >= attempts {
                    return FetchOutcome::Exhausted {
                        attempts,
                        last_error: err,
                    };
                }
            }
        }
        if !policy.delay.is_zero() {
            thread::sleep(policy.delay);
        }
        attempt += 1;
    }
}
