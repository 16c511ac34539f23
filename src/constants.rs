// Upstream API.
pub const DEFAULT_API_BASE_URL: &str = "https://blockchain.info";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

// Time range walked by the bulk fetcher (milliseconds since epoch).
pub const GENESIS_TIME_MS: u64 = 1_231_006_505_000; // 2009-01-03 18:15:05 UTC.
pub const DAY_MS: u64 = 86_400_000;

// Retry policy shared by the fetcher and the reconciler.
pub const DEFAULT_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 100;

// Aggregation.
pub const LONG_GAP_THRESHOLD_MIN: f64 = 120.0;
pub const SECONDS_PER_MINUTE: f64 = 60.0;
pub const MINUTES_PER_DAY: f64 = 1_440.0;

// Record store.
pub const DEFAULT_STORE_PATH: &str = "data/blocks.jsonl";
