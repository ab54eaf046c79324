//! Constants for the download module (timeouts, pool width, retry ceiling).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default number of in-flight page fetches.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default attempt ceiling per page, including the first attempt.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default backoff time unit; jitter draws whole multiples of it.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);
