//! Page acquisition: HTTP fetch, retry, and the concurrent download engine.
//!
//! # Features
//!
//! - Bounded parallelism (10 in-flight fetches by default)
//! - Exponential backoff with full jitter on HTTP error responses
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Structured error types with full context
//! - Partial batches: a failed page is skipped, never fatal
//!
//! # Example
//!
//! ```no_run
//! use cookbooker_core::download::{HttpClient, PageSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let bytes = client
//!     .fetch_page("https://babel.hathitrust.org/cgi/imgsrv/image?id=x;seq=1")
//!     .await?;
//! println!("Fetched {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod engine;
mod error;
mod fetcher;
mod retry;

pub use client::{HttpClient, PageSource};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BACKOFF_UNIT, DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS,
    READ_TIMEOUT_SECS,
};
pub use engine::{DownloadEngine, DownloadReport, DownloadStats, EngineError, PageFailure};
pub use error::FetchError;
pub use fetcher::{FetchOutcome, fetch_with_retry};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, FetchError>` explicitly in function signatures.
