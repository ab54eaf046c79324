//! Retrying fetch of a single work item.
//!
//! Collapses every attempt for one page into exactly one [`FetchOutcome`].
//! Transient failures are retried under the [`RetryPolicy`]; the sleep keeps
//! the caller's pool slot, so a page being retried never frees its slot to a
//! sibling.

use tracing::{debug, info, instrument};

use super::PageSource;
use super::engine::DownloadStats;
use super::error::FetchError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::template::WorkItem;

/// Result of fetching one work item, produced exactly once per item.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page body was received.
    Fetched {
        /// Page the payload belongs to.
        page_index: u32,
        /// Raw response body.
        payload: Vec<u8>,
        /// Attempts it took, including the successful one.
        attempts: u32,
    },

    /// All permitted attempts failed.
    Failed {
        /// Page that could not be fetched.
        page_index: u32,
        /// Error from the last attempt.
        last_error: FetchError,
        /// Number of attempts made.
        attempts: u32,
    },
}

impl FetchOutcome {
    /// Page index this outcome belongs to.
    #[must_use]
    pub fn page_index(&self) -> u32 {
        match self {
            Self::Fetched { page_index, .. } | Self::Failed { page_index, .. } => *page_index,
        }
    }
}

/// Fetches `item` from `source`, retrying transient failures.
///
/// Each attempt and each retry emits an informational log line. The
/// `stats` retry counter is bumped once per retry.
#[instrument(skip(source, item, policy, stats), fields(page = item.page_index, url = %item.request_url))]
pub async fn fetch_with_retry(
    source: &dyn PageSource,
    item: &WorkItem,
    policy: &RetryPolicy,
    stats: &DownloadStats,
) -> FetchOutcome {
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        info!(page = item.page_index, attempt, "fetching page");

        match source.fetch_page(&item.request_url).await {
            Ok(payload) => {
                return FetchOutcome::Fetched {
                    page_index: item.page_index,
                    payload,
                    attempts: attempt,
                };
            }
            Err(e) => match policy.should_retry(classify_error(&e), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    info!(
                        page = item.page_index,
                        attempt = next_attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "retrying page"
                    );
                    stats.increment_retried();
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(page = item.page_index, %reason, "not retrying page");
                    return FetchOutcome::Failed {
                        page_index: item.page_index,
                        last_error: e,
                        attempts: attempt,
                    };
                }
            },
        }
    }
}
