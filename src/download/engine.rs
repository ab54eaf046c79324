//! Download engine for concurrent page fetches with retry support.
//!
//! This module provides the `DownloadEngine` which fans work items out to a
//! fixed-size pool of fetch tasks, collects their outcomes in completion
//! order, sniffs each payload and writes it to the [`PageStore`].
//!
//! Completion order is deliberately unconstrained. Page order is recovered
//! from the stored file names, never from the order pages arrive in.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cookbooker_core::download::{DownloadEngine, HttpClient, RetryPolicy};
//! use cookbooker_core::store::PageStore;
//! use cookbooker_core::template::{Site, derive_work_items};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let base = "https://babel.hathitrust.org/cgi/imgsrv/image?id=x;seq=1;size=125";
//! let items = derive_work_items(base, 40, Site::detect(base)?)?;
//! let store = PageStore::reset(std::path::Path::new("./tmp")).await?;
//! let engine = DownloadEngine::new(10, RetryPolicy::default())?;
//! let report = engine.download_all(items, Arc::new(HttpClient::new()?), &store).await?;
//! println!("written: {}, failed: {}", report.written.len(), report.failed.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::PageSource;
use super::constants::DEFAULT_CONCURRENCY;
use super::fetcher::{FetchOutcome, fetch_with_retry};
use super::retry::RetryPolicy;
use crate::sniff::ContentType;
use crate::store::{PageStore, SniffedPage, StoredPage};
use crate::template::WorkItem;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Error type for download engine operations.
///
/// Individual page failures are never reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Live counters for a download run.
///
/// Updated from concurrent fetch tasks; the progress UI polls them.
#[derive(Debug, Default)]
pub struct DownloadStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pages written.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of pages that were skipped.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the total number of pages settled (completed + failed).
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.failed()
    }

    /// Returns the number of retry attempts made.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }
}

/// A page that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    /// The missing page.
    pub page_index: u32,
    /// Fetch attempts made before giving up.
    pub attempts: u32,
    /// Last error, rendered for the warning trail.
    pub cause: String,
}

/// What a download run produced, each list ascending by page index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Pages written to the store.
    pub written: Vec<StoredPage>,
    /// Pages that failed terminally; no file was written.
    pub failed: Vec<PageFailure>,
    /// Written pages whose type could not be determined.
    pub unknown_type: Vec<u32>,
}

impl DownloadReport {
    /// True when every page was written with a known type.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.unknown_type.is_empty()
    }

    fn sort(&mut self) {
        self.written.sort_by_key(|page| page.page_index);
        self.failed.sort_by_key(|failure| failure.page_index);
        self.unknown_type.sort_unstable();
    }
}

/// Download engine for concurrent page fetches with retry support.
///
/// # Concurrency Model
///
/// - Each page is fetched in its own Tokio task
/// - A semaphore permit is acquired before starting each fetch and released
///   as soon as the fetch (including its retries and backoff sleeps) settles
/// - Outcomes travel back over a channel in completion order
/// - The engine sniffs and writes each payload as it arrives
///
/// # Failure Handling
///
/// A page whose fetch fails terminally, or whose file cannot be written, is
/// logged and recorded in the [`DownloadReport`]; sibling fetches continue.
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
    /// Retry policy for failed fetches.
    retry_policy: RetryPolicy,
    /// Counters shared with observers.
    stats: Arc<DownloadStats>,
}

impl Default for DownloadEngine {
    fn default() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(DEFAULT_CONCURRENCY)),
            concurrency: DEFAULT_CONCURRENCY,
            retry_policy: RetryPolicy::default(),
            stats: Arc::new(DownloadStats::new()),
        }
    }
}

impl DownloadEngine {
    /// Creates a new download engine with the specified concurrency limit and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use cookbooker_core::download::{DownloadEngine, RetryPolicy};
    ///
    /// let engine = DownloadEngine::new(10, RetryPolicy::default()).unwrap();
    /// assert_eq!(engine.concurrency(), 10);
    /// ```
    #[instrument(level = "debug", skip(retry_policy))]
    pub fn new(concurrency: usize, retry_policy: RetryPolicy) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(
            concurrency,
            max_attempts = retry_policy.max_attempts(),
            backoff_unit_ms = retry_policy.unit().as_millis(),
            "creating download engine"
        );

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            retry_policy,
            stats: Arc::new(DownloadStats::new()),
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns a handle to the live counters.
    #[must_use]
    pub fn stats(&self) -> Arc<DownloadStats> {
        Arc::clone(&self.stats)
    }

    /// Fetches every work item and writes each page to `store`.
    ///
    /// The store's directory is expected to be empty (see
    /// [`PageStore::reset`]); same-named files are overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the pool semaphore is closed.
    ///
    /// Note: individual page failures do NOT cause this method to error.
    /// They are logged and listed in the returned report.
    #[instrument(skip(self, items, source, store), fields(pages = items.len(), dir = %store.dir().display()))]
    pub async fn download_all(
        &self,
        items: Vec<WorkItem>,
        source: Arc<dyn PageSource>,
        store: &PageStore,
    ) -> Result<DownloadReport, EngineError> {
        info!("starting page downloads");

        let (tx, mut rx) = mpsc::unbounded_channel::<FetchOutcome>();

        let dispatch = async move {
            let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(items.len());
            for item in items {
                // Blocks while the pool is full
                let permit = self
                    .semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| EngineError::SemaphoreClosed)?;

                let tx = tx.clone();
                let source = Arc::clone(&source);
                let policy = self.retry_policy.clone();
                let stats = Arc::clone(&self.stats);

                handles.push(tokio::spawn(async move {
                    let outcome = fetch_with_retry(source.as_ref(), &item, &policy, &stats).await;
                    drop(permit);
                    // Receiver lives until every sender is gone
                    let _ = tx.send(outcome);
                }));
            }
            Ok::<_, EngineError>(handles)
        };

        let collect = async {
            let mut report = DownloadReport::default();
            while let Some(outcome) = rx.recv().await {
                self.settle(outcome, store, &mut report).await;
            }
            report
        };

        let (handles, mut report) = tokio::join!(dispatch, collect);
        let handles = handles?;

        debug!(task_count = handles.len(), "all outcomes received");
        for handle in handles {
            // Task panics are logged but don't fail the batch
            if let Err(e) = handle.await {
                warn!(error = %e, "fetch task panicked");
            }
        }

        report.sort();
        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            unknown_type = report.unknown_type.len(),
            retried = self.stats.retried(),
            "page downloads complete"
        );
        Ok(report)
    }

    /// Sniffs and persists one outcome, recording the result.
    async fn settle(&self, outcome: FetchOutcome, store: &PageStore, report: &mut DownloadReport) {
        match outcome {
            FetchOutcome::Fetched {
                page_index,
                payload,
                attempts,
            } => {
                let page = SniffedPage::new(page_index, payload);
                match store.write_page(&page).await {
                    Ok(stored) => {
                        if stored.content_type == ContentType::Unknown {
                            report.unknown_type.push(page_index);
                        }
                        info!(page = page_index, path = %stored.path.display(), "page saved");
                        report.written.push(stored);
                        self.stats.increment_completed();
                    }
                    Err(e) => {
                        warn!(page = page_index, attempts, error = %e, "failed to write page");
                        report.failed.push(PageFailure {
                            page_index,
                            attempts,
                            cause: format!("write failed: {e}"),
                        });
                        self.stats.increment_failed();
                    }
                }
            }
            FetchOutcome::Failed {
                page_index,
                last_error,
                attempts,
            } => {
                warn!(
                    page = page_index,
                    attempts,
                    error = %last_error,
                    "page failed after all attempts, skipping"
                );
                report.failed.push(PageFailure {
                    page_index,
                    attempts,
                    cause: last_error.to_string(),
                });
                self.stats.increment_failed();
            }
        }
    }
}
