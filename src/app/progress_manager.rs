//! Progress UI (bar) for download runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use cookbooker_core::DownloadStats;
use indicatif::{ProgressBar, ProgressStyle};

/// Spawns the progress bar when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `show` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    show: bool,
    stats: Arc<DownloadStats>,
    total: usize,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !show {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_bar_inner(stats, total, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_bar_inner(
    stats: Arc<DownloadStats>,
    total: usize,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} pages {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            update(&bar, &stats);
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        update(&bar, &stats);
        bar.finish_and_clear();
    })
}

fn update(bar: &ProgressBar, stats: &DownloadStats) {
    bar.set_position(u64::try_from(stats.total()).unwrap_or(u64::MAX));
    let failed = stats.failed();
    let retried = stats.retried();
    if failed > 0 || retried > 0 {
        bar.set_message(format!("({failed} failed, {retried} retries)"));
    }
}
