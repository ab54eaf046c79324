//! Run orchestration for the cookbooker binary.
//!
//! download (optional) -> ordered listing -> PDF assembly (optional) -> OCR (optional)

pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
pub(crate) mod prompt;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result, bail};
use cookbooker_core::assemble::ocr_file_name;
use cookbooker_core::{
    DocumentAssembler, DocumentMetadata, DownloadEngine, HttpClient, Img2PdfAssembler,
    OcrMyPdfRecognizer, PageStore, RetryPolicy, RunConfig, Site, TextRecognizer,
    derive_work_items, list_ordered_pages,
};
use tracing::{info, warn};

use crate::ProcessExit;

/// HTTP client timeouts resolved from the config file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HttpTimeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
}

/// Executes the steps `config` asks for.
pub(crate) async fn run(
    config: &RunConfig,
    timeouts: HttpTimeouts,
    show_progress: bool,
) -> Result<ProcessExit> {
    let mut exit = ProcessExit::Success;

    if config.download() {
        exit = download_pages(config, timeouts, show_progress).await?;
    }

    let metadata = DocumentMetadata {
        author: config.author().to_string(),
        title: config.title().to_string(),
    };
    let pdf_dir = config.pdf_dir();
    let pdf_name = metadata.pdf_file_name();

    if config.pdf() {
        tokio::fs::create_dir_all(&pdf_dir)
            .await
            .with_context(|| format!("Failed to create '{}'", pdf_dir.display()))?;

        let pages = list_ordered_pages(&config.image_dir())
            .await
            .context("Page directory is inconsistent; refusing to assemble")?;
        info!(pages = pages.len(), name = %pdf_name, "assembling document");
        Img2PdfAssembler::default()
            .assemble(&pages, &metadata, &pdf_dir.join(&pdf_name))
            .await
            .context("PDF assembly failed")?;
    }

    if config.ocr() {
        let input = pdf_dir.join(&pdf_name);
        let output = pdf_dir.join(ocr_file_name(&pdf_name));
        OcrMyPdfRecognizer::default()
            .recognize(&input, &output)
            .await
            .context("OCR failed")?;
        info!(output = %output.display(), "OCR complete");
    }

    Ok(exit)
}

async fn download_pages(
    config: &RunConfig,
    timeouts: HttpTimeouts,
    show_progress: bool,
) -> Result<ProcessExit> {
    let site = match Site::detect(config.url()) {
        Ok(site) => site,
        Err(e) => bail!("{e}; only babel.hathitrust.org page URLs are supported"),
    };
    let items = derive_work_items(config.url(), config.pages(), site)?;

    let store = PageStore::reset(&config.image_dir()).await?;
    let client = HttpClient::new_with_timeouts(timeouts.connect_secs, timeouts.read_secs)
        .context("Failed to build HTTP client")?;
    let engine = DownloadEngine::new(
        config.concurrency(),
        RetryPolicy::new(config.max_attempts(), config.backoff_unit()),
    )?;

    let total = items.len();
    let (progress, stop) = progress_manager::spawn_progress_ui(show_progress, engine.stats(), total);
    let report = engine.download_all(items, Arc::new(client), &store).await;
    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress {
        let _ = handle.await;
    }
    let report = report?;

    for failure in &report.failed {
        warn!(
            page = failure.page_index,
            attempts = failure.attempts,
            cause = %failure.cause,
            "page missing from output"
        );
    }
    if !report.unknown_type.is_empty() {
        warn!(pages = ?report.unknown_type, "pages of unknown type will be left out of the PDF");
    }

    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        total,
        "download finished"
    );
    Ok(exit_handler::determine_exit_outcome(&report))
}
