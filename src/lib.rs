//! Cookbooker Core Library
//!
//! Fetches the numbered page images of a scanned book from an image server,
//! stores them so page order survives unordered concurrent completion, and
//! hands the ordered pages to external document assembly and text
//! recognition tools.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`template`] - Site detection and per-page URL derivation
//! - [`download`] - HTTP fetch, retry with jittered backoff, concurrent engine
//! - [`sniff`] - Content type detection from magic numbers
//! - [`store`] - Page file naming, writing, and ordered read-back
//! - [`assemble`] - External PDF assembly and OCR collaborators
//! - [`config`] - Run configuration with typed setters

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assemble;
pub mod config;
pub mod download;
pub mod sniff;
pub mod store;
pub mod template;

// Re-export commonly used types
pub use assemble::{
    AssembleError, DocumentAssembler, DocumentMetadata, Img2PdfAssembler, OcrMyPdfRecognizer,
    TextRecognizer,
};
pub use config::{ConfigError, ConfigField, RunConfig};
pub use download::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS, DownloadEngine, DownloadReport, DownloadStats,
    EngineError, FetchError, HttpClient, PageSource, RetryPolicy,
};
pub use sniff::{ContentType, sniff};
pub use store::{PageStore, StoreError, list_ordered_pages};
pub use template::{Site, TemplateError, WorkItem, derive_work_items};
