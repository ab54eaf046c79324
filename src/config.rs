//! Run configuration.
//!
//! [`RunConfig`] is the single description of what a run should do. It is
//! filled from config-file defaults, then command-line flags, then optionally
//! from interactive answers. Interactive input goes through
//! [`RunConfig::apply_input`], which parses text according to each field's
//! type and hands the value to that field's typed setter.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::download::{DEFAULT_BACKOFF_UNIT, DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS};

/// Errors from applying textual input to a [`RunConfig`] field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Input for a numeric field was not a non-negative integer.
    #[error("invalid value for {field}: expected a whole number, got {input:?}")]
    InvalidNumber {
        /// Field being set.
        field: ConfigField,
        /// Rejected input.
        input: String,
    },
}

/// Fields a user can review and change interactively, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// Base page URL.
    Url,
    /// Number of pages.
    Pages,
    /// Author name.
    Author,
    /// Document title.
    Title,
    /// Whether to download pages.
    Download,
    /// Whether to assemble a PDF.
    Pdf,
    /// Whether to run text recognition.
    Ocr,
}

impl ConfigField {
    /// Every prompt-able field, in prompt order.
    pub const ALL: [Self; 7] = [
        Self::Url,
        Self::Pages,
        Self::Author,
        Self::Title,
        Self::Download,
        Self::Pdf,
        Self::Ocr,
    ];

    /// Label shown in prompts and errors.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Pages => "pages",
            Self::Author => "author",
            Self::Title => "title",
            Self::Download => "download",
            Self::Pdf => "pdf",
            Self::Ocr => "ocr",
        }
    }
}

impl std::fmt::Display for ConfigField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    url: String,
    pages: u32,
    author: String,
    title: String,
    download: bool,
    pdf: bool,
    ocr: bool,
    concurrency: usize,
    max_attempts: u32,
    backoff_unit: Duration,
    work_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pages: 0,
            author: String::new(),
            title: String::new(),
            download: true,
            pdf: false,
            ocr: false,
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            work_dir: PathBuf::from("."),
        }
    }
}

impl RunConfig {
    /// Base page URL (empty when unset).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of pages (zero when unset).
    #[must_use]
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Author name.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Document title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether pages should be downloaded (otherwise existing pages are reused).
    #[must_use]
    pub fn download(&self) -> bool {
        self.download
    }

    /// Whether a PDF should be assembled.
    #[must_use]
    pub fn pdf(&self) -> bool {
        self.pdf
    }

    /// Whether text recognition should run.
    #[must_use]
    pub fn ocr(&self) -> bool {
        self.ocr
    }

    /// Number of in-flight fetches.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Attempt ceiling per page.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff time unit.
    #[must_use]
    pub fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    /// Directory holding `tmp/` (page images) and `pdf/` (documents).
    #[must_use]
    pub fn work_dir(&self) -> &PathBuf {
        &self.work_dir
    }

    /// Page image directory.
    #[must_use]
    pub fn image_dir(&self) -> PathBuf {
        self.work_dir.join("tmp")
    }

    /// Document output directory.
    #[must_use]
    pub fn pdf_dir(&self) -> PathBuf {
        self.work_dir.join("pdf")
    }

    /// True when a download was requested but the URL or page count is missing.
    #[must_use]
    pub fn missing_download_input(&self) -> bool {
        self.download && (self.url.is_empty() || self.pages == 0)
    }

    /// Sets the base page URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Sets the page count.
    pub fn set_pages(&mut self, pages: u32) {
        self.pages = pages;
    }

    /// Sets the author name.
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
    }

    /// Sets the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Enables or disables downloading.
    pub fn set_download(&mut self, download: bool) {
        self.download = download;
    }

    /// Enables or disables PDF assembly.
    pub fn set_pdf(&mut self, pdf: bool) {
        self.pdf = pdf;
    }

    /// Enables or disables text recognition.
    pub fn set_ocr(&mut self, ocr: bool) {
        self.ocr = ocr;
    }

    /// Sets the number of in-flight fetches.
    pub fn set_concurrency(&mut self, concurrency: usize) {
        self.concurrency = concurrency;
    }

    /// Sets the attempt ceiling per page.
    pub fn set_max_attempts(&mut self, max_attempts: u32) {
        self.max_attempts = max_attempts;
    }

    /// Sets the backoff time unit.
    pub fn set_backoff_unit(&mut self, unit: Duration) {
        self.backoff_unit = unit;
    }

    /// Sets the working directory.
    pub fn set_work_dir(&mut self, dir: impl Into<PathBuf>) {
        self.work_dir = dir.into();
    }

    /// Current value of `field`, formatted for a prompt.
    #[must_use]
    pub fn display_value(&self, field: ConfigField) -> String {
        match field {
            ConfigField::Url => self.url.clone(),
            ConfigField::Pages => self.pages.to_string(),
            ConfigField::Author => self.author.clone(),
            ConfigField::Title => self.title.clone(),
            ConfigField::Download => self.download.to_string(),
            ConfigField::Pdf => self.pdf.to_string(),
            ConfigField::Ocr => self.ocr.to_string(),
        }
    }

    /// Applies one line of user input to `field`.
    ///
    /// Empty (or all-whitespace) input keeps the current value. Booleans are
    /// true for `t` or `true` in any case and false for anything else.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidNumber`] when a numeric field gets
    /// non-numeric input; the config is left unchanged.
    pub fn apply_input(&mut self, field: ConfigField, input: &str) -> Result<(), ConfigError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }

        match field {
            ConfigField::Url => self.set_url(input),
            ConfigField::Pages => {
                let pages = input
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidNumber {
                        field,
                        input: input.to_string(),
                    })?;
                self.set_pages(pages);
            }
            ConfigField::Author => self.set_author(input),
            ConfigField::Title => self.set_title(input),
            ConfigField::Download => self.set_download(parse_flag(input)),
            ConfigField::Pdf => self.set_pdf(parse_flag(input)),
            ConfigField::Ocr => self.set_ocr(parse_flag(input)),
        }
        Ok(())
    }
}

fn parse_flag(input: &str) -> bool {
    input.eq_ignore_ascii_case("t") || input.eq_ignore_ascii_case("true")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert!(config.download());
        assert!(!config.pdf());
        assert!(!config.ocr());
        assert_eq!(config.concurrency(), 10);
        assert_eq!(config.max_attempts(), 10);
        assert_eq!(config.backoff_unit(), Duration::from_secs(1));
        assert_eq!(config.image_dir(), PathBuf::from("./tmp"));
        assert_eq!(config.pdf_dir(), PathBuf::from("./pdf"));
    }

    #[test]
    fn test_missing_download_input() {
        let mut config = RunConfig::default();
        assert!(config.missing_download_input());

        config.set_url("https://babel.hathitrust.org/x?seq=1");
        assert!(config.missing_download_input());

        config.set_pages(3);
        assert!(!config.missing_download_input());

        let mut reuse = RunConfig::default();
        reuse.set_download(false);
        assert!(!reuse.missing_download_input());
    }

    #[test]
    fn test_apply_input_strings() {
        let mut config = RunConfig::default();
        config.apply_input(ConfigField::Title, "  Mrs Beeton  ").unwrap();
        config.apply_input(ConfigField::Author, "Isabella").unwrap();
        assert_eq!(config.title(), "Mrs Beeton");
        assert_eq!(config.author(), "Isabella");
    }

    #[test]
    fn test_apply_input_empty_keeps_value() {
        let mut config = RunConfig::default();
        config.set_pages(12);
        config.apply_input(ConfigField::Pages, "").unwrap();
        config.apply_input(ConfigField::Download, "   ").unwrap();
        assert_eq!(config.pages(), 12);
        assert!(config.download());
    }

    #[test]
    fn test_apply_input_number() {
        let mut config = RunConfig::default();
        config.apply_input(ConfigField::Pages, "60").unwrap();
        assert_eq!(config.pages(), 60);
    }

    #[test]
    fn test_apply_input_bad_number_leaves_value() {
        let mut config = RunConfig::default();
        config.set_pages(4);
        let err = config.apply_input(ConfigField::Pages, "sixty").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                field: ConfigField::Pages,
                input: "sixty".to_string()
            }
        );
        assert_eq!(config.pages(), 4);
    }

    #[test]
    fn test_apply_input_flags() {
        let mut config = RunConfig::default();
        config.apply_input(ConfigField::Pdf, "T").unwrap();
        config.apply_input(ConfigField::Ocr, "TRUE").unwrap();
        config.apply_input(ConfigField::Download, "yes").unwrap();
        assert!(config.pdf());
        assert!(config.ocr());
        assert!(!config.download());
    }

    #[test]
    fn test_display_value_round_trips_through_prompt_order() {
        let mut config = RunConfig::default();
        config.set_pages(7);
        let shown: Vec<String> = ConfigField::ALL
            .iter()
            .map(|field| config.display_value(*field))
            .collect();
        assert_eq!(shown, ["", "7", "", "", "true", "false", "false"]);
    }
}
