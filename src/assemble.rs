//! Document assembly and text recognition.
//!
//! Both steps are delegated to external programs and treated as opaque
//! transforms: assembly joins the ordered page images into one PDF, and
//! recognition writes a searchable copy of that PDF.
//!
//! The defaults drive `img2pdf` and `ocrmypdf`; either can be swapped by
//! implementing [`DocumentAssembler`] or [`TextRecognizer`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Default assembly program.
pub const DEFAULT_ASSEMBLER_PROGRAM: &str = "img2pdf";

/// Default recognition program.
pub const DEFAULT_RECOGNIZER_PROGRAM: &str = "ocrmypdf";

/// Prefix added to the recognized copy's file name.
pub const OCR_PREFIX: &str = "[OCR] ";

/// Errors from the external assembly and recognition steps.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The program could not be started (usually not installed).
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        /// Program that failed.
        program: String,
        /// Exit status description.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// There were no ordered pages to assemble.
    #[error("no page images to assemble")]
    NoPages,
}

/// Descriptive fields embedded in the assembled document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Author name.
    pub author: String,
    /// Document title.
    pub title: String,
}

impl DocumentMetadata {
    /// Output file name, `"<title> - <author>.pdf"`.
    #[must_use]
    pub fn pdf_file_name(&self) -> String {
        format!("{} - {}.pdf", self.title, self.author)
    }
}

/// Name of the recognized copy of `pdf_file_name`.
#[must_use]
pub fn ocr_file_name(pdf_file_name: &str) -> String {
    format!("{OCR_PREFIX}{pdf_file_name}")
}

/// Joins ordered page images into one document.
#[async_trait]
pub trait DocumentAssembler: Send + Sync {
    /// Writes a document built from `pages`, in the given order, to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleError`] if the document could not be produced.
    async fn assemble(
        &self,
        pages: &[PathBuf],
        metadata: &DocumentMetadata,
        output: &Path,
    ) -> Result<(), AssembleError>;
}

/// Produces a text-searchable copy of a document.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Reads `input` and writes the recognized document to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`AssembleError`] if recognition failed.
    async fn recognize(&self, input: &Path, output: &Path) -> Result<(), AssembleError>;
}

/// [`DocumentAssembler`] backed by the `img2pdf` command line tool.
///
/// Pages are laid out on US Letter.
#[derive(Debug, Clone)]
pub struct Img2PdfAssembler {
    program: String,
}

impl Default for Img2PdfAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_ASSEMBLER_PROGRAM)
    }
}

impl Img2PdfAssembler {
    /// Uses `program` instead of the default `img2pdf`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(pages: &[PathBuf], metadata: &DocumentMetadata, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--pagesize".into(),
            "Letter".into(),
            "--author".into(),
            metadata.author.clone().into(),
            "--title".into(),
            metadata.title.clone().into(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ];
        args.extend(pages.iter().map(|page| page.as_os_str().to_owned()));
        args
    }
}

#[async_trait]
impl DocumentAssembler for Img2PdfAssembler {
    #[instrument(skip(self, pages, metadata), fields(pages = pages.len(), output = %output.display()))]
    async fn assemble(
        &self,
        pages: &[PathBuf],
        metadata: &DocumentMetadata,
        output: &Path,
    ) -> Result<(), AssembleError> {
        if pages.is_empty() {
            return Err(AssembleError::NoPages);
        }
        info!(output = %output.display(), "creating document");
        run(&self.program, Self::args(pages, metadata, output)).await
    }
}

/// [`TextRecognizer`] backed by the `ocrmypdf` command line tool.
#[derive(Debug, Clone)]
pub struct OcrMyPdfRecognizer {
    program: String,
}

impl Default for OcrMyPdfRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_RECOGNIZER_PROGRAM)
    }
}

impl OcrMyPdfRecognizer {
    /// Uses `program` instead of the default `ocrmypdf`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for OcrMyPdfRecognizer {
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    async fn recognize(&self, input: &Path, output: &Path) -> Result<(), AssembleError> {
        info!("running text recognition");
        run(
            &self.program,
            vec![input.as_os_str().to_owned(), output.as_os_str().to_owned()],
        )
        .await
    }
}

async fn run(program: &str, args: Vec<OsString>) -> Result<(), AssembleError> {
    debug!(program, arg_count = args.len(), "spawning external command");
    let output = Command::new(program)
        .args(&args)
        .output()
        .await
        .map_err(|source| AssembleError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    Err(AssembleError::CommandFailed {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn metadata() -> DocumentMetadata {
        DocumentMetadata {
            author: "Thomas M. Hilliard".to_string(),
            title: "The Art of Carving".to_string(),
        }
    }

    #[test]
    fn test_pdf_file_name() {
        assert_eq!(
            metadata().pdf_file_name(),
            "The Art of Carving - Thomas M. Hilliard.pdf"
        );
    }

    #[test]
    fn test_ocr_file_name() {
        assert_eq!(ocr_file_name("a - b.pdf"), "[OCR] a - b.pdf");
    }

    #[test]
    fn test_img2pdf_args_keep_page_order() {
        let pages = vec![PathBuf::from("tmp/1.jpg"), PathBuf::from("tmp/10.png")];
        let args = Img2PdfAssembler::args(&pages, &metadata(), Path::new("pdf/out.pdf"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(&args[..2], ["--pagesize", "Letter"]);
        assert!(args.windows(2).any(|w| w == ["--author", "Thomas M. Hilliard"]));
        assert!(args.windows(2).any(|w| w == ["-o", "pdf/out.pdf"]));
        assert_eq!(&args[args.len() - 2..], ["tmp/1.jpg", "tmp/10.png"]);
    }

    #[tokio::test]
    async fn test_assemble_without_pages_fails() {
        let assembler = Img2PdfAssembler::default();
        let result = assembler
            .assemble(&[], &metadata(), Path::new("out.pdf"))
            .await;
        assert!(matches!(result, Err(AssembleError::NoPages)));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let assembler = Img2PdfAssembler::new("cookbooker-no-such-program");
        let result = assembler
            .assemble(&[PathBuf::from("1.jpg")], &metadata(), Path::new("out.pdf"))
            .await;
        assert!(matches!(
            result,
            Err(AssembleError::Spawn { ref program, .. }) if program == "cookbooker-no-such-program"
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_is_command_failed() {
        let recognizer = OcrMyPdfRecognizer::new("false");
        let result = recognizer
            .recognize(Path::new("in.pdf"), Path::new("out.pdf"))
            .await;
        assert!(matches!(result, Err(AssembleError::CommandFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_succeeding_program_is_ok() {
        let recognizer = OcrMyPdfRecognizer::new("true");
        recognizer
            .recognize(Path::new("in.pdf"), Path::new("out.pdf"))
            .await
            .unwrap();
    }
}
