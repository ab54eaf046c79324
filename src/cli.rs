//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch the page images of a scanned book and rebuild it in page order.
///
/// Cookbooker downloads every page of a book from an image server, keeps
/// the pages in order regardless of which finished first, and can assemble
/// them into a PDF with an optional OCR pass.
#[derive(Parser, Debug)]
#[command(name = "cookbooker")]
#[command(author, version, about)]
pub struct Args {
    /// URL of any page image; its page token is rewritten for every page
    #[arg(short = 'u', long)]
    pub url: Option<String>,

    /// Number of pages to fetch
    #[arg(short = 'n', long)]
    pub pages: Option<u32>,

    /// Name of the author
    #[arg(short = 'a', long)]
    pub author: Option<String>,

    /// Title of the book
    #[arg(short = 't', long)]
    pub title: Option<String>,

    /// Don't download images; reuse previously downloaded ones
    #[arg(short = 'd', long = "nodownload")]
    pub no_download: bool,

    /// Assemble the ordered pages into a PDF
    #[arg(short = 'p', long)]
    pub pdf: bool,

    /// Run OCR on the assembled PDF
    #[arg(short = 'o', long)]
    pub ocr: bool,

    /// Review and edit every setting interactively before running
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// Directory holding tmp/ (page images) and pdf/ (documents)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Maximum concurrent page fetches (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Maximum attempts per page, including the first (1-50)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub max_attempts: Option<u32>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["cookbooker"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.url.is_none());
        assert!(args.pages.is_none());
        assert!(!args.no_download);
        assert!(!args.pdf);
        assert!(!args.ocr);
        assert!(!args.interactive);
        assert!(args.concurrency.is_none());
    }

    #[test]
    fn test_cli_short_flags_match_long_flags() {
        let args = Args::try_parse_from([
            "cookbooker",
            "-u",
            "https://babel.hathitrust.org/cgi/imgsrv/image?id=x;seq=7",
            "-n",
            "60",
            "-a",
            "Thomas M. Hilliard",
            "-t",
            "The Art of Carving",
            "-d",
            "-p",
            "-o",
            "-i",
        ])
        .unwrap();
        assert_eq!(args.pages, Some(60));
        assert_eq!(args.author.as_deref(), Some("Thomas M. Hilliard"));
        assert_eq!(args.title.as_deref(), Some("The Art of Carving"));
        assert!(args.no_download);
        assert!(args.pdf);
        assert!(args.ocr);
        assert!(args.interactive);
    }

    #[test]
    fn test_cli_nodownload_long_flag() {
        let args = Args::try_parse_from(["cookbooker", "--nodownload"]).unwrap();
        assert!(args.no_download);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["cookbooker", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_concurrency_range() {
        let args = Args::try_parse_from(["cookbooker", "-c", "100"]).unwrap();
        assert_eq!(args.concurrency, Some(100));

        let result = Args::try_parse_from(["cookbooker", "-c", "0"]);
        assert!(result.is_err());
        let result = Args::try_parse_from(["cookbooker", "-c", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_max_attempts_range() {
        let args = Args::try_parse_from(["cookbooker", "-r", "3"]).unwrap();
        assert_eq!(args.max_attempts, Some(3));

        let result = Args::try_parse_from(["cookbooker", "-r", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_pages_rejects_text() {
        let result = Args::try_parse_from(["cookbooker", "-n", "many"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["cookbooker", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["cookbooker", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
