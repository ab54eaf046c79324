//! CLI entry point for the cookbooker tool.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cookbooker_core::RunConfig;
use cookbooker_core::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use tracing::{debug, error, info};

mod app;
mod app_config;
mod cli;

use app::HttpTimeouts;
use cli::Args;

/// Process outcome mapped to an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything requested was done.
    Success,
    /// Some pages are missing.
    Partial,
    /// Nothing usable was produced.
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Failure => ExitCode::from(1),
            ProcessExit::Partial => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!("{e:#}");
            ProcessExit::Failure.into()
        }
    }
}

async fn run(args: Args) -> Result<ProcessExit> {
    let file_config = app_config::load_default_file_config()?;
    let mut config = build_run_config(&args, &file_config);

    if args.interactive {
        prompt_interactively(&mut config)?;
    }
    if config.missing_download_input() {
        println!("URL and Pages required for downloading, entering interactive parsing.");
        prompt_interactively(&mut config)?;
        if config.missing_download_input() {
            println!("Still missing URL or Pages, exiting...");
            return Ok(ProcessExit::Success);
        }
    }

    info!("Cookbooker starting");

    let timeouts = HttpTimeouts {
        connect_secs: file_config
            .connect_timeout_secs
            .unwrap_or(CONNECT_TIMEOUT_SECS),
        read_secs: file_config.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
    };
    let show_progress = !args.quiet && io::stderr().is_terminal();
    app::run(&config, timeouts, show_progress).await
}

/// File defaults first, then command-line flags on top.
fn build_run_config(args: &Args, file_config: &app_config::FileConfig) -> RunConfig {
    let mut config = RunConfig::default();
    file_config.apply_to(&mut config);

    if let Some(url) = &args.url {
        config.set_url(url.as_str());
    }
    if let Some(pages) = args.pages {
        config.set_pages(pages);
    }
    if let Some(author) = &args.author {
        config.set_author(author.as_str());
    }
    if let Some(title) = &args.title {
        config.set_title(title.as_str());
    }
    if let Some(dir) = &args.work_dir {
        config.set_work_dir(dir.clone());
    }
    if let Some(concurrency) = args.concurrency {
        config.set_concurrency(usize::from(concurrency));
    }
    if let Some(max_attempts) = args.max_attempts {
        config.set_max_attempts(max_attempts);
    }
    config.set_download(!args.no_download);
    config.set_pdf(args.pdf);
    config.set_ocr(args.ocr);
    config
}

fn prompt_interactively(config: &mut RunConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    app::prompt::prompt_config(config, &mut input, &mut output)?;
    Ok(())
}
