//! CLI entry point for zotero-import.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};
use zotero_import::config::{FileConfig, load_config};
use zotero_import::{
    BibtexImportOptions, DocumentLibrary, DryRunLibrary, ExtractOptions, FolderLibrary,
    ImportReport, ItemStatus, extract, import_bibtex,
};

mod cli;
mod progress;

use cli::{Args, BibtexArgs, Command, ZoteroArgs};
use progress::ProgressReporter;

#[tokio::main]
async fn main() -> Result<()> {
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

    // Logs go to stderr; stdout is reserved for --dry-run records.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_config(args.config.as_deref())?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "Config loaded");
    }

    let progress = ProgressReporter::new(!args.quiet && io::stderr().is_terminal());
    let report = match args.command {
        Command::Zotero(zotero) => run_zotero(zotero, &loaded.config, &progress).await?,
        Command::Bibtex(bibtex) => run_bibtex(bibtex, &loaded.config, &progress).await?,
    };

    report_outcome(&report);
    Ok(())
}

async fn run_zotero(
    args: ZoteroArgs,
    config: &FileConfig,
    progress: &ProgressReporter,
) -> Result<ImportReport> {
    let destination = resolve_destination(args.out, config, args.dry_run)?;
    let options = ExtractOptions {
        library_root: args.library,
        destination: destination.clone(),
        attachments_dir: args.attachments,
        link: args.link || config.link(),
        time_format: config.time_format().to_string(),
        default_subfolder: config.default_subfolder().to_string(),
        author_separator: config.author_separator().to_string(),
    };

    let library = open_library(destination, args.dry_run);
    Ok(extract(options, library.as_ref(), progress).await?)
}

async fn run_bibtex(
    args: BibtexArgs,
    config: &FileConfig,
    progress: &ProgressReporter,
) -> Result<ImportReport> {
    let destination = resolve_destination(args.out, config, args.dry_run)?;
    if !args.dry_run && !destination.is_dir() {
        bail!(
            "destination library not found: {}\n  Suggestion: Create the directory first or pass an existing one with --out",
            destination.display()
        );
    }

    let options = BibtexImportOptions {
        bib_file: args.file,
        link: args.link || config.link(),
        author_separator: config.author_separator().to_string(),
    };

    let library = open_library(destination, args.dry_run);
    Ok(import_bibtex(&options, library.as_ref(), progress).await?)
}

fn resolve_destination(out: Option<PathBuf>, config: &FileConfig, dry_run: bool) -> Result<PathBuf> {
    if let Some(path) = out.or_else(|| config.library_dir.clone()) {
        return Ok(path);
    }
    if dry_run {
        return Ok(PathBuf::from("."));
    }
    bail!("No destination library given\n  Suggestion: Pass --out <DIR> or set `library_dir` in the config file")
}

fn open_library(destination: PathBuf, dry_run: bool) -> Box<dyn DocumentLibrary> {
    if dry_run {
        Box::new(DryRunLibrary::new(io::stdout()))
    } else {
        Box::new(FolderLibrary::new(destination))
    }
}

fn report_outcome(report: &ImportReport) {
    for item in report.items() {
        if let ItemStatus::Failed { reason } = &item.status {
            warn!(key = %item.key, %reason, "Item not imported");
        }
    }
    info!("{}", report.summary());
}
