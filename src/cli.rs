//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Import Zotero libraries and BibTeX files into a folder-per-document library.
///
/// Reads the Zotero SQLite database read-only; nothing in the Zotero data
/// directory is modified.
#[derive(Parser, Debug)]
#[command(name = "zotero-import")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract every item of a Zotero data directory
    Zotero(ZoteroArgs),
    /// Import the entries of a BibTeX file
    Bibtex(BibtexArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ZoteroArgs {
    /// Zotero data directory (the folder holding zotero.sqlite)
    #[arg(short, long, value_name = "DIR")]
    pub library: PathBuf,

    /// Destination library directory (defaults to `library_dir` from config)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Base directory for `attachments:` relative paths (defaults to --library)
    #[arg(short, long, value_name = "DIR")]
    pub attachments: Option<PathBuf>,

    /// Symlink attachment files instead of copying them
    #[arg(long)]
    pub link: bool,

    /// Print each record as a JSON line instead of writing the library
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ClapArgs, Debug)]
pub struct BibtexArgs {
    /// BibTeX file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Destination library directory (defaults to `library_dir` from config)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Symlink files instead of copying them
    #[arg(long)]
    pub link: bool,

    /// Print each entry as a JSON line instead of writing the library
    #[arg(long)]
    pub dry_run: bool,
}
