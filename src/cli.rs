//! Command-line interface definitions for the meeting archiver.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option is optional: values given here override the settings file,
//! which overrides the built-in defaults (see [`crate::config::Settings`]).

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the meeting archiver.
///
/// # Examples
///
/// ```sh
/// # Harvest every council into ./data
/// dc_meeting_archive
///
/// # Two councils, with audio recordings, into a custom store
/// dc_meeting_archive --council central --council wc --recordings -s /srv/dc
///
/// # Show what would be downloaded
/// dc_meeting_archive --dry-run --council south
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root directory of the archive
    #[arg(short, long, env = "DC_ARCHIVE_STORE")]
    pub store: Option<PathBuf>,

    /// Log intended downloads without touching the network or the archive
    #[arg(long)]
    pub dry_run: bool,

    /// Also download audio recordings
    #[arg(long)]
    pub recordings: bool,

    /// Maximum number of concurrent page fetches and downloads
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Attempts per HTTP request
    #[arg(long)]
    pub retries: Option<usize>,

    /// Scheme and host of the council sites
    #[arg(long)]
    pub site_root: Option<String>,

    /// Language path segment of the council sites
    #[arg(long)]
    pub language: Option<String>,

    /// Council to harvest; repeat to harvest several, in order
    #[arg(long = "council", value_name = "ID")]
    pub councils: Vec<String>,
}
