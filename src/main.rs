//! # DC Meeting Archive
//!
//! Mirrors the meeting records published on the Hong Kong District Council
//! sites into a local directory tree: agendas, minutes, discussion papers and,
//! optionally, audio recordings.
//!
//! ## Usage
//!
//! ```sh
//! dc_meeting_archive -s ./data --council central --recordings
//! ```
//!
//! ## Architecture
//!
//! Councils are harvested one after another. For each council:
//! 1. **Landing pages**: council, committee and work group meeting tables
//! 2. **Meeting tables**: one directory per meeting, keyed by its date
//! 3. **Linked pages**: doc-set and recordings pages reached from the tables
//! 4. **Downloads**: every document written atomically under the store root
//!
//! Page fetches and downloads of the whole run share one concurrency limit.
//! A run can be stopped and restarted; files already archived are skipped.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod crawler;
mod dates;
mod error;
mod html;
mod models;
mod outputs;
mod scrapers;
#[cfg(test)]
mod test_support;
mod transport;
mod urls;
mod utils;

use cli::Cli;
use config::Settings;
use crawler::Crawler;
use transport::HttpTransport;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("dc_meeting_archive starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = Settings::resolve(&args)?;
    info!(
        store = %settings.store_root.display(),
        councils = settings.councils.len(),
        concurrency = settings.concurrency,
        dry_run = settings.dry_run,
        recordings = settings.save_recordings,
        "Settings resolved"
    );

    if !settings.dry_run {
        if let Err(e) = ensure_writable_dir(&settings.store_root).await {
            error!(
                path = %settings.store_root.display(),
                error = %e,
                "Archive directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let transport = HttpTransport::new(settings.retries)?;
    let limiter = Arc::new(Semaphore::new(settings.concurrency));

    for council in &settings.councils {
        let crawler = Crawler::new(settings.clone(), transport.clone(), Arc::clone(&limiter));
        if let Err(e) = crawler.crawl_council(council).await {
            error!(%council, error = %e, "Naming collision; stopping");
            return Err(e.into());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
