//! Page walkers for the council meeting sites.
//!
//! Each walker fetches one page, extracts its table rows and dispatches the
//! links it finds, either to the downloader or to the walker for the page
//! they point at:
//!
//! | Page | Module | Dispatches to |
//! |------|--------|---------------|
//! | Council / committee / work group landing | [`meetings`] | [`table`] |
//! | Meeting table | [`table`] | downloads, [`docsets`], [`recordings`] |
//! | Doc-set page | [`docsets`] | downloads |
//! | Recordings page | [`recordings`] | downloads |
//!
//! # Failure policy
//!
//! A page that cannot be fetched or does not have the expected shape is
//! logged with its URL and skipped; siblings carry on. Only a
//! [`NamingCollision`] travels back up, ending the council's harvest.

pub mod docsets;
pub mod meetings;
pub mod recordings;
pub mod table;

use tracing::error;

use crate::crawler::Crawler;
use crate::error::{NamingCollision, PageError};
use crate::models::{BreadCrumb, TableRow, TableShape};
use crate::transport::Transport;

impl<T: Transport> Crawler<T> {
    /// Log a page-level failure; the caller skips the page.
    pub(crate) fn report_page(&self, url: &str, context: &str, err: &PageError) {
        error!(%url, context, error = %err, "Page skipped");
        self.stats.page_errors.bump();
    }

    /// Detect the table shape from its rows and walk it, or report and skip.
    pub(crate) async fn walk_rows(
        &self,
        crumb: &BreadCrumb,
        page_url: &str,
        rows: Vec<TableRow>,
    ) -> Result<(), NamingCollision> {
        match TableShape::detect(&rows) {
            Ok(shape) => self.walk_table(crumb, page_url, &rows, shape).await,
            Err(e) => {
                self.report_page(page_url, &crumb.to_string(), &e.into());
                Ok(())
            }
        }
    }
}
