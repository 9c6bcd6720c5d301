//! Recordings pages: the audio of one meeting, one file per row.

use tracing::{debug, instrument};

use crate::crawler::{Crawler, TaskGroup};
use crate::error::{NamingCollision, PageError};
use crate::html;
use crate::models::{BreadCrumb, DownloadTask, Link, TableRow};
use crate::transport::Transport;
use crate::urls::{self, extract_links};
use crate::utils::sanitize_or;

/// Column of a recordings row that holds the audio link.
const AUDIO_COLUMN: usize = 1;

/// `{NN}_{label}{ext}` with a 1-based row number.
pub fn recording_file_name(index: usize, link: &Link) -> String {
    format!(
        "{:02}_{}{}",
        index + 1,
        sanitize_or(&link.label, "NoLabel"),
        urls::extension(&link.url)
    )
}

impl<T: Transport> Crawler<T> {
    async fn load_recordings(&self, url: &str) -> Result<Vec<TableRow>, PageError> {
        let body = self.fetch_page(url).await?;
        Ok(html::recording_rows(&body)?)
    }

    /// Download the first audio link of every row under `crumb/recordings/`.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn parse_recordings(&self, crumb: BreadCrumb, url: String) -> Result<(), NamingCollision> {
        let crumb = crumb.child("recordings");
        let rows = match self.load_recordings(&url).await {
            Ok(rows) => rows,
            Err(e) => {
                self.report_page(&url, "recordings", &e);
                return Ok(());
            }
        };

        let mut group = TaskGroup::new();
        for (idx, row) in rows.iter().enumerate() {
            let Some(link) = extract_links(row.cell(AUDIO_COLUMN), &url).into_iter().next() else {
                continue;
            };
            let name = recording_file_name(idx, &link);
            let task = DownloadTask::new(self.store_path(&crumb, &[name.as_str()]), link.url);
            group.spawn(async move { self.download(task).await.map(drop) });
        }
        debug!(rows = rows.len(), tasks = group.len(), "Recordings dispatched");
        group.join().await
    }
}
