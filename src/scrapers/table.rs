//! The generic meeting-table walker.

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::crawler::{Crawler, TaskGroup};
use crate::dates;
use crate::error::NamingCollision;
use crate::models::{BreadCrumb, DocumentRole, DownloadTask, Link, MeetingRow, TableRow, TableShape};
use crate::transport::Transport;
use crate::urls::{self, extract_links};
use crate::utils::sanitize_or;

/// Links an undated continuation row points at.
///
/// Circulated papers normally sit in the doc-set column; some tables put them
/// under minutes instead, so that column is used when the doc-set one is empty.
fn continuation_links(meeting: &MeetingRow, page_url: &str) -> Vec<Link> {
    let mut links = extract_links(&meeting.doc_set, page_url);
    if links.is_empty() {
        links = extract_links(&meeting.minutes, page_url);
    }
    links.into_iter().unique_by(|l| l.url.clone()).collect()
}

/// File name for a directly linked document: the URL's last segment.
fn document_leaf(link: &Link) -> String {
    match urls::split(&link.url).leaf {
        "" => sanitize_or(&link.label, "NoLabel"),
        leaf => leaf.to_string(),
    }
}

impl<T: Transport> Crawler<T> {
    /// Dispatch every link of a meeting table and wait for all of them.
    ///
    /// Each row goes under `crumb/{date key}`. Agenda and minutes links are
    /// downloaded to `agenda/` and `minutes/`; recording pages (when enabled)
    /// and doc-set pages are parsed in turn. Undated continuation rows only
    /// lead to doc-set pages.
    #[instrument(level = "info", skip_all, fields(crumb = %crumb, rows = rows.len(), ?shape))]
    pub async fn walk_table(
        &self,
        crumb: &BreadCrumb,
        page_url: &str,
        rows: &[TableRow],
        shape: TableShape,
    ) -> Result<(), NamingCollision> {
        let meetings: Vec<MeetingRow> = rows.iter().map(|row| shape.project(row)).collect();
        let keys = dates::normalize(meetings.iter().map(|m| m.date.text.as_str()));

        let mut group = TaskGroup::new();
        for (meeting, key) in meetings.iter().zip(keys) {
            let row_crumb = crumb.child(key.to_string());

            if key.is_inter_meeting() {
                for link in continuation_links(meeting, page_url) {
                    group.spawn(self.parse_doc_set(row_crumb.clone(), link.url));
                }
                continue;
            }

            for role in [DocumentRole::Agenda, DocumentRole::Minutes] {
                for link in extract_links(meeting.document(role), page_url) {
                    let leaf = document_leaf(&link);
                    let target = self.store_path(&row_crumb, &[role.dir_name(), &leaf]);
                    let task = DownloadTask::new(target, link.url);
                    group.spawn(async move { self.download(task).await.map(drop) });
                }
            }

            if let Some(recording) = meeting.recording.as_ref().filter(|_| self.settings.save_recordings) {
                for link in extract_links(recording, page_url) {
                    group.spawn(self.parse_recordings(row_crumb.clone(), link.url));
                }
            }

            for link in extract_links(&meeting.doc_set, page_url) {
                group.spawn(self.parse_doc_set(row_crumb.clone(), link.url));
            }
        }

        debug!(tasks = group.len(), "Table dispatched");
        group.join().await
    }
}
