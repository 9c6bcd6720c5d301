//! Doc-set pages: the papers discussed at one meeting.
//!
//! A doc-set page lists one paper per row: an identifier followed by three
//! link columns (main documents, annexes, remarks). A URL fragment selects
//! the table following the matching `<a name>` on pages that hold the papers
//! of several meetings.

use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::crawler::{Crawler, TaskGroup};
use crate::error::{NamingCollision, PageError};
use crate::html;
use crate::models::{BreadCrumb, DocSetColumn, DownloadTask, Link, TableRow};
use crate::transport::Transport;
use crate::urls::{self, extract_links};
use crate::utils::sanitize_or;

/// File names for the links of one doc-set column, in order.
///
/// Names are the sanitised label plus the URL's extension. A name seen
/// earlier in the same list gets `_{n}` before its extension, `n` being its
/// occurrence count.
pub fn doc_set_file_names(links: &[Link]) -> Vec<String> {
    let mut uses: HashMap<String, usize> = HashMap::new();
    links
        .iter()
        .map(|link| {
            let stem = sanitize_or(&link.label, "NoLabel");
            let ext = urls::extension(&link.url);
            let name = format!("{stem}{ext}");
            let count = uses.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name
            } else {
                format!("{stem}_{count}{ext}")
            }
        })
        .collect()
}

/// Directory name of a doc-set row: 1-based index plus sanitised identifier.
pub fn doc_id(index: usize, row: &TableRow) -> String {
    format!("{:02}_{}", index + 1, sanitize_or(&row.cell(0).text, "NoID"))
}

impl<T: Transport> Crawler<T> {
    async fn load_doc_set(&self, url: &str) -> Result<Vec<TableRow>, PageError> {
        let body = self.fetch_page(url).await?;
        let anchor = urls::fragment(url).filter(|f| !f.is_empty());
        Ok(html::doc_set_rows(&body, anchor)?)
    }

    /// Download every paper of a doc-set page under `crumb/docSets/`.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn parse_doc_set(&self, crumb: BreadCrumb, url: String) -> Result<(), NamingCollision> {
        let crumb = crumb.child("docSets");
        let rows = match self.load_doc_set(&url).await {
            Ok(rows) => rows,
            Err(e) => {
                self.report_page(&url, "doc set", &e);
                return Ok(());
            }
        };

        let mut group = TaskGroup::new();
        for (idx, row) in rows.iter().enumerate() {
            let id = doc_id(idx, row);
            for column in DocSetColumn::ALL {
                let links = extract_links(row.cell(column.index()), &url);
                let names = doc_set_file_names(&links);
                for (link, name) in links.into_iter().zip(names) {
                    let target = self.store_path(&crumb, &[id.as_str(), column.dir_name(), name.as_str()]);
                    let task = DownloadTask::new(target, link.url);
                    group.spawn(async move { self.download(task).await.map(drop) });
                }
            }
        }
        debug!(rows = rows.len(), tasks = group.len(), "Doc set dispatched");
        group.join().await
    }
}
