//! Landing pages: council meetings, committees and work groups.
//!
//! A council's harvest visits its three landing pages one after another.
//! The council page keeps one table per year; the committee and work group
//! pages keep one collapsible block of tables per committee or work group.

use tracing::{info, instrument};

use crate::crawler::{Crawler, TaskGroup};
use crate::error::{NamingCollision, PageError};
use crate::html;
use crate::models::BreadCrumb;
use crate::transport::Transport;
use crate::utils::sanitize_or;

/// The three kinds of meeting landing page of a council.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingKind {
    Council,
    Committee,
    WorkGroup,
}

impl MeetingKind {
    pub const ALL: [MeetingKind; 3] = [MeetingKind::Council, MeetingKind::Committee, MeetingKind::WorkGroup];

    /// Breadcrumb segment below the council.
    pub fn segment(self) -> &'static str {
        match self {
            MeetingKind::Council => "council",
            MeetingKind::Committee => "committee",
            MeetingKind::WorkGroup => "workgroup",
        }
    }

    /// Landing page path below `{council}/{language}/meetings/`.
    pub fn page(self) -> &'static str {
        match self {
            MeetingKind::Council => "dcmeetings/dc_meetings.php",
            MeetingKind::Committee => "committees/committee_meetings.php",
            MeetingKind::WorkGroup => "working_group/workgroup_meetings.php",
        }
    }
}

impl<T: Transport> Crawler<T> {
    /// Harvest one council: council, committee and work group pages in turn.
    #[instrument(level = "info", skip(self))]
    pub async fn crawl_council(&self, council: &str) -> Result<(), NamingCollision> {
        for kind in MeetingKind::ALL {
            let url = self.settings.landing_url(council, kind.page());
            let crumb = BreadCrumb::new([council, kind.segment()]);
            info!(%url, kind = kind.segment(), "Crawling landing page");
            match kind {
                MeetingKind::Council => self.crawl_council_meetings(crumb, &url).await?,
                MeetingKind::Committee => self.crawl_committee_meetings(crumb, &url).await?,
                MeetingKind::WorkGroup => self.crawl_work_group_meetings(crumb, &url).await?,
            }
        }
        self.log_summary(council);
        Ok(())
    }

    /// Walk the per-year tables of a council meetings page as one table.
    #[instrument(level = "info", skip(self, crumb))]
    pub async fn crawl_council_meetings(&self, crumb: BreadCrumb, url: &str) -> Result<(), NamingCollision> {
        let body = match self.fetch_page(url).await {
            Ok(body) => body,
            Err(e) => {
                self.report_page(url, "council meetings", &PageError::from(e));
                return Ok(());
            }
        };
        let rows = html::year_table_rows(&body);
        self.walk_rows(&crumb, url, rows).await
    }

    #[instrument(level = "info", skip(self, crumb))]
    pub async fn crawl_committee_meetings(&self, crumb: BreadCrumb, url: &str) -> Result<(), NamingCollision> {
        self.crawl_sections(crumb, url).await
    }

    #[instrument(level = "info", skip(self, crumb))]
    pub async fn crawl_work_group_meetings(&self, crumb: BreadCrumb, url: &str) -> Result<(), NamingCollision> {
        self.crawl_sections(crumb, url).await
    }

    /// Walk every collapsible section of a landing page concurrently, each
    /// under its own sanitised name.
    async fn crawl_sections(&self, crumb: BreadCrumb, url: &str) -> Result<(), NamingCollision> {
        let body = match self.fetch_page(url).await {
            Ok(body) => body,
            Err(e) => {
                self.report_page(url, &crumb.to_string(), &PageError::from(e));
                return Ok(());
            }
        };
        let sections = html::collapsible_sections(&body);
        info!(%url, sections = sections.len(), "Found sections");

        let mut group = TaskGroup::new();
        for (idx, section) in sections.into_iter().enumerate() {
            let name = sanitize_or(&section.name, &format!("unnamed{:02}", idx + 1));
            let child = crumb.child(name);
            match section.rows {
                Ok(rows) => group.spawn(async move { self.walk_rows(&child, url, rows).await }),
                Err(e) => self.report_page(url, &child.to_string(), &e.into()),
            }
        }
        group.join().await
    }
}
