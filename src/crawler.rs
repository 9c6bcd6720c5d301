//! The crawl-run object and its structured concurrency primitive.
//!
//! A [`Crawler`] is created per council. It owns the run's [`CallHistory`]
//! and counters, and borrows the process-wide concurrency limiter and HTTP
//! transport. The page walkers in [`crate::scrapers`] and the downloader in
//! [`crate::outputs`] are implemented as methods on it.
//!
//! # Concurrency model
//!
//! All work of a council runs inside one future. Each table walk collects its
//! children (downloads and nested page parses) into a [`TaskGroup`] and awaits
//! the whole group before returning, so no child outlives the call that
//! spawned it. Children are interleaved on the current task rather than run in
//! parallel: the bottleneck is the network, not the CPU. Network admission is
//! bounded by a single semaphore shared by every page fetch and download.

use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{info, instrument};

use crate::config::Settings;
use crate::error::{FetchError, NamingCollision};
use crate::models::BreadCrumb;
use crate::outputs::CallHistory;
use crate::transport::Transport;

/// A monotonically increasing event count.
#[derive(Debug, Default)]
pub struct Counter(AtomicUsize);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters reported at the end of each council.
#[derive(Debug, Default)]
pub struct RunStats {
    pub pages: Counter,
    pub saved: Counter,
    pub skipped: Counter,
    pub failed: Counter,
    pub planned: Counter,
    pub page_errors: Counter,
}

/// A scoped group of child tasks.
///
/// [`TaskGroup::join`] drives every child to completion. A child that fails
/// with a [`NamingCollision`] ends the group immediately and the error is
/// returned; every other failure is handled inside the child itself.
pub struct TaskGroup<'a> {
    tasks: FuturesUnordered<LocalBoxFuture<'a, Result<(), NamingCollision>>>,
}

impl<'a> TaskGroup<'a> {
    pub fn new() -> Self {
        Self {
            tasks: FuturesUnordered::new(),
        }
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<(), NamingCollision>> + 'a,
    {
        self.tasks.push(task.boxed_local());
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every child. Returns the first fatal error, if any.
    pub async fn join(mut self) -> Result<(), NamingCollision> {
        while let Some(result) = self.tasks.next().await {
            result?;
        }
        Ok(())
    }
}

/// State of one council's harvest.
pub struct Crawler<T> {
    pub(crate) settings: Settings,
    pub(crate) transport: T,
    pub(crate) limiter: Arc<Semaphore>,
    pub(crate) history: CallHistory,
    pub(crate) stats: RunStats,
}

impl<T: Transport> Crawler<T> {
    pub fn new(settings: Settings, transport: T, limiter: Arc<Semaphore>) -> Self {
        Self {
            settings,
            transport,
            limiter,
            history: CallHistory::default(),
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Archive path for `crumb` followed by `tail`.
    pub fn store_path(&self, crumb: &BreadCrumb, tail: &[&str]) -> PathBuf {
        crumb.path_under(&self.settings.store_root, tail)
    }

    /// GET a page under the shared concurrency limit.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let _permit = self.limiter.acquire().await?;
        info!(%url, "Fetching page");
        let body = self.transport.get_text(url).await?;
        self.stats.pages.bump();
        info!(%url, bytes = body.len(), "Fetched page");
        Ok(body)
    }

    /// Log the counters gathered so far.
    pub fn log_summary(&self, council: &str) {
        let s = &self.stats;
        info!(
            council,
            pages = s.pages.get(),
            saved = s.saved.get(),
            skipped = s.skipped.get(),
            failed = s.failed.get(),
            planned = s.planned.get(),
            page_errors = s.page_errors.get(),
            targets = self.history.len(),
            "Council harvest finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransport;
    use std::cell::RefCell;
    use std::path::Path;

    #[tokio::test]
    async fn test_task_group_waits_for_every_child() {
        let done = RefCell::new(Vec::new());
        let mut group = TaskGroup::new();
        for i in 0..3u64 {
            let done = &done;
            group.spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(10 * (3 - i))).await;
                done.borrow_mut().push(i);
                Ok(())
            });
        }
        assert_eq!(group.len(), 3);
        group.join().await.unwrap();
        let mut seen = done.into_inner();
        seen.sort();
        assert_eq!(seen, [0, 1, 2]);
    }

    #[tokio::test]
    async fn test_task_group_stops_on_collision() {
        let mut group = TaskGroup::new();
        group.spawn(async { Ok(()) });
        group.spawn(async {
            Err(NamingCollision {
                path: PathBuf::from("x"),
                first: "a".into(),
                second: "b".into(),
            })
        });
        assert!(group.join().await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_page_counts_pages() {
        let transport = FakeTransport::default().with_page("https://h/a.php", "<html></html>");
        let crawler = Crawler::new(Settings::default(), transport, Arc::new(Semaphore::new(1)));
        let body = crawler.fetch_page("https://h/a.php").await.unwrap();
        assert_eq!(body, "<html></html>");
        assert!(crawler.fetch_page("https://h/missing.php").await.is_err());
        assert_eq!(crawler.stats().pages.get(), 1);
    }

    #[test]
    fn test_counters_are_independent() {
        let stats = RunStats::default();
        stats.saved.bump();
        stats.saved.bump();
        stats.failed.bump();
        assert_eq!(stats.saved.get(), 2);
        assert_eq!(stats.failed.get(), 1);
        assert_eq!(stats.skipped.get(), 0);
    }

    #[test]
    fn test_store_path_uses_settings_root() {
        let settings = Settings {
            store_root: PathBuf::from("/archive"),
            ..Settings::default()
        };
        let crawler = Crawler::new(settings, FakeTransport::default(), Arc::new(Semaphore::new(1)));
        let crumb = BreadCrumb::new(["central", "council"]);
        assert_eq!(
            crawler.store_path(&crumb, &["20160105"]),
            Path::new("/archive/central/council/20160105")
        );
    }
}
