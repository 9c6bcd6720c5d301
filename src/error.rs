//! Error types for fetching, page parsing, naming and configuration.
//!
//! Only [`NamingCollision`] is fatal to a run. Every other error is caught at
//! the boundary of the operation that produced it (one page or one download),
//! logged with the URL and intended target, and turned into a skip.

use std::path::PathBuf;

/// Failures while talking to the remote site or writing the response locally.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client failed (connect, TLS, body decode, ...).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// Local file I/O failed while persisting a body.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The global concurrency limiter was closed.
    #[error("concurrency limiter closed")]
    LimiterClosed(#[from] tokio::sync::AcquireError),
}

/// A page did not have the shape the crawler expects.
///
/// These are reported and the affected sub-tree is skipped; siblings carry on.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    #[error("expected {expected} table(s), found {found}")]
    TableCount { expected: usize, found: usize },

    #[error("unexpected column count {0} (expected 6 or 7)")]
    ColumnCount(usize),

    #[error("anchor '{0}' not found")]
    AnchorNotFound(String),

    #[error("no table after anchor '{0}'")]
    TableNotFound(String),

    #[error("collapsible target '{0}' not found")]
    SectionNotFound(String),

    #[error("table has no data rows")]
    Empty,
}

/// Failure of one page-level step (fetch and parse of a single page).
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Two download tasks claimed the same target path with different sources.
///
/// This means the breadcrumb naming scheme produced an unsafe duplicate, so the
/// run is halted rather than letting one file silently overwrite another.
#[derive(Debug, thiserror::Error)]
#[error("naming collision at {}: claimed by {first} and {second}", path.display())]
pub struct NamingCollision {
    pub path: PathBuf,
    pub first: String,
    pub second: String,
}

/// Problems loading or validating the run settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_message_names_both_sources() {
        let err = NamingCollision {
            path: PathBuf::from("data/central/council/20160105/agenda/a.pdf"),
            first: "https://a/1.pdf".to_string(),
            second: "https://a/2.pdf".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("agenda/a.pdf"));
        assert!(msg.contains("https://a/1.pdf"));
        assert!(msg.contains("https://a/2.pdf"));
    }

    #[test]
    fn test_page_error_is_transparent() {
        let err = PageError::from(StructureError::ColumnCount(5));
        assert_eq!(err.to_string(), "unexpected column count 5 (expected 6 or 7)");
    }
}
