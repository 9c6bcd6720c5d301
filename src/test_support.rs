//! In-memory [`Transport`] for tests.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::FetchError;
use crate::transport::{BodyMode, Transport};

/// Serves canned bodies and records every URL requested.
///
/// Clones share the request log, so a test can keep a handle while a
/// crawler owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    pages: HashMap<String, Vec<u8>>,
    /// Bodies that are cut off with an error after the given bytes.
    broken: HashMap<String, Vec<u8>>,
    calls: Arc<Mutex<Vec<(String, Option<BodyMode>)>>>,
}

impl FakeTransport {
    pub fn with_page(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub fn with_broken(mut self, url: &str, partial: impl Into<Vec<u8>>) -> Self {
        self.broken.insert(url.to_string(), partial.into());
        self
    }

    fn record(&self, url: &str, mode: Option<BodyMode>) {
        self.calls.lock().unwrap().push((url.to_string(), mode));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(u, _)| u == url).count()
    }

    /// Body modes of the downloads requested so far.
    pub fn modes(&self) -> Vec<BodyMode> {
        self.calls.lock().unwrap().iter().filter_map(|(_, m)| *m).collect()
    }

    fn not_found(url: &str) -> FetchError {
        FetchError::Status {
            url: url.to_string(),
            status: 404,
        }
    }
}

impl Transport for FakeTransport {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.record(url, None);
        tokio::task::yield_now().await;
        self.pages
            .get(url)
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .ok_or_else(|| Self::not_found(url))
    }

    async fn get_into<W>(&self, url: &str, mode: BodyMode, out: &mut W) -> Result<u64, FetchError>
    where
        W: AsyncWrite + Unpin,
    {
        self.record(url, Some(mode));
        if let Some(partial) = self.broken.get(url) {
            out.write_all(partial).await?;
            return Err(FetchError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "stream interrupted",
            )));
        }
        let body = self.pages.get(url).ok_or_else(|| Self::not_found(url))?;
        for chunk in body.chunks(4) {
            out.write_all(chunk).await?;
            tokio::task::yield_now().await;
        }
        out.flush().await?;
        Ok(body.len() as u64)
    }
}
