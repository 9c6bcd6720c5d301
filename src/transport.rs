//! HTTP access with bounded retries and exponential backoff.
//!
//! # Architecture
//!
//! - [`Transport`]: the seam between the crawler and the network
//! - [`HttpTransport`]: `reqwest`-backed implementation used by the binary
//!
//! # Retry Strategy
//!
//! - Each GET is attempted at most `max_attempts` times (3 by default)
//! - Connection errors and 5xx answers are retried, 4xx answers are not
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay
//!
//! Only obtaining the response is retried. Once body bytes have been handed to
//! the writer a failure is final, so a retry never appends to a half-written
//! file.

use rand::{Rng, rng};
use reqwest::{Client, Response};
use std::time::{Duration as StdDuration, Instant};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::sleep;
use tracing::{instrument, warn};

use crate::error::FetchError;

/// How a response body is moved into its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Read the whole body, then write it once. Used for HTML documents.
    Buffered,
    /// Write chunk by chunk as they arrive, bounding memory for large files.
    Streamed,
}

impl BodyMode {
    /// `.html`/`.htm` targets are buffered, everything else is streamed.
    pub fn for_extension(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case(".html") || ext.eq_ignore_ascii_case(".htm") {
            BodyMode::Buffered
        } else {
            BodyMode::Streamed
        }
    }
}

/// Async access to remote resources.
///
/// Implementors perform plain GETs; admission control and logging are the
/// caller's business.
pub trait Transport {
    /// Fetch `url` and return its body as text.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch `url` and write its body to `out`, returning the byte count.
    async fn get_into<W>(&self, url: &str, mode: BodyMode, out: &mut W) -> Result<u64, FetchError>
    where
        W: AsyncWrite + Unpin;
}

/// [`Transport`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    /// Total attempts per request, including the first.
    max_attempts: usize,
    /// Initial delay between attempts (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl HttpTransport {
    pub fn new(max_attempts: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_attempts: max_attempts.max(1),
            base_delay: StdDuration::from_secs(1),
            max_delay: StdDuration::from_secs(30),
        })
    }

    fn retryable(err: &FetchError) -> bool {
        match err {
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::Http(e) => !e.is_builder(),
            _ => false,
        }
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based),
    /// without jitter.
    fn backoff(&self, attempt: usize) -> StdDuration {
        let exp = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let factor = 1u32.checked_shl(exp).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    async fn send_once(&self, url: &str) -> Result<Response, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }

    /// GET `url`, retrying with backoff until a successful response arrives.
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn send(&self, url: &str) -> Result<Response, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.send_once(url).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !Self::retryable(&e) {
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "GET attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.send(url).await?;
        Ok(response.text().await?)
    }

    async fn get_into<W>(&self, url: &str, mode: BodyMode, out: &mut W) -> Result<u64, FetchError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut response = self.send(url).await?;
        let written = match mode {
            BodyMode::Buffered => {
                let body = response.bytes().await?;
                out.write_all(&body).await?;
                body.len() as u64
            }
            BodyMode::Streamed => {
                let mut written = 0u64;
                while let Some(chunk) = response.chunk().await? {
                    out.write_all(&chunk).await?;
                    written += chunk.len() as u64;
                }
                written
            }
        };
        out.flush().await?;
        Ok(written)
    }
}
