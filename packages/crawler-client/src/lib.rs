//! Pure REST/streaming client for the site crawler service.
//!
//! Starts crawl runs, exposes the NDJSON response body as a stream of typed
//! events, and issues best-effort stop requests. No domain logic and no
//! persistence — consumers own job state and storage.
//!
//! # Example
//!
//! ```rust,ignore
//! use crawler_client::{CrawlerClient, CrawlRequest};
//! use futures::StreamExt;
//!
//! let client = CrawlerClient::from_env()?;
//! let mut handle = client
//!     .start_crawl(&CrawlRequest {
//!         start_url: "https://example.com".into(),
//!         target_class: "article-body".into(),
//!     })
//!     .await?;
//!
//! while let Some(event) = handle.events.next().await {
//!     println!("{:?}", event?);
//! }
//! ```

pub mod error;
pub mod events;
pub mod streaming;

pub use error::{CrawlerError, Result};
pub use events::{CrawlEvent, CrawledPage, Heading};
pub use streaming::{CrawlEventStream, EventDecoder};

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

/// Response header carrying the job identifier assigned by the service.
pub const JOB_ID_HEADER: &str = "x-crawl-job-id";

/// Connect timeout only — the response body streams for the crawl's lifetime.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for starting a crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlRequest {
    pub start_url: String,
    pub target_class: String,
}

/// A started crawl run: the service-assigned job id plus its event stream.
pub struct CrawlHandle {
    pub job_id: String,
    pub events: CrawlEventStream,
}

/// Crawler service API client.
#[derive(Clone)]
pub struct CrawlerClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl CrawlerClient {
    /// Create a new client for the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| CrawlerError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Create from the `CRAWLER_SERVICE_URL` environment variable.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("CRAWLER_SERVICE_URL")
            .map_err(|_| CrawlerError::Config("CRAWLER_SERVICE_URL not set".into()))?;
        Self::new(base_url)
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a crawl run.
    ///
    /// Suspends until the response headers arrive (that is where the job id
    /// lives); the body is handed back as a typed event stream to be
    /// consumed at the caller's pace.
    pub async fn start_crawl(&self, request: &CrawlRequest) -> Result<CrawlHandle> {
        info!(start_url = %request.start_url, "Starting crawl run");

        let response = self
            .http_client
            .post(format!("{}/crawls", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Crawl start request failed");
                CrawlerError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %message, "Crawler service rejected start request");
            return Err(CrawlerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let job_id = response
            .headers()
            .get(JOB_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| CrawlerError::Api {
                status: status.as_u16(),
                message: format!("response missing {} header", JOB_ID_HEADER),
            })?;

        debug!(job_id = %job_id, "Crawl run acknowledged");
        Ok(CrawlHandle {
            job_id,
            events: CrawlEventStream::new(response.bytes_stream()),
        })
    }

    /// Stop a running crawl. Best-effort and idempotent — the service keeps
    /// accepting stop requests for unknown or already-finished jobs.
    pub async fn stop_crawl(&self, job_id: &str) -> Result<()> {
        debug!(job_id = %job_id, "Stopping crawl run");

        let response = self
            .http_client
            .post(format!("{}/crawls/{}/stop", self.base_url, job_id))
            .send()
            .await
            .map_err(|e| CrawlerError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CrawlerError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builder_overrides_base_url() {
        let client = CrawlerClient::new("http://localhost:9000")
            .unwrap()
            .with_base_url("http://crawler.internal");

        assert_eq!(client.base_url(), "http://crawler.internal");
    }
}
