//! Seam between the job controller and the external crawl service.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crawler_client::{CrawlEvent, CrawlRequest, CrawlerClient, CrawlerError};

/// A started crawl run as consumed by the controller: the service-assigned
/// job id plus the decoded event stream.
pub struct CrawlStream {
    pub job_id: String,
    pub events: BoxStream<'static, Result<CrawlEvent, CrawlerError>>,
}

/// The external crawl service.
///
/// Implemented by `crawler_client::CrawlerClient` in production and by
/// `testing::ScriptedCrawlService` in tests.
#[async_trait]
pub trait CrawlService: Send + Sync {
    /// Start a crawl run; suspends until the service acknowledges with a
    /// job id.
    async fn start(&self, request: &CrawlRequest) -> Result<CrawlStream, CrawlerError>;

    /// Best-effort stop of a running crawl.
    async fn stop(&self, job_id: &str) -> Result<(), CrawlerError>;
}

#[async_trait]
impl CrawlService for CrawlerClient {
    async fn start(&self, request: &CrawlRequest) -> Result<CrawlStream, CrawlerError> {
        let handle = self.start_crawl(request).await?;
        Ok(CrawlStream {
            job_id: handle.job_id,
            events: handle.events.boxed(),
        })
    }

    async fn stop(&self, job_id: &str) -> Result<(), CrawlerError> {
        self.stop_crawl(job_id).await
    }
}
