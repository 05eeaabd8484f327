//! Crawl ingestion pipeline for the content dashboard.
//!
//! Owns the crawl job lifecycle (start, cancel, observe), accumulates the
//! crawl service's decoded event stream into a result set, and atomically
//! replaces a project's article graph — pages, resolved internal/outer
//! links, and recursive heading trees — on ingestion.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use content_ingest::{BulkIngestor, CrawlController, JobStatus, PostgresArticleStore, ProjectId};
//! use crawler_client::CrawlerClient;
//!
//! let client = Arc::new(CrawlerClient::from_env()?);
//! let controller = CrawlController::new(client);
//!
//! controller.start("https://example.com", "article-body").await?;
//! // ... poll controller.status() / controller.progress() from the UI ...
//!
//! if controller.status() == JobStatus::Completed {
//!     let ingestor = BulkIngestor::new(Arc::new(PostgresArticleStore::new(pool)));
//!     let report = ingestor.ingest(project_id, &controller.results()).await?;
//!     println!("created {} articles", report.articles_created);
//! }
//! ```

pub mod batch;
pub mod controller;
pub mod ingest;
pub mod job;
pub mod storage;
pub mod testing;
pub mod traits;
pub mod types;

pub use batch::{prepare_batch, PreparedBatch};
pub use controller::{CrawlController, StartError};
pub use ingest::BulkIngestor;
pub use job::{CrawlJob, CrawlProgress, JobSnapshot, JobStatus};
pub use storage::{ArticleStore, MemoryArticleStore, PostgresArticleStore};
pub use traits::{CrawlService, CrawlStream};
pub use types::{
    canonical_url, Article, ArticleHeading, ArticleId, ArticleLink, CrawledPage, Heading,
    HeadingId, IngestReport, LinkKind, ProjectId,
};
