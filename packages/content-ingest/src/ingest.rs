//! Bulk ingestion: atomic replace-all of a project's article graph.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::batch::prepare_batch;
use crate::storage::ArticleStore;
use crate::types::{IngestReport, ProjectId};
use crawler_client::CrawledPage;

/// Replaces a project's persisted article set from completed crawl results.
///
/// The whole operation either fully commits or fully rolls back; callers
/// retry the entire call on failure, which is naturally idempotent thanks
/// to the delete-then-recreate design.
pub struct BulkIngestor {
    store: Arc<dyn ArticleStore>,
}

impl BulkIngestor {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }

    /// Atomically replace `project_id`'s articles, links, and headings with
    /// the given crawl batch, returning aggregate counts.
    pub async fn ingest(
        &self,
        project_id: ProjectId,
        pages: &[CrawledPage],
    ) -> Result<IngestReport> {
        let batch = prepare_batch(project_id, pages);
        info!(
            project_id = %project_id.0,
            pages = pages.len(),
            articles = batch.articles.len(),
            links = batch.links.len(),
            headings = batch.headings.len(),
            "Ingesting crawl batch"
        );

        let articles_deleted = self.store.replace_project(project_id, &batch).await?;

        let report = IngestReport {
            articles_deleted,
            articles_created: batch.articles.len(),
            links_created: batch.links.len(),
            headings_created: batch.headings.len(),
        };
        info!(
            project_id = %project_id.0,
            deleted = report.articles_deleted,
            created = report.articles_created,
            links = report.links_created,
            headings = report.headings_created,
            "Ingest complete"
        );
        Ok(report)
    }
}
