//! In-memory article storage for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::batch::PreparedBatch;
use crate::storage::ArticleStore;
use crate::types::{Article, ArticleHeading, ArticleId, ArticleLink, ProjectId};

#[derive(Debug, Default, Clone)]
struct ProjectRecords {
    articles: Vec<Article>,
    links: Vec<ArticleLink>,
    headings: Vec<ArticleHeading>,
}

/// In-memory storage keyed by project.
///
/// Replacement is commit-by-swap: the new record set is built fully before
/// stored state is touched, so a mid-batch failure leaves the prior
/// snapshot intact — the same contract as the Postgres transaction.
/// Not suitable for production: data is lost on restart.
pub struct MemoryArticleStore {
    projects: RwLock<HashMap<Uuid, ProjectRecords>>,
    fail_on_url: RwLock<Option<String>>,
}

impl Default for MemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            fail_on_url: RwLock::new(None),
        }
    }

    /// Make the create phase fail when an article with the given URL is
    /// inserted, for exercising rollback behavior.
    pub fn fail_on_url(&self, url: impl Into<String>) {
        *self.fail_on_url.write().unwrap() = Some(url.into());
    }

    /// Clear all stored data and any injected failure.
    pub fn clear(&self) {
        self.projects.write().unwrap().clear();
        *self.fail_on_url.write().unwrap() = None;
    }

    /// Number of stored articles for a project.
    pub fn article_count(&self, project_id: ProjectId) -> usize {
        self.projects
            .read()
            .unwrap()
            .get(&project_id.0)
            .map(|r| r.articles.len())
            .unwrap_or(0)
    }

    /// Number of stored link edges for a project.
    pub fn link_count(&self, project_id: ProjectId) -> usize {
        self.projects
            .read()
            .unwrap()
            .get(&project_id.0)
            .map(|r| r.links.len())
            .unwrap_or(0)
    }

    /// Number of stored heading rows for a project.
    pub fn heading_count(&self, project_id: ProjectId) -> usize {
        self.projects
            .read()
            .unwrap()
            .get(&project_id.0)
            .map(|r| r.headings.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn replace_project(
        &self,
        project_id: ProjectId,
        batch: &PreparedBatch,
    ) -> Result<usize> {
        let fail_on = self.fail_on_url.read().unwrap().clone();

        // Build the replacement fully before swapping it in.
        let mut next = ProjectRecords::default();
        for article in &batch.articles {
            if fail_on.as_deref() == Some(article.url.as_str()) {
                anyhow::bail!("injected failure inserting {}", article.url);
            }
            next.articles.push(article.clone());
        }
        next.links = batch.links.clone();
        next.headings = batch.headings.clone();

        let mut projects = self.projects.write().unwrap();
        let deleted = projects
            .get(&project_id.0)
            .map(|r| r.articles.len())
            .unwrap_or(0);
        projects.insert(project_id.0, next);
        Ok(deleted)
    }

    async fn list_articles(&self, project_id: ProjectId) -> Result<Vec<Article>> {
        Ok(self
            .projects
            .read()
            .unwrap()
            .get(&project_id.0)
            .map(|r| r.articles.clone())
            .unwrap_or_default())
    }

    async fn list_links(&self, project_id: ProjectId) -> Result<Vec<ArticleLink>> {
        Ok(self
            .projects
            .read()
            .unwrap()
            .get(&project_id.0)
            .map(|r| r.links.clone())
            .unwrap_or_default())
    }

    async fn list_headings(&self, article_id: ArticleId) -> Result<Vec<ArticleHeading>> {
        Ok(self
            .projects
            .read()
            .unwrap()
            .values()
            .flat_map(|r| r.headings.iter())
            .filter(|h| h.article_id == article_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::prepare_batch;
    use crawler_client::CrawledPage;

    fn page(url: &str) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            title: None,
            description: None,
            is_indexable: true,
            internal_link_urls: Vec::new(),
            outer_link_urls: Vec::new(),
            headings: Vec::new(),
            structured_data: Vec::new(),
        }
    }

    #[tokio::test]
    async fn replace_reports_deleted_count() {
        let store = MemoryArticleStore::new();
        let project = ProjectId::new();

        let first = prepare_batch(project, &[page("/a"), page("/b")]);
        assert_eq!(store.replace_project(project, &first).await.unwrap(), 0);

        let second = prepare_batch(project, &[page("/c")]);
        assert_eq!(store.replace_project(project, &second).await.unwrap(), 2);
        assert_eq!(store.article_count(project), 1);
    }

    #[tokio::test]
    async fn injected_failure_keeps_prior_state() {
        let store = MemoryArticleStore::new();
        let project = ProjectId::new();

        let first = prepare_batch(project, &[page("/a")]);
        store.replace_project(project, &first).await.unwrap();

        store.fail_on_url("/bad");
        let second = prepare_batch(project, &[page("/good"), page("/bad")]);
        assert!(store.replace_project(project, &second).await.is_err());

        let urls: Vec<_> = store
            .list_articles(project)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.url)
            .collect();
        assert_eq!(urls, vec!["/a".to_string()]);
    }

    #[tokio::test]
    async fn projects_are_isolated() {
        let store = MemoryArticleStore::new();
        let first = ProjectId::new();
        let second = ProjectId::new();

        let batch = prepare_batch(first, &[page("/a")]);
        store.replace_project(first, &batch).await.unwrap();

        assert_eq!(store.article_count(first), 1);
        assert_eq!(store.article_count(second), 0);
    }
}
