use anyhow::Result;
use async_trait::async_trait;

use crate::batch::PreparedBatch;
use crate::types::{Article, ArticleHeading, ArticleId, ArticleLink, ProjectId};

pub mod memory;
pub mod postgres;

pub use memory::MemoryArticleStore;
pub use postgres::PostgresArticleStore;

/// Storage for a project's article graph.
///
/// `replace_project` is the single transactional entry point: either every
/// prepared row commits or none do, and no reader ever observes the
/// deleted-but-not-recreated intermediate state.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Atomically replace a project's articles, links, and headings with
    /// the prepared batch. Returns the number of articles deleted.
    async fn replace_project(&self, project_id: ProjectId, batch: &PreparedBatch)
        -> Result<usize>;

    /// All articles for a project, in insertion order.
    async fn list_articles(&self, project_id: ProjectId) -> Result<Vec<Article>>;

    /// All link edges originating from a project's articles.
    async fn list_links(&self, project_id: ProjectId) -> Result<Vec<ArticleLink>>;

    /// All heading rows for one article, parents before their children.
    async fn list_headings(&self, article_id: ArticleId) -> Result<Vec<ArticleHeading>>;
}
