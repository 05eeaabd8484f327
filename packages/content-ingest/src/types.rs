use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Wire types re-exported so dashboard code depends on one package.
pub use crawler_client::events::{CrawledPage, Heading};

/// Unique identifier for a dashboard project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a persisted article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleId(pub Uuid);

impl ArticleId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ArticleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a persisted heading row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeadingId(pub Uuid);

impl HeadingId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for HeadingId {
    fn default() -> Self {
        Self::new()
    }
}

/// Link classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Target is another article in the same project
    Internal,
    /// Target is outside the project's page set
    Outer,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Internal => "internal",
            LinkKind::Outer => "outer",
        }
    }
}

/// A persisted article row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub project_id: ProjectId,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_indexable: bool,
    pub structured_data: Vec<serde_json::Value>,
    pub crawled_at: DateTime<Utc>,
}

/// A directed link edge materialized at persistence time.
///
/// Internal links carry the resolved target article; outer links keep the
/// raw target URL only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleLink {
    pub source_article_id: ArticleId,
    pub target_article_id: Option<ArticleId>,
    pub target_url: String,
    pub anchor_text: Option<String>,
    pub is_follow: bool,
    pub kind: LinkKind,
}

/// A node in a recursively stored heading tree.
///
/// `position` is the 0-based sibling sequence number within `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleHeading {
    pub id: HeadingId,
    pub article_id: ArticleId,
    pub parent_id: Option<HeadingId>,
    pub tag: String,
    pub text: String,
    pub position: i32,
}

/// Aggregate result of one bulk ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub articles_deleted: usize,
    pub articles_created: usize,
    pub links_created: usize,
    pub headings_created: usize,
}

/// Canonical form of a URL, used on both sides of link resolution.
///
/// Trims a single trailing slash; a bare `/` and the empty string are left
/// alone. Scheme, case, and query string are not touched.
pub fn canonical_url(url: &str) -> &str {
    if url.len() > 1 && url.ends_with('/') {
        &url[..url.len() - 1]
    } else {
        url
    }
}
