//! Postgres-backed article storage.
//!
//! Expected schema (ids are UUID v7, so `ORDER BY id` is insertion order):
//!
//! ```sql
//! CREATE TABLE articles (
//!     id              UUID PRIMARY KEY,
//!     project_id      UUID NOT NULL,
//!     url             TEXT NOT NULL,
//!     title           TEXT,
//!     description     TEXT,
//!     is_indexable    BOOLEAN NOT NULL DEFAULT TRUE,
//!     structured_data JSONB NOT NULL DEFAULT '[]',
//!     crawled_at      TIMESTAMPTZ NOT NULL,
//!     UNIQUE (project_id, url)
//! );
//!
//! CREATE TABLE article_links (
//!     source_article_id UUID NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
//!     target_article_id UUID REFERENCES articles(id) ON DELETE CASCADE,
//!     target_url        TEXT NOT NULL,
//!     anchor_text       TEXT,
//!     is_follow         BOOLEAN NOT NULL DEFAULT TRUE,
//!     kind              TEXT NOT NULL
//! );
//!
//! CREATE TABLE article_headings (
//!     id         UUID PRIMARY KEY,
//!     article_id UUID NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
//!     parent_id  UUID REFERENCES article_headings(id) ON DELETE CASCADE,
//!     tag        TEXT NOT NULL,
//!     text       TEXT NOT NULL,
//!     position   INT NOT NULL
//! );
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::batch::PreparedBatch;
use crate::storage::ArticleStore;
use crate::types::{
    Article, ArticleHeading, ArticleId, ArticleLink, HeadingId, LinkKind, ProjectId,
};

pub struct PostgresArticleStore {
    pool: PgPool,
}

impl PostgresArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_link_kind(kind: &str) -> Result<LinkKind> {
    match kind {
        "internal" => Ok(LinkKind::Internal),
        "outer" => Ok(LinkKind::Outer),
        other => anyhow::bail!("unknown link kind: {}", other),
    }
}

#[async_trait]
impl ArticleStore for PostgresArticleStore {
    async fn replace_project(
        &self,
        project_id: ProjectId,
        batch: &PreparedBatch,
    ) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        // Delete phase — links and headings follow their articles via
        // ON DELETE CASCADE.
        let deleted = sqlx::query("DELETE FROM articles WHERE project_id = $1")
            .bind(project_id.0)
            .execute(&mut *tx)
            .await
            .context("Failed to delete existing articles")?
            .rows_affected() as usize;

        // Create phase, in batch order.
        for article in &batch.articles {
            sqlx::query(
                r#"
                INSERT INTO articles (
                    id, project_id, url, title, description, is_indexable, structured_data, crawled_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (project_id, url) DO NOTHING
                "#,
            )
            .bind(article.id.0)
            .bind(article.project_id.0)
            .bind(&article.url)
            .bind(&article.title)
            .bind(&article.description)
            .bind(article.is_indexable)
            .bind(serde_json::to_value(&article.structured_data)?)
            .bind(article.crawled_at)
            .execute(&mut *tx)
            .await
            .context("Failed to insert article")?;
        }

        for link in &batch.links {
            sqlx::query(
                r#"
                INSERT INTO article_links (
                    source_article_id, target_article_id, target_url, anchor_text, is_follow, kind
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(link.source_article_id.0)
            .bind(link.target_article_id.map(|id| id.0))
            .bind(&link.target_url)
            .bind(&link.anchor_text)
            .bind(link.is_follow)
            .bind(link.kind.as_str())
            .execute(&mut *tx)
            .await
            .context("Failed to insert article link")?;
        }

        // Heading rows arrive parent before children, so the parent
        // reference is always present by insertion time.
        for heading in &batch.headings {
            sqlx::query(
                r#"
                INSERT INTO article_headings (
                    id, article_id, parent_id, tag, text, position
                ) VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(heading.id.0)
            .bind(heading.article_id.0)
            .bind(heading.parent_id.map(|id| id.0))
            .bind(&heading.tag)
            .bind(&heading.text)
            .bind(heading.position)
            .execute(&mut *tx)
            .await
            .context("Failed to insert article heading")?;
        }

        tx.commit()
            .await
            .context("Failed to commit article replacement")?;
        Ok(deleted)
    }

    async fn list_articles(&self, project_id: ProjectId) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, url, title, description, is_indexable, structured_data, crawled_at
            FROM articles
            WHERE project_id = $1
            ORDER BY id
            "#,
        )
        .bind(project_id.0)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list articles")?;

        Ok(rows
            .into_iter()
            .map(|r| Article {
                id: ArticleId(r.get("id")),
                project_id: ProjectId(r.get("project_id")),
                url: r.get("url"),
                title: r.get("title"),
                description: r.get("description"),
                is_indexable: r.get("is_indexable"),
                structured_data: serde_json::from_value(r.get("structured_data"))
                    .unwrap_or_default(),
                crawled_at: r.get("crawled_at"),
            })
            .collect())
    }

    async fn list_links(&self, project_id: ProjectId) -> Result<Vec<ArticleLink>> {
        let rows = sqlx::query(
            r#"
            SELECT l.source_article_id, l.target_article_id, l.target_url,
                   l.anchor_text, l.is_follow, l.kind
            FROM article_links l
            JOIN articles a ON a.id = l.source_article_id
            WHERE a.project_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(project_id.0)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list article links")?;

        rows.into_iter()
            .map(|r| {
                Ok(ArticleLink {
                    source_article_id: ArticleId(r.get("source_article_id")),
                    target_article_id: r
                        .get::<Option<uuid::Uuid>, _>("target_article_id")
                        .map(ArticleId),
                    target_url: r.get("target_url"),
                    anchor_text: r.get("anchor_text"),
                    is_follow: r.get("is_follow"),
                    kind: parse_link_kind(r.get::<String, _>("kind").as_str())?,
                })
            })
            .collect()
    }

    async fn list_headings(&self, article_id: ArticleId) -> Result<Vec<ArticleHeading>> {
        let rows = sqlx::query(
            r#"
            SELECT id, article_id, parent_id, tag, text, position
            FROM article_headings
            WHERE article_id = $1
            ORDER BY id
            "#,
        )
        .bind(article_id.0)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list article headings")?;

        Ok(rows
            .into_iter()
            .map(|r| ArticleHeading {
                id: HeadingId(r.get("id")),
                article_id: ArticleId(r.get("article_id")),
                parent_id: r.get::<Option<uuid::Uuid>, _>("parent_id").map(HeadingId),
                tag: r.get("tag"),
                text: r.get("text"),
                position: r.get("position"),
            })
            .collect())
    }
}
