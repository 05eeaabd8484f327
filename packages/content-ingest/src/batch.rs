//! Batch preparation for bulk ingestion.
//!
//! Pure: dedups pages, assigns identities, resolves the link graph against
//! the batch's own URL set, and flattens heading trees into insert-ordered
//! rows. Storage backends persist the prepared rows without re-deriving any
//! of this.

use std::collections::HashMap;

use chrono::Utc;
use tracing::debug;

use crate::types::{
    canonical_url, Article, ArticleHeading, ArticleId, ArticleLink, HeadingId, LinkKind,
    ProjectId,
};
use crawler_client::{CrawledPage, Heading};

/// Insert-ordered rows for one project replacement.
#[derive(Debug, Default)]
pub struct PreparedBatch {
    pub articles: Vec<Article>,
    pub links: Vec<ArticleLink>,
    pub headings: Vec<ArticleHeading>,
}

/// Prepare a crawl batch for persistence.
///
/// Duplicate URLs (after canonicalization) keep their first occurrence.
/// Internal links that do not resolve inside the batch are dropped —
/// external or stale targets are expected, not errors. Heading rows come
/// out parent before children with 0-based per-parent positions.
pub fn prepare_batch(project_id: ProjectId, pages: &[CrawledPage]) -> PreparedBatch {
    // First occurrence wins on duplicate URLs.
    let mut by_url: HashMap<&str, usize> = HashMap::new();
    let mut deduped: Vec<&CrawledPage> = Vec::new();
    for page in pages {
        let key = canonical_url(&page.url);
        if by_url.contains_key(key) {
            debug!(url = %page.url, "Skipping duplicate page URL");
            continue;
        }
        by_url.insert(key, deduped.len());
        deduped.push(page);
    }

    let ids: Vec<ArticleId> = deduped.iter().map(|_| ArticleId::new()).collect();
    let crawled_at = Utc::now();

    let mut batch = PreparedBatch::default();

    for (page, &id) in deduped.iter().zip(ids.iter()) {
        batch.articles.push(Article {
            id,
            project_id,
            url: page.url.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            is_indexable: page.is_indexable,
            structured_data: page.structured_data.clone(),
            crawled_at,
        });
    }

    for (page, &source_id) in deduped.iter().zip(ids.iter()) {
        for raw in &page.internal_link_urls {
            match by_url.get(canonical_url(raw)) {
                Some(&target) => batch.links.push(ArticleLink {
                    source_article_id: source_id,
                    target_article_id: Some(ids[target]),
                    target_url: raw.clone(),
                    anchor_text: None,
                    is_follow: true,
                    kind: LinkKind::Internal,
                }),
                None => {
                    debug!(url = %raw, "Dropping internal link with no target in batch");
                }
            }
        }

        for raw in &page.outer_link_urls {
            batch.links.push(ArticleLink {
                source_article_id: source_id,
                target_article_id: None,
                target_url: raw.clone(),
                anchor_text: None,
                is_follow: true,
                kind: LinkKind::Outer,
            });
        }
    }

    for (page, &article_id) in deduped.iter().zip(ids.iter()) {
        flatten_headings(article_id, None, &page.headings, &mut batch.headings);
    }

    batch
}

/// Depth-first walk with explicit parent tracking. Parents are pushed
/// before their children, so persisting rows in vector order always
/// satisfies the self-referential parent reference.
fn flatten_headings(
    article_id: ArticleId,
    parent_id: Option<HeadingId>,
    nodes: &[Heading],
    out: &mut Vec<ArticleHeading>,
) {
    for (position, node) in nodes.iter().enumerate() {
        let id = HeadingId::new();
        out.push(ArticleHeading {
            id,
            article_id,
            parent_id,
            tag: node.tag.clone(),
            text: node.text.clone(),
            position: position as i32,
        });
        flatten_headings(article_id, Some(id), &node.children, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, internal: &[&str]) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            title: Some(format!("title of {}", url)),
            description: None,
            is_indexable: true,
            internal_link_urls: internal.iter().map(|s| s.to_string()).collect(),
            outer_link_urls: Vec::new(),
            headings: Vec::new(),
            structured_data: Vec::new(),
        }
    }

    #[test]
    fn resolves_internal_links_and_drops_misses() {
        let pages = vec![page("/a", &["/b"]), page("/b", &["/a", "/c"])];
        let batch = prepare_batch(ProjectId::new(), &pages);

        assert_eq!(batch.articles.len(), 2);
        assert_eq!(batch.links.len(), 2);

        let a = batch.articles[0].id;
        let b = batch.articles[1].id;
        assert_eq!(batch.links[0].source_article_id, a);
        assert_eq!(batch.links[0].target_article_id, Some(b));
        assert_eq!(batch.links[1].source_article_id, b);
        assert_eq!(batch.links[1].target_article_id, Some(a));
        assert!(batch.links.iter().all(|l| l.kind == LinkKind::Internal));
    }

    #[test]
    fn trailing_slash_difference_still_resolves() {
        let pages = vec![page("/a", &["/b/"]), page("/b", &[])];
        let batch = prepare_batch(ProjectId::new(), &pages);

        assert_eq!(batch.links.len(), 1);
        assert_eq!(batch.links[0].target_article_id, Some(batch.articles[1].id));
        // The raw URL is preserved on the edge.
        assert_eq!(batch.links[0].target_url, "/b/");
    }

    #[test]
    fn duplicate_urls_keep_first_occurrence() {
        let mut first = page("/a", &[]);
        first.title = Some("first".into());
        let mut second = page("/a", &[]);
        second.title = Some("second".into());

        let batch = prepare_batch(ProjectId::new(), &[first, second]);

        assert_eq!(batch.articles.len(), 1);
        assert_eq!(batch.articles[0].title.as_deref(), Some("first"));
    }

    #[test]
    fn duplicate_after_canonicalization_keeps_first_occurrence() {
        let batch = prepare_batch(ProjectId::new(), &[page("/a", &[]), page("/a/", &[])]);

        assert_eq!(batch.articles.len(), 1);
        assert_eq!(batch.articles[0].url, "/a");
    }

    #[test]
    fn outer_links_keep_raw_url_without_target() {
        let mut p = page("/a", &[]);
        p.outer_link_urls = vec!["https://elsewhere.example/post".to_string()];

        let batch = prepare_batch(ProjectId::new(), &[p]);

        assert_eq!(batch.links.len(), 1);
        assert_eq!(batch.links[0].kind, LinkKind::Outer);
        assert_eq!(batch.links[0].target_article_id, None);
        assert_eq!(batch.links[0].target_url, "https://elsewhere.example/post");
    }

    #[test]
    fn heading_tree_flattens_parent_before_children() {
        let mut p = page("/a", &[]);
        p.headings = vec![Heading {
            tag: "h1".into(),
            text: "T".into(),
            children: vec![Heading {
                tag: "h2".into(),
                text: "S".into(),
                children: Vec::new(),
            }],
        }];

        let batch = prepare_batch(ProjectId::new(), &[p]);

        assert_eq!(batch.headings.len(), 2);
        let h1 = &batch.headings[0];
        let h2 = &batch.headings[1];
        assert_eq!(h1.tag, "h1");
        assert_eq!(h1.parent_id, None);
        assert_eq!(h1.position, 0);
        assert_eq!(h2.tag, "h2");
        assert_eq!(h2.parent_id, Some(h1.id));
        assert_eq!(h2.position, 0);
    }

    #[test]
    fn sibling_positions_increase_per_parent() {
        let mut p = page("/a", &[]);
        p.headings = vec![
            Heading {
                tag: "h1".into(),
                text: "first".into(),
                children: vec![
                    Heading {
                        tag: "h2".into(),
                        text: "child 0".into(),
                        children: Vec::new(),
                    },
                    Heading {
                        tag: "h2".into(),
                        text: "child 1".into(),
                        children: Vec::new(),
                    },
                ],
            },
            Heading {
                tag: "h1".into(),
                text: "second".into(),
                children: Vec::new(),
            },
        ];

        let batch = prepare_batch(ProjectId::new(), &[p]);

        let positions: Vec<(String, i32)> = batch
            .headings
            .iter()
            .map(|h| (h.text.clone(), h.position))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("first".to_string(), 0),
                ("child 0".to_string(), 0),
                ("child 1".to_string(), 1),
                ("second".to_string(), 1),
            ]
        );
    }

    #[test]
    fn deep_heading_nesting_is_preserved() {
        let mut node = Heading {
            tag: "h6".into(),
            text: "leaf".into(),
            children: Vec::new(),
        };
        for depth in (1..6).rev() {
            node = Heading {
                tag: format!("h{}", depth),
                text: format!("level {}", depth),
                children: vec![node],
            };
        }
        let mut p = page("/a", &[]);
        p.headings = vec![node];

        let batch = prepare_batch(ProjectId::new(), &[p]);

        assert_eq!(batch.headings.len(), 6);
        for pair in batch.headings.windows(2) {
            assert_eq!(pair[1].parent_id, Some(pair[0].id));
        }
    }

    #[test]
    fn self_link_resolves_to_self() {
        let batch = prepare_batch(ProjectId::new(), &[page("/a", &["/a"])]);

        assert_eq!(batch.links.len(), 1);
        assert_eq!(
            batch.links[0].target_article_id,
            Some(batch.articles[0].id)
        );
    }

    #[test]
    fn empty_batch_prepares_empty_rows() {
        let batch = prepare_batch(ProjectId::new(), &[]);
        assert!(batch.articles.is_empty());
        assert!(batch.links.is_empty());
        assert!(batch.headings.is_empty());
    }
}
