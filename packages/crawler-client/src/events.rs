//! Wire event model for the crawl event stream.
//!
//! The service emits newline-delimited JSON records. A record with a
//! recognized `type` field is a lifecycle event, a record with an `error`
//! field is an error event, and a bare page object (no `type`, carries a
//! `url`) is a data event. Anything else is logged and skipped so newer
//! service versions never abort the stream.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CrawlerError, Result};

/// One page found by the crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_indexable: bool,
    #[serde(default)]
    pub internal_link_urls: Vec<String>,
    #[serde(default)]
    pub outer_link_urls: Vec<String>,
    #[serde(default)]
    pub headings: Vec<Heading>,
    #[serde(default)]
    pub structured_data: Vec<serde_json::Value>,
}

/// A heading-tree node. Children nest to any depth and are never null on
/// the wire (an absent list decodes as empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heading {
    pub tag: String,
    pub text: String,
    #[serde(default)]
    pub children: Vec<Heading>,
}

/// A decoded record from the crawl event stream.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// Free-form status line from the service.
    Status { message: String },
    /// Periodic progress snapshot.
    Progress {
        message: String,
        processed_pages: u64,
        elapsed_time: f64,
    },
    /// Authoritative end-of-data signal.
    Completion {
        message: String,
        processed_pages: u64,
        total_time: f64,
    },
    /// One crawled page.
    Page(Box<CrawledPage>),
    /// The service reported a crawl failure.
    Error { error: String },
}

#[derive(Debug, Deserialize)]
struct StatusRaw {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProgressRaw {
    message: String,
    processed_pages: u64,
    elapsed_time: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionRaw {
    message: String,
    processed_pages: u64,
    total_time: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorRaw {
    error: String,
}

/// Classify one complete NDJSON line into an event.
///
/// Returns `Ok(None)` for unrecognized record shapes (skipped for forward
/// compatibility). Invalid JSON, or a recognized record whose payload does
/// not deserialize, is a decode error.
pub(crate) fn classify_record(line: &str) -> Result<Option<CrawlEvent>> {
    let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
        CrawlerError::Decode(format!(
            "invalid JSON record: {} (line: {})",
            e,
            &line[..line.len().min(200)]
        ))
    })?;

    if let Some(kind) = value.get("type").and_then(|t| t.as_str()) {
        return match kind {
            "status" => {
                let raw: StatusRaw = deserialize_record(value)?;
                Ok(Some(CrawlEvent::Status {
                    message: raw.message,
                }))
            }
            "progress" => {
                let raw: ProgressRaw = deserialize_record(value)?;
                Ok(Some(CrawlEvent::Progress {
                    message: raw.message,
                    processed_pages: raw.processed_pages,
                    elapsed_time: raw.elapsed_time,
                }))
            }
            "completion" => {
                let raw: CompletionRaw = deserialize_record(value)?;
                Ok(Some(CrawlEvent::Completion {
                    message: raw.message,
                    processed_pages: raw.processed_pages,
                    total_time: raw.total_time,
                }))
            }
            other => {
                warn!(record_type = other, "Ignoring unknown stream record type");
                Ok(None)
            }
        };
    }

    if value.get("error").is_some() {
        let raw: ErrorRaw = deserialize_record(value)?;
        return Ok(Some(CrawlEvent::Error { error: raw.error }));
    }

    if value.get("url").is_some() {
        let page: CrawledPage = deserialize_record(value)?;
        if page.url.is_empty() {
            return Err(CrawlerError::Decode("page record with empty url".into()));
        }
        return Ok(Some(CrawlEvent::Page(Box::new(page))));
    }

    warn!("Ignoring unrecognized stream record shape");
    Ok(None)
}

fn deserialize_record<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| CrawlerError::Decode(format!("malformed record payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_record() {
        let event = classify_record(r#"{"type":"status","message":"warming up"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(event, CrawlEvent::Status { message } if message == "warming up"));
    }

    #[test]
    fn classifies_progress_record() {
        let event = classify_record(
            r#"{"type":"progress","message":"crawling","processed_pages":7,"elapsed_time":1.5}"#,
        )
        .unwrap()
        .unwrap();
        match event {
            CrawlEvent::Progress {
                processed_pages,
                elapsed_time,
                ..
            } => {
                assert_eq!(processed_pages, 7);
                assert!((elapsed_time - 1.5).abs() < f64::EPSILON);
            }
            other => panic!("expected progress event, got {:?}", other),
        }
    }

    #[test]
    fn classifies_bare_page_object_as_data_event() {
        let event = classify_record(
            r#"{"url":"https://example.com/a","title":"A","internal_link_urls":["https://example.com/b"]}"#,
        )
        .unwrap()
        .unwrap();
        match event {
            CrawlEvent::Page(page) => {
                assert_eq!(page.url, "https://example.com/a");
                assert_eq!(page.internal_link_urls.len(), 1);
                assert!(page.headings.is_empty());
            }
            other => panic!("expected page event, got {:?}", other),
        }
    }

    #[test]
    fn classifies_error_record() {
        let event = classify_record(r#"{"error":"robots.txt disallows"}"#)
            .unwrap()
            .unwrap();
        assert!(matches!(event, CrawlEvent::Error { error } if error == "robots.txt disallows"));
    }

    #[test]
    fn unknown_type_is_skipped_not_fatal() {
        assert!(classify_record(r#"{"type":"telemetry","cpu":0.5}"#)
            .unwrap()
            .is_none());
    }

    #[test]
    fn unrecognized_shape_is_skipped_not_fatal() {
        assert!(classify_record(r#"{"hello":"world"}"#).unwrap().is_none());
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = classify_record("{not json").unwrap_err();
        assert!(matches!(err, CrawlerError::Decode(_)));
    }

    #[test]
    fn recognized_record_with_bad_payload_is_a_decode_error() {
        // status record missing its message
        let err = classify_record(r#"{"type":"status"}"#).unwrap_err();
        assert!(matches!(err, CrawlerError::Decode(_)));
    }

    #[test]
    fn empty_page_url_is_a_decode_error() {
        let err = classify_record(r#"{"url":""}"#).unwrap_err();
        assert!(matches!(err, CrawlerError::Decode(_)));
    }

    #[test]
    fn heading_children_default_to_empty() {
        let event = classify_record(
            r#"{"url":"https://example.com","headings":[{"tag":"h1","text":"Title"}]}"#,
        )
        .unwrap()
        .unwrap();
        match event {
            CrawlEvent::Page(page) => assert!(page.headings[0].children.is_empty()),
            other => panic!("expected page event, got {:?}", other),
        }
    }
}
