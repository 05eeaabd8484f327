//! Crawl job state owned by the lifecycle controller.

use serde::{Deserialize, Serialize};

use crawler_client::{CrawlEvent, CrawledPage};

/// Lifecycle status of a crawl job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Last-known progress snapshot reported by the crawl service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlProgress {
    pub message: String,
    pub pages_processed: u64,
    pub elapsed_seconds: f64,
}

/// One in-flight or completed crawl attempt.
///
/// Mutated only by the controller: from decoded events in emission order,
/// and from explicit start/cancel calls.
#[derive(Debug, Default)]
pub struct CrawlJob {
    pub job_id: Option<String>,
    pub status: JobStatus,
    pub progress: Option<CrawlProgress>,
    pub accumulated_pages: Vec<CrawledPage>,
    pub error_detail: Option<String>,
}

impl CrawlJob {
    /// Apply one decoded stream event.
    ///
    /// Returns `true` when the event ends the stream (completion or error)
    /// and no further records should be applied — completion is the
    /// authoritative end-of-data signal, so anything after it is dropped.
    /// Events arriving after the job left `Running` (e.g. a cancel raced
    /// the reader) are ignored.
    pub fn apply_event(&mut self, event: CrawlEvent) -> bool {
        if self.status != JobStatus::Running {
            return true;
        }

        match event {
            CrawlEvent::Status { message } => {
                self.progress.get_or_insert_with(Default::default).message = message;
                false
            }
            CrawlEvent::Progress {
                message,
                processed_pages,
                elapsed_time,
            } => {
                self.progress = Some(CrawlProgress {
                    message,
                    pages_processed: processed_pages,
                    elapsed_seconds: elapsed_time,
                });
                false
            }
            CrawlEvent::Page(page) => {
                self.accumulated_pages.push(*page);
                false
            }
            CrawlEvent::Completion {
                message,
                processed_pages,
                total_time,
            } => {
                self.progress = Some(CrawlProgress {
                    message,
                    pages_processed: processed_pages,
                    elapsed_seconds: total_time,
                });
                self.status = JobStatus::Completed;
                true
            }
            CrawlEvent::Error { error } => {
                self.fail(error);
                true
            }
        }
    }

    /// Transition to `Failed` with a human-readable detail.
    pub fn fail(&mut self, detail: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_detail = Some(detail.into());
    }

    /// Compact view pushed to subscribers on every change.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.job_id.clone(),
            status: self.status,
            progress: self.progress.clone(),
            pages_collected: self.accumulated_pages.len(),
            error_detail: self.error_detail.clone(),
        }
    }
}

/// Immutable job view for the observer/subscription interface.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub job_id: Option<String>,
    pub status: JobStatus,
    pub progress: Option<CrawlProgress>,
    pub pages_collected: usize,
    pub error_detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> CrawlEvent {
        CrawlEvent::Page(Box::new(CrawledPage {
            url: url.to_string(),
            title: None,
            description: None,
            is_indexable: true,
            internal_link_urls: Vec::new(),
            outer_link_urls: Vec::new(),
            headings: Vec::new(),
            structured_data: Vec::new(),
        }))
    }

    fn running_job() -> CrawlJob {
        CrawlJob {
            status: JobStatus::Running,
            ..Default::default()
        }
    }

    #[test]
    fn new_job_starts_idle() {
        let job = CrawlJob::default();
        assert_eq!(job.status, JobStatus::Idle);
        assert!(job.accumulated_pages.is_empty());
    }

    #[test]
    fn pages_accumulate_in_order() {
        let mut job = running_job();
        assert!(!job.apply_event(page("https://example.com/a")));
        assert!(!job.apply_event(page("https://example.com/b")));

        let urls: Vec<_> = job.accumulated_pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn completion_is_terminal_and_records_progress() {
        let mut job = running_job();
        let done = job.apply_event(CrawlEvent::Completion {
            message: "done".into(),
            processed_pages: 4,
            total_time: 2.5,
        });

        assert!(done);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress.unwrap().pages_processed, 4);
    }

    #[test]
    fn error_event_fails_the_job() {
        let mut job = running_job();
        let done = job.apply_event(CrawlEvent::Error {
            error: "blocked by robots.txt".into(),
        });

        assert!(done);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_detail.as_deref(), Some("blocked by robots.txt"));
    }

    #[test]
    fn events_after_terminal_are_ignored() {
        let mut job = running_job();
        job.apply_event(CrawlEvent::Completion {
            message: "done".into(),
            processed_pages: 0,
            total_time: 0.1,
        });

        assert!(job.apply_event(page("https://example.com/late")));
        assert!(job.accumulated_pages.is_empty());
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[test]
    fn status_event_only_touches_the_message() {
        let mut job = running_job();
        job.apply_event(CrawlEvent::Progress {
            message: "crawling".into(),
            processed_pages: 3,
            elapsed_time: 1.0,
        });
        job.apply_event(CrawlEvent::Status {
            message: "throttling".into(),
        });

        let progress = job.progress.unwrap();
        assert_eq!(progress.message, "throttling");
        assert_eq!(progress.pages_processed, 3);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Idle.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }
}
