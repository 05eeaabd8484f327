//! Crawl job lifecycle controller.
//!
//! Owns one `CrawlJob` at a time: validates and issues the start request,
//! spawns a reader task that applies decoded events to shared state, and
//! tears the stream down on cancel. UI layers poll the observers or
//! subscribe to snapshot broadcasts; nothing else writes job state.

use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

use crate::job::{CrawlJob, CrawlProgress, JobSnapshot, JobStatus};
use crate::traits::{CrawlService, CrawlStream};
use crawler_client::{CrawlRequest, CrawledPage};

/// Maximum accepted length for the target selector.
const MAX_SELECTOR_LEN: usize = 100;

/// Snapshot broadcast capacity; slow subscribers lag rather than block.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 256;

/// Rejected start parameters. Checked before any network call; every other
/// failure mode lands in the job's `Failed` state instead of an `Err`.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub struct CrawlController {
    service: Arc<dyn CrawlService>,
    job: Arc<RwLock<CrawlJob>>,
    updates: broadcast::Sender<JobSnapshot>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl CrawlController {
    pub fn new(service: Arc<dyn CrawlService>) -> Self {
        let (updates, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            service,
            job: Arc::new(RwLock::new(CrawlJob::default())),
            updates,
            reader: Mutex::new(None),
        }
    }

    /// Start a crawl job, replacing any job currently held.
    ///
    /// Suspends only until the service acknowledges with a job id; event
    /// consumption continues in a spawned task. A start-request failure is
    /// recorded as job `Failed`, not returned — only invalid parameters
    /// produce an `Err`, before any network call.
    pub async fn start(&self, start_url: &str, target_selector: &str) -> Result<(), StartError> {
        validate_start_input(start_url, target_selector)?;

        // Replace-on-start: tear down any in-flight reader, then clear
        // accumulated state from the prior attempt.
        self.abort_reader();
        *self.job.write().unwrap() = CrawlJob::default();
        self.publish();

        let request = CrawlRequest {
            start_url: start_url.to_string(),
            target_class: target_selector.to_string(),
        };

        let stream = match self.service.start(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "Crawl start request failed");
                self.job.write().unwrap().fail(e.to_string());
                self.publish();
                return Ok(());
            }
        };

        info!(job_id = %stream.job_id, start_url = %start_url, "Crawl job acknowledged");
        {
            let mut job = self.job.write().unwrap();
            job.job_id = Some(stream.job_id.clone());
            job.status = JobStatus::Running;
        }
        self.publish();

        let job = Arc::clone(&self.job);
        let updates = self.updates.clone();
        let handle = tokio::spawn(read_events(stream, job, updates));
        *self.reader.lock().unwrap() = Some(handle);

        Ok(())
    }

    /// Cancel the current job.
    ///
    /// No-op unless `Running`. Locally unconditional: the reader task is
    /// aborted immediately and status returns to `Idle` with the pages
    /// collected so far frozen as the result set. The remote stop request
    /// is best-effort — a delivery failure is logged, never surfaced.
    pub fn cancel(&self) {
        let job_id = {
            let mut job = self.job.write().unwrap();
            if job.status != JobStatus::Running {
                return;
            }
            job.status = JobStatus::Idle;
            job.job_id.clone()
        };

        self.abort_reader();
        self.publish();
        info!("Crawl job cancelled");

        if let Some(job_id) = job_id {
            let service = Arc::clone(&self.service);
            tokio::spawn(async move {
                if let Err(e) = service.stop(&job_id).await {
                    warn!(job_id = %job_id, error = %e, "Best-effort stop request failed");
                }
            });
        }
    }

    pub fn status(&self) -> JobStatus {
        self.job.read().unwrap().status
    }

    pub fn progress(&self) -> Option<CrawlProgress> {
        self.job.read().unwrap().progress.clone()
    }

    /// Pages accumulated so far (the final result set once the job is no
    /// longer `Running`).
    pub fn results(&self) -> Vec<CrawledPage> {
        self.job.read().unwrap().accumulated_pages.clone()
    }

    pub fn job_id(&self) -> Option<String> {
        self.job.read().unwrap().job_id.clone()
    }

    pub fn error_detail(&self) -> Option<String> {
        self.job.read().unwrap().error_detail.clone()
    }

    /// Subscribe to job snapshots, pushed on every state change.
    pub fn subscribe(&self) -> broadcast::Receiver<JobSnapshot> {
        self.updates.subscribe()
    }

    fn abort_reader(&self) {
        if let Some(handle) = self.reader.lock().unwrap().take() {
            handle.abort();
        }
    }

    fn publish(&self) {
        // Ignore send errors (no active subscribers).
        let _ = self.updates.send(self.job.read().unwrap().snapshot());
    }
}

impl Drop for CrawlController {
    fn drop(&mut self) {
        self.abort_reader();
    }
}

/// Reader task: applies decoded events to job state in emission order.
///
/// Completion is the authoritative end-of-data signal — the loop breaks on
/// it and anything after is never read. A stream that ends without a
/// completion or error record is a fault, reported as `Failed` rather than
/// silently treated as success.
async fn read_events(
    mut stream: CrawlStream,
    job: Arc<RwLock<CrawlJob>>,
    updates: broadcast::Sender<JobSnapshot>,
) {
    use futures::StreamExt;

    let mut finished = false;
    while let Some(next) = stream.events.next().await {
        match next {
            Ok(event) => {
                let done = job.write().unwrap().apply_event(event);
                let _ = updates.send(job.read().unwrap().snapshot());
                if done {
                    finished = true;
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "Crawl stream failed");
                let mut guard = job.write().unwrap();
                if guard.status == JobStatus::Running {
                    guard.fail(e.to_string());
                }
                drop(guard);
                let _ = updates.send(job.read().unwrap().snapshot());
                finished = true;
                break;
            }
        }
    }

    if !finished {
        let mut guard = job.write().unwrap();
        if guard.status == JobStatus::Running {
            guard.fail("unexpected termination: stream closed without a completion record");
        }
        drop(guard);
        let _ = updates.send(job.read().unwrap().snapshot());
    }
}

fn validate_start_input(start_url: &str, target_selector: &str) -> Result<(), StartError> {
    let parsed = Url::parse(start_url).map_err(|e| {
        StartError::InvalidInput(format!("start URL is not a valid absolute URL: {}", e))
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(StartError::InvalidInput(format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }
    if target_selector.trim().is_empty() {
        return Err(StartError::InvalidInput(
            "target selector must not be empty".into(),
        ));
    }
    if target_selector.len() > MAX_SELECTOR_LEN {
        return Err(StartError::InvalidInput(format!(
            "target selector exceeds {} characters",
            MAX_SELECTOR_LEN
        )));
    }
    Ok(())
}
