//! Testing utilities: a scripted crawl service for exercising the
//! controller without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;

use crate::traits::{CrawlService, CrawlStream};
use crawler_client::{CrawlEvent, CrawlRequest, CrawlerError};

enum ScriptedRun {
    /// A finite event sequence followed by end-of-stream.
    Events(Vec<Result<CrawlEvent, CrawlerError>>),
    /// Events followed by a stream that stays open until dropped — for
    /// exercising cancellation mid-crawl.
    Open(Vec<Result<CrawlEvent, CrawlerError>>),
    /// The start request itself fails.
    StartFailure(CrawlerError),
}

/// A `CrawlService` that replays scripted runs, one per `start` call.
pub struct ScriptedCrawlService {
    job_id: String,
    runs: Mutex<VecDeque<ScriptedRun>>,
    stop_calls: Mutex<Vec<String>>,
}

impl ScriptedCrawlService {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            runs: Mutex::new(VecDeque::new()),
            stop_calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a run whose stream delivers `events` and then ends.
    pub fn with_events(self, events: Vec<Result<CrawlEvent, CrawlerError>>) -> Self {
        self.runs.lock().unwrap().push_back(ScriptedRun::Events(events));
        self
    }

    /// Queue a run whose stream delivers `events` and then stays open.
    pub fn with_open_stream(self, events: Vec<Result<CrawlEvent, CrawlerError>>) -> Self {
        self.runs.lock().unwrap().push_back(ScriptedRun::Open(events));
        self
    }

    /// Queue a run whose start request fails.
    pub fn with_start_failure(self, error: CrawlerError) -> Self {
        self.runs
            .lock()
            .unwrap()
            .push_back(ScriptedRun::StartFailure(error));
        self
    }

    /// Job ids passed to `stop` so far.
    pub fn stop_calls(&self) -> Vec<String> {
        self.stop_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CrawlService for ScriptedCrawlService {
    async fn start(&self, _request: &CrawlRequest) -> Result<CrawlStream, CrawlerError> {
        let run = self
            .runs
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted run queued for start()");

        match run {
            ScriptedRun::StartFailure(error) => Err(error),
            ScriptedRun::Events(events) => Ok(CrawlStream {
                job_id: self.job_id.clone(),
                events: stream::iter(events).boxed(),
            }),
            ScriptedRun::Open(events) => Ok(CrawlStream {
                job_id: self.job_id.clone(),
                events: stream::iter(events).chain(stream::pending()).boxed(),
            }),
        }
    }

    async fn stop(&self, job_id: &str) -> Result<(), CrawlerError> {
        self.stop_calls.lock().unwrap().push(job_id.to_string());
        Ok(())
    }
}
