//! NDJSON stream decoder for crawl events.
//!
//! Converts a raw `reqwest` byte stream into typed `CrawlEvent` values.
//! Handles lines split across chunk boundaries and a final line without a
//! trailing newline.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;

use crate::error::{CrawlerError, Result};
use crate::events::{classify_record, CrawlEvent};

/// Push-style decoder reassembling NDJSON records from byte chunks.
///
/// State is one trailing partial line; everything before the last newline in
/// the buffer is decoded on each `feed`. `finish` flushes that remainder at
/// end-of-stream.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: String,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every complete line in `chunk` (plus any carried-over prefix),
    /// in arrival order. Empty lines are skipped; unrecognized record shapes
    /// are logged and skipped inside `classify_record`.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<CrawlEvent>> {
        let text = std::str::from_utf8(chunk)
            .map_err(|e| CrawlerError::Decode(format!("invalid UTF-8 in stream: {}", e)))?;
        self.buffer.push_str(text);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim().to_string();
            self.buffer.drain(..=newline_pos);

            if line.is_empty() {
                continue;
            }
            if let Some(event) = classify_record(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Flush the trailing partial line at end-of-stream. A non-empty
    /// remainder that fails to parse is a decode error, not a silent drop.
    pub fn finish(&mut self) -> Result<Option<CrawlEvent>> {
        let remainder = std::mem::take(&mut self.buffer);
        let line = remainder.trim();
        if line.is_empty() {
            return Ok(None);
        }
        classify_record(line)
    }
}

/// Stream adapter that converts raw response bytes into `CrawlEvent` values.
pub struct CrawlEventStream {
    inner: Pin<Box<dyn Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send>>,
    decoder: EventDecoder,
    pending: VecDeque<CrawlEvent>,
    done: bool,
}

impl CrawlEventStream {
    pub(crate) fn new(
        byte_stream: impl Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            decoder: EventDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }
}

impl Stream for CrawlEventStream {
    type Item = Result<CrawlEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => match this.decoder.feed(&bytes) {
                    Ok(events) => this.pending.extend(events),
                    Err(e) => {
                        this.done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(CrawlerError::Network(e.to_string()))));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    return match this.decoder.finish() {
                        Ok(Some(event)) => Poll::Ready(Some(Ok(event))),
                        Ok(None) => Poll::Ready(None),
                        Err(e) => Poll::Ready(Some(Err(e))),
                    };
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
