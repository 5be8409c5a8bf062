//! The pull-based reader over one streaming chat completion session.

use futures_util::stream::Stream;
use futures_util::StreamExt;
use std::collections::BTreeSet;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use crate::accumulator::ResponseAccumulator;
use crate::{ChatResponse, Error, StreamResponse};

/// Normalized events as produced by a provider adapter.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamResponse, Error>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    /// Every choice has reported its finish reason, or the vendor ended the stream.
    Finished,
    Closed,
}

/// A single-consumer reader bound to one open vendor stream.
///
/// `next` yields one normalized chunk at a time and `Ok(None)` at end of
/// stream. The vendor session is released by `close`, on the first error,
/// when the stream finishes, or when the reader is dropped.
pub struct ChatStream {
    inner: Option<EventStream>,
    state: State,
    cancel: CancellationToken,
    seen: BTreeSet<u32>,
    finished: BTreeSet<u32>,
}

impl ChatStream {
    /// Wrap an adapter's event stream; `cancel` aborts any pending `next`.
    pub fn new<S>(events: S, cancel: CancellationToken) -> Self
    where
        S: Stream<Item = Result<StreamResponse, Error>> + Send + 'static,
    {
        Self {
            inner: Some(Box::pin(events)),
            state: State::Open,
            cancel,
            seen: BTreeSet::new(),
            finished: BTreeSet::new(),
        }
    }

    /// Wrap an event stream that is never cancelled.
    pub fn from_stream<S>(events: S) -> Self
    where
        S: Stream<Item = Result<StreamResponse, Error>> + Send + 'static,
    {
        Self::new(events, CancellationToken::new())
    }

    /// Wait for the next chunk that carries something for the caller.
    ///
    /// Returns `Ok(None)` at end of stream. Fails with the vendor's error if the
    /// connection breaks, with `Error::Cancelled` if the call's token fires, and
    /// with `Error::InvalidState` once the reader is closed.
    pub async fn next(&mut self) -> Result<Option<StreamResponse>, Error> {
        loop {
            match self.state {
                State::Closed => return Err(Error::InvalidState),
                State::Finished => return Ok(None),
                State::Open => {}
            }

            let cancel = self.cancel.clone();
            let Some(inner) = self.inner.as_mut() else {
                return Err(Error::InvalidState);
            };
            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = inner.next() => Some(item),
            };

            match polled {
                None => {
                    self.close();
                    return Err(Error::Cancelled);
                }
                Some(None) => {
                    self.finish();
                    return Ok(None);
                }
                Some(Some(Err(e))) => {
                    tracing::debug!(error = %e, "stream failed");
                    self.close();
                    return Err(e);
                }
                Some(Some(Ok(chunk))) => {
                    if let Some(chunk) = self.admit(chunk) {
                        return Ok(Some(chunk));
                    }
                }
            }
        }
    }

    /// Release the vendor session. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.state != State::Closed {
            self.inner = None;
            self.state = State::Closed;
            tracing::trace!("chat stream closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// True once `next` can only report end of stream.
    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Consume the rest of the stream into a complete response.
    pub async fn buffer(mut self) -> Result<ChatResponse, Error> {
        let mut accumulator = ResponseAccumulator::new();
        while let Some(chunk) = self.next().await? {
            accumulator.process(&chunk);
        }
        self.close();
        Ok(accumulator.finalize())
    }

    /// Consume the rest of the stream and return the primary choice's text.
    pub async fn text(self) -> Result<String, Error> {
        let response = self.buffer().await?;
        Ok(response.content().to_string())
    }

    /// Drop what the caller must not see and track per-choice termination.
    fn admit(&mut self, mut chunk: StreamResponse) -> Option<StreamResponse> {
        let finished = &self.finished;
        chunk.choices.retain(|choice| {
            !finished.contains(&choice.index)
                && (choice.finish_reason.is_terminal() || !choice.delta.is_empty())
        });
        if chunk.choices.is_empty() {
            return None;
        }

        for choice in &chunk.choices {
            self.seen.insert(choice.index);
            if choice.finish_reason.is_terminal() {
                self.finished.insert(choice.index);
            }
        }
        if !self.finished.is_empty() && self.seen.is_subset(&self.finished) {
            self.finish();
        }
        Some(chunk)
    }

    fn finish(&mut self) {
        self.inner = None;
        self.state = State::Finished;
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("state", &self.state)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
