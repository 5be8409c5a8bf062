//! Incremental Server-Sent Events decoding over a response body.

use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use crate::Error;

/// Upper bound on an undelimited frame before the stream is declared broken.
const MAX_BUFFERED_BYTES: usize = 1 << 20;

/// One decoded SSE frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Value of the `event:` field, if present.
    pub event_type: Option<String>,
    /// All `data:` lines joined with `\n`.
    pub data: String,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
        }
    }

    /// OpenAI-style end-of-stream sentinel.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    /// Parse one frame. Frames without data (comments, keep-alives) yield `None`.
    fn parse(frame: &str) -> Option<Self> {
        let mut event_type = None;
        let mut data_lines = Vec::new();

        for line in frame.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "event" => event_type = Some(value.to_string()),
                "data" => data_lines.push(value),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return None;
        }
        Some(Self {
            event_type,
            data: data_lines.join("\n"),
        })
    }
}

/// Splits a byte stream into SSE frames.
///
/// Frames may straddle chunk boundaries (including inside a multi-byte UTF-8
/// character); bytes are buffered until a blank-line delimiter arrives.
pub struct SseStream<S> {
    inner: S,
    buffer: Vec<u8>,
    pending: VecDeque<SseEvent>,
    finished: bool,
    /// Reported once the frames decoded before the failure are delivered.
    failed: Option<Error>,
}

impl<S> SseStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
            failed: None,
        }
    }

    /// Position and length of the first frame delimiter in `haystack`.
    fn find_delimiter(haystack: &[u8]) -> Option<(usize, usize)> {
        let lf = memmem::find(haystack, b"\n\n").map(|pos| (pos, 2));
        let crlf = memmem::find(haystack, b"\r\n\r\n").map(|pos| (pos, 4));
        match (lf, crlf) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        }
    }

    fn drain_frames(&mut self) -> Result<(), Error> {
        let mut start = 0;
        while let Some((pos, len)) = Self::find_delimiter(&self.buffer[start..]) {
            let frame = std::str::from_utf8(&self.buffer[start..start + pos])
                .map_err(|e| Error::streaming(format!("Invalid UTF-8 in SSE frame: {e}")))?;
            if let Some(event) = SseEvent::parse(frame) {
                tracing::trace!(event = ?event.event_type, "sse frame");
                self.pending.push_back(event);
            }
            start += pos + len;
        }
        self.buffer.drain(..start);
        Ok(())
    }

    /// Whatever is left once the body ends without a trailing delimiter.
    fn flush_tail(&mut self) -> Option<SseEvent> {
        let tail = std::mem::take(&mut self.buffer);
        let text = std::str::from_utf8(&tail).ok()?.trim();
        if text.is_empty() {
            return None;
        }
        SseEvent::parse(text)
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Error>,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.finished {
                return Poll::Ready(self.failed.take().map(Err));
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    if let Err(e) = self.drain_frames() {
                        self.finished = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                    // Only the undelimited tail counts against the cap.
                    if self.buffer.len() > MAX_BUFFERED_BYTES {
                        self.buffer.clear();
                        self.finished = true;
                        self.failed = Some(Error::streaming("SSE frame exceeded maximum size"));
                    }
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => {
                    self.finished = true;
                    if let Some(event) = self.flush_tail() {
                        return Poll::Ready(Some(Ok(event)));
                    }
                }
            }
        }
    }
}

/// Extension trait to add SSE decoding to byte streams.
pub trait SseStreamExt: Stream {
    fn sse_events(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self)
    }
}

impl<S: Stream> SseStreamExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = Result<bytes::Bytes, Error>> + Unpin {
        let owned: Vec<Result<bytes::Bytes, Error>> = parts
            .iter()
            .map(|p| Ok(bytes::Bytes::copy_from_slice(p)))
            .collect();
        stream::iter(owned)
    }

    async fn collect_data(parts: &[&[u8]]) -> Vec<String> {
        chunks(parts)
            .sse_events()
            .map(|event| event.unwrap().data)
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks() {
        let data = collect_data(&[b"data: Hel", b"lo World\n\ndata: ", b"Second\n\n"]).await;
        assert_eq!(data, vec!["Hello World", "Second"]);
    }

    #[tokio::test]
    async fn test_crlf_delimiters() {
        let data = collect_data(&[b"data: one\r\n\r\ndata: two\r\n\r\n"]).await;
        assert_eq!(data, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_event_type_and_multiline_data() {
        let mut sse = chunks(&[b"event: message_delta\ndata: a\ndata: b\n\n"]).sse_events();
        let event = sse.next().await.unwrap().unwrap();
        assert_eq!(event.event_type.as_deref(), Some("message_delta"));
        assert_eq!(event.data, "a\nb");
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_comment_frames_are_skipped() {
        let data = collect_data(&[b": keep-alive\n\ndata: real\n\n"]).await;
        assert_eq!(data, vec!["real"]);
    }

    #[tokio::test]
    async fn test_utf8_split_inside_character() {
        let euro = "€".as_bytes();
        let first = [b"data: Price: ".as_slice(), &euro[..2]].concat();
        let second = [&euro[2..], b"100\n\n".as_slice()].concat();
        let data = collect_data(&[&first, &second]).await;
        assert_eq!(data, vec!["Price: €100"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_an_error() {
        let mut sse = chunks(&[b"data: bad \xFF\xFE bytes\n\n"]).sse_events();
        assert!(sse.next().await.unwrap().is_err());
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_tail_without_delimiter() {
        let data = collect_data(&[b"data: first\n\n", b"data: [DONE]"]).await;
        assert_eq!(data, vec!["first", "[DONE]"]);
        assert!(SseEvent::new("[DONE]").is_done());
    }

    #[tokio::test]
    async fn test_large_chunk_of_small_frames() {
        let frame = b"data: {\"choices\":[]}\n\n";
        let body = frame.repeat(MAX_BUFFERED_BYTES / frame.len() + 10);
        assert!(body.len() > MAX_BUFFERED_BYTES);

        let data = collect_data(&[&body]).await;
        assert_eq!(data.len(), MAX_BUFFERED_BYTES / frame.len() + 10);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_an_error() {
        let body = vec![b'a'; MAX_BUFFERED_BYTES + 1];
        let mut sse = chunks(&[b"data: ", &body]).sse_events();
        assert!(sse.next().await.unwrap().is_err());
        assert!(sse.next().await.is_none());
    }

    #[tokio::test]
    async fn test_body_error_passes_through() {
        let parts: Vec<Result<bytes::Bytes, Error>> = vec![
            Ok(bytes::Bytes::from_static(b"data: first\n\n")),
            Err(Error::api("openai", 502, "bad gateway")),
        ];
        let mut sse = stream::iter(parts).sse_events();

        assert_eq!(sse.next().await.unwrap().unwrap().data, "first");
        match sse.next().await.unwrap() {
            Err(Error::Transport(crate::TransportError::Api { status, .. })) => {
                assert_eq!(status, 502)
            }
            other => panic!("expected the body error unchanged, got {other:?}"),
        }
        assert!(sse.next().await.is_none());
    }
}
