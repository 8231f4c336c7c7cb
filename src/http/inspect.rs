//! Size-capped response body inspection.
//!
//! Wraps a backend body so that a bounded prefix is copied for debug
//! logging while every frame is passed through unchanged and in order.
//! Nothing is buffered beyond `limit` bytes.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

pin_project! {
    /// Body wrapper that logs a prefix of the stream when it ends.
    pub struct InspectedBody<B> {
        #[pin]
        inner: B,
        capture: Capture,
    }
}

impl<B> InspectedBody<B> {
    /// Wrap `inner`, keeping at most `limit` bytes for the log line.
    pub fn new(inner: B, limit: usize, request_id: impl Into<String>) -> Self {
        Self {
            inner,
            capture: Capture::new(limit, request_id.into()),
        }
    }
}

impl<B> Body for InspectedBody<B>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let polled = ready!(this.inner.poll_frame(cx));

        match &polled {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.capture.record(data);
                }
            }
            Some(Err(e)) => this.capture.finish(Some(&e.to_string())),
            None => this.capture.finish(None),
        }

        Poll::Ready(polled)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Bounded copy of the first bytes of a body.
#[derive(Debug)]
struct Capture {
    request_id: String,
    limit: usize,
    captured: BytesMut,
    total: u64,
    logged: bool,
}

impl Capture {
    fn new(limit: usize, request_id: String) -> Self {
        Self {
            request_id,
            limit,
            captured: BytesMut::with_capacity(limit.min(8 * 1024)),
            total: 0,
            logged: false,
        }
    }

    fn record(&mut self, data: &Bytes) {
        self.total += data.len() as u64;
        let room = self.limit.saturating_sub(self.captured.len());
        if room > 0 {
            let take = room.min(data.len());
            self.captured.extend_from_slice(&data[..take]);
        }
    }

    fn truncated(&self) -> bool {
        self.total > self.captured.len() as u64
    }

    fn finish(&mut self, error: Option<&str>) {
        if self.logged {
            return;
        }
        self.logged = true;

        let body = String::from_utf8_lossy(&self.captured);
        match error {
            None => tracing::debug!(
                request_id = %self.request_id,
                total_bytes = self.total,
                truncated = self.truncated(),
                body = %body,
                "Response body"
            ),
            Some(error) => tracing::debug!(
                request_id = %self.request_id,
                total_bytes = self.total,
                error = %error,
                body = %body,
                "Response body ended with error"
            ),
        }
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        if !self.logged {
            tracing::debug!(
                request_id = %self.request_id,
                total_bytes = self.total,
                "Response body dropped before completion"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body as AxumBody;

    #[test]
    fn capture_is_bounded() {
        let mut capture = Capture::new(5, "req".to_string());
        capture.record(&Bytes::from_static(b"abc"));
        capture.record(&Bytes::from_static(b"defgh"));
        capture.record(&Bytes::from_static(b"ijk"));

        assert_eq!(&capture.captured[..], b"abcde");
        assert_eq!(capture.total, 11);
        assert!(capture.truncated());
        capture.finish(None);
        assert!(capture.logged);
    }

    #[test]
    fn zero_limit_captures_nothing() {
        let mut capture = Capture::new(0, "req".to_string());
        capture.record(&Bytes::from_static(b"abc"));
        assert!(capture.captured.is_empty());
        assert_eq!(capture.total, 3);
    }

    #[tokio::test]
    async fn passes_every_byte_through() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let body = AxumBody::new(InspectedBody::new(
            AxumBody::from(payload.clone()),
            16,
            "req",
        ));

        let collected = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(collected.len(), payload.len());
        assert_eq!(&collected[..], &payload[..]);
    }
}
