//! Outbound request body with an end-of-upload signal.
//!
//! The upstream timeout only covers the wait for response headers, so the
//! proxy needs to know when the caller's body has been fully handed to the
//! backend. [`UploadBody`] forwards every frame unchanged and fires a
//! oneshot once the stream ends, errors, or is dropped.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use tokio::sync::oneshot;

pin_project! {
    /// Pass-through body that reports when it has been fully sent.
    pub struct UploadBody<B> {
        #[pin]
        inner: B,
        done: Option<oneshot::Sender<()>>,
    }
}

impl<B: Body> UploadBody<B> {
    /// Wrap `inner`. The receiver resolves when the upload is over.
    ///
    /// A body that is already at its end (e.g. a GET) signals at once,
    /// since the client may never poll it.
    pub fn new(inner: B) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let done = if inner.is_end_stream() {
            let _ = tx.send(());
            None
        } else {
            Some(tx)
        };
        (Self { inner, done }, rx)
    }
}

impl<B> Body for UploadBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        let polled = ready!(this.inner.as_mut().poll_frame(cx));

        let finished = match &polled {
            Some(Ok(_)) => this.inner.is_end_stream(),
            Some(Err(_)) | None => true,
        };
        if finished {
            if let Some(done) = this.done.take() {
                let _ = done.send(());
            }
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
