use std::pin::Pin;
use std::task::{ready, Context, Poll};

use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

use reqlog_core::{CompletionTracker, Trigger};

pin_project! {
    /// Response body that reports completion signals to the exchange's tracker.
    ///
    /// Reaching end of stream finalizes with [`Trigger::Finish`], an error frame with
    /// [`Trigger::Error`], and dropping the body early with [`Trigger::Close`].
    pub struct AccessLogBody<B> {
        #[pin]
        inner: B,
        tracker: CompletionTracker,
    }

    impl<B> PinnedDrop for AccessLogBody<B> {
        fn drop(this: Pin<&mut Self>) {
            this.tracker.finalize(Trigger::Close);
        }
    }
}

impl<B> AccessLogBody<B> {
    pub(crate) fn new(inner: B, tracker: CompletionTracker) -> Self {
        Self { inner, tracker }
    }
}

impl<B: Body> Body for AccessLogBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        let frame = ready!(this.inner.as_mut().poll_frame(cx));
        match frame {
            None => {
                this.tracker.finalize(Trigger::Finish);
            }
            Some(Err(_)) => {
                this.tracker.finalize(Trigger::Error);
            }
            Some(Ok(_)) if this.inner.is_end_stream() => {
                this.tracker.finalize(Trigger::Finish);
            }
            Some(Ok(_)) => {}
        }
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        // Servers may stop polling once this reports true
        let end = self.inner.is_end_stream();
        if end {
            self.tracker.finalize(Trigger::Finish);
        }
        end
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
