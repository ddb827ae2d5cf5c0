use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use http::{Request, Response};
use http_body::Body;
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tracing::debug;

use reqlog_core::{AccessLogConfig, AccessLogger, CompletionTracker, Env, Exchange, Trigger};

use crate::body::AccessLogBody;
use crate::request::exchange_from_request;

/// Layer that emits one access-log line per exchange.
///
/// # Example
///
/// ```ignore
/// use reqlog::{AccessLogConfig, AccessLogLayer};
///
/// let app = Router::new()
///     .route("/", get(index))
///     .layer(AccessLogLayer::new(AccessLogConfig::new().with_folder("logs")));
/// ```
#[derive(Clone, Debug)]
pub struct AccessLogLayer {
    logger: Arc<AccessLogger>,
}

impl AccessLogLayer {
    pub fn new(config: AccessLogConfig) -> Self {
        Self::from_logger(Arc::new(AccessLogger::new(config)))
    }

    /// Share an existing logger (and its file stream) between layers.
    pub fn from_logger(logger: Arc<AccessLogger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Arc<AccessLogger> {
        &self.logger
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

/// Service wrapper for [`AccessLogLayer`].
#[derive(Clone, Debug)]
pub struct AccessLogService<S> {
    inner: S,
    logger: Arc<AccessLogger>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body,
{
    type Response = Response<AccessLogBody<ResBody>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let exchange = Arc::new(exchange_from_request(&req));
        let env = req.extensions().get::<Env>().copied().unwrap_or_default();

        let tracker = self.logger.arm(exchange.clone(), env);
        req.extensions_mut().insert(tracker.handle());

        ResponseFuture {
            inner: self.inner.call(req),
            exchange,
            tracker: Some(tracker),
        }
    }
}

pin_project! {
    /// Future for [`AccessLogService`]. Dropping it before the response is
    /// produced finalizes the exchange with [`Trigger::Close`].
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        exchange: Arc<Exchange>,
        tracker: Option<CompletionTracker>,
    }

    impl<F> PinnedDrop for ResponseFuture<F> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if let Some(tracker) = this.tracker.take() {
                tracker.finalize(Trigger::Close);
            }
        }
    }
}

impl<F, B, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
    B: Body,
{
    type Output = Result<Response<AccessLogBody<B>>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = ready!(this.inner.poll(cx));
        let tracker = this
            .tracker
            .take()
            .expect("ResponseFuture polled after completion");

        match result {
            Ok(response) => {
                this.exchange.set_status(response.status().as_u16());
                Poll::Ready(Ok(response.map(|body| AccessLogBody::new(body, tracker))))
            }
            Err(err) => {
                debug!(url = %this.exchange.url, "inner service failed");
                tracker.finalize(Trigger::Error);
                Poll::Ready(Err(err))
            }
        }
    }
}
