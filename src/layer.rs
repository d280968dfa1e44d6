//! Tower middleware which wraps connections in a [`LoggedIo`].
//!
//! [`LoggedIoLayer`] sits on top of any connector-style service, one which
//! responds with a stream, and wraps every stream it returns in a proxy
//! reporting to a clone of the layer's reporter.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use crate::LoggedIo;

/// A layer which wraps the streams returned by a service in a [`LoggedIo`].
///
/// ```
/// # async fn example() -> std::io::Result<()> {
/// use std::sync::Arc;
/// use tower::{Layer, ServiceExt, service_fn};
/// use loggedio::LoggedIoLayer;
/// use loggedio::report::Recorder;
///
/// let recorder = Arc::new(Recorder::new());
/// let connect = service_fn(|_: ()| async { Ok::<_, std::io::Error>(Vec::<u8>::new()) });
///
/// let io = LoggedIoLayer::new(recorder.clone())
///     .layer(connect)
///     .oneshot(())
///     .await?;
/// # let _ = io;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LoggedIoLayer<R> {
    reporter: R,
}

impl<R> LoggedIoLayer<R> {
    /// Create a layer which reports to clones of `reporter`.
    pub fn new(reporter: R) -> Self {
        Self { reporter }
    }
}

impl<S, R> tower::Layer<S> for LoggedIoLayer<R>
where
    R: Clone,
{
    type Service = LoggedIoService<S, R>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggedIoService::new(inner, self.reporter.clone())
    }
}

/// A service which wraps the streams returned by its inner service.
#[derive(Debug, Clone)]
pub struct LoggedIoService<S, R> {
    service: S,
    reporter: R,
}

impl<S, R> LoggedIoService<S, R> {
    /// Wrap the streams returned by `service`, reporting to clones of `reporter`.
    pub fn new(service: S, reporter: R) -> Self {
        Self { service, reporter }
    }

    /// Get a reference to the inner service.
    pub fn get_ref(&self) -> &S {
        &self.service
    }

    /// Unwrap the inner service.
    pub fn into_inner(self) -> S {
        self.service
    }
}

impl<S, R, Req> tower::Service<Req> for LoggedIoService<S, R>
where
    S: tower::Service<Req>,
    R: Clone,
{
    type Response = LoggedIo<S::Response, R>;
    type Error = S::Error;
    type Future = LoggedIoFuture<S::Future, R>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        LoggedIoFuture::new(self.service.call(req), self.reporter.clone())
    }
}

/// Future returned by [`LoggedIoService`].
#[pin_project::pin_project]
pub struct LoggedIoFuture<F, R> {
    #[pin]
    future: F,
    reporter: R,
}

impl<F, R> LoggedIoFuture<F, R> {
    fn new(future: F, reporter: R) -> Self {
        Self { future, reporter }
    }
}

impl<F, R> fmt::Debug for LoggedIoFuture<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggedIoFuture").finish_non_exhaustive()
    }
}

impl<F, R, IO, E> Future for LoggedIoFuture<F, R>
where
    F: Future<Output = Result<IO, E>>,
    R: Clone,
{
    type Output = Result<LoggedIo<IO, R>, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let io = ready!(this.future.poll(cx))?;
        tracing::trace!("wrapping connection in logged proxy");
        Poll::Ready(Ok(LoggedIo::new(io, this.reporter.clone())))
    }
}
