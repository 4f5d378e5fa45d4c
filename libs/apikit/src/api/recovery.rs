//! Panic recovery for the request pipeline.
//!
//! A panic raised before the inner service produced a response becomes the
//! generic 500 problem. Once a response exists its status and headers are
//! committed: a panic while the body streams only ends the body early.
//! Panicking with [`AbortHandler`] skips recovery entirely and keeps unwinding.

use std::{
    any::Any,
    backtrace::Backtrace,
    convert::Infallible,
    panic::{self, AssertUnwindSafe},
    task::{Context, Poll},
};

use axum::{
    body::{Body, HttpBody},
    http::{HeaderMap, Request},
    response::Response,
};
use futures::{future::BoxFuture, FutureExt, StreamExt};
use tower::{Layer, Service};

use super::problem::internal_error;
use super::render::{render_problem, RequestMeta};

/// Panic payload meaning "drop the connection, do not answer".
#[derive(Debug, Clone, Copy)]
pub struct AbortHandler;

/// Abort the current request without writing a response.
pub fn abort_handler() -> ! {
    panic::panic_any(AbortHandler)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecoveryLayer;

impl RecoveryLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RecoveryLayer {
    type Service = Recovery<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Recovery { inner }
    }
}

#[derive(Clone, Debug)]
pub struct Recovery<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for Recovery<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let meta = RequestMeta::from_request(&req);
        // The ready service goes into the future; a fresh clone waits for the next poll_ready.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let outcome = AssertUnwindSafe(async move { inner.call(req).await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(resp)) => Ok(guard_body(resp, meta)),
                Ok(Err(never)) => match never {},
                Err(payload) => {
                    log_panic(payload, &meta, "handler panicked");
                    Ok(render_problem(&internal_error().0, &meta, HeaderMap::new()))
                }
            }
        })
    }
}

/// Re-wrap streaming bodies so a panic mid-stream truncates instead of unwinding
/// into the transport.
fn guard_body(resp: Response, meta: RequestMeta) -> Response {
    if resp.body().size_hint().exact().is_some() {
        return resp;
    }

    let (parts, body) = resp.into_parts();
    let stream = AssertUnwindSafe(body.into_data_stream())
        .catch_unwind()
        .filter_map(move |item| {
            let chunk = match item {
                Ok(chunk) => Some(chunk),
                Err(payload) => {
                    log_panic(payload, &meta, "panic while streaming response body");
                    None
                }
            };
            futures::future::ready(chunk)
        });
    Response::from_parts(parts, Body::from_stream(stream))
}

/// Log a caught panic, or keep unwinding if it is an [`AbortHandler`].
fn log_panic(payload: Box<dyn Any + Send>, meta: &RequestMeta, msg: &str) {
    if payload.is::<AbortHandler>() {
        panic::resume_unwind(payload);
    }
    let reason = panic_message(payload.as_ref());
    tracing::error!(
        method = %meta.method,
        path = %meta.path,
        panic = %reason,
        backtrace = %Backtrace::force_capture(),
        "{msg}"
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
