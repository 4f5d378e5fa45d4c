use axum::http::{HeaderMap, HeaderName, Request};
use axum::{body::Body, middleware::Next, response::Response};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::field::Empty;

#[derive(Clone, Debug)]
pub struct XRequestId(pub String);

pub fn header() -> HeaderName {
    HeaderName::from_static("x-request-id")
}

const CLOUD_TRACE_HEADER: &str = "x-cloud-trace-context";

#[derive(Clone, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &Request<B>) -> Option<RequestId> {
        let id = nanoid::nanoid!();
        Some(RequestId::new(id.parse().ok()?))
    }
}

fn request_id_of(headers: &HeaderMap) -> &str {
    headers
        .get(header())
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a")
}

/// Id recorded on the request span: the [`XRequestId`] extension, else the header.
fn span_request_id<B>(req: &Request<B>) -> &str {
    req.extensions()
        .get::<XRequestId>()
        .map(|rid| rid.0.as_str())
        .unwrap_or_else(|| request_id_of(req.headers()))
}

/// Stores the request id in request extensions for handlers and the trace span.
pub async fn push_req_id_to_extensions(mut req: Request<Body>, next: Next) -> Response {
    let rid = request_id_of(req.headers()).to_owned();
    req.extensions_mut().insert(XRequestId(rid));
    next.run(req).await
}

/// `projects/{project}/traces/{trace}` from an `X-Cloud-Trace-Context` header
/// (`TRACE_ID/SPAN_ID;o=OPTIONS`).
pub fn cloud_trace(project_id: Option<&str>, headers: &HeaderMap) -> Option<String> {
    let project = project_id.map(str::trim).filter(|p| !p.is_empty())?;
    let raw = headers.get(CLOUD_TRACE_HEADER)?.to_str().ok()?;
    let trace = raw.split(['/', ';']).next()?.trim();
    if trace.is_empty() {
        return None;
    }
    Some(format!("projects/{project}/traces/{trace}"))
}

/// `http_request` span carrying the request id and, when a project id is
/// configured, the Cloud Trace correlation id.
#[allow(clippy::type_complexity)]
pub fn create_trace_layer(
    project_id: Option<String>,
) -> tower_http::trace::TraceLayer<
    tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>,
    impl Fn(&Request<Body>) -> tracing::Span + Clone,
> {
    use tower_http::trace::TraceLayer;

    TraceLayer::new_for_http().make_span_with(move |req: &Request<Body>| {
        let span = tracing::info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri().path(),
            version = ?req.version(),
            module = "api_ingress",
            request_id = %span_request_id(req),
            trace = Empty,
        );
        if let Some(trace) = cloud_trace(project_id.as_deref(), req.headers()) {
            span.record("trace", trace.as_str());
        }
        span
    })
}
