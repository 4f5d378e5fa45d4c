//! Rendering of [`Problem`] documents into HTTP responses.

use axum::{
    body::Body,
    http::{header, Extensions, HeaderMap, HeaderValue, Method, Request, Uri},
    response::{IntoResponse, Response},
};

use super::negotiate::WireFormat;
use super::problem::Problem;
use crate::errors;

/// Request extension set by a TLS-terminating acceptor.
#[derive(Clone, Copy, Debug, Default)]
pub struct TlsConnection;

/// What the renderer needs to know about the request being answered.
///
/// Captured before the request is handed to the inner service, so it stays
/// available after the request itself has been consumed.
#[derive(Clone, Debug)]
pub struct RequestMeta {
    pub scheme: &'static str,
    pub host: String,
    pub format: WireFormat,
    pub method: Method,
    pub path: String,
}

impl RequestMeta {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self::capture(req.method(), req.uri(), req.headers(), req.extensions())
    }

    fn capture(method: &Method, uri: &Uri, headers: &HeaderMap, ext: &Extensions) -> Self {
        let forwarded_https = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("https"));
        let tls = ext.get::<TlsConnection>().is_some()
            || uri.scheme_str() == Some("https")
            || forwarded_https;

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_owned)
            .or_else(|| uri.authority().map(|a| a.as_str().to_owned()))
            .unwrap_or_else(|| "localhost".to_owned());

        Self {
            scheme: if tls { "https" } else { "http" },
            host,
            format: WireFormat::from_headers(headers),
            method: method.clone(),
            path: uri.path().to_owned(),
        }
    }

    pub fn schema_url(&self) -> String {
        format!("{}://{}/schemas/ErrorModel.json", self.scheme, self.host)
    }
}

/// Merge `tokens` into the `Vary` header, keeping existing tokens first and
/// collapsing every `Vary` line into one.
pub fn merge_vary(headers: &mut HeaderMap, tokens: &[&str]) {
    let mut merged: Vec<String> = Vec::new();
    let existing = headers
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(','))
        .map(str::trim);
    for token in existing.chain(tokens.iter().copied()) {
        if !token.is_empty() && !merged.iter().any(|m| m == token) {
            merged.push(token.to_owned());
        }
    }

    headers.remove(header::VARY);
    if let Ok(value) = HeaderValue::from_str(&merged.join(", ")) {
        headers.insert(header::VARY, value);
    }
}

/// Serialize `problem` in the request's negotiated format.
///
/// `headers` are kept (e.g. `Allow`, pagination `Link`), except for any stale
/// `Content-Type`/`Content-Length`.
pub fn render_problem(problem: &Problem, meta: &RequestMeta, mut headers: HeaderMap) -> Response {
    let schema_url = meta.schema_url();
    let doc = problem.clone().with_schema_url(schema_url.clone());

    let body = match meta.format.encode(&doc) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, status = doc.status, "failed to encode problem document");
            return (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                errors::INTERNAL_DETAIL,
            )
                .into_response();
        }
    };

    headers.remove(header::CONTENT_TYPE);
    headers.remove(header::CONTENT_LENGTH);
    merge_vary(&mut headers, &["Origin", "Accept"]);
    if let Ok(link) = HeaderValue::from_str(&format!("<{schema_url}>; rel=\"describedBy\"")) {
        headers.append(header::LINK, link);
    }
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(meta.format.problem_content_type()),
    );

    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = doc.status_code();
    *resp.headers_mut() = headers;
    resp
}
