use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::negotiate::WireFormat;
use super::problem::internal_error;
use super::render::merge_vary;

/// Extractor for the representation negotiated from `Accept`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Negotiate(pub WireFormat);

impl<S> FromRequestParts<S> for Negotiate
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(WireFormat::from_headers(&parts.headers)))
    }
}

/// A success body serialized as JSON or CBOR.
#[derive(Debug)]
pub struct Negotiated<T> {
    pub format: WireFormat,
    pub status: StatusCode,
    pub body: T,
    pub headers: HeaderMap,
}

impl<T> Negotiated<T> {
    pub fn new(format: WireFormat, status: StatusCode, body: T) -> Self {
        Self {
            format,
            status,
            body,
            headers: HeaderMap::new(),
        }
    }

    /// Add a header; invalid values are dropped with a warning.
    pub fn with_header(mut self, name: HeaderName, value: impl AsRef<str>) -> Self {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(v) => {
                self.headers.append(name, v);
            }
            Err(e) => tracing::warn!(header = %name, error = %e, "dropping invalid header value"),
        }
        self
    }
}

impl<T: Serialize> IntoResponse for Negotiated<T> {
    fn into_response(self) -> Response {
        let bytes = match self.format.encode(&self.body) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response body");
                return internal_error().into_response();
            }
        };

        let mut headers = self.headers;
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.format.content_type()),
        );
        merge_vary(&mut headers, &["Accept"]);

        let mut resp = Response::new(Body::from(bytes));
        *resp.status_mut() = self.status;
        *resp.headers_mut() = headers;
        resp
    }
}

/// 200 with `value` in the negotiated format.
pub fn ok<T: Serialize>(format: WireFormat, value: T) -> Negotiated<T> {
    Negotiated::new(format, StatusCode::OK, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn negotiate_extractor_reads_accept() {
        let req = axum::http::Request::builder()
            .header(header::ACCEPT, "application/cbor")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let Negotiate(format) = Negotiate::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(format, WireFormat::Cbor);
    }

    #[test]
    fn json_response_headers() {
        let resp = ok(WireFormat::Json, json!({"a": 1}))
            .with_header(header::LINK, "</items?cursor=x>; rel=\"next\"")
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(resp.headers().get(header::VARY).unwrap(), "Accept");
        assert!(resp.headers().get(header::LINK).is_some());
    }

    #[test]
    fn cbor_response_content_type() {
        let resp = ok(WireFormat::Cbor, json!({"a": 1})).into_response();
        assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/cbor");
    }

    #[test]
    fn invalid_header_value_is_dropped() {
        let n = ok(WireFormat::Json, 1).with_header(header::LINK, "bad\nvalue");
        assert!(n.headers.is_empty());
    }
}
