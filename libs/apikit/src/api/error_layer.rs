//! Middleware that turns every error response into Problem Details.
//!
//! Two kinds of responses are rewritten on the way out:
//! * [`ProblemResponse`](super::ProblemResponse)s returned by handlers, re-rendered
//!   in the negotiated format with the schema link;
//! * the router's bare 404 and 405 responses.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use super::problem::{PendingProblem, Problem};
use super::render::{render_problem, RequestMeta};
use super::routes::{allowed_methods, MethodProbe};
use crate::errors;

pub fn not_found() -> Problem {
    errors::NOT_FOUND.to_problem("resource not found")
}

pub fn method_not_allowed(method: &Method) -> Problem {
    errors::METHOD_NOT_ALLOWED.to_problem(format!("method {method} not allowed"))
}

/// Use with `axum::middleware::from_fn_with_state(probe, problem_middleware)`.
pub async fn problem_middleware(
    State(probe): State<Arc<dyn MethodProbe>>,
    req: Request,
    next: Next,
) -> Response {
    let meta = RequestMeta::from_request(&req);
    let resp = next.run(req).await;
    map_error_response(resp, &meta, probe.as_ref())
}

fn map_error_response(resp: Response, meta: &RequestMeta, probe: &dyn MethodProbe) -> Response {
    if let Some(PendingProblem(problem)) = resp.extensions().get::<PendingProblem>().cloned() {
        let (parts, _) = resp.into_parts();
        return render_problem(&problem, meta, parts.headers);
    }

    // Anything with a body of its own is left alone.
    if resp.headers().contains_key(header::CONTENT_TYPE) {
        return resp;
    }

    match resp.status() {
        StatusCode::NOT_FOUND => {
            let (parts, _) = resp.into_parts();
            render_problem(&not_found(), meta, parts.headers)
        }
        StatusCode::METHOD_NOT_ALLOWED => {
            let (parts, _) = resp.into_parts();
            let mut headers = parts.headers;
            let allowed = allowed_methods(probe, &meta.path);
            // Routes unknown to the registry keep whatever `Allow` the router sent.
            if !allowed.is_empty() {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    headers.insert(header::ALLOW, value);
                }
            }
            render_problem(&method_not_allowed(&meta.method), meta, headers)
        }
        _ => resp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::problem::bad_request;
    use crate::api::routes::RouteRegistry;
    use axum::{body::Body, response::IntoResponse};

    fn meta(method: Method, path: &str) -> RequestMeta {
        let req = axum::http::Request::builder()
            .method(method)
            .uri(path)
            .body(())
            .unwrap();
        RequestMeta::from_request(&req)
    }

    fn probe() -> RouteRegistry {
        let mut r = RouteRegistry::new();
        r.register(Method::GET, "/multi");
        r.register(Method::POST, "/multi");
        r
    }

    #[test]
    fn bare_405_gets_allow_and_problem_body() {
        let mut bare = Response::new(Body::empty());
        *bare.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
        bare.headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET,HEAD,POST"));

        let resp = map_error_response(bare, &meta(Method::DELETE, "/multi/"), &probe());
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(header::ALLOW).unwrap(), "GET, POST");
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn unregistered_path_keeps_router_allow() {
        let mut bare = Response::new(Body::empty());
        *bare.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
        bare.headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET,HEAD"));

        let resp = map_error_response(bare, &meta(Method::POST, "/plain"), &probe());
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(header::ALLOW).unwrap(), "GET,HEAD");

        let mut bare = Response::new(Body::empty());
        *bare.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
        let resp = map_error_response(bare, &meta(Method::POST, "/plain"), &probe());
        assert!(resp.headers().get(header::ALLOW).is_none());
    }

    #[test]
    fn bare_404_becomes_problem() {
        let mut bare = Response::new(Body::empty());
        *bare.status_mut() = StatusCode::NOT_FOUND;
        let resp = map_error_response(bare, &meta(Method::GET, "/nope"), &probe());
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn handler_404_with_body_passes_through() {
        let resp = (StatusCode::NOT_FOUND, "custom").into_response();
        let resp = map_error_response(resp, &meta(Method::GET, "/x"), &probe());
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn pending_problem_is_rerendered_with_schema_link() {
        let resp = bad_request("invalid cursor format").into_response();
        let resp = map_error_response(resp, &meta(Method::GET, "/items"), &probe());
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers().get(header::LINK).unwrap(),
            "<http://localhost/schemas/ErrorModel.json>; rel=\"describedBy\""
        );
        assert_eq!(resp.headers().get(header::VARY).unwrap(), "Origin, Accept");
    }

    #[test]
    fn detail_wording() {
        assert_eq!(not_found().detail, "resource not found");
        let p = method_not_allowed(&Method::DELETE);
        assert_eq!(p.detail, "method DELETE not allowed");
        assert_eq!(p.title, "Method Not Allowed");
    }
}
