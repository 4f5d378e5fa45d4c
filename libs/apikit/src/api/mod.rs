//! Request/response plumbing shared by every REST route.

pub mod error_layer;
pub mod negotiate;
pub mod pagination;
pub mod problem;
pub mod recovery;
pub mod render;
pub mod response;
pub mod routes;

pub use error_layer::{method_not_allowed, not_found, problem_middleware};
pub use negotiate::{negotiate, parse_accept, MediaRange, WireFormat};
pub use pagination::{LimitPolicy, PageParams};
pub use problem::{
    bad_request, internal_error, unprocessable, ErrorDetail, Problem, ProblemResponse,
    APPLICATION_PROBLEM_CBOR, APPLICATION_PROBLEM_JSON,
};
pub use recovery::{abort_handler, AbortHandler, RecoveryLayer};
pub use render::{merge_vary, render_problem, RequestMeta, TlsConnection};
pub use response::{ok, Negotiate, Negotiated};
pub use routes::{allowed_methods, MethodProbe, RestRouter, RouteRegistry};

/// Prelude for route modules.
pub mod prelude {
    pub use super::pagination::{LimitPolicy, PageParams};
    pub use super::problem::{Problem, ProblemResponse};
    pub use super::response::{ok, Negotiate, Negotiated};
    pub use super::routes::RestRouter;

    pub use axum::{http::StatusCode, response::IntoResponse};
}
