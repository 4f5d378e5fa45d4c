//! HTTP API toolkit: RFC 9457 Problem Details, JSON/CBOR content negotiation,
//! panic recovery and cursor-pagination glue for axum services.

pub mod api;
pub mod errors;

pub use api::problem::{Problem, ProblemResponse};
pub use errors::ErrDef;
