use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::errors;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";
/// CBOR flavour of the Problem Details content type.
pub const APPLICATION_PROBLEM_CBOR: &str = "application/problem+cbor";

const ABOUT_BLANK: &str = "about:blank";

/// RFC 9457 Problem Details for HTTP APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Link to the JSON Schema describing this document; filled in at render time.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema_url: Option<String>,
    /// A URI reference that identifies the problem type.
    #[serde(
        rename = "type",
        default = "about_blank",
        skip_serializing_if = "is_about_blank"
    )]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: String,
    /// A URI reference that identifies the specific occurrence of the problem.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instance: String,
    /// Optional validation errors for 4xx problems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
}

/// One invalid input location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    /// Where the error occurred, e.g. `query.limit` or `body.items[3].tags`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// The offending value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            value: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}

fn about_blank() -> String {
    ABOUT_BLANK.to_string()
}

fn is_about_blank(s: &str) -> bool {
    s.is_empty() || s == ABOUT_BLANK
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            schema_url: None,
            type_url: about_blank(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            errors: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_errors(mut self, errors: Vec<ErrorDetail>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_schema_url(mut self, url: impl Into<String>) -> Self {
        self.schema_url = Some(url.into());
        self
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Marker left in response extensions so the problem layer can re-render the
/// document with the request's negotiated format and schema link.
#[derive(Debug, Clone)]
pub(crate) struct PendingProblem(pub Problem);

/// Axum response wrapper that renders `Problem` with correct status & content type.
///
/// Without [`problem_middleware`](crate::api::problem_middleware) in the stack the
/// document is sent as plain `application/problem+json`.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = match serde_json::to_vec(&self.0) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize problem document");
                return (StatusCode::INTERNAL_SERVER_ERROR, errors::INTERNAL_DETAIL)
                    .into_response();
            }
        };
        let mut resp = (status, body).into_response();
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp.extensions_mut().insert(PendingProblem(self.0));
        resp
    }
}

// Convenience constructors.
pub fn bad_request(detail: impl Into<String>) -> ProblemResponse {
    errors::BAD_REQUEST.to_problem(detail).into()
}

pub fn unprocessable(detail: impl Into<String>, details: Vec<ErrorDetail>) -> ProblemResponse {
    errors::UNPROCESSABLE_ENTITY
        .to_problem(detail)
        .with_errors(details)
        .into()
}

/// The only 500 this API sends: fixed wording, no internals.
pub fn internal_error() -> ProblemResponse {
    errors::INTERNAL_SERVER_ERROR
        .to_problem(errors::INTERNAL_DETAIL)
        .into()
}
