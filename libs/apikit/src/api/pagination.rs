//! `cursor`/`limit` query handling for list endpoints.

use paging_core::{Cursor, Error as PageError};
use serde::Deserialize;

use super::problem::{bad_request, unprocessable, ErrorDetail, ProblemResponse};

/// Default and ceiling for page sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitPolicy {
    pub default: usize,
    pub max: usize,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            default: 10,
            max: 100,
        }
    }
}

/// Raw paging parameters, kept as strings so bad input maps to our own problems
/// instead of an extractor rejection.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl PageParams {
    /// Absent or non-positive limits fall back to the default; large ones are clamped.
    pub fn limit(&self, policy: LimitPolicy) -> Result<usize, ProblemResponse> {
        let raw = match self.limit.as_deref().map(str::trim) {
            None | Some("") => return Ok(policy.default),
            Some(raw) => raw,
        };
        let n: i64 = raw
            .parse()
            .map_err(|_| page_error_to_problem(&PageError::InvalidLimit(raw.to_owned())))?;
        if n <= 0 {
            return Ok(policy.default);
        }
        Ok(usize::try_from(n).map_or(policy.max, |n| n.min(policy.max)))
    }

    /// Decode the cursor and check it belongs to `cursor_type`.
    pub fn cursor(&self, cursor_type: &str) -> Result<Cursor, ProblemResponse> {
        let cursor = Cursor::decode(self.cursor.as_deref().unwrap_or_default())
            .map_err(|e| page_error_to_problem(&e))?;
        cursor
            .expect_type(cursor_type)
            .map_err(|e| page_error_to_problem(&e))?;
        Ok(cursor)
    }
}

pub fn page_error_to_problem(err: &PageError) -> ProblemResponse {
    tracing::debug!(error = %err, "rejecting pagination input");
    match err {
        PageError::CursorInvalidBase64 | PageError::CursorInvalidJson => {
            bad_request("invalid cursor format")
        }
        PageError::CursorTypeMismatch { .. } => bad_request("cursor type mismatch"),
        PageError::CursorUnknownItem => bad_request("cursor references unknown item"),
        PageError::InvalidLimit(v) => unprocessable(
            "validation failed",
            vec![ErrorDetail::new("limit must be an integer")
                .at("query.limit")
                .with_value(v.as_str())],
        ),
    }
}
