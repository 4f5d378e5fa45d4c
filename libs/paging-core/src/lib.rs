//! Transport-agnostic cursor pagination: opaque cursor tokens, in-memory page
//! slicing and RFC 8288 `Link` header rendering.

pub mod cursor;
pub mod link;
pub mod page;
pub mod paginate;
pub mod query;


pub use cursor::Cursor;
pub use link::build_link_header;
pub use page::{Page, PageInfo};
pub use paginate::{PaginationResult, Paginator};
pub use query::QueryParams;

/// Pagination errors surfaced to the API layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid cursor: invalid base64url encoding")]
    CursorInvalidBase64,

    #[error("invalid cursor: malformed payload")]
    CursorInvalidJson,

    #[error("cursor type mismatch: expected {expected}, got {actual}")]
    CursorTypeMismatch { expected: String, actual: String },

    #[error("cursor references unknown item")]
    CursorUnknownItem,

    #[error("invalid limit: {0}")]
    InvalidLimit(String),
}

impl Error {
    /// True for errors caused by an unreadable token rather than its contents.
    pub fn is_malformed_cursor(&self) -> bool {
        matches!(self, Error::CursorInvalidBase64 | Error::CursorInvalidJson)
    }
}

pub mod base64_url {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    pub fn encode(bytes: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decodes unpadded base64url; trailing `=` padding is tolerated.
    pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(s.trim_end_matches('='))
    }
}
