use serde::{Deserialize, Serialize};

use crate::{base64_url, Error};

/// Opaque pagination cursor: "resume after the item `value` of resource `type`".
///
/// The empty cursor (both fields empty) means "start of collection".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(rename = "t")]
    pub cursor_type: String,
    #[serde(rename = "v")]
    pub value: String,
}

impl Cursor {
    pub fn new(cursor_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            cursor_type: cursor_type.into(),
            value: value.into(),
        }
    }

    /// Cursor pointing at the start of a collection of the given type.
    pub fn start(cursor_type: impl Into<String>) -> Self {
        Self::new(cursor_type, "")
    }

    pub fn is_empty(&self) -> bool {
        self.cursor_type.is_empty() && self.value.is_empty()
    }

    /// Unpadded base64url of the compact JSON payload; safe to put in a query string.
    pub fn encode(&self) -> String {
        // Two string fields cannot fail to serialize.
        let json = serde_json::to_vec(self).unwrap_or_default();
        base64_url::encode(&json)
    }

    /// Decode a token produced by [`Cursor::encode`]. An empty token is the empty cursor.
    pub fn decode(token: &str) -> Result<Self, Error> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Self::default());
        }
        let bytes = base64_url::decode(token).map_err(|_| Error::CursorInvalidBase64)?;
        serde_json::from_slice::<Cursor>(&bytes).map_err(|_| Error::CursorInvalidJson)
    }

    /// Reject cursors minted for another resource family. The empty cursor always passes.
    pub fn expect_type(&self, expected: &str) -> Result<(), Error> {
        if self.is_empty() || self.cursor_type == expected {
            return Ok(());
        }
        Err(Error::CursorTypeMismatch {
            expected: expected.to_string(),
            actual: self.cursor_type.clone(),
        })
    }
}
