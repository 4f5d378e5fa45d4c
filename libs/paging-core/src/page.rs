use serde::{Deserialize, Serialize};

use crate::PaginationResult;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
    pub limit: u64,
}

/// Wire shape of a paginated list response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    /// Build the wire page from a pagination result. The link header is left to the caller.
    pub fn from_result(result: PaginationResult<T>, limit: usize) -> Self {
        Self {
            items: result.items,
            total: result.total as u64,
            page_info: PageInfo {
                next_cursor: result.next_cursor,
                prev_cursor: result.prev_cursor,
                limit: limit as u64,
            },
        }
    }
}
