use crate::{build_link_header, Cursor, QueryParams};

/// One page cut out of an in-memory collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    /// Size of the (filtered) collection before paging.
    pub total: usize,
    /// RFC 8288 value with `next`/`prev` links, empty when there are none.
    pub link_header: String,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
}

/// Slices ordered collections into cursor-addressed pages.
///
/// The cursor names the last item of the previous page; the next page starts
/// right after it. A cursor whose id is not in `items` restarts from the first
/// item, so callers that need a 400 for stale cursors check [`Paginator::contains`]
/// first.
#[derive(Clone, Debug)]
pub struct Paginator {
    cursor_type: String,
    base_url: String,
    extra_query: QueryParams,
}

impl Paginator {
    pub fn new(cursor_type: impl Into<String>) -> Self {
        Self {
            cursor_type: cursor_type.into(),
            base_url: String::new(),
            extra_query: QueryParams::new(),
        }
    }

    /// URL the `Link` references are built on; may be relative (`/items`) or empty.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Query parameters carried over into every `Link` reference (filters etc.).
    pub fn extra_query(mut self, query: QueryParams) -> Self {
        self.extra_query = query;
        self
    }

    /// True if `cursor` is empty or references an item present in `items`.
    pub fn contains<T, F>(items: &[T], cursor: &Cursor, id_fn: F) -> bool
    where
        F: Fn(&T) -> &str,
    {
        cursor.value.is_empty() || position_of(items, &cursor.value, &id_fn).is_some()
    }

    pub fn paginate<T, F>(
        &self,
        items: &[T],
        cursor: &Cursor,
        limit: usize,
        id_fn: F,
    ) -> PaginationResult<T>
    where
        T: Clone,
        F: Fn(&T) -> &str,
    {
        let total = items.len();

        let start = if cursor.value.is_empty() {
            0
        } else {
            position_of(items, &cursor.value, &id_fn).map_or(0, |i| i + 1)
        };
        let start = start.min(total);
        let end = start.saturating_add(limit).min(total);
        let page = &items[start..end];

        let next_cursor = match page.last() {
            Some(last) if end < total => {
                Some(Cursor::new(&self.cursor_type, id_fn(last)).encode())
            }
            _ => None,
        };

        let prev_cursor = if start == 0 {
            None
        } else if start <= limit {
            Some(Cursor::start(&self.cursor_type).encode())
        } else {
            let anchor = &items[start - 1 - limit];
            Some(Cursor::new(&self.cursor_type, id_fn(anchor)).encode())
        };

        let mut query = self.extra_query.clone();
        if limit > 0 {
            query.set("limit", limit.to_string());
        }
        let link_header = build_link_header(
            &self.base_url,
            &query,
            next_cursor.as_deref(),
            prev_cursor.as_deref(),
        );

        PaginationResult {
            items: page.to_vec(),
            total,
            link_header,
            next_cursor,
            prev_cursor,
        }
    }
}

fn position_of<T, F>(items: &[T], id: &str, id_fn: &F) -> Option<usize>
where
    F: Fn(&T) -> &str,
{
    items.iter().position(|item| id_fn(item) == id)
}
