//! Demo catalog served with cursor pagination.

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::header,
};
use serde::{Deserialize, Serialize};

use apikit::api::{
    ok, pagination::page_error_to_problem, LimitPolicy, Negotiate, Negotiated, PageParams,
    ProblemResponse,
};
use paging_core::{Error as PageError, Page, Paginator, QueryParams};

/// Cursor type tag for item cursors.
pub const ITEM_CURSOR: &str = "item";

const CATEGORIES: [&str; 3] = ["books", "games", "tools"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// 30 items, `item-1` .. `item-30`, categories assigned round-robin.
pub fn demo_catalog() -> Vec<Item> {
    (1..=30)
        .map(|n| Item {
            id: format!("item-{n}"),
            name: format!("Item {n}"),
            category: CATEGORIES[(n - 1) % CATEGORIES.len()].to_string(),
        })
        .collect()
}

fn item_id(item: &Item) -> &str {
    &item.id
}

#[derive(Clone)]
pub struct ItemsState {
    pub catalog: Arc<Vec<Item>>,
    pub limits: LimitPolicy,
}

/// `GET /items?cursor=&limit=&category=`
pub async fn list_items(
    State(state): State<ItemsState>,
    Negotiate(format): Negotiate,
    RawQuery(raw): RawQuery,
) -> Result<Negotiated<Page<Item>>, ProblemResponse> {
    let mut query = QueryParams::parse(raw.as_deref().unwrap_or_default());
    let params = PageParams {
        cursor: query.get("cursor").map(str::to_owned),
        limit: query.get("limit").map(str::to_owned),
    };
    let limit = params.limit(state.limits)?;
    let cursor = params.cursor(ITEM_CURSOR)?;

    let category = query
        .get("category")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned);
    let items: Vec<Item> = state
        .catalog
        .iter()
        .filter(|item| category.as_deref().map_or(true, |c| item.category == c))
        .cloned()
        .collect();

    if !Paginator::contains(&items, &cursor, item_id) {
        return Err(page_error_to_problem(&PageError::CursorUnknownItem));
    }

    query.remove("cursor");
    query.remove("limit");
    let result = Paginator::new(ITEM_CURSOR)
        .base_url("/items")
        .extra_query(query)
        .paginate(&items, &cursor, limit, item_id);

    tracing::debug!(
        total = result.total,
        returned = result.items.len(),
        limit,
        category = category.as_deref().unwrap_or("*"),
        "listing items"
    );

    let link = result.link_header.clone();
    let mut resp = ok(format, Page::from_result(result, limit));
    if !link.is_empty() {
        resp = resp.with_header(header::LINK, link);
    }
    Ok(resp)
}
