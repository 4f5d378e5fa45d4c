use axum::{extract::Query, extract::rejection::QueryRejection, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use apikit::api::{bad_request, ok, Negotiate, Negotiated, ProblemResponse};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct HelloQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HelloResponse {
    pub message: String,
}

pub async fn hello(
    Negotiate(format): Negotiate,
    query: Result<Query<HelloQuery>, QueryRejection>,
) -> Result<Negotiated<HelloResponse>, ProblemResponse> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("world");

    Ok(ok(
        format,
        HelloResponse {
            message: format!("Hello, {name}!"),
        },
    ))
}
