use axum::Json;
use serde_json::{Value, json};

pub mod edit;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
