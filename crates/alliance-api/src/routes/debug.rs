//! Diagnostics, mounted only in the `dev` environment.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use http::HeaderMap;
use serde_json::{json, Value};

use crate::error::Result;
use crate::state::AppState;

/// `GET /debug/auth` and `GET /debug/db`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/debug/auth", get(echo_authorization))
        .route("/debug/db", get(check_store))
}

async fn echo_authorization(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    Json(json!({ "authorization": authorization }))
}

async fn check_store(State(state): State<AppState>) -> Result<Json<Value>> {
    let rows = state.store.ping().await?;
    Ok(Json(json!({ "ok": true, "rows": rows })))
}
