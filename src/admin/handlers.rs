use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::admin::AdminState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub configs: usize,
}

#[derive(Debug, Deserialize)]
pub struct ConfigQuery {
    /// Dotted path inside the config, e.g. `broker.host`.
    pub key: Option<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        configs: state.engine.store().len(),
    })
}

pub async fn list_configs(State(state): State<AdminState>) -> Json<Vec<String>> {
    Json(state.engine.list())
}

pub async fn get_config(
    State(state): State<AdminState>,
    Path(name): Path<String>,
    Query(query): Query<ConfigQuery>,
) -> Result<Json<Value>, StatusCode> {
    let value = match query.key.as_deref() {
        Some(key) => state.engine.get_path(&name, key),
        None => state.engine.get(&name),
    };
    value.map(Json).ok_or(StatusCode::NOT_FOUND)
}
