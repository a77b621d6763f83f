use axum::{extract::State, http::StatusCode, Json};

use leakscope_core::error::LeakscopeError;
use leakscope_core::ResourceSnapshot;

use crate::api::ApiResult;
use crate::app_state::AppState;

pub async fn diagnostics(State(state): State<AppState>) -> Json<ResourceSnapshot> {
    Json(state.sampler().snapshot())
}

/// Blocking full collection, run off the async workers.
pub async fn collect(State(state): State<AppState>) -> ApiResult<StatusCode> {
    let sampler = state.sampler();
    tokio::task::spawn_blocking(move || sampler.force_collect())
        .await
        .map_err(|e| LeakscopeError::Internal(format!("collect task failed: {e}")))?;
    Ok(StatusCode::OK)
}
