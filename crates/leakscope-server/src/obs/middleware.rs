//! Request-entry hook for `/api` routes.

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::app_state::AppState;

/// Count the request with the sampler before the handler runs, then record
/// per-route status and latency.
pub async fn record_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.sampler().record_request();

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let started = Instant::now();
    let resp = next.run(req).await;

    let metrics = state.metrics();
    let route = route.as_str();
    metrics
        .api_requests
        .inc(&[("route", route), ("status", resp.status().as_str())]);
    metrics.api_duration.observe(&[("route", route)], started.elapsed());

    resp
}
