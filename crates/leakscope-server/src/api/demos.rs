//! Allocation and retention demos. Each handler is a deliberately naive
//! pattern; the sampler counts every call through the request-entry hook.

use std::path::PathBuf;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use rand::RngCore;
use serde::Deserialize;
use tokio::time::Duration;

use leakscope_core::error::{LeakscopeError, Result};

use crate::api::ApiResult;
use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: String,
}

fn octet_stream(body: Body) -> Response {
    ([(header::CONTENT_TYPE, "application/octet-stream")], body).into_response()
}

/// Build a string and root it in the process-wide bag.
pub async fn static_string(State(state): State<AppState>) -> String {
    let s = "x".repeat(state.cfg().demos.string_bytes);
    state.strings().retain(s.clone());
    s
}

/// Same string, released once the response is written.
pub async fn big_string(State(state): State<AppState>) -> String {
    "x".repeat(state.cfg().demos.string_bytes)
}

pub async fn loh_default(State(state): State<AppState>) -> Json<usize> {
    Json(large_buffer_len(state.cfg().demos.loh_default_bytes))
}

pub async fn loh(State(state): State<AppState>, Path(size): Path<usize>) -> ApiResult<Json<usize>> {
    let size = state.cfg().demos.check_size(size)?;
    Ok(Json(large_buffer_len(size)))
}

fn large_buffer_len(size: usize) -> usize {
    std::hint::black_box(vec![0u8; size]).len()
}

/// Fresh random array per request.
pub async fn array(State(state): State<AppState>, Path(size): Path<usize>) -> ApiResult<Response> {
    let size = state.cfg().demos.check_size(size)?;
    let mut buf = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut buf);
    Ok(octet_stream(Body::from(buf)))
}

/// Random array rented from the pool; the buffer goes back once the response
/// body is dropped.
pub async fn pooled_array(State(state): State<AppState>, Path(size): Path<usize>) -> ApiResult<Response> {
    let size = state.cfg().demos.check_size(size)?;
    let mut buf = state.heap().rent(size);
    rand::thread_rng().fill_bytes(buf.as_mut_slice());
    Ok(octet_stream(Body::from(Bytes::from_owner(buf))))
}

/// Start a directory watcher that nothing ever stops. Empty `200 OK`.
pub async fn file_provider(State(state): State<AppState>) -> ApiResult<StatusCode> {
    let dir = state
        .cfg()
        .demos
        .watch_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    let id = state.watchers().watch(&dir)?;
    tracing::debug!(watcher = id, active = state.watchers().active(), "watcher started");
    Ok(StatusCode::OK)
}

/// New HTTP client (and connection pool) for every request.
pub async fn http_client_per_request(
    State(state): State<AppState>,
    Query(q): Query<UrlQuery>,
) -> ApiResult<Json<u16>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(state.cfg().demos.http_timeout_ms))
        .build()
        .map_err(|e| LeakscopeError::Internal(format!("http client build failed: {e}")))?;
    let status = fetch_status(&state, &client, &q.url, "per_request").await?;
    Ok(Json(status))
}

/// One client shared by the whole process.
pub async fn http_client_shared(
    State(state): State<AppState>,
    Query(q): Query<UrlQuery>,
) -> ApiResult<Json<u16>> {
    let status = fetch_status(&state, state.http(), &q.url, "shared").await?;
    Ok(Json(status))
}

async fn fetch_status(state: &AppState, client: &reqwest::Client, url: &str, mode: &str) -> Result<u16> {
    let url = parse_http_url(url)?;
    match client.get(url).send().await {
        Ok(resp) => Ok(resp.status().as_u16()),
        Err(e) => {
            state.metrics().upstream_errors.inc(&[("client", mode)]);
            tracing::warn!(client = mode, error = %e, "upstream request failed");
            Err(LeakscopeError::Upstream(e.to_string()))
        }
    }
}

fn parse_http_url(url: &str) -> Result<reqwest::Url> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| LeakscopeError::BadRequest(format!("invalid url: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(LeakscopeError::BadRequest(format!("unsupported url scheme: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_urls_are_fetched() {
        assert!(parse_http_url("http://127.0.0.1:1/").is_ok());
        assert!(parse_http_url("https://example.com").is_ok());
        assert!(parse_http_url("ftp://example.com").is_err());
        assert!(parse_http_url("not a url").is_err());
    }
}
