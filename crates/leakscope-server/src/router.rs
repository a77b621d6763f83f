//! Axum router wiring.
//!
//! `/api/*` routes pass through the request-entry hook; ops routes do not.

use axum::{middleware, routing::get, Router};

use crate::{api, app_state::AppState, obs, ops};

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/diagnostics", get(api::diagnostics::diagnostics))
        .route("/collect", get(api::diagnostics::collect))
        .route("/staticstring", get(api::demos::static_string))
        .route("/bigstring", get(api::demos::big_string))
        .route("/loh", get(api::demos::loh_default))
        .route("/loh/:size", get(api::demos::loh))
        .route("/array/:size", get(api::demos::array))
        .route("/pooledarray/:size", get(api::demos::pooled_array))
        .route("/fileprovider", get(api::demos::file_provider))
        .route("/httpclient1", get(api::demos::http_client_per_request))
        .route("/httpclient2", get(api::demos::http_client_shared))
        .route_layer(middleware::from_fn_with_state(state.clone(), obs::middleware::record_request));

    Router::new()
        .nest("/api", api)
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
