//! leakscope server
//!
//! - `/api/diagnostics`: live process memory, heap, CPU and RPS snapshot
//! - `/api/collect`: forced full collection
//! - `/api/*`: allocation and retention demos, each counted by the sampler
//! - `/healthz`, `/metrics`

use tracing_subscriber::{fmt, EnvFilter};

use leakscope_core::alloc::TrackingAllocator;
use leakscope_core::error::{LeakscopeError, Result};
use leakscope_server::{app_state, config, router};

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator::system();

const CONFIG_ENV: &str = "LEAKSCOPE_CONFIG";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "leakscope-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "leakscope.yaml".to_owned());
    let cfg = config::load_or_default(&path)?;
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "leakscope-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| LeakscopeError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| LeakscopeError::Internal(format!("server failed: {e}")))
}
