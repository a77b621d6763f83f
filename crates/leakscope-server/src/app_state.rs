//! Shared application state for the leakscope server.
//!
//! One `ResourceSampler` and one `DemoHeap` are built at startup and handed to
//! every handler through this state; nothing in the request path reaches for a
//! static.

use std::sync::Arc;

use tokio::time::Duration;

use leakscope_core::error::{LeakscopeError, Result};
use leakscope_core::ResourceSampler;

use crate::config::AppConfig;
use crate::demo::{DemoHeap, StringBag, WatchRegistry};
use crate::obs::ServerMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    sampler: Arc<ResourceSampler>,
    heap: Arc<DemoHeap>,
    metrics: Arc<ServerMetrics>,
}

struct AppStateInner {
    cfg: AppConfig,
    strings: StringBag,
    watchers: WatchRegistry,
    http: reqwest::Client,
}

impl AppState {
    /// Build state with production sampler backends for the running process.
    pub fn new(cfg: AppConfig) -> Result<Self> {
        let heap = Arc::new(build_heap(&cfg));
        let sampler = ResourceSampler::for_current_process(heap.clone(), cfg.server.refresh_interval_ms);
        Self::with_sampler(cfg, heap, Arc::new(sampler))
    }

    /// Build state around an externally constructed sampler (tests inject a
    /// manual clock this way). `sampler` should read from `heap`.
    pub fn with_sampler(cfg: AppConfig, heap: Arc<DemoHeap>, sampler: Arc<ResourceSampler>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.demos.http_timeout_ms))
            .build()
            .map_err(|e| LeakscopeError::Internal(format!("shared http client build failed: {e}")))?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                strings: StringBag::new(),
                watchers: WatchRegistry::new(),
                http,
            }),
            sampler,
            heap,
            metrics: Arc::new(ServerMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.inner.cfg
    }

    pub fn sampler(&self) -> Arc<ResourceSampler> {
        Arc::clone(&self.sampler)
    }

    pub fn heap(&self) -> &DemoHeap {
        &self.heap
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    pub fn strings(&self) -> &StringBag {
        &self.inner.strings
    }

    pub fn watchers(&self) -> &WatchRegistry {
        &self.inner.watchers
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Extra gauges appended to `/metrics`.
    pub fn metrics_gauges(&self) -> Vec<(&'static str, f64)> {
        let snap = self.sampler.snapshot();
        vec![
            ("leakscope_allocated_bytes", snap.allocated_bytes as f64),
            ("leakscope_working_set_bytes", snap.working_set_bytes as f64),
            ("leakscope_private_bytes", snap.private_bytes as f64),
            ("leakscope_gen0_collections", snap.gen0_collections as f64),
            ("leakscope_gen1_collections", snap.gen1_collections as f64),
            ("leakscope_gen2_collections", snap.gen2_collections as f64),
            ("leakscope_cpu_percent", snap.cpu_percent),
            ("leakscope_rps", snap.rps),
            ("leakscope_retained_strings", self.strings().len() as f64),
            ("leakscope_active_watchers", self.watchers().active() as f64),
            ("leakscope_pool_idle_buffers", self.heap.pool().idle_buffers() as f64),
        ]
    }
}

/// Heap sized from the demo section.
pub fn build_heap(cfg: &AppConfig) -> DemoHeap {
    DemoHeap::new(cfg.demos.pool_max_buffer_bytes, cfg.demos.pool_retain_per_bucket)
}
