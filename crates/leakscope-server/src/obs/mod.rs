//! In-process request metrics and the request-entry hook.
//!
//! Counters and histograms are atomics behind `DashMap` label maps, rendered
//! by the `/metrics` handler alongside the sampler snapshot.

pub mod metrics;
pub mod middleware;

pub use metrics::ServerMetrics;
