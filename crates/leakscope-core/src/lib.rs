//! leakscope core: the runtime resource sampler and the heap accounting it reads.
//!
//! This crate owns the process-wide telemetry state (request counter, CPU and
//! RPS refresh gates, cached derived values) and the capability backends that
//! feed it. It carries no HTTP or async runtime dependencies so the sampler can
//! be exercised directly in tests with a manual clock.
//!
//! Panics, `unwrap`, and `expect` are compile-denied here. Sampler reads are
//! best-effort: an unavailable OS metric surfaces as zero, never as an error.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod alloc;
pub mod error;
pub mod heap;
pub mod telemetry;

/// Shared result type.
pub use error::{LeakscopeError, Result};
pub use telemetry::{ResourceSampler, ResourceSnapshot};
