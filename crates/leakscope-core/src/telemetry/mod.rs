//! Runtime resource telemetry.
//!
//! - `clock`: millisecond time source (monotonic in production, manual in tests)
//! - `gate`: per-metric compare-and-swap refresh gate
//! - `cpu` / `rate`: derived-metric formulas and the processor-time backend
//! - `host`: sysinfo-backed process probe
//! - `sampler`: the shared `ResourceSampler`

pub mod clock;
pub mod cpu;
pub mod gate;
pub mod host;
pub mod rate;
pub mod sampler;
pub mod snapshot;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use cpu::{cpu_percent, ProcessorTime, ProcessorTimeSource};
pub use gate::RefreshGate;
pub use host::{HostProcess, MemoryProbe, ProcessMemory};
pub use rate::{requests_per_second, RateSample, RequestCounter};
pub use sampler::{ResourceSampler, SamplerBuilder, DEFAULT_REFRESH_INTERVAL_MS};
pub use snapshot::ResourceSnapshot;
