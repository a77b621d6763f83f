//! Processor-time backends and the CPU utilization formula.

use std::sync::Arc;

use super::host::HostProcess;

/// Cumulative processor time consumed by the process, in CPU-milliseconds.
pub trait ProcessorTime: Send + Sync {
    /// `None` when this reading failed; callers keep their previous baseline.
    fn total_ms(&self) -> Option<u64>;

    /// Whether readings reflect real consumption.
    fn is_supported(&self) -> bool {
        true
    }
}

/// Capability-resolved processor-time backend.
///
/// `Unsupported` is selected on hosts where cumulative processor time is known
/// to be unreliable (macOS) or could not be read at startup; it reports a
/// constant zero so the derived CPU metric reads 0 there.
pub enum ProcessorTimeSource {
    Supported(Arc<HostProcess>),
    Unsupported,
}

impl ProcessorTimeSource {
    /// Resolve the backend once by probing the host.
    pub fn probe(host: Arc<HostProcess>) -> Self {
        if cfg!(target_os = "macos") {
            tracing::warn!("processor time is unreliable on this platform; cpu metric will read 0");
            return Self::Unsupported;
        }
        match host.cpu_time_ms() {
            Some(ms) => {
                tracing::debug!(cpu_time_ms = ms, "processor time backend supported");
                Self::Supported(host)
            }
            None => {
                tracing::warn!(pid = host.pid(), "processor time unavailable; cpu metric will read 0");
                Self::Unsupported
            }
        }
    }
}

impl ProcessorTime for ProcessorTimeSource {
    fn total_ms(&self) -> Option<u64> {
        match self {
            Self::Supported(host) => host.cpu_time_ms(),
            Self::Unsupported => Some(0),
        }
    }

    fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }
}

/// Average utilization across all logical processors, in percent.
///
/// Not clamped: jitter in the cumulative counter can push it above 100, and a
/// counter that regresses yields a negative value.
pub fn cpu_percent(elapsed_cpu_ms: f64, processor_count: u32, elapsed_wall_ms: f64) -> f64 {
    if processor_count == 0 || elapsed_wall_ms <= 0.0 {
        return 0.0;
    }
    elapsed_cpu_ms * 100.0 / f64::from(processor_count) / elapsed_wall_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_across_cores() {
        // 500ms of CPU over 2s wall on 4 cores.
        assert_eq!(cpu_percent(500.0, 4, 2000.0), 6.25);
    }

    #[test]
    fn one_core_saturated() {
        assert_eq!(cpu_percent(2000.0, 1, 2000.0), 100.0);
    }

    #[test]
    fn over_100_is_kept() {
        assert!(cpu_percent(2500.0, 1, 2000.0) > 100.0);
    }

    #[test]
    fn degenerate_inputs_read_zero() {
        assert_eq!(cpu_percent(500.0, 0, 2000.0), 0.0);
        assert_eq!(cpu_percent(500.0, 4, 0.0), 0.0);
    }

    #[test]
    fn unsupported_reads_zero() {
        let src = ProcessorTimeSource::Unsupported;
        assert_eq!(src.total_ms(), Some(0));
        assert!(!src.is_supported());
    }
}
