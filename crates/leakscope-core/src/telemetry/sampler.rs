//! Process-wide resource sampler.
//!
//! Construct one `ResourceSampler` at startup and share it by `Arc` with every
//! request context. Request counting is a single relaxed `fetch_add`; the CPU
//! and RPS figures are recomputed lazily by whichever reader first observes an
//! expired refresh window, each metric on its own gate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::clock::{Clock, MonotonicClock};
use super::cpu::{cpu_percent, ProcessorTime, ProcessorTimeSource};
use super::gate::RefreshGate;
use super::host::{HostProcess, MemoryProbe};
use super::rate::{requests_per_second, RateSample, RequestCounter};
use super::snapshot::ResourceSnapshot;
use crate::heap::{Generation, ManagedHeap};

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;

pub struct ResourceSampler {
    pid: u32,
    processor_count: u32,
    clock: Arc<dyn Clock>,
    cpu_time: Arc<dyn ProcessorTime>,
    memory: Arc<dyn MemoryProbe>,
    heap: Arc<dyn ManagedHeap>,

    requests: RequestCounter,
    cpu_gate: RefreshGate,
    rps_gate: RefreshGate,
    last_cpu_time_ms: AtomicU64,
    // f64 bit patterns
    cached_cpu_percent: AtomicU64,
    cached_rps: AtomicU64,
}

fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Acquire))
}

fn store_f64(cell: &AtomicU64, v: f64) {
    cell.store(v.to_bits(), Ordering::Release);
}

impl ResourceSampler {
    pub fn builder() -> SamplerBuilder {
        SamplerBuilder::default()
    }

    /// Sampler for the running process with production backends.
    pub fn for_current_process(heap: Arc<dyn ManagedHeap>, refresh_interval_ms: u64) -> Self {
        Self::builder().refresh_interval_ms(refresh_interval_ms).build(heap)
    }

    /// Count one inbound request.
    pub fn record_request(&self) {
        self.requests.record();
    }

    /// Requests recorded since the last RPS reset.
    pub fn pending_requests(&self) -> u64 {
        self.requests.get()
    }

    /// Recompute CPU utilization if the CPU window at `now_ms` has expired.
    ///
    /// Returns the cached value when the window is still open or another
    /// caller claimed it.
    pub fn sample_cpu(&self, now_ms: u64) -> f64 {
        let Some(elapsed_ms) = self.cpu_gate.try_claim(now_ms) else {
            return self.cpu_percent();
        };

        let Some(current) = self.cpu_time.total_ms() else {
            self.cpu_gate.release(now_ms, elapsed_ms);
            tracing::warn!(now_ms, "processor time read failed; keeping cached cpu");
            return self.cpu_percent();
        };
        let previous = self.last_cpu_time_ms.swap(current, Ordering::AcqRel);
        let percent = cpu_percent(
            current as f64 - previous as f64,
            self.processor_count,
            elapsed_ms as f64,
        );
        store_f64(&self.cached_cpu_percent, percent);

        tracing::debug!(cpu_percent = percent, elapsed_ms, current_cpu_ms = current, "cpu refreshed");
        percent
    }

    /// Recompute requests-per-second if the RPS window at `now_ms` has expired,
    /// resetting the request counter in the same atomic exchange.
    pub fn sample_rps(&self, now_ms: u64) -> RateSample {
        let Some(elapsed_ms) = self.rps_gate.try_claim(now_ms) else {
            return RateSample { rps: self.rps(), reset: false };
        };

        let count = self.requests.take();
        let rps = requests_per_second(count, elapsed_ms as f64);
        store_f64(&self.cached_rps, rps);

        tracing::debug!(rps, requests = count, elapsed_ms, "rps refreshed");
        RateSample { rps, reset: true }
    }

    /// Refresh both derived metrics as needed and read the pass-through counters.
    pub fn snapshot(&self) -> ResourceSnapshot {
        let now = self.clock.now_ms();
        let cpu_percent = self.sample_cpu(now);
        let rate = self.sample_rps(now);
        let memory = self.memory.read();

        ResourceSnapshot {
            pid: self.pid,
            allocated_bytes: self.heap.allocated_bytes(),
            working_set_bytes: memory.working_set_bytes,
            private_bytes: memory.private_bytes,
            gen0_collections: self.heap.collection_count(Generation::Gen0),
            gen1_collections: self.heap.collection_count(Generation::Gen1),
            gen2_collections: self.heap.collection_count(Generation::Gen2),
            cpu_percent,
            rps: rate.rps,
        }
    }

    /// Full reclamation, wait for deferred releases, then a second full pass to
    /// pick up whatever those releases handed back.
    pub fn force_collect(&self) {
        let before = self.heap.allocated_bytes();
        self.heap.collect(Generation::Gen2);
        self.heap.wait_for_pending_finalizers();
        self.heap.collect(Generation::Gen2);
        tracing::info!(before_bytes = before, after_bytes = self.heap.allocated_bytes(), "forced collection");
    }

    /// Last computed CPU utilization.
    pub fn cpu_percent(&self) -> f64 {
        load_f64(&self.cached_cpu_percent)
    }

    /// Last computed requests-per-second.
    pub fn rps(&self) -> f64 {
        load_f64(&self.cached_rps)
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn processor_count(&self) -> u32 {
        self.processor_count
    }

    pub fn refresh_interval_ms(&self) -> u64 {
        self.rps_gate.interval_ms()
    }

    pub fn cpu_supported(&self) -> bool {
        self.cpu_time.is_supported()
    }
}

/// Wires sampler backends; anything left unset falls back to the host process.
pub struct SamplerBuilder {
    refresh_interval_ms: u64,
    clock: Option<Arc<dyn Clock>>,
    cpu_time: Option<Arc<dyn ProcessorTime>>,
    memory: Option<Arc<dyn MemoryProbe>>,
    processor_count: Option<u32>,
    pid: Option<u32>,
}

impl Default for SamplerBuilder {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            clock: None,
            cpu_time: None,
            memory: None,
            processor_count: None,
            pid: None,
        }
    }
}

impl SamplerBuilder {
    pub fn refresh_interval_ms(mut self, ms: u64) -> Self {
        self.refresh_interval_ms = ms;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn processor_time(mut self, source: Arc<dyn ProcessorTime>) -> Self {
        self.cpu_time = Some(source);
        self
    }

    pub fn memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory = Some(probe);
        self
    }

    pub fn processor_count(mut self, n: u32) -> Self {
        self.processor_count = Some(n);
        self
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn build(self, heap: Arc<dyn ManagedHeap>) -> ResourceSampler {
        let mut shared_host: Option<Arc<HostProcess>> = None;
        let mut host = || Arc::clone(shared_host.get_or_insert_with(|| Arc::new(HostProcess::current())));

        let cpu_time = self
            .cpu_time
            .unwrap_or_else(|| Arc::new(ProcessorTimeSource::probe(host())) as Arc<dyn ProcessorTime>);
        let memory = self.memory.unwrap_or_else(|| host() as Arc<dyn MemoryProbe>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()) as Arc<dyn Clock>);
        let processor_count = self.processor_count.unwrap_or_else(logical_processors);
        let pid = self.pid.unwrap_or_else(std::process::id);

        let origin = clock.now_ms();
        let baseline_cpu_ms = cpu_time.total_ms().unwrap_or(0);

        tracing::info!(
            pid,
            processor_count,
            refresh_interval_ms = self.refresh_interval_ms,
            cpu_supported = cpu_time.is_supported(),
            "resource sampler ready"
        );

        ResourceSampler {
            pid,
            processor_count,
            clock,
            cpu_time,
            memory,
            heap,
            requests: RequestCounter::new(),
            cpu_gate: RefreshGate::new(origin, self.refresh_interval_ms),
            rps_gate: RefreshGate::new(origin, self.refresh_interval_ms),
            last_cpu_time_ms: AtomicU64::new(baseline_cpu_ms),
            cached_cpu_percent: AtomicU64::new(0f64.to_bits()),
            cached_rps: AtomicU64::new(0f64.to_bits()),
        }
    }
}

fn logical_processors() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::heap::AllocatorHeap;
    use crate::telemetry::clock::ManualClock;
    use crate::telemetry::host::ProcessMemory;
    use std::sync::atomic::AtomicBool;

    /// Processor time that can be told to fail its next reads.
    struct FakeCpu(AtomicU64, AtomicBool);

    impl ProcessorTime for FakeCpu {
        fn total_ms(&self) -> Option<u64> {
            if self.1.load(Ordering::SeqCst) {
                return None;
            }
            Some(self.0.load(Ordering::SeqCst))
        }
    }

    struct FakeMemory;

    impl MemoryProbe for FakeMemory {
        fn read(&self) -> ProcessMemory {
            ProcessMemory { working_set_bytes: 4096, private_bytes: 2048 }
        }
    }

    struct Rig {
        clock: Arc<ManualClock>,
        cpu: Arc<FakeCpu>,
        heap: Arc<AllocatorHeap>,
        sampler: Arc<ResourceSampler>,
    }

    fn rig(cpu_start_ms: u64, processors: u32) -> Rig {
        let clock = Arc::new(ManualClock::new(0));
        let cpu = Arc::new(FakeCpu(AtomicU64::new(cpu_start_ms), AtomicBool::new(false)));
        let heap = Arc::new(AllocatorHeap::new());
        let sampler = ResourceSampler::builder()
            .refresh_interval_ms(1000)
            .clock(clock.clone())
            .processor_time(cpu.clone())
            .memory_probe(Arc::new(FakeMemory))
            .processor_count(processors)
            .pid(42)
            .build(heap.clone());
        Rig { clock, cpu, heap, sampler: Arc::new(sampler) }
    }

    #[test]
    fn cpu_window_normalizes_over_cores() {
        let r = rig(1000, 4);
        r.cpu.0.store(1500, Ordering::SeqCst);
        assert_eq!(r.sampler.sample_cpu(2000), 6.25);
        assert_eq!(r.sampler.cpu_percent(), 6.25);
    }

    #[test]
    fn cpu_cached_inside_window() {
        let r = rig(0, 1);
        r.cpu.0.store(900, Ordering::SeqCst);
        let first = r.sampler.sample_cpu(1500);
        r.cpu.0.store(5000, Ordering::SeqCst);
        assert_eq!(r.sampler.sample_cpu(2000).to_bits(), first.to_bits());
    }

    #[test]
    fn rps_reset_on_recompute() {
        let r = rig(0, 1);
        for _ in 0..250 {
            r.sampler.record_request();
        }
        let s = r.sampler.sample_rps(2000);
        assert!(s.reset);
        assert_eq!(s.rps, 125.0);
        assert_eq!(r.sampler.pending_requests(), 0);

        for _ in 0..5 {
            r.sampler.record_request();
        }
        assert_eq!(r.sampler.pending_requests(), 5);
    }

    #[test]
    fn snapshots_inside_interval_are_identical() {
        let r = rig(0, 2);
        for _ in 0..10 {
            r.sampler.record_request();
        }
        r.clock.set(1500);
        let a = r.sampler.snapshot();

        for _ in 0..100 {
            r.sampler.record_request();
        }
        r.cpu.0.store(10_000, Ordering::SeqCst);
        r.clock.set(2400);
        let b = r.sampler.snapshot();

        assert_eq!(a.cpu_percent.to_bits(), b.cpu_percent.to_bits());
        assert_eq!(a.rps.to_bits(), b.rps.to_bits());
        assert_eq!(r.sampler.pending_requests(), 100);
    }

    #[test]
    fn cadences_are_independent() {
        let r = rig(0, 1);
        r.sampler.sample_cpu(1500);
        // RPS window has not been touched, so it still opens at 1500.
        r.sampler.record_request();
        let s = r.sampler.sample_rps(1500);
        assert!(s.reset);
        assert!(r.sampler.sample_rps(2000).rps == s.rps);
    }

    #[test]
    fn start_then_first_window() {
        let r = rig(0, 1);

        r.clock.set(500);
        let early = r.sampler.snapshot();
        assert_eq!(early.rps, 0.0);
        assert_eq!(early.cpu_percent, 0.0);

        for _ in 0..50 {
            r.sampler.record_request();
        }
        r.clock.set(1100);
        let snap = r.sampler.snapshot();
        assert!((snap.rps - 50.0 * 1000.0 / 1100.0).abs() < 1e-9);
        assert_eq!(r.sampler.pending_requests(), 0);
        assert_eq!(snap.pid, 42);
        assert_eq!(snap.working_set_bytes, 4096);
        assert_eq!(snap.private_bytes, 2048);
    }

    #[test]
    fn concurrent_readers_reset_once() {
        let r = rig(0, 1);
        for _ in 0..300 {
            r.sampler.record_request();
        }
        r.clock.set(3000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&r.sampler);
                std::thread::spawn(move || s.sample_rps(3000).reset)
            })
            .collect();
        let resets = handles.into_iter().map(|h| h.join().unwrap()).filter(|&b| b).count();

        assert_eq!(resets, 1);
        assert_eq!(r.sampler.rps(), 100.0);
    }

    #[test]
    fn force_collect_runs_two_full_passes() {
        let r = rig(0, 1);
        r.sampler.force_collect();
        let snap = r.sampler.snapshot();
        assert_eq!(snap.gen2_collections, 2);
        assert_eq!(snap.gen0_collections, 2);
        assert_eq!(r.heap.collection_count(Generation::Gen1), 2);
    }

    #[test]
    fn failed_cpu_read_keeps_cache_and_baseline() {
        let r = rig(1000, 1);
        r.cpu.0.store(1500, Ordering::SeqCst);
        assert_eq!(r.sampler.sample_cpu(2000), 25.0);

        r.cpu.1.store(true, Ordering::SeqCst);
        r.cpu.0.store(2000, Ordering::SeqCst);
        assert_eq!(r.sampler.sample_cpu(3500), 25.0);

        // The failed window is claimed again once reads recover, measured
        // from the last good baseline (1500 ms at t=2000).
        r.cpu.1.store(false, Ordering::SeqCst);
        assert_eq!(r.sampler.sample_cpu(4000), 25.0);
        r.cpu.0.store(3000, Ordering::SeqCst);
        assert_eq!(r.sampler.sample_cpu(5001), 1000.0 * 100.0 / 1001.0);
    }

    #[test]
    fn unsupported_backend_reads_zero_every_window() {
        let clock = Arc::new(ManualClock::new(0));
        let sampler = ResourceSampler::builder()
            .refresh_interval_ms(1000)
            .clock(clock.clone())
            .processor_time(Arc::new(ProcessorTimeSource::Unsupported))
            .memory_probe(Arc::new(FakeMemory))
            .processor_count(4)
            .build(Arc::new(AllocatorHeap::new()));
        assert!(!sampler.cpu_supported());

        for window in 1..=5u64 {
            clock.set(window * 1500);
            let snap = sampler.snapshot();
            assert_eq!(snap.cpu_percent, 0.0);
        }
    }
}
