use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free count of requests since the last RPS reset.
#[derive(Debug, Default)]
pub struct RequestCounter {
    count: AtomicU64,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Reset to zero, returning the pre-reset value in the same atomic step.
    pub fn take(&self) -> u64 {
        self.count.swap(0, Ordering::AcqRel)
    }
}

/// Outcome of one RPS sampling attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub rps: f64,
    /// True when this call recomputed the rate and reset the counter.
    pub reset: bool,
}

pub fn requests_per_second(count: u64, elapsed_ms: f64) -> f64 {
    if elapsed_ms <= 0.0 {
        return 0.0;
    }
    count as f64 * 1000.0 / elapsed_ms
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::sync::Arc;

    #[test]
    fn rate_formula() {
        assert_eq!(requests_per_second(250, 2000.0), 125.0);
        assert_eq!(requests_per_second(0, 2000.0), 0.0);
        assert_eq!(requests_per_second(10, 0.0), 0.0);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let c = Arc::new(RequestCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.record();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.get(), 8000);
    }

    #[test]
    fn take_then_record_leaves_only_new_requests() {
        let c = RequestCounter::new();
        for _ in 0..7 {
            c.record();
        }
        assert_eq!(c.take(), 7);
        for _ in 0..3 {
            c.record();
        }
        assert_eq!(c.get(), 3);
    }
}
