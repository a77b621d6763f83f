use std::sync::atomic::{AtomicU64, Ordering};

/// Refresh gate for one derived metric.
///
/// Holds the timestamp of the last recomputation. A caller that observes more
/// than `interval_ms` since then races to CAS the timestamp forward; exactly
/// one caller per window wins and recomputes, the rest keep reading the cached
/// value.
#[derive(Debug)]
pub struct RefreshGate {
    last_ms: AtomicU64,
    interval_ms: u64,
}

impl RefreshGate {
    pub fn new(origin_ms: u64, interval_ms: u64) -> Self {
        Self {
            last_ms: AtomicU64::new(origin_ms),
            interval_ms,
        }
    }

    /// Claim the window ending at `now_ms`.
    ///
    /// Returns the elapsed milliseconds since the previous baseline for the
    /// winning caller, `None` while the interval has not passed or when another
    /// caller already advanced the baseline.
    pub fn try_claim(&self, now_ms: u64) -> Option<u64> {
        let last = self.last_ms.load(Ordering::Acquire);
        let elapsed = now_ms.saturating_sub(last);
        if elapsed <= self.interval_ms {
            return None;
        }
        self.last_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| elapsed)
    }

    /// Hand back a window claimed at `now_ms` whose recompute could not run,
    /// so the next caller claims it again. No-op if the baseline moved since.
    pub fn release(&self, now_ms: u64, elapsed_ms: u64) {
        let _ = self.last_ms.compare_exchange(
            now_ms,
            now_ms.saturating_sub(elapsed_ms),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn last_ms(&self) -> u64 {
        self.last_ms.load(Ordering::Acquire)
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn closed_until_interval_strictly_exceeded() {
        let g = RefreshGate::new(0, 1000);
        assert_eq!(g.try_claim(500), None);
        assert_eq!(g.try_claim(1000), None);
        assert_eq!(g.try_claim(1001), Some(1001));
        assert_eq!(g.last_ms(), 1001);
        assert_eq!(g.try_claim(1500), None);
    }

    #[test]
    fn released_window_is_claimed_again() {
        let g = RefreshGate::new(0, 1000);
        let elapsed = g.try_claim(1500).unwrap();
        g.release(1500, elapsed);
        assert_eq!(g.last_ms(), 0);
        assert_eq!(g.try_claim(1600), Some(1600));
    }

    #[test]
    fn clock_going_backwards_does_not_claim() {
        let g = RefreshGate::new(5000, 1000);
        assert_eq!(g.try_claim(10), None);
        assert_eq!(g.last_ms(), 5000);
    }

    #[test]
    fn one_winner_per_window() {
        let g = Arc::new(RefreshGate::new(0, 1000));
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let g = Arc::clone(&g);
                let wins = Arc::clone(&wins);
                std::thread::spawn(move || {
                    if g.try_claim(2000).is_some() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
