//! Bucketed byte-array pool.
//!
//! Buckets hold idle buffers of power-of-two capacity (16 bytes up to the
//! configured maximum). A rented [`PooledBuffer`] does not go straight back
//! into its bucket when dropped: it lands on a pending-release queue that is
//! settled either by the next rental that finds its bucket empty or by the
//! heap's finalization step.

use std::sync::{Arc, Mutex, MutexGuard};

const MIN_BUCKET_BYTES: usize = 16;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct ArrayPool {
    buckets: Vec<Mutex<Vec<Vec<u8>>>>,
    pending: Mutex<Vec<Vec<u8>>>,
    max_buffer_bytes: usize,
    retain_per_bucket: usize,
}

impl ArrayPool {
    pub fn new(max_buffer_bytes: usize, retain_per_bucket: usize) -> Self {
        let max_buffer_bytes = max_buffer_bytes.max(MIN_BUCKET_BYTES).next_power_of_two();
        let bucket_count = bucket_index(max_buffer_bytes) + 1;
        Self {
            buckets: (0..bucket_count).map(|_| Mutex::new(Vec::new())).collect(),
            pending: Mutex::new(Vec::new()),
            max_buffer_bytes,
            retain_per_bucket,
        }
    }

    /// Rent a buffer of exactly `len` bytes. Returned bytes may hold data from
    /// an earlier renter.
    ///
    /// The second value is the number of surplus buffers dropped while
    /// settling pending releases.
    pub fn rent(self: &Arc<Self>, len: usize) -> (PooledBuffer, usize) {
        if len > self.max_buffer_bytes {
            let buf = vec![0u8; len];
            return (PooledBuffer { buf: Some(buf), pool: None }, 0);
        }

        let idx = bucket_index(len);
        let mut dropped = 0;
        let mut reused = lock(&self.buckets[idx]).pop();
        if reused.is_none() {
            dropped = self.settle();
            reused = lock(&self.buckets[idx]).pop();
        }

        let mut buf = reused.unwrap_or_else(|| Vec::with_capacity(bucket_bytes(idx)));
        buf.resize(len, 0);
        (PooledBuffer { buf: Some(buf), pool: Some(Arc::clone(self)) }, dropped)
    }

    /// Move pending releases into their buckets. Buffers beyond the retention
    /// cap are dropped; returns how many.
    pub fn settle(&self) -> usize {
        let pending = std::mem::take(&mut *lock(&self.pending));
        let mut dropped = 0;
        for mut buf in pending {
            let idx = bucket_index(buf.capacity());
            let mut bucket = lock(&self.buckets[idx]);
            if bucket.len() < self.retain_per_bucket {
                buf.clear();
                bucket.push(buf);
            } else {
                dropped += 1;
            }
        }
        dropped
    }

    /// Drop idle buffers until each bucket holds at most `keep`. Returns the
    /// number of bytes released.
    pub fn trim(&self, keep: usize) -> usize {
        let mut freed = 0;
        for bucket in &self.buckets {
            let mut bucket = lock(bucket);
            while bucket.len() > keep {
                if let Some(buf) = bucket.pop() {
                    freed += buf.capacity();
                }
            }
        }
        freed
    }

    pub fn idle_buffers(&self) -> usize {
        self.buckets.iter().map(|b| lock(b).len()).sum()
    }

    pub fn pending_releases(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn retain_per_bucket(&self) -> usize {
        self.retain_per_bucket
    }

    fn release(&self, buf: Vec<u8>) {
        lock(&self.pending).push(buf);
    }
}

fn bucket_index(len: usize) -> usize {
    let cap = len.max(MIN_BUCKET_BYTES).next_power_of_two();
    (cap.trailing_zeros() - MIN_BUCKET_BYTES.trailing_zeros()) as usize
}

fn bucket_bytes(idx: usize) -> usize {
    MIN_BUCKET_BYTES << idx
}

/// Rented buffer; hands itself back to the pool's pending queue on drop.
/// Oversized rentals have no pool and are freed normally.
pub struct PooledBuffer {
    buf: Option<Vec<u8>>,
    pool: Option<Arc<ArrayPool>>,
}

impl PooledBuffer {
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.buf.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }
}

impl AsRef<[u8]> for PooledBuffer {
    fn as_ref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or_default()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let (Some(pool), Some(buf)) = (self.pool.take(), self.buf.take()) {
            pool.release(buf);
        }
    }
}
