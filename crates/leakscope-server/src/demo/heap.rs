//! Server-side managed heap: tracking-allocator byte count plus the array pool
//! as the only reclaimable region.

use std::sync::Arc;

use leakscope_core::alloc;
use leakscope_core::heap::{CollectionCounters, Generation, ManagedHeap};

use super::pool::{ArrayPool, PooledBuffer};

pub struct DemoHeap {
    pool: Arc<ArrayPool>,
    counters: CollectionCounters,
}

impl DemoHeap {
    pub fn new(pool_max_buffer_bytes: usize, retain_per_bucket: usize) -> Self {
        Self {
            pool: Arc::new(ArrayPool::new(pool_max_buffer_bytes, retain_per_bucket)),
            counters: CollectionCounters::new(),
        }
    }

    /// Rent from the array pool. Surplus releases dropped while settling count
    /// as a young-generation pass.
    pub fn rent(&self, len: usize) -> PooledBuffer {
        let (buf, dropped) = self.pool.rent(len);
        if dropped > 0 {
            self.counters.record(Generation::Gen0);
            tracing::debug!(dropped, "pool surplus reclaimed");
        }
        buf
    }

    pub fn pool(&self) -> &ArrayPool {
        &self.pool
    }
}

impl ManagedHeap for DemoHeap {
    fn allocated_bytes(&self) -> u64 {
        alloc::allocated_bytes()
    }

    fn collection_count(&self, generation: Generation) -> u64 {
        self.counters.get(generation)
    }

    fn collect(&self, generation: Generation) {
        let keep = match generation {
            Generation::Gen2 => 0,
            Generation::Gen0 | Generation::Gen1 => self.pool.retain_per_bucket() / 2,
        };
        let freed_bytes = self.pool.trim(keep);
        self.counters.record(generation);
        tracing::debug!(?generation, freed_bytes, "heap collect");
    }

    fn wait_for_pending_finalizers(&self) {
        let dropped = self.pool.settle();
        tracing::debug!(dropped, idle = self.pool.idle_buffers(), "pending releases settled");
    }
}
