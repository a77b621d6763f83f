//! Managed-heap seam read by the sampler.
//!
//! The server owns the concrete heap (pools, deferred releases); the sampler
//! only needs byte and collection counters plus a way to request reclamation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Reclamation tier. A pass over a tier also counts for every younger tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Generation {
    Gen0 = 0,
    Gen1 = 1,
    Gen2 = 2,
}

impl Generation {
    pub const ALL: [Generation; 3] = [Generation::Gen0, Generation::Gen1, Generation::Gen2];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Heap counters and reclamation hooks.
pub trait ManagedHeap: Send + Sync {
    /// Live bytes currently allocated.
    fn allocated_bytes(&self) -> u64;

    /// Number of reclamation passes that covered `generation`.
    fn collection_count(&self, generation: Generation) -> u64;

    /// Run one blocking reclamation pass up to and including `generation`.
    fn collect(&self, generation: Generation);

    /// Block until releases deferred by earlier passes have settled.
    fn wait_for_pending_finalizers(&self);
}

/// Per-generation pass counters.
#[derive(Debug, Default)]
pub struct CollectionCounters {
    counts: [AtomicU64; 3],
}

impl CollectionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one pass over `generation` (and therefore every younger one).
    pub fn record(&self, generation: Generation) {
        for g in &self.counts[..=generation.index()] {
            g.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self, generation: Generation) -> u64 {
        self.counts[generation.index()].load(Ordering::Relaxed)
    }
}

/// Heap backed only by the tracking allocator: collections are counted but
/// have nothing to reclaim.
#[derive(Debug, Default)]
pub struct AllocatorHeap {
    counters: CollectionCounters,
}

impl AllocatorHeap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ManagedHeap for AllocatorHeap {
    fn allocated_bytes(&self) -> u64 {
        crate::alloc::allocated_bytes()
    }

    fn collection_count(&self, generation: Generation) -> u64 {
        self.counters.get(generation)
    }

    fn collect(&self, generation: Generation) {
        self.counters.record(generation);
    }

    fn wait_for_pending_finalizers(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_pass_counts_for_younger_generations() {
        let c = CollectionCounters::new();
        c.record(Generation::Gen0);
        c.record(Generation::Gen2);

        assert_eq!(c.get(Generation::Gen0), 2);
        assert_eq!(c.get(Generation::Gen1), 1);
        assert_eq!(c.get(Generation::Gen2), 1);
    }

    #[test]
    fn allocator_heap_counts_collections() {
        let heap = AllocatorHeap::new();
        heap.collect(Generation::Gen1);
        assert_eq!(heap.collection_count(Generation::Gen0), 1);
        assert_eq!(heap.collection_count(Generation::Gen1), 1);
        assert_eq!(heap.collection_count(Generation::Gen2), 0);
    }
}
