use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Process-lifetime bag of strings. Nothing is ever removed, so every entry
/// stays reachable and survives any collection.
#[derive(Default)]
pub struct StringBag {
    items: Mutex<Vec<String>>,
    bytes: AtomicU64,
}

impl StringBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retain(&self, s: String) {
        self.bytes.fetch_add(s.len() as u64, Ordering::Relaxed);
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(s);
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn retained_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}
