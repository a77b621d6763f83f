//! Retention and allocation patterns exercised by the `/api` demo endpoints.
//!
//! - `heap`: the `ManagedHeap` the sampler reads (tracking allocator + pool)
//! - `pool`: bucketed byte-array pool with deferred releases
//! - `retention`: strings rooted for the life of the process
//! - `watch`: directory watchers that are never stopped

pub mod heap;
pub mod pool;
pub mod retention;
pub mod watch;

pub use heap::DemoHeap;
pub use pool::{ArrayPool, PooledBuffer};
pub use retention::StringBag;
pub use watch::WatchRegistry;
