//! Top-level facade crate for leakscope.
//!
//! Re-exports the sampler core and the server library so users can depend on a single crate.

pub mod core {
    pub use leakscope_core::*;
}

pub mod server {
    pub use leakscope_server::*;
}
