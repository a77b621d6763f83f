//! leakscope server library entry.
//!
//! Wires config, shared state, the request-entry hook, the diagnostics and
//! demo handlers, and the ops endpoints into one axum router. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod demo;
pub mod obs;
pub mod ops;
pub mod router;
