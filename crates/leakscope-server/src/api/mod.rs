//! `/api` handlers: the diagnostics pair plus the retention demos.

pub mod demos;
pub mod diagnostics;
pub mod error;

pub use error::{ApiError, ApiResult};
