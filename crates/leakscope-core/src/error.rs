//! Shared error type across leakscope crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Upstream endpoint unreachable or failed.
    Upstream,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Upstream => "UPSTREAM",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, LeakscopeError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum LeakscopeError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("upstream: {0}")]
    Upstream(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl LeakscopeError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            LeakscopeError::BadRequest(_) => ClientCode::BadRequest,
            LeakscopeError::Upstream(_) => ClientCode::Upstream,
            LeakscopeError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            LeakscopeError::Internal(_) => ClientCode::Internal,
        }
    }
}
