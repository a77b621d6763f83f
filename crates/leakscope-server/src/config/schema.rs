use std::net::SocketAddr;

use serde::Deserialize;
use leakscope_core::error::{LeakscopeError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub demos: DemoSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            demos: DemoSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(LeakscopeError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.demos.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Minimum age of a cached CPU / RPS value before it is recomputed.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(100..=60_000).contains(&self.refresh_interval_ms) {
            return Err(LeakscopeError::BadRequest(
                "server.refresh_interval_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| LeakscopeError::BadRequest(format!("server.listen must be a valid SocketAddr: {e}")))
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_refresh_interval_ms() -> u64 {
    leakscope_core::telemetry::DEFAULT_REFRESH_INTERVAL_MS
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoSection {
    /// Size of the strings built by `staticstring` / `bigstring`.
    #[serde(default = "default_string_bytes")]
    pub string_bytes: usize,

    /// Size used by `loh` when no size is given.
    #[serde(default = "default_loh_bytes")]
    pub loh_default_bytes: usize,

    /// Upper bound for any caller-chosen buffer size.
    #[serde(default = "default_max_buffer_bytes")]
    pub max_buffer_bytes: usize,

    /// Rentals above this size bypass the array pool.
    #[serde(default = "default_pool_max_buffer_bytes")]
    pub pool_max_buffer_bytes: usize,

    /// Idle buffers kept per pool bucket.
    #[serde(default = "default_pool_retain")]
    pub pool_retain_per_bucket: usize,

    /// Directory watched by `fileprovider`; system temp dir when unset.
    #[serde(default)]
    pub watch_dir: Option<String>,

    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            string_bytes: default_string_bytes(),
            loh_default_bytes: default_loh_bytes(),
            max_buffer_bytes: default_max_buffer_bytes(),
            pool_max_buffer_bytes: default_pool_max_buffer_bytes(),
            pool_retain_per_bucket: default_pool_retain(),
            watch_dir: None,
            http_timeout_ms: default_http_timeout_ms(),
        }
    }
}

impl DemoSection {
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_bytes == 0 {
            return Err(LeakscopeError::BadRequest("demos.max_buffer_bytes must be positive".into()));
        }
        if self.string_bytes > self.max_buffer_bytes || self.loh_default_bytes > self.max_buffer_bytes {
            return Err(LeakscopeError::BadRequest(
                "demos.string_bytes and demos.loh_default_bytes must not exceed demos.max_buffer_bytes".into(),
            ));
        }
        if !(16..=self.max_buffer_bytes).contains(&self.pool_max_buffer_bytes) {
            return Err(LeakscopeError::BadRequest(
                "demos.pool_max_buffer_bytes must be between 16 and demos.max_buffer_bytes".into(),
            ));
        }
        if !(1..=1024).contains(&self.pool_retain_per_bucket) {
            return Err(LeakscopeError::BadRequest(
                "demos.pool_retain_per_bucket must be between 1 and 1024".into(),
            ));
        }
        if !(100..=120_000).contains(&self.http_timeout_ms) {
            return Err(LeakscopeError::BadRequest(
                "demos.http_timeout_ms must be between 100 and 120000".into(),
            ));
        }
        Ok(())
    }

    /// Reject caller-chosen sizes above the configured ceiling.
    pub fn check_size(&self, size: usize) -> Result<usize> {
        if size > self.max_buffer_bytes {
            return Err(LeakscopeError::BadRequest(format!(
                "size {size} exceeds demos.max_buffer_bytes ({})",
                self.max_buffer_bytes
            )));
        }
        Ok(size)
    }
}

fn default_string_bytes() -> usize {
    10 * 1024
}
fn default_loh_bytes() -> usize {
    85_000
}
fn default_max_buffer_bytes() -> usize {
    64 * 1024 * 1024
}
fn default_pool_max_buffer_bytes() -> usize {
    1024 * 1024
}
fn default_pool_retain() -> usize {
    16
}
fn default_http_timeout_ms() -> u64 {
    10_000
}
