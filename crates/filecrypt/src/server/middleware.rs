//! Limits applied by the router's middleware layers.

use std::time::Duration;

use crate::config::Config;

/// Request size and time limits.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum request body size, including multipart framing.
    pub max_upload_bytes: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Limits {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_upload_bytes: cfg.max_upload_bytes,
            request_timeout: cfg.request_timeout(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 50 * 1024 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}
