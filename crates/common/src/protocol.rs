//! Response types returned by the HTTP service.
//!
//! Uploads arrive as `multipart/form-data`, so only the response side of the
//! protocol is modelled here. All bodies are serialised as JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The transform requested by an upload.
///
/// Parsed from the `form_type` multipart field (`"encrypt"` or `"decrypt"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Encrypt,
    Decrypt,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when `form_type` names no known operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation: {0:?}")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encrypt" => Ok(Operation::Encrypt),
            "decrypt" => Ok(Operation::Decrypt),
            other => Err(UnknownOperation(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Transform endpoints
// ---------------------------------------------------------------------------

/// Successful response body for `POST /`, `POST /encrypt` and `POST /decrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResponse {
    /// Which transform was applied.
    pub operation: Operation,
    /// Name under which the result was stored.
    pub filename: String,
    /// Size in bytes of the stored result.
    pub size: u64,
    /// Envelope format used (`"legacy-cbc"` or `"sealed-v1"`).
    pub format: String,
    /// Relative URL from which the result can be downloaded.
    pub download_url: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the output directory exists and is usable.
    pub storage_ready: bool,
}
