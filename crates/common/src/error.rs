//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::PayloadTooLarge`] → 413
/// - [`ServiceError::TransformFailure`] → 422
/// - [`ServiceError::Unavailable`] → 503
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed: missing file or key, unknown action, or bad file name.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested artifact does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The upload exceeds the configured body limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Encryption or decryption of the uploaded bytes failed.
    ///
    /// Wrong passphrase and corrupted input are not distinguishable for legacy
    /// envelopes, so both surface through this variant.
    #[error("transform failed: {0}")]
    TransformFailure(String),

    /// Storage is not ready (e.g. the output directory is missing).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::PayloadTooLarge(_) => 413,
            ServiceError::TransformFailure(_) => 422,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::PayloadTooLarge(_) => "payload_too_large",
            ServiceError::TransformFailure(_) => "transform_failed",
            ServiceError::Unavailable(_) => "service_unavailable",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}
