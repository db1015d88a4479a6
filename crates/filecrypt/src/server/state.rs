//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::crypto::EnvelopeFormat;
use crate::storage::ArtifactStore;

/// Application state shared across all request handlers.
///
/// Cheap to clone: the store is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Where transform results are written and served from.
    pub store: Arc<dyn ArtifactStore>,
    /// Envelope format applied when an upload does not name one.
    pub default_format: EnvelopeFormat,
}

impl AppState {
    pub fn new(store: Arc<dyn ArtifactStore>, default_format: EnvelopeFormat) -> Self {
        Self {
            store,
            default_format,
        }
    }
}
