//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Accept multipart uploads and hand their bytes to the crypto layer.
//! - Persist results through the configured [`ArtifactStore`](crate::storage::ArtifactStore).
//! - Serve stored results for download.

pub mod handlers;
pub mod middleware;
pub mod page;
pub mod router;
pub mod state;
