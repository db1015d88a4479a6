//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No passphrases, key material, or file contents** may appear in any span
//!   attribute or log field. File names and byte counts are fine.
//! - Log level is configurable via `RUST_LOG`, falling back to `LOG_LEVEL`
//!   (default: `info`).

pub mod init;

pub use init::init_telemetry;
