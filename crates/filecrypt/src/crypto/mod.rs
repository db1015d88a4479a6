//! Passphrase-based file encryption primitives.
//!
//! This module is intentionally free of HTTP and filesystem dependencies:
//! buffers in, buffers out. Every call is independent and holds no shared
//! state, so calls may run on any number of threads at once.
//!
//! # Envelope formats
//!
//! ```text
//! legacy-cbc : IV (16) || AES-128-CBC(PKCS#7(plaintext))
//! sealed-v1  : "FCS1" || salt (16) || nonce (12) || AES-256-GCM-SIV(plaintext)
//! ```
//!
//! `legacy-cbc` keys are the passphrase padded/truncated to 16 bytes (see
//! [`key`]). That derivation has no salt or work factor and ignores every
//! passphrase byte past the 16th; it is kept so existing files still decrypt.

pub mod codec;
pub mod envelope;
pub mod key;
pub mod sealed;

pub use envelope::{decrypt, encrypt, EnvelopeFormat, TransformError};
pub use key::Passphrase;
