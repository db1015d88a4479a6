//! Common types, protocol definitions, and errors shared across `filecrypt` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
