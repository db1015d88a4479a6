//! Envelope format selection and the passphrase-level transform API.
//!
//! Callers hand in raw bytes and a passphrase and receive raw bytes back.
//! Legacy envelopes carry no tag, so the format is always chosen by the
//! caller and never sniffed from the input.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use super::{codec, key, sealed};

/// Envelope format versions understood by the transform layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvelopeFormat {
    /// `IV || AES-128-CBC ciphertext`, legacy passphrase derivation, no tag.
    #[default]
    LegacyCbc,
    /// `FCS1 || salt || nonce || AES-256-GCM-SIV ciphertext+tag`.
    SealedV1,
}

impl EnvelopeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeFormat::LegacyCbc => "legacy-cbc",
            EnvelopeFormat::SealedV1 => "sealed-v1",
        }
    }

    /// Whether tampering and wrong passphrases are reliably detected.
    pub fn is_authenticated(self) -> bool {
        match self {
            EnvelopeFormat::LegacyCbc => false,
            EnvelopeFormat::SealedV1 => true,
        }
    }
}

impl fmt::Display for EnvelopeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown envelope format {0:?} (expected legacy-cbc or sealed-v1)")]
pub struct UnknownFormat(pub String);

impl FromStr for EnvelopeFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy-cbc" => Ok(EnvelopeFormat::LegacyCbc),
            "sealed-v1" => Ok(EnvelopeFormat::SealedV1),
            other => Err(UnknownFormat(other.to_owned())),
        }
    }
}

/// Any failure of an encrypt or decrypt call.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Key(#[from] key::KeyError),

    #[error(transparent)]
    Codec(#[from] codec::CodecError),

    #[error(transparent)]
    Sealed(#[from] sealed::SealError),
}

impl TransformError {
    /// Short label for logs. Never includes key or content bytes.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformError::Key(_) => "encoding",
            TransformError::Codec(codec::CodecError::MalformedInput(_))
            | TransformError::Sealed(sealed::SealError::MalformedInput(_)) => "malformed_input",
            TransformError::Codec(codec::CodecError::Padding) => "padding",
            TransformError::Sealed(sealed::SealError::AuthenticationFailed) => "authentication",
            TransformError::Sealed(sealed::SealError::AeadFailure) => "aead",
        }
    }
}

/// Encrypt `plaintext` with `passphrase` into an envelope of the given format.
///
/// # Errors
///
/// Only the sealed format can fail, and only on an internal AEAD error.
pub fn encrypt(
    plaintext: &[u8],
    passphrase: &str,
    format: EnvelopeFormat,
) -> Result<Vec<u8>, TransformError> {
    match format {
        EnvelopeFormat::LegacyCbc => Ok(codec::encrypt(plaintext, &key::derive_key(passphrase))),
        EnvelopeFormat::SealedV1 => Ok(sealed::seal(plaintext, passphrase)?),
    }
}

/// Decrypt an envelope of the given format with `passphrase`.
///
/// # Errors
///
/// See [`codec::decrypt`] and [`sealed::open`].
pub fn decrypt(
    envelope: &[u8],
    passphrase: &str,
    format: EnvelopeFormat,
) -> Result<Vec<u8>, TransformError> {
    match format {
        EnvelopeFormat::LegacyCbc => Ok(codec::decrypt(envelope, &key::derive_key(passphrase))?),
        EnvelopeFormat::SealedV1 => Ok(sealed::open(envelope, passphrase)?),
    }
}
