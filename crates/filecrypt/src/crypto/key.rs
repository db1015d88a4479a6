//! Legacy passphrase-to-key derivation.
//!
//! The passphrase is block-padded and truncated to [`KEY_LEN`] bytes:
//!
//! - shorter than 16 bytes: PKCS#7-style padding fills the key (`"abc"` gives
//!   `b"abc"` followed by thirteen `0x0d` bytes);
//! - exactly 16 bytes: used as-is;
//! - longer than 16 bytes: **silently truncated**, every byte after the 16th
//!   is ignored.
//!
//! There is no salt and no work factor. This is not a password KDF and exists
//! only so that envelopes produced by the legacy format keep decrypting. New
//! data should use [`EnvelopeFormat::SealedV1`](super::EnvelopeFormat::SealedV1).

use std::fmt;

use thiserror::Error;

/// Byte length of an AES-128 key.
pub const KEY_LEN: usize = 16;

/// Cipher block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Errors produced while turning caller input into key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The passphrase bytes are not valid UTF-8.
    #[error("passphrase is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A caller-supplied passphrase.
///
/// Never printed, not even through `Debug`. Zeroed on drop.
#[derive(Clone)]
pub struct Passphrase(String);

impl Passphrase {
    /// Validate raw bytes as a UTF-8 passphrase.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Encoding`] if `bytes` is not valid UTF-8.
    pub fn from_utf8(bytes: Vec<u8>) -> Result<Self, KeyError> {
        Ok(Self(String::from_utf8(bytes)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Passphrase {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase([REDACTED])")
    }
}

impl Drop for Passphrase {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.iter_mut().for_each(|b| *b = 0);
    }
}

/// A 16-byte AES-128 key derived from a [`Passphrase`].
///
/// Lives for a single encrypt/decrypt call. The memory is overwritten with
/// zeroes on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherKey([u8; KEY_LEN]);

impl CipherKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("CipherKey([REDACTED])")
    }
}

/// Derive the legacy [`CipherKey`] from a passphrase.
///
/// Equivalent to PKCS#7-padding the UTF-8 bytes to the block size and keeping
/// the first [`KEY_LEN`] bytes. The empty passphrase therefore maps to sixteen
/// `0x10` bytes.
pub fn derive_key(passphrase: &str) -> CipherKey {
    let bytes = passphrase.as_bytes();
    let mut key = [0u8; KEY_LEN];

    if bytes.len() >= KEY_LEN {
        key.copy_from_slice(&bytes[..KEY_LEN]);
    } else {
        let pad = (BLOCK_LEN - bytes.len() % BLOCK_LEN) as u8;
        key[..bytes.len()].copy_from_slice(bytes);
        key[bytes.len()..].fill(pad);
    }

    CipherKey(key)
}
