//! Authenticated `sealed-v1` envelopes: AES-256-GCM-SIV with a per-file salt.
//!
//! ```text
//! "FCS1" (4) || salt (16) || nonce (12) || ciphertext + tag (len(plaintext) + 16)
//! ```
//!
//! The file key is `HMAC-SHA256(key = salt, msg = passphrase)`. Unlike the
//! legacy format the whole passphrase matters and tampering is detected, but
//! there is still no work factor against guessing.

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

/// Magic prefix identifying a sealed-v1 envelope.
pub const MAGIC: &[u8; 4] = b"FCS1";

/// Byte length of the per-file salt.
pub const SALT_LEN: usize = 16;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the AEAD authentication tag.
pub const TAG_LEN: usize = 16;

/// Byte length of the derived AES-256 key.
pub const SEALED_KEY_LEN: usize = 32;

const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN;

type HmacSha256 = Hmac<Sha256>;

/// Errors produced by the sealed envelope layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SealError {
    /// The input is not a sealed-v1 envelope.
    #[error("malformed sealed envelope: {0}")]
    MalformedInput(&'static str),

    /// The authentication tag did not verify: wrong passphrase or tampered data.
    #[error("authentication failed (wrong passphrase or tampered data)")]
    AuthenticationFailed,

    /// AES-GCM-SIV encryption failed.
    #[error("aead operation failed")]
    AeadFailure,
}

/// Seal `plaintext` under `passphrase`.
///
/// # Errors
///
/// Returns [`SealError::AeadFailure`] on an internal AEAD error (unreachable
/// with a well-formed key and nonce).
pub fn seal(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>, SealError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = build_cipher(passphrase, &salt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| SealError::AeadFailure)?;

    let mut envelope = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    envelope.extend_from_slice(MAGIC);
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Open a sealed-v1 envelope with `passphrase`.
///
/// # Errors
///
/// Returns [`SealError::MalformedInput`] if the magic prefix is missing or the
/// envelope is too short to hold a tag.
/// Returns [`SealError::AuthenticationFailed`] if the tag does not verify.
pub fn open(envelope: &[u8], passphrase: &str) -> Result<Vec<u8>, SealError> {
    if envelope.len() < HEADER_LEN + TAG_LEN {
        return Err(SealError::MalformedInput("too short"));
    }
    let (magic, rest) = envelope.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(SealError::MalformedInput("missing FCS1 prefix"));
    }
    let (salt, rest) = rest.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let cipher = build_cipher(passphrase, salt)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| SealError::AuthenticationFailed)
}

fn build_cipher(passphrase: &str, salt: &[u8]) -> Result<Aes256GcmSiv, SealError> {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(salt).map_err(|_| SealError::AeadFailure)?;
    mac.update(passphrase.as_bytes());
    let mut key = mac.finalize().into_bytes();

    let cipher = Aes256GcmSiv::new_from_slice(&key[..SEALED_KEY_LEN])
        .map_err(|_| SealError::AeadFailure);
    key.iter_mut().for_each(|b| *b = 0);
    cipher
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let envelope = seal(b"hello world", "secret").unwrap();
        assert!(envelope.starts_with(MAGIC));
        assert_eq!(envelope.len(), HEADER_LEN + 11 + TAG_LEN);
        assert_eq!(open(&envelope, "secret").unwrap(), b"hello world");
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let envelope = seal(b"", "").unwrap();
        assert_eq!(open(&envelope, "").unwrap(), b"");
    }

    #[test]
    fn wrong_passphrase_fails_auth() {
        let envelope = seal(b"hello world", "secret").unwrap();
        assert_eq!(
            open(&envelope, "secrfet"),
            Err(SealError::AuthenticationFailed)
        );
    }

    #[test]
    fn whole_passphrase_is_significant() {
        let envelope = seal(b"x", "0123456789abcdef-tail-one").unwrap();
        assert_eq!(
            open(&envelope, "0123456789abcdef-tail-two"),
            Err(SealError::AuthenticationFailed)
        );
    }

    #[test]
    fn tampered_ciphertext_fails_auth() {
        let mut envelope = seal(b"tamper me", "k").unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0xFF;
        assert_eq!(open(&envelope, "k"), Err(SealError::AuthenticationFailed));
    }

    #[test]
    fn salt_and_nonce_are_fresh() {
        let a = seal(b"same", "k").unwrap();
        let b = seal(b"same", "k").unwrap();
        assert_ne!(a[..HEADER_LEN], b[..HEADER_LEN]);
    }

    #[test]
    fn rejects_missing_magic() {
        let mut envelope = seal(b"data", "k").unwrap();
        envelope[0] = b'X';
        assert!(matches!(open(&envelope, "k"), Err(SealError::MalformedInput(_))));
    }

    #[test]
    fn rejects_short_input() {
        assert!(matches!(open(b"FCS1", "k"), Err(SealError::MalformedInput(_))));
        assert!(matches!(open(b"", "k"), Err(SealError::MalformedInput(_))));
    }
}
