//! AES-128-CBC envelope encryption with PKCS#7 padding.
//!
//! Envelope layout:
//!
//! ```text
//! IV (16 bytes) || CIPHERTEXT (N * 16 bytes, N >= 1)
//! ```
//!
//! There is no version byte and no authentication tag. The padding check on
//! decrypt is the only integrity signal, and random garbage passes it with
//! probability around 1/256.

use aes::Aes128;
use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

use super::key::{CipherKey, BLOCK_LEN};

/// Byte length of the CBC initialisation vector.
pub const IV_LEN: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Errors produced when opening a legacy envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The envelope is too short or its ciphertext is not whole blocks.
    #[error("malformed envelope: {0}")]
    MalformedInput(&'static str),

    /// The decrypted padding is invalid: wrong passphrase or corrupted data.
    #[error("invalid padding (wrong passphrase or corrupted data)")]
    Padding,
}

/// Encrypt `plaintext` under `key`, returning `IV || ciphertext`.
///
/// A fresh IV is drawn from the OS CSPRNG on every call. Plaintext that is
/// already block-aligned gains a full extra block of padding.
pub fn encrypt(plaintext: &[u8], key: &CipherKey) -> Vec<u8> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes128CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut envelope = Vec::with_capacity(IV_LEN + ciphertext.len());
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&ciphertext);
    envelope
}

/// Decrypt an `IV || ciphertext` envelope under `key`.
///
/// # Errors
///
/// Returns [`CodecError::MalformedInput`] if the envelope is shorter than an IV
/// or the ciphertext is empty or not a multiple of [`BLOCK_LEN`].
/// Returns [`CodecError::Padding`] if the trailing padding does not validate.
pub fn decrypt(envelope: &[u8], key: &CipherKey) -> Result<Vec<u8>, CodecError> {
    if envelope.len() < IV_LEN {
        return Err(CodecError::MalformedInput("shorter than the IV"));
    }
    let (iv, ciphertext) = envelope.split_at(IV_LEN);
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CodecError::MalformedInput(
            "ciphertext is not a positive multiple of the block size",
        ));
    }

    let mut iv_block = [0u8; IV_LEN];
    iv_block.copy_from_slice(iv);

    Aes128CbcDec::new(key.as_bytes().into(), (&iv_block).into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CodecError::Padding)
}
