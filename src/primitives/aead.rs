//! AES-256-GCM authenticated encryption.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::error::CryptoError;

/// AEAD nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes, appended to every ciphertext.
pub const AEAD_TAG_LEN: usize = 16;

/// Encrypts `plaintext` under `key`/`nonce`, binding `aad`.
///
/// The output is `plaintext.len() + AEAD_TAG_LEN` bytes with the tag
/// appended.
pub fn aead_seal(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::InternalCrypto(e.to_string()))
}

/// Decrypts and authenticates `ciphertext`.
///
/// Fails with `Unauthentic` if the tag does not verify; no partial
/// plaintext is ever returned.
pub fn aead_open(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::Unauthentic)
}
