//! Key derivation via HKDF with a SHA-3 PRF.
//!
//! All chain advances and session-key expansions in the core go through
//! these wrappers. The salt is always empty; domain separation comes from
//! the `info` string.

use hkdf::Hkdf;
use sha3::Sha3_512;

use crate::error::CryptoError;

/// Expands `ikm` into `out_len` bytes of output keyed by `info`.
pub fn kdf_expand(ikm: &[u8], info: &[u8], out_len: usize) -> Result<Vec<u8>, CryptoError> {
    let hk = Hkdf::<Sha3_512>::new(None, ikm);
    let mut okm = vec![0u8; out_len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::InternalCrypto(e.to_string()))?;
    Ok(okm)
}

/// Expands `ikm` into a single 32-byte key keyed by `info`.
pub fn kdf_expand_key(ikm: &[u8], info: &[u8]) -> Result<[u8; 32], CryptoError> {
    let hk = Hkdf::<Sha3_512>::new(None, ikm);
    let mut key = [0u8; 32];
    hk.expand(info, &mut key)
        .map_err(|e| CryptoError::InternalCrypto(e.to_string()))?;
    Ok(key)
}
