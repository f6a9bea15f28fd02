//! Kyber768 key encapsulation.
//!
//! The KEM contributes the post-quantum leg of the handshake. Parameters
//! are fixed at protocol-version time: 1184-byte public keys, 2400-byte
//! secret keys, 1088-byte ciphertexts, 32-byte shared secrets.

use pqc_kyber::{
    decapsulate, encapsulate, keypair, KYBER_CIPHERTEXTBYTES, KYBER_PUBLICKEYBYTES,
    KYBER_SECRETKEYBYTES, KYBER_SSBYTES,
};
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// KEM public key length in bytes.
pub const KEM_PUBLIC_LEN: usize = KYBER_PUBLICKEYBYTES;

/// KEM secret key length in bytes.
pub const KEM_SECRET_LEN: usize = KYBER_SECRETKEYBYTES;

/// KEM ciphertext length in bytes.
pub const KEM_CIPHERTEXT_LEN: usize = KYBER_CIPHERTEXTBYTES;

/// KEM shared secret length in bytes.
pub const KEM_SHARED_LEN: usize = KYBER_SSBYTES;

/// Generates a fresh KEM keypair.
pub fn kem_keygen() -> Result<([u8; KEM_PUBLIC_LEN], [u8; KEM_SECRET_LEN]), CryptoError> {
    let keys = keypair(&mut OsRng).map_err(|e| CryptoError::InternalCrypto(e.to_string()))?;
    Ok((keys.public, keys.secret))
}

/// Encapsulates to `peer_public`, producing a ciphertext for the peer and
/// the local copy of the shared secret.
pub fn kem_encapsulate(
    peer_public: &[u8; KEM_PUBLIC_LEN],
) -> Result<([u8; KEM_CIPHERTEXT_LEN], [u8; KEM_SHARED_LEN]), CryptoError> {
    encapsulate(peer_public, &mut OsRng).map_err(|e| CryptoError::InternalCrypto(e.to_string()))
}

/// Recovers the shared secret from `ciphertext` with the local secret key.
///
/// Kyber performs implicit rejection: a mangled ciphertext still yields a
/// value, just not the one the sender holds. The mismatch surfaces as an
/// authentication failure on the first AEAD open.
pub fn kem_decapsulate(
    secret: &[u8; KEM_SECRET_LEN],
    ciphertext: &[u8; KEM_CIPHERTEXT_LEN],
) -> Result<[u8; KEM_SHARED_LEN], CryptoError> {
    decapsulate(ciphertext, secret).map_err(|e| CryptoError::InternalCrypto(e.to_string()))
}
