//! X25519 key agreement.

use x25519_dalek::{PublicKey, StaticSecret};

use crate::error::CryptoError;

/// Performs X25519 scalar multiplication of `secret` with `peer_public`.
///
/// Low-order peer points produce an all-zero shared secret; that output is
/// rejected with `WeakKeyExchange` rather than handed to the caller.
pub fn ecdh(secret: &[u8; 32], peer_public: &[u8; 32]) -> Result<[u8; 32], CryptoError> {
    let secret = StaticSecret::from(*secret);
    let public = PublicKey::from(*peer_public);

    let shared = secret.diffie_hellman(&public);
    if !shared.was_contributory() {
        return Err(CryptoError::WeakKeyExchange);
    }

    Ok(shared.to_bytes())
}
