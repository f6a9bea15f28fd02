//! Ed25519 detached signatures.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::CryptoError;

/// Signature length in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Signing secret length in bytes (seed followed by the public half).
pub const SIGNING_SECRET_LEN: usize = 64;

/// Verifying key length in bytes.
pub const VERIFYING_KEY_LEN: usize = 32;

/// Signs `message` with the 64-byte keypair encoding of the signing key.
pub fn sign(secret: &[u8; SIGNING_SECRET_LEN], message: &[u8]) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    let signing_key = SigningKey::from_keypair_bytes(secret)
        .map_err(|e| CryptoError::InternalCrypto(e.to_string()))?;
    Ok(signing_key.sign(message).to_bytes())
}

/// Verifies a detached signature. Returns `false` on any mismatch,
/// including a malformed public key.
pub fn verify(public: &[u8; VERIFYING_KEY_LEN], message: &[u8], signature: &[u8; SIGNATURE_LEN]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public) else {
        return false;
    };
    let signature = Signature::from_bytes(signature);
    verifying_key.verify(message, &signature).is_ok()
}
