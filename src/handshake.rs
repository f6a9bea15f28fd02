//! Hybrid post-quantum X3DH handshake.
//!
//! Three contributions are combined into the session seed:
//! 1. A Kyber768 encapsulation to the peer's KEM public key (post-quantum
//!    leg; the ciphertext travels alongside the first message).
//! 2. ECDH of the initiator ephemeral with the peer identity ECDH key.
//! 3. ECDH of the initiator identity ECDH key with the peer identity
//!    ECDH key.
//!
//! Compromise of either primitive family alone does not break the session.
//!
//! The pre-key bundle fed into [`initiate`] must already have been checked
//! with [`crate::identity::verify_prekey`]; the handshake does not re-verify
//! it.

use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::identity::{EphemeralKeys, IdentityKeyTriple, PreKeyBundle};
use crate::primitives::{
    ecdh, kdf_expand, kem_decapsulate, kem_encapsulate, KEM_CIPHERTEXT_LEN, KEM_SHARED_LEN,
};
use crate::session::SessionState;

/// HKDF info string for the session seed. The protocol version prefix makes
/// a version bump a clean wire break.
pub(crate) const SESSION_KEY_INFO: &[u8] = b"LibertyReach-v1|Session-Key";

/// Total session seed length:
/// aead_key(32) + mac_key(32) + nonce(12) + send_chain(32) + recv_chain(32).
const SEED_LEN: usize = 140;

/// Runs the initiator side of the handshake against a verified pre-key
/// bundle.
///
/// Returns the fresh session state together with the KEM ciphertext the
/// peer needs for its mirror run. All derived material is discarded on any
/// failure.
pub fn initiate(
    local: &IdentityKeyTriple,
    ephemeral: &EphemeralKeys,
    bundle: &PreKeyBundle,
) -> Result<(SessionState, [u8; KEM_CIPHERTEXT_LEN]), CryptoError> {
    let (kem_ciphertext, kem_shared) = kem_encapsulate(&bundle.kem_public)?;
    let kem_shared = Zeroizing::new(kem_shared);

    // Ephemeral-to-identity, then identity-to-identity.
    let dh_a = Zeroizing::new(ecdh(&ephemeral.secret, &bundle.ecdh_public)?);
    let dh_b = Zeroizing::new(ecdh(&local.ecdh_secret, &bundle.ecdh_public)?);

    let seed = derive_seed(&kem_shared, &dh_a, &dh_b)?;

    let state = SessionState::from_seed(
        &seed,
        false,
        ephemeral.public,
        ephemeral.secret,
        bundle.ecdh_public,
    );

    Ok((state, kem_ciphertext))
}

/// Runs the responder side of the handshake.
///
/// `remote_ecdh_public` is the initiator's identity ECDH key,
/// `remote_ephemeral_public` the ephemeral it sent with the first message.
pub fn respond(
    local: &IdentityKeyTriple,
    remote_ecdh_public: &[u8; 32],
    remote_ephemeral_public: &[u8; 32],
    kem_ciphertext: &[u8; KEM_CIPHERTEXT_LEN],
) -> Result<SessionState, CryptoError> {
    let kem_shared = Zeroizing::new(kem_decapsulate(&local.kem_secret, kem_ciphertext)?);

    // Mirror image of the initiator's two ECDH legs.
    let dh_a = Zeroizing::new(ecdh(&local.ecdh_secret, remote_ephemeral_public)?);
    let dh_b = Zeroizing::new(ecdh(&local.ecdh_secret, remote_ecdh_public)?);

    let seed = derive_seed(&kem_shared, &dh_a, &dh_b)?;

    let state = SessionState::from_seed(
        &seed,
        true,
        local.ecdh_public,
        local.ecdh_secret,
        *remote_ephemeral_public,
    );

    Ok(state)
}

/// Expands `kem_shared || dh_a || dh_b` into the 140-byte session seed.
fn derive_seed(
    kem_shared: &[u8; KEM_SHARED_LEN],
    dh_a: &[u8; 32],
    dh_b: &[u8; 32],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let mut ikm = Zeroizing::new(Vec::with_capacity(KEM_SHARED_LEN + 64));
    ikm.extend_from_slice(kem_shared);
    ikm.extend_from_slice(dh_a);
    ikm.extend_from_slice(dh_b);

    Ok(Zeroizing::new(kdf_expand(&ikm, SESSION_KEY_INFO, SEED_LEN)?))
}
