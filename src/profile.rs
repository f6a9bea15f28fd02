//! Durable profile lifecycle with threshold recovery.
//!
//! A profile binds a user id to its identity publics and a random master
//! key. The master key is split into five shares, any three of which
//! recover it; BLAKE3 of the key is stored as the recovery digest so a
//! recovered key can be checked before use.
//!
//! Profiles are permanent: deactivation and reactivation are the only
//! lifecycle transitions, deletion always fails. The clock is supplied by
//! the caller as unix seconds; the core never reads time itself.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::identity::IdentityKeyTriple;
use crate::primitives::{ct_eq, hash, random_array};
use crate::shamir::{self, SecretShare};

/// Number of recovery shares minted per profile.
pub const RECOVERY_SHARES: usize = 5;

/// Shares required to recover the master key.
pub const RECOVERY_THRESHOLD: usize = 3;

/// The master key of a profile together with its recovery material.
///
/// The caller distributes the shares and erases this structure; everything
/// sensitive is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ProfileMasterKey {
    /// The 32-byte master key.
    pub key: [u8; 32],
    /// Creation time, unix seconds. Immutable.
    pub created_at: u64,
    /// BLAKE3 of `key`.
    pub recovery_digest: [u8; 32],
    /// The five recovery shares (threshold three).
    pub shares: Vec<SecretShare>,
}

/// The durable, publicly visible profile record.
///
/// `created_at` never changes; `active` and `last_seen` are the only
/// mutable fields. There is no deleted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedProfile {
    /// Owning user id.
    pub user_id: String,
    /// Identity KEM public key.
    pub kem_public: Vec<u8>,
    /// Identity X25519 public key.
    pub ecdh_public: [u8; 32],
    /// Identity Ed25519 verifying key.
    pub signature_public: [u8; 32],
    /// Profile payload sealed by the conversation layer; empty at creation.
    pub encrypted_payload: Vec<u8>,
    /// Hex of the master key's BLAKE3 digest.
    pub recovery_digest_hex: String,
    /// Creation time, unix seconds.
    pub created_at: u64,
    /// Last activity time, unix seconds.
    pub last_seen: u64,
    /// Whether the profile is currently active.
    pub active: bool,
}

/// Mints a profile for `user_id` bound to `identity`.
///
/// `now` is the current unix time supplied by the caller.
pub fn create_profile(
    user_id: &str,
    identity: &IdentityKeyTriple,
    now: u64,
) -> Result<(EncryptedProfile, ProfileMasterKey), CryptoError> {
    let master_key: [u8; 32] = random_array()?;
    let recovery_digest = hash(&master_key);
    let shares = shamir::split(&master_key, RECOVERY_SHARES, RECOVERY_THRESHOLD)?;

    let master = ProfileMasterKey {
        key: master_key,
        created_at: now,
        recovery_digest,
        shares,
    };

    let profile = EncryptedProfile {
        user_id: user_id.to_string(),
        kem_public: identity.kem_public.to_vec(),
        ecdh_public: identity.ecdh_public,
        signature_public: identity.signature_public,
        encrypted_payload: Vec::new(),
        recovery_digest_hex: hex::encode(recovery_digest),
        created_at: now,
        last_seen: now,
        active: true,
    };

    Ok((profile, master))
}

/// Deactivates a profile. Idempotent.
pub fn deactivate(profile: &mut EncryptedProfile) {
    profile.active = false;
}

/// Reactivates a profile and bumps `last_seen`. Idempotent.
pub fn reactivate(profile: &mut EncryptedProfile, now: u64) {
    profile.active = true;
    profile.last_seen = now;
}

/// Updates the activity timestamp.
pub fn touch(profile: &mut EncryptedProfile, now: u64) {
    profile.last_seen = now;
}

/// Profiles are permanent; this always fails.
pub fn delete_profile(_user_id: &str) -> Result<(), CryptoError> {
    Err(CryptoError::DeletionForbidden)
}

/// Rebuilds the master key from recovery shares.
///
/// The recovered key is checked against `expected_digest`; shares that do
/// not reproduce it are rejected as an invalid set.
pub fn recover_master_key(
    shares: &[SecretShare],
    expected_digest: &[u8; 32],
    now: u64,
) -> Result<ProfileMasterKey, CryptoError> {
    let key = Zeroizing::new(shamir::recover(shares, RECOVERY_THRESHOLD)?);

    let digest = hash(&key[..]);
    if !ct_eq(&digest, expected_digest) {
        return Err(CryptoError::InvalidShareSet);
    }

    Ok(ProfileMasterKey {
        key: *key,
        created_at: now,
        recovery_digest: digest,
        shares: shares.to_vec(),
    })
}
