//! Durable identities and signed pre-key bundles.
//!
//! Every user holds one [`IdentityKeyTriple`] for the lifetime of the
//! account: a Kyber768 keypair for the post-quantum handshake leg, an
//! X25519 keypair for the classical legs, and an Ed25519 keypair that
//! signs pre-key bundles. The triple is created exactly once and never
//! rotated.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::primitives::{
    hash, kem_keygen, sign, verify, KEM_PUBLIC_LEN, KEM_SECRET_LEN, SIGNATURE_LEN,
};

/// Serialized pre-key bundle length:
/// `u32 prekey_id + kem_public + ecdh_public + signature`.
pub const PREKEY_BUNDLE_LEN: usize = 4 + KEM_PUBLIC_LEN + 32 + SIGNATURE_LEN;

/// The three long-term keypairs of a local identity.
///
/// All secrets are zeroized when the triple is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct IdentityKeyTriple {
    /// Kyber768 public key (1184 bytes).
    pub kem_public: [u8; KEM_PUBLIC_LEN],
    pub(crate) kem_secret: [u8; KEM_SECRET_LEN],
    /// X25519 public key.
    pub ecdh_public: [u8; 32],
    pub(crate) ecdh_secret: [u8; 32],
    /// Ed25519 verifying key.
    pub signature_public: [u8; 32],
    pub(crate) signature_secret: [u8; 64],
}

impl IdentityKeyTriple {
    /// Generates a fresh identity.
    ///
    /// All three keypairs are generated independently; if any primitive
    /// fails, no partial triple is returned.
    pub fn generate() -> Result<Self, CryptoError> {
        let (kem_public, kem_secret) = kem_keygen()?;

        let ecdh_secret = StaticSecret::random_from_rng(OsRng);
        let ecdh_public = PublicKey::from(&ecdh_secret);

        let signing_key = SigningKey::generate(&mut OsRng);
        let signature_public = signing_key.verifying_key().to_bytes();

        Ok(Self {
            kem_public,
            kem_secret,
            ecdh_public: ecdh_public.to_bytes(),
            ecdh_secret: ecdh_secret.to_bytes(),
            signature_public,
            signature_secret: signing_key.to_keypair_bytes(),
        })
    }

    /// Signs `data` with the identity signing key.
    pub fn sign(&self, data: &[u8]) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
        sign(&self.signature_secret, data)
    }

    /// Returns the public half of the triple, as a peer would see it.
    pub fn public_keys(&self) -> RemoteIdentity {
        RemoteIdentity {
            kem_public: self.kem_public,
            ecdh_public: self.ecdh_public,
            signature_public: self.signature_public,
        }
    }

    /// Hex fingerprint of the identity: BLAKE3 over the three publics.
    pub fn fingerprint(&self) -> String {
        self.public_keys().fingerprint()
    }
}

/// The public keys of a peer identity. Freely copyable.
#[derive(Clone)]
pub struct RemoteIdentity {
    /// Kyber768 public key.
    pub kem_public: [u8; KEM_PUBLIC_LEN],
    /// X25519 public key.
    pub ecdh_public: [u8; 32],
    /// Ed25519 verifying key.
    pub signature_public: [u8; 32],
}

impl RemoteIdentity {
    /// Hex fingerprint: BLAKE3 over `kem_public || ecdh_public || signature_public`.
    pub fn fingerprint(&self) -> String {
        let mut data = Vec::with_capacity(KEM_PUBLIC_LEN + 64);
        data.extend_from_slice(&self.kem_public);
        data.extend_from_slice(&self.ecdh_public);
        data.extend_from_slice(&self.signature_public);
        hex::encode(hash(&data))
    }
}

/// A per-session ephemeral X25519 keypair.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EphemeralKeys {
    /// X25519 public key, sent to the peer with the first message.
    pub public: [u8; 32],
    pub(crate) secret: [u8; 32],
}

impl EphemeralKeys {
    /// Generates a fresh ephemeral keypair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self {
            public: public.to_bytes(),
            secret: secret.to_bytes(),
        }
    }
}

/// An optional one-time X25519 keypair, consumed by at most one handshake.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct OneTimeKey {
    /// Identifier the initiator echoes back so the responder can look the
    /// key up.
    pub id: u32,
    /// X25519 public key.
    pub public: [u8; 32],
    secret: Option<[u8; 32]>,
}

impl OneTimeKey {
    /// Generates a one-time keypair under the given id.
    pub fn generate(id: u32) -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self {
            id,
            public: public.to_bytes(),
            secret: Some(secret.to_bytes()),
        }
    }

    /// Takes the secret out, erasing the stored copy.
    ///
    /// Returns `None` if the key was already consumed.
    pub fn take_secret(&mut self) -> Option<[u8; 32]> {
        self.secret.take()
    }

    /// Whether the secret is still available.
    pub fn is_unused(&self) -> bool {
        self.secret.is_some()
    }
}

/// A signed pre-key advertisement a peer publishes so strangers can
/// initiate sessions asynchronously.
#[derive(Clone)]
pub struct PreKeyBundle {
    /// Bundle identifier, chosen by the publisher.
    pub prekey_id: u32,
    /// Publisher's Kyber768 public key.
    pub kem_public: [u8; KEM_PUBLIC_LEN],
    /// Publisher's X25519 public key.
    pub ecdh_public: [u8; 32],
    /// Ed25519 signature over `kem_public || ecdh_public`.
    pub signature: [u8; SIGNATURE_LEN],
}

impl PreKeyBundle {
    /// Serializes to the stable wire layout:
    /// `u32 LE prekey_id || kem_public || ecdh_public || signature`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(PREKEY_BUNDLE_LEN);
        bytes.extend_from_slice(&self.prekey_id.to_le_bytes());
        bytes.extend_from_slice(&self.kem_public);
        bytes.extend_from_slice(&self.ecdh_public);
        bytes.extend_from_slice(&self.signature);
        bytes
    }

    /// Deserializes from the wire layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PREKEY_BUNDLE_LEN {
            return Err(CryptoError::CorruptPayload);
        }

        let prekey_id = u32::from_le_bytes(bytes[0..4].try_into().unwrap());

        let mut kem_public = [0u8; KEM_PUBLIC_LEN];
        kem_public.copy_from_slice(&bytes[4..4 + KEM_PUBLIC_LEN]);

        let mut ecdh_public = [0u8; 32];
        ecdh_public.copy_from_slice(&bytes[4 + KEM_PUBLIC_LEN..4 + KEM_PUBLIC_LEN + 32]);

        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&bytes[4 + KEM_PUBLIC_LEN + 32..]);

        Ok(Self {
            prekey_id,
            kem_public,
            ecdh_public,
            signature,
        })
    }

    /// The byte sequence the publisher signed.
    fn signed_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(KEM_PUBLIC_LEN + 32);
        data.extend_from_slice(&self.kem_public);
        data.extend_from_slice(&self.ecdh_public);
        data
    }
}

/// Produces a signed pre-key bundle for the given identity.
pub fn publish_prekey(
    identity: &IdentityKeyTriple,
    prekey_id: u32,
) -> Result<PreKeyBundle, CryptoError> {
    let mut data = Vec::with_capacity(KEM_PUBLIC_LEN + 32);
    data.extend_from_slice(&identity.kem_public);
    data.extend_from_slice(&identity.ecdh_public);

    let signature = identity.sign(&data)?;

    Ok(PreKeyBundle {
        prekey_id,
        kem_public: identity.kem_public,
        ecdh_public: identity.ecdh_public,
        signature,
    })
}

/// Verifies the signature on a pre-key bundle against the publisher's
/// identity verifying key.
///
/// Callers MUST verify a bundle before feeding it into the handshake;
/// accepting an unverified bundle is a protocol violation.
pub fn verify_prekey(bundle: &PreKeyBundle, signature_public: &[u8; 32]) -> bool {
    verify(signature_public, &bundle.signed_data(), &bundle.signature)
}

/// Like [`verify_prekey`], but surfaces the failure as an error so a bad
/// bundle can be propagated with `?` and discarded.
pub fn check_prekey(
    bundle: &PreKeyBundle,
    signature_public: &[u8; 32],
) -> Result<(), CryptoError> {
    if verify_prekey(bundle, signature_public) {
        Ok(())
    } else {
        Err(CryptoError::BundleUnauthentic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_identity() {
        let a = IdentityKeyTriple::generate().unwrap();
        let b = IdentityKeyTriple::generate().unwrap();

        assert_ne!(a.ecdh_public, b.ecdh_public);
        assert_ne!(a.signature_public, b.signature_public);
        assert_ne!(a.kem_public[..32], b.kem_public[..32]);
    }

    #[test]
    fn test_publish_and_verify_prekey() {
        let identity = IdentityKeyTriple::generate().unwrap();
        let bundle = publish_prekey(&identity, 1).unwrap();

        assert_eq!(bundle.prekey_id, 1);
        assert!(verify_prekey(&bundle, &identity.signature_public));
    }

    #[test]
    fn test_verify_rejects_wrong_identity() {
        let identity = IdentityKeyTriple::generate().unwrap();
        let other = IdentityKeyTriple::generate().unwrap();
        let bundle = publish_prekey(&identity, 1).unwrap();

        assert!(!verify_prekey(&bundle, &other.signature_public));
    }

    #[test]
    fn test_check_prekey_error_kind() {
        let identity = IdentityKeyTriple::generate().unwrap();
        let other = IdentityKeyTriple::generate().unwrap();
        let bundle = publish_prekey(&identity, 1).unwrap();

        assert!(check_prekey(&bundle, &identity.signature_public).is_ok());
        assert!(matches!(
            check_prekey(&bundle, &other.signature_public),
            Err(CryptoError::BundleUnauthentic)
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_bundle() {
        let identity = IdentityKeyTriple::generate().unwrap();
        let mut bundle = publish_prekey(&identity, 1).unwrap();

        bundle.ecdh_public[0] ^= 0x01;
        assert!(!verify_prekey(&bundle, &identity.signature_public));
    }

    #[test]
    fn test_bundle_wire_roundtrip() {
        let identity = IdentityKeyTriple::generate().unwrap();
        let bundle = publish_prekey(&identity, 42).unwrap();

        let bytes = bundle.to_bytes();
        assert_eq!(bytes.len(), PREKEY_BUNDLE_LEN);
        assert_eq!(&bytes[0..4], &42u32.to_le_bytes());

        let decoded = PreKeyBundle::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.prekey_id, 42);
        assert_eq!(decoded.kem_public, bundle.kem_public);
        assert_eq!(decoded.ecdh_public, bundle.ecdh_public);
        assert_eq!(decoded.signature, bundle.signature);
        assert!(verify_prekey(&decoded, &identity.signature_public));
    }

    #[test]
    fn test_bundle_wrong_length_rejected() {
        let result = PreKeyBundle::from_bytes(&[0u8; 100]);
        assert!(matches!(result, Err(CryptoError::CorruptPayload)));
    }

    #[test]
    fn test_one_time_key_consumed_once() {
        let mut otk = OneTimeKey::generate(7);
        assert!(otk.is_unused());

        let secret = otk.take_secret();
        assert!(secret.is_some());
        assert!(!otk.is_unused());
        assert!(otk.take_secret().is_none());
    }

    #[test]
    fn test_fingerprint_stable_and_distinct() {
        let identity = IdentityKeyTriple::generate().unwrap();
        let other = IdentityKeyTriple::generate().unwrap();

        assert_eq!(identity.fingerprint(), identity.public_keys().fingerprint());
        assert_eq!(identity.fingerprint().len(), 64);
        assert_ne!(identity.fingerprint(), other.fingerprint());
    }
}
