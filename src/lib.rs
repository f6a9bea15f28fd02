//! # Liberty Reach Crypto
//!
//! The cryptographic core of the Liberty Reach messenger: end-to-end
//! confidentiality, authenticity, forward secrecy, post-compromise
//! recovery, and post-quantum resistance for two-party conversations.
//!
//! ## Overview
//!
//! A peer publishes a signed [`identity::PreKeyBundle`]. A stranger runs
//! the hybrid handshake against it (one Kyber768 encapsulation combined
//! with two X25519 exchanges) and both sides end up with mirrored
//! [`session::SessionState`]s. From then on traffic is exclusively
//! [`session::SessionState::seal`] and [`session::SessionState::open`]
//! under a ratcheted key schedule; either side may rotate its ratchet key
//! to re-key both chains.
//!
//! Three independent capabilities ride on the same primitive layer:
//! steganographic embedding of byte payloads into raster images, Shamir
//! threshold sharing of 32-byte secrets, and the permanent profile
//! lifecycle with share-based master-key recovery.
//!
//! The core is purely value-oriented: no I/O, no logging, no global state,
//! no threads. Callers own each session exclusively and move bytes between
//! endpoints themselves.
//!
//! ## Modules
//!
//! - [`primitives`]: RNG, hash, KDF, ECDH, KEM, signatures, AEAD
//! - [`identity`]: identity key triples and signed pre-key bundles
//! - [`handshake`]: hybrid post-quantum X3DH
//! - [`session`]: ratcheted sealing/opening and the session manager
//! - [`stego`]: LSB steganography over RGB carriers
//! - [`shamir`]: threshold secret sharing over GF(2^8)
//! - [`profile`]: permanent profile lifecycle
//!
//! ## Example
//!
//! ```rust
//! use liberty_reach_crypto::identity::{self, EphemeralKeys, IdentityKeyTriple};
//! use liberty_reach_crypto::handshake;
//!
//! // Bob publishes a bundle; Alice verifies it and initiates.
//! let alice = IdentityKeyTriple::generate().unwrap();
//! let bob = IdentityKeyTriple::generate().unwrap();
//! let bundle = identity::publish_prekey(&bob, 1).unwrap();
//! assert!(identity::verify_prekey(&bundle, &bob.signature_public));
//!
//! let ephemeral = EphemeralKeys::generate();
//! let (mut alice_session, kem_ciphertext) =
//!     handshake::initiate(&alice, &ephemeral, &bundle).unwrap();
//! let mut bob_session =
//!     handshake::respond(&bob, &alice.ecdh_public, &ephemeral.public, &kem_ciphertext).unwrap();
//!
//! let (header, ciphertext) = alice_session.seal(b"", b"hello").unwrap();
//! assert_eq!(bob_session.open(&header, b"", &ciphertext).unwrap(), b"hello");
//! ```

pub mod error;
pub mod handshake;
pub mod identity;
pub mod primitives;
pub mod profile;
pub mod session;
pub mod shamir;
pub mod stego;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol version string, mixed into the handshake derivation.
/// Changing it is a wire break.
pub const PROTOCOL_VERSION: &str = "LibertyReach-v1";

// Re-export commonly used types at the crate root.
pub use error::CryptoError;
pub use identity::{EphemeralKeys, IdentityKeyTriple, OneTimeKey, PreKeyBundle, RemoteIdentity};
pub use profile::{EncryptedProfile, ProfileMasterKey};
pub use session::{
    ConversationId, RatchetHeader, SessionManager, SessionState, SessionStatus,
};
pub use shamir::SecretShare;
pub use stego::ImageCarrier;
