//! Thin, side-channel-aware wrappers over the vetted primitive crates.
//!
//! This module provides:
//! - Secure randomness (fail-closed)
//! - BLAKE3 hashing and constant-time comparison
//! - HKDF-SHA3 key derivation
//! - X25519 key agreement with contributory-behaviour check
//! - Kyber768 key encapsulation
//! - Ed25519 detached signatures
//! - AES-256-GCM authenticated encryption
//!
//! Higher layers assume these building blocks are constant-time where it
//! matters and never inspect key bytes themselves.

pub mod aead;
pub mod ecdh;
pub mod hash;
pub mod kdf;
pub mod kem;
pub mod random;
pub mod sign;

pub use aead::{aead_open, aead_seal, AEAD_TAG_LEN, NONCE_LEN};
pub use ecdh::ecdh;
pub use hash::{ct_eq, hash};
pub use kdf::{kdf_expand, kdf_expand_key};
pub use kem::{
    kem_decapsulate, kem_encapsulate, kem_keygen, KEM_CIPHERTEXT_LEN, KEM_PUBLIC_LEN,
    KEM_SECRET_LEN, KEM_SHARED_LEN,
};
pub use random::{random_array, random_vec};
pub use sign::{sign, verify, SIGNATURE_LEN, SIGNING_SECRET_LEN, VERIFYING_KEY_LEN};
