//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the core maps its failure to exactly one of
//! these kinds. Errors are returned as values; the core never panics on bad
//! external data, never logs, and never aborts the process.

use thiserror::Error;

/// Errors surfaced at the API boundary of the cryptographic core.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A primitive returned failure (RNG exhaustion, library fault).
    #[error("Internal crypto failure: {0}")]
    InternalCrypto(String),

    /// Signature on a pre-key bundle did not verify.
    #[error("Pre-key bundle signature verification failed")]
    BundleUnauthentic,

    /// An ECDH produced an all-zero shared secret.
    #[error("Key exchange produced a weak shared secret")]
    WeakKeyExchange,

    /// AEAD tag mismatch. Session state is left unchanged.
    #[error("Message authentication failed")]
    Unauthentic,

    /// The 96-bit nonce counter would overflow under the current AEAD key.
    #[error("Nonce counter exhausted; ratchet or tear down the session")]
    NonceExhausted,

    /// Steganography message exceeds carrier capacity.
    #[error("Message too large for carrier: capacity {capacity} bytes, got {got}")]
    MessageTooLarge {
        /// Carrier capacity in bytes.
        capacity: usize,
        /// Size of the message that was offered.
        got: usize,
    },

    /// Steganography payload is inconsistent with the carrier (truncated or
    /// corrupted data).
    #[error("Corrupt or truncated payload")]
    CorruptPayload,

    /// Shamir parameters out of range (threshold below 2 or above share count).
    #[error("Bad sharing parameters: n={n}, t={t}")]
    BadParameters {
        /// Requested number of shares.
        n: usize,
        /// Requested threshold.
        t: usize,
    },

    /// Share set contains duplicate or zero ids.
    #[error("Invalid share set")]
    InvalidShareSet,

    /// Fewer shares than the recovery threshold.
    #[error("Below recovery threshold: need {need} shares, got {got}")]
    BelowThreshold {
        /// The threshold required for recovery.
        need: usize,
        /// Number of usable shares supplied.
        got: usize,
    },

    /// Profile deletion is not supported; profiles are permanent.
    #[error("Profile deletion is forbidden; deactivate instead")]
    DeletionForbidden,

    /// Operation attempted on a closed session.
    #[error("Session is closed")]
    SessionClosed,
}
