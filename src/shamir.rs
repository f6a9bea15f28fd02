//! Shamir threshold sharing over GF(2^8).
//!
//! A 32-byte secret is split into `n` shares so that any `t` of them
//! recover it and any `t - 1` reveal nothing. Each byte position gets its
//! own random polynomial of degree `t - 1` with the secret byte as the
//! constant term, evaluated at the non-zero points `1..=n`. Recovery is
//! Lagrange interpolation at zero.
//!
//! Field arithmetic uses the AES reduction polynomial
//! (x^8 + x^4 + x^3 + x + 1).

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::primitives::random_array;

/// Secret length handled by the scheme, in bytes.
pub const SECRET_LEN: usize = 32;

/// Serialized share length: `u8 id + 32 data bytes`.
pub const SHARE_LEN: usize = 1 + SECRET_LEN;

/// One share of a split secret.
///
/// `id` is the polynomial evaluation point; it is never zero and is unique
/// within a share set. The share data is zeroized on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretShare {
    /// Evaluation point, `1..=255`.
    pub id: u8,
    /// The 32 polynomial evaluations.
    pub data: [u8; SECRET_LEN],
}

impl SecretShare {
    /// Serializes to the stable wire layout: `u8 id || data`.
    pub fn to_bytes(&self) -> [u8; SHARE_LEN] {
        let mut bytes = [0u8; SHARE_LEN];
        bytes[0] = self.id;
        bytes[1..].copy_from_slice(&self.data);
        bytes
    }

    /// Deserializes from the wire layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SHARE_LEN {
            return Err(CryptoError::CorruptPayload);
        }
        if bytes[0] == 0 {
            return Err(CryptoError::InvalidShareSet);
        }

        let mut data = [0u8; SECRET_LEN];
        data.copy_from_slice(&bytes[1..]);

        Ok(Self { id: bytes[0], data })
    }
}

/// Splits `secret` into `n` shares with recovery threshold `t`.
pub fn split(
    secret: &[u8; SECRET_LEN],
    n: usize,
    t: usize,
) -> Result<Vec<SecretShare>, CryptoError> {
    if t < 2 || t > n || n > 255 {
        return Err(CryptoError::BadParameters { n, t });
    }

    // coefficients[0] is the secret; the rest are fresh randomness, one
    // independent polynomial per byte position.
    let mut coefficients: Vec<Zeroizing<[u8; SECRET_LEN]>> = Vec::with_capacity(t);
    coefficients.push(Zeroizing::new(*secret));
    for _ in 1..t {
        coefficients.push(Zeroizing::new(random_array()?));
    }

    let mut shares = Vec::with_capacity(n);
    for x in 1..=n as u8 {
        let mut data = [0u8; SECRET_LEN];
        for (position, byte) in data.iter_mut().enumerate() {
            *byte = evaluate(&coefficients, position, x);
        }
        shares.push(SecretShare { id: x, data });
    }

    Ok(shares)
}

/// Recovers the secret from at least `threshold` distinct shares.
pub fn recover(
    shares: &[SecretShare],
    threshold: usize,
) -> Result<[u8; SECRET_LEN], CryptoError> {
    validate_share_set(shares)?;
    if shares.len() < threshold {
        return Err(CryptoError::BelowThreshold {
            need: threshold,
            got: shares.len(),
        });
    }

    // Lagrange basis at x = 0 depends only on the ids, not the position.
    let mut basis = vec![0u8; shares.len()];
    for (i, share) in shares.iter().enumerate() {
        let mut value = 1u8;
        for (j, other) in shares.iter().enumerate() {
            if i != j {
                value = gf_mul(value, gf_div(other.id, other.id ^ share.id));
            }
        }
        basis[i] = value;
    }

    let mut secret = [0u8; SECRET_LEN];
    for (position, byte) in secret.iter_mut().enumerate() {
        for (i, share) in shares.iter().enumerate() {
            *byte ^= gf_mul(share.data[position], basis[i]);
        }
    }

    Ok(secret)
}

/// Re-splits the secret behind `shares` with fresh randomness.
///
/// The share count and threshold stay the same; ids are reassigned from 1.
pub fn refresh(
    shares: &[SecretShare],
    threshold: usize,
) -> Result<Vec<SecretShare>, CryptoError> {
    let secret = Zeroizing::new(recover(shares, threshold)?);
    split(&secret, shares.len(), threshold)
}

/// Rejects zero or duplicate ids.
fn validate_share_set(shares: &[SecretShare]) -> Result<(), CryptoError> {
    let mut seen = [false; 256];
    for share in shares {
        if share.id == 0 || seen[share.id as usize] {
            return Err(CryptoError::InvalidShareSet);
        }
        seen[share.id as usize] = true;
    }
    Ok(())
}

/// Evaluates the polynomial for `position` at `x` (Horner's rule).
fn evaluate(coefficients: &[Zeroizing<[u8; SECRET_LEN]>], position: usize, x: u8) -> u8 {
    let mut result = 0u8;
    for coefficient in coefficients.iter().rev() {
        result = gf_mul(result, x) ^ coefficient[position];
    }
    result
}

/// Carry-less multiplication with AES polynomial reduction.
fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= 0x1B;
        }
        b >>= 1;
    }
    product
}

/// Multiplicative inverse via a^254 (Fermat). `gf_inv(0)` is undefined and
/// never reached: divisors are ids, which are non-zero and distinct.
fn gf_inv(a: u8) -> u8 {
    let mut result = 1u8;
    let mut base = a;
    let mut exponent = 254u8;
    while exponent != 0 {
        if exponent & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exponent >>= 1;
    }
    result
}

fn gf_div(a: u8, b: u8) -> u8 {
    gf_mul(a, gf_inv(b))
}
