//! Cryptographically secure randomness.
//!
//! All entropy in the core flows through these two functions. They fail
//! closed: if the OS source cannot deliver, the caller gets an error, never
//! a partially filled or zeroed buffer.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;

/// Fills a fixed-size array with random bytes from the OS source.
pub fn random_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::InternalCrypto(e.to_string()))?;
    Ok(bytes)
}

/// Returns `len` random bytes from the OS source.
pub fn random_vec(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::InternalCrypto(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_arrays_differ() {
        let a = random_array::<32>().unwrap();
        let b = random_array::<32>().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_vec_length() {
        let v = random_vec(100).unwrap();
        assert_eq!(v.len(), 100);
    }

    #[test]
    fn test_random_vec_empty() {
        let v = random_vec(0).unwrap();
        assert!(v.is_empty());
    }
}
