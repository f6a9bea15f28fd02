//! BLAKE3 hashing and constant-time comparison.

use subtle::ConstantTimeEq;

/// Computes the 256-bit BLAKE3 hash of `data`.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compares two byte sequences in constant time.
///
/// Sequences of different lengths compare unequal; the length check itself
/// is not secret.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let h1 = hash(b"liberty");
        let h2 = hash(b"liberty");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_differs_on_input() {
        assert_ne!(hash(b"liberty"), hash(b"reach"));
    }

    #[test]
    fn test_ct_eq() {
        assert!(ct_eq(b"hello", b"hello"));
        assert!(!ct_eq(b"hello", b"world"));
        assert!(!ct_eq(b"hello", b"hell"));
        assert!(ct_eq(b"", b""));
    }
}
