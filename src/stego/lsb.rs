//! The raw LSB codec.
//!
//! Carrier format: `width * height` pixels, three interleaved bytes per
//! pixel in R, G, B order (any alpha channel is stripped before calling).
//! The payload is `u32 LE length || message`, written bit by bit MSB-first
//! into the channel LSBs in row-major order. Channels past the payload are
//! left untouched.

use crate::error::CryptoError;

/// Bytes reserved for the length prefix.
const LENGTH_PREFIX_LEN: usize = 4;

/// Maximum message size for a `width x height` RGB carrier, in bytes.
///
/// One bit per channel, three channels per pixel, minus the four-byte
/// length prefix.
pub fn capacity(width: usize, height: usize) -> usize {
    (width * height * 3 / 8).saturating_sub(LENGTH_PREFIX_LEN)
}

/// Embeds `message` into a copy of `cover`.
pub fn encode(
    message: &[u8],
    cover: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<u8>, CryptoError> {
    if cover.len() != width * height * 3 {
        return Err(CryptoError::CorruptPayload);
    }

    let capacity = capacity(width, height);
    if message.len() > capacity || cover.len() < LENGTH_PREFIX_LEN * 8 {
        return Err(CryptoError::MessageTooLarge {
            capacity,
            got: message.len(),
        });
    }

    let mut payload = Vec::with_capacity(LENGTH_PREFIX_LEN + message.len());
    payload.extend_from_slice(&(message.len() as u32).to_le_bytes());
    payload.extend_from_slice(message);

    let mut stego = cover.to_vec();
    let total_bits = payload.len() * 8;

    // The carrier is a flat interleaved buffer, so channel i carries
    // payload bit i.
    for (bit_index, channel) in stego.iter_mut().take(total_bits).enumerate() {
        let bit = (payload[bit_index / 8] >> (7 - bit_index % 8)) & 1;
        *channel = (*channel & 0xFE) | bit;
    }

    Ok(stego)
}

/// Extracts a message previously embedded with [`encode`].
pub fn decode(stego: &[u8], width: usize, height: usize) -> Result<Vec<u8>, CryptoError> {
    if stego.len() != width * height * 3 || stego.len() < LENGTH_PREFIX_LEN * 8 {
        return Err(CryptoError::CorruptPayload);
    }

    let mut len_bytes = [0u8; LENGTH_PREFIX_LEN];
    for bit_index in 0..LENGTH_PREFIX_LEN * 8 {
        let bit = stego[bit_index] & 1;
        len_bytes[bit_index / 8] |= bit << (7 - bit_index % 8);
    }

    let message_len = u32::from_le_bytes(len_bytes) as usize;
    if message_len > capacity(width, height) {
        return Err(CryptoError::CorruptPayload);
    }

    let mut message = vec![0u8; message_len];
    for bit_index in 0..message_len * 8 {
        let bit = stego[LENGTH_PREFIX_LEN * 8 + bit_index] & 1;
        message[bit_index / 8] |= bit << (7 - bit_index % 8);
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-noise cover.
    fn test_cover(width: usize, height: usize) -> Vec<u8> {
        (0..width * height * 3)
            .map(|i| (i.wrapping_mul(31).wrapping_add(17) % 256) as u8)
            .collect()
    }

    #[test]
    fn test_capacity_formula() {
        assert_eq!(capacity(4, 4), 2);
        assert_eq!(capacity(100, 100), 3746);
        assert_eq!(capacity(1920, 1080), 777_596);
        assert_eq!(capacity(1, 1), 0);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let cover = test_cover(32, 32);
        let message = b"meet at the harbor at dawn";

        let stego = encode(message, &cover, 32, 32).unwrap();
        let decoded = decode(&stego, 32, 32).unwrap();

        assert_eq!(decoded, message);
    }

    #[test]
    fn test_encode_changes_only_lsbs() {
        let cover = test_cover(16, 16);
        let message = b"subtle";

        let stego = encode(message, &cover, 16, 16).unwrap();

        assert_eq!(stego.len(), cover.len());
        for (original, modified) in cover.iter().zip(&stego) {
            assert_eq!(original & 0xFE, modified & 0xFE);
        }
    }

    #[test]
    fn test_channels_past_payload_untouched() {
        let cover = test_cover(32, 32);
        let message = b"ok";

        let stego = encode(message, &cover, 32, 32).unwrap();
        let used_bits = (LENGTH_PREFIX_LEN + message.len()) * 8;

        assert_eq!(&stego[used_bits..], &cover[used_bits..]);
    }

    #[test]
    fn test_exact_capacity_fits() {
        let cover = test_cover(4, 4);
        let message = [0xAB, 0xCD];

        let stego = encode(&message, &cover, 4, 4).unwrap();
        assert_eq!(decode(&stego, 4, 4).unwrap(), message);
    }

    #[test]
    fn test_over_capacity_rejected() {
        let cover = test_cover(4, 4);
        let message = [0xAB, 0xCD, 0xEF];

        let result = encode(&message, &cover, 4, 4);
        assert!(matches!(
            result,
            Err(CryptoError::MessageTooLarge { capacity: 2, got: 3 })
        ));
    }

    #[test]
    fn test_empty_message() {
        let cover = test_cover(8, 8);

        let stego = encode(&[], &cover, 8, 8).unwrap();
        assert!(decode(&stego, 8, 8).unwrap().is_empty());
    }

    #[test]
    fn test_decode_garbage_length_rejected() {
        // All-ones LSBs decode to a length far beyond capacity.
        let stego = vec![0xFFu8; 8 * 8 * 3];

        let result = decode(&stego, 8, 8);
        assert!(matches!(result, Err(CryptoError::CorruptPayload)));
    }

    #[test]
    fn test_wrong_carrier_size_rejected() {
        let cover = test_cover(8, 8);

        assert!(matches!(
            encode(b"x", &cover, 9, 9),
            Err(CryptoError::CorruptPayload)
        ));
        assert!(matches!(
            decode(&cover, 9, 9),
            Err(CryptoError::CorruptPayload)
        ));
    }

    #[test]
    fn test_binary_message_roundtrip() {
        let cover = test_cover(64, 64);
        let message: Vec<u8> = (0..=255).collect();

        let stego = encode(&message, &cover, 64, 64).unwrap();
        assert_eq!(decode(&stego, 64, 64).unwrap(), message);
    }
}
