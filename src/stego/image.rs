//! Carrier adapter for `image` crate rasters.
//!
//! Wraps a [`DynamicImage`] and runs the raw codec over its RGB bytes.
//! Alpha channels are stripped from the carrier; only lossless output
//! formats (PNG, BMP) preserve the payload.

use image::{DynamicImage, GenericImageView, RgbImage};

use crate::error::CryptoError;
use crate::stego::lsb;

/// A raster image used as a steganographic carrier.
pub struct ImageCarrier {
    image: DynamicImage,
}

impl ImageCarrier {
    /// Wraps an in-memory image.
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Decodes an image from encoded bytes (PNG, BMP, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let image =
            image::load_from_memory(bytes).map_err(|_| CryptoError::CorruptPayload)?;
        Ok(Self { image })
    }

    /// Capacity of this carrier in bytes.
    pub fn capacity(&self) -> usize {
        let (width, height) = self.image.dimensions();
        lsb::capacity(width as usize, height as usize)
    }

    /// Hides `data` in the carrier, returning the stego image.
    pub fn hide(&self, data: &[u8]) -> Result<DynamicImage, CryptoError> {
        let (width, height) = self.image.dimensions();
        let rgb = self.image.to_rgb8();

        let stego = lsb::encode(data, rgb.as_raw(), width as usize, height as usize)?;

        let buffer = RgbImage::from_raw(width, height, stego)
            .ok_or(CryptoError::CorruptPayload)?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }

    /// Extracts hidden data from the carrier.
    pub fn extract(&self) -> Result<Vec<u8>, CryptoError> {
        let (width, height) = self.image.dimensions();
        let rgb = self.image.to_rgb8();

        lsb::decode(rgb.as_raw(), width as usize, height as usize)
    }

    /// The wrapped image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};

    fn test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 17) % 256) as u8,
                ((y * 23) % 256) as u8,
                (((x + y) * 31) % 256) as u8,
            ])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_capacity_matches_raw_codec() {
        let carrier = ImageCarrier::from_image(test_image(100, 100));
        assert_eq!(carrier.capacity(), 3746);
    }

    #[test]
    fn test_hide_and_extract() {
        let carrier = ImageCarrier::from_image(test_image(64, 64));
        let data = b"carrier pigeons are obsolete";

        let stego = carrier.hide(data).unwrap();
        let extracted = ImageCarrier::from_image(stego).extract().unwrap();

        assert_eq!(extracted, data);
    }

    #[test]
    fn test_alpha_channel_is_stripped() {
        let img = ImageBuffer::from_fn(32, 32, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 128])
        });
        let carrier = ImageCarrier::from_image(DynamicImage::ImageRgba8(img));

        let stego = carrier.hide(b"no alpha here").unwrap();
        let extracted = ImageCarrier::from_image(stego).extract().unwrap();

        assert_eq!(extracted, b"no alpha here");
    }

    #[test]
    fn test_over_capacity_rejected() {
        let carrier = ImageCarrier::from_image(test_image(4, 4));
        let data = vec![0u8; 100];

        assert!(matches!(
            carrier.hide(&data),
            Err(CryptoError::MessageTooLarge { .. })
        ));
    }
}
