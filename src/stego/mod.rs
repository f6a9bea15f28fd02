//! LSB steganography over raster image carriers.
//!
//! The codec hides a length-prefixed payload in the least significant bits
//! of interleaved RGB channel bytes. It offers capacity, not secrecy:
//! callers who need confidentiality seal the message first. A lossy
//! re-encode of the carrier (JPEG) destroys the payload.

pub mod image;
pub mod lsb;

pub use self::image::ImageCarrier;
pub use lsb::{capacity, decode, encode};
