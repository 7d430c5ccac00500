//! sRGB color type
//!
//! sRGB is the encoding of every piece raster and source image.

use crate::raster::Rgba;

/// An 8-bit color in sRGB color space.
///
/// Alpha is not part of the color; piece shape lives in the raster's alpha
/// channel and is handled by the callers that sample colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Srgb {
    /// Red channel (gamma-encoded)
    pub r: u8,
    /// Green channel (gamma-encoded)
    pub g: u8,
    /// Blue channel (gamma-encoded)
    pub b: u8,
}

impl Srgb {
    /// Create an Srgb color from 8-bit channel values.
    ///
    /// # Example
    /// ```
    /// use tessera::Srgb;
    /// let red = Srgb::from_u8(255, 0, 0);
    /// assert_eq!(red.r, 255);
    /// ```
    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Take the color channels of an RGBA pixel, dropping alpha.
    #[inline]
    pub fn from_rgba(pixel: Rgba) -> Self {
        Self::from_u8(pixel[0], pixel[1], pixel[2])
    }

    /// Convert to a byte array [R, G, B].
    #[inline]
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}
