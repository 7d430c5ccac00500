//! RGBA rasters and boolean masks.
//!
//! [`Raster`] is the canonical piece representation: a rectangular 8-bit
//! RGBA buffer whose alpha channel defines the true shape of the piece.

use crate::error::PuzzleError;

/// One 8-bit RGBA pixel.
pub type Rgba = [u8; 4];

/// Fully transparent black.
pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// A row-major RGBA image.
///
/// # Example
///
/// ```
/// use tessera::Raster;
///
/// let mut raster = Raster::new(3, 2);
/// raster.put(1, 1, [255, 0, 0, 255]);
/// assert_eq!(raster.opaque_count(), 1);
/// assert_eq!(raster.to_rgba8().len(), 3 * 2 * 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Raster {
    /// A fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    /// A raster where every pixel is `color`.
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Build a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgba) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap packed `[R, G, B, A, ...]` bytes.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, PuzzleError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(PuzzleError::InputInvalid(format!(
                "{}x{} RGBA raster needs {} bytes, got {}",
                width,
                height,
                expected,
                bytes.len()
            )));
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| [p[0], p[1], p[2], p[3]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Rgba {
        self.pixels[self.index(x, y)]
    }

    #[inline]
    pub fn put(&mut self, x: u32, y: u32, pixel: Rgba) {
        let idx = self.index(x, y);
        self.pixels[idx] = pixel;
    }

    /// Alpha at `(x, y)`, or 0 outside the raster.
    #[inline]
    pub fn alpha_at(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0;
        }
        self.get(x as u32, y as u32)[3]
    }

    /// Pixels with non-zero alpha.
    pub fn opaque_count(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] > 0).count()
    }

    /// Packed `[R, G, B, A, ...]` bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.iter().copied()).collect()
    }

    /// Porter-Duff "over" of a single pixel onto this raster.
    pub fn blend_over(&mut self, x: u32, y: u32, src: Rgba) {
        let sa = src[3] as u32;
        if sa == 0 {
            return;
        }
        let idx = self.index(x, y);
        if sa == 255 {
            self.pixels[idx] = src;
            return;
        }
        let dst = self.pixels[idx];
        let da = dst[3] as u32;
        // out_a = sa + da * (1 - sa), scaled by 255
        let da_scaled = da * (255 - sa) / 255;
        let out_a = sa + da_scaled;
        let mut out = [0u8; 4];
        for c in 0..3 {
            let value = (src[c] as u32 * sa + dst[c] as u32 * da_scaled) / out_a;
            out[c] = value.min(255) as u8;
        }
        out[3] = out_a.min(255) as u8;
        self.pixels[idx] = out;
    }

    /// Alpha-composite `src` with its top-left corner at `(dx, dy)`.
    ///
    /// Parts of `src` falling outside this raster are clipped.
    pub fn composite_over(&mut self, src: &Raster, dx: i64, dy: i64) {
        for sy in 0..src.height {
            let ty = dy + sy as i64;
            if ty < 0 || ty >= self.height as i64 {
                continue;
            }
            for sx in 0..src.width {
                let tx = dx + sx as i64;
                if tx < 0 || tx >= self.width as i64 {
                    continue;
                }
                self.blend_over(tx as u32, ty as u32, src.get(sx, sy));
            }
        }
    }

    /// Copy a `w`×`h` block from `src` at `(sx, sy)` to `(dx, dy)`, replacing
    /// pixels (no blending). Out-of-range parts are skipped.
    #[allow(clippy::too_many_arguments)]
    pub fn copy_from(&mut self, src: &Raster, sx: i64, sy: i64, w: u32, h: u32, dx: i64, dy: i64) {
        for row in 0..h as i64 {
            let (from_y, to_y) = (sy + row, dy + row);
            if from_y < 0 || from_y >= src.height as i64 || to_y < 0 || to_y >= self.height as i64 {
                continue;
            }
            for col in 0..w as i64 {
                let (from_x, to_x) = (sx + col, dx + col);
                if from_x < 0
                    || from_x >= src.width as i64
                    || to_x < 0
                    || to_x >= self.width as i64
                {
                    continue;
                }
                let pixel = src.get(from_x as u32, from_y as u32);
                self.put(to_x as u32, to_y as u32, pixel);
            }
        }
    }

    /// A new raster holding the `w`×`h` block at `(x, y)`.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Raster {
        let mut out = Raster::new(w, h);
        out.copy_from(self, x as i64, y as i64, w, h, 0, 0);
        out
    }

    /// Keep color where `mask` is set (alpha forced to 255), transparent
    /// black elsewhere. `mask` must have the raster's dimensions.
    pub fn apply_mask(&mut self, mask: &Mask) {
        debug_assert_eq!((mask.width(), mask.height()), (self.width, self.height));
        for (pixel, &inside) in self.pixels.iter_mut().zip(mask.bits()) {
            if inside {
                pixel[3] = 255;
            } else {
                *pixel = TRANSPARENT;
            }
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        y as usize * self.width as usize + x as usize
    }
}

/// A row-major boolean mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// An all-false mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = y as usize * self.width as usize + x as usize;
        self.bits[idx] = value;
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}
