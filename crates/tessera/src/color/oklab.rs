//! Oklab perceptual color space
//!
//! Side signatures are compared in Oklab so that a squared distance means
//! roughly the same perceived mismatch anywhere in the gamut.
//!
//! # References
//!
//! Björn Ottosson, "A perceptual color space for image processing"
//! <https://bottosson.github.io/posts/oklab/>

use super::linear_rgb::LinearRgb;
use super::srgb::Srgb;

/// A color in Oklab perceptual color space.
///
/// # Components
///
/// - `l`: Lightness (0.0 = black, 1.0 = white)
/// - `a`: Green-red axis (negative = green, positive = red)
/// - `b`: Blue-yellow axis (negative = blue, positive = yellow)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Oklab {
    /// Lightness: 0.0 (black) to 1.0 (white)
    pub l: f32,
    /// Green-red axis: typically -0.5 to 0.5
    pub a: f32,
    /// Blue-yellow axis: typically -0.5 to 0.5
    pub b: f32,
}

impl Oklab {
    /// Create a new Oklab color.
    #[inline]
    pub fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }

    /// Squared Euclidean distance in Oklab space.
    ///
    /// # Example
    ///
    /// ```
    /// use tessera::Oklab;
    ///
    /// let white = Oklab::new(1.0, 0.0, 0.0);
    /// let black = Oklab::new(0.0, 0.0, 0.0);
    /// assert!((white.distance_squared(black) - 1.0).abs() < 1e-6);
    /// ```
    #[inline]
    pub fn distance_squared(self, other: Oklab) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }
}

impl From<LinearRgb> for Oklab {
    /// Convert from linear RGB to Oklab (2021-01-25 matrices).
    fn from(rgb: LinearRgb) -> Self {
        // Linear sRGB to LMS
        let l = 0.4122214708 * rgb.r + 0.5363325363 * rgb.g + 0.0514459929 * rgb.b;
        let m = 0.2119034982 * rgb.r + 0.6806995451 * rgb.g + 0.1073969566 * rgb.b;
        let s = 0.0883024619 * rgb.r + 0.2817188376 * rgb.g + 0.6299787005 * rgb.b;

        let l_ = l.cbrt();
        let m_ = m.cbrt();
        let s_ = s.cbrt();

        // LMS to Lab
        Oklab {
            l: 0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_,
            a: 1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_,
            b: 0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_,
        }
    }
}

impl From<Srgb> for Oklab {
    #[inline]
    fn from(srgb: Srgb) -> Self {
        Oklab::from(LinearRgb::from(srgb))
    }
}

/// Running mean of Oklab samples.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OklabMean {
    l: f64,
    a: f64,
    b: f64,
    count: u32,
}

impl OklabMean {
    pub(crate) fn push(&mut self, color: Oklab) {
        self.l += color.l as f64;
        self.a += color.a as f64;
        self.b += color.b as f64;
        self.count += 1;
    }

    /// `None` when nothing was pushed.
    pub(crate) fn mean(&self) -> Option<Oklab> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(Oklab::new(
            (self.l / n) as f32,
            (self.a / n) as f32,
            (self.b / n) as f32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tolerance for palette crate comparison (single matrix transform)
    const PALETTE_TOLERANCE: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_oklab_matches_palette_crate() {
        use palette::{IntoColor, LinSrgb, Oklab as PaletteOklab};

        let test_colors = [
            (1.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (0.5, 0.5, 0.5),
            (1.0, 1.0, 1.0),
            (0.0, 0.0, 0.0),
        ];

        for (r, g, b) in test_colors {
            let ours = Oklab::from(LinearRgb::new(r, g, b));
            let linear: LinSrgb<f32> = LinSrgb::new(r, g, b);
            let theirs: PaletteOklab<f32> = linear.into_color();

            assert!(
                approx_eq(ours.l, theirs.l, PALETTE_TOLERANCE),
                "L mismatch for ({r}, {g}, {b}): ours={}, palette={}",
                ours.l,
                theirs.l
            );
            assert!(
                approx_eq(ours.a, theirs.a, PALETTE_TOLERANCE),
                "a mismatch for ({r}, {g}, {b}): ours={}, palette={}",
                ours.a,
                theirs.a
            );
            assert!(
                approx_eq(ours.b, theirs.b, PALETTE_TOLERANCE),
                "b mismatch for ({r}, {g}, {b}): ours={}, palette={}",
                ours.b,
                theirs.b
            );
        }
    }

    #[test]
    fn test_srgb_white_and_black() {
        let white = Oklab::from(Srgb::from_u8(255, 255, 255));
        assert!(approx_eq(white.l, 1.0, 1e-4), "white L = {}", white.l);
        assert!(white.a.abs() < 1e-4 && white.b.abs() < 1e-4);

        let black = Oklab::from(Srgb::from_u8(0, 0, 0));
        assert!(black.l.abs() < 1e-6, "black L = {}", black.l);
    }

    #[test]
    fn test_distance_squared() {
        let red_ish = Oklab::new(0.5, 0.2, 0.0);
        let blue_ish = Oklab::new(0.5, 0.0, -0.2);
        assert!((red_ish.distance_squared(blue_ish) - 0.08).abs() < 1e-6);
        assert!(red_ish.distance_squared(red_ish) < 1e-10);
    }

    #[test]
    fn test_mean_accumulator() {
        let mut mean = OklabMean::default();
        assert_eq!(mean.mean(), None);

        mean.push(Oklab::new(0.2, 0.1, -0.1));
        mean.push(Oklab::new(0.4, -0.1, 0.1));
        let m = mean.mean().unwrap();
        assert!(approx_eq(m.l, 0.3, 1e-6));
        assert!(m.a.abs() < 1e-6);
        assert!(m.b.abs() < 1e-6);
    }
}
