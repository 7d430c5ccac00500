//! Color types used for piece signatures
//!
//! Piece rasters are stored as 8-bit sRGB. Similarity scoring between piece
//! sides happens in Oklab, where Euclidean distance tracks perceived color
//! difference.
//!
//! # Example
//!
//! ```
//! use tessera::{LinearRgb, Oklab, Srgb};
//!
//! let srgb = Srgb::from_u8(128, 64, 32);
//! let oklab = Oklab::from(LinearRgb::from(srgb));
//! assert!(oklab.l > 0.0 && oklab.l < 1.0);
//! ```

mod linear_rgb;
mod lut;
mod oklab;
mod srgb;

pub use linear_rgb::LinearRgb;
pub use oklab::Oklab;
pub(crate) use oklab::OklabMean;
pub use srgb::Srgb;
