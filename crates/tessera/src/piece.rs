//! The piece type handed from partitioners to solvers and the compositor.

use crate::raster::Raster;

/// One puzzle piece: a named RGBA raster whose alpha channel is its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// Stable file name, e.g. `piece_07.png`
    pub name: String,
    pub raster: Raster,
}

impl Piece {
    pub fn new(name: impl Into<String>, raster: Raster) -> Self {
        Self {
            name: name.into(),
            raster,
        }
    }

    /// Opaque pixel count (the piece's area).
    pub fn area(&self) -> usize {
        self.raster.opaque_count()
    }
}

/// Stable zero-padded file name for the piece at `index`.
///
/// ```
/// assert_eq!(tessera::piece_name(7), "piece_07.png");
/// assert_eq!(tessera::piece_name(123), "piece_123.png");
/// ```
pub fn piece_name(index: usize) -> String {
    format!("piece_{index:02}.png")
}
