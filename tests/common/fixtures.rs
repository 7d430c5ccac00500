//! Test fixtures and constants.

use tessera::Raster;

/// Seeds used across scenarios
pub mod seeds {
    /// Seed of the 300x300 nine-piece scenario
    pub const SCENARIO: u64 = 1;

    /// General purpose seed
    pub const DEFAULT: u64 = 42;
}

/// Source image sizes
pub mod sizes {
    /// Small Voronoi source
    pub const VORONOI: (u32, u32) = (96, 64);

    /// Jigsaw source whose size does not divide evenly into 2x3
    pub const JIGSAW: (u32, u32) = (151, 103);
}

/// Colorful source image: a diagonal gradient with a checker overlay, so
/// every region carries distinct colors for signatures to latch onto.
pub fn gradient(width: u32, height: u32) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        let checker = if (x / 8 + y / 8) % 2 == 0 { 40 } else { 0 };
        [
            (x * 215 / width.max(1)) as u8 + checker,
            (y * 215 / height.max(1)) as u8 + checker,
            ((x + y) * 200 / (width + height).max(1)) as u8,
            255,
        ]
    })
}

/// Single-color source image.
pub fn solid(width: u32, height: u32) -> Raster {
    Raster::filled(width, height, [120, 180, 90, 255])
}
