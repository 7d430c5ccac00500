use tessera::{Piece, Raster};

/// Pixel covered by exactly one piece
pub const COVERED: [u8; 4] = [0, 0, 0, 255];
/// Pixel no piece covers
pub const GAP: [u8; 4] = [255, 0, 0, 255];
/// Pixel more than one piece covers
pub const OVERLAP: [u8; 4] = [0, 255, 0, 255];

/// Count how many pieces are opaque at each pixel of a `width`×`height`
/// canvas. Pieces are read from their top-left corner; anything outside the
/// canvas is ignored.
pub fn coverage_counts(pieces: &[Piece], width: u32, height: u32) -> Vec<u32> {
    let mut counts = vec![0u32; width as usize * height as usize];
    for piece in pieces {
        let raster = &piece.raster;
        for y in 0..raster.height().min(height) {
            for x in 0..raster.width().min(width) {
                if raster.get(x, y)[3] > 0 {
                    counts[y as usize * width as usize + x as usize] += 1;
                }
            }
        }
    }
    counts
}

/// Render claim counts as an image: black where one piece covers a pixel,
/// red for gaps, green for overlaps.
pub fn render_coverage(counts: &[u32], width: u32, height: u32) -> Raster {
    Raster::from_fn(width, height, |x, y| {
        match counts[y as usize * width as usize + x as usize] {
            0 => GAP,
            1 => COVERED,
            _ => OVERLAP,
        }
    })
}
