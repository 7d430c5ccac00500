//! Assertion helpers for tests.

use pretty_assertions::assert_eq;
use std::path::Path;

use tessera::{CoverageReport, Piece, Raster};

/// Assert every pixel was claimed exactly once
pub fn assert_exact_coverage(report: &CoverageReport) {
    assert!(
        report.is_exact(),
        "Expected exact coverage of {} pixels, got {} uncovered and {} overlapped",
        report.total,
        report.uncovered,
        report.overlapped
    );
}

/// Assert the file at `path` starts with the PNG signature
pub fn assert_png_file(path: &Path) {
    let bytes = std::fs::read(path)
        .unwrap_or_else(|e| panic!("Expected PNG at {}: {e}", path.display()));
    assert_eq!(
        &bytes[..8.min(bytes.len())],
        &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
        "Expected PNG signature in {}",
        path.display()
    );
}

/// Assert two rasters are identical, reporting the first differing pixel
pub fn assert_same_image(actual: &Raster, expected: &Raster) {
    assert_eq!(
        (actual.width(), actual.height()),
        (expected.width(), expected.height()),
        "Image sizes differ"
    );
    let mismatch = actual
        .pixels()
        .iter()
        .zip(expected.pixels())
        .position(|(a, b)| a != b);
    if let Some(i) = mismatch {
        let (x, y) = (i as u32 % actual.width(), i as u32 / actual.width());
        panic!(
            "Images differ at ({x}, {y}): got {:?}, expected {:?}",
            actual.pixels()[i],
            expected.pixels()[i]
        );
    }
}

/// Assert the pieces' opaque pixels cover their shared canvas exactly once
pub fn assert_pieces_partition(pieces: &[Piece]) {
    let first = pieces.first().expect("Expected at least one piece");
    let mut counts = vec![0u32; first.raster.len()];
    for piece in pieces {
        for (i, p) in piece.raster.pixels().iter().enumerate() {
            if p[3] > 0 {
                counts[i] += 1;
            }
        }
    }
    assert_exact_coverage(&CoverageReport::from_counts(&counts));
}
