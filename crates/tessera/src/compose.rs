//! Reassembling placed pieces into one image.
//!
//! Both compositors count how many pieces claim every output pixel, so the
//! caller can reject a gapped or overlapping result before reporting
//! success.

use crate::error::PuzzleError;
use crate::partition::GridLayout;
use crate::piece::Piece;
use crate::raster::Raster;
use crate::solver::Placement;

/// Pixel claim counts over a composite's output area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageReport {
    /// Output pixels
    pub total: usize,
    /// Pixels no piece claimed
    pub uncovered: usize,
    /// Pixels claimed by more than one piece
    pub overlapped: usize,
}

impl CoverageReport {
    /// Tally claim counts.
    pub fn from_counts(counts: &[u32]) -> Self {
        Self {
            total: counts.len(),
            uncovered: counts.iter().filter(|&&c| c == 0).count(),
            overlapped: counts.iter().filter(|&&c| c > 1).count(),
        }
    }

    #[inline]
    pub fn is_exact(&self) -> bool {
        self.uncovered == 0 && self.overlapped == 0
    }

    /// [`PuzzleError::CoverageViolation`] unless every pixel is claimed
    /// exactly once.
    pub fn require_exact(&self) -> Result<(), PuzzleError> {
        if self.is_exact() {
            Ok(())
        } else {
            Err(PuzzleError::CoverageViolation {
                uncovered: self.uncovered,
                overlapped: self.overlapped,
            })
        }
    }

    /// [`PuzzleError::CoverageViolation`] when any pixel is claimed twice.
    pub fn require_disjoint(&self) -> Result<(), PuzzleError> {
        if self.overlapped == 0 {
            Ok(())
        } else {
            Err(PuzzleError::CoverageViolation {
                uncovered: self.uncovered,
                overlapped: self.overlapped,
            })
        }
    }
}

/// A reassembled image with its coverage tally.
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: Raster,
    pub coverage: CoverageReport,
}

/// Cell size and padding of a grid composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// Horizontal step between cells
    pub piece_width: u32,
    /// Vertical step between cells
    pub piece_height: u32,
    /// Padding around each piece body
    pub margin: u32,
}

impl From<GridLayout> for GridGeometry {
    fn from(layout: GridLayout) -> Self {
        Self {
            piece_width: layout.piece_width,
            piece_height: layout.piece_height,
            margin: layout.tab_radius,
        }
    }
}

/// Paste every placed piece at `(col × piece_width, row × piece_height)` on
/// a padded canvas and crop the padding away.
///
/// Pieces are alpha-composited, so tabs fall into the neighbors' slots.
/// Coverage is tallied over the cropped `cols × piece_width` by
/// `rows × piece_height` area.
pub fn compose_grid(pieces: &[Piece], placement: &Placement, geometry: GridGeometry) -> Composite {
    let GridGeometry {
        piece_width: pw,
        piece_height: ph,
        margin,
    } = geometry;
    let out_w = pw * placement.cols() as u32;
    let out_h = ph * placement.rows() as u32;
    let canvas_w = out_w + 2 * margin;
    let canvas_h = out_h + 2 * margin;

    let mut canvas = Raster::new(canvas_w, canvas_h);
    let mut counts = vec![0u32; canvas_w as usize * canvas_h as usize];
    for (cell, index) in placement.iter() {
        let Some(piece) = pieces.get(index) else {
            continue;
        };
        let (dx, dy) = (cell.col as i64 * pw as i64, cell.row as i64 * ph as i64);
        canvas.composite_over(&piece.raster, dx, dy);
        tally(&mut counts, canvas_w, canvas_h, &piece.raster, dx, dy);
    }

    let image = canvas.crop(margin, margin, out_w, out_h);
    let body_counts: Vec<u32> = (margin..margin + out_h)
        .flat_map(|y| {
            let row = y as usize * canvas_w as usize;
            (margin..margin + out_w).map(move |x| row + x as usize)
        })
        .map(|i| counts[i])
        .collect();
    let coverage = CoverageReport::from_counts(&body_counts);
    tracing::debug!(
        width = out_w,
        height = out_h,
        uncovered = coverage.uncovered,
        overlapped = coverage.overlapped,
        "grid composite"
    );
    Composite { image, coverage }
}

/// Copy the opaque pixels of same-sized full-canvas pieces onto one canvas,
/// later pieces overwriting earlier ones.
pub fn compose_overlay(pieces: &[Piece]) -> Result<Composite, PuzzleError> {
    let first = pieces
        .first()
        .ok_or_else(|| PuzzleError::InputInvalid("no pieces to compose".into()))?;
    let (w, h) = (first.raster.width(), first.raster.height());
    if let Some(odd) = pieces
        .iter()
        .find(|p| (p.raster.width(), p.raster.height()) != (w, h))
    {
        return Err(PuzzleError::InputInvalid(format!(
            "{} is {}x{}, expected {}x{}",
            odd.name,
            odd.raster.width(),
            odd.raster.height(),
            w,
            h
        )));
    }

    let mut canvas = Raster::new(w, h);
    let mut counts = vec![0u32; w as usize * h as usize];
    for piece in pieces {
        for (i, &pixel) in piece.raster.pixels().iter().enumerate() {
            if pixel[3] > 0 {
                let (x, y) = (i as u32 % w, i as u32 / w);
                canvas.put(x, y, pixel);
                counts[i] += 1;
            }
        }
    }
    let coverage = CoverageReport::from_counts(&counts);
    tracing::debug!(
        width = w,
        height = h,
        uncovered = coverage.uncovered,
        overlapped = coverage.overlapped,
        "overlay composite"
    );
    Ok(Composite {
        image: canvas,
        coverage,
    })
}

/// Count the opaque pixels of `src` placed at `(dx, dy)`.
fn tally(counts: &mut [u32], width: u32, height: u32, src: &Raster, dx: i64, dy: i64) {
    for y in 0..src.height() {
        let ty = dy + y as i64;
        if ty < 0 || ty >= height as i64 {
            continue;
        }
        for x in 0..src.width() {
            let tx = dx + x as i64;
            if tx < 0 || tx >= width as i64 || src.get(x, y)[3] == 0 {
                continue;
            }
            counts[ty as usize * width as usize + tx as usize] += 1;
        }
    }
}
