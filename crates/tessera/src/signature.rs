//! Per-side descriptors of grid pieces.
//!
//! Two independent extractors:
//!
//! - [`classify_edges`] reads a side's shape (flat, tab or slot) from alpha
//!   occupancy around the body boundary.
//! - [`ColorSignature`] samples the colors just inside a side so that two
//!   sides can be compared for continuity.
//!
//! Both expect grid-piece rasters: a body padded by `margin` pixels on every
//! side, as produced by [`JigsawPartitioner`](crate::JigsawPartitioner).

use rayon::prelude::*;

use crate::color::{Oklab, OklabMean, Srgb};
use crate::edges::{EdgeKind, EdgeSet, Side};
use crate::piece::Piece;
use crate::raster::Raster;

/// Mean opacity above `1 - EDGE_THRESHOLD` reads as a tab, below
/// `EDGE_THRESHOLD` as a slot.
pub const EDGE_THRESHOLD: f32 = 0.15;

/// Samples per color signature.
pub const SIGNATURE_BINS: usize = 16;

/// Default strip depth for color signatures, in pixels.
pub const DEFAULT_SIGNATURE_DEPTH: u32 = 3;

/// Body rectangle `(x, y, w, h)` of a padded piece canvas.
fn body(raster: &Raster, margin: u32) -> (u32, u32, u32, u32) {
    let w = raster.width().saturating_sub(2 * margin);
    let h = raster.height().saturating_sub(2 * margin);
    (margin, margin, w, h)
}

/// Classify all four sides of a padded grid piece.
///
/// Each side is judged on a two-pixel-deep window straddling the body
/// boundary (one line in the padding, one in the body) over the central part
/// of the side: its middle third, narrowed to half the margin so the window
/// never reaches past a tab's disc. A tab fills both lines, a slot empties
/// both, a flat side fills only the body line.
///
/// ```
/// use rand::SeedableRng;
/// use tessera::{classify_edges, JigsawPartitioner, Raster};
///
/// let image = Raster::filled(60, 60, [10, 20, 30, 255]);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
/// let puzzle = JigsawPartitioner::new().generate(&image, 3, 3, &mut rng).unwrap();
/// let margin = puzzle.layout.tab_radius;
///
/// for (i, piece) in puzzle.pieces.iter().enumerate() {
///     let (row, col) = puzzle.layout.cell_of(i);
///     assert_eq!(classify_edges(&piece.raster, margin), puzzle.edges.get(row, col));
/// }
/// ```
pub fn classify_edges(raster: &Raster, margin: u32) -> EdgeSet {
    let (bx, by, bw, bh) = body(raster, margin);
    let (bx, by, bw, bh) = (bx as i64, by as i64, bw as i64, bh as i64);
    let reach = (margin as i64 / 2).max(1);

    let mut edges = EdgeSet::FLAT;
    for side in Side::ALL {
        let along = match side {
            Side::Top | Side::Bottom => bw,
            Side::Left | Side::Right => bh,
        };
        let half = (along / 6).min(reach).max(1);
        let mid = along / 2;
        // (outer line, inner line) perpendicular coordinates
        let (outer, inner) = match side {
            Side::Top => (by - 1, by),
            Side::Bottom => (by + bh, by + bh - 1),
            Side::Left => (bx - 1, bx),
            Side::Right => (bx + bw, bx + bw - 1),
        };

        let mut opaque = 0usize;
        let mut total = 0usize;
        for t in (mid - half)..(mid + half) {
            for line in [outer, inner] {
                let alpha = match side {
                    Side::Top | Side::Bottom => raster.alpha_at(bx + t, line),
                    Side::Left | Side::Right => raster.alpha_at(line, by + t),
                };
                total += 1;
                if alpha > 0 {
                    opaque += 1;
                }
            }
        }
        let mean = if total == 0 {
            0.5
        } else {
            opaque as f32 / total as f32
        };
        let kind = if mean > 1.0 - EDGE_THRESHOLD {
            EdgeKind::Tab
        } else if mean < EDGE_THRESHOLD {
            EdgeKind::Slot
        } else {
            EdgeKind::Flat
        };
        edges.set(side, kind);
    }
    edges
}

/// [`classify_edges`] over a whole piece set, in piece order.
pub fn classify_pieces(pieces: &[Piece], margin: u32) -> Vec<EdgeSet> {
    pieces
        .par_iter()
        .map(|piece| classify_edges(&piece.raster, margin))
        .collect()
}

/// Mean Oklab colors of a strip just inside one side of a piece body.
///
/// Bins run left to right along horizontal sides and top to bottom along
/// vertical ones, so a right side and its neighbor's left side compare bin
/// for bin. A bin with no visible pixel is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSignature {
    bins: [Option<Oklab>; SIGNATURE_BINS],
}

impl ColorSignature {
    /// Sample `depth` pixels inward from the body boundary on `side`.
    pub fn extract(raster: &Raster, side: Side, margin: u32, depth: u32) -> Self {
        let (bx, by, bw, bh) = body(raster, margin);
        let mut sums = [OklabMean::default(); SIGNATURE_BINS];
        let along = match side {
            Side::Top | Side::Bottom => bw,
            Side::Left | Side::Right => bh,
        };
        let across = match side {
            Side::Top | Side::Bottom => bh,
            Side::Left | Side::Right => bw,
        };
        let depth = depth.max(1).min(across);

        for t in 0..along {
            let bin = (t as usize * SIGNATURE_BINS) / along as usize;
            for d in 0..depth {
                let (x, y) = match side {
                    Side::Top => (bx + t, by + d),
                    Side::Bottom => (bx + t, by + bh - 1 - d),
                    Side::Left => (bx + d, by + t),
                    Side::Right => (bx + bw - 1 - d, by + t),
                };
                let pixel = raster.get(x, y);
                if pixel[3] > 0 {
                    sums[bin].push(Oklab::from(Srgb::from_rgba(pixel)));
                }
            }
        }
        Self {
            bins: sums.map(|mean| mean.mean()),
        }
    }

    #[inline]
    pub fn bins(&self) -> &[Option<Oklab>; SIGNATURE_BINS] {
        &self.bins
    }

    /// Mean squared Oklab distance over bins valid on both sides, or
    /// infinity when they share none.
    pub fn distance(&self, other: &ColorSignature) -> f32 {
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for (a, b) in self.bins.iter().zip(&other.bins) {
            if let (Some(a), Some(b)) = (a, b) {
                sum += a.distance_squared(*b);
                count += 1;
            }
        }
        if count == 0 {
            f32::INFINITY
        } else {
            sum / count as f32
        }
    }
}

/// All four side signatures of every piece.
#[derive(Debug, Clone)]
pub struct SignatureSet {
    sides: Vec<[ColorSignature; 4]>,
}

impl SignatureSet {
    /// Extract signatures for `pieces` in parallel, kept in piece order.
    pub fn extract(pieces: &[Piece], margin: u32, depth: u32) -> Self {
        let sides = pieces
            .par_iter()
            .map(|piece| {
                Side::ALL.map(|side| ColorSignature::extract(&piece.raster, side, margin, depth))
            })
            .collect();
        Self { sides }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sides.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    #[inline]
    pub fn get(&self, piece: usize, side: Side) -> &ColorSignature {
        &self.sides[piece][side.index()]
    }

    /// Distance between `a`'s `side` and `b`'s opposite side, i.e. the
    /// mismatch of placing `b` next to `a` across `side`.
    pub fn score(&self, a: usize, side: Side, b: usize) -> f32 {
        self.get(a, side).distance(self.get(b, side.opposite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::JigsawPartitioner;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_classify_plain_body_is_flat() {
        // 10x10 body with a 3 pixel transparent margin
        let raster = Raster::from_fn(16, 16, |x, y| {
            if (3..13).contains(&x) && (3..13).contains(&y) {
                [1, 1, 1, 255]
            } else {
                [0, 0, 0, 0]
            }
        });
        assert_eq!(classify_edges(&raster, 3), EdgeSet::FLAT);
    }

    #[test]
    fn test_classify_generated_grid() {
        let image = Raster::from_fn(90, 72, |x, y| [x as u8, y as u8, 128, 255]);
        let mut rng = StdRng::seed_from_u64(21);
        let puzzle = JigsawPartitioner::new()
            .generate(&image, 4, 5, &mut rng)
            .unwrap();
        let found = classify_pieces(&puzzle.pieces, puzzle.layout.tab_radius);
        assert_eq!(found, puzzle.edges.cells());
    }

    #[test]
    fn test_distance_identical_is_zero() {
        let raster = Raster::from_fn(12, 12, |x, _| [x as u8 * 20, 50, 90, 255]);
        let sig = ColorSignature::extract(&raster, Side::Left, 0, 2);
        assert_eq!(sig.distance(&sig), 0.0);
    }

    #[test]
    fn test_distance_without_overlap_is_infinite() {
        let clear = Raster::new(8, 8);
        let sig = ColorSignature::extract(&clear, Side::Top, 0, 2);
        assert!(sig.bins().iter().all(Option::is_none));
        assert_eq!(sig.distance(&sig), f32::INFINITY);
    }

    #[test]
    fn test_distance_orders_by_color_gap() {
        let red = Raster::filled(8, 8, [255, 0, 0, 255]);
        let dark_red = Raster::filled(8, 8, [200, 0, 0, 255]);
        let blue = Raster::filled(8, 8, [0, 0, 255, 255]);
        let s = |r: &Raster| ColorSignature::extract(r, Side::Right, 0, 1);
        assert!(s(&red).distance(&s(&dark_red)) < s(&red).distance(&s(&blue)));
    }

    #[test]
    fn test_score_matches_true_neighbors_best() {
        let image = Raster::from_fn(80, 40, |x, y| [(x * 3) as u8, (y * 6) as u8, 40, 255]);
        let mut rng = StdRng::seed_from_u64(4);
        let puzzle = JigsawPartitioner::new()
            .generate(&image, 2, 4, &mut rng)
            .unwrap();
        let set = SignatureSet::extract(&puzzle.pieces, puzzle.layout.tab_radius, 2);
        assert_eq!(set.len(), 8);
        // Piece 1 sits right of piece 0; piece 3 is far away
        assert!(set.score(0, Side::Right, 1) < set.score(0, Side::Right, 3));
    }
}
