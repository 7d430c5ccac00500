//! Voronoi partitioner with Lloyd relaxation.

use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;

use super::geometry::{bounding_radius, rasterize_convex, voronoi_cell, Point};
use super::label_map::LabelMap;
use super::Partition;
use crate::error::PuzzleError;
use crate::piece::{piece_name, Piece};
use crate::raster::{Raster, TRANSPARENT};

/// Default number of Lloyd relaxation rounds.
pub const DEFAULT_LLOYD_ITERATIONS: usize = 10;

/// How initial sites are scattered over the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiteSeeding {
    /// Independent uniform positions
    #[default]
    Uniform,
    /// One jittered site per cell of a near-square grid
    JitteredGrid,
}

/// Splits an image into `n` irregular pieces whose masks tile it exactly.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use tessera::{Raster, VoronoiPartitioner};
///
/// let image = Raster::filled(40, 30, [90, 120, 200, 255]);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let partition = VoronoiPartitioner::new()
///     .lloyd_iterations(3)
///     .generate(&image, 4, &mut rng)
///     .unwrap();
///
/// assert_eq!(partition.pieces.len(), 4);
/// let covered: usize = partition.pieces.iter().map(|p| p.area()).sum();
/// assert_eq!(covered, 40 * 30);
/// ```
#[derive(Debug, Clone)]
pub struct VoronoiPartitioner {
    lloyd_iterations: usize,
    seeding: SiteSeeding,
}

impl Default for VoronoiPartitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl VoronoiPartitioner {
    pub fn new() -> Self {
        Self {
            lloyd_iterations: DEFAULT_LLOYD_ITERATIONS,
            seeding: SiteSeeding::Uniform,
        }
    }

    /// Set the number of relaxation rounds (0 keeps the seeded sites).
    #[inline]
    pub fn lloyd_iterations(mut self, rounds: usize) -> Self {
        self.lloyd_iterations = rounds;
        self
    }

    #[inline]
    pub fn seeding(mut self, seeding: SiteSeeding) -> Self {
        self.seeding = seeding;
        self
    }

    /// Partition `image` into exactly `n_pieces` pieces.
    ///
    /// Piece `i` keeps the source color where the label map says `i` (alpha
    /// forced opaque) and is transparent black everywhere else. Returns
    /// [`PuzzleError::InputInvalid`] before doing any work when `n_pieces`
    /// is zero, the image is empty, or there are fewer pixels than pieces.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        image: &Raster,
        n_pieces: usize,
        rng: &mut R,
    ) -> Result<Partition, PuzzleError> {
        let labels = self.label_map(image.width(), image.height(), n_pieces, rng)?;

        let pieces: Vec<Piece> = (0..n_pieces)
            .into_par_iter()
            .map(|i| {
                let raster = Raster::from_fn(image.width(), image.height(), |x, y| {
                    if labels.get(x, y) == i as u32 {
                        let [r, g, b, _] = image.get(x, y);
                        [r, g, b, 255]
                    } else {
                        TRANSPARENT
                    }
                });
                Piece::new(piece_name(i), raster)
            })
            .collect();

        tracing::info!(pieces = n_pieces, "voronoi partition complete");
        Ok(Partition { pieces, labels })
    }

    /// Compute the final label map for a `width`×`height` image: labels are
    /// exactly `0..n_pieces` and every pixel carries one.
    pub fn label_map<R: Rng + ?Sized>(
        &self,
        width: u32,
        height: u32,
        n_pieces: usize,
        rng: &mut R,
    ) -> Result<LabelMap, PuzzleError> {
        let pixel_count = width as usize * height as usize;
        if n_pieces == 0 {
            return Err(PuzzleError::InputInvalid("piece count must be positive".into()));
        }
        if pixel_count == 0 {
            return Err(PuzzleError::InputInvalid("image is empty".into()));
        }
        if n_pieces > pixel_count {
            return Err(PuzzleError::InputInvalid(format!(
                "{} pieces requested but the image has only {} pixels",
                n_pieces, pixel_count
            )));
        }

        let mut sites = seed_sites(self.seeding, width, height, n_pieces, rng);
        for round in 0..self.lloyd_iterations {
            let cells = rasterize_cells(&sites, width, height);
            let mut empty = 0usize;
            for (site, cell) in sites.iter_mut().zip(&cells) {
                match pixel_centroid(cell, width, height) {
                    Some(centroid) => *site = centroid,
                    None => empty += 1,
                }
            }
            if empty > 0 {
                tracing::debug!(round, empty, "empty voronoi cells kept their sites");
            }
        }

        let mut labels = LabelMap::new(width, height);
        for (i, cell) in rasterize_cells(&sites, width, height).iter().enumerate() {
            for &px in cell {
                labels.set_index(px as usize, i as u32);
            }
        }

        let (mut labels, mut count) = labels.fill_nearest().compact();
        if count < n_pieces {
            tracing::warn!(
                labels = count,
                requested = n_pieces,
                "degenerate tessellation, bisecting largest regions"
            );
        }
        // One label per site at most, so only splitting is ever needed
        debug_assert!(count <= n_pieces);
        while count < n_pieces {
            labels = labels.bisect_largest(count as u32, rng)?;
            count += 1;
        }

        verify_labels(&labels, n_pieces, count)?;
        Ok(labels)
    }
}

fn seed_sites<R: Rng + ?Sized>(
    seeding: SiteSeeding,
    width: u32,
    height: u32,
    n: usize,
    rng: &mut R,
) -> Vec<Point> {
    let (w, h) = (width as f64, height as f64);
    match seeding {
        SiteSeeding::Uniform => (0..n)
            .map(|_| Point::new(rng.gen_range(0.0..w), rng.gen_range(0.0..h)))
            .collect(),
        SiteSeeding::JitteredGrid => {
            let cols = ((n as f64 * w / h).sqrt().ceil() as usize).max(1);
            let rows = n.div_ceil(cols);
            let (cell_w, cell_h) = (w / cols as f64, h / rows as f64);
            let mut cells: Vec<(usize, usize)> = (0..rows)
                .flat_map(|r| (0..cols).map(move |c| (r, c)))
                .collect();
            cells.shuffle(rng);
            cells
                .into_iter()
                .take(n)
                .map(|(r, c)| {
                    Point::new(
                        (c as f64 + rng.gen::<f64>()) * cell_w,
                        (r as f64 + rng.gen::<f64>()) * cell_h,
                    )
                })
                .collect()
        }
    }
}

/// Pixel indices of every site's cell, in site order.
fn rasterize_cells(sites: &[Point], width: u32, height: u32) -> Vec<Vec<u32>> {
    let radius = bounding_radius(sites, width, height);
    (0..sites.len())
        .into_par_iter()
        .map(|i| rasterize_convex(&voronoi_cell(sites, i, radius), width, height))
        .collect()
}

/// Mean pixel center of a cell, clamped into the image.
fn pixel_centroid(cell: &[u32], width: u32, height: u32) -> Option<Point> {
    if cell.is_empty() {
        return None;
    }
    let (mut sx, mut sy) = (0.0f64, 0.0f64);
    for &px in cell {
        sx += (px % width) as f64 + 0.5;
        sy += (px / width) as f64 + 0.5;
    }
    let n = cell.len() as f64;
    Some(Point::new(
        (sx / n).clamp(0.5, width as f64 - 0.5),
        (sy / n).clamp(0.5, height as f64 - 0.5),
    ))
}

fn verify_labels(labels: &LabelMap, n_pieces: usize, count: usize) -> Result<(), PuzzleError> {
    if !labels.is_complete() {
        let missing = labels
            .labels()
            .iter()
            .filter(|&&l| l == super::label_map::UNLABELED)
            .count();
        return Err(PuzzleError::DegenerateTessellation(format!(
            "{} pixels left unlabeled",
            missing
        )));
    }
    let expected: Vec<u32> = (0..n_pieces as u32).collect();
    let distinct: Vec<u32> = labels.distinct().into_iter().collect();
    if count != n_pieces || distinct != expected {
        return Err(PuzzleError::DegenerateTessellation(format!(
            "expected labels 0..{}, found {} distinct",
            n_pieces,
            distinct.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn coverage_counts(partition: &Partition) -> Vec<u32> {
        let len = partition.labels.labels().len();
        let mut counts = vec![0u32; len];
        for piece in &partition.pieces {
            for (i, p) in piece.raster.pixels().iter().enumerate() {
                if p[3] > 0 {
                    counts[i] += 1;
                }
            }
        }
        counts
    }

    #[test]
    fn test_rejects_zero_pieces() {
        let image = Raster::filled(10, 10, [0, 0, 0, 255]);
        let mut rng = StdRng::seed_from_u64(1);
        let err = VoronoiPartitioner::new()
            .generate(&image, 0, &mut rng)
            .unwrap_err();
        assert!(matches!(err, PuzzleError::InputInvalid(_)));
    }

    #[test]
    fn test_rejects_empty_image() {
        let image = Raster::new(0, 5);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            VoronoiPartitioner::new().generate(&image, 1, &mut rng),
            Err(PuzzleError::InputInvalid(_))
        ));
    }

    #[test]
    fn test_every_pixel_covered_once() {
        let image = Raster::from_fn(37, 23, |x, y| [x as u8 * 6, y as u8 * 10, 77, 255]);
        let mut rng = StdRng::seed_from_u64(11);
        let partition = VoronoiPartitioner::new()
            .generate(&image, 7, &mut rng)
            .unwrap();
        assert_eq!(partition.pieces.len(), 7);
        assert!(coverage_counts(&partition).iter().all(|&c| c == 1));
        assert!(partition.pieces.iter().all(|p| p.area() > 0));
    }

    #[test]
    fn test_pieces_keep_source_color() {
        let image = Raster::from_fn(12, 12, |x, y| [x as u8, y as u8, 9, 200]);
        let mut rng = StdRng::seed_from_u64(2);
        let partition = VoronoiPartitioner::new()
            .generate(&image, 3, &mut rng)
            .unwrap();
        for piece in &partition.pieces {
            for (i, p) in piece.raster.pixels().iter().enumerate() {
                if p[3] > 0 {
                    let (x, y) = ((i % 12) as u8, (i / 12) as u8);
                    assert_eq!(*p, [x, y, 9, 255]);
                } else {
                    assert_eq!(*p, TRANSPARENT);
                }
            }
        }
    }

    #[test]
    fn test_as_many_pieces_as_pixels() {
        let mut rng = StdRng::seed_from_u64(5);
        let labels = VoronoiPartitioner::new()
            .label_map(3, 2, 6, &mut rng)
            .unwrap();
        assert_eq!(labels.distinct().len(), 6);
    }

    #[test]
    fn test_jittered_grid_seeding_covers() {
        let mut rng = StdRng::seed_from_u64(8);
        let labels = VoronoiPartitioner::new()
            .seeding(SiteSeeding::JitteredGrid)
            .label_map(50, 20, 10, &mut rng)
            .unwrap();
        assert!(labels.is_complete());
        assert_eq!(labels.distinct().len(), 10);
    }

    #[test]
    fn test_centroid_is_clamped() {
        let c = pixel_centroid(&[0], 4, 4).unwrap();
        assert_eq!((c.x, c.y), (0.5, 0.5));
        assert!(pixel_centroid(&[], 4, 4).is_none());
    }
}
