//! Error type for partitioning, solving and compositing.
//!
//! [`PuzzleError`] separates the failure kinds a caller has to tell apart:
//! bad input, an unsatisfiable grid, and broken coverage.

use std::fmt;

/// Failure of a tessera operation.
///
/// Degenerate tessellation cells (zero-pixel Voronoi regions) are recovered
/// inside the partitioner and never surface here unless coverage is still
/// broken after recovery.
///
/// # Example
///
/// ```
/// use tessera::{PuzzleError, Raster, VoronoiPartitioner};
/// use rand::SeedableRng;
///
/// let image = Raster::new(2, 2);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let err = VoronoiPartitioner::new()
///     .generate(&image, 5, &mut rng)
///     .unwrap_err();
/// assert!(matches!(err, PuzzleError::InputInvalid(_)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleError {
    /// Malformed image, piece count or grid shape
    InputInvalid(String),
    /// Backtracking exhausted every candidate prefix without filling the grid
    GeometryUnsatisfiable {
        /// Grid rows
        rows: usize,
        /// Grid columns
        cols: usize,
        /// Number of candidates tried per cell
        top_k: usize,
    },
    /// Tessellation recovery could not restore full, exclusive coverage
    DegenerateTessellation(String),
    /// A composite has gaps or overlaps where exact coverage is required
    CoverageViolation {
        /// Pixels no piece covers
        uncovered: usize,
        /// Pixels covered by more than one piece
        overlapped: usize,
    },
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleError::InputInvalid(reason) => write!(f, "invalid input: {}", reason),
            PuzzleError::GeometryUnsatisfiable { rows, cols, top_k } => write!(
                f,
                "no valid placement for {}x{} grid within top-{} candidates",
                rows, cols, top_k
            ),
            PuzzleError::DegenerateTessellation(reason) => {
                write!(f, "degenerate tessellation: {}", reason)
            }
            PuzzleError::CoverageViolation {
                uncovered,
                overlapped,
            } => write!(
                f,
                "coverage violated: {} uncovered, {} overlapped pixels",
                uncovered, overlapped
            ),
        }
    }
}

impl std::error::Error for PuzzleError {}
