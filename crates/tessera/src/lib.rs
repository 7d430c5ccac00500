#![allow(clippy::excessive_precision, clippy::manual_range_contains)]

//! tessera: pixel-exact image partitioning and puzzle reassembly
//!
//! This library cuts a raster into disjoint pieces and puts an unordered set
//! of such pieces back together. It does no file I/O; rasters go in and come
//! out as [`Raster`] values.
//!
//! # Quick Start
//!
//! Cut an image into an interlocking grid, then solve and reassemble it from
//! the edge shapes alone:
//!
//! ```
//! use rand::SeedableRng;
//! use tessera::{compose_grid, BacktrackSolver, JigsawPartitioner, Raster};
//!
//! let image = Raster::from_fn(90, 60, |x, y| [x as u8, y as u8, 128, 255]);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let puzzle = JigsawPartitioner::new().generate(&image, 2, 3, &mut rng).unwrap();
//!
//! let placement = BacktrackSolver::default()
//!     .solve(puzzle.edges.cells(), None, 2, 3)
//!     .unwrap();
//! let composite = compose_grid(&puzzle.pieces, &placement, puzzle.layout.into());
//!
//! assert!(composite.coverage.is_exact());
//! assert_eq!(composite.image, image.crop(0, 0, 90, 60));
//! ```
//!
//! # Partitioners
//!
//! - [`VoronoiPartitioner`]: `n` irregular regions from a Lloyd-relaxed
//!   Voronoi tessellation. Every piece keeps the full source bounds and is
//!   transparent outside its region.
//! - [`JigsawPartitioner`]: a rows×cols grid with a tab on one side and a
//!   matching slot on the other side of every internal edge. Pieces are
//!   padded by the tab radius; the per-cell shapes come back as an
//!   [`EdgeTable`].
//!
//! Both guarantee that every pixel of the puzzle area belongs to exactly
//! one piece, and fail with [`PuzzleError::DegenerateTessellation`] rather
//! than return pieces that do not.
//!
//! # Reassembly
//!
//! | Known | Solver | Compositor |
//! |-------|--------|------------|
//! | grid shape and edge shapes | [`BacktrackSolver`] | [`compose_grid`] |
//! | nothing | [`GreedySolver`] | [`compose_grid`] or [`compose_overlay`] |
//!
//! [`BacktrackSolver`] ranks candidates with optional [`SignatureSet`]
//! color signatures and only tries the best `top_k` per cell. When that
//! pruning cuts off every branch it fails with
//! [`PuzzleError::GeometryUnsatisfiable`] instead of widening the search.
//!
//! [`GreedySolver`] scores rim pixels with [`RimScores`] and grows a square
//! grid from the largest piece, re-scoring the whole frontier per step
//! ([`GreedyStrategy::BestFirst`]) or expanding breadth-first behind an
//! acceptance threshold for large piece counts
//! ([`GreedyStrategy::BreadthFirst`]).
//!
//! # Determinism
//!
//! All randomness comes from the caller's RNG. Parallel stages (cell
//! rasterization, masks, signatures, rim scores) collect their results in
//! index order, so a fixed seed always gives the same pieces.
//!
//! # Color
//!
//! Color signatures are compared in [`Oklab`], where equal distances look
//! equally different. Conversion goes [`Srgb`] → [`LinearRgb`] (gamma
//! decode through a build-time lookup table) → [`Oklab`].

pub mod color;
pub mod compose;
pub mod edges;
pub mod error;
pub mod partition;
pub mod piece;
pub mod raster;
pub mod signature;
pub mod solver;


pub use color::{LinearRgb, Oklab, Srgb};
pub use compose::{compose_grid, compose_overlay, Composite, CoverageReport, GridGeometry};
pub use edges::{EdgeKind, EdgeSet, Side};
pub use error::PuzzleError;
pub use partition::{
    assign_edges, EdgeTable, GridLayout, JigsawPartitioner, JigsawPuzzle, LabelMap, Partition,
    SiteSeeding, VoronoiPartitioner,
};
pub use piece::{piece_name, Piece};
pub use raster::{Mask, Raster, Rgba, TRANSPARENT};
pub use signature::{
    classify_edges, classify_pieces, ColorSignature, SignatureSet, DEFAULT_SIGNATURE_DEPTH,
    EDGE_THRESHOLD, SIGNATURE_BINS,
};
pub use solver::{
    BacktrackSolver, Cell, GreedySolver, GreedyStrategy, PieceClass, Placement, RimScores,
};
