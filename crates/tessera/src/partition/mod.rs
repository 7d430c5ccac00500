//! Partition generators.
//!
//! Two variants share the [`Piece`] output type:
//!
//! - [`VoronoiPartitioner`]: irregular regions from a relaxed Voronoi
//!   tessellation, each piece the size of the source image
//! - [`JigsawPartitioner`]: a rows×cols grid with complementary tabs and
//!   slots on every internal side, each piece padded by the tab radius

mod geometry;
mod jigsaw;
mod label_map;
mod voronoi;

pub use geometry::{clip_half_plane, rasterize_convex, Point};
pub use jigsaw::{
    assign_edges, EdgeTable, GridLayout, JigsawPartitioner, JigsawPuzzle, DEFAULT_TAB_RATIO,
    MAX_TAB_RATIO,
};
pub use label_map::{LabelMap, UNLABELED};
pub use voronoi::{SiteSeeding, VoronoiPartitioner, DEFAULT_LLOYD_ITERATIONS};

use crate::piece::Piece;

/// Output of the Voronoi partitioner.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Pieces in label order; `pieces[i]` is label `i`
    pub pieces: Vec<Piece>,
    pub labels: LabelMap,
}
