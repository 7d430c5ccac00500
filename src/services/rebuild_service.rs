use std::path::{Path, PathBuf};

use tessera::{
    classify_pieces, compose_grid, compose_overlay, BacktrackSolver, CoverageReport, EdgeSet,
    GreedySolver, GreedyStrategy, GridGeometry, GridLayout, Piece, Placement, PuzzleError, Raster,
    SignatureSet,
};

use crate::error::AppError;
use crate::models::{
    EdgeSidecar, LayoutSidecar, OrderSidecar, RebuildConfig, EDGES_FILE, LAYOUT_FILE, ORDER_FILE,
};
use crate::rendering::write_png;
use crate::services::PieceStore;

/// How a piece set was put back together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildMode {
    /// Known grid, edge shapes solved by backtracking
    Backtrack,
    /// Full-canvas pieces stacked in place
    Overlay,
    /// Unknown grid, placed by rim similarity
    Greedy(GreedyStrategy),
}

/// Result of a successful rebuild
#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub mode: RebuildMode,
    pub pieces: usize,
    pub width: u32,
    pub height: u32,
    pub coverage: CoverageReport,
    /// Where the reconstruction was written
    pub output: PathBuf,
    /// Presentation order from `pieces_order.json`, if present
    pub order: Option<Vec<String>>,
}

/// A reconstruction that passed its coverage check
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub mode: RebuildMode,
    pub image: Raster,
    pub coverage: CoverageReport,
}

/// Reassembles a piece directory into one image.
pub struct RebuildService {
    config: RebuildConfig,
    grid: Option<(usize, usize)>,
}

impl RebuildService {
    pub fn new(config: RebuildConfig) -> Self {
        Self { config, grid: None }
    }

    /// Treat piece sets without a layout sidecar as a `rows`×`cols` jigsaw
    /// grid whose geometry is read from the piece shapes.
    #[inline]
    pub fn grid(mut self, rows: usize, cols: usize) -> Self {
        self.grid = Some((rows, cols));
        self
    }

    /// Rebuild the pieces in `pieces_dir` and write the result to
    /// `output_dir`. Nothing is written unless the reconstruction passes
    /// its coverage check.
    pub fn rebuild_dir(
        &self,
        pieces_dir: &Path,
        output_dir: &Path,
    ) -> Result<RebuildReport, AppError> {
        let store = PieceStore::new(pieces_dir);
        let pieces = store.load_pieces()?;
        let names: Vec<String> = pieces.iter().map(|p| p.name.clone()).collect();

        let order = store.read_sidecar::<OrderSidecar>(ORDER_FILE)?;
        if let Some(order) = &order {
            order.check_against(&names)?;
            tracing::debug!(pieces = order.0.len(), "Found presentation order");
        }
        let edges = store.read_sidecar::<EdgeSidecar>(EDGES_FILE)?;
        let layout = store.read_sidecar::<LayoutSidecar>(LAYOUT_FILE)?;

        let reconstruction = match (edges, layout, self.grid) {
            (edges, Some(sidecar), grid) => {
                let layout = sidecar.layout()?;
                sidecar.check_against(&names)?;
                if let Some((rows, cols)) = grid.filter(|&g| g != (layout.rows, layout.cols)) {
                    return Err(AppError::Sidecar(format!(
                        "{LAYOUT_FILE} describes a {}x{} grid, {rows}x{cols} was requested",
                        layout.rows, layout.cols
                    )));
                }
                self.rebuild_grid(&pieces, &names, edges.as_ref(), &layout)?
            }
            (edges, None, Some((rows, cols))) => {
                let layout = GridLayout::from_pieces(&pieces, rows, cols)?;
                tracing::info!(
                    rows,
                    cols,
                    tab_radius = layout.tab_radius,
                    "No layout sidecar, geometry read from piece shapes"
                );
                self.rebuild_grid(&pieces, &names, edges.as_ref(), &layout)?
            }
            (Some(_), None, None) => {
                return Err(AppError::ResourceMissing(format!(
                    "{EDGES_FILE} present without {LAYOUT_FILE} in {}",
                    pieces_dir.display()
                )))
            }
            (None, None, None) => self.rebuild_unordered(&pieces)?,
        };

        std::fs::create_dir_all(output_dir)?;
        let output = output_dir.join(&self.config.output_name);
        write_png(&output, &reconstruction.image, self.config.optimize_png)?;

        tracing::info!(
            mode = ?reconstruction.mode,
            pieces = pieces.len(),
            output = %output.display(),
            "Rebuilt image"
        );
        Ok(RebuildReport {
            mode: reconstruction.mode,
            pieces: pieces.len(),
            width: reconstruction.image.width(),
            height: reconstruction.image.height(),
            coverage: reconstruction.coverage,
            output,
            order: order.map(|o| o.0),
        })
    }

    /// Solve a known grid from edge shapes and compose it.
    ///
    /// Without an edge sidecar the shapes are read back from piece alpha.
    pub fn rebuild_grid(
        &self,
        pieces: &[Piece],
        names: &[String],
        edges: Option<&EdgeSidecar>,
        layout: &GridLayout,
    ) -> Result<Reconstruction, AppError> {
        let (canvas_w, canvas_h) = (layout.canvas_width(), layout.canvas_height());
        if let Some(odd) = pieces
            .iter()
            .find(|p| (p.raster.width(), p.raster.height()) != (canvas_w, canvas_h))
        {
            return Err(AppError::Sidecar(format!(
                "{} is {}x{}, {LAYOUT_FILE} expects {canvas_w}x{canvas_h}",
                odd.name,
                odd.raster.width(),
                odd.raster.height()
            )));
        }

        let edge_sets = match edges {
            Some(sidecar) => sidecar.edge_sets(names)?,
            None => {
                tracing::info!("No edge sidecar, classifying edges from piece shapes");
                classify_pieces(pieces, layout.tab_radius)
            }
        };
        let signatures =
            SignatureSet::extract(pieces, layout.tab_radius, self.config.signature_depth);

        let placement = self.solve_backtracking(&edge_sets, &signatures, layout)?;
        let composite = compose_grid(pieces, &placement, (*layout).into());
        composite.coverage.require_exact()?;

        Ok(Reconstruction {
            mode: RebuildMode::Backtrack,
            image: composite.image,
            coverage: composite.coverage,
        })
    }

    fn solve_backtracking(
        &self,
        edge_sets: &[EdgeSet],
        signatures: &SignatureSet,
        layout: &GridLayout,
    ) -> Result<Placement, AppError> {
        let (rows, cols) = (layout.rows, layout.cols);
        let first =
            BacktrackSolver::new(self.config.top_k).solve(edge_sets, Some(signatures), rows, cols);
        match (first, self.config.widen_top_k) {
            (Err(PuzzleError::GeometryUnsatisfiable { top_k, .. }), Some(wider)) if wider > top_k => {
                tracing::warn!(top_k, wider, "Search exhausted, retrying with more candidates");
                Ok(BacktrackSolver::new(wider).solve(edge_sets, Some(signatures), rows, cols)?)
            }
            (result, _) => Ok(result?),
        }
    }

    /// Rebuild pieces that carry no grid metadata.
    ///
    /// Same-sized pieces that never overlap are full-canvas regions and are
    /// stacked in place; everything else goes through the greedy solver.
    pub fn rebuild_unordered(&self, pieces: &[Piece]) -> Result<Reconstruction, AppError> {
        if same_size(pieces) {
            let overlay = compose_overlay(pieces)?;
            if overlay.coverage.overlapped == 0 {
                overlay.coverage.require_exact()?;
                return Ok(Reconstruction {
                    mode: RebuildMode::Overlay,
                    image: overlay.image,
                    coverage: overlay.coverage,
                });
            }
        }

        let strategy = GreedyStrategy::select(pieces.len(), self.config.bfs_threshold);
        let placement = GreedySolver::new(strategy)
            .acceptance_threshold(self.config.acceptance_threshold)
            .solve(pieces)?;

        let geometry = GridGeometry {
            piece_width: pieces.iter().map(|p| p.raster.width()).max().unwrap_or(0),
            piece_height: pieces.iter().map(|p| p.raster.height()).max().unwrap_or(0),
            margin: 0,
        };
        let composite = compose_grid(pieces, &placement, geometry);
        let empty_cells = placement.empty_cells().count();
        if empty_cells == 0 {
            composite.coverage.require_exact()?;
        } else {
            // Only the cells the square grid has no piece for may stay blank
            composite.coverage.require_disjoint()?;
            let blank = empty_cells * (geometry.piece_width * geometry.piece_height) as usize;
            if composite.coverage.uncovered > blank {
                return Err(PuzzleError::CoverageViolation {
                    uncovered: composite.coverage.uncovered - blank,
                    overlapped: 0,
                }
                .into());
            }
            tracing::warn!(
                empty_cells,
                uncovered = composite.coverage.uncovered,
                pieces = pieces.len(),
                "Greedy grid has cells without a piece"
            );
        }

        Ok(Reconstruction {
            mode: RebuildMode::Greedy(strategy),
            image: composite.image,
            coverage: composite.coverage,
        })
    }
}

fn same_size(pieces: &[Piece]) -> bool {
    match pieces.first() {
        Some(first) => {
            let size = (first.raster.width(), first.raster.height());
            pieces
                .iter()
                .all(|p| (p.raster.width(), p.raster.height()) == size)
        }
        None => false,
    }
}
