//! Depth-first placement search with top-K candidate pruning.
//!
//! Cells are filled row-major. A candidate must be unused, of the cell's
//! class, flat exactly on the sides facing the outer boundary, and
//! interlock with the already placed top and left neighbors. Valid
//! candidates are ranked by color mismatch against those neighbors and only
//! the best `top_k` are tried. When pruning cuts off every branch the
//! search fails instead of widening K.

use std::collections::BTreeMap;

use super::{Cell, PieceClass, Placement};
use crate::edges::{EdgeKind, EdgeSet, Side};
use crate::error::PuzzleError;
use crate::signature::SignatureSet;

/// Candidates tried per cell unless configured otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// One level of the explicit search stack.
struct Frame {
    candidates: Vec<usize>,
    next: usize,
}

/// Backtracking solver for grids with known edge shapes.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use tessera::{BacktrackSolver, JigsawPartitioner, Raster};
///
/// let image = Raster::filled(60, 40, [0, 128, 255, 255]);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let puzzle = JigsawPartitioner::new().generate(&image, 2, 3, &mut rng).unwrap();
///
/// let placement = BacktrackSolver::new(5)
///     .solve(puzzle.edges.cells(), None, 2, 3)
///     .unwrap();
/// assert!(placement.is_complete());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BacktrackSolver {
    top_k: usize,
}

impl Default for BacktrackSolver {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl BacktrackSolver {
    /// A solver trying at most `top_k` candidates per cell (at least one).
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k: top_k.max(1),
        }
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Place the pieces described by `edges` (indexed by piece) on a
    /// `rows`×`cols` grid.
    ///
    /// `signatures`, when given, rank candidates by color continuity;
    /// without them candidates keep piece order.
    pub fn solve(
        &self,
        edges: &[EdgeSet],
        signatures: Option<&SignatureSet>,
        rows: usize,
        cols: usize,
    ) -> Result<Placement, PuzzleError> {
        if rows == 0 || cols == 0 {
            return Err(PuzzleError::InputInvalid(format!(
                "grid {}x{} has no cells",
                rows, cols
            )));
        }
        if let Some(sigs) = signatures {
            if sigs.len() != edges.len() {
                return Err(PuzzleError::InputInvalid(format!(
                    "{} signatures for {} pieces",
                    sigs.len(),
                    edges.len()
                )));
            }
        }
        let unsatisfiable = PuzzleError::GeometryUnsatisfiable {
            rows,
            cols,
            top_k: self.top_k,
        };
        if edges.len() != rows * cols {
            tracing::warn!(
                pieces = edges.len(),
                cells = rows * cols,
                "piece count does not match grid"
            );
            return Err(unsatisfiable);
        }
        if class_histogram(edges.iter().map(|e| PieceClass::from_flat_count(e.flat_count())))
            != class_histogram(
                (0..rows * cols)
                    .map(|i| PieceClass::for_cell(Cell::new(i / cols, i % cols), rows, cols)),
            )
        {
            tracing::warn!(rows, cols, "piece classes do not match grid");
            return Err(unsatisfiable);
        }

        let classes: Vec<PieceClass> = edges
            .iter()
            .map(|e| PieceClass::from_flat_count(e.flat_count()))
            .collect();
        let total = rows * cols;
        let mut placement = Placement::new(rows, cols);
        let mut used = vec![false; edges.len()];
        let mut nodes = 0usize;
        let search = Search {
            edges,
            signatures,
            classes: &classes,
            rows,
            cols,
            top_k: self.top_k,
        };

        let mut stack = vec![Frame {
            candidates: search.candidates(Cell::new(0, 0), &placement, &used),
            next: 0,
        }];
        while let Some(depth) = stack.len().checked_sub(1) {
            let frame = &mut stack[depth];
            let cell = Cell::new(depth / cols, depth % cols);
            if let Some(previous) = placement.remove(cell) {
                used[previous] = false;
            }
            if frame.next >= frame.candidates.len() {
                stack.pop();
                continue;
            }
            let piece = frame.candidates[frame.next];
            frame.next += 1;
            placement.place(cell, piece);
            used[piece] = true;
            nodes += 1;

            if depth + 1 == total {
                tracing::debug!(rows, cols, nodes, "backtracking solved grid");
                return Ok(placement);
            }
            let depth = depth + 1;
            let next_cell = Cell::new(depth / cols, depth % cols);
            stack.push(Frame {
                candidates: search.candidates(next_cell, &placement, &used),
                next: 0,
            });
        }

        tracing::warn!(rows, cols, top_k = self.top_k, nodes, "backtracking exhausted");
        Err(unsatisfiable)
    }
}

fn class_histogram(classes: impl Iterator<Item = PieceClass>) -> BTreeMap<PieceClass, usize> {
    let mut histogram = BTreeMap::new();
    for class in classes {
        *histogram.entry(class).or_insert(0) += 1;
    }
    histogram
}

struct Search<'a> {
    edges: &'a [EdgeSet],
    signatures: Option<&'a SignatureSet>,
    classes: &'a [PieceClass],
    rows: usize,
    cols: usize,
    top_k: usize,
}

impl Search<'_> {
    /// Ranked, pruned candidates for `cell`.
    fn candidates(&self, cell: Cell, placement: &Placement, used: &[bool]) -> Vec<usize> {
        let class = PieceClass::for_cell(cell, self.rows, self.cols);
        let top = cell
            .neighbor(Side::Top, self.rows, self.cols)
            .and_then(|c| placement.get(c));
        let left = cell
            .neighbor(Side::Left, self.rows, self.cols)
            .and_then(|c| placement.get(c));

        let mut scored: Vec<(usize, f32)> = (0..self.edges.len())
            .filter(|&p| !used[p] && self.classes[p] == class)
            .filter(|&p| self.fits(cell, self.edges[p], top, left))
            .map(|p| (p, self.score(p, top, left)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(self.top_k);
        scored.into_iter().map(|(p, _)| p).collect()
    }

    fn fits(&self, cell: Cell, edges: EdgeSet, top: Option<usize>, left: Option<usize>) -> bool {
        for side in Side::ALL {
            let boundary = cell.neighbor(side, self.rows, self.cols).is_none();
            if boundary != (edges.get(side) == EdgeKind::Flat) {
                return false;
            }
        }
        if let Some(t) = top {
            if !self.edges[t].get(Side::Bottom).interlocks_with(edges.get(Side::Top)) {
                return false;
            }
        }
        if let Some(l) = left {
            if !self.edges[l].get(Side::Right).interlocks_with(edges.get(Side::Left)) {
                return false;
            }
        }
        true
    }

    fn score(&self, piece: usize, top: Option<usize>, left: Option<usize>) -> f32 {
        let Some(sigs) = self.signatures else {
            return 0.0;
        };
        let mut total = 0.0;
        if let Some(t) = top {
            total += sigs.score(t, Side::Bottom, piece);
        }
        if let Some(l) = left {
            total += sigs.score(l, Side::Right, piece);
        }
        total
    }
}
