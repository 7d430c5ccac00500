//! Geometry-free placement by rim-pixel similarity.
//!
//! Pieces are laid on a square grid of side `ceil(sqrt(n))`, starting from
//! the piece with the largest opaque area at the center cell.

use std::collections::VecDeque;

use rayon::prelude::*;

use super::{Cell, Placement};
use crate::edges::Side;
use crate::error::PuzzleError;
use crate::piece::Piece;
use crate::raster::Raster;

/// Piece count at which the breadth-first strategy takes over.
pub const DEFAULT_BFS_THRESHOLD: usize = 64;

/// Breadth-first expansion only accepts neighbors scoring below this.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f32 = 2500.0;

/// Smallest square grid side holding `n` pieces.
pub fn grid_side(n: usize) -> usize {
    let mut side = (n as f64).sqrt().ceil() as usize;
    while side * side < n {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= n {
        side -= 1;
    }
    side
}

/// Pairwise rim mismatch scores.
///
/// `right_of(l, r)` compares the last column of `l` with the first column
/// of `r`; `below(t, b)` the last row of `t` with the first row of `b`.
/// A score is the mean squared RGB difference over rim pixel pairs that are
/// visible in both pieces, or infinity when there is no such pair.
#[derive(Debug, Clone)]
pub struct RimScores {
    n: usize,
    right_of: Vec<f32>,
    below: Vec<f32>,
}

impl RimScores {
    /// Score every ordered pair of `pieces`, in parallel.
    pub fn compute(pieces: &[Piece]) -> Self {
        let n = pieces.len();
        let table = |f: fn(&Raster, &Raster) -> f32| -> Vec<f32> {
            (0..n)
                .into_par_iter()
                .flat_map_iter(|a| {
                    (0..n).map(move |b| {
                        if a == b {
                            f32::INFINITY
                        } else {
                            f(&pieces[a].raster, &pieces[b].raster)
                        }
                    })
                })
                .collect()
        };
        Self {
            n,
            right_of: table(horizontal_rim_score),
            below: table(vertical_rim_score),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Mismatch of putting `right` directly right of `left`.
    #[inline]
    pub fn right_of(&self, left: usize, right: usize) -> f32 {
        self.right_of[left * self.n + right]
    }

    /// Mismatch of putting `bottom` directly below `top`.
    #[inline]
    pub fn below(&self, top: usize, bottom: usize) -> f32 {
        self.below[top * self.n + bottom]
    }

    /// Mismatch of `candidate` sitting across `side` from `anchor`.
    pub fn across(&self, anchor: usize, side: Side, candidate: usize) -> f32 {
        match side {
            Side::Right => self.right_of(anchor, candidate),
            Side::Left => self.right_of(candidate, anchor),
            Side::Bottom => self.below(anchor, candidate),
            Side::Top => self.below(candidate, anchor),
        }
    }
}

fn mean_squared(pairs: impl Iterator<Item = ([u8; 4], [u8; 4])>) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for (a, b) in pairs {
        if a[3] == 0 || b[3] == 0 {
            continue;
        }
        for c in 0..3 {
            let d = a[c] as f64 - b[c] as f64;
            sum += d * d;
        }
        count += 3;
    }
    if count == 0 {
        f32::INFINITY
    } else {
        (sum / count as f64) as f32
    }
}

fn horizontal_rim_score(left: &Raster, right: &Raster) -> f32 {
    if left.width() == 0 || right.width() == 0 {
        return f32::INFINITY;
    }
    let x = left.width() - 1;
    let h = left.height().min(right.height());
    mean_squared((0..h).map(|y| (left.get(x, y), right.get(0, y))))
}

fn vertical_rim_score(top: &Raster, bottom: &Raster) -> f32 {
    if top.height() == 0 || bottom.height() == 0 {
        return f32::INFINITY;
    }
    let y = top.height() - 1;
    let w = top.width().min(bottom.width());
    mean_squared((0..w).map(|x| (top.get(x, y), bottom.get(x, 0))))
}

/// Which growth rule [`GreedySolver`] follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreedyStrategy {
    /// Re-score the whole frontier each step and commit the best pair
    BestFirst,
    /// Expand from the seed one side at a time behind an acceptance
    /// threshold, then fill leftovers in scan order
    BreadthFirst,
}

impl GreedyStrategy {
    /// Best-first below `bfs_threshold` pieces, breadth-first from there on.
    pub fn select(n: usize, bfs_threshold: usize) -> Self {
        if n < bfs_threshold {
            GreedyStrategy::BestFirst
        } else {
            GreedyStrategy::BreadthFirst
        }
    }
}

/// Places pieces without any edge metadata.
///
/// # Example
///
/// ```
/// use tessera::{GreedySolver, GreedyStrategy, Piece, Raster};
///
/// let pieces: Vec<Piece> = (0..5u8)
///     .map(|i| Piece::new(format!("p{i}"), Raster::filled(4, 4, [i * 40, 0, 0, 255])))
///     .collect();
/// let placement = GreedySolver::new(GreedyStrategy::BestFirst).solve(&pieces).unwrap();
///
/// assert_eq!((placement.rows(), placement.cols()), (3, 3));
/// assert_eq!(placement.len(), 5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GreedySolver {
    strategy: GreedyStrategy,
    acceptance_threshold: f32,
}

impl GreedySolver {
    pub fn new(strategy: GreedyStrategy) -> Self {
        Self {
            strategy,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }

    /// Set the breadth-first acceptance threshold.
    #[inline]
    pub fn acceptance_threshold(mut self, threshold: f32) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    #[inline]
    pub fn strategy(&self) -> GreedyStrategy {
        self.strategy
    }

    /// Place every piece on a `ceil(sqrt(n))`-sided square grid.
    pub fn solve(&self, pieces: &[Piece]) -> Result<Placement, PuzzleError> {
        if pieces.is_empty() {
            return Err(PuzzleError::InputInvalid("no pieces to place".into()));
        }
        let scores = RimScores::compute(pieces);
        let areas: Vec<usize> = pieces.iter().map(Piece::area).collect();
        Ok(self.solve_scored(&scores, &areas))
    }

    /// Place pieces from precomputed scores and opaque areas.
    pub fn solve_scored(&self, scores: &RimScores, areas: &[usize]) -> Placement {
        let n = areas.len();
        let side = grid_side(n);
        let mut placement = Placement::new(side, side);
        if n == 0 {
            return placement;
        }

        let mut seed = 0;
        for (i, &area) in areas.iter().enumerate() {
            if area > areas[seed] {
                seed = i;
            }
        }
        let center = Cell::new(side / 2, side / 2);
        placement.place(center, seed);

        match self.strategy {
            GreedyStrategy::BestFirst => grow_best_first(&mut placement, scores, n),
            GreedyStrategy::BreadthFirst => {
                grow_breadth_first(&mut placement, scores, n, center, self.acceptance_threshold)
            }
        }
        tracing::debug!(
            pieces = n,
            side,
            strategy = ?self.strategy,
            "greedy placement complete"
        );
        placement
    }
}

/// Mean of the finite scores of `piece` against its placed neighbors.
fn cell_score(placement: &Placement, scores: &RimScores, cell: Cell, piece: usize) -> f32 {
    let (rows, cols) = (placement.rows(), placement.cols());
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for side in Side::ALL {
        let Some(neighbor) = cell.neighbor(side, rows, cols).and_then(|c| placement.get(c)) else {
            continue;
        };
        let score = scores.across(neighbor, side.opposite(), piece);
        if score.is_finite() {
            sum += score;
            count += 1;
        }
    }
    if count == 0 {
        f32::INFINITY
    } else {
        sum / count as f32
    }
}

fn has_placed_neighbor(placement: &Placement, cell: Cell) -> bool {
    Side::ALL.into_iter().any(|side| {
        cell.neighbor(side, placement.rows(), placement.cols())
            .and_then(|c| placement.get(c))
            .is_some()
    })
}

fn grow_best_first(placement: &mut Placement, scores: &RimScores, n: usize) {
    while placement.len() < n {
        let frontier: Vec<Cell> = placement
            .empty_cells()
            .filter(|&cell| has_placed_neighbor(placement, cell))
            .collect();
        let unused: Vec<usize> = (0..n).filter(|&p| placement.cell_of(p).is_none()).collect();

        let mut best: Option<(f32, Cell, usize)> = None;
        for &cell in &frontier {
            for &piece in &unused {
                let score = cell_score(placement, scores, cell, piece);
                if best.map_or(true, |(b, _, _)| score < b) {
                    best = Some((score, cell, piece));
                }
            }
        }

        match best {
            Some((_, cell, piece)) => {
                placement.place(cell, piece);
            }
            None => {
                // No frontier: drop the next piece anywhere to keep going
                let Some(cell) = placement.empty_cells().next() else {
                    return;
                };
                tracing::debug!(piece = unused[0], "greedy growth disconnected");
                placement.place(cell, unused[0]);
            }
        }
    }
}

fn grow_breadth_first(
    placement: &mut Placement,
    scores: &RimScores,
    n: usize,
    seed: Cell,
    threshold: f32,
) {
    let (rows, cols) = (placement.rows(), placement.cols());
    let mut queue = VecDeque::from([seed]);
    while let Some(cell) = queue.pop_front() {
        let Some(anchor) = placement.get(cell) else {
            continue;
        };
        for side in Side::ALL {
            let Some(next) = cell.neighbor(side, rows, cols) else {
                continue;
            };
            if placement.get(next).is_some() {
                continue;
            }
            let mut best: Option<(f32, usize)> = None;
            for piece in (0..n).filter(|&p| placement.cell_of(p).is_none()) {
                let score = scores.across(anchor, side, piece);
                if best.map_or(true, |(b, _)| score < b) {
                    best = Some((score, piece));
                }
            }
            if let Some((score, piece)) = best {
                if score < threshold {
                    placement.place(next, piece);
                    queue.push_back(next);
                }
            }
        }
    }

    let leftovers: Vec<usize> = (0..n).filter(|&p| placement.cell_of(p).is_none()).collect();
    if !leftovers.is_empty() {
        tracing::debug!(leftovers = leftovers.len(), "filling unmatched cells in scan order");
    }
    let empty: Vec<Cell> = placement.empty_cells().collect();
    for (cell, piece) in empty.into_iter().zip(leftovers) {
        placement.place(cell, piece);
    }
}
