//! Placement solvers.
//!
//! - [`BacktrackSolver`]: exact grid known, edge shapes known; depth-first
//!   search over the top-K color-ranked candidates per cell.
//! - [`GreedySolver`]: no geometry; grows a square grid from a seed piece
//!   by rim-pixel similarity, either best-pair-first or breadth-first.

mod backtrack;
mod greedy;

use std::collections::BTreeMap;

pub use backtrack::{BacktrackSolver, DEFAULT_TOP_K};
pub use greedy::{
    grid_side, GreedySolver, GreedyStrategy, RimScores, DEFAULT_ACCEPTANCE_THRESHOLD,
    DEFAULT_BFS_THRESHOLD,
};

use crate::edges::Side;

/// A grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Neighbor across `side` within a `rows`×`cols` grid.
    pub fn neighbor(self, side: Side, rows: usize, cols: usize) -> Option<Cell> {
        let (dr, dc) = side.step();
        let (r, c) = (self.row as i64 + dr, self.col as i64 + dc);
        if r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
            return None;
        }
        Some(Cell::new(r as usize, c as usize))
    }

    /// Sides of this cell on the outer boundary of a `rows`×`cols` grid.
    pub fn boundary_sides(self, rows: usize, cols: usize) -> usize {
        Side::ALL
            .into_iter()
            .filter(|&side| self.neighbor(side, rows, cols).is_none())
            .count()
    }
}

/// Cell → piece assignment; at most one piece per cell and one cell per
/// piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    rows: usize,
    cols: usize,
    cells: Vec<Option<usize>>,
    owners: BTreeMap<usize, Cell>,
}

impl Placement {
    /// An empty `rows`×`cols` placement.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
            owners: BTreeMap::new(),
        }
    }

    /// Piece `i` at row-major cell `i`.
    pub fn identity(rows: usize, cols: usize) -> Self {
        let mut placement = Self::new(rows, cols);
        for i in 0..rows * cols {
            placement.place(Cell::new(i / cols, i % cols), i);
        }
        placement
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    pub fn get(&self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        self.cells[cell.row * self.cols + cell.col]
    }

    /// Put `piece` on an empty in-grid `cell`. Returns false (and changes
    /// nothing) when the cell is taken or the piece is already placed.
    pub fn place(&mut self, cell: Cell, piece: usize) -> bool {
        if !self.contains(cell) || self.get(cell).is_some() || self.owners.contains_key(&piece) {
            return false;
        }
        self.cells[cell.row * self.cols + cell.col] = Some(piece);
        self.owners.insert(piece, cell);
        true
    }

    /// Clear a cell, returning the piece it held.
    pub fn remove(&mut self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let piece = self.cells[cell.row * self.cols + cell.col].take()?;
        self.owners.remove(&piece);
        Some(piece)
    }

    pub fn cell_of(&self, piece: usize) -> Option<Cell> {
        self.owners.get(&piece).copied()
    }

    /// Number of placed pieces.
    #[inline]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// True when every cell holds a piece.
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Occupied cells with their pieces, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, usize)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, slot)| {
            slot.map(|piece| (Cell::new(i / self.cols, i % self.cols), piece))
        })
    }

    /// Empty cells, row-major.
    pub fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(move |(i, _)| Cell::new(i / self.cols, i % self.cols))
    }
}

/// Position class of a grid piece, by its number of flat sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceClass {
    Interior,
    Border,
    Corner,
    /// Three or four flat sides, only found in one-wide grids
    Strip(u8),
}

impl PieceClass {
    pub fn from_flat_count(flats: usize) -> Self {
        match flats {
            0 => PieceClass::Interior,
            1 => PieceClass::Border,
            2 => PieceClass::Corner,
            n => PieceClass::Strip(n.min(4) as u8),
        }
    }

    /// The class a piece needs to sit in `cell`.
    pub fn for_cell(cell: Cell, rows: usize, cols: usize) -> Self {
        Self::from_flat_count(cell.boundary_sides(rows, cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_rejects_duplicates() {
        let mut placement = Placement::new(2, 2);
        assert!(placement.place(Cell::new(0, 0), 3));
        assert!(!placement.place(Cell::new(0, 0), 1));
        assert!(!placement.place(Cell::new(1, 1), 3));
        assert!(!placement.place(Cell::new(2, 0), 1));
        assert_eq!(placement.len(), 1);
        assert_eq!(placement.cell_of(3), Some(Cell::new(0, 0)));
    }

    #[test]
    fn test_remove_frees_both_directions() {
        let mut placement = Placement::new(1, 2);
        placement.place(Cell::new(0, 1), 0);
        assert_eq!(placement.remove(Cell::new(0, 1)), Some(0));
        assert_eq!(placement.cell_of(0), None);
        assert!(placement.place(Cell::new(0, 0), 0));
    }

    #[test]
    fn test_identity_is_complete() {
        let placement = Placement::identity(2, 3);
        assert!(placement.is_complete());
        assert_eq!(placement.get(Cell::new(1, 2)), Some(5));
        assert_eq!(placement.iter().count(), 6);
        assert_eq!(placement.empty_cells().count(), 0);
    }

    #[test]
    fn test_cell_classes() {
        assert_eq!(PieceClass::for_cell(Cell::new(0, 0), 3, 3), PieceClass::Corner);
        assert_eq!(PieceClass::for_cell(Cell::new(0, 1), 3, 3), PieceClass::Border);
        assert_eq!(PieceClass::for_cell(Cell::new(1, 1), 3, 3), PieceClass::Interior);
        assert_eq!(PieceClass::for_cell(Cell::new(0, 0), 1, 3), PieceClass::Strip(3));
        assert_eq!(PieceClass::for_cell(Cell::new(0, 0), 1, 1), PieceClass::Strip(4));
    }
}
