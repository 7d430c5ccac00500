//! JSON metadata written next to the piece files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use tessera::{EdgeSet, GridLayout, JigsawPuzzle};

use crate::error::AppError;

/// Per-piece side shapes of a jigsaw puzzle
pub const EDGES_FILE: &str = "pieces_edges.json";

/// Grid geometry of a jigsaw puzzle
pub const LAYOUT_FILE: &str = "pieces_layout.json";

/// Presentation order written by `shuffle`
pub const ORDER_FILE: &str = "pieces_order.json";

/// Piece name → `[top, right, bottom, left]` edge codes
/// (flat = 2, tab = 1, slot = -1).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeSidecar(pub BTreeMap<String, [i8; 4]>);

impl EdgeSidecar {
    pub fn from_puzzle(puzzle: &JigsawPuzzle) -> Self {
        let map = puzzle
            .pieces
            .iter()
            .zip(puzzle.edges.cells())
            .map(|(piece, edges)| (piece.name.clone(), edges.codes()))
            .collect();
        Self(map)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Edge sets in the order of `names`.
    ///
    /// Every sidecar entry must name a loaded piece and every loaded piece
    /// must have an entry.
    pub fn edge_sets(&self, names: &[String]) -> Result<Vec<EdgeSet>, AppError> {
        check_listed(EDGES_FILE, self.0.keys(), names)?;

        names
            .iter()
            .map(|name| {
                let codes = self.0.get(name).ok_or_else(|| {
                    AppError::Sidecar(format!("{EDGES_FILE} has no entry for {name}"))
                })?;
                EdgeSet::from_codes(*codes).ok_or_else(|| {
                    AppError::Sidecar(format!("{name} has invalid edge codes {codes:?}"))
                })
            })
            .collect()
    }
}

/// Grid geometry of a jigsaw puzzle as persisted in `pieces_layout.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSidecar {
    pub rows: usize,
    pub cols: usize,
    pub piece_width: u32,
    pub piece_height: u32,
    pub tab_radius: u32,
    /// Names of the pieces cut from each cell, by row
    #[serde(default)]
    pub cells: Vec<Vec<String>>,
}

impl From<GridLayout> for LayoutSidecar {
    fn from(layout: GridLayout) -> Self {
        let cells = (0..layout.rows)
            .map(|row| (0..layout.cols).map(|col| layout.name(row, col)).collect())
            .collect();
        Self {
            rows: layout.rows,
            cols: layout.cols,
            piece_width: layout.piece_width,
            piece_height: layout.piece_height,
            tab_radius: layout.tab_radius,
            cells,
        }
    }
}

impl LayoutSidecar {
    /// Checked conversion back to a grid layout.
    pub fn layout(&self) -> Result<GridLayout, AppError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(AppError::Sidecar(format!(
                "{LAYOUT_FILE} has an empty {}x{} grid",
                self.rows, self.cols
            )));
        }
        if self.piece_width == 0 || self.piece_height == 0 {
            return Err(AppError::Sidecar(format!(
                "{LAYOUT_FILE} has a zero piece size {}x{}",
                self.piece_width, self.piece_height
            )));
        }
        if !self.cells.is_empty()
            && (self.cells.len() != self.rows || self.cells.iter().any(|r| r.len() != self.cols))
        {
            return Err(AppError::Sidecar(format!(
                "{LAYOUT_FILE} cell names do not form a {}x{} grid",
                self.rows, self.cols
            )));
        }
        Ok(GridLayout {
            rows: self.rows,
            cols: self.cols,
            piece_width: self.piece_width,
            piece_height: self.piece_height,
            tab_radius: self.tab_radius,
        })
    }

    /// Fail when a cell names a piece that is not present.
    pub fn check_against(&self, names: &[String]) -> Result<(), AppError> {
        check_listed(LAYOUT_FILE, self.cells.iter().flatten(), names)
    }
}

/// Piece names in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderSidecar(pub Vec<String>);

impl OrderSidecar {
    /// Fail when the order names a piece that is not present.
    pub fn check_against(&self, names: &[String]) -> Result<(), AppError> {
        check_listed(ORDER_FILE, self.0.iter(), names)
    }
}

fn check_listed<'a>(
    file: &str,
    mut listed: impl Iterator<Item = &'a String>,
    names: &[String],
) -> Result<(), AppError> {
    match listed.find(|n| !names.contains(n)) {
        Some(missing) => Err(AppError::ResourceMissing(format!(
            "{file} lists {missing}, which is not in the piece directory"
        ))),
        None => Ok(()),
    }
}
