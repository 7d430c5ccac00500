//! Interlocking grid partitioner.
//!
//! Every internal side of a rows×cols grid gets one tab and one matching
//! slot. A tab is the outward half of a disc of radius `r` centered on the
//! side's midpoint; the slot on the neighbor removes the inward half of the
//! very same disc, so the two pieces tile the shared boundary exactly.
//!
//! Piece canvases are padded by `r` on all four sides so tabs have room to
//! protrude. The tab pixels carry real image content from the neighbor cell.

use rand::Rng;
use rayon::prelude::*;

use crate::edges::{EdgeKind, EdgeSet, Side};
use crate::error::PuzzleError;
use crate::piece::{piece_name, Piece};
use crate::raster::{Mask, Raster};

/// Tab radius as a fraction of the shorter body side.
pub const DEFAULT_TAB_RATIO: f32 = 0.3;

/// Largest tab ratio for which no two discs of one piece can touch.
pub const MAX_TAB_RATIO: f32 = 0.35;

/// Geometry shared by every piece of one grid puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: usize,
    pub cols: usize,
    /// Body width of every piece
    pub piece_width: u32,
    /// Body height of every piece
    pub piece_height: u32,
    /// Padding on every side of the body
    pub tab_radius: u32,
}

impl GridLayout {
    /// Width of a padded piece canvas.
    #[inline]
    pub fn canvas_width(&self) -> u32 {
        self.piece_width + 2 * self.tab_radius
    }

    /// Height of a padded piece canvas.
    #[inline]
    pub fn canvas_height(&self) -> u32 {
        self.piece_height + 2 * self.tab_radius
    }

    /// Width of the assembled puzzle area.
    #[inline]
    pub fn image_width(&self) -> u32 {
        self.piece_width * self.cols as u32
    }

    /// Height of the assembled puzzle area.
    #[inline]
    pub fn image_height(&self) -> u32 {
        self.piece_height * self.rows as u32
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major index of a cell.
    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// `(row, col)` of a row-major index.
    #[inline]
    pub fn cell_of(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// File name of the piece cut from a cell.
    pub fn name(&self, row: usize, col: usize) -> String {
        piece_name(self.index(row, col))
    }

    /// Neighbor cell across `side`, if inside the grid.
    pub fn neighbor(&self, row: usize, col: usize, side: Side) -> Option<(usize, usize)> {
        let (dr, dc) = side.step();
        let (nr, nc) = (row as i64 + dr, col as i64 + dc);
        if nr < 0 || nc < 0 || nr >= self.rows as i64 || nc >= self.cols as i64 {
            return None;
        }
        Some((nr as usize, nc as usize))
    }

    /// Recover the layout of padded `rows`×`cols` pieces from their shapes.
    ///
    /// Nothing protrudes above a top-row piece, so the deepest first opaque
    /// row over all pieces is the padding.
    pub fn from_pieces(pieces: &[Piece], rows: usize, cols: usize) -> Result<Self, PuzzleError> {
        if rows == 0 || cols == 0 {
            return Err(PuzzleError::InputInvalid(format!(
                "grid {}x{} has no cells",
                rows, cols
            )));
        }
        if pieces.len() != rows * cols {
            return Err(PuzzleError::InputInvalid(format!(
                "{} pieces cannot fill a {}x{} grid",
                pieces.len(),
                rows,
                cols
            )));
        }
        let (width, height) = (pieces[0].raster.width(), pieces[0].raster.height());
        if let Some(odd) = pieces
            .iter()
            .find(|p| (p.raster.width(), p.raster.height()) != (width, height))
        {
            return Err(PuzzleError::InputInvalid(format!(
                "{} is {}x{}, expected {}x{} like every other piece",
                odd.name,
                odd.raster.width(),
                odd.raster.height(),
                width,
                height
            )));
        }

        let tab_radius = pieces
            .iter()
            .filter_map(|p| first_opaque_row(&p.raster))
            .max()
            .unwrap_or(0);
        if tab_radius == 0 || 2 * tab_radius >= width || 2 * tab_radius >= height {
            return Err(PuzzleError::InputInvalid(format!(
                "{}x{} pieces carry no usable tab padding",
                width, height
            )));
        }
        Ok(GridLayout {
            rows,
            cols,
            piece_width: width - 2 * tab_radius,
            piece_height: height - 2 * tab_radius,
            tab_radius,
        })
    }
}

fn first_opaque_row(raster: &Raster) -> Option<u32> {
    (0..raster.height()).find(|&y| (0..raster.width()).any(|x| raster.get(x, y)[3] > 0))
}

/// Per-cell side shapes of a grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeTable {
    rows: usize,
    cols: usize,
    cells: Vec<EdgeSet>,
}

impl EdgeTable {
    /// All sides flat.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![EdgeSet::FLAT; rows * cols],
        }
    }

    /// Wrap row-major edge sets.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<EdgeSet>) -> Result<Self, PuzzleError> {
        if cells.len() != rows * cols {
            return Err(PuzzleError::InputInvalid(format!(
                "{}x{} edge table needs {} entries, got {}",
                rows,
                cols,
                rows * cols,
                cells.len()
            )));
        }
        Ok(Self { rows, cols, cells })
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
    pub fn get(&self, row: usize, col: usize) -> EdgeSet {
        self.cells[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, edges: EdgeSet) {
        self.cells[row * self.cols + col] = edges;
    }

    #[inline]
    pub fn cells(&self) -> &[EdgeSet] {
        &self.cells
    }

    /// True when outer sides are flat and every internal side interlocks
    /// with its neighbor's.
    pub fn is_consistent(&self) -> bool {
        for row in 0..self.rows {
            for col in 0..self.cols {
                let edges = self.get(row, col);
                for side in Side::ALL {
                    let (dr, dc) = side.step();
                    let (nr, nc) = (row as i64 + dr, col as i64 + dc);
                    let outside =
                        nr < 0 || nc < 0 || nr >= self.rows as i64 || nc >= self.cols as i64;
                    let kind = edges.get(side);
                    if outside {
                        if kind != EdgeKind::Flat {
                            return false;
                        }
                    } else {
                        let other = self.get(nr as usize, nc as usize).get(side.opposite());
                        if !kind.interlocks_with(other) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

/// Decide every internal side of a rows×cols grid with a fair coin.
///
/// Depth-first over cells from (0, 0) with an explicit stack. Each internal
/// edge carries an "assigned" bit so it is decided exactly once; the
/// neighbor receives the complement.
pub fn assign_edges<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> EdgeTable {
    let mut table = EdgeTable::new(rows, cols);
    if rows == 0 || cols == 0 {
        return table;
    }
    let horizontal = rows * (cols - 1);
    let mut assigned = vec![false; horizontal + (rows - 1) * cols];
    let mut visited = vec![false; rows * cols];
    let mut stack = vec![(0usize, 0usize)];
    visited[0] = true;

    // Edge between (r, c) and its right or lower neighbor
    let edge_id = |r: usize, c: usize, side: Side| -> usize {
        match side {
            Side::Right => r * (cols - 1) + c,
            Side::Left => r * (cols - 1) + c - 1,
            Side::Bottom => horizontal + r * cols + c,
            Side::Top => horizontal + (r - 1) * cols + c,
        }
    };

    while let Some((r, c)) = stack.pop() {
        for side in Side::ALL {
            let (dr, dc) = side.step();
            let (nr, nc) = (r as i64 + dr, c as i64 + dc);
            if nr < 0 || nc < 0 || nr >= rows as i64 || nc >= cols as i64 {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            let id = edge_id(r, c, side);
            if !assigned[id] {
                assigned[id] = true;
                let kind = if rng.gen_bool(0.5) {
                    EdgeKind::Tab
                } else {
                    EdgeKind::Slot
                };
                let mut own = table.get(r, c);
                own.set(side, kind);
                table.set(r, c, own);
                let mut theirs = table.get(nr, nc);
                theirs.set(side.opposite(), kind.complement());
                table.set(nr, nc, theirs);
            }
            let n = nr * cols + nc;
            if !visited[n] {
                visited[n] = true;
                stack.push((nr, nc));
            }
        }
    }
    table
}

/// A generated grid puzzle.
#[derive(Debug, Clone)]
pub struct JigsawPuzzle {
    /// Row-major; `pieces[r * cols + c]` was cut from cell (r, c)
    pub pieces: Vec<Piece>,
    pub edges: EdgeTable,
    pub layout: GridLayout,
}

/// Cuts an image into an interlocking rows×cols grid.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use tessera::{JigsawPartitioner, Raster};
///
/// let image = Raster::filled(60, 40, [200, 50, 50, 255]);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// let puzzle = JigsawPartitioner::new().generate(&image, 2, 3, &mut rng).unwrap();
///
/// assert_eq!(puzzle.pieces.len(), 6);
/// assert!(puzzle.edges.is_consistent());
/// assert_eq!(puzzle.layout.piece_width, 20);
/// assert_eq!(puzzle.layout.tab_radius, 6);
/// ```
#[derive(Debug, Clone)]
pub struct JigsawPartitioner {
    tab_ratio: f32,
}

impl Default for JigsawPartitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl JigsawPartitioner {
    pub fn new() -> Self {
        Self {
            tab_ratio: DEFAULT_TAB_RATIO,
        }
    }

    /// Set the tab radius as a fraction of the shorter body side, in
    /// `(0, MAX_TAB_RATIO]`.
    #[inline]
    pub fn tab_ratio(mut self, ratio: f32) -> Self {
        self.tab_ratio = ratio;
        self
    }

    /// Layout for cutting a `width`×`height` image into `rows`×`cols`.
    pub fn layout(
        &self,
        width: u32,
        height: u32,
        rows: usize,
        cols: usize,
    ) -> Result<GridLayout, PuzzleError> {
        if rows == 0 || cols == 0 {
            return Err(PuzzleError::InputInvalid(format!(
                "grid {}x{} has no cells",
                rows, cols
            )));
        }
        if !(self.tab_ratio > 0.0 && self.tab_ratio <= MAX_TAB_RATIO) {
            return Err(PuzzleError::InputInvalid(format!(
                "tab ratio {} outside (0, {}]",
                self.tab_ratio, MAX_TAB_RATIO
            )));
        }
        let piece_width = width / cols as u32;
        let piece_height = height / rows as u32;
        if piece_width == 0 || piece_height == 0 {
            return Err(PuzzleError::InputInvalid(format!(
                "{}x{} image is too small for a {}x{} grid",
                width, height, rows, cols
            )));
        }
        let tab_radius = (piece_width.min(piece_height) as f32 * self.tab_ratio).floor() as u32;
        if tab_radius == 0 {
            return Err(PuzzleError::InputInvalid(format!(
                "{}x{} pieces are too small for tabs",
                piece_width, piece_height
            )));
        }
        Ok(GridLayout {
            rows,
            cols,
            piece_width,
            piece_height,
            tab_radius,
        })
    }

    /// Cut `image` into a `rows`×`cols` interlocking puzzle.
    ///
    /// The right and bottom remainder strips that do not fill a whole body
    /// are left out of the puzzle.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        image: &Raster,
        rows: usize,
        cols: usize,
        rng: &mut R,
    ) -> Result<JigsawPuzzle, PuzzleError> {
        let layout = self.layout(image.width(), image.height(), rows, cols)?;
        let cropped_x = image.width() - layout.image_width();
        let cropped_y = image.height() - layout.image_height();
        if cropped_x > 0 || cropped_y > 0 {
            tracing::debug!(cropped_x, cropped_y, "remainder strip left out of the grid");
        }

        let edges = assign_edges(rows, cols, rng);
        let masks: Vec<Mask> = edges
            .cells()
            .par_iter()
            .map(|&cell| piece_mask(&layout, cell))
            .collect();
        verify_grid_coverage(&layout, &masks)?;

        let pieces: Vec<Piece> = masks
            .par_iter()
            .enumerate()
            .map(|(i, mask)| {
                let (row, col) = layout.cell_of(i);
                let raster = piece_raster(image, &layout, row, col, edges.get(row, col), mask);
                Piece::new(piece_name(i), raster)
            })
            .collect();

        tracing::info!(
            rows,
            cols,
            piece_width = layout.piece_width,
            piece_height = layout.piece_height,
            tab_radius = layout.tab_radius,
            "jigsaw partition complete"
        );
        Ok(JigsawPuzzle {
            pieces,
            edges,
            layout,
        })
    }
}

/// Disc center of `side` in canvas coordinates.
fn disc_center(layout: &GridLayout, side: Side) -> (f64, f64) {
    let r = layout.tab_radius as f64;
    let (pw, ph) = (layout.piece_width as f64, layout.piece_height as f64);
    match side {
        Side::Top => (r + pw / 2.0, r),
        Side::Right => (r + pw, r + ph / 2.0),
        Side::Bottom => (r + pw / 2.0, r + ph),
        Side::Left => (r, r + ph / 2.0),
    }
}

/// True when `(px, py)` is on the outer side of `side`'s boundary line.
fn outward(side: Side, px: f64, py: f64, cx: f64, cy: f64) -> bool {
    match side {
        Side::Top => py < cy,
        Side::Right => px > cx,
        Side::Bottom => py > cy,
        Side::Left => px < cx,
    }
}

/// Alpha shape of one piece on its padded canvas.
fn piece_mask(layout: &GridLayout, edges: EdgeSet) -> Mask {
    let r = layout.tab_radius;
    let radius2 = (r as f64) * (r as f64);
    let discs: Vec<(Side, EdgeKind, f64, f64)> = Side::ALL
        .into_iter()
        .filter(|&side| edges.get(side) != EdgeKind::Flat)
        .map(|side| {
            let (cx, cy) = disc_center(layout, side);
            (side, edges.get(side), cx, cy)
        })
        .collect();

    Mask::from_fn(layout.canvas_width(), layout.canvas_height(), |x, y| {
        let mut inside = x >= r && x < r + layout.piece_width && y >= r && y < r + layout.piece_height;
        let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
        for &(side, kind, cx, cy) in &discs {
            let d2 = (px - cx).powi(2) + (py - cy).powi(2);
            if d2 >= radius2 {
                continue;
            }
            let out = outward(side, px, py, cx, cy);
            match kind {
                EdgeKind::Tab if out => inside = true,
                EdgeKind::Slot if !out => inside = false,
                _ => {}
            }
        }
        inside
    })
}

/// Body pixels plus neighbor strips behind every tab, masked to the shape.
fn piece_raster(
    image: &Raster,
    layout: &GridLayout,
    row: usize,
    col: usize,
    edges: EdgeSet,
    mask: &Mask,
) -> Raster {
    let r = layout.tab_radius;
    let (pw, ph) = (layout.piece_width, layout.piece_height);
    let (x0, y0) = (col as i64 * pw as i64, row as i64 * ph as i64);
    let ri = r as i64;

    let mut canvas = Raster::new(layout.canvas_width(), layout.canvas_height());
    canvas.copy_from(image, x0, y0, pw, ph, ri, ri);
    for side in Side::ALL {
        if edges.get(side) != EdgeKind::Tab {
            continue;
        }
        match side {
            Side::Top => canvas.copy_from(image, x0, y0 - ri, pw, r, ri, 0),
            Side::Right => canvas.copy_from(image, x0 + pw as i64, y0, r, ph, ri + pw as i64, ri),
            Side::Bottom => canvas.copy_from(image, x0, y0 + ph as i64, pw, r, ri, ri + ph as i64),
            Side::Left => canvas.copy_from(image, x0 - ri, y0, r, ph, 0, ri),
        }
    }
    canvas.apply_mask(mask);
    canvas
}

/// Every pixel of the puzzle area must be claimed by exactly one mask.
fn verify_grid_coverage(layout: &GridLayout, masks: &[Mask]) -> Result<(), PuzzleError> {
    let (w, h) = (layout.image_width() as i64, layout.image_height() as i64);
    let r = layout.tab_radius as i64;
    let mut counts = vec![0u8; (w * h) as usize];
    let mut stray = 0usize;

    for (i, mask) in masks.iter().enumerate() {
        let (row, col) = layout.cell_of(i);
        let (ox, oy) = (
            col as i64 * layout.piece_width as i64 - r,
            row as i64 * layout.piece_height as i64 - r,
        );
        for y in 0..mask.height() {
            for x in 0..mask.width() {
                if !mask.get(x, y) {
                    continue;
                }
                let (gx, gy) = (ox + x as i64, oy + y as i64);
                if gx < 0 || gy < 0 || gx >= w || gy >= h {
                    stray += 1;
                    continue;
                }
                let slot = &mut counts[(gy * w + gx) as usize];
                *slot = slot.saturating_add(1);
            }
        }
    }

    let uncovered = counts.iter().filter(|&&c| c == 0).count();
    let overlapped = counts.iter().filter(|&&c| c > 1).count();
    if uncovered > 0 || overlapped > 0 || stray > 0 {
        return Err(PuzzleError::DegenerateTessellation(format!(
            "grid masks leave {} uncovered, {} overlapped and {} outside pixels",
            uncovered, overlapped, stray
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient(width: u32, height: u32) -> Raster {
        Raster::from_fn(width, height, |x, y| [x as u8, y as u8, (x ^ y) as u8, 255])
    }

    #[test]
    fn test_assign_edges_is_consistent() {
        for (rows, cols, seed) in [(1, 1, 0), (1, 5, 1), (4, 1, 2), (3, 4, 3), (7, 7, 4)] {
            let mut rng = StdRng::seed_from_u64(seed);
            let table = assign_edges(rows, cols, &mut rng);
            assert!(table.is_consistent(), "{rows}x{cols}");
        }
    }

    #[test]
    fn test_assign_edges_deterministic() {
        let a = assign_edges(5, 6, &mut StdRng::seed_from_u64(9));
        let b = assign_edges(5, 6, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_internal_edges_never_flat() {
        let table = assign_edges(3, 3, &mut StdRng::seed_from_u64(1));
        let center = table.get(1, 1);
        assert_eq!(center.flat_count(), 0);
        assert_eq!(table.get(0, 0).flat_count(), 2);
        assert_eq!(table.get(0, 1).flat_count(), 1);
    }

    #[test]
    fn test_layout_rejects_bad_ratio() {
        let partitioner = JigsawPartitioner::new().tab_ratio(0.5);
        assert!(matches!(
            partitioner.layout(100, 100, 2, 2),
            Err(PuzzleError::InputInvalid(_))
        ));
    }

    #[test]
    fn test_layout_rejects_tiny_pieces() {
        let partitioner = JigsawPartitioner::new();
        assert!(matches!(
            partitioner.layout(6, 6, 2, 2),
            Err(PuzzleError::InputInvalid(_))
        ));
        assert!(matches!(
            partitioner.layout(6, 6, 0, 2),
            Err(PuzzleError::InputInvalid(_))
        ));
    }

    #[test]
    fn test_tab_and_slot_shapes() {
        let layout = GridLayout {
            rows: 1,
            cols: 2,
            piece_width: 20,
            piece_height: 20,
            tab_radius: 6,
        };
        let mut edges = EdgeSet::FLAT;
        edges.set(Side::Right, EdgeKind::Tab);
        let tab = piece_mask(&layout, edges);
        edges.set(Side::Right, EdgeKind::Slot);
        let slot = piece_mask(&layout, edges);

        let body = 20 * 20;
        assert!(tab.count() > body);
        assert!(slot.count() < body);
        // What the tab adds is exactly what the slot removes
        assert_eq!(tab.count() - body, body - slot.count());
        // Tab protrudes into the right padding at mid-height
        assert!(tab.get(6 + 20, 16));
        assert!(!slot.get(6 + 19, 16));
    }

    #[test]
    fn test_generate_tiles_puzzle_area() {
        let image = gradient(61, 45);
        let mut rng = StdRng::seed_from_u64(5);
        let puzzle = JigsawPartitioner::new()
            .generate(&image, 3, 4, &mut rng)
            .unwrap();
        assert_eq!(puzzle.pieces.len(), 12);
        let area: usize = puzzle.pieces.iter().map(|p| p.area()).sum();
        assert_eq!(area, (15 * 4) * (15 * 3));
        assert_eq!(puzzle.pieces[5].name, "piece_05.png");
    }

    #[test]
    fn test_layout_recovered_from_piece_shapes() {
        let image = gradient(151, 103);
        let mut rng = StdRng::seed_from_u64(8);
        let mut puzzle = JigsawPartitioner::new()
            .generate(&image, 2, 3, &mut rng)
            .unwrap();
        puzzle.pieces.reverse();
        let found = GridLayout::from_pieces(&puzzle.pieces, 2, 3).unwrap();
        assert_eq!(found, puzzle.layout);
    }

    #[test]
    fn test_layout_recovery_rejects_plain_tiles() {
        let tiles: Vec<Piece> = (0..4)
            .map(|i| Piece::new(piece_name(i), Raster::filled(10, 10, [1, 2, 3, 255])))
            .collect();
        assert!(matches!(
            GridLayout::from_pieces(&tiles, 2, 2),
            Err(PuzzleError::InputInvalid(_))
        ));
        assert!(matches!(
            GridLayout::from_pieces(&tiles[..3], 2, 2),
            Err(PuzzleError::InputInvalid(_))
        ));
    }

    #[test]
    fn test_tab_pixels_carry_neighbor_content() {
        let image = gradient(40, 20);
        let mut rng = StdRng::seed_from_u64(2);
        let puzzle = JigsawPartitioner::new()
            .generate(&image, 1, 2, &mut rng)
            .unwrap();
        let layout = puzzle.layout;
        let r = layout.tab_radius;
        for (i, piece) in puzzle.pieces.iter().enumerate() {
            let (row, col) = layout.cell_of(i);
            for y in 0..layout.canvas_height() {
                for x in 0..layout.canvas_width() {
                    let p = piece.raster.get(x, y);
                    if p[3] == 0 {
                        continue;
                    }
                    let gx = col as u32 * layout.piece_width + x - r;
                    let gy = row as u32 * layout.piece_height + y - r;
                    assert_eq!(p, image.get(gx, gy));
                }
            }
        }
    }
}
