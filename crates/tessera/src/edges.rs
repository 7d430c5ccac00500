//! Side and edge-shape types shared by the jigsaw partitioner, the edge
//! classifier and the backtracking solver.

/// One of the four sides of a grid piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// Serialization order: `[top, right, bottom, left]`.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }

    /// The side a neighbor shares with us.
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Grid step `(d_row, d_col)` towards the neighbor on this side.
    #[inline]
    pub fn step(self) -> (i64, i64) {
        match self {
            Side::Top => (-1, 0),
            Side::Right => (0, 1),
            Side::Bottom => (1, 0),
            Side::Left => (0, -1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

/// Shape of one side of a grid piece.
///
/// Integer codes follow the sidecar format: flat = 2, tab = 1, slot = -1, so
/// a tab and its slot are numeric negations of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Flat,
    Tab,
    Slot,
}

impl EdgeKind {
    #[inline]
    pub fn code(self) -> i8 {
        match self {
            EdgeKind::Flat => 2,
            EdgeKind::Tab => 1,
            EdgeKind::Slot => -1,
        }
    }

    /// Parse a sidecar code. `0` is accepted as flat as well.
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            2 | 0 => Some(EdgeKind::Flat),
            1 => Some(EdgeKind::Tab),
            -1 => Some(EdgeKind::Slot),
            _ => None,
        }
    }

    /// The shape a neighbor must present on the shared side.
    #[inline]
    pub fn complement(self) -> EdgeKind {
        match self {
            EdgeKind::Flat => EdgeKind::Flat,
            EdgeKind::Tab => EdgeKind::Slot,
            EdgeKind::Slot => EdgeKind::Tab,
        }
    }

    /// True only for a tab meeting a slot.
    #[inline]
    pub fn interlocks_with(self, other: EdgeKind) -> bool {
        matches!(
            (self, other),
            (EdgeKind::Tab, EdgeKind::Slot) | (EdgeKind::Slot, EdgeKind::Tab)
        )
    }
}

/// The four side shapes of one piece, indexed by [`Side`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeSet(pub [EdgeKind; 4]);

impl EdgeSet {
    pub const FLAT: EdgeSet = EdgeSet([EdgeKind::Flat; 4]);

    #[inline]
    pub fn get(&self, side: Side) -> EdgeKind {
        self.0[side.index()]
    }

    #[inline]
    pub fn set(&mut self, side: Side, kind: EdgeKind) {
        self.0[side.index()] = kind;
    }

    pub fn flat_count(&self) -> usize {
        self.0.iter().filter(|&&k| k == EdgeKind::Flat).count()
    }

    /// Sidecar codes in `[top, right, bottom, left]` order.
    pub fn codes(&self) -> [i8; 4] {
        self.0.map(EdgeKind::code)
    }

    pub fn from_codes(codes: [i8; 4]) -> Option<Self> {
        let mut set = EdgeSet::FLAT;
        for (side, code) in Side::ALL.into_iter().zip(codes) {
            set.set(side, EdgeKind::from_code(code)?);
        }
        Some(set)
    }
}
