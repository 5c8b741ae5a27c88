//! Punto core types: players, positions, tiles and alignments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest tile value a player can hold.
pub const MIN_VALUE: u8 = 1;
/// Highest tile value a player can hold.
pub const MAX_VALUE: u8 = 9;

/// Stable player identifier, assigned by the match in join order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A board cell. Ordered by `(x, y)` so board iteration is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// Chebyshev distance: a cell and its 8 neighbours are all within 1.
    #[inline]
    pub fn chebyshev(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn neighbors(self) -> [Position; 8] {
        NEIGHBOR_OFFSETS.map(|(dx, dy)| self.offset(dx, dy))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The 8 cells surrounding a position.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// A numbered tile owned by a player, either on the board or proposed as a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub value: u8,
    pub owner: PlayerId,
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub fn new(owner: PlayerId, value: u8, x: i32, y: i32) -> Self {
        Self { value, owner, x, y }
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Same tile moved to another cell.
    pub fn at(self, pos: Position) -> Self {
        Self { x: pos.x, y: pos.y, ..self }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@({}, {}) by {}", self.value, self.x, self.y, self.owner)
    }
}

/// One of the four axes an alignment can run along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Horizontal,
    Vertical,
    Diagonal,
    AntiDiagonal,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::Diagonal,
        Direction::AntiDiagonal,
    ];

    /// Unit step in the positive sense of the axis.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Horizontal => (1, 0),
            Direction::Vertical => (0, 1),
            Direction::Diagonal => (1, 1),
            Direction::AntiDiagonal => (1, -1),
        }
    }
}

/// A contiguous run of same-owner tiles, ordered from the negative end of
/// `direction` to the positive end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub direction: Direction,
    pub tiles: Vec<Tile>,
}

impl Alignment {
    pub fn empty() -> Self {
        Self { direction: Direction::Horizontal, tiles: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn first(&self) -> Option<&Tile> {
        self.tiles.first()
    }

    pub fn last(&self) -> Option<&Tile> {
        self.tiles.last()
    }

    /// Middle tile of an odd-length run (for even lengths, the one just before the centre).
    pub fn middle(&self) -> Option<&Tile> {
        if self.tiles.is_empty() {
            return None;
        }
        self.tiles.get((self.tiles.len() - 1) / 2)
    }
}

/// A cell just beyond one end of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationCell {
    pub position: Position,
    pub occupant: Option<Tile>,
}

impl ContinuationCell {
    /// Whether a tile of `value` could cover this cell on strength alone.
    pub fn can_be_taken_with(&self, value: u8) -> bool {
        self.occupant.map_or(true, |t| t.value < value)
    }
}
