//! Board storage: occupied cells, bounding box and simulated placements.

use std::collections::BTreeMap;

use super::types::{PlayerId, Position, Tile};

/// Inclusive extent of the placed tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub fn around(pos: Position) -> Self {
        Self { min_x: pos.x, max_x: pos.x, min_y: pos.y, max_y: pos.y }
    }

    /// Smallest box covering both `self` and `pos`.
    pub fn including(self, pos: Position) -> Self {
        Self {
            min_x: self.min_x.min(pos.x),
            max_x: self.max_x.max(pos.x),
            min_y: self.min_y.min(pos.y),
            max_y: self.max_y.max(pos.y),
        }
    }

    /// Number of columns covered.
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    /// Number of rows covered.
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

/// The set of placed tiles, at most one per cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    tiles: BTreeMap<Position, Tile>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from tiles; later tiles replace earlier ones on the same cell.
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut board = Self::new();
        for tile in tiles {
            board.place(tile);
        }
        board
    }

    #[inline]
    pub fn occupant(&self, pos: Position) -> Option<&Tile> {
        self.tiles.get(&pos)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// All tiles in `(x, y)` order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn tiles_of(&self, owner: PlayerId) -> impl Iterator<Item = &Tile> {
        self.tiles.values().filter(move |t| t.owner == owner)
    }

    /// Whether `owner` holds the tile at `pos`.
    #[inline]
    pub fn is_owned_by(&self, pos: Position, owner: PlayerId) -> bool {
        self.tiles.get(&pos).is_some_and(|t| t.owner == owner)
    }

    /// Extent of the placed tiles, `None` while the board is empty.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut positions = self.tiles.keys();
        let first = *positions.next()?;
        Some(positions.fold(BoundingBox::around(first), |bb, &p| bb.including(p)))
    }

    /// Put a tile on its cell, returning the tile it replaced.
    pub fn place(&mut self, tile: Tile) -> Option<Tile> {
        self.tiles.insert(tile.position(), tile)
    }

    pub fn remove(&mut self, pos: Position) -> Option<Tile> {
        self.tiles.remove(&pos)
    }

    /// A copy of the board with `candidate` played on it.
    ///
    /// When the candidate lands on an occupied cell only the stronger tile
    /// survives; on equal values the candidate wins, as it was placed last.
    /// The original board is left untouched.
    pub fn with_move(&self, candidate: &Tile) -> Board {
        let mut virtual_board = self.clone();
        match self.occupant(candidate.position()) {
            Some(existing) if existing.value > candidate.value => {}
            _ => {
                virtual_board.place(*candidate);
            }
        }
        virtual_board
    }
}
