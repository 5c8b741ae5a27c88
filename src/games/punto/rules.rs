//! Placement legality and alignment detection.
//!
//! Everything here is a pure function over `&Board`: the match uses it to
//! accept or reject real moves, strategies use it to simulate candidates.

use std::fmt;

use super::board::Board;
use super::types::*;

/// Tiles a player must align to win.
pub const WIN_RUN_LENGTH: usize = 4;
/// Maximum number of columns (and rows) the placed tiles may span.
pub const GRID_SPAN: i32 = 6;
/// Coordinates must lie strictly inside `(-COORD_LIMIT, COORD_LIMIT)`.
pub const COORD_LIMIT: i32 = 6;

/// The first legality rule a candidate placement breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    ValueOutOfRange { value: u8 },
    NotInHand { value: u8 },
    OutOfBounds { x: i32, y: i32 },
    NotAdjacent { x: i32, y: i32 },
    NotStronger { value: u8, existing: u8 },
    GridTooLarge { width: i32, height: i32 },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::ValueOutOfRange { value } => {
                write!(f, "tile value {value} is outside {MIN_VALUE}..={MAX_VALUE}")
            }
            PlacementError::NotInHand { value } => write!(f, "tile {value} is not in hand"),
            PlacementError::OutOfBounds { x, y } => {
                write!(f, "cell ({x}, {y}) is outside the playable area")
            }
            PlacementError::NotAdjacent { x, y } => {
                write!(f, "cell ({x}, {y}) does not touch any placed tile")
            }
            PlacementError::NotStronger { value, existing } => {
                write!(f, "tile {value} cannot cover a {existing}")
            }
            PlacementError::GridTooLarge { width, height } => write!(
                f,
                "placement would stretch the grid to {width}x{height} (max {GRID_SPAN}x{GRID_SPAN})"
            ),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Whether `pos` lies strictly inside the absolute coordinate range.
#[inline]
pub fn within_limits(pos: Position) -> bool {
    pos.x.abs() < COORD_LIMIT && pos.y.abs() < COORD_LIMIT
}

/// Check a candidate placement against the board and the player's hand.
///
/// Rules, in the order they are reported:
/// 1. Value must be in `1..=9`
/// 2. Value must be in the player's hand
/// 3. Cell must lie strictly inside `(-6, 6)` on both axes
/// 4. Some placed tile must be within Chebyshev distance 1 (an empty board never passes)
/// 5. An occupied cell can only be covered by a strictly greater value
/// 6. Board plus candidate must fit a 6x6 window
///
/// Turn ownership is the match's concern and is not checked here.
pub fn validate_placement(board: &Board, hand: &[u8], candidate: &Tile) -> Result<(), PlacementError> {
    let value = candidate.value;
    if !(MIN_VALUE..=MAX_VALUE).contains(&value) {
        return Err(PlacementError::ValueOutOfRange { value });
    }
    if !hand.contains(&value) {
        return Err(PlacementError::NotInHand { value });
    }

    let pos = candidate.position();
    if !within_limits(pos) {
        return Err(PlacementError::OutOfBounds { x: pos.x, y: pos.y });
    }

    let adjacent = board.tiles().any(|t| t.position().chebyshev(pos) <= 1);
    if !adjacent {
        return Err(PlacementError::NotAdjacent { x: pos.x, y: pos.y });
    }

    if let Some(existing) = board.occupant(pos) {
        if value <= existing.value {
            return Err(PlacementError::NotStronger { value, existing: existing.value });
        }
    }

    if let Some(bb) = board.bounding_box() {
        let grown = bb.including(pos);
        if grown.width() > GRID_SPAN || grown.height() > GRID_SPAN {
            return Err(PlacementError::GridTooLarge {
                width: grown.width(),
                height: grown.height(),
            });
        }
    }

    Ok(())
}

#[inline]
pub fn can_place(board: &Board, hand: &[u8], candidate: &Tile) -> bool {
    validate_placement(board, hand, candidate).is_ok()
}

/// Contiguous run of `owner` tiles through `origin` along `direction`,
/// ordered from the negative end to the positive end. Empty if `origin`
/// is not held by `owner`.
fn run_through(board: &Board, origin: Position, owner: PlayerId, direction: Direction) -> Vec<Tile> {
    let Some(pivot) = board.occupant(origin).filter(|t| t.owner == owner) else {
        return Vec::new();
    };
    let (dx, dy) = direction.delta();

    let mut run = Vec::new();
    let mut cursor = origin.offset(-dx, -dy);
    while let Some(tile) = board.occupant(cursor).filter(|t| t.owner == owner) {
        run.push(*tile);
        cursor = cursor.offset(-dx, -dy);
    }
    run.reverse();
    run.push(*pivot);

    cursor = origin.offset(dx, dy);
    while let Some(tile) = board.occupant(cursor).filter(|t| t.owner == owner) {
        run.push(*tile);
        cursor = cursor.offset(dx, dy);
    }
    run
}

/// Whether `player` has `run_length` contiguous tiles along any axis.
pub fn has_alignment(board: &Board, player: PlayerId, run_length: usize) -> bool {
    board.tiles_of(player).any(|tile| {
        Direction::ALL
            .iter()
            .any(|&d| run_through(board, tile.position(), player, d).len() >= run_length)
    })
}

/// `has_alignment` evaluated as if `candidate` had been played.
///
/// The candidate may belong to anyone: strategies use this both to test
/// their own runs and to check whether a move breaks an opponent's.
pub fn has_alignment_with_simulated_move(
    board: &Board,
    player: PlayerId,
    candidate: &Tile,
    run_length: usize,
) -> bool {
    has_alignment(&board.with_move(candidate), player, run_length)
}

/// Length of the longest run the candidate would sit in once played
/// (0 if it would not survive on its cell).
pub fn longest_run_through(board: &Board, candidate: &Tile) -> usize {
    let virtual_board = board.with_move(candidate);
    Direction::ALL
        .iter()
        .map(|&d| run_through(&virtual_board, candidate.position(), candidate.owner, d).len())
        .max()
        .unwrap_or(0)
}

/// Longest run `player` currently holds. Ties keep the first run found in
/// `(x, y)` board order, horizontal before vertical before diagonals.
pub fn largest_alignment(board: &Board, player: PlayerId) -> Alignment {
    let mut best = Alignment::empty();
    for tile in board.tiles_of(player) {
        for &direction in &Direction::ALL {
            let run = run_through(board, tile.position(), player, direction);
            if run.len() > best.len() {
                best = Alignment { direction, tiles: run };
            }
        }
    }
    best
}

/// Cells immediately beyond both ends of `alignment` along its direction.
///
/// Cells outside the absolute coordinate range are dropped, so the result
/// holds zero, one or two entries.
pub fn continuation_cells(board: &Board, alignment: &Alignment) -> Vec<ContinuationCell> {
    let (Some(first), Some(last)) = (alignment.first(), alignment.last()) else {
        return Vec::new();
    };
    let (dx, dy) = alignment.direction.delta();
    [first.position().offset(-dx, -dy), last.position().offset(dx, dy)]
        .into_iter()
        .filter(|&pos| within_limits(pos))
        .map(|position| ContinuationCell { position, occupant: board.occupant(position).copied() })
        .collect()
}
