//! Plain-text board rendering. Read-only: callers decide how owners look.

use std::fmt::Write;

use super::board::Board;
use super::rules::COORD_LIMIT;
use super::types::{PlayerId, Position};

/// Render every playable cell as a fixed-width grid.
///
/// Each tile prints as its value followed by `glyph(owner)`; empty cells
/// print as `.`. Rows go from the lowest `y` to the highest.
pub fn render_board(board: &Board, glyph: impl Fn(PlayerId) -> char) -> String {
    let range = -(COORD_LIMIT - 1)..COORD_LIMIT;
    let mut out = String::new();

    out.push_str("    ");
    for x in range.clone() {
        let _ = write!(out, "{x:>3}");
    }
    out.push('\n');

    for y in range.clone() {
        let _ = write!(out, "{y:>3} ");
        for x in range.clone() {
            match board.occupant(Position::new(x, y)) {
                Some(tile) => {
                    let _ = write!(out, " {}{}", tile.value, glyph(tile.owner));
                }
                None => out.push_str("  ."),
            }
        }
        out.push('\n');
    }
    out
}

/// Hand values as `[3, 7]`.
pub fn render_hand(hand: &[u8]) -> String {
    let values: Vec<String> = hand.iter().map(u8::to_string).collect();
    format!("[{}]", values.join(", "))
}

/// Glyph for a 1-based turn order: `A` for the first player, `B` for the second...
pub fn turn_order_glyph(turn_order: u32) -> char {
    match turn_order {
        1..=26 => char::from(b'A' + (turn_order - 1) as u8),
        _ => '?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::punto::types::Tile;

    #[test]
    fn test_render_shows_tiles_with_owner_glyph() {
        let board = Board::from_tiles([
            Tile::new(PlayerId(1), 7, 0, 0),
            Tile::new(PlayerId(2), 3, 1, 0),
        ]);
        let text = render_board(&board, |id| turn_order_glyph(id.0));
        // Header plus 11 rows.
        assert_eq!(text.lines().count(), 12);
        let origin_row = text.lines().find(|l| l.starts_with("  0 ")).unwrap();
        assert!(origin_row.contains(" 7A 3B"));
    }

    #[test]
    fn test_render_hand() {
        assert_eq!(render_hand(&[3, 7]), "[3, 7]");
        assert_eq!(render_hand(&[]), "[]");
    }

    #[test]
    fn test_turn_order_glyph() {
        assert_eq!(turn_order_glyph(1), 'A');
        assert_eq!(turn_order_glyph(4), 'D');
        assert_eq!(turn_order_glyph(0), '?');
    }
}
