//! Move generation and the cheap per-move features strategies sort on.

use std::collections::BTreeSet;

use super::board::Board;
use super::rules::can_place;
use super::types::*;

/// Every legal placement for `player` holding `hand`, sorted by `(x, y)`
/// then value.
///
/// Candidates per distinct hand value are the union of
/// - opponent tiles weaker than the value (overlays), and
/// - the 8 neighbours of every placed tile, minus cells `player` already holds,
///
/// filtered through [`can_place`].
pub fn legal_moves(board: &Board, player: PlayerId, hand: &[u8]) -> Vec<Tile> {
    let values: BTreeSet<u8> = hand.iter().copied().collect();
    let mut moves: BTreeSet<(Position, u8)> = BTreeSet::new();

    for &value in &values {
        let overlays = board
            .tiles()
            .filter(|t| t.owner != player && t.value < value)
            .map(|t| t.position());

        let neighbours = board
            .tiles()
            .flat_map(|t| t.position().neighbors())
            .filter(|&pos| !board.is_owned_by(pos, player));

        for pos in overlays.chain(neighbours) {
            if moves.contains(&(pos, value)) {
                continue;
            }
            let candidate = Tile::new(player, value, pos.x, pos.y);
            if can_place(board, hand, &candidate) {
                moves.insert((pos, value));
            }
        }
    }

    moves
        .into_iter()
        .map(|(pos, value)| Tile::new(player, value, pos.x, pos.y))
        .collect()
}

/// Whether the move covers a weaker opponent tile.
pub fn overlays_opponent(board: &Board, candidate: &Tile) -> bool {
    board
        .occupant(candidate.position())
        .is_some_and(|t| t.owner != candidate.owner && t.value < candidate.value)
}

/// Number of the candidate owner's tiles among the 8 surrounding cells.
pub fn count_own_neighbors(board: &Board, candidate: &Tile) -> usize {
    candidate
        .position()
        .neighbors()
        .into_iter()
        .filter(|&pos| board.is_owned_by(pos, candidate.owner))
        .count()
}

/// Number of opponent 9s among the 8 surrounding cells. A 9 can never be
/// covered, so cells next to them are poor places to grow.
pub fn count_opponent_nines(board: &Board, candidate: &Tile) -> usize {
    candidate
        .position()
        .neighbors()
        .into_iter()
        .filter_map(|pos| board.occupant(pos))
        .filter(|t| t.owner != candidate.owner && t.value == MAX_VALUE)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: PlayerId = PlayerId(1);
    const B: PlayerId = PlayerId(2);

    #[test]
    fn test_empty_board_has_no_moves() {
        assert!(legal_moves(&Board::new(), A, &[5, 6]).is_empty());
    }

    #[test]
    fn test_empty_hand_has_no_moves() {
        let board = Board::from_tiles([Tile::new(A, 5, 0, 0)]);
        assert!(legal_moves(&board, B, &[]).is_empty());
    }

    #[test]
    fn test_single_seed_tile() {
        let board = Board::from_tiles([Tile::new(A, 5, 0, 0)]);

        // A weaker tile only gets the 8 neighbours.
        let weak = legal_moves(&board, B, &[3]);
        assert_eq!(weak.len(), 8);
        assert!(weak.iter().all(|t| t.position() != Position::ORIGIN));

        // A stronger tile may also cover the seed.
        let strong = legal_moves(&board, B, &[7]);
        assert_eq!(strong.len(), 9);
        assert!(strong.iter().any(|t| t.position() == Position::ORIGIN));
    }

    #[test]
    fn test_duplicate_hand_values_are_deduplicated() {
        let board = Board::from_tiles([Tile::new(A, 5, 0, 0)]);
        assert_eq!(legal_moves(&board, B, &[3, 3]).len(), 8);
        assert_eq!(legal_moves(&board, B, &[3, 4]).len(), 16);
    }

    #[test]
    fn test_own_tiles_are_not_candidates() {
        let board = Board::from_tiles([Tile::new(A, 2, 0, 0), Tile::new(A, 2, 1, 0)]);
        let moves = legal_moves(&board, A, &[9]);
        assert!(moves.iter().all(|t| !board.is_owned_by(t.position(), A)));
    }

    #[test]
    fn test_moves_sorted_by_position_then_value() {
        let board = Board::from_tiles([Tile::new(A, 1, 0, 0)]);
        let moves = legal_moves(&board, B, &[4, 2]);
        let keys: Vec<(i32, i32, u8)> = moves.iter().map(|t| (t.x, t.y, t.value)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.first(), Some(&(-1, -1, 2)));
    }

    #[test]
    fn test_all_generated_moves_are_legal() {
        let board = Board::from_tiles([
            Tile::new(A, 5, 0, 0),
            Tile::new(B, 3, 1, 0),
            Tile::new(A, 8, 2, 1),
            Tile::new(B, 9, -1, -1),
        ]);
        let hand = [4, 9];
        let moves = legal_moves(&board, A, &hand);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| can_place(&board, &hand, m)));
        // B's 3 can be covered by either value; B's 9 never.
        assert!(moves.iter().any(|m| m.position() == Position::new(1, 0) && m.value == 4));
        assert!(!moves.iter().any(|m| m.position() == Position::new(-1, -1)));
    }

    #[test]
    fn test_move_features() {
        let board = Board::from_tiles([
            Tile::new(A, 5, 0, 0),
            Tile::new(A, 2, 1, 1),
            Tile::new(B, 9, 2, 0),
            Tile::new(B, 3, 1, 0),
        ]);
        let cover = Tile::new(A, 6, 1, 0);
        assert!(overlays_opponent(&board, &cover));
        assert_eq!(count_own_neighbors(&board, &cover), 2);
        assert_eq!(count_opponent_nines(&board, &cover), 1);

        let beside = Tile::new(A, 6, 0, 1);
        assert!(!overlays_opponent(&board, &beside));
        assert_eq!(count_opponent_nines(&board, &beside), 0);
    }
}
