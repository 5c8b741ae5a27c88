//! Synchronous match driver: asks the active seat's selector for a move and
//! submits it, until the match finishes. Used by the arena and the `punto`
//! binary.

use rand::RngCore;
use tracing::warn;

use crate::engine::bot_strategy::MoveSelector;
use crate::engine::game::Match;
use crate::engine::models::*;
use crate::games::punto::{PlayerId, Tile};

/// Upper bound on submissions per match. A match with `n` players ends
/// well within `n * 21` turns, so hitting this means a driver bug.
pub const MAX_TURNS: usize = 500;

/// One submission and how the match judged it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRecord {
    pub player: PlayerId,
    /// `None` when the selector produced nothing and the attempt was forfeited.
    pub tile: Option<Tile>,
    pub outcome: Outcome,
}

/// Play a single turn for the active player.
pub fn play_turn(
    game: &mut Match,
    selector: &dyn MoveSelector,
    rng: &mut dyn RngCore,
) -> Result<TurnRecord, MatchError> {
    let player = game.active_player().cloned().ok_or(MatchError::NotInProgress)?;
    let tile = selector.select_move(game.board(), &player, game.players(), rng);
    let outcome = match tile {
        Some(t) => game.apply_move(player.id, t.value, t.x, t.y)?,
        None => game.forfeit_attempt(player.id)?,
    };
    Ok(TurnRecord { player: player.id, tile, outcome })
}

/// Drive `game` to completion. `seats` maps every player to its selector;
/// `observer` sees the match after each turn.
pub fn play_match(
    game: &mut Match,
    seats: &[(PlayerId, &dyn MoveSelector)],
    rng: &mut dyn RngCore,
    mut observer: impl FnMut(&Match, &TurnRecord),
) -> Vec<TurnRecord> {
    let mut records = Vec::new();

    for _ in 0..MAX_TURNS {
        let Some(active) = game.active_player().map(|p| p.id) else {
            return records;
        };
        let Some(&(_, selector)) = seats.iter().find(|(id, _)| *id == active) else {
            warn!(player = %active, "no selector seated for active player");
            return records;
        };

        match play_turn(game, selector, rng) {
            Ok(record) => {
                observer(game, &record);
                records.push(record);
            }
            Err(e) => {
                warn!(error = %e, "turn could not be played");
                return records;
            }
        }
    }

    warn!(turns = MAX_TURNS, "turn limit reached before the match finished");
    records
}
