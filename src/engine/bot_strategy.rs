//! Move selectors: the computer strategies and the manual (human) player.
//!
//! Every computer strategy is a priority cascade over the legal moves of
//! the current hand. The first tier that yields a move wins; when none do,
//! the strongest tile is played on a randomly chosen legal cell.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::input::{parse_coords, MoveInput, StdinInput};
use crate::engine::models::Player;
use crate::games::punto::movegen::{count_opponent_nines, count_own_neighbors, overlays_opponent};
use crate::games::punto::rules::{
    continuation_cells, has_alignment, has_alignment_with_simulated_move, largest_alignment,
    longest_run_through,
};
use crate::games::punto::{can_place, legal_moves, Board, PlayerId, Position, Tile, WIN_RUN_LENGTH};

/// Run length an opponent must hold before defensive tiers react.
pub const THREAT_RUN_LENGTH: usize = 3;

/// Chooses a placement for `player`. `players` lists everyone still in the
/// match, `player` included. `None` means no move could be produced.
pub trait MoveSelector: Send + Sync {
    fn name(&self) -> &'static str;

    fn select_move(
        &self,
        board: &Board,
        player: &Player,
        players: &[Player],
        rng: &mut dyn RngCore,
    ) -> Option<Tile>;
}

// ---------------------------------------------------------------------------
// Shared tiers
// ---------------------------------------------------------------------------

/// Opponents ordered by how soon they play after `player`.
pub fn opponents_by_distance<'a>(player: &Player, players: &'a [Player]) -> Vec<&'a Player> {
    let mut opponents: Vec<&Player> = players.iter().filter(|p| p.id != player.id).collect();
    opponents.sort_by_key(|o| (o.turn_order <= player.turn_order, o.turn_order));
    opponents
}

/// First move whose own run reaches `run_length` once played.
fn building_move(board: &Board, moves: &[Tile], run_length: usize) -> Option<Tile> {
    moves
        .iter()
        .find(|m| longest_run_through(board, m) >= run_length)
        .copied()
}

/// Highest-value legal move; ties are broken with `rng`.
fn strongest_move(moves: &[Tile], rng: &mut dyn RngCore) -> Option<Tile> {
    let top = moves.iter().map(|m| m.value).max()?;
    let best: Vec<&Tile> = moves.iter().filter(|m| m.value == top).collect();
    best.choose(rng).map(|m| **m)
}

fn chosen(strategy: &str, tier: &str, tile: Tile) -> Option<Tile> {
    debug!(strategy, tier, player = %tile.owner, value = tile.value, x = tile.x, y = tile.y, "move selected");
    Some(tile)
}

/// The tail shared by every cascade: build 3, build 2, strongest tile.
fn build_or_fallback(strategy: &str, board: &Board, moves: &[Tile], rng: &mut dyn RngCore) -> Option<Tile> {
    if let Some(m) = building_move(board, moves, 3) {
        return chosen(strategy, "build_3", m);
    }
    if let Some(m) = building_move(board, moves, 2) {
        return chosen(strategy, "build_2", m);
    }
    let m = strongest_move(moves, rng)?;
    chosen(strategy, "fallback", m)
}

// ---------------------------------------------------------------------------
// Random
// ---------------------------------------------------------------------------

/// Uniform over the legal moves.
pub struct RandomStrategy;

impl MoveSelector for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn select_move(&self, board: &Board, player: &Player, _players: &[Player], rng: &mut dyn RngCore) -> Option<Tile> {
        legal_moves(board, player.id, &player.hand).choose(rng).copied()
    }
}

// ---------------------------------------------------------------------------
// Aggressive
// ---------------------------------------------------------------------------

/// Win, else extend its own runs, never looking at opponents.
pub struct AggressiveStrategy;

impl MoveSelector for AggressiveStrategy {
    fn name(&self) -> &'static str {
        "aggressive"
    }

    fn select_move(&self, board: &Board, player: &Player, _players: &[Player], rng: &mut dyn RngCore) -> Option<Tile> {
        let moves = legal_moves(board, player.id, &player.hand);
        if let Some(m) = building_move(board, &moves, WIN_RUN_LENGTH) {
            return chosen(self.name(), "win", m);
        }
        build_or_fallback(self.name(), board, &moves, rng)
    }
}

// ---------------------------------------------------------------------------
// Aggressive v2
// ---------------------------------------------------------------------------

/// Like [`AggressiveStrategy`], but commits to one hand tile at a time: the
/// first tile (in hand order) that can win, build 3 or build 2 is played.
/// Otherwise a random tile goes on its first legal cell.
pub struct AggressiveV2Strategy;

impl MoveSelector for AggressiveV2Strategy {
    fn name(&self) -> &'static str {
        "aggressive_v2"
    }

    fn select_move(&self, board: &Board, player: &Player, _players: &[Player], rng: &mut dyn RngCore) -> Option<Tile> {
        let moves = legal_moves(board, player.id, &player.hand);
        for &value in &player.hand {
            let with_value: Vec<Tile> = moves.iter().filter(|m| m.value == value).copied().collect();
            for (tier, run_length) in [("win", WIN_RUN_LENGTH), ("build_3", 3), ("build_2", 2)] {
                if let Some(m) = building_move(board, &with_value, run_length) {
                    return chosen(self.name(), tier, m);
                }
            }
        }

        let value = *player.hand.choose(rng)?;
        let m = moves.iter().find(|m| m.value == value).copied()?;
        chosen(self.name(), "fallback", m)
    }
}

// ---------------------------------------------------------------------------
// Defensive
// ---------------------------------------------------------------------------

/// Win, else knock the nearest threatening opponent back below three,
/// else build. Overlays are tried before open cells.
pub struct DefensiveStrategy;

impl MoveSelector for DefensiveStrategy {
    fn name(&self) -> &'static str {
        "defensive"
    }

    fn select_move(&self, board: &Board, player: &Player, players: &[Player], rng: &mut dyn RngCore) -> Option<Tile> {
        let mut moves = legal_moves(board, player.id, &player.hand);
        moves.sort_by_key(|m| !overlays_opponent(board, m));

        if let Some(m) = building_move(board, &moves, WIN_RUN_LENGTH) {
            return chosen(self.name(), "win", m);
        }

        for opponent in opponents_by_distance(player, players) {
            if !has_alignment(board, opponent.id, THREAT_RUN_LENGTH) {
                continue;
            }
            let cap = moves
                .iter()
                .find(|m| !has_alignment_with_simulated_move(board, opponent.id, m, THREAT_RUN_LENGTH));
            if let Some(&m) = cap {
                return chosen(self.name(), "cap_opponent", m);
            }
        }

        build_or_fallback(self.name(), board, &moves, rng)
    }
}

// ---------------------------------------------------------------------------
// Defensive v2
// ---------------------------------------------------------------------------

/// Targets an opponent's run of exactly three with the strongest tile in
/// hand: its middle, then its ends, then the cells that would extend it.
pub struct DefensiveV2Strategy;

impl DefensiveV2Strategy {
    fn block(board: &Board, player: &Player, opponent: PlayerId, strongest: u8) -> Option<Tile> {
        let run = largest_alignment(board, opponent);
        if run.len() != THREAT_RUN_LENGTH {
            return None;
        }

        let attempt = |pos: Position| {
            let candidate = Tile::new(player.id, strongest, pos.x, pos.y);
            can_place(board, &player.hand, &candidate).then_some(candidate)
        };

        let on_run = [run.middle(), run.first(), run.last()];
        if let Some(m) = on_run.into_iter().flatten().find_map(|t| attempt(t.position())) {
            return Some(m);
        }

        continuation_cells(board, &run)
            .into_iter()
            .filter(|cell| cell.can_be_taken_with(strongest))
            .find_map(|cell| attempt(cell.position))
    }
}

impl MoveSelector for DefensiveV2Strategy {
    fn name(&self) -> &'static str {
        "defensive_v2"
    }

    fn select_move(&self, board: &Board, player: &Player, players: &[Player], rng: &mut dyn RngCore) -> Option<Tile> {
        let strongest = *player.hand.iter().max()?;
        let moves = legal_moves(board, player.id, &player.hand);

        if let Some(m) = building_move(board, &moves, WIN_RUN_LENGTH) {
            return chosen(self.name(), "win", m);
        }

        for opponent in opponents_by_distance(player, players) {
            if let Some(m) = Self::block(board, player, opponent.id, strongest) {
                return chosen(self.name(), "block_run", m);
            }
        }

        build_or_fallback(self.name(), board, &moves, rng)
    }
}

// ---------------------------------------------------------------------------
// Diffusion
// ---------------------------------------------------------------------------

/// Spreads out: prefers covering opponents and staying near its own tiles
/// while keeping away from opponent nines, which cannot be covered.
pub struct DiffusionStrategy;

impl DiffusionStrategy {
    fn ranked_moves(board: &Board, player: &Player) -> Vec<Tile> {
        let mut moves = legal_moves(board, player.id, &player.hand);
        moves.sort_by_key(|m| {
            (
                std::cmp::Reverse(overlays_opponent(board, m)),
                std::cmp::Reverse(count_own_neighbors(board, m)),
                count_opponent_nines(board, m),
            )
        });
        moves
    }

    fn disrupt(board: &Board, moves: &[Tile], opponent: PlayerId) -> Option<(Tile, &'static str)> {
        let run = largest_alignment(board, opponent);
        if run.len() < THREAT_RUN_LENGTH {
            return None;
        }

        if let Some(middle) = run.middle().map(Tile::position) {
            if let Some(&m) = moves.iter().find(|m| m.position() == middle) {
                return Some((m, "midpoint"));
            }
        }

        let breaking = moves
            .iter()
            .find(|m| !has_alignment_with_simulated_move(board, opponent, m, THREAT_RUN_LENGTH));
        if let Some(&m) = breaking {
            return Some((m, "break_run"));
        }

        // Strongest tile beyond either end; the first of equals in ranked order.
        let beyond: Vec<Position> = continuation_cells(board, &run).iter().map(|c| c.position).collect();
        moves
            .iter()
            .rev()
            .filter(|m| beyond.contains(&m.position()))
            .max_by_key(|m| m.value)
            .map(|&m| (m, "continuation"))
    }
}

impl MoveSelector for DiffusionStrategy {
    fn name(&self) -> &'static str {
        "diffusion"
    }

    fn select_move(&self, board: &Board, player: &Player, players: &[Player], rng: &mut dyn RngCore) -> Option<Tile> {
        let moves = Self::ranked_moves(board, player);

        if let Some(m) = building_move(board, &moves, WIN_RUN_LENGTH) {
            return chosen(self.name(), "win", m);
        }

        for opponent in opponents_by_distance(player, players) {
            if let Some((m, tier)) = Self::disrupt(board, &moves, opponent.id) {
                return chosen(self.name(), tier, m);
            }
        }

        build_or_fallback(self.name(), board, &moves, rng)
    }
}

// ---------------------------------------------------------------------------
// Manual
// ---------------------------------------------------------------------------

/// Asks a human for a tile value, then for `x,y`.
///
/// The value is asked again until it is in hand and the position until it
/// parses. With `require_legal`, the position is also asked again until the
/// placement is legal; otherwise the match judges it.
pub struct ManualStrategy {
    input: Mutex<Box<dyn MoveInput + Send>>,
    require_legal: bool,
}

impl ManualStrategy {
    pub fn new(input: Box<dyn MoveInput + Send>, require_legal: bool) -> Self {
        Self { input: Mutex::new(input), require_legal }
    }

    pub fn stdin(require_legal: bool) -> Self {
        Self::new(Box::new(StdinInput), require_legal)
    }
}

impl MoveSelector for ManualStrategy {
    fn name(&self) -> &'static str {
        if self.require_legal {
            "manual_strict"
        } else {
            "manual"
        }
    }

    fn select_move(&self, board: &Board, player: &Player, _players: &[Player], _rng: &mut dyn RngCore) -> Option<Tile> {
        let mut input = self.input.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let hand = player.hand.iter().map(u8::to_string).collect::<Vec<_>>().join(", ");
        let value = loop {
            let line = input.read_line(&format!("{}, pick a tile [{}]: ", player.name, hand))?;
            match line.trim().parse::<u8>() {
                Ok(v) if player.hand.contains(&v) => break v,
                _ => input.notify(&format!("{:?} is not a tile in your hand", line.trim())),
            }
        };

        loop {
            let line = input.read_line("position x,y: ")?;
            let Some((x, y)) = parse_coords(&line) else {
                input.notify("expected a position like 1,-2");
                continue;
            };
            let candidate = Tile::new(player.id, value, x, y);
            if self.require_legal && !can_place(board, &player.hand, &candidate) {
                input.notify(&format!("{value} cannot be placed at {x},{y}"));
                continue;
            }
            return Some(candidate);
        }
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Random,
    Aggressive,
    AggressiveV2,
    Defensive,
    DefensiveV2,
    Diffusion,
    Manual,
    ManualStrict,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 8] = [
        StrategyKind::Random,
        StrategyKind::Aggressive,
        StrategyKind::AggressiveV2,
        StrategyKind::Defensive,
        StrategyKind::DefensiveV2,
        StrategyKind::Diffusion,
        StrategyKind::Manual,
        StrategyKind::ManualStrict,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Random => "random",
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::AggressiveV2 => "aggressive_v2",
            StrategyKind::Defensive => "defensive",
            StrategyKind::DefensiveV2 => "defensive_v2",
            StrategyKind::Diffusion => "diffusion",
            StrategyKind::Manual => "manual",
            StrategyKind::ManualStrict => "manual_strict",
        }
    }

    pub fn is_computer(self) -> bool {
        !matches!(self, StrategyKind::Manual | StrategyKind::ManualStrict)
    }

    /// Build the selector. Manual kinds read from stdin.
    pub fn build(self) -> Box<dyn MoveSelector> {
        match self {
            StrategyKind::Random => Box::new(RandomStrategy),
            StrategyKind::Aggressive => Box::new(AggressiveStrategy),
            StrategyKind::AggressiveV2 => Box::new(AggressiveV2Strategy),
            StrategyKind::Defensive => Box::new(DefensiveStrategy),
            StrategyKind::DefensiveV2 => Box::new(DefensiveV2Strategy),
            StrategyKind::Diffusion => Box::new(DiffusionStrategy),
            StrategyKind::Manual => Box::new(ManualStrategy::stdin(false)),
            StrategyKind::ManualStrict => Box::new(ManualStrategy::stdin(true)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown strategy {s:?}"))
    }
}
