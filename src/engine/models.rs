//! Match-level data types: players, outcomes, errors and wire snapshots.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::games::punto::render::{render_board, render_hand, turn_order_glyph};
use crate::games::punto::{Board, PlayerId, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    WaitingForPlayers,
    InProgress,
    Finished,
}

/// Result of one submitted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Tile placed, turn passed on.
    Placed,
    /// Illegal placement: penalty recorded, turn passed on.
    Rejected,
    /// Illegal placement that reached the penalty limit; the player left the match.
    Disqualified,
    /// Tile placed and completed an alignment.
    Won,
    /// The turn passed to a player with no tiles left, which ends the match.
    Drawn,
}

/// Why a match finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Alignment,
    Elimination,
    Exhaustion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    /// Seed for tile shuffling and end-of-game tie-breaks. `None` draws from entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_max_players() -> usize {
    2
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { max_players: default_max_players(), random_seed: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_computer: bool,
    /// 1-based seat, stable for the whole match.
    pub turn_order: u32,
    pub hand: Vec<u8>,
    pub draw_pile: VecDeque<u8>,
    pub penalties: u8,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, is_computer: bool, turn_order: u32) -> Self {
        Self {
            id,
            name: name.into(),
            is_computer,
            turn_order,
            hand: Vec::new(),
            draw_pile: VecDeque::new(),
            penalties: 0,
        }
    }

    /// Move the front of the draw pile into the hand.
    pub fn draw(&mut self) -> Option<u8> {
        let value = self.draw_pile.pop_front()?;
        self.hand.push(value);
        Some(value)
    }

    /// Remove one copy of `value` from the hand.
    pub fn take_from_hand(&mut self, value: u8) -> bool {
        match self.hand.iter().position(|&v| v == value) {
            Some(idx) => {
                self.hand.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn is_out_of_tiles(&self) -> bool {
        self.hand.is_empty() && self.draw_pile.is_empty()
    }
}

/// API misuse. Never changes match state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    NotAcceptingPlayers,
    DuplicateName(String),
    NotInProgress,
    UnknownPlayer(PlayerId),
    NotYourTurn { player: PlayerId, active: PlayerId },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::NotAcceptingPlayers => write!(f, "match is not accepting players"),
            MatchError::DuplicateName(name) => write!(f, "a player named {name:?} already joined"),
            MatchError::NotInProgress => write!(f, "match is not in progress"),
            MatchError::UnknownPlayer(id) => write!(f, "unknown player {id}"),
            MatchError::NotYourTurn { player, active } => {
                write!(f, "it is {active}'s turn, not {player}'s")
            }
        }
    }
}

impl std::error::Error for MatchError {}

// ---------------------------------------------------------------------------
// Wire snapshot
// ---------------------------------------------------------------------------

/// A tile in the flat wire shape shared with remote peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTile {
    pub value: u8,
    pub x: i32,
    pub y: i32,
    pub owner_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_computer: bool,
    pub turn_order: u32,
    /// Hand tiles in wire shape; coordinates are unused and zero.
    pub hand: Vec<WireTile>,
    pub draw_pile_len: usize,
    pub penalties: u8,
}

impl PlayerView {
    pub fn from_player(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            is_computer: player.is_computer,
            turn_order: player.turn_order,
            hand: player
                .hand
                .iter()
                .map(|&value| WireTile { value, x: 0, y: 0, owner_name: player.name.clone() })
                .collect(),
            draw_pile_len: player.draw_pile.len(),
            penalties: player.penalties,
        }
    }

    pub fn hand_values(&self) -> Vec<u8> {
        self.hand.iter().map(|t| t.value).collect()
    }

    /// Rebuild a player for move selection. Draw pile contents are private,
    /// so the pile comes back empty.
    pub fn to_player(&self) -> Player {
        let mut player = Player::new(self.id, self.name.clone(), self.is_computer, self.turn_order);
        player.hand = self.hand_values();
        player.penalties = self.penalties;
        player
    }
}

/// Everything an observer may know about a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub state: MatchState,
    pub players: Vec<PlayerView>,
    pub active_player: Option<PlayerId>,
    pub board: Vec<WireTile>,
    pub winner: Option<PlayerId>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    /// Disqualified players; their tiles stay on the board.
    #[serde(default)]
    pub eliminated: Vec<PlayerView>,
}

impl MatchSnapshot {
    pub fn player(&self, id: PlayerId) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Looks up active and eliminated players alike.
    pub fn player_named(&self, name: &str) -> Option<&PlayerView> {
        self.players.iter().chain(&self.eliminated).find(|p| p.name == name)
    }

    /// Rebuild the board from wire tiles, resolving owners by name.
    /// Tiles whose owner is unknown are skipped.
    pub fn to_board(&self) -> Board {
        let owners: HashMap<&str, PlayerId> = self
            .players
            .iter()
            .chain(&self.eliminated)
            .map(|p| (p.name.as_str(), p.id))
            .collect();
        Board::from_tiles(self.board.iter().filter_map(|w| {
            let owner = *owners.get(w.owner_name.as_str())?;
            Some(Tile::new(owner, w.value, w.x, w.y))
        }))
    }

    /// Remaining players rebuilt for move selection.
    pub fn to_players(&self) -> Vec<Player> {
        self.players.iter().map(PlayerView::to_player).collect()
    }

    /// Text view: the grid, one line per player, then the match status.
    pub fn render(&self) -> String {
        let glyphs: HashMap<PlayerId, char> = self
            .players
            .iter()
            .chain(&self.eliminated)
            .map(|p| (p.id, turn_order_glyph(p.turn_order)))
            .collect();
        let mut out = render_board(&self.to_board(), |id| glyphs.get(&id).copied().unwrap_or('?'));

        for p in &self.players {
            let marker = if self.active_player == Some(p.id) { '>' } else { ' ' };
            out.push_str(&format!(
                "{marker} {} {:<12} hand {:<8} pile {:>2}  penalties {}\n",
                turn_order_glyph(p.turn_order),
                p.name,
                render_hand(&p.hand_values()),
                p.draw_pile_len,
                p.penalties,
            ));
        }
        for p in &self.eliminated {
            out.push_str(&format!("  {} {:<12} disqualified\n", turn_order_glyph(p.turn_order), p.name));
        }

        let status = match (self.state, self.winner) {
            (MatchState::WaitingForPlayers, _) => "waiting for players".to_string(),
            (MatchState::InProgress, _) => "in progress".to_string(),
            (MatchState::Finished, Some(id)) => {
                let name = self.name_of(id).unwrap_or("?");
                format!("finished, winner {name}")
            }
            (MatchState::Finished, None) => "finished, no winner".to_string(),
        };
        out.push_str(&status);
        out.push('\n');
        out
    }

    /// Name of a remaining or eliminated player.
    pub fn name_of(&self, id: PlayerId) -> Option<&str> {
        self.players
            .iter()
            .chain(&self.eliminated)
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_is_fifo() {
        let mut p = Player::new(PlayerId(1), "ann", false, 1);
        p.draw_pile = VecDeque::from(vec![4, 9, 1]);
        assert_eq!(p.draw(), Some(4));
        assert_eq!(p.draw(), Some(9));
        assert_eq!(p.hand, vec![4, 9]);
        assert_eq!(p.draw_pile.len(), 1);
    }

    #[test]
    fn test_take_from_hand_removes_one_copy() {
        let mut p = Player::new(PlayerId(1), "ann", false, 1);
        p.hand = vec![3, 3];
        assert!(p.take_from_hand(3));
        assert_eq!(p.hand, vec![3]);
        assert!(!p.take_from_hand(5));
    }

    #[test]
    fn test_wire_tile_shape() {
        let tile = WireTile { value: 7, x: -1, y: 2, owner_name: "ann".into() };
        let json = serde_json::to_value(&tile).unwrap();
        assert_eq!(json, serde_json::json!({"value": 7, "x": -1, "y": 2, "ownerName": "ann"}));
    }

    #[test]
    fn test_snapshot_board_round_trip_by_name() {
        let snapshot = MatchSnapshot {
            state: MatchState::InProgress,
            players: vec![PlayerView::from_player(&Player::new(PlayerId(3), "bo", true, 1))],
            active_player: Some(PlayerId(3)),
            board: vec![
                WireTile { value: 5, x: 0, y: 0, owner_name: "bo".into() },
                WireTile { value: 2, x: 1, y: 0, owner_name: "gone".into() },
                WireTile { value: 4, x: 2, y: 0, owner_name: "ghost".into() },
            ],
            winner: None,
            finish_reason: None,
            eliminated: vec![PlayerView::from_player(&Player::new(PlayerId(9), "gone", true, 2))],
        };
        let board = snapshot.to_board();
        assert_eq!(board.len(), 2);
        let text = snapshot.render();
        assert!(text.contains("> A bo"));
        assert!(text.contains("B gone"));
        assert!(text.ends_with("in progress\n"));
        assert_eq!(board.tiles_of(PlayerId(3)).count(), 1);
        assert_eq!(board.tiles_of(PlayerId(9)).count(), 1);
    }
}
