//! Match state machine: seating, turn rotation, penalties and outcomes.
//!
//! The match is the single authority over its board. Every submission is
//! checked against the active seat first; only the active player's own
//! attempts can change state, so a retried submission from a player whose
//! turn has already passed is refused without side effects.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::engine::models::*;
use crate::games::punto::movegen::legal_moves;
use crate::games::punto::rules::{has_alignment, largest_alignment, validate_placement};
use crate::games::punto::types::{MAX_VALUE, MIN_VALUE};
use crate::games::punto::{Board, PlayerId, Position, Tile, WIN_RUN_LENGTH};

/// Rejected placements a player may accumulate before being removed.
pub const PENALTY_LIMIT: u8 = 3;
/// Tiles drawn into the hand when a player joins.
pub const HAND_SIZE: usize = 2;
/// Copies of each value in a player's pool.
pub const COPIES_PER_VALUE: usize = 2;
/// Alignment a player needs to be eligible when the match runs out of tiles.
pub const EXHAUSTION_MIN_RUN: usize = 3;

pub struct Match {
    state: MatchState,
    max_players: usize,
    players: Vec<Player>,
    eliminated: Vec<Player>,
    active: usize,
    winner: Option<PlayerId>,
    finish_reason: Option<FinishReason>,
    board: Board,
    next_id: u32,
    rng: StdRng,
}

impl Match {
    pub fn new(config: &MatchConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: MatchState::WaitingForPlayers,
            max_players: config.max_players.max(1),
            players: Vec::new(),
            eliminated: Vec::new(),
            active: 0,
            winner: None,
            finish_reason: None,
            board: Board::new(),
            next_id: 1,
            rng,
        }
    }

    pub fn with_seed(max_players: usize, seed: u64) -> Self {
        Self::new(&MatchConfig { max_players, random_seed: Some(seed) })
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Remaining players in turn order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn eliminated(&self) -> &[Player] {
        &self.eliminated
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The player expected to move, while the match is in progress.
    pub fn active_player(&self) -> Option<&Player> {
        match self.state {
            MatchState::InProgress => self.players.get(self.active),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Seat a new player. Filling the last seat starts the match.
    pub fn add_player(&mut self, name: &str, is_computer: bool) -> Result<PlayerId, MatchError> {
        if self.state != MatchState::WaitingForPlayers {
            return Err(MatchError::NotAcceptingPlayers);
        }
        if self.players.iter().any(|p| p.name == name) {
            return Err(MatchError::DuplicateName(name.to_string()));
        }

        let id = PlayerId(self.next_id);
        self.next_id += 1;
        let turn_order = self.players.len() as u32 + 1;

        let mut player = Player::new(id, name, is_computer, turn_order);
        player.draw_pile = self.shuffled_pool();
        for _ in 0..HAND_SIZE {
            player.draw();
        }

        info!(player = %id, name, turn_order, is_computer, "player joined");
        self.players.push(player);

        if self.players.len() == self.max_players {
            self.start();
        }
        Ok(id)
    }

    fn shuffled_pool(&mut self) -> VecDeque<u8> {
        let mut pool: Vec<u8> = (MIN_VALUE..=MAX_VALUE)
            .flat_map(|v| std::iter::repeat(v).take(COPIES_PER_VALUE))
            .collect();
        pool.shuffle(&mut self.rng);
        pool.into()
    }

    /// Seed the origin with the first player's first hand tile and hand the
    /// turn to the next seat.
    fn start(&mut self) {
        self.state = MatchState::InProgress;

        let seeder = &mut self.players[0];
        if let Some(&value) = seeder.hand.first() {
            seeder.take_from_hand(value);
            seeder.draw();
            let tile = Tile::new(seeder.id, value, Position::ORIGIN.x, Position::ORIGIN.y);
            self.board.place(tile);
            info!(player = %tile.owner, value, "seed tile placed at origin");
        }

        self.active = 1 % self.players.len();
        info!(
            players = self.players.len(),
            first = %self.players[self.active].id,
            "match started"
        );
    }

    /// Legal placements for a seated player, whether or not it is their turn.
    pub fn legal_moves(&self, player: PlayerId) -> Result<Vec<Tile>, MatchError> {
        let p = self.player(player).ok_or(MatchError::UnknownPlayer(player))?;
        Ok(legal_moves(&self.board, p.id, &p.hand))
    }

    /// Submit a placement for the active player.
    ///
    /// Returns `Err` only when the submission is not the active player's to
    /// make; illegal placements are reported as `Rejected`/`Disqualified`
    /// outcomes with a penalty.
    pub fn apply_move(&mut self, player: PlayerId, value: u8, x: i32, y: i32) -> Result<Outcome, MatchError> {
        let idx = self.check_turn(player)?;
        let candidate = Tile::new(player, value, x, y);

        if let Err(reason) = validate_placement(&self.board, &self.players[idx].hand, &candidate) {
            warn!(player = %player, value, x, y, %reason, "placement rejected");
            return Ok(self.penalize_active());
        }

        let replaced = self.board.place(candidate);
        let actor = &mut self.players[idx];
        actor.take_from_hand(value);
        let drawn = actor.draw();
        debug!(
            player = %player,
            value, x, y,
            covered = ?replaced.map(|t| t.value),
            ?drawn,
            "tile placed"
        );

        if has_alignment(&self.board, player, WIN_RUN_LENGTH) {
            self.finish(Some(player), FinishReason::Alignment);
            return Ok(Outcome::Won);
        }

        Ok(self.advance_turn(Outcome::Placed))
    }

    /// Record that the active player produced no move at all. Counts as a
    /// rejected placement.
    pub fn forfeit_attempt(&mut self, player: PlayerId) -> Result<Outcome, MatchError> {
        self.check_turn(player)?;
        warn!(player = %player, "no placement submitted");
        Ok(self.penalize_active())
    }

    fn check_turn(&self, player: PlayerId) -> Result<usize, MatchError> {
        if self.state != MatchState::InProgress {
            return Err(MatchError::NotInProgress);
        }
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player)
            .ok_or(MatchError::UnknownPlayer(player))?;
        if idx != self.active {
            return Err(MatchError::NotYourTurn { player, active: self.players[self.active].id });
        }
        Ok(idx)
    }

    fn penalize_active(&mut self) -> Outcome {
        let idx = self.active;
        let offender = &mut self.players[idx];
        offender.penalties += 1;
        if offender.penalties < PENALTY_LIMIT {
            debug!(player = %offender.id, penalties = offender.penalties, "penalty recorded");
            return self.advance_turn(Outcome::Rejected);
        }

        let removed = self.players.remove(idx);
        info!(player = %removed.id, name = %removed.name, "player disqualified");
        self.eliminated.push(removed);

        match self.players.len() {
            0 => {
                self.finish(None, FinishReason::Elimination);
                Outcome::Disqualified
            }
            1 => {
                let last = self.players[0].id;
                self.finish(Some(last), FinishReason::Elimination);
                Outcome::Disqualified
            }
            n => {
                // The following seat slid into the removed player's index.
                self.active = idx % n;
                self.end_if_exhausted(Outcome::Disqualified)
            }
        }
    }

    fn advance_turn(&mut self, outcome: Outcome) -> Outcome {
        self.active = (self.active + 1) % self.players.len();
        self.end_if_exhausted(outcome)
    }

    /// End the match if the new active player has nothing left to play.
    /// Players holding a run of at least three are eligible; one of them is
    /// drawn at random as winner.
    fn end_if_exhausted(&mut self, outcome: Outcome) -> Outcome {
        if !self.players[self.active].is_out_of_tiles() {
            return outcome;
        }
        let eligible: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| largest_alignment(&self.board, p.id).len() >= EXHAUSTION_MIN_RUN)
            .map(|p| p.id)
            .collect();
        let winner = eligible.choose(&mut self.rng).copied();
        info!(
            player = %self.players[self.active].id,
            eligible = eligible.len(),
            "active player is out of tiles"
        );
        self.finish(winner, FinishReason::Exhaustion);
        Outcome::Drawn
    }

    fn finish(&mut self, winner: Option<PlayerId>, reason: FinishReason) {
        self.state = MatchState::Finished;
        self.winner = winner;
        self.finish_reason = Some(reason);
        match winner {
            Some(id) => info!(winner = %id, ?reason, "match finished"),
            None => info!(?reason, "match finished without a winner"),
        }
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let owner_name = |id: PlayerId| {
            self.players
                .iter()
                .chain(&self.eliminated)
                .find(|p| p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_default()
        };
        MatchSnapshot {
            state: self.state,
            players: self.players.iter().map(PlayerView::from_player).collect(),
            active_player: self.active_player().map(|p| p.id),
            board: self
                .board
                .tiles()
                .map(|t| WireTile { value: t.value, x: t.x, y: t.y, owner_name: owner_name(t.owner) })
                .collect(),
            winner: self.winner,
            finish_reason: self.finish_reason,
            eliminated: self.eliminated.iter().map(PlayerView::from_player).collect(),
        }
    }
}
