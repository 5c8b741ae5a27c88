//! Remote play: a transport to a match authority and a session that plays
//! one seat over it.
//!
//! Transports are flaky by assumption. The session retries failed calls a
//! bounded number of times and never mutates local state on failure; the
//! authority refuses a resubmitted move once the turn has moved on.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::RngCore;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::engine::bot_strategy::MoveSelector;
use crate::engine::game::Match;
use crate::engine::models::*;
use crate::games::punto::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The call did not reach the authority. Retryable.
    Unavailable(String),
    /// The authority refused the call.
    Rejected(MatchError),
    /// Every retry failed.
    ConnectionLost { attempts: u32 },
    /// The session has no seat yet; call `join` first.
    NotJoined,
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Unavailable(_))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Unavailable(reason) => write!(f, "transport unavailable: {reason}"),
            TransportError::Rejected(e) => write!(f, "rejected by match: {e}"),
            TransportError::ConnectionLost { attempts } => {
                write!(f, "connection lost after {attempts} attempts")
            }
            TransportError::NotJoined => write!(f, "session has not joined a match"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<MatchError> for TransportError {
    fn from(e: MatchError) -> Self {
        TransportError::Rejected(e)
    }
}

/// Calls a remote match authority understands.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn connect(&mut self) -> Result<(), TransportError>;
    async fn join(&mut self, name: &str, is_computer: bool) -> Result<PlayerId, TransportError>;
    async fn poll(&mut self) -> Result<MatchSnapshot, TransportError>;
    async fn submit(&mut self, player: PlayerId, value: u8, x: i32, y: i32) -> Result<Outcome, TransportError>;
    /// Report that no move could be produced this turn.
    async fn forfeit(&mut self, player: PlayerId) -> Result<Outcome, TransportError>;
}

/// In-process transport: every clone talks to the same match.
#[derive(Clone)]
pub struct LoopbackTransport {
    game: Arc<Mutex<Match>>,
    connected: bool,
}

impl LoopbackTransport {
    pub fn new(game: Arc<Mutex<Match>>) -> Self {
        Self { game, connected: false }
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.connected {
            Ok(())
        } else {
            Err(TransportError::Unavailable("not connected".into()))
        }
    }
}

impl Transport for LoopbackTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.connected = true;
        Ok(())
    }

    async fn join(&mut self, name: &str, is_computer: bool) -> Result<PlayerId, TransportError> {
        self.ensure_connected()?;
        Ok(self.game.lock().await.add_player(name, is_computer)?)
    }

    async fn poll(&mut self) -> Result<MatchSnapshot, TransportError> {
        self.ensure_connected()?;
        Ok(self.game.lock().await.snapshot())
    }

    async fn submit(&mut self, player: PlayerId, value: u8, x: i32, y: i32) -> Result<Outcome, TransportError> {
        self.ensure_connected()?;
        Ok(self.game.lock().await.apply_move(player, value, x, y)?)
    }

    async fn forfeit(&mut self, player: PlayerId) -> Result<Outcome, TransportError> {
        self.ensure_connected()?;
        Ok(self.game.lock().await.forfeit_attempt(player)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Calls made before giving up, the first one included.
    pub attempts: u32,
    pub retry_delay: Duration,
    /// Wait between polls while another player is moving.
    pub poll_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            retry_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Call `$self.transport.$method(..)` under `$self.policy`, retrying
/// failures that never reached the authority.
macro_rules! with_retry {
    ($self:ident, $method:ident ( $($arg:expr),* )) => {{
        let op = stringify!($method);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match $self.transport.$method($($arg),*).await {
                Ok(value) => break Ok(value),
                Err(e) if e.is_retryable() && attempt < $self.policy.attempts => {
                    warn!(op, attempt, max = $self.policy.attempts, error = %e, "transport call failed, retrying");
                    tokio::time::sleep($self.policy.retry_delay).await;
                }
                Err(e) if e.is_retryable() => {
                    warn!(op, attempts = attempt, error = %e, "giving up on transport");
                    break Err(TransportError::ConnectionLost { attempts: attempt });
                }
                Err(e) => break Err(e),
            }
        }
    }};
}

/// One seat in a remote match.
pub struct RemoteSession<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    name: String,
    player: Option<PlayerId>,
}

impl<T: Transport> RemoteSession<T> {
    pub fn new(transport: T, name: impl Into<String>, policy: RetryPolicy) -> Self {
        Self { transport, policy, name: name.into(), player: None }
    }

    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }

    pub async fn connect(&mut self) -> Result<(), TransportError> {
        with_retry!(self, connect())
    }

    pub async fn join(&mut self, is_computer: bool) -> Result<PlayerId, TransportError> {
        let name = self.name.clone();
        let id = with_retry!(self, join(&name, is_computer))?;
        info!(player = %id, name = %self.name, "joined remote match");
        self.player = Some(id);
        Ok(id)
    }

    pub async fn poll(&mut self) -> Result<MatchSnapshot, TransportError> {
        with_retry!(self, poll())
    }

    pub async fn submit(&mut self, value: u8, x: i32, y: i32) -> Result<Outcome, TransportError> {
        let player = self.joined()?;
        with_retry!(self, submit(player, value, x, y))
    }

    fn joined(&self) -> Result<PlayerId, TransportError> {
        self.player.ok_or(TransportError::NotJoined)
    }

    /// Wait for each of our turns, pick a move from the board the authority
    /// reports, and submit it. Returns the last snapshot once the match is
    /// over for this seat.
    pub async fn play(
        &mut self,
        selector: &dyn MoveSelector,
        rng: &mut dyn RngCore,
    ) -> Result<MatchSnapshot, TransportError> {
        let me = self.joined()?;
        loop {
            let snapshot = self.poll().await?;
            if snapshot.state == MatchState::Finished {
                return Ok(snapshot);
            }
            if snapshot.state == MatchState::InProgress && snapshot.player(me).is_none() {
                info!(player = %me, "seat was disqualified");
                return Ok(snapshot);
            }
            if snapshot.active_player != Some(me) {
                tokio::time::sleep(self.policy.poll_interval).await;
                continue;
            }

            let board = snapshot.to_board();
            let players = snapshot.to_players();
            let Some(player) = players.iter().find(|p| p.id == me) else {
                return Ok(snapshot);
            };

            let result = match selector.select_move(&board, player, &players, rng) {
                Some(tile) => self.submit(tile.value, tile.x, tile.y).await,
                None => with_retry!(self, forfeit(me)),
            };
            match result {
                Ok(outcome) => debug!(player = %me, ?outcome, "move submitted"),
                // An earlier attempt went through before the failure was reported.
                Err(TransportError::Rejected(MatchError::NotYourTurn { .. })) => {
                    debug!(player = %me, "turn already passed");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bot_strategy::AggressiveStrategy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quick() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            retry_delay: Duration::from_millis(1),
            poll_interval: Duration::from_millis(1),
        }
    }

    /// Fails the first `failures` calls of any kind.
    struct FlakyTransport {
        inner: LoopbackTransport,
        failures: u32,
        calls: u32,
    }

    impl FlakyTransport {
        fn trip(&mut self) -> Result<(), TransportError> {
            self.calls += 1;
            if self.failures > 0 {
                self.failures -= 1;
                return Err(TransportError::Unavailable("flaky".into()));
            }
            Ok(())
        }
    }

    impl Transport for FlakyTransport {
        async fn connect(&mut self) -> Result<(), TransportError> {
            self.trip()?;
            self.inner.connect().await
        }
        async fn join(&mut self, name: &str, is_computer: bool) -> Result<PlayerId, TransportError> {
            self.trip()?;
            self.inner.join(name, is_computer).await
        }
        async fn poll(&mut self) -> Result<MatchSnapshot, TransportError> {
            self.trip()?;
            self.inner.poll().await
        }
        async fn submit(&mut self, player: PlayerId, value: u8, x: i32, y: i32) -> Result<Outcome, TransportError> {
            self.trip()?;
            self.inner.submit(player, value, x, y).await
        }
        async fn forfeit(&mut self, player: PlayerId) -> Result<Outcome, TransportError> {
            self.trip()?;
            self.inner.forfeit(player).await
        }
    }

    fn shared_match(seed: u64) -> Arc<Mutex<Match>> {
        Arc::new(Mutex::new(Match::with_seed(2, seed)))
    }

    #[tokio::test]
    async fn test_two_remote_bots_finish_a_match() {
        let game = shared_match(21);
        let mut a = RemoteSession::new(LoopbackTransport::new(game.clone()), "ann", quick());
        let mut b = RemoteSession::new(LoopbackTransport::new(game.clone()), "bob", quick());
        a.connect().await.unwrap();
        b.connect().await.unwrap();
        a.join(true).await.unwrap();
        b.join(true).await.unwrap();

        let mut rng_a = StdRng::seed_from_u64(1);
        let mut rng_b = StdRng::seed_from_u64(2);
        let (end_a, end_b) = tokio::join!(
            a.play(&AggressiveStrategy, &mut rng_a),
            b.play(&AggressiveStrategy, &mut rng_b),
        );
        let end_a = end_a.unwrap();
        let end_b = end_b.unwrap();

        assert_eq!(end_a.state, MatchState::Finished);
        assert_eq!(end_a.winner, end_b.winner);
        assert_eq!(game.lock().await.state(), MatchState::Finished);
    }

    #[tokio::test]
    async fn test_connect_survives_transient_failures() {
        let inner = LoopbackTransport::new(shared_match(1));
        let flaky = FlakyTransport { inner, failures: 2, calls: 0 };
        let mut session = RemoteSession::new(flaky, "ann", quick());
        session.connect().await.unwrap();
        assert_eq!(session.transport.calls, 3);
    }

    #[tokio::test]
    async fn test_connection_lost_after_bounded_attempts() {
        let inner = LoopbackTransport::new(shared_match(1));
        let flaky = FlakyTransport { inner, failures: 10, calls: 0 };
        let mut session = RemoteSession::new(flaky, "ann", quick());
        assert_eq!(session.connect().await, Err(TransportError::ConnectionLost { attempts: 3 }));
        assert_eq!(session.transport.calls, 3);
    }

    #[tokio::test]
    async fn test_calls_require_connect() {
        let mut transport = LoopbackTransport::new(shared_match(1));
        assert!(matches!(transport.poll().await, Err(TransportError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_session_must_join_before_playing() {
        let mut session = RemoteSession::new(LoopbackTransport::new(shared_match(2)), "ann", quick());
        session.connect().await.unwrap();
        assert_eq!(session.submit(5, 1, 0).await, Err(TransportError::NotJoined));
        let mut rng = StdRng::seed_from_u64(1);
        let played = session.play(&AggressiveStrategy, &mut rng).await;
        assert_eq!(played.map(|s| s.state), Err(TransportError::NotJoined));
        assert!(!TransportError::NotJoined.is_retryable());
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let game = shared_match(3);
        let mut a = RemoteSession::new(LoopbackTransport::new(game.clone()), "ann", quick());
        let mut again = RemoteSession::new(LoopbackTransport::new(game.clone()), "ann", quick());
        a.connect().await.unwrap();
        again.connect().await.unwrap();
        a.join(false).await.unwrap();
        assert_eq!(
            again.join(false).await,
            Err(TransportError::Rejected(MatchError::DuplicateName("ann".into())))
        );
    }

    #[tokio::test]
    async fn test_resubmitted_move_is_refused_without_penalty() {
        let game = shared_match(5);
        let mut a = RemoteSession::new(LoopbackTransport::new(game.clone()), "ann", quick());
        let mut b = RemoteSession::new(LoopbackTransport::new(game.clone()), "bob", quick());
        for s in [&mut a, &mut b] {
            s.connect().await.unwrap();
        }
        a.join(true).await.unwrap();
        let bob = b.join(true).await.unwrap();

        let tile = game.lock().await.legal_moves(bob).unwrap()[0];
        assert!(b.submit(tile.value, tile.x, tile.y).await.is_ok());
        let retry = b.submit(tile.value, tile.x, tile.y).await;
        assert!(matches!(retry, Err(TransportError::Rejected(MatchError::NotYourTurn { .. }))));
        assert_eq!(game.lock().await.player(bob).map(|p| p.penalties), Some(0));
    }
}
