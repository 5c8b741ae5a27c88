//! End-to-end match scenarios through the public API.

use std::io::Write;

use rand::rngs::StdRng;
use rand::SeedableRng;

use punto_engine::engine::bot_profiles::load_profiles;
use punto_engine::engine::bot_strategy::{MoveSelector, StrategyKind};
use punto_engine::engine::game::{Match, PENALTY_LIMIT};
use punto_engine::engine::models::*;
use punto_engine::engine::simulator::{play_match, TurnRecord};
use punto_engine::games::punto::rules::{has_alignment, COORD_LIMIT, GRID_SPAN};
use punto_engine::games::punto::types::{MAX_VALUE, MIN_VALUE};
use punto_engine::games::punto::{PlayerId, WIN_RUN_LENGTH};

fn seat_bots(seed: u64, kinds: &[StrategyKind]) -> (Match, Vec<(PlayerId, Box<dyn MoveSelector>)>) {
    let mut game = Match::with_seed(kinds.len(), seed);
    let seats = kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let id = game.add_player(&format!("{}-{}", i + 1, kind), true).unwrap();
            (id, kind.build())
        })
        .collect();
    (game, seats)
}

fn run(game: &mut Match, seats: &[(PlayerId, Box<dyn MoveSelector>)], seed: u64, mut check: impl FnMut(&Match, &TurnRecord)) -> Vec<TurnRecord> {
    let seated: Vec<(PlayerId, &dyn MoveSelector)> = seats.iter().map(|(id, s)| (*id, s.as_ref())).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    play_match(game, &seated, &mut rng, |g, r| check(g, r))
}

fn assert_board_invariants(game: &Match) {
    let board = game.board();
    if let Some(bbox) = board.bounding_box() {
        assert!(bbox.width() <= GRID_SPAN && bbox.height() <= GRID_SPAN, "{bbox:?}");
    }
    for tile in board.tiles() {
        assert!((MIN_VALUE..=MAX_VALUE).contains(&tile.value));
        assert!(tile.x.abs() < COORD_LIMIT && tile.y.abs() < COORD_LIMIT);
    }
    for p in game.players() {
        assert!(p.hand.len() <= 2);
        let on_board = board.tiles_of(p.id).count();
        assert!(p.hand.len() + p.draw_pile.len() + on_board <= 18);
        assert!(p.penalties < PENALTY_LIMIT);
    }
}

#[test]
fn test_computer_strategies_play_legal_games() {
    let lineups: [&[StrategyKind]; 4] = [
        &[StrategyKind::Aggressive, StrategyKind::Defensive],
        &[StrategyKind::DefensiveV2, StrategyKind::Diffusion, StrategyKind::Random],
        &[StrategyKind::Random, StrategyKind::Random, StrategyKind::Aggressive, StrategyKind::Diffusion],
        &[StrategyKind::Diffusion, StrategyKind::DefensiveV2, StrategyKind::AggressiveV2],
    ];
    for (i, lineup) in lineups.iter().enumerate() {
        for seed in 0..5u64 {
            let (mut game, seats) = seat_bots(seed * 31 + i as u64, lineup);
            let records = run(&mut game, &seats, seed, |g, record| {
                assert_board_invariants(g);
                if record.tile.is_some() {
                    assert!(
                        !matches!(record.outcome, Outcome::Rejected | Outcome::Disqualified),
                        "{record:?}"
                    );
                }
            });

            assert_eq!(game.state(), MatchState::Finished, "lineup {i} seed {seed}");
            let last = records.last().unwrap();
            match game.finish_reason() {
                Some(FinishReason::Alignment) => {
                    let winner = game.winner().unwrap();
                    assert_eq!(last.outcome, Outcome::Won);
                    assert_eq!(last.player, winner);
                    assert!(has_alignment(game.board(), winner, WIN_RUN_LENGTH));
                }
                Some(FinishReason::Exhaustion) => assert_eq!(last.outcome, Outcome::Drawn),
                Some(FinishReason::Elimination) => assert_eq!(last.outcome, Outcome::Disqualified),
                None => panic!("finished without a reason"),
            }
        }
    }
}

#[test]
fn test_turns_rotate_in_join_order() {
    let (mut game, seats) = seat_bots(8, &[StrategyKind::Random, StrategyKind::Random, StrategyKind::Random]);
    let order: Vec<PlayerId> = seats.iter().map(|(id, _)| *id).collect();
    let records = run(&mut game, &seats, 8, |_, _| {});

    // The first seat placed the origin tile, so the second seat opens.
    let expected = order.iter().cycle().skip(1);
    for (record, &id) in records.iter().zip(expected).take(6) {
        assert_eq!(record.player, id);
    }
}

#[test]
fn test_snapshot_survives_json() {
    let (mut game, seats) = seat_bots(3, &[StrategyKind::Aggressive, StrategyKind::Random]);
    run(&mut game, &seats, 3, |_, _| {});

    let snapshot = game.snapshot();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert!(json["board"][0].get("ownerName").is_some());
    assert_eq!(json["state"], "finished");

    let back: MatchSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(back, snapshot);
    assert_eq!(back.to_board(), *game.board());
}

#[test]
fn test_finished_match_refuses_everything() {
    let (mut game, seats) = seat_bots(12, &[StrategyKind::Aggressive, StrategyKind::Aggressive]);
    run(&mut game, &seats, 12, |_, _| {});
    let winner_or_first = game.winner().unwrap_or(seats[0].0);

    let before = game.snapshot();
    assert_eq!(game.apply_move(winner_or_first, 9, 1, 1), Err(MatchError::NotInProgress));
    assert_eq!(game.forfeit_attempt(winner_or_first), Err(MatchError::NotInProgress));
    assert_eq!(game.add_player("late", false), Err(MatchError::NotAcceptingPlayers));
    assert_eq!(game.snapshot(), before);
}

#[test]
fn test_bad_moves_disqualify_in_a_three_player_match() {
    let mut game = Match::with_seed(3, 17);
    let a = game.add_player("a", false).unwrap();
    let b = game.add_player("b", false).unwrap();
    let c = game.add_player("c", false).unwrap();

    // b and c keep playing off the grid; a plays legally.
    for round in 1..=PENALTY_LIMIT {
        let expected = if round == PENALTY_LIMIT { Outcome::Disqualified } else { Outcome::Rejected };
        assert_eq!(game.apply_move(b, 1, 5, 5).unwrap(), expected);
        assert_eq!(game.apply_move(c, 1, 5, 5).unwrap(), expected);
        if game.state() != MatchState::InProgress {
            break;
        }
        let m = game.legal_moves(a).unwrap()[0];
        assert!(matches!(game.apply_move(a, m.value, m.x, m.y).unwrap(), Outcome::Placed | Outcome::Won));
    }

    assert_eq!(game.state(), MatchState::Finished);
    assert_eq!(game.winner(), Some(a));
    assert_eq!(game.finish_reason(), Some(FinishReason::Elimination));
    let gone: Vec<PlayerId> = game.eliminated().iter().map(|p| p.id).collect();
    assert_eq!(gone, vec![b, c]);
}

#[test]
fn test_profiles_file_drives_a_match() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[profiles.wall]
strategy_type = "defensive"

[profiles.spread]
strategy_type = "diffusion"
think_delay_ms = 250

[production]
hard = "spread"
"#
    )
    .unwrap();
    let profiles = load_profiles(file.path()).unwrap();

    let mut game = Match::with_seed(2, 77);
    let wall = profiles.resolve("wall").unwrap();
    let hard = profiles.resolve("hard").unwrap();
    assert_eq!(hard.strategy_type, StrategyKind::Diffusion);

    let seats = vec![
        (game.add_player("wall", true).unwrap(), wall.build()),
        (game.add_player("hard", true).unwrap(), hard.build()),
    ];
    run(&mut game, &seats, 77, |_, _| {});
    assert_eq!(game.state(), MatchState::Finished);
}
