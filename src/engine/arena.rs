//! Bot-vs-bot arena runner. Games are independent and seeded, so they run
//! in parallel and the aggregate is reproducible for a given base seed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

use crate::engine::bot_strategy::MoveSelector;
use crate::engine::game::Match;
use crate::engine::models::*;
use crate::engine::simulator::play_match;
use crate::games::punto::PlayerId;

/// Mixed into each game's seed to derive the strategies' generator, so it
/// never replays the tile shuffle.
const DECISION_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Aggregated results from an arena run.
pub struct ArenaResult {
    pub num_games: usize,
    /// Strategy labels in seating order of the first game.
    pub labels: Vec<String>,
    pub wins: HashMap<String, usize>,
    pub disqualifications: HashMap<String, usize>,
    pub no_winner: usize,
    pub exhaustion_endings: usize,
    pub game_durations_ms: Vec<f64>,
    pub game_turns: Vec<usize>,
}

impl ArenaResult {
    pub fn win_rate(&self, label: &str) -> f64 {
        *self.wins.get(label).unwrap_or(&0) as f64 / self.num_games.max(1) as f64
    }

    pub fn avg_turns(&self) -> f64 {
        if self.game_turns.is_empty() {
            return 0.0;
        }
        self.game_turns.iter().sum::<usize>() as f64 / self.game_turns.len() as f64
    }

    /// Wilson score interval for the win rate.
    pub fn confidence_interval_95(&self, label: &str) -> (f64, f64) {
        let n = self.num_games;
        if n == 0 {
            return (0.0, 0.0);
        }
        let p = self.win_rate(label);
        let z = 1.96_f64;
        let denom = 1.0 + z * z / n as f64;
        let center = (p + z * z / (2.0 * n as f64)) / denom;
        let margin = z * ((p * (1.0 - p) + z * z / (4.0 * n as f64)) / n as f64).sqrt() / denom;
        ((center - margin).max(0.0), (center + margin).min(1.0))
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Arena Results ({} games)", self.num_games)];
        lines.push("=".repeat(60));
        for label in &self.labels {
            let (ci_lo, ci_hi) = self.confidence_interval_95(label);
            lines.push(format!(
                "  {:>14}: {:3} wins ({:5.1}%)  [95% CI: {:.1}%-{:.1}%]  dq={}",
                label,
                self.wins.get(label).copied().unwrap_or(0),
                self.win_rate(label) * 100.0,
                ci_lo * 100.0,
                ci_hi * 100.0,
                self.disqualifications.get(label).copied().unwrap_or(0),
            ));
        }
        lines.push(format!("  {:>14}: {}", "No winner", self.no_winner));
        lines.push(format!("  {:>14}: {}", "Out of tiles", self.exhaustion_endings));
        if !self.game_durations_ms.is_empty() {
            let total_ms = self.game_durations_ms.iter().sum::<f64>();
            let avg_ms = total_ms / self.game_durations_ms.len() as f64;
            lines.push(format!(
                "  Avg game: {:.2}ms, {:.1} turns  |  Total: {:.2}s",
                avg_ms,
                self.avg_turns(),
                total_ms / 1000.0
            ));
        }
        lines.join("\n")
    }
}

struct GameRecord {
    winner: Option<String>,
    reason: Option<FinishReason>,
    disqualified: Vec<String>,
    turns: usize,
    duration_ms: f64,
}

/// Labels as reported in the results: a repeated label gets a `#n` suffix
/// so every seat keeps its own counts.
pub fn unique_labels(strategies: &[(String, Box<dyn MoveSelector>)]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(strategies.len());
    for (label, _) in strategies {
        let mut unique = label.clone();
        let mut n = 2;
        while labels.contains(&unique) {
            unique = format!("{label}#{n}");
            n += 1;
        }
        labels.push(unique);
    }
    labels
}

/// Run `num_games` between the given strategies, one seat each, and return
/// aggregated stats. With `alternate_seats`, the seating rotates by one
/// every game so no strategy always moves first.
pub fn run_arena(
    strategies: &[(String, Box<dyn MoveSelector>)],
    num_games: usize,
    base_seed: u64,
    alternate_seats: bool,
    progress_callback: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> ArenaResult {
    let labels = unique_labels(strategies);
    let completed = AtomicUsize::new(0);

    let records: Vec<GameRecord> = (0..num_games)
        .into_par_iter()
        .map(|game_idx| {
            let rotation = if alternate_seats { game_idx } else { 0 };
            let record = play_one_game(strategies, &labels, base_seed.wrapping_add(game_idx as u64), rotation);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(cb) = progress_callback {
                cb(done, num_games);
            }
            record
        })
        .collect();

    let mut result = ArenaResult {
        num_games,
        wins: labels.iter().map(|l| (l.clone(), 0)).collect(),
        disqualifications: labels.iter().map(|l| (l.clone(), 0)).collect(),
        labels,
        no_winner: 0,
        exhaustion_endings: 0,
        game_durations_ms: Vec::with_capacity(num_games),
        game_turns: Vec::with_capacity(num_games),
    };

    for record in records {
        match record.winner {
            Some(label) => *result.wins.entry(label).or_insert(0) += 1,
            None => result.no_winner += 1,
        }
        if record.reason == Some(FinishReason::Exhaustion) {
            result.exhaustion_endings += 1;
        }
        for label in record.disqualified {
            *result.disqualifications.entry(label).or_insert(0) += 1;
        }
        result.game_durations_ms.push(record.duration_ms);
        result.game_turns.push(record.turns);
    }

    result
}

fn play_one_game(
    strategies: &[(String, Box<dyn MoveSelector>)],
    labels: &[String],
    seed: u64,
    rotation: usize,
) -> GameRecord {
    let n = strategies.len();
    let mut game = Match::with_seed(n, seed);
    let mut label_of: HashMap<PlayerId, &str> = HashMap::new();
    let mut seats: Vec<(PlayerId, &dyn MoveSelector)> = Vec::with_capacity(n);

    for seat in 0..n {
        let entry = (seat + rotation) % n;
        let (label, selector) = (&labels[entry], &strategies[entry].1);
        match game.add_player(&format!("{}-{}", seat + 1, label), true) {
            Ok(id) => {
                label_of.insert(id, label.as_str());
                seats.push((id, selector.as_ref()));
            }
            Err(e) => debug!(error = %e, "seat skipped"),
        }
    }

    let mut rng = StdRng::seed_from_u64(seed ^ DECISION_SEED_SALT);
    let t0 = Instant::now();
    let turns = play_match(&mut game, &seats, &mut rng, |_, _| {}).len();
    let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;

    let label = |id: PlayerId| label_of.get(&id).map(|l| l.to_string());
    GameRecord {
        winner: game.winner().and_then(label),
        reason: game.finish_reason(),
        disqualified: game.eliminated().iter().filter_map(|p| label(p.id)).collect(),
        turns,
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bot_strategy::{AggressiveStrategy, DiffusionStrategy, RandomStrategy};

    fn lineup() -> Vec<(String, Box<dyn MoveSelector>)> {
        vec![
            ("random".to_string(), Box::new(RandomStrategy) as Box<dyn MoveSelector>),
            ("aggressive".to_string(), Box::new(AggressiveStrategy)),
        ]
    }

    #[test]
    fn test_arena_random_vs_aggressive() {
        let result = run_arena(&lineup(), 8, 42, true, None);

        assert_eq!(result.num_games, 8);
        let total_outcomes = result.wins.values().sum::<usize>() + result.no_winner;
        assert_eq!(total_outcomes, 8);
        assert_eq!(result.game_turns.len(), 8);
        assert!(result.summary().contains("aggressive"));
    }

    #[test]
    fn test_arena_is_reproducible() {
        let a = run_arena(&lineup(), 6, 7, true, None);
        let b = run_arena(&lineup(), 6, 7, true, None);
        assert_eq!(a.wins, b.wins);
        assert_eq!(a.game_turns, b.game_turns);
    }

    #[test]
    fn test_arena_four_seats_with_progress() {
        let strategies: Vec<(String, Box<dyn MoveSelector>)> = vec![
            ("random".into(), Box::new(RandomStrategy)),
            ("aggressive".into(), Box::new(AggressiveStrategy)),
            ("diffusion".into(), Box::new(DiffusionStrategy)),
            ("random".into(), Box::new(RandomStrategy)),
        ];
        let calls = AtomicUsize::new(0);
        let progress = |_done: usize, total: usize| {
            assert_eq!(total, 4);
            calls.fetch_add(1, Ordering::Relaxed);
        };
        let result = run_arena(&strategies, 4, 1, false, Some(&progress));
        assert_eq!(calls.load(Ordering::Relaxed), 4);
        assert_eq!(result.wins.values().sum::<usize>() + result.no_winner, 4);
    }

    #[test]
    fn test_repeated_labels_keep_separate_counts() {
        let strategies: Vec<(String, Box<dyn MoveSelector>)> = vec![
            ("random".into(), Box::new(RandomStrategy)),
            ("random".into(), Box::new(RandomStrategy)),
            ("random".into(), Box::new(RandomStrategy)),
        ];
        assert_eq!(unique_labels(&strategies), vec!["random", "random#2", "random#3"]);

        let result = run_arena(&strategies, 6, 3, true, None);
        assert_eq!(result.labels, vec!["random", "random#2", "random#3"]);
        assert_eq!(result.wins.len(), 3);
        assert_eq!(result.wins.values().sum::<usize>() + result.no_winner, 6);
        let summary = result.summary();
        assert_eq!(summary.matches("random#2:").count(), 1);
        assert_eq!(summary.matches(" random:").count(), 1);
    }

    #[test]
    fn test_confidence_interval_bounds() {
        let mut result = run_arena(&lineup(), 0, 0, true, None);
        assert_eq!(result.confidence_interval_95("random"), (0.0, 0.0));

        result.num_games = 10;
        result.wins.insert("random".into(), 5);
        let (lo, hi) = result.confidence_interval_95("random");
        assert!(lo > 0.2 && lo < 0.5);
        assert!(hi > 0.5 && hi < 0.8);
    }
}
