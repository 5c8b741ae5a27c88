//! Named bot profiles: a strategy plus how long the bot pretends to think.
//! Loaded from TOML at runtime for the `punto` and `arena` binaries.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::bot_strategy::{MoveSelector, StrategyKind};

/// A named bot profile.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BotProfile {
    pub description: Option<String>,
    #[serde(default = "default_strategy_type")]
    pub strategy_type: StrategyKind,
    /// Pause before each move, so human opponents can follow the game.
    #[serde(default)]
    pub think_delay_ms: u64,
}

fn default_strategy_type() -> StrategyKind {
    StrategyKind::Aggressive
}

impl BotProfile {
    fn builtin(description: &str, strategy_type: StrategyKind, think_delay_ms: u64) -> Self {
        Self { description: Some(description.into()), strategy_type, think_delay_ms }
    }

    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }

    pub fn build(&self) -> Box<dyn MoveSelector> {
        self.strategy_type.build()
    }
}

/// Maps difficulty tiers to profile names.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct ProductionConfig {
    pub easy: Option<String>,
    pub medium: Option<String>,
    pub hard: Option<String>,
    pub default: Option<String>,
}

impl ProductionConfig {
    pub const TIERS: [&'static str; 4] = ["easy", "medium", "hard", "default"];

    /// Resolve a difficulty tier to a profile name.
    pub fn resolve(&self, difficulty: &str) -> Option<&str> {
        match difficulty {
            "easy" => self.easy.as_deref(),
            "medium" => self.medium.as_deref(),
            "hard" => self.hard.as_deref(),
            _ => self.default.as_deref(),
        }
    }
}

/// Top-level TOML file structure.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BotProfilesFile {
    #[serde(default)]
    pub profiles: HashMap<String, BotProfile>,
    #[serde(default)]
    pub production: ProductionConfig,
}

impl BotProfilesFile {
    /// Profiles available without any file: one per computer strategy.
    pub fn builtin() -> Self {
        let profiles = [
            ("easy", BotProfile::builtin("uniformly random legal moves", StrategyKind::Random, 500)),
            ("aggressive", BotProfile::builtin("builds its own runs", StrategyKind::Aggressive, 500)),
            ("defensive", BotProfile::builtin("caps opponents' runs of three", StrategyKind::Defensive, 500)),
            ("blocker", BotProfile::builtin("overlays runs with its strongest tile", StrategyKind::DefensiveV2, 500)),
            ("diffusion", BotProfile::builtin("spreads out and disrupts runs", StrategyKind::Diffusion, 500)),
        ]
        .into_iter()
        .map(|(name, profile)| (name.to_string(), profile))
        .collect();

        Self {
            profiles,
            production: ProductionConfig {
                easy: Some("easy".into()),
                medium: Some("aggressive".into()),
                hard: Some("diffusion".into()),
                default: Some("aggressive".into()),
            },
        }
    }

    /// Look up a profile by name, or by difficulty tier when no profile has
    /// that name.
    pub fn resolve(&self, name: &str) -> Option<&BotProfile> {
        if let Some(profile) = self.profiles.get(name) {
            return Some(profile);
        }
        if !ProductionConfig::TIERS.iter().any(|tier| *tier == name) {
            return None;
        }
        self.production.resolve(name).and_then(|p| self.profiles.get(p))
    }

    /// Tier entries pointing at profiles that do not exist.
    pub fn dangling_tiers(&self) -> Vec<&'static str> {
        ProductionConfig::TIERS
            .into_iter()
            .filter(|tier| {
                self.production
                    .resolve(tier)
                    .is_some_and(|name| !self.profiles.contains_key(name))
            })
            .collect()
    }
}

/// Load profiles from a TOML file at the given path.
pub fn load_profiles(path: &Path) -> Result<BotProfilesFile, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

/// Try to load profiles from well-known paths, returning the built-ins if
/// none is found.
pub fn load_default_profiles() -> BotProfilesFile {
    let candidates = [
        "bot_profiles.toml",
        "../bot_profiles.toml",
        "/etc/punto/bot_profiles.toml",
    ];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_profiles(p) {
                Ok(profiles) => {
                    tracing::info!(path = %p.display(), count = profiles.profiles.len(), "loaded bot profiles");
                    return profiles;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load bot profiles");
                }
            }
        }
    }
    tracing::info!("no bot_profiles.toml found, using built-in defaults");
    BotProfilesFile::builtin()
}
