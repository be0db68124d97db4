use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::vocabulary::BUILTIN_LANGUAGES;

const MAX_ACTION_COUNT: usize = 6;
const MAX_TURNS_LIMIT: u32 = 200;
const MAX_PLAYER_HEALTH: u32 = 10_000;
const MAX_ENEMY_TURN_DELAY_MS: u64 = 10_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_action_count")]
    pub action_count: usize,
    #[serde(default = "default_player_max_health")]
    pub player_max_health: u32,
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_enemy_turn_delay_ms")]
    pub enemy_turn_delay_ms: u64,
    #[serde(default)]
    pub vocabulary_path: Option<String>,
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_language() -> String {
    "es".to_string()
}
fn default_action_count() -> usize {
    3
}
fn default_player_max_health() -> u32 {
    100
}
fn default_max_turns() -> u32 {
    20
}
fn default_enemy_turn_delay_ms() -> u64 {
    900
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-battle")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            action_count: default_action_count(),
            player_max_health: default_player_max_health(),
            max_turns: default_max_turns(),
            enemy_turn_delay_ms: default_enemy_turn_delay_ms(),
            vocabulary_path: None,
            backend_url: None,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocab-battle")
            .join("config.toml")
    }

    /// Clamp numeric fields into playable ranges. A language without a
    /// built-in pool is only kept when a vocabulary file is configured.
    pub fn normalize(&mut self) {
        self.action_count = self.action_count.clamp(1, MAX_ACTION_COUNT);
        self.player_max_health = self.player_max_health.clamp(1, MAX_PLAYER_HEALTH);
        self.max_turns = self.max_turns.clamp(1, MAX_TURNS_LIMIT);
        self.enemy_turn_delay_ms = self.enemy_turn_delay_ms.min(MAX_ENEMY_TURN_DELAY_MS);
        if self.vocabulary_path.is_none() && !BUILTIN_LANGUAGES.contains(&self.language.as_str()) {
            self.language = default_language();
        }
        if self.backend_url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            self.backend_url = None;
        }
    }
}
