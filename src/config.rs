use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::board::Color;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "chess.json";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub engine: Option<EngineConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Color {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct EngineConfig {
    pub name: String,
    pub path: PathBuf,
    /// Older configs put the thread count here instead of under `options`.
    #[serde(default)]
    pub threads: Option<u32>,
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// Let the engine reply automatically after a human move.
    #[serde(default)]
    pub automove: bool,
    #[serde(default = "default_engine_color")]
    pub engine_color: Side,
    #[serde(default)]
    pub options: EngineOptions,
}

fn default_depth() -> u32 {
    10
}

fn default_engine_color() -> Side {
    Side::Black
}

/// Every UCI option the client knows how to send. Unknown keys are a load
/// error rather than being forwarded blindly.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineOptions {
    #[serde(rename = "Threads")]
    pub threads: Option<u32>,
    #[serde(rename = "Hash")]
    pub hash: Option<u32>,
    #[serde(rename = "Skill Level")]
    pub skill_level: Option<u8>,
    #[serde(rename = "UCI_LimitStrength")]
    pub uci_limit_strength: Option<bool>,
    #[serde(rename = "UCI_Elo")]
    pub uci_elo: Option<u32>,
}

impl EngineOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(threads) = self.threads {
            if !(1..=1024).contains(&threads) {
                return Err(ConfigError::Invalid(format!("Threads must be 1..=1024, got {}", threads)));
            }
        }
        if let Some(hash) = self.hash {
            if hash == 0 {
                return Err(ConfigError::Invalid("Hash must be at least 1 MB".to_string()));
            }
        }
        if let Some(skill) = self.skill_level {
            if skill > 20 {
                return Err(ConfigError::Invalid(format!("Skill Level must be 0..=20, got {}", skill)));
            }
        }
        if let Some(elo) = self.uci_elo {
            if !(1320..=3190).contains(&elo) {
                return Err(ConfigError::Invalid(format!("UCI_Elo must be 1320..=3190, got {}", elo)));
            }
        }
        Ok(())
    }

    /// `setoption` lines in a fixed order.
    pub fn setoption_commands(&self) -> Vec<String> {
        let mut commands = Vec::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(value) = value {
                commands.push(format!("setoption name {} value {}", name, value));
            }
        };
        push("Threads", self.threads.map(|v| v.to_string()));
        push("Hash", self.hash.map(|v| v.to_string()));
        push("Skill Level", self.skill_level.map(|v| v.to_string()));
        push("UCI_LimitStrength", self.uci_limit_strength.map(|v| v.to_string()));
        push("UCI_Elo", self.uci_elo.map(|v| v.to_string()));
        commands
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("engine name is empty".to_string()));
        }
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("engine path is empty".to_string()));
        }
        if !(1..=64).contains(&self.depth) {
            return Err(ConfigError::Invalid(format!("depth must be 1..=64, got {}", self.depth)));
        }
        if let (Some(top), Some(option)) = (self.threads, self.options.threads) {
            if top != option {
                return Err(ConfigError::Invalid(format!(
                    "threads ({}) disagrees with options.Threads ({})",
                    top, option
                )));
            }
        }
        if self.options.uci_elo.is_some() && self.options.uci_limit_strength != Some(true) {
            return Err(ConfigError::Invalid(
                "UCI_Elo has no effect unless UCI_LimitStrength is true".to_string(),
            ));
        }
        self.effective_options().validate()
    }

    /// `options` with a top-level `threads` folded in as `Threads`.
    pub fn effective_options(&self) -> EngineOptions {
        EngineOptions {
            threads: self.options.threads.or(self.threads),
            ..self.options.clone()
        }
    }

    pub fn setoption_commands(&self) -> Vec<String> {
        self.effective_options().setoption_commands()
    }

    /// Whether the engine is the one to move when `turn` is up.
    pub fn plays(&self, turn: Color) -> bool {
        Color::from(self.engine_color) == turn
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        if let Some(engine) = &config.engine {
            engine.validate()?;
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_json(&json)
    }
}
