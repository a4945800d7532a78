//! Configuration for generation and the turn engine.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `<root>/ultan.toml`
//! 3. environment (`ULTAN_MODEL`, `ULTAN_TIMEOUT_S`, `ULTAN_BASE_URL`,
//!    `ULTAN_API_KEY`, `OPENAI_API_KEY`)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Config file name, looked up directly under the repository root.
pub const CONFIG_FILE: &str = "ultan.toml";

/// Tuning for [`Engine::process_turn`](crate::engine::Engine::process_turn) and friends.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// How many recent turns are shown to the questioner
    #[serde(default = "default_transcript_turn_window")]
    pub transcript_turn_window: usize,
    /// Codex excerpt length (characters) in the question prompt
    #[serde(default = "default_codex_excerpt_chars")]
    pub codex_excerpt_chars: usize,
    /// Extra generation attempts when a question fails validation
    #[serde(default = "default_max_question_retries")]
    pub max_question_retries: usize,
}

fn default_transcript_turn_window() -> usize {
    8
}
fn default_codex_excerpt_chars() -> usize {
    3000
}
fn default_max_question_retries() -> usize {
    2
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transcript_turn_window: default_transcript_turn_window(),
            codex_excerpt_chars: default_codex_excerpt_chars(),
            max_question_retries: default_max_question_retries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_model")]
    pub model: String,
    /// Generation timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_model() -> String {
    "gpt-5-mini".to_string()
}
fn default_timeout_secs() -> f64 {
    60.0
}
fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            base_url: default_base_url(),
            api_key: None,
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load `<root>/ultan.toml` (if present) and apply environment overrides.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            Self::from_toml(&content)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Takes the lookup as a closure so tests can feed a fixed map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("ULTAN_MODEL").filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        if let Some(raw) = lookup("ULTAN_TIMEOUT_S") {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                Error::Config(format!("ULTAN_TIMEOUT_S is not a number: {:?}", raw))
            })?;
        }
        if let Some(url) = lookup("ULTAN_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(key) = lookup("ULTAN_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .filter(|k| !k.trim().is_empty())
        {
            self.api_key = Some(key);
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        self.timeout()?;
        if self.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }
        Ok(())
    }

    /// Generation timeout; a config error unless it is a positive number of
    /// seconds that fits in a [`Duration`].
    pub fn timeout(&self) -> Result<Duration> {
        let invalid = || {
            Error::Config(format!(
                "timeout must be a positive number of seconds, got {}",
                self.timeout_secs
            ))
        };
        if self.timeout_secs <= 0.0 {
            return Err(invalid());
        }
        Duration::try_from_secs_f64(self.timeout_secs).map_err(|_| invalid())
    }

    /// API key, or a config error naming where to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            Error::Config(
                "no API key: set ULTAN_API_KEY or OPENAI_API_KEY, or api_key in ultan.toml"
                    .to_string(),
            )
        })
    }
}
