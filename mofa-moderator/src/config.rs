//! Moderator configuration
//!
//! Loaded from a TOML file and the environment:
//!
//! 1. `MOFA_MODERATOR_CONFIG` if set
//! 2. `<config_dir>/mofa-studio/moderator.toml`
//! 3. built-in defaults when no file exists
//!
//! `MOFA_MODERATOR_LOG_LEVEL` and `MOFA_MODERATOR_THRESHOLD` override the
//! file values.

use crate::context::PolicyOverrides;
use crate::engine::ModerationEngine;
use crate::error::{ConfigError, ConfigResult};
use crate::event::ModerationEvent;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "MOFA_MODERATOR_CONFIG";
pub const LOG_LEVEL_ENV: &str = "MOFA_MODERATOR_LOG_LEVEL";
pub const THRESHOLD_ENV: &str = "MOFA_MODERATOR_THRESHOLD";

/// Where [`ModeratorConfig::load`] found its values
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at this path, built-in defaults used
    Defaults(PathBuf),
    NoConfigDir,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                log::info!("Loaded moderator config from {}", path.display())
            }
            ConfigSource::Defaults(path) => {
                log::info!("No moderator config at {}, using defaults", path.display())
            }
            ConfigSource::NoConfigDir => {
                log::warn!("Cannot determine config directory, using defaults")
            }
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ModeratorConfig {
    pub log_level: String,
    /// Speakers used when a driver does not name its own
    pub speakers: Vec<String>,
    pub auto_mode: bool,
    pub quiet_mode: bool,
    pub policy: PolicyOverrides,
    pub advisory: AdvisoryConfig,
}

impl Default for ModeratorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            speakers: Vec::new(),
            auto_mode: true,
            quiet_mode: false,
            policy: PolicyOverrides::default(),
            advisory: AdvisoryConfig::default(),
        }
    }
}

/// Generative advisory text settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API
    pub api_url: String,
    /// Literal key or `env:VAR_NAME`
    pub api_key: String,
    pub model: String,
    pub request_timeout_secs: u64,
    /// Served whenever generated advice is unavailable
    pub fallback_text: String,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: "env:OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 20,
            fallback_text: crate::advisory::DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }
}

impl ModeratorConfig {
    /// Load from the configured location, then apply environment overrides
    ///
    /// Returns where the values came from so callers can report it once
    /// logging is up.
    pub fn load() -> ConfigResult<(Self, ConfigSource)> {
        let (mut config, source) = match Self::config_path() {
            Some(path) if path.exists() => (Self::from_path(&path)?, ConfigSource::File(path)),
            Some(path) => (Self::default(), ConfigSource::Defaults(path)),
            None => (Self::default(), ConfigSource::NoConfigDir),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok((config, source))
    }

    /// Config file location, explicit env path first
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        let mut path = dirs::config_dir()?;
        path.push("mofa-studio");
        path.push("moderator.toml");
        Some(path)
    }

    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in [`Self::load`])
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log_level = level;
        }
        if let Some(raw) = lookup(THRESHOLD_ENV) {
            let threshold = raw.trim().parse::<f64>().map_err(|e| {
                ConfigError::Invalid(format!("{} must be a number, got '{}': {}", THRESHOLD_ENV, raw, e))
            })?;
            self.policy.imbalance_score_threshold = Some(threshold);
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(threshold) = self.policy.imbalance_score_threshold {
            if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "imbalance_score_threshold must be in (0, 1], got {}",
                    threshold
                )));
            }
        }
        let holds = [
            ("imbalance_hold_seconds", self.policy.imbalance_hold_seconds),
            ("nudge_hold_seconds", self.policy.nudge_hold_seconds),
        ];
        for (name, value) in holds {
            if let Some(seconds) = value {
                if !seconds.is_finite() || seconds <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "{} must be a positive number of seconds, got {}",
                        name, seconds
                    )));
                }
            }
        }
        if self.advisory.enabled && self.advisory.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("advisory.api_url is empty".to_string()));
        }
        Ok(())
    }

    /// Build an engine with this config's policy and mode flags
    pub fn build_engine(&self, speakers: &[String]) -> ModerationEngine {
        let mut engine = ModerationEngine::new(speakers, self.policy);
        engine.send(ModerationEvent::SetAutoMode { enabled: self.auto_mode });
        engine.send(ModerationEvent::SetQuietMode { enabled: self.quiet_mode });
        engine
    }
}

/// Resolve `env:NAME` references, returning literals unchanged
pub fn resolve_secret(value: &str) -> String {
    resolve_secret_with(value, |key| std::env::var(key).ok())
}

pub fn resolve_secret_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    match value.strip_prefix("env:") {
        Some(var) => match lookup(var) {
            Some(resolved) => resolved.trim().to_string(),
            None => {
                log::warn!("Environment variable {} not set", var);
                String::new()
            }
        },
        None => value.trim().to_string(),
    }
}
