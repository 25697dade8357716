#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! Groups the animation and history knobs into one [`RuntimeConfig`] that
//! can be loaded from JSON (always) or TOML (with the `config-file`
//! feature) at startup.
//!
//! ```toml
//! # dgm.toml
//! [animation]
//! duration_ms = 400
//! easing = "ease-out"
//!
//! [history]
//! max_depth = 50
//! ```
//!
//! ```rust,ignore
//! let config = RuntimeConfig::from_toml_file("dgm.toml")?;
//! let stack = CommandStack::with_config(&config);
//! ```
//!
//! Missing sections and fields fall back to their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::animation::{EasingFn, ease_in, ease_in_out, ease_out, linear};
use crate::stack::HistoryConfig;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub animation: AnimationConfig,
    pub history: HistoryConfig,
}

impl RuntimeConfig {
    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.checked()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.checked()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Check parameter ranges. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.history.max_depth == 0 {
            errors.push("history.max_depth must be at least 1".to_owned());
        }
        if self.animation.duration_ms > 60_000 {
            errors.push(format!(
                "animation.duration_ms must be at most 60000, got {}",
                self.animation.duration_ms
            ));
        }
        errors
    }

    fn checked(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Transition timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Transition length in milliseconds. Default: 250.
    pub duration_ms: u64,
    /// Animate model updates at all. Default: true.
    pub animate_updates: bool,
    /// Easing curve. Default: ease-in-out.
    pub easing: Easing,
}

impl AnimationConfig {
    /// Transition length as a [`Duration`].
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 250,
            animate_updates: true,
            easing: Easing::default(),
        }
    }
}

/// Named easing curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl Easing {
    /// The curve as a function.
    #[must_use]
    pub fn function(self) -> EasingFn {
        match self {
            Self::Linear => linear,
            Self::EaseIn => ease_in,
            Self::EaseOut => ease_out,
            Self::EaseInOut => ease_in_out,
        }
    }
}

/// Errors that can occur when loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "config-file")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
