#![forbid(unsafe_code)]

//! dgm public facade crate.
//!
//! Re-exports the model and runtime crates behind one name, adds a
//! workspace-wide error type and a subscriber helper, and offers a prelude
//! for day-to-day usage.
//!
//! ```no_run
//! use dgm::prelude::*;
//!
//! fn main() -> dgm::Result<()> {
//!     dgm::logging::init()?;
//!     let mut dispatcher = ActionDispatcher::new(CommandStack::new());
//!     dispatcher.dispatch_json(r#"{ "kind": "setModel", "newRoot": { "id": "g", "type": "graph" } }"#)?;
//!     dispatcher.on_frame(0.0);
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};

pub mod logging;

// --- Model re-exports ------------------------------------------------------

pub use dgm_model::{
    Dimension, Element, ElementKind, ElementSchema, Match, MatchResult, MatchSchema, Model,
    ModelError, ModelFactory, ModelMatcher, OwnedMatch, Point,
};

// --- Runtime re-exports ----------------------------------------------------

pub use dgm_runtime::{
    Action, ActionDispatcher, ActionHandler, ActionHandlerRegistry, AnimationConfig,
    AnimationPlayer, CancellationSource, CancellationToken, Command, CommandError,
    CommandExecutionContext, CommandStack, ConfigError, DispatchError, DispatchOutcome, Easing,
    FadeDirection, Frame, FrameScheduler, FrameStatus, HistoryConfig, ManualFrameScheduler,
    ModelAnimation, RuntimeConfig, SetModelAction, Transition, UpdateModelAction,
    UpdateModelCommand,
};

pub use logging::LoggingError;

// --- Errors ---------------------------------------------------------------

/// Top-level error type for dgm hosts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    /// The configuration file extension is not one this build can read.
    #[error("unsupported configuration format: {}", .0.display())]
    UnsupportedConfig(PathBuf),
}

/// Standard result type for dgm APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Load a [`RuntimeConfig`], choosing the format by file extension.
///
/// `.json` is always supported; `.toml` needs the `config-file` feature.
pub fn load_config(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(RuntimeConfig::from_json_file(path)?),
        #[cfg(feature = "config-file")]
        Some("toml") => Ok(RuntimeConfig::from_toml_file(path)?),
        _ => Err(Error::UnsupportedConfig(path.to_path_buf())),
    }
}

/// A dispatcher over a fresh stack built from `config`.
#[must_use]
pub fn dispatcher(config: &RuntimeConfig) -> ActionDispatcher {
    ActionDispatcher::new(CommandStack::with_config(config))
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Action, ActionDispatcher, CommandStack, DispatchOutcome, ElementSchema, Error,
        FrameStatus, MatchSchema, Model, Point, Result, RuntimeConfig, SetModelAction,
        UpdateModelAction,
    };

    pub use crate::{model, runtime};
}

pub use dgm_model as model;
pub use dgm_runtime as runtime;
