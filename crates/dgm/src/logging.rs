#![forbid(unsafe_code)]

//! Subscriber setup for hosts that do not install their own.
//!
//! Every crate in the workspace logs under targets that start with `dgm`:
//!
//! | Target          | Emitted by                               |
//! |-----------------|------------------------------------------|
//! | `dgm.dispatch`  | action routing, unhandled kinds          |
//! | `dgm.command`   | command execution, undo and redo spans   |
//! | `dgm.animation` | playback start, completion, supersession |
//! | `dgm.matcher`   | match statistics (trace)                 |
//! | `dgm.factory`   | element construction (trace)             |
//!
//! `RUST_LOG` overrides the default filter.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "dgm=info";

/// Subscriber installation failed, usually because one is already set.
#[derive(Debug, thiserror::Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct LoggingError(#[from] tracing_subscriber::util::TryInitError);

/// Build the filter from `RUST_LOG`, falling back to `default`.
#[must_use]
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install a global subscriber with [`DEFAULT_FILTER`].
pub fn init() -> Result<(), LoggingError> {
    init_with_filter(env_filter(DEFAULT_FILTER))
}

/// Install a global subscriber with an explicit filter.
///
/// With the `tracing-json` feature records are written as JSON lines.
pub fn init_with_filter(filter: EnvFilter) -> Result<(), LoggingError> {
    let registry = Registry::default().with(filter);

    #[cfg(feature = "tracing-json")]
    let result = registry
        .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
        .try_init();

    #[cfg(not(feature = "tracing-json"))]
    let result = registry
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();

    result.map_err(LoggingError::from)
}
