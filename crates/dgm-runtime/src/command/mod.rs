#![forbid(unsafe_code)]

//! Undoable model commands.
//!
//! A [`Command`] turns an action into a root transition. Each command owns
//! the snapshots it needs to go back and forth, so undo and redo never
//! recompute anything.
//!
//! # State machine
//!
//! ```text
//! Uninitialized --execute--> Executed --undo--> Undone --redo--> Redone
//!                                                 ^                |
//!                                                 +------undo------+
//! ```
//!
//! Calls that do not match the current state fail with
//! [`CommandError::InvalidState`] and leave the command untouched.
//!
//! # Invariants
//!
//! - `execute()` followed by `undo()` returns the root that was current
//!   before `execute()`.
//! - `undo()` followed by `redo()` returns the root `execute()` committed.
//! - Roots are immutable snapshots; a command never mutates one in place.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dgm_model::{Model, ModelError, ModelFactory};
use web_time::{Duration, Instant};

use crate::animation::{EasingFn, Transition, ease_in_out};

mod set_model;
mod update;

pub use set_model::SetModelCommand;
pub use update::{UpdateModelCommand, apply_matches};

/// Default transition length.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(250);

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandSource {
    /// Built by application code.
    #[default]
    Programmatic,
    /// Triggered by a local user gesture.
    User,
    /// Decoded from a server message.
    Server,
}

/// Metadata attached to every command for tracing and UI display.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Human-readable description (e.g., "Update model").
    pub description: String,
    /// When the command was created.
    pub timestamp: Instant,
    /// Who triggered the command.
    pub source: CommandSource,
}

impl CommandMetadata {
    /// Create metadata with the given description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            timestamp: Instant::now(),
            source: CommandSource::default(),
        }
    }

    /// Set the command source.
    #[must_use]
    pub fn with_source(mut self, source: CommandSource) -> Self {
        self.source = source;
        self
    }

    /// Size in bytes for memory accounting.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.description.len()
    }
}

impl Default for CommandMetadata {
    fn default() -> Self {
        Self::new("Unknown")
    }
}

/// Lifecycle position of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Uninitialized,
    Executed,
    Undone,
    Redone,
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Executed => "executed",
            Self::Undone => "undone",
            Self::Redone => "redone",
        })
    }
}

/// Errors raised by commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// The operation is not allowed in the command's current state.
    #[error("cannot {operation} {command} in state {state}")]
    InvalidState {
        command: &'static str,
        operation: &'static str,
        state: CommandState,
    },
    /// The action carries nothing the command can act on.
    #[error("invalid action: {0}")]
    InvalidAction(String),
    /// The incoming model or diff is malformed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result of command operations.
pub type CommandResult = Result<CommandOutcome, CommandError>;

/// What a command produced: the root to show now and, optionally, a
/// transition to play towards the committed root.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub root: Arc<Model>,
    pub transition: Option<Transition>,
}

impl CommandOutcome {
    /// Show `root`, no animation.
    #[must_use]
    pub fn root(root: Arc<Model>) -> Self {
        Self {
            root,
            transition: None,
        }
    }

    /// Show `start` and animate towards `transition.target`.
    #[must_use]
    pub fn animated(start: Arc<Model>, transition: Transition) -> Self {
        Self {
            root: start,
            transition: Some(transition),
        }
    }

    /// The root that is authoritative once any animation has finished.
    #[must_use]
    pub fn committed_root(&self) -> &Arc<Model> {
        self.transition
            .as_ref()
            .map_or(&self.root, |t| &t.target)
    }
}

/// Everything a command may read while it runs.
#[derive(Debug, Clone)]
pub struct CommandExecutionContext<'a> {
    /// The current committed root.
    pub root: Arc<Model>,
    pub factory: &'a ModelFactory,
    /// Length of any transition the command starts.
    pub duration: Duration,
    pub easing: EasingFn,
    /// Global switch; commands may still decline to animate.
    pub animations_enabled: bool,
}

impl<'a> CommandExecutionContext<'a> {
    /// Context with default timing.
    #[must_use]
    pub fn new(root: Arc<Model>, factory: &'a ModelFactory) -> Self {
        Self {
            root,
            factory,
            duration: DEFAULT_DURATION,
            easing: ease_in_out,
            animations_enabled: true,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub fn with_animations(mut self, enabled: bool) -> Self {
        self.animations_enabled = enabled;
        self
    }
}

/// A reversible root transition.
pub trait Command: Send {
    /// Apply the command for the first time.
    fn execute(&mut self, ctx: &CommandExecutionContext<'_>) -> CommandResult;

    /// Revert to the root that preceded `execute`.
    fn undo(&mut self, ctx: &CommandExecutionContext<'_>) -> CommandResult;

    /// Re-apply after an undo.
    fn redo(&mut self, ctx: &CommandExecutionContext<'_>) -> CommandResult;

    /// Absorb `other` into this command. Returns `true` on success, in which
    /// case `other` is dropped instead of being pushed.
    fn merge(&mut self, _other: &dyn Command) -> bool {
        false
    }

    /// Current lifecycle state.
    fn state(&self) -> CommandState;

    /// Human-readable description for UI display.
    fn description(&self) -> &str {
        &self.metadata().description
    }

    /// Get the command metadata.
    fn metadata(&self) -> &CommandMetadata;

    /// Mutable metadata, for handlers that stamp the source.
    fn metadata_mut(&mut self) -> &mut CommandMetadata;

    /// Size of this command in bytes for memory budgeting.
    fn size_bytes(&self) -> usize;

    /// Downcast to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Debug description of the command.
    fn debug_name(&self) -> &'static str {
        "Command"
    }
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.debug_name())
            .field("description", &self.description())
            .field("state", &self.state())
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

/// Old and new root of a command that has executed.
#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshots {
    pub(crate) state: CommandState,
    pub(crate) old_root: Option<Arc<Model>>,
    pub(crate) new_root: Option<Arc<Model>>,
}

impl Snapshots {
    /// Fail unless the state is one of `allowed`.
    pub(crate) fn require(
        &self,
        command: &'static str,
        operation: &'static str,
        allowed: &[CommandState],
    ) -> Result<(), CommandError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CommandError::InvalidState {
                command,
                operation,
                state: self.state,
            })
        }
    }

    pub(crate) fn record(&mut self, old_root: Arc<Model>, new_root: Arc<Model>) {
        self.old_root = Some(old_root);
        self.new_root = Some(new_root);
        self.state = CommandState::Executed;
    }

    pub(crate) fn undo(&mut self, command: &'static str) -> CommandResult {
        self.require(
            command,
            "undo",
            &[CommandState::Executed, CommandState::Redone],
        )?;
        let root = self.old_root.clone().ok_or(CommandError::InvalidState {
            command,
            operation: "undo",
            state: self.state,
        })?;
        self.state = CommandState::Undone;
        Ok(CommandOutcome::root(root))
    }

    pub(crate) fn redo(&mut self, command: &'static str) -> CommandResult {
        self.require(command, "redo", &[CommandState::Undone])?;
        let root = self.new_root.clone().ok_or(CommandError::InvalidState {
            command,
            operation: "redo",
            state: self.state,
        })?;
        self.state = CommandState::Redone;
        Ok(CommandOutcome::root(root))
    }

    pub(crate) fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.old_root.as_ref().map_or(0, |m| m.size_bytes())
            + self.new_root.as_ref().map_or(0, |m| m.size_bytes())
    }
}
