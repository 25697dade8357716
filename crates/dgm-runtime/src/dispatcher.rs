#![forbid(unsafe_code)]

//! Routes actions to the command stack.
//!
//! Undo and redo go straight to the stack. Every other kind is looked up in
//! the [`ActionHandlerRegistry`]; the handler builds a command and the
//! stack executes it. A kind with no handler is logged and ignored.

use serde_json::Value;
use tracing::{debug, warn};

use crate::action::{Action, ActionHandlerRegistry};
use crate::command::{CommandError, CommandSource};
use crate::stack::{CommandStack, FrameStatus};

/// Dispatch failures.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The message is not a valid action.
    #[error("malformed action: {0}")]
    Parse(#[from] serde_json::Error),
    /// The message has no string `kind` field.
    #[error("malformed action: missing `kind`")]
    MissingKind,
    /// The command built for the action failed.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// What one dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A command ran and was pushed.
    Executed { description: String },
    Undone { description: String },
    Redone { description: String },
    /// Undo requested with an empty undo stack.
    NothingToUndo,
    /// Redo requested with an empty redo stack.
    NothingToRedo,
    /// No handler for this kind; nothing happened.
    Unhandled { kind: String },
}

/// Front door of the runtime: actions in, commands executed.
#[derive(Debug, Default)]
pub struct ActionDispatcher {
    stack: CommandStack,
    registry: ActionHandlerRegistry,
}

impl ActionDispatcher {
    /// Dispatcher over `stack` with the default handlers.
    #[must_use]
    pub fn new(stack: CommandStack) -> Self {
        Self::with_registry(stack, ActionHandlerRegistry::default())
    }

    /// Dispatcher over `stack` with custom handlers.
    #[must_use]
    pub fn with_registry(stack: CommandStack, registry: ActionHandlerRegistry) -> Self {
        Self { stack, registry }
    }

    /// Dispatch an action built by application code.
    pub fn dispatch(&mut self, action: Action) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch_from(action, CommandSource::Programmatic)
    }

    /// Dispatch `actions` in order, stopping at the first failure.
    pub fn dispatch_all(
        &mut self,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<Vec<DispatchOutcome>, DispatchError> {
        actions
            .into_iter()
            .map(|action| self.dispatch(action))
            .collect()
    }

    /// Parse and dispatch one server message.
    ///
    /// Unknown kinds are not an error: they are logged and reported as
    /// [`DispatchOutcome::Unhandled`].
    pub fn dispatch_json(&mut self, message: &str) -> Result<DispatchOutcome, DispatchError> {
        let value: Value = serde_json::from_str(message)?;
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(DispatchError::MissingKind)?;
        if !Action::is_known_kind(kind) {
            return Ok(self.unhandled(kind));
        }
        let action: Action = serde_json::from_value(value)?;
        self.dispatch_from(action, CommandSource::Server)
    }

    /// Dispatch with an explicit command source.
    pub fn dispatch_from(
        &mut self,
        action: Action,
        source: CommandSource,
    ) -> Result<DispatchOutcome, DispatchError> {
        let kind = action.kind();
        let _span = tracing::debug_span!(target: "dgm.dispatch", "dgm.dispatch", kind).entered();

        match action {
            Action::Undo => Ok(match self.stack.undo() {
                Some(result) => DispatchOutcome::Undone {
                    description: result?,
                },
                None => DispatchOutcome::NothingToUndo,
            }),
            Action::Redo => Ok(match self.stack.redo() {
                Some(result) => DispatchOutcome::Redone {
                    description: result?,
                },
                None => DispatchOutcome::NothingToRedo,
            }),
            action => {
                let Some(handler) = self.registry.get(kind) else {
                    return Ok(self.unhandled(kind));
                };
                let cmd = handler.handle(&action, source)?;
                let description = cmd.description().to_owned();
                self.stack.execute(cmd)?;
                debug!(target: "dgm.dispatch", kind, description = %description, "action handled");
                Ok(DispatchOutcome::Executed { description })
            }
        }
    }

    fn unhandled(&self, kind: &str) -> DispatchOutcome {
        warn!(target: "dgm.dispatch", kind, "no handler for action, ignoring");
        DispatchOutcome::Unhandled {
            kind: kind.to_owned(),
        }
    }

    /// Forward the host frame callback to the stack.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> FrameStatus {
        self.stack.on_frame(timestamp_ms)
    }

    #[must_use]
    pub fn stack(&self) -> &CommandStack {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut CommandStack {
        &mut self.stack
    }

    #[must_use]
    pub fn registry(&self) -> &ActionHandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ActionHandlerRegistry {
        &mut self.registry
    }

    /// Consume the dispatcher, keeping the stack.
    #[must_use]
    pub fn into_stack(self) -> CommandStack {
        self.stack
    }
}
