#![forbid(unsafe_code)]

//! Wholesale root replacement.

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use super::{
    Command, CommandExecutionContext, CommandMetadata, CommandResult, CommandOutcome, CommandState,
    Snapshots,
};
use crate::action::SetModelAction;

const NAME: &str = "SetModelCommand";

/// Replaces the root with a new model. Never animates.
///
/// Used for the first model a server sends and for any update where the
/// transition is not worth showing.
#[derive(Debug)]
pub struct SetModelCommand {
    action: SetModelAction,
    snapshots: Snapshots,
    metadata: CommandMetadata,
}

impl SetModelCommand {
    pub const KIND: &'static str = SetModelAction::KIND;

    #[must_use]
    pub fn new(action: SetModelAction) -> Self {
        Self {
            action,
            snapshots: Snapshots::default(),
            metadata: CommandMetadata::new("Set model"),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: CommandMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl Command for SetModelCommand {
    fn execute(&mut self, ctx: &CommandExecutionContext<'_>) -> CommandResult {
        self.snapshots
            .require(NAME, "execute", &[CommandState::Uninitialized])?;
        let new_root = ctx.factory.create_root(&self.action.new_root);
        new_root.validate()?;
        let new_root = Arc::new(new_root);
        debug!(target: "dgm.command", root = %new_root.id(), elements = new_root.len(), "model set");
        self.snapshots
            .record(Arc::clone(&ctx.root), Arc::clone(&new_root));
        Ok(CommandOutcome::root(new_root))
    }

    fn undo(&mut self, _ctx: &CommandExecutionContext<'_>) -> CommandResult {
        self.snapshots.undo(NAME)
    }

    fn redo(&mut self, _ctx: &CommandExecutionContext<'_>) -> CommandResult {
        self.snapshots.redo(NAME)
    }

    fn state(&self) -> CommandState {
        self.snapshots.state
    }

    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut CommandMetadata {
        &mut self.metadata
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.metadata.size_bytes() + self.snapshots.size_bytes()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn debug_name(&self) -> &'static str {
        NAME
    }
}
