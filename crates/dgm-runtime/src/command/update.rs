#![forbid(unsafe_code)]

//! The update-model command: replace the root with a server-sent model or
//! apply a server-computed diff, animating the difference.

use std::any::Any;
use std::sync::Arc;

use dgm_model::{MatchResult, Model, ModelMatcher, ModelResult, OwnedMatch};
use tracing::debug;

use super::{
    Command, CommandError, CommandExecutionContext, CommandMetadata, CommandOutcome,
    CommandResult, CommandState, Snapshots,
};
use crate::action::UpdateModelAction;
use crate::animation::{ModelAnimation, Transition, compute_animation};

const NAME: &str = "UpdateModelCommand";

/// Moves the diagram from its current root to the one described by an
/// [`UpdateModelAction`].
///
/// On execute the command either materializes `new_root` and matches it
/// against the current root, or applies the precomputed `matches` to a copy
/// of the current root. Unless animation is off, or the root identity
/// changed, the result is a transition from the current root to the new
/// one. Undo and redo return the captured snapshots verbatim.
#[derive(Debug)]
pub struct UpdateModelCommand {
    action: UpdateModelAction,
    snapshots: Snapshots,
    metadata: CommandMetadata,
}

impl UpdateModelCommand {
    pub const KIND: &'static str = UpdateModelAction::KIND;

    /// Create a command for `action`.
    #[must_use]
    pub fn new(action: UpdateModelAction) -> Self {
        Self {
            action,
            snapshots: Snapshots::default(),
            metadata: CommandMetadata::new("Update model"),
        }
    }

    /// Replace the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: CommandMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The action this command was built from.
    #[must_use]
    pub fn action(&self) -> &UpdateModelAction {
        &self.action
    }

    /// Root captured at execute time.
    #[must_use]
    pub fn old_root(&self) -> Option<&Arc<Model>> {
        self.snapshots.old_root.as_ref()
    }

    /// Root committed by execute.
    #[must_use]
    pub fn new_root(&self) -> Option<&Arc<Model>> {
        self.snapshots.new_root.as_ref()
    }

    fn should_animate(&self, ctx: &CommandExecutionContext<'_>, old: &Model, new: &Model) -> bool {
        self.action.animate && ctx.animations_enabled && old.id() == new.id()
    }

    /// Build the new root and, when wanted, the animation towards it.
    fn compute(
        &self,
        ctx: &CommandExecutionContext<'_>,
        old_root: &Model,
    ) -> Result<(Model, Option<ModelAnimation>), CommandError> {
        if let Some(records) = &self.action.matches {
            let owned: Vec<OwnedMatch> = records
                .iter()
                .map(|record| OwnedMatch::from_schema(ctx.factory, record))
                .collect();
            let matches = MatchResult::from_matches(&owned)?;
            let new_root = apply_matches(old_root, &owned)?;
            let animation = if self.should_animate(ctx, old_root, &new_root) {
                compute_animation(&new_root, &matches, ctx.duration)
            } else {
                None
            };
            return Ok((new_root, animation));
        }

        let Some(schema) = &self.action.new_root else {
            return Err(CommandError::InvalidAction(
                "update model action has neither a new root nor matches".into(),
            ));
        };
        let new_root = ctx.factory.create_root(schema);
        new_root.validate()?;
        let animation = if self.should_animate(ctx, old_root, &new_root) {
            let matches = ModelMatcher::new().match_models(old_root, &new_root)?;
            compute_animation(&new_root, &matches, ctx.duration)
        } else {
            None
        };
        Ok((new_root, animation))
    }
}

impl Command for UpdateModelCommand {
    fn execute(&mut self, ctx: &CommandExecutionContext<'_>) -> CommandResult {
        self.snapshots
            .require(NAME, "execute", &[CommandState::Uninitialized])?;
        let old_root = Arc::clone(&ctx.root);
        let (new_root, animation) = self.compute(ctx, &old_root)?;
        let new_root = Arc::new(new_root);
        self.snapshots
            .record(Arc::clone(&old_root), Arc::clone(&new_root));

        debug!(
            target: "dgm.command",
            root = %new_root.id(),
            elements = new_root.len(),
            animation = animation.as_ref().map_or("none", ModelAnimation::kind),
            "model updated"
        );
        Ok(match animation {
            Some(animation) => CommandOutcome::animated(
                old_root,
                Transition::new(animation.with_easing(ctx.easing), new_root),
            ),
            None => CommandOutcome::root(new_root),
        })
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

/// Apply precomputed match records to a copy of `root`.
///
/// Records are applied in order. For each: the left element is detached if
/// it is present (the root itself is never detached); the right element is
/// appended under `right_parent_id`, or under the root when that parent is
/// missing. A right element carrying the root's id updates the root's own
/// attributes and keeps its children. The result is validated.
///
/// A two-sided record replaces the whole subtree: children not listed in
/// `right` are dropped.
pub fn apply_matches(root: &Model, records: &[OwnedMatch]) -> ModelResult<Model> {
    let mut model = root.clone();
    let root_id = model.id().to_owned();
    for record in records {
        if let Some(left) = &record.left
            && left.id != root_id
            && model.contains(&left.id)
        {
            model.remove(&left.id)?;
        }
        let Some(right) = &record.right else {
            continue;
        };
        if right.id == root_id {
            if let Some(target) = model.get_mut(&root_id) {
                target.ty.clone_from(&right.ty);
                target.kind = right.kind.clone();
                target.extra = right.extra.clone();
            }
            continue;
        }
        let parent_id = record
            .right_parent_id
            .as_deref()
            .filter(|p| model.contains(p))
            .unwrap_or(root_id.as_str())
            .to_owned();
        model.add_child(&parent_id, right.clone())?;
    }
    model.validate()?;
    Ok(model)
}
