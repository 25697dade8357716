#![forbid(unsafe_code)]

//! The command stack: owner of the live root and of undo/redo history.
//!
//! [`CommandStack`] runs commands, keeps the executed ones in dual
//! undo/redo stacks, and drives any transition a command starts from the
//! host's frame callback.
//!
//! # Invariants
//!
//! 1. `total_bytes` always equals the sum of `size_bytes()` over both stacks.
//! 2. `undo_depth() <= config.max_depth` after any operation.
//! 3. `memory_usage() <= config.max_bytes` after any operation, when set.
//! 4. The redo stack is cleared whenever a new command is pushed.
//! 5. At most one animation is in flight. Starting any command supersedes
//!    it first: its token is cancelled and the visual root snaps to the
//!    committed one, so no partial interpolation survives.
//!
//! ```text
//! execute(cmd3)                      undo()
//! ┌────────────────────────────┐     ┌────────────────────────────┐
//! │ undo: [cmd1, cmd2, cmd3]   │ ──► │ undo: [cmd1, cmd2]         │
//! │ redo: []                   │     │ redo: [cmd3]               │
//! └────────────────────────────┘     └────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use dgm_model::{ElementSchema, Model, ModelFactory};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::animation::{AnimationPlayer, Frame};
use crate::cancellation::CancellationSource;
use crate::command::{Command, CommandError, CommandExecutionContext, CommandOutcome};
use crate::config::{AnimationConfig, RuntimeConfig};
use crate::frame::{FrameScheduler, NoopFrameScheduler};

/// Limits for the undo/redo history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of commands to keep in undo history.
    pub max_depth: usize,
    /// Maximum total bytes for all commands (0 = unlimited).
    pub max_bytes: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl HistoryConfig {
    /// Create a configuration with custom limits.
    #[must_use]
    pub fn new(max_depth: usize, max_bytes: usize) -> Self {
        Self {
            max_depth,
            max_bytes,
        }
    }

    /// Create unlimited configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_depth: usize::MAX,
            max_bytes: 0,
        }
    }
}

/// What a frame callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// No animation was in flight.
    Idle,
    /// An interpolated frame was adopted; another frame has been requested.
    Animating,
    /// The animation finished and the committed root is now shown.
    Completed,
}

impl FrameStatus {
    /// Whether this frame finished an animation.
    #[must_use]
    pub fn is_complete(self) -> bool {
        self == Self::Completed
    }
}

type ModelListener = Box<dyn FnMut(&Arc<Model>)>;

struct Playback {
    player: AnimationPlayer,
    source: CancellationSource,
}

/// Owner of the live root, the history, and the in-flight animation.
pub struct CommandStack {
    factory: ModelFactory,
    /// What is shown now; an animation frame while animating.
    root: Arc<Model>,
    /// What the last command committed.
    committed: Arc<Model>,
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: VecDeque<Box<dyn Command>>,
    config: HistoryConfig,
    animation: AnimationConfig,
    total_bytes: usize,
    playback: Option<Playback>,
    scheduler: Box<dyn FrameScheduler>,
    listener: Option<ModelListener>,
}

impl fmt::Debug for CommandStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandStack")
            .field("root", &self.root.id())
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("total_bytes", &self.total_bytes)
            .field("animating", &self.playback.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStack {
    /// A stack holding the empty root, with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&RuntimeConfig::default())
    }

    /// A stack holding the empty root.
    ///
    /// `config` is taken as given except for `history.max_depth`, which is
    /// raised to 1 when zero; run [`RuntimeConfig::validate`] to reject it
    /// instead.
    #[must_use]
    pub fn with_config(config: &RuntimeConfig) -> Self {
        let mut history = config.history.clone();
        if history.max_depth == 0 {
            warn!(target: "dgm.command", "history.max_depth is 0, keeping one command");
            history.max_depth = 1;
        }
        let factory = ModelFactory::new();
        let root = Arc::new(factory.create_root(&ElementSchema::empty_root()));
        Self {
            factory,
            root: Arc::clone(&root),
            committed: root,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            config: history,
            animation: config.animation,
            total_bytes: 0,
            playback: None,
            scheduler: Box::new(NoopFrameScheduler),
            listener: None,
        }
    }

    /// Builder: start from `root` instead of the empty model.
    #[must_use]
    pub fn with_root(mut self, root: Model) -> Self {
        let root = Arc::new(root);
        self.committed = Arc::clone(&root);
        self.root = root;
        self
    }

    /// Builder: use `scheduler` to request frames.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: impl FrameScheduler + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    /// Register the model-changed callback. It receives every new visual
    /// root: committed roots and animation frames alike.
    pub fn set_model_listener(&mut self, listener: impl FnMut(&Arc<Model>) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Run a new command and push it onto the undo stack.
    ///
    /// A failed command is dropped; the root and history stay as they were
    /// (apart from the superseded animation, which is completed).
    pub fn execute(&mut self, mut cmd: Box<dyn Command>) -> Result<(), CommandError> {
        let _span = tracing::debug_span!(
            target: "dgm.command",
            "dgm.command.execute",
            command = cmd.debug_name(),
            description = %cmd.description(),
        )
        .entered();

        self.supersede();
        let outcome = cmd.execute(&self.context())?;
        self.adopt(outcome);
        self.push(cmd);
        Ok(())
    }

    /// Undo the last command.
    ///
    /// # Returns
    ///
    /// - `Some(Ok(description))` if undo succeeded
    /// - `Some(Err(error))` if undo failed (command remains on undo stack)
    /// - `None` if there is nothing to undo
    pub fn undo(&mut self) -> Option<Result<String, CommandError>> {
        let mut cmd = self.undo_stack.pop_back()?;
        let _span = tracing::debug_span!(
            target: "dgm.command",
            "dgm.command.undo",
            command = cmd.debug_name(),
        )
        .entered();
        self.supersede();
        let description = cmd.description().to_owned();

        let result = cmd.undo(&self.context());
        match result {
            Ok(outcome) => {
                self.adopt(outcome);
                self.redo_stack.push_back(cmd);
                Some(Ok(description))
            }
            Err(e) => {
                self.undo_stack.push_back(cmd);
                Some(Err(e))
            }
        }
    }

    /// Redo the last undone command.
    ///
    /// Same contract as [`undo`](Self::undo), mirrored.
    pub fn redo(&mut self) -> Option<Result<String, CommandError>> {
        let mut cmd = self.redo_stack.pop_back()?;
        let _span = tracing::debug_span!(
            target: "dgm.command",
            "dgm.command.redo",
            command = cmd.debug_name(),
        )
        .entered();
        self.supersede();
        let description = cmd.description().to_owned();

        let result = cmd.redo(&self.context());
        match result {
            Ok(outcome) => {
                self.adopt(outcome);
                self.undo_stack.push_back(cmd);
                Some(Ok(description))
            }
            Err(e) => {
                self.redo_stack.push_back(cmd);
                Some(Err(e))
            }
        }
    }

    /// Host frame callback.
    ///
    /// Advances the in-flight animation to `timestamp_ms`, shows the
    /// resulting frame and requests the next one.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> FrameStatus {
        let Some(playback) = self.playback.as_mut() else {
            return FrameStatus::Idle;
        };
        let frame = playback.player.on_frame(timestamp_ms);
        let token = playback.player.token().clone();
        match frame {
            Frame::InProgress(model) => {
                self.show(model);
                self.scheduler.request_frame(token);
                FrameStatus::Animating
            }
            Frame::Complete(model) => {
                self.playback = None;
                self.show(model);
                FrameStatus::Completed
            }
            Frame::Superseded => {
                self.playback = None;
                FrameStatus::Idle
            }
        }
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// The root to display now.
    #[must_use]
    pub fn root(&self) -> &Arc<Model> {
        &self.root
    }

    /// The root the last command committed. Equals [`root`](Self::root)
    /// whenever no animation is in flight.
    #[must_use]
    pub fn committed_root(&self) -> &Arc<Model> {
        &self.committed
    }

    /// The factory handed to commands.
    #[must_use]
    pub fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    /// Whether an animation is in flight.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.playback.is_some()
    }

    /// The in-flight player, if any.
    #[must_use]
    pub fn player(&self) -> Option<&AnimationPlayer> {
        self.playback.as_ref().map(|p| &p.player)
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the undo stack depth.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the redo stack depth.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Get descriptions for undo commands (most recent first).
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|c| c.description())
            .collect()
    }

    /// Get descriptions for redo commands (most recent first).
    pub fn redo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.redo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|c| c.description())
            .collect()
    }

    /// Get the description of the next undo command.
    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|c| c.description())
    }

    /// Get the description of the next redo command.
    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|c| c.description())
    }

    /// Get total memory usage in bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.total_bytes
    }

    /// Get the history configuration.
    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Get the animation configuration.
    #[must_use]
    pub fn animation_config(&self) -> &AnimationConfig {
        &self.animation
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Clear all history (both undo and redo). The root is kept.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_bytes = 0;
    }

    fn context(&self) -> CommandExecutionContext<'_> {
        CommandExecutionContext::new(Arc::clone(&self.committed), &self.factory)
            .with_duration(self.animation.duration())
            .with_easing(self.animation.easing.function())
            .with_animations(self.animation.animate_updates)
    }

    /// Cancel the in-flight animation and show its target.
    fn supersede(&mut self) {
        let Some(playback) = self.playback.take() else {
            return;
        };
        playback.source.cancel();
        debug!(
            target: "dgm.animation",
            frames = playback.player.frames(),
            "animation superseded"
        );
        self.show(Arc::clone(&self.committed));
    }

    fn adopt(&mut self, outcome: CommandOutcome) {
        let CommandOutcome { root, transition } = outcome;
        match transition {
            Some(transition) => {
                self.committed = Arc::clone(&transition.target);
                let source = CancellationSource::new();
                let token = source.token();
                let player = AnimationPlayer::new(transition, token.clone());
                self.playback = Some(Playback { player, source });
                self.show(root);
                self.scheduler.request_frame(token);
            }
            None => {
                self.committed = Arc::clone(&root);
                self.show(root);
            }
        }
    }

    fn show(&mut self, root: Arc<Model>) {
        if Arc::ptr_eq(&self.root, &root) {
            return;
        }
        self.root = root;
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.root);
        }
    }

    /// Push an executed command: clears redo, merges if possible, enforces
    /// limits.
    fn push(&mut self, cmd: Box<dyn Command>) {
        self.clear_redo();

        let cmd = match self.try_merge(cmd) {
            Ok(()) => {
                self.enforce_limits();
                return;
            }
            Err(cmd) => cmd,
        };

        self.total_bytes += cmd.size_bytes();
        self.undo_stack.push_back(cmd);
        self.enforce_limits();
    }

    fn clear_redo(&mut self) {
        for cmd in self.redo_stack.drain(..) {
            self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
        }
    }

    /// Enforce depth and memory limits by evicting oldest commands.
    fn enforce_limits(&mut self) {
        while self.undo_stack.len() > self.config.max_depth {
            if let Some(cmd) = self.undo_stack.pop_front() {
                self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
            }
        }

        if self.config.max_bytes > 0 {
            while self.total_bytes > self.config.max_bytes {
                if let Some(cmd) = self.redo_stack.pop_front() {
                    self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
                    continue;
                }
                if let Some(cmd) = self.undo_stack.pop_front() {
                    self.total_bytes = self.total_bytes.saturating_sub(cmd.size_bytes());
                } else {
                    break;
                }
            }
        }
    }

    /// Try to merge a command into the last one on the undo stack.
    fn try_merge(&mut self, cmd: Box<dyn Command>) -> Result<(), Box<dyn Command>> {
        let Some(last) = self.undo_stack.back_mut() else {
            return Err(cmd);
        };
        let old_size = last.size_bytes();
        if !last.merge(cmd.as_ref()) {
            return Err(cmd);
        }
        let new_size = last.size_bytes();
        self.total_bytes = self.total_bytes.saturating_sub(old_size) + new_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{SetModelAction, UpdateModelAction};
    use crate::command::{SetModelCommand, UpdateModelCommand};
    use crate::frame::ManualFrameScheduler;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn graph(children: &[&str]) -> ElementSchema {
        ElementSchema::new("model", "graph")
            .with_children(children.iter().map(|id| ElementSchema::new(*id, "node")))
    }

    fn set(children: &[&str]) -> Box<dyn Command> {
        Box::new(SetModelCommand::new(SetModelAction::new(graph(children))))
    }

    fn update(children: &[&str]) -> Box<dyn Command> {
        Box::new(UpdateModelCommand::new(UpdateModelAction::with_root(graph(children))))
    }

    #[test]
    fn starts_with_empty_root() {
        let stack = CommandStack::new();
        assert_eq!(stack.root().id(), "EMPTY");
        assert_eq!(stack.root().ty(), "NONE");
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
        assert!(!stack.is_animating());
    }

    #[test]
    fn execute_undo_redo() {
        let mut stack = CommandStack::new();
        stack.execute(set(&["a"])).unwrap();
        assert!(stack.root().contains("a"));
        assert_eq!(stack.next_undo_description(), Some("Set model"));

        assert_eq!(stack.undo().unwrap().unwrap(), "Set model");
        assert_eq!(stack.root().id(), "EMPTY");
        assert!(stack.can_redo());

        stack.redo().unwrap().unwrap();
        assert!(stack.root().contains("a"));
        assert!(stack.undo().is_some());
        assert!(stack.undo().is_none());
    }

    #[test]
    fn zero_depth_config_still_allows_one_undo() {
        let config = RuntimeConfig {
            history: HistoryConfig::new(0, 0),
            ..RuntimeConfig::default()
        };
        let mut stack = CommandStack::with_config(&config);
        assert_eq!(stack.config().max_depth, 1);

        stack.execute(set(&["a"])).unwrap();
        stack.execute(set(&["b"])).unwrap();
        assert_eq!(stack.undo_depth(), 1);
        stack.undo().unwrap().unwrap();
        assert!(stack.root().contains("a"));
    }

    #[test]
    fn new_command_clears_redo() {
        let mut stack = CommandStack::new();
        stack.execute(set(&["a"])).unwrap();
        stack.execute(set(&["b"])).unwrap();
        stack.undo();
        assert_eq!(stack.redo_depth(), 1);
        stack.execute(set(&["c"])).unwrap();
        assert_eq!(stack.redo_depth(), 0);
        assert_eq!(stack.undo_descriptions(10), ["Set model", "Set model"]);
    }

    #[test]
    fn depth_limit_evicts_oldest() {
        let config = RuntimeConfig {
            history: HistoryConfig::new(2, 0),
            ..RuntimeConfig::default()
        };
        let mut stack = CommandStack::with_config(&config);
        for child in ["a", "b", "c"] {
            stack.execute(set(&[child])).unwrap();
        }
        assert_eq!(stack.undo_depth(), 2);
        stack.undo();
        stack.undo();
        assert!(stack.root().contains("a"));
    }

    #[test]
    fn memory_accounting_tracks_stacks() {
        let mut stack = CommandStack::new();
        stack.execute(set(&["a"])).unwrap();
        let one = stack.memory_usage();
        assert!(one > 0);
        stack.undo();
        assert_eq!(stack.memory_usage(), one);
        stack.execute(set(&["b"])).unwrap();
        assert!(stack.memory_usage() > 0);
        stack.clear();
        assert_eq!(stack.memory_usage(), 0);
    }

    #[test]
    fn failed_command_leaves_history_untouched() {
        let mut stack = CommandStack::new();
        stack.execute(set(&["a"])).unwrap();
        let before = Arc::clone(stack.root());
        let bad = Box::new(UpdateModelCommand::new(UpdateModelAction::default()));
        assert!(stack.execute(bad).is_err());
        assert_eq!(stack.undo_depth(), 1);
        assert!(Arc::ptr_eq(stack.root(), &before));
    }

    #[test]
    fn animation_runs_on_frames() {
        let scheduler = ManualFrameScheduler::new();
        let mut stack = CommandStack::new().with_scheduler(scheduler.clone());
        stack.execute(set(&[])).unwrap();
        stack.execute(update(&["a"])).unwrap();

        assert!(stack.is_animating());
        assert_eq!(scheduler.pending(), 1);
        assert!(!stack.root().contains("a"));
        assert!(stack.committed_root().contains("a"));

        assert!(scheduler.take());
        assert_eq!(stack.on_frame(0.0), FrameStatus::Animating);
        assert_eq!(stack.root().get("a").unwrap().opacity, 0.0);
        assert_eq!(stack.on_frame(1000.0), FrameStatus::Completed);
        assert!(Arc::ptr_eq(stack.root(), stack.committed_root()));
        assert_eq!(stack.on_frame(2000.0), FrameStatus::Idle);
    }

    #[test]
    fn listener_sees_every_visual_root() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut stack = CommandStack::new();
        stack.set_model_listener(move |root| sink.borrow_mut().push(root.len()));
        stack.execute(set(&[])).unwrap();
        stack.execute(update(&["a"])).unwrap();
        stack.on_frame(0.0);
        stack.on_frame(500.0);
        assert_eq!(*seen.borrow(), [1, 2, 2]);
    }
}
