#![forbid(unsafe_code)]

//! dgm Runtime
//!
//! Commands, undo history, and animated transitions for diagram models.
//!
//! # Key Components
//!
//! - [`ActionDispatcher`] - Routes actions (or raw server messages) to commands
//! - [`CommandStack`] - Owns the live root, undo/redo history, and playback
//! - [`UpdateModelCommand`] - Replaces or diffs the model, animating the change
//! - [`compute_animation`] - Derives fades and moves from match records
//! - [`AnimationPlayer`] - Turns host frame timestamps into interpolated models
//! - [`RuntimeConfig`] - Animation and history settings
//!
//! # Role in dgm
//! `dgm-runtime` is the orchestrator. It consumes schemas and match records
//! from `dgm-model`, turns actions into undoable commands, and hands the
//! host a new visual root whenever the model changes or an animation frame
//! is due.
//!
//! # How it fits in the system
//! The host owns the clock and the renderer. It calls
//! [`CommandStack::on_frame`] when a frame was requested through its
//! [`FrameScheduler`] and renders whatever root the model listener
//! receives.

pub mod action;
pub mod animation;
pub mod cancellation;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod frame;
pub mod stack;

pub use action::{
    Action, ActionHandler, ActionHandlerRegistry, CommandActionHandler, SetModelAction,
    UpdateModelAction,
};
pub use animation::{
    Animation, AnimationPlayer, CompoundAnimation, ElementFade, ElementMove, FadeAnimation,
    FadeDirection, Frame, ModelAnimation, MoveAnimation, Transition, Tween, compute_animation,
};
pub use cancellation::{CancellationSource, CancellationToken};
pub use command::{
    Command, CommandError, CommandExecutionContext, CommandMetadata, CommandOutcome,
    CommandResult, CommandSource, CommandState, SetModelCommand, UpdateModelCommand,
    apply_matches,
};
pub use config::{AnimationConfig, ConfigError, Easing, RuntimeConfig};
pub use dispatcher::{ActionDispatcher, DispatchError, DispatchOutcome};
pub use frame::{FrameScheduler, ManualFrameScheduler, NoopFrameScheduler};
pub use stack::{CommandStack, FrameStatus, HistoryConfig};
