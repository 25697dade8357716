#![forbid(unsafe_code)]

//! Frame-by-frame playback of a [`ModelAnimation`].
//!
//! The player keeps a *frame base*: the target model plus ghost copies of
//! removed elements, re-attached under their old parent so they can fade
//! out. Every frame clones the base, applies the current interpolation and
//! hands the result out as an immutable snapshot. The last frame is the
//! target itself, so playback always converges on the committed model.

use std::sync::Arc;

use dgm_model::Model;
use tracing::{debug, trace};
use web_time::Duration;

use super::{Animation, FadeDirection, ModelAnimation};
use crate::cancellation::CancellationToken;

/// An animation together with the model it converges to.
#[derive(Debug, Clone)]
pub struct Transition {
    pub animation: ModelAnimation,
    pub target: Arc<Model>,
}

impl Transition {
    /// Pair an animation with its target.
    #[must_use]
    pub fn new(animation: ModelAnimation, target: Arc<Model>) -> Self {
        Self { animation, target }
    }
}

/// Result of one frame callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// An interpolated model to show now.
    InProgress(Arc<Model>),
    /// Playback finished; this is the final model.
    Complete(Arc<Model>),
    /// A newer command cancelled this playback. Nothing should change.
    Superseded,
}

impl Frame {
    /// The model carried by this frame, if any.
    #[must_use]
    pub fn model(&self) -> Option<&Arc<Model>> {
        match self {
            Self::InProgress(model) | Self::Complete(model) => Some(model),
            Self::Superseded => None,
        }
    }

    /// Whether this frame ends playback (completion or supersession).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress(_))
    }
}

/// Drives one [`Transition`] from host frame timestamps.
#[derive(Debug)]
pub struct AnimationPlayer {
    animation: ModelAnimation,
    base: Model,
    target: Arc<Model>,
    token: CancellationToken,
    start_ms: Option<f64>,
    elapsed: Duration,
    frames: u64,
    finished: bool,
}

impl AnimationPlayer {
    /// Prepare playback of `transition`. `token` is checked on every frame.
    #[must_use]
    pub fn new(transition: Transition, token: CancellationToken) -> Self {
        let Transition { animation, target } = transition;
        let base = frame_base(&animation, &target);
        debug!(
            target: "dgm.animation",
            kind = animation.kind(),
            duration_ms = animation.duration().as_millis() as u64,
            "animation started"
        );
        Self {
            animation,
            base,
            target,
            token,
            start_ms: None,
            elapsed: Duration::ZERO,
            frames: 0,
            finished: false,
        }
    }

    /// Advance to `timestamp_ms` (host clock, milliseconds).
    ///
    /// The first call fixes the start time. Timestamps that go backwards or
    /// are not finite do not advance the clock.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> Frame {
        if self.token.is_cancelled() {
            if !self.finished {
                self.finished = true;
                debug!(target: "dgm.animation", frames = self.frames, "animation superseded");
            }
            return Frame::Superseded;
        }
        if self.finished {
            return Frame::Complete(Arc::clone(&self.target));
        }

        self.frames += 1;
        if timestamp_ms.is_finite() {
            let start = *self.start_ms.get_or_insert(timestamp_ms);
            let elapsed = Duration::try_from_secs_f64(((timestamp_ms - start) / 1000.0).max(0.0))
                .unwrap_or(Duration::ZERO);
            if elapsed > self.elapsed {
                self.animation.tick(elapsed - self.elapsed);
                self.elapsed = elapsed;
            }
        }

        if self.animation.is_complete() {
            self.finished = true;
            debug!(target: "dgm.animation", frames = self.frames, "animation complete");
            return Frame::Complete(Arc::clone(&self.target));
        }

        let mut frame = self.base.clone();
        self.animation.apply(&mut frame);
        trace!(
            target: "dgm.animation",
            frame = self.frames,
            progress = self.animation.value(),
            "animation frame"
        );
        Frame::InProgress(Arc::new(frame))
    }

    /// The descriptor being played.
    #[must_use]
    pub fn animation(&self) -> &ModelAnimation {
        &self.animation
    }

    /// The model playback converges to.
    #[must_use]
    pub fn target(&self) -> &Arc<Model> {
        &self.target
    }

    /// The model frames are derived from (target plus ghosts).
    #[must_use]
    pub fn frame_base(&self) -> &Model {
        &self.base
    }

    /// The supersession token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of frames processed.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Whether playback has ended, by completion or supersession.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished || self.token.is_cancelled()
    }
}

/// Target plus ghosts of removed elements.
///
/// A ghost is attached only when its old parent is present in the base and
/// none of its ids collide; nested removals ride inside their ancestor's
/// ghost.
fn frame_base(animation: &ModelAnimation, target: &Model) -> Model {
    let mut base = target.clone();
    let Some(fade) = animation.fade() else {
        return base;
    };
    for ghost in fade.fades(FadeDirection::Out) {
        let Some(parent_id) = ghost.parent_id.as_deref() else {
            continue;
        };
        if let Err(err) = base.add_child(parent_id, ghost.element.clone()) {
            trace!(
                target: "dgm.animation",
                id = %ghost.element.id,
                reason = %err,
                "ghost not attached"
            );
        }
    }
    base
}
