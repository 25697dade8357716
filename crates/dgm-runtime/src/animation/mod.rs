#![forbid(unsafe_code)]

//! Model transition animations.
//!
//! Time-based animations that turn a model update into a short visual
//! transition: added elements fade in, removed elements fade out, relocated
//! nodes glide to their new position.
//!
//! # Layers
//!
//! - [`Animation`] / [`Tween`]: the clock. Elapsed time over a fixed duration,
//!   shaped by an [`EasingFn`].
//! - [`FadeAnimation`], [`MoveAnimation`], [`CompoundAnimation`]: descriptors
//!   that know which elements to touch. [`ModelAnimation`] is the tagged union
//!   the engine returns.
//! - [`compute_animation`]: builds a descriptor from match records.
//! - [`AnimationPlayer`]: drives a descriptor frame by frame and produces
//!   interpolated models.
//!
//! # Invariants
//!
//! 1. `value()` is always in [0.0, 1.0].
//! 2. A zero duration is clamped to 1ns, so the first tick completes.
//! 3. Descriptors never schedule anything; the host's frame callback does.

use web_time::Duration;

mod compound;
mod compute;
mod fade;
mod moves;
mod player;

pub use compound::{CompoundAnimation, ModelAnimation};
pub use compute::compute_animation;
pub use fade::{ElementFade, FadeAnimation, FadeDirection};
pub use moves::{ElementMove, MoveAnimation};
pub use player::{AnimationPlayer, Frame, Transition};

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f32) -> f32;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in (slow start).
#[inline]
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out (slow end).
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current output value, clamped to [0.0, 1.0].
    fn value(&self) -> f32;

    /// Reset the animation to its initial state.
    fn reset(&mut self);

    /// Time elapsed past completion.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// Progression from 0.0 to 1.0 over a fixed duration.
///
/// Elapsed time is accumulated as a [`Duration`], so there is no
/// floating-point drift across many small ticks.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Tween {
    /// Create a tween with ease-in-out easing.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: ease_in_out,
        }
    }

    /// Set the easing function.
    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Replace the easing in place.
    pub fn set_easing(&mut self, easing: EasingFn) {
        self.easing = easing;
    }

    /// Linear fraction elapsed / duration, in [0.0, 1.0].
    #[must_use]
    pub fn raw_progress(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }

    /// Total duration.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time accumulated so far.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.raw_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    fn overshoot(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }
}
