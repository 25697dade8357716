#![forbid(unsafe_code)]

//! Opacity ramps for added and removed elements.

use dgm_model::{Element, Model};
use web_time::Duration;

use super::{Animation, EasingFn, Tween};

/// Whether an element appears or disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FadeDirection {
    /// Opacity 0 → 1.
    In,
    /// Opacity 1 → 0.
    Out,
}

/// One element's fade.
///
/// For [`FadeDirection::Out`] the element is a ghost copy of the removed
/// element (children that survive elsewhere in the new model are stripped)
/// and `parent_id` names where it lived, so playback can keep it on screen
/// while it fades.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementFade {
    pub element: Element,
    pub parent_id: Option<String>,
    pub direction: FadeDirection,
}

impl ElementFade {
    /// Opacity at eased progress `t`.
    #[inline]
    #[must_use]
    pub fn opacity_at(&self, t: f32) -> f64 {
        let t = f64::from(t.clamp(0.0, 1.0));
        match self.direction {
            FadeDirection::In => t,
            FadeDirection::Out => 1.0 - t,
        }
    }
}

/// Fades for every added and removed element of an update.
#[derive(Debug, Clone)]
pub struct FadeAnimation {
    pub element_fades: Vec<ElementFade>,
    clock: Tween,
}

impl FadeAnimation {
    /// Create a fade over `duration`.
    #[must_use]
    pub fn new(element_fades: Vec<ElementFade>, duration: Duration) -> Self {
        Self {
            element_fades,
            clock: Tween::new(duration),
        }
    }

    /// Replace the easing function.
    pub fn set_easing(&mut self, easing: EasingFn) {
        self.clock.set_easing(easing);
    }

    /// Total duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.clock.duration()
    }

    /// Fades in the given direction.
    pub fn fades(&self, direction: FadeDirection) -> impl Iterator<Item = &ElementFade> {
        self.element_fades
            .iter()
            .filter(move |f| f.direction == direction)
    }

    /// Write the current opacities into `frame`.
    ///
    /// Elements missing from the frame are skipped.
    pub fn apply(&self, frame: &mut Model) {
        let t = self.clock.value();
        for fade in &self.element_fades {
            if let Some(element) = frame.get_mut(&fade.element.id) {
                element.opacity = fade.opacity_at(t);
            }
        }
    }
}

impl Animation for FadeAnimation {
    fn tick(&mut self, dt: Duration) {
        self.clock.tick(dt);
    }

    fn is_complete(&self) -> bool {
        self.clock.is_complete()
    }

    fn value(&self) -> f32 {
        self.clock.value()
    }

    fn reset(&mut self) {
        self.clock.reset();
    }

    fn overshoot(&self) -> Duration {
        self.clock.overshoot()
    }
}
