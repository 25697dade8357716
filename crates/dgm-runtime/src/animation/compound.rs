#![forbid(unsafe_code)]

//! The animation descriptor returned by the engine, and its compound form.

use dgm_model::Model;
use web_time::Duration;

use super::{Animation, EasingFn, FadeAnimation, MoveAnimation};

/// A model transition: fade, move, or both.
#[derive(Debug, Clone)]
pub enum ModelAnimation {
    Fade(FadeAnimation),
    Move(MoveAnimation),
    Compound(CompoundAnimation),
}

impl ModelAnimation {
    /// Builder: replace the easing everywhere in this descriptor.
    #[must_use]
    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.set_easing(easing);
        self
    }

    /// Replace the easing everywhere in this descriptor.
    pub fn set_easing(&mut self, easing: EasingFn) {
        match self {
            Self::Fade(fade) => fade.set_easing(easing),
            Self::Move(moves) => moves.set_easing(easing),
            Self::Compound(compound) => {
                for component in &mut compound.components {
                    component.set_easing(easing);
                }
            }
        }
    }

    /// Write the current interpolation into `frame`.
    pub fn apply(&self, frame: &mut Model) {
        match self {
            Self::Fade(fade) => fade.apply(frame),
            Self::Move(moves) => moves.apply(frame),
            Self::Compound(compound) => compound.apply(frame),
        }
    }

    /// Total duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self {
            Self::Fade(fade) => fade.duration(),
            Self::Move(moves) => moves.duration(),
            Self::Compound(compound) => compound.duration(),
        }
    }

    /// The fade part, if any.
    #[must_use]
    pub fn fade(&self) -> Option<&FadeAnimation> {
        match self {
            Self::Fade(fade) => Some(fade),
            Self::Move(_) => None,
            Self::Compound(compound) => compound.components.iter().find_map(Self::fade),
        }
    }

    /// The move part, if any.
    #[must_use]
    pub fn moves(&self) -> Option<&MoveAnimation> {
        match self {
            Self::Move(moves) => Some(moves),
            Self::Fade(_) => None,
            Self::Compound(compound) => compound.components.iter().find_map(Self::moves),
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Fade(_) => "fade",
            Self::Move(_) => "move",
            Self::Compound(_) => "compound",
        }
    }

    fn as_animation(&self) -> &dyn Animation {
        match self {
            Self::Fade(fade) => fade,
            Self::Move(moves) => moves,
            Self::Compound(compound) => compound,
        }
    }

    fn as_animation_mut(&mut self) -> &mut dyn Animation {
        match self {
            Self::Fade(fade) => fade,
            Self::Move(moves) => moves,
            Self::Compound(compound) => compound,
        }
    }
}

impl Animation for ModelAnimation {
    fn tick(&mut self, dt: Duration) {
        self.as_animation_mut().tick(dt);
    }

    fn is_complete(&self) -> bool {
        self.as_animation().is_complete()
    }

    fn value(&self) -> f32 {
        self.as_animation().value()
    }

    fn reset(&mut self) {
        self.as_animation_mut().reset();
    }

    fn overshoot(&self) -> Duration {
        self.as_animation().overshoot()
    }
}

/// Independent animations played on one time base.
///
/// Every tick is forwarded to all components; the compound completes when
/// the last component does. Components are applied in order.
#[derive(Debug, Clone)]
pub struct CompoundAnimation {
    pub components: Vec<ModelAnimation>,
}

impl CompoundAnimation {
    /// Bundle `components`.
    #[must_use]
    pub fn new(components: Vec<ModelAnimation>) -> Self {
        Self { components }
    }

    /// Longest component duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.components
            .iter()
            .map(ModelAnimation::duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Apply every component to `frame`, in order.
    pub fn apply(&self, frame: &mut Model) {
        for component in &self.components {
            component.apply(frame);
        }
    }
}

impl Animation for CompoundAnimation {
    fn tick(&mut self, dt: Duration) {
        for component in &mut self.components {
            component.tick(dt);
        }
    }

    fn is_complete(&self) -> bool {
        self.components.iter().all(Animation::is_complete)
    }

    fn value(&self) -> f32 {
        self.components
            .iter()
            .map(Animation::value)
            .fold(1.0_f32, f32::min)
    }

    fn reset(&mut self) {
        for component in &mut self.components {
            component.reset();
        }
    }

    fn overshoot(&self) -> Duration {
        self.components
            .iter()
            .map(Animation::overshoot)
            .min()
            .unwrap_or(Duration::ZERO)
    }
}
