#![forbid(unsafe_code)]

//! Position tweening for relocated nodes.

use std::collections::BTreeMap;

use dgm_model::{Model, Point};
use web_time::Duration;

use super::{Animation, EasingFn, Tween};

/// One element's relocation. `from_position != to_position` always.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementMove<'a> {
    pub element_id: &'a str,
    pub from_position: Point,
    pub to_position: Point,
}

/// Owned storage for [`ElementMove`].
#[derive(Debug, Clone, PartialEq)]
struct MoveEntry {
    from_position: Point,
    to_position: Point,
}

/// Moves for every relocated element of an update, keyed by element id.
#[derive(Debug, Clone)]
pub struct MoveAnimation {
    element_moves: BTreeMap<String, MoveEntry>,
    clock: Tween,
}

impl MoveAnimation {
    /// Create an empty move animation over `duration`.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            element_moves: BTreeMap::new(),
            clock: Tween::new(duration),
        }
    }

    /// Register a relocation. Returns `false` (and records nothing) when the
    /// two positions are equal.
    pub fn insert(&mut self, element_id: impl Into<String>, from: Point, to: Point) -> bool {
        if from == to {
            return false;
        }
        self.element_moves.insert(
            element_id.into(),
            MoveEntry {
                from_position: from,
                to_position: to,
            },
        );
        true
    }

    /// The move registered for `element_id`.
    #[must_use]
    pub fn get(&self, element_id: &str) -> Option<ElementMove<'_>> {
        self.element_moves
            .get_key_value(element_id)
            .map(|(id, entry)| ElementMove {
                element_id: id,
                from_position: entry.from_position,
                to_position: entry.to_position,
            })
    }

    /// All moves in id order.
    pub fn element_moves(&self) -> impl Iterator<Item = ElementMove<'_>> {
        self.element_moves.iter().map(|(id, entry)| ElementMove {
            element_id: id,
            from_position: entry.from_position,
            to_position: entry.to_position,
        })
    }

    /// Number of moved elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.element_moves.len()
    }

    /// Whether nothing moves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.element_moves.is_empty()
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

    /// Write the interpolated positions into `frame`.
    pub fn apply(&self, frame: &mut Model) {
        let t = f64::from(self.clock.value());
        for (id, entry) in &self.element_moves {
            if let Some(element) = frame.get_mut(id) {
                element.set_position(entry.from_position.lerp(entry.to_position, t));
            }
        }
    }
}

impl Animation for MoveAnimation {
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
