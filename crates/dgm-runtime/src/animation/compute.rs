#![forbid(unsafe_code)]

//! Builds a transition descriptor from match records.

use dgm_model::{Element, MatchResult, Model};
use web_time::Duration;

use super::{CompoundAnimation, ElementFade, FadeAnimation, FadeDirection, ModelAnimation, MoveAnimation};

/// Derive the animation for moving from the left side of `matches` to
/// `new_root`.
///
/// Added elements fade in, removed elements fade out, and two-sided records
/// whose moveable element changed position (exact comparison) glide.
/// Returns `None` when nothing would change visually.
#[must_use]
pub fn compute_animation(
    new_root: &Model,
    matches: &MatchResult<'_>,
    duration: Duration,
) -> Option<ModelAnimation> {
    let mut fades = Vec::new();
    let mut moves = MoveAnimation::new(duration);

    for record in matches.iter() {
        match (record.left, record.right) {
            (None, Some(right)) => fades.push(ElementFade {
                element: shallow(right),
                parent_id: record.right_parent_id.map(str::to_owned),
                direction: FadeDirection::In,
            }),
            (Some(left), None) => fades.push(ElementFade {
                element: ghost(left, new_root),
                parent_id: record.left_parent_id.map(str::to_owned),
                direction: FadeDirection::Out,
            }),
            (Some(left), Some(right)) => {
                if !right.is_moveable() {
                    continue;
                }
                if let (Some(from), Some(to)) = (left.position(), right.position()) {
                    moves.insert(right.id.clone(), from, to);
                }
            }
            (None, None) => {}
        }
    }

    let fade = (!fades.is_empty()).then(|| ModelAnimation::Fade(FadeAnimation::new(fades, duration)));
    let moves = (!moves.is_empty()).then_some(ModelAnimation::Move(moves));
    match (fade, moves) {
        (None, None) => None,
        (Some(only), None) | (None, Some(only)) => Some(only),
        (Some(fade), Some(moves)) => Some(ModelAnimation::Compound(CompoundAnimation::new(vec![
            fade, moves,
        ]))),
    }
}

/// The element without its children; descendants carry their own fades.
fn shallow(element: &Element) -> Element {
    Element {
        children: Vec::new(),
        ..element.clone()
    }
}

/// Copy of a removed subtree minus anything that lives on in `new_root`.
fn ghost(element: &Element, new_root: &Model) -> Element {
    Element {
        children: element
            .children
            .iter()
            .filter(|c| !new_root.contains(&c.id))
            .map(|c| ghost(c, new_root))
            .collect(),
        ..element.clone()
    }
}
