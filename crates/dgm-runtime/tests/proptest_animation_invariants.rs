#![forbid(unsafe_code)]

//! Property tests for [`compute_animation`] over matched trees.
//!
//! Validates:
//! - A tree matched against itself never produces a transition.
//! - Shifting nodes produces exactly one move per shifted node and nothing else.

use dgm_model::{Dimension, Element, ElementKind, Model, ModelMatcher, Point};
use dgm_runtime::{ModelAnimation, compute_animation};
use proptest::prelude::*;
use web_time::Duration;

// ============================================================================
// Strategy helpers
// ============================================================================

/// `(parent choice, x, y)` per element; element `i` hangs below the root or
/// an earlier element. Kinds cycle through node, label and edge.
fn tree_strategy(max_len: usize) -> impl Strategy<Value = Vec<(usize, i16, i16)>> {
    prop::collection::vec((any::<usize>(), any::<i16>(), any::<i16>()), 0..=max_len)
}

fn kind(i: usize, at: Point) -> ElementKind {
    match i % 3 {
        0 => ElementKind::Node {
            position: at,
            size: Dimension::EMPTY,
        },
        1 => ElementKind::Label {
            text: Some(format!("label {i}")),
            position: Some(at),
        },
        _ => ElementKind::Edge {
            source_id: "root".into(),
            target_id: format!("e{}", i - 1),
            routing_points: vec![at],
        },
    }
}

/// Build a tree; `offset(i)` is added to element `i`'s coordinates.
fn build(shape: &[(usize, i16, i16)], offset: impl Fn(usize) -> f64) -> Model {
    let mut model = Model::new(Element::new("root", "graph", ElementKind::Graph));
    for (i, (choice, x, y)) in shape.iter().enumerate() {
        let parent = match choice % (i + 1) {
            0 => "root".to_owned(),
            p => format!("e{}", p - 1),
        };
        let at = Point::new(f64::from(*x) + offset(i), f64::from(*y));
        let element = Element::new(format!("e{i}"), "element", kind(i, at));
        model.add_child(&parent, element).unwrap();
    }
    model
}

const DURATION: Duration = Duration::from_millis(100);

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn identical_trees_produce_no_transition(shape in tree_strategy(40)) {
        let model = build(&shape, |_| 0.0);
        let matches = ModelMatcher::new().match_models(&model, &model).unwrap();
        prop_assert!(compute_animation(&model, &matches, DURATION).is_none());
    }

    #[test]
    fn shifted_nodes_each_move_once(
        shape in tree_strategy(30),
        shifted in prop::collection::vec(any::<bool>(), 30),
    ) {
        let is_shifted = |i: usize| shifted[i];
        let old = build(&shape, |_| 0.0);
        let new = build(&shape, |i| if is_shifted(i) { 0.5 } else { 0.0 });
        let moved = (0..shape.len()).filter(|&i| i % 3 == 0 && is_shifted(i)).count();

        let matches = ModelMatcher::new().match_models(&old, &new).unwrap();
        match compute_animation(&new, &matches, DURATION) {
            None => prop_assert_eq!(moved, 0),
            Some(ModelAnimation::Move(moves)) => {
                prop_assert_eq!(moves.len(), moved);
                for i in (0..shape.len()).filter(|&i| i % 3 == 0 && is_shifted(i)) {
                    let id = format!("e{i}");
                    prop_assert!(moves.get(&id).is_some(), "{} did not move", id);
                }
            }
            Some(other) => prop_assert!(false, "unexpected transition: {:?}", other),
        }
    }
}
