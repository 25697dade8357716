#![forbid(unsafe_code)]

//! Frame-by-frame playback through the command stack.
//!
//! Drives the stack with a manual scheduler and synthetic timestamps, and
//! checks what the model listener receives.
//!
//! Run:
//!   cargo test -p dgm-runtime --test animation_playback

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use dgm_model::{ElementSchema, Model, Point};
use dgm_runtime::{
    AnimationConfig, CommandStack, Easing, FrameStatus, ManualFrameScheduler, RuntimeConfig,
    SetModelAction, SetModelCommand, UpdateModelAction, UpdateModelCommand,
};

type Seen = Rc<RefCell<Vec<Arc<Model>>>>;

fn config(duration_ms: u64, animate_updates: bool) -> RuntimeConfig {
    RuntimeConfig {
        animation: AnimationConfig {
            duration_ms,
            animate_updates,
            easing: Easing::Linear,
        },
        ..RuntimeConfig::default()
    }
}

fn before() -> ElementSchema {
    ElementSchema::new("model", "graph")
        .with_child(ElementSchema::new("child1", "node").with_position(0.0, 0.0))
        .with_child(ElementSchema::new("child2", "node"))
}

fn after() -> ElementSchema {
    ElementSchema::new("model", "graph")
        .with_child(ElementSchema::new("child1", "node").with_position(100.0, 0.0))
        .with_child(ElementSchema::new("child3", "node"))
}

/// A stack already showing [`before`], with the listener attached after the
/// initial set so it only records the update.
fn stack(config: &RuntimeConfig) -> (CommandStack, ManualFrameScheduler, Seen) {
    let scheduler = ManualFrameScheduler::new();
    let mut stack = CommandStack::with_config(config).with_scheduler(scheduler.clone());
    stack
        .execute(Box::new(SetModelCommand::new(SetModelAction::new(before()))))
        .unwrap();

    let seen: Seen = Rc::default();
    let sink = Rc::clone(&seen);
    stack.set_model_listener(move |root| sink.borrow_mut().push(Arc::clone(root)));
    (stack, scheduler, seen)
}

fn update(schema: ElementSchema) -> Box<UpdateModelCommand> {
    Box::new(UpdateModelCommand::new(UpdateModelAction::with_root(schema)))
}

fn opacity(model: &Model, id: &str) -> f64 {
    model.get(id).map_or(f64::NAN, |e| e.opacity)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn update_plays_from_start_to_target() {
    let (mut stack, scheduler, seen) = stack(&config(100, true));
    let old = Arc::clone(stack.root());

    stack.execute(update(after())).unwrap();
    assert!(stack.is_animating());
    assert!(Arc::ptr_eq(stack.root(), &old), "old root stays visible until the first frame");
    assert!(seen.borrow().is_empty());
    assert!(scheduler.take());

    assert_eq!(stack.on_frame(1_000.0), FrameStatus::Animating);
    {
        let frame = stack.root();
        assert_eq!(frame.get("child1").unwrap().position(), Some(Point::new(0.0, 0.0)));
        assert!(approx(opacity(frame, "child3"), 0.0));
        assert!(approx(opacity(frame, "child2"), 1.0));
    }
    assert!(scheduler.take());

    assert_eq!(stack.on_frame(1_050.0), FrameStatus::Animating);
    {
        let frame = stack.root();
        let x = frame.get("child1").unwrap().position().unwrap().x;
        assert!(approx(x, 50.0), "x = {x}");
        assert!(approx(opacity(frame, "child3"), 0.5));
        assert!(approx(opacity(frame, "child2"), 0.5));
    }
    assert!(scheduler.take());

    assert_eq!(stack.on_frame(1_100.0), FrameStatus::Completed);
    assert!(!stack.is_animating());
    assert!(Arc::ptr_eq(stack.root(), stack.committed_root()));
    assert!(!stack.root().contains("child2"));
    assert_eq!(
        stack.root().get("child1").unwrap().position(),
        Some(Point::new(100.0, 0.0))
    );
    assert!(!scheduler.take(), "no frame requested after completion");

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert!(Arc::ptr_eq(seen.last().unwrap(), stack.committed_root()));
    assert_eq!(stack.on_frame(1_200.0), FrameStatus::Idle);
}

#[test]
fn committed_root_is_known_before_playback_ends() {
    let (mut stack, _scheduler, _seen) = stack(&config(100, true));
    stack.execute(update(after())).unwrap();
    assert!(stack.committed_root().contains("child3"));
    assert!(!stack.committed_root().contains("child2"));
    assert!(stack.root().contains("child2"));
}

#[test]
fn timestamps_going_backwards_do_not_rewind() {
    let (mut stack, _scheduler, _seen) = stack(&config(100, true));
    stack.execute(update(after())).unwrap();

    stack.on_frame(0.0);
    stack.on_frame(60.0);
    let x_at_60 = stack.root().get("child1").unwrap().position().unwrap().x;
    assert_eq!(stack.on_frame(20.0), FrameStatus::Animating);
    let x_after = stack.root().get("child1").unwrap().position().unwrap().x;
    assert!(approx(x_at_60, x_after));
    assert_eq!(stack.on_frame(f64::NAN), FrameStatus::Animating);
    assert_eq!(stack.on_frame(100.0), FrameStatus::Completed);
}

#[test]
fn new_command_supersedes_running_animation() {
    let (mut stack, scheduler, seen) = stack(&config(100, true));
    stack.execute(update(after())).unwrap();
    stack.on_frame(0.0);
    stack.on_frame(30.0);
    let first_target = Arc::clone(stack.committed_root());
    assert!(scheduler.pending() > 0);

    let third = ElementSchema::new("model", "graph")
        .with_child(ElementSchema::new("child1", "node").with_position(100.0, 100.0))
        .with_child(ElementSchema::new("child3", "node"));
    stack.execute(update(third)).unwrap();

    // The stale frame request is dead; the new animation asked for its own.
    assert_eq!(scheduler.pending(), 1);
    assert!(stack.is_animating());
    // The interrupted animation snapped to its target before the new one began.
    assert!(
        seen.borrow()
            .iter()
            .any(|root| Arc::ptr_eq(root, &first_target))
    );
    assert!(Arc::ptr_eq(stack.root(), &first_target));

    let animation = stack.player().unwrap().animation();
    let moves = animation.moves().unwrap();
    let child1 = moves.get("child1").unwrap();
    assert_eq!(child1.from_position, Point::new(100.0, 0.0));
    assert_eq!(child1.to_position, Point::new(100.0, 100.0));
    assert!(animation.fade().is_none());

    stack.on_frame(500.0);
    assert_eq!(stack.on_frame(600.0), FrameStatus::Completed);
    assert_eq!(
        stack.root().get("child1").unwrap().position(),
        Some(Point::new(100.0, 100.0))
    );
}

#[test]
fn undo_during_playback_restores_previous_root() {
    let (mut stack, scheduler, _seen) = stack(&config(100, true));
    let old = Arc::clone(stack.root());
    stack.execute(update(after())).unwrap();
    stack.on_frame(0.0);
    stack.on_frame(50.0);

    assert_eq!(stack.undo().unwrap().unwrap(), "Update model");
    assert!(!stack.is_animating());
    assert!(Arc::ptr_eq(stack.root(), &old));
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(stack.on_frame(60.0), FrameStatus::Idle);

    assert!(stack.redo().unwrap().is_ok());
    assert!(!stack.is_animating(), "redo jumps straight to the committed root");
    assert!(stack.root().contains("child3"));
}

#[test]
fn disabled_animations_commit_immediately() {
    let (mut stack, scheduler, seen) = stack(&config(100, false));
    stack.execute(update(after())).unwrap();
    assert!(!stack.is_animating());
    assert!(!scheduler.take());
    assert!(stack.root().contains("child3"));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn zero_duration_completes_on_first_advancing_frame() {
    let (mut stack, _scheduler, _seen) = stack(&config(0, true));
    stack.execute(update(after())).unwrap();
    assert!(stack.is_animating());
    assert_eq!(stack.on_frame(10.0), FrameStatus::Animating);
    assert_eq!(stack.on_frame(11.0), FrameStatus::Completed);
    assert!(Arc::ptr_eq(stack.root(), stack.committed_root()));
}

#[test]
fn unrelated_root_is_not_animated() {
    let (mut stack, _scheduler, _seen) = stack(&config(100, true));
    stack
        .execute(update(ElementSchema::new("other", "graph")))
        .unwrap();
    assert!(!stack.is_animating());
    assert_eq!(stack.root().id(), "other");
}
