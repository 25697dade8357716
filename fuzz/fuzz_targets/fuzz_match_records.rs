#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use dgm_model::{ElementSchema, MatchSchema, ModelFactory};
use dgm_runtime::{
    Command, CommandExecutionContext, UpdateModelAction, UpdateModelCommand,
};
use libfuzzer_sys::fuzz_target;

/// Ids are drawn from a small space so records collide with the model.
#[derive(Debug, Arbitrary)]
struct Record {
    left: Option<(u8, i8)>,
    right: Option<(u8, i8)>,
    left_parent: u8,
    right_parent: u8,
}

#[derive(Debug, Arbitrary)]
struct Input {
    initial: Vec<(u8, i8)>,
    records: Vec<Record>,
    animate: bool,
}

fn id(n: u8) -> String {
    format!("n{}", n % 8)
}

fn parent(n: u8) -> String {
    match n % 4 {
        0 => "root".to_owned(),
        p => id(p),
    }
}

fn node((n, x): (u8, i8)) -> ElementSchema {
    ElementSchema::new(id(n), "node").with_position(f64::from(x), 0.0)
}

fuzz_target!(|input: Input| {
    let factory = ModelFactory::new();
    let mut seen = std::collections::BTreeSet::new();
    let root = ElementSchema::new("root", "graph").with_children(
        input
            .initial
            .iter()
            .filter(|(n, _)| seen.insert(n % 8))
            .map(|&child| node(child)),
    );
    let old = Arc::new(factory.create_root(&root));

    let matches = input
        .records
        .iter()
        .map(|r| MatchSchema {
            left: r.left.map(node),
            right: r.right.map(node),
            left_parent_id: Some(parent(r.left_parent)),
            right_parent_id: Some(parent(r.right_parent)),
        })
        .collect();
    let mut cmd = UpdateModelCommand::new(
        UpdateModelAction::with_matches(matches).animate(input.animate),
    );
    let ctx = CommandExecutionContext::new(Arc::clone(&old), &factory);

    // Malformed diffs are rejected; accepted ones yield a valid tree.
    if let Ok(outcome) = cmd.execute(&ctx) {
        outcome.committed_root().validate().unwrap();
        let undone = cmd.undo(&ctx).unwrap();
        assert!(Arc::ptr_eq(&undone.root, &old));
    }
});
