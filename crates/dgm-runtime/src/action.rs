#![forbid(unsafe_code)]

//! Actions: the serializable intents a server (or the application) sends,
//! and the handlers that turn them into commands.
//!
//! On the wire an action is a JSON object tagged by `kind`:
//!
//! ```json
//! { "kind": "updateModel", "newRoot": { "id": "model", "type": "graph" }, "animate": true }
//! ```

use std::collections::HashMap;
use std::fmt;

use dgm_model::{ElementSchema, MatchSchema};
use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandError, CommandSource, SetModelCommand, UpdateModelCommand};

/// Every action the runtime understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Action {
    #[serde(rename = "updateModel")]
    UpdateModel(UpdateModelAction),
    #[serde(rename = "setModel")]
    SetModel(SetModelAction),
    #[serde(rename = "undo")]
    Undo,
    #[serde(rename = "redo")]
    Redo,
}

impl Action {
    /// All kinds, in declaration order.
    pub const KINDS: [&'static str; 4] = [
        UpdateModelAction::KIND,
        SetModelAction::KIND,
        Self::UNDO,
        Self::REDO,
    ];
    pub const UNDO: &'static str = "undo";
    pub const REDO: &'static str = "redo";

    /// The wire discriminant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UpdateModel(_) => UpdateModelAction::KIND,
            Self::SetModel(_) => SetModelAction::KIND,
            Self::Undo => Self::UNDO,
            Self::Redo => Self::REDO,
        }
    }

    /// Whether `kind` names a known action.
    #[must_use]
    pub fn is_known_kind(kind: &str) -> bool {
        Self::KINDS.contains(&kind)
    }
}

impl From<UpdateModelAction> for Action {
    fn from(action: UpdateModelAction) -> Self {
        Self::UpdateModel(action)
    }
}

impl From<SetModelAction> for Action {
    fn from(action: SetModelAction) -> Self {
        Self::SetModel(action)
    }
}

/// Replace the model, or apply a diff to it.
///
/// Exactly one of `new_root` and `matches` is expected; when both are
/// present the matches win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModelAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_root: Option<ElementSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<MatchSchema>>,
    #[serde(default = "default_animate")]
    pub animate: bool,
}

fn default_animate() -> bool {
    true
}

impl Default for UpdateModelAction {
    fn default() -> Self {
        Self {
            new_root: None,
            matches: None,
            animate: true,
        }
    }
}

impl UpdateModelAction {
    pub const KIND: &'static str = "updateModel";

    /// Update to a complete new root.
    #[must_use]
    pub fn with_root(new_root: ElementSchema) -> Self {
        Self {
            new_root: Some(new_root),
            ..Self::default()
        }
    }

    /// Apply a precomputed diff.
    #[must_use]
    pub fn with_matches(matches: Vec<MatchSchema>) -> Self {
        Self {
            matches: Some(matches),
            ..Self::default()
        }
    }

    /// Builder: animate or not.
    #[must_use]
    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }
}

/// Replace the model without animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetModelAction {
    pub new_root: ElementSchema,
}

impl SetModelAction {
    pub const KIND: &'static str = "setModel";

    #[must_use]
    pub fn new(new_root: ElementSchema) -> Self {
        Self { new_root }
    }
}

/// Turns an action into a command.
pub trait ActionHandler {
    /// Build the command for `action`.
    fn handle(&self, action: &Action, source: CommandSource) -> Result<Box<dyn Command>, CommandError>;
}

type CommandConstructor = Box<dyn Fn(&Action) -> Result<Box<dyn Command>, CommandError>>;

/// Handler backed by a constructor closure.
pub struct CommandActionHandler {
    constructor: CommandConstructor,
}

impl CommandActionHandler {
    /// Wrap `constructor`.
    pub fn new(
        constructor: impl Fn(&Action) -> Result<Box<dyn Command>, CommandError> + 'static,
    ) -> Self {
        Self {
            constructor: Box::new(constructor),
        }
    }

    /// Handler producing [`UpdateModelCommand`]s.
    #[must_use]
    pub fn update_model() -> Self {
        Self::new(|action| match action {
            Action::UpdateModel(a) => Ok(Box::new(UpdateModelCommand::new(a.clone())) as Box<dyn Command>),
            other => Err(unexpected(UpdateModelAction::KIND, other)),
        })
    }

    /// Handler producing [`SetModelCommand`]s.
    #[must_use]
    pub fn set_model() -> Self {
        Self::new(|action| match action {
            Action::SetModel(a) => Ok(Box::new(SetModelCommand::new(a.clone())) as Box<dyn Command>),
            other => Err(unexpected(SetModelAction::KIND, other)),
        })
    }
}

fn unexpected(expected: &str, got: &Action) -> CommandError {
    CommandError::InvalidAction(format!("expected {expected} action, got {}", got.kind()))
}

impl ActionHandler for CommandActionHandler {
    fn handle(&self, action: &Action, source: CommandSource) -> Result<Box<dyn Command>, CommandError> {
        let mut cmd = (self.constructor)(action)?;
        cmd.metadata_mut().source = source;
        Ok(cmd)
    }
}

impl fmt::Debug for CommandActionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandActionHandler").finish_non_exhaustive()
    }
}

/// Action handlers keyed by action kind.
pub struct ActionHandlerRegistry {
    handlers: HashMap<&'static str, Box<dyn ActionHandler>>,
}

impl Default for ActionHandlerRegistry {
    /// Registry with the built-in `updateModel` and `setModel` handlers.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(UpdateModelAction::KIND, CommandActionHandler::update_model());
        registry.register(SetModelAction::KIND, CommandActionHandler::set_model());
        registry
    }
}

impl ActionHandlerRegistry {
    /// Registry without any handler.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: &'static str, handler: impl ActionHandler + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    /// Remove the handler for `kind`. Returns whether one was registered.
    pub fn deregister(&mut self, kind: &str) -> bool {
        self.handlers.remove(kind).is_some()
    }

    /// The handler for `kind`.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&dyn ActionHandler> {
        self.handlers.get(kind).map(Box::as_ref)
    }

    /// Whether a handler is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }
}

impl fmt::Debug for ActionHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("ActionHandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_model_wire_format() {
        let action: Action = serde_json::from_value(json!({
            "kind": "updateModel",
            "newRoot": { "id": "model", "type": "graph", "children": [] }
        }))
        .unwrap();
        let Action::UpdateModel(update) = &action else {
            panic!("expected updateModel");
        };
        assert!(update.animate);
        assert!(update.matches.is_none());
        assert_eq!(update.new_root.as_ref().unwrap().id, "model");
        assert_eq!(action.kind(), "updateModel");
    }

    #[test]
    fn matches_and_animate_flag() {
        let action: Action = serde_json::from_value(json!({
            "kind": "updateModel",
            "animate": false,
            "matches": [ { "right": { "id": "c", "type": "node" }, "rightParentId": "model" } ]
        }))
        .unwrap();
        let Action::UpdateModel(update) = action else {
            panic!("expected updateModel");
        };
        assert!(!update.animate);
        assert_eq!(update.matches.unwrap().len(), 1);
    }

    #[test]
    fn unit_actions_round_trip() {
        let undo: Action = serde_json::from_str(r#"{ "kind": "undo" }"#).unwrap();
        assert_eq!(undo, Action::Undo);
        assert_eq!(serde_json::to_value(&Action::Redo).unwrap(), json!({ "kind": "redo" }));
        assert!(Action::is_known_kind("setModel"));
        assert!(!Action::is_known_kind("center"));
    }

    #[test]
    fn default_registry_builds_builtin_commands() {
        let registry = ActionHandlerRegistry::default();
        let action = Action::from(SetModelAction::new(ElementSchema::new("m", "graph")));
        let cmd = registry
            .get(action.kind())
            .unwrap()
            .handle(&action, CommandSource::Server)
            .unwrap();
        assert_eq!(cmd.debug_name(), "SetModelCommand");
        assert_eq!(cmd.metadata().source, CommandSource::Server);
        assert!(!registry.contains("undo"));
    }

    #[test]
    fn handler_rejects_foreign_actions() {
        let handler = CommandActionHandler::update_model();
        let err = handler.handle(&Action::Undo, CommandSource::User).unwrap_err();
        assert!(matches!(err, CommandError::InvalidAction(_)));
    }

    #[test]
    fn deregister_removes_handler() {
        let mut registry = ActionHandlerRegistry::default();
        assert!(registry.deregister("setModel"));
        assert!(!registry.contains("setModel"));
        assert!(!registry.deregister("setModel"));
    }
}
