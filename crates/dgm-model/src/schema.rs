#![forbid(unsafe_code)]

//! Wire format for diagram elements.
//!
//! An [`ElementSchema`] is the plain, serializable description of an element
//! as exchanged with a server. The [`ModelFactory`](crate::ModelFactory)
//! turns schemas into a live [`Element`](crate::Element) tree.
//!
//! ```json
//! {
//!   "id": "graph",
//!   "type": "graph",
//!   "children": [
//!     { "id": "n1", "type": "node:circle", "position": { "x": 10, "y": 20 } },
//!     { "id": "e1", "type": "edge", "sourceId": "n1", "targetId": "n2" }
//!   ]
//! }
//! ```
//!
//! Fields the schema does not model explicitly are kept in [`ElementSchema::extra`]
//! so they survive a round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geometry::{Dimension, Point};

/// Identifier of the canonical empty model.
pub const EMPTY_ROOT_ID: &str = "EMPTY";
/// Type of the canonical empty model.
pub const EMPTY_ROOT_TYPE: &str = "NONE";

/// Basic type discriminants understood by the factory.
pub mod types {
    pub const GRAPH: &str = "graph";
    pub const NODE: &str = "node";
    pub const EDGE: &str = "edge";
    pub const LABEL: &str = "label";
    pub const COMPARTMENT: &str = "comp";
}

/// Wire names of the typed schema fields.
pub mod fields {
    pub const POSITION: &str = "position";
    pub const SIZE: &str = "size";
    pub const SOURCE_ID: &str = "sourceId";
    pub const TARGET_ID: &str = "targetId";
    pub const ROUTING_POINTS: &str = "routingPoints";
    pub const TEXT: &str = "text";
}

/// Serializable description of a model element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routing_points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attributes not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ElementSchema {
    /// Create a schema with just an id and a type.
    #[must_use]
    pub fn new(id: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ty: ty.into(),
            ..Self::default()
        }
    }

    /// The canonical empty model used before the first server update.
    #[must_use]
    pub fn empty_root() -> Self {
        Self::new(EMPTY_ROOT_ID, EMPTY_ROOT_TYPE)
    }

    /// Builder: set the position.
    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    /// Builder: set the size.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Some(Dimension::new(width, height));
        self
    }

    /// Builder: set edge endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_id = Some(source.into());
        self.target_id = Some(target.into());
        self
    }

    /// Builder: set label text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child.
    #[must_use]
    pub fn with_child(mut self, child: ElementSchema) -> Self {
        self.children.push(child);
        self
    }

    /// Builder: replace all children.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = ElementSchema>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    /// Builder: set an attribute that has no dedicated field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The basic type, i.e. the type up to the first `:`.
    #[must_use]
    pub fn basic_type(&self) -> &str {
        basic_type(&self.ty)
    }

    /// The sub-type after the first `:`, if any.
    #[must_use]
    pub fn sub_type(&self) -> Option<&str> {
        self.ty.split_once(':').map(|(_, sub)| sub)
    }
}

/// The part of a type string before the first `:`.
///
/// `"node:circle"` has basic type `"node"`; `"node"` is its own basic type.
#[must_use]
pub fn basic_type(ty: &str) -> &str {
    ty.split_once(':').map_or(ty, |(basic, _)| basic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn basic_type_strips_sub_type() {
        assert_eq!(basic_type("node:circle"), "node");
        assert_eq!(basic_type("node"), "node");
        assert_eq!(basic_type("a:b:c"), "a");
        let schema = ElementSchema::new("n", "node:circle");
        assert_eq!(schema.basic_type(), "node");
        assert_eq!(schema.sub_type(), Some("circle"));
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let schema: ElementSchema = serde_json::from_value(json!({
            "id": "e1",
            "type": "edge",
            "sourceId": "a",
            "targetId": "b",
            "routingPoints": [{ "x": 1.0, "y": 2.0 }]
        }))
        .unwrap();
        assert_eq!(schema.source_id.as_deref(), Some("a"));
        assert_eq!(schema.target_id.as_deref(), Some("b"));
        assert_eq!(schema.routing_points, vec![Point::new(1.0, 2.0)]);
        assert!(schema.children.is_empty());
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let value = json!({
            "id": "n1",
            "type": "node",
            "cssClass": "highlight",
            "expanded": true
        });
        let schema: ElementSchema = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(schema.extra.get("cssClass"), Some(&json!("highlight")));
        assert_eq!(serde_json::to_value(&schema).unwrap(), value);
    }

    #[test]
    fn empty_root_is_canonical() {
        let root = ElementSchema::empty_root();
        assert_eq!(root.id, EMPTY_ROOT_ID);
        assert_eq!(root.ty, EMPTY_ROOT_TYPE);
        assert!(root.children.is_empty());
    }
}
