#![forbid(unsafe_code)]

//! Model factory: schema trees to live element trees.
//!
//! The factory dispatches on the basic type of each schema (see
//! [`basic_type`](crate::schema::basic_type)) and materializes children
//! recursively, wiring each child's parent reference on the way down.
//! Unrecognized discriminants become [`ElementKind::Generic`] elements;
//! that is leniency, not an error.
//!
//! Typed fields the element's kind has no slot for (a `position` on a
//! compartment, a `size` on a label) are kept in [`Element::extra`] under
//! their wire names, so [`Element::to_schema`] gives back the input.

use serde_json::Value;

use crate::element::{Element, ElementKind, Model};
use crate::geometry::{Dimension, Point};
use crate::schema::{ElementSchema, fields, types};

/// Input to the factory: either a wire schema or an already live element.
#[derive(Debug, Clone)]
pub enum ElementSource<'a> {
    Schema(&'a ElementSchema),
    Live(Element),
}

impl<'a> From<&'a ElementSchema> for ElementSource<'a> {
    fn from(schema: &'a ElementSchema) -> Self {
        Self::Schema(schema)
    }
}

impl From<Element> for ElementSource<'_> {
    fn from(element: Element) -> Self {
        Self::Live(element)
    }
}

/// Builds live elements from schemas.
///
/// Stateless; one instance can be shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelFactory;

impl ModelFactory {
    /// Create a factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build a root model.
    ///
    /// A live element is adopted as the root unchanged (its parent reference
    /// is cleared). A schema whose basic type is `graph` becomes a graph
    /// root; any other type becomes a generic root.
    #[must_use]
    pub fn create_root<'a>(&self, source: impl Into<ElementSource<'a>>) -> Model {
        match source.into() {
            ElementSource::Live(element) => Model::new(element),
            ElementSource::Schema(schema) => Model::new(self.build(schema, None)),
        }
    }

    /// Build one element below `parent_id`.
    ///
    /// A live element is re-parented in place (only when a parent is given)
    /// and returned otherwise untouched, so already materialized subtrees
    /// can be reused.
    #[must_use]
    pub fn create_element<'a>(
        &self,
        source: impl Into<ElementSource<'a>>,
        parent_id: Option<&str>,
    ) -> Element {
        match source.into() {
            ElementSource::Live(mut element) => {
                if let Some(parent_id) = parent_id {
                    element.parent_id = Some(parent_id.to_owned());
                }
                element
            }
            ElementSource::Schema(schema) => self.build(schema, parent_id),
        }
    }

    /// Convert a live element back to its schema.
    #[must_use]
    pub fn to_schema(&self, element: &Element) -> ElementSchema {
        element.to_schema()
    }

    fn build(&self, schema: &ElementSchema, parent_id: Option<&str>) -> Element {
        let mut element = Element::new(schema.id.clone(), schema.ty.clone(), Self::kind_of(schema));
        element.parent_id = parent_id.map(str::to_owned);
        element.extra = schema.extra.clone();
        Self::carry_unheld(schema, &mut element);
        element.children = schema
            .children
            .iter()
            .map(|child| self.build(child, Some(&schema.id)))
            .collect();
        element
    }

    fn carry_unheld(schema: &ElementSchema, element: &mut Element) {
        let typed = [
            (fields::POSITION, schema.position.and_then(|p| serde_json::to_value(p).ok())),
            (fields::SIZE, schema.size.and_then(|s| serde_json::to_value(s).ok())),
            (fields::SOURCE_ID, schema.source_id.clone().map(Value::String)),
            (fields::TARGET_ID, schema.target_id.clone().map(Value::String)),
            (
                fields::ROUTING_POINTS,
                (!schema.routing_points.is_empty())
                    .then(|| serde_json::to_value(&schema.routing_points).ok())
                    .flatten(),
            ),
            (fields::TEXT, schema.text.clone().map(Value::String)),
        ];
        for (field, value) in typed {
            if let Some(value) = value
                && !element.kind.holds(field)
            {
                element.extra.insert(field.to_owned(), value);
            }
        }
    }

    fn kind_of(schema: &ElementSchema) -> ElementKind {
        match schema.basic_type() {
            types::GRAPH => ElementKind::Graph,
            types::NODE => ElementKind::Node {
                position: schema.position.unwrap_or(Point::ORIGIN),
                size: schema.size.unwrap_or(Dimension::EMPTY),
            },
            types::EDGE => ElementKind::Edge {
                source_id: schema.source_id.clone().unwrap_or_default(),
                target_id: schema.target_id.clone().unwrap_or_default(),
                routing_points: schema.routing_points.clone(),
            },
            types::LABEL => ElementKind::Label {
                text: schema.text.clone(),
                position: schema.position,
            },
            types::COMPARTMENT => ElementKind::Compartment {
                size: schema.size.unwrap_or(Dimension::EMPTY),
            },
            _other => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    target: "dgm.factory",
                    id = %schema.id,
                    ty = %_other,
                    "unrecognized element type, using generic element"
                );
                ElementKind::Generic
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> ElementSchema {
        ElementSchema::new("model", "graph")
            .with_child(
                ElementSchema::new("n1", "node:circle")
                    .with_position(10.0, 20.0)
                    .with_child(ElementSchema::new("n1-label", "label").with_text("hello")),
            )
            .with_child(ElementSchema::new("e1", "edge").with_endpoints("n1", "n2"))
            .with_child(ElementSchema::new("c1", "comp").with_size(5.0, 6.0))
            .with_child(ElementSchema::new("x1", "widget"))
    }

    #[test]
    fn dispatches_on_basic_type() {
        let model = ModelFactory::new().create_root(&graph());
        assert_eq!(model.root().kind, ElementKind::Graph);
        assert_eq!(model.get("n1").unwrap().kind.name(), "node");
        assert_eq!(model.get("n1").unwrap().ty, "node:circle");
        assert_eq!(model.get("n1-label").unwrap().kind.name(), "label");
        assert_eq!(model.get("e1").unwrap().kind.name(), "edge");
        assert_eq!(model.get("c1").unwrap().kind.name(), "compartment");
        assert_eq!(model.get("x1").unwrap().kind, ElementKind::Generic);
    }

    #[test]
    fn wires_parent_references() {
        let model = ModelFactory::new().create_root(&graph());
        model.validate().unwrap();
        assert_eq!(model.root().parent_id, None);
        assert_eq!(model.get("n1-label").unwrap().parent_id.as_deref(), Some("n1"));
    }

    #[test]
    fn non_graph_root_is_generic() {
        let model = ModelFactory::new().create_root(&ElementSchema::new("model", "graph2"));
        assert_eq!(model.root().kind, ElementKind::Generic);
        assert_eq!(model.ty(), "graph2");
    }

    #[test]
    fn node_without_position_sits_at_origin() {
        let schema = ElementSchema::new("n", "node");
        let element = ModelFactory::new().create_element(&schema, Some("g"));
        assert_eq!(element.position(), Some(Point::ORIGIN));
        assert_eq!(element.parent_id.as_deref(), Some("g"));
    }

    #[test]
    fn live_element_is_reparented_not_rebuilt() {
        let factory = ModelFactory::new();
        let mut live = factory.create_element(&ElementSchema::new("n", "node"), Some("a"));
        live.opacity = 0.25;

        let same = factory.create_element(live.clone(), None);
        assert_eq!(same, live);

        let moved = factory.create_element(live.clone(), Some("b"));
        assert_eq!(moved.parent_id.as_deref(), Some("b"));
        assert_eq!(moved.opacity, 0.25);
    }

    #[test]
    fn schema_is_not_mutated() {
        let schema = graph();
        let before = schema.clone();
        let _ = ModelFactory::new().create_root(&schema);
        assert_eq!(schema, before);
    }

    #[test]
    fn fields_without_a_slot_survive_a_round_trip() {
        let schema = ElementSchema::new("model", "graph")
            .with_position(9.0, 9.0)
            .with_child(ElementSchema::new("c1", "comp").with_position(3.0, 4.0))
            .with_child(
                ElementSchema::new("p1", "port")
                    .with_position(1.0, 2.0)
                    .with_size(5.0, 5.0)
                    .with_text("in")
                    .with_extra("side", serde_json::json!("west")),
            )
            .with_child(ElementSchema::new("l1", "label").with_size(7.0, 8.0))
            .with_child(ElementSchema::new("x1", "widget").with_endpoints("a", "b"));
        let factory = ModelFactory::new();
        let model = factory.create_root(&schema);

        let port = model.get("p1").unwrap();
        assert_eq!(port.kind, ElementKind::Generic);
        assert_eq!(port.extra.get("position"), Some(&serde_json::json!({ "x": 1.0, "y": 2.0 })));
        assert_eq!(model.get("l1").unwrap().position(), None);

        assert_eq!(model.to_schema(), schema);
    }

    #[test]
    fn label_without_text_or_position_stays_bare() {
        let schema = ElementSchema::new("l", "label");
        let element = ModelFactory::new().create_element(&schema, None);
        assert_eq!(element.position(), None);
        assert_eq!(element.to_schema(), schema);
    }

    #[test]
    fn to_schema_round_trips() {
        let schema = graph();
        let factory = ModelFactory::new();
        let model = factory.create_root(&schema);
        let back = factory.create_root(&model.to_schema());
        assert_eq!(back, model);
    }
}
