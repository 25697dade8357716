#![forbid(unsafe_code)]

//! Live element tree.
//!
//! Elements own their children. The link back to the container is an
//! identifier ([`Element::parent_id`]), never a pointer, so a tree is plain
//! data that can be cloned into an immutable snapshot.
//!
//! # Invariants
//!
//! 1. Identifiers are unique across a [`Model`].
//! 2. Every child's `parent_id` equals the id of the element that contains it.
//! 3. The model root has no parent.
//!
//! [`Model::validate`] checks all three.

use std::collections::HashSet;
use std::mem;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::geometry::{Dimension, Point};
use crate::schema::{ElementSchema, basic_type, fields};

/// Kind-specific attributes of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// Diagram root.
    Graph,
    /// A positioned box.
    Node { position: Point, size: Dimension },
    /// A connection between two elements.
    Edge {
        source_id: String,
        target_id: String,
        routing_points: Vec<Point>,
    },
    /// Text attached to a node or edge. Both attributes are optional on the wire.
    Label {
        text: Option<String>,
        position: Option<Point>,
    },
    /// A layout container inside a node.
    Compartment { size: Dimension },
    /// Anything with an unrecognized type discriminant.
    Generic,
}

impl ElementKind {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Node { .. } => "node",
            Self::Edge { .. } => "edge",
            Self::Label { .. } => "label",
            Self::Compartment { .. } => "compartment",
            Self::Generic => "generic",
        }
    }

    /// Whether this kind holds the typed wire field `field` itself.
    ///
    /// Fields a kind does not hold travel in [`Element::extra`].
    #[must_use]
    pub fn holds(&self, field: &str) -> bool {
        match self {
            Self::Graph | Self::Generic => false,
            Self::Node { .. } => matches!(field, fields::POSITION | fields::SIZE),
            Self::Edge { .. } => matches!(
                field,
                fields::SOURCE_ID | fields::TARGET_ID | fields::ROUTING_POINTS
            ),
            Self::Label { .. } => matches!(field, fields::TEXT | fields::POSITION),
            Self::Compartment { .. } => field == fields::SIZE,
        }
    }
}

/// A node of the live model tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    /// Full type string, including any sub-type (`"node:circle"`).
    pub ty: String,
    pub kind: ElementKind,
    pub children: Vec<Element>,
    /// Identifier of the containing element; `None` for a root.
    pub parent_id: Option<String>,
    /// Visual opacity in [0, 1]. Only animation frames change it.
    pub opacity: f64,
    /// Attributes carried over from the schema without interpretation.
    pub extra: Map<String, Value>,
}

impl Element {
    /// Create a childless, parentless element.
    #[must_use]
    pub fn new(id: impl Into<String>, ty: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            ty: ty.into(),
            kind,
            children: Vec::new(),
            parent_id: None,
            opacity: 1.0,
            extra: Map::new(),
        }
    }

    /// The type up to the first `:`.
    #[must_use]
    pub fn basic_type(&self) -> &str {
        basic_type(&self.ty)
    }

    /// Position, for kinds that have one.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match &self.kind {
            ElementKind::Node { position, .. } => Some(*position),
            ElementKind::Label { position, .. } => *position,
            _ => None,
        }
    }

    /// Overwrite the position. Returns `false` for kinds without one.
    pub fn set_position(&mut self, to: Point) -> bool {
        match &mut self.kind {
            ElementKind::Node { position, .. } => *position = to,
            ElementKind::Label { position, .. } => *position = Some(to),
            _ => return false,
        }
        true
    }

    /// Whether relocations of this element are animated.
    ///
    /// Labels have a position but follow their owner.
    #[must_use]
    pub fn is_moveable(&self) -> bool {
        matches!(self.kind, ElementKind::Node { .. })
    }

    /// Find an element by id in this subtree (including `self`).
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Element> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Mutable variant of [`find`](Self::find).
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Pre-order traversal of this subtree.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Detach the descendant `id` from wherever it lives below `self`.
    fn detach(&mut self, id: &str) -> Option<Element> {
        if let Some(pos) = self.children.iter().position(|c| c.id == id) {
            return Some(self.children.remove(pos));
        }
        self.children.iter_mut().find_map(|c| c.detach(id))
    }

    /// Approximate heap + inline footprint of this subtree.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.iter()
            .map(|e| {
                let kind_bytes = match &e.kind {
                    ElementKind::Edge {
                        source_id,
                        target_id,
                        routing_points,
                    } => {
                        source_id.len()
                            + target_id.len()
                            + routing_points.len() * mem::size_of::<Point>()
                    }
                    ElementKind::Label { text, .. } => text.as_ref().map_or(0, String::len),
                    _ => 0,
                };
                mem::size_of::<Element>()
                    + e.id.len()
                    + e.ty.len()
                    + kind_bytes
                    + e.extra.len() * mem::size_of::<Value>()
            })
            .sum()
    }

    /// Convert back to the wire form. Opacity is a view concern and is dropped.
    ///
    /// Typed fields carried in `extra` are moved back to their own slots.
    #[must_use]
    pub fn to_schema(&self) -> ElementSchema {
        let mut schema = ElementSchema {
            id: self.id.clone(),
            ty: self.ty.clone(),
            children: self.children.iter().map(Element::to_schema).collect(),
            extra: self.extra.clone(),
            ..ElementSchema::default()
        };
        match &self.kind {
            ElementKind::Graph | ElementKind::Generic => {}
            ElementKind::Node { position, size } => {
                schema.position = Some(*position);
                schema.size = size.is_valid().then_some(*size);
            }
            ElementKind::Edge {
                source_id,
                target_id,
                routing_points,
            } => {
                schema.source_id = Some(source_id.clone());
                schema.target_id = Some(target_id.clone());
                schema.routing_points = routing_points.clone();
            }
            ElementKind::Label { text, position } => {
                schema.text.clone_from(text);
                schema.position = *position;
            }
            ElementKind::Compartment { size } => {
                schema.size = size.is_valid().then_some(*size);
            }
        }
        let extra = &mut schema.extra;
        if schema.position.is_none() {
            schema.position = take_field(extra, fields::POSITION);
        }
        if schema.size.is_none() {
            schema.size = take_field(extra, fields::SIZE);
        }
        if schema.source_id.is_none() {
            schema.source_id = take_field(extra, fields::SOURCE_ID);
        }
        if schema.target_id.is_none() {
            schema.target_id = take_field(extra, fields::TARGET_ID);
        }
        if schema.routing_points.is_empty() {
            schema.routing_points = take_field(extra, fields::ROUTING_POINTS).unwrap_or_default();
        }
        if schema.text.is_none() {
            schema.text = take_field(extra, fields::TEXT);
        }
        schema
    }
}

/// Remove `field` from `extra` if it decodes as `T`; otherwise leave it there.
fn take_field<T: DeserializeOwned>(extra: &mut Map<String, Value>, field: &str) -> Option<T> {
    let decoded = serde_json::from_value(extra.get(field)?.clone()).ok()?;
    extra.remove(field);
    Some(decoded)
}

/// Pre-order iterator over an element subtree.
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// A complete diagram: a root element and everything below it.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    root: Element,
}

impl Model {
    /// Wrap a root element. Any parent reference on it is cleared.
    #[must_use]
    pub fn new(mut root: Element) -> Self {
        root.parent_id = None;
        Self { root }
    }

    /// The root element.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Identifier of the root.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.root.id
    }

    /// Type string of the root.
    #[inline]
    #[must_use]
    pub fn ty(&self) -> &str {
        &self.root.ty
    }

    /// Look up an element anywhere in the tree.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.root.find(id)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.root.find_mut(id)
    }

    /// Whether an element with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Pre-order traversal starting at the root.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        self.root.iter()
    }

    /// Number of elements, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Always false: a model has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Append `element` to the children of `parent_id`.
    ///
    /// The element's own parent reference is rewritten; ids inside the
    /// element must not already exist in the model.
    pub fn add_child(&mut self, parent_id: &str, mut element: Element) -> ModelResult<()> {
        if let Some(dup) = element.iter().find(|e| self.contains(&e.id)) {
            return Err(ModelError::DuplicateId(dup.id.clone()));
        }
        let parent = self
            .root
            .find_mut(parent_id)
            .ok_or_else(|| ModelError::UnknownElement(parent_id.to_owned()))?;
        element.parent_id = Some(parent.id.clone());
        parent.children.push(element);
        Ok(())
    }

    /// Detach the subtree rooted at `id` and return it.
    pub fn remove(&mut self, id: &str) -> ModelResult<Element> {
        if self.root.id == id {
            return Err(ModelError::RootElement(id.to_owned()));
        }
        self.root
            .detach(id)
            .ok_or_else(|| ModelError::UnknownElement(id.to_owned()))
    }

    /// Check identifier uniqueness and parent links.
    pub fn validate(&self) -> ModelResult<()> {
        let mut seen = HashSet::new();
        for element in self.iter() {
            if element.id.is_empty() {
                return Err(ModelError::MissingId {
                    ty: element.ty.clone(),
                });
            }
            if !seen.insert(element.id.as_str()) {
                return Err(ModelError::DuplicateId(element.id.clone()));
            }
            for child in &element.children {
                if child.parent_id.as_deref() != Some(element.id.as_str()) {
                    return Err(ModelError::ParentMismatch {
                        child: child.id.clone(),
                        container: element.id.clone(),
                        declared: child.parent_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Approximate memory footprint, used for history budgeting.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        mem::size_of::<Self>() + self.root.size_bytes()
    }

    /// Convert the whole tree back to the wire form.
    #[must_use]
    pub fn to_schema(&self) -> ElementSchema {
        self.root.to_schema()
    }

    /// Consume the model and return its root.
    #[must_use]
    pub fn into_root(self) -> Element {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: &str, x: f64) -> Element {
        let mut e = Element::new(
            id,
            "node",
            ElementKind::Node {
                position: Point::new(x, 0.0),
                size: Dimension::EMPTY,
            },
        );
        e.parent_id = Some(parent.to_owned());
        e
    }

    fn sample() -> Model {
        let mut root = Element::new("g", "graph", ElementKind::Graph);
        let mut a = node("a", "g", 1.0);
        a.children.push(node("a1", "a", 2.0));
        root.children.push(a);
        root.children.push(node("b", "g", 3.0));
        Model::new(root)
    }

    #[test]
    fn iter_is_pre_order() {
        let ids: Vec<_> = sample().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, ["g", "a", "a1", "b"]);
    }

    #[test]
    fn get_finds_nested_elements() {
        let model = sample();
        assert_eq!(model.get("a1").and_then(Element::position), Some(Point::new(2.0, 0.0)));
        assert!(model.get("zz").is_none());
        assert_eq!(model.len(), 4);
    }

    #[test]
    fn remove_detaches_subtree() {
        let mut model = sample();
        let removed = model.remove("a").unwrap();
        assert_eq!(removed.children.len(), 1);
        assert!(!model.contains("a1"));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn remove_root_is_rejected() {
        let mut model = sample();
        assert_eq!(model.remove("g"), Err(ModelError::RootElement("g".into())));
        assert_eq!(model.remove("x"), Err(ModelError::UnknownElement("x".into())));
    }

    #[test]
    fn add_child_sets_parent_and_rejects_duplicates() {
        let mut model = sample();
        model.add_child("b", node("c", "elsewhere", 0.0)).unwrap();
        assert_eq!(model.get("c").unwrap().parent_id.as_deref(), Some("b"));
        model.validate().unwrap();

        let err = model.add_child("g", node("a1", "g", 0.0)).unwrap_err();
        assert_eq!(err, ModelError::DuplicateId("a1".into()));
        let err = model.add_child("nope", node("d", "g", 0.0)).unwrap_err();
        assert_eq!(err, ModelError::UnknownElement("nope".into()));
    }

    #[test]
    fn validate_reports_duplicates_and_bad_parents() {
        let mut model = sample();
        model.validate().unwrap();

        model.get_mut("b").unwrap().id = "a".into();
        assert_eq!(model.validate(), Err(ModelError::DuplicateId("a".into())));

        let mut model = sample();
        model.get_mut("a1").unwrap().parent_id = Some("g".into());
        assert!(matches!(
            model.validate(),
            Err(ModelError::ParentMismatch { ref child, .. }) if child == "a1"
        ));
    }

    #[test]
    fn set_position_only_for_positioned_kinds() {
        let mut model = sample();
        assert!(model.get_mut("b").unwrap().set_position(Point::new(9.0, 9.0)));
        assert!(!model.get_mut("g").unwrap().set_position(Point::ORIGIN));
        assert!(model.get("b").unwrap().is_moveable());
    }

    #[test]
    fn size_grows_with_elements() {
        let small = Model::new(Element::new("g", "graph", ElementKind::Graph));
        assert!(sample().size_bytes() > small.size_bytes());
    }
}
