#![forbid(unsafe_code)]

//! Identity matching between two model trees.
//!
//! [`ModelMatcher`] pairs the elements of an old tree (left) and a new tree
//! (right) by identifier:
//!
//! | left | right | meaning  |
//! |------|-------|----------|
//! | yes  | no    | removed  |
//! | no   | yes   | added    |
//! | yes  | yes   | kept (possibly changed) |
//!
//! Records are keyed by identifier in a [`BTreeMap`], so iteration order and
//! the add / remove / pair partition are deterministic.
//!
//! # Failure Modes
//!
//! - Duplicate identifier within one tree: [`ModelError::DuplicateId`].
//! - Empty identifier: [`ModelError::MissingId`].

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use crate::element::{Element, Model};
use crate::error::{ModelError, ModelResult};
use crate::factory::ModelFactory;
use crate::schema::ElementSchema;

/// Relationship between at most one old and at most one new element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Match<'a> {
    pub left: Option<&'a Element>,
    pub right: Option<&'a Element>,
    pub left_parent_id: Option<&'a str>,
    pub right_parent_id: Option<&'a str>,
}

impl<'a> Match<'a> {
    /// Identifier shared by both sides.
    #[must_use]
    pub fn id(&self) -> Option<&'a str> {
        self.left.or(self.right).map(|e| e.id.as_str())
    }

    /// Only the new tree has this element.
    #[must_use]
    pub fn is_added(&self) -> bool {
        self.left.is_none() && self.right.is_some()
    }

    /// Only the old tree has this element.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.left.is_some() && self.right.is_none()
    }

    /// Both trees have this element.
    #[must_use]
    pub fn is_pair(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// All match records of one comparison, keyed by element identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult<'a> {
    matches: BTreeMap<&'a str, Match<'a>>,
}

impl<'a> MatchResult<'a> {
    /// Empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a result from precomputed records.
    ///
    /// Each record must name one identifier; no identifier may appear in two
    /// records.
    pub fn from_matches(records: &'a [OwnedMatch]) -> ModelResult<Self> {
        let mut result = Self::new();
        for record in records {
            let m = record.as_match()?;
            let id = m.id().ok_or(ModelError::EmptyMatch)?;
            if id.is_empty() {
                let ty = m.left.or(m.right).map(|e| e.ty.clone()).unwrap_or_default();
                return Err(ModelError::MissingId { ty });
            }
            match result.matches.entry(id) {
                Entry::Occupied(_) => return Err(ModelError::DuplicateId(id.to_owned())),
                Entry::Vacant(slot) => {
                    slot.insert(m);
                }
            }
        }
        Ok(result)
    }

    /// Record an element of the old tree.
    pub fn insert_left(&mut self, element: &'a Element) -> ModelResult<()> {
        let slot = self.slot(element)?;
        if slot.left.is_some() {
            return Err(ModelError::DuplicateId(element.id.clone()));
        }
        slot.left = Some(element);
        slot.left_parent_id = element.parent_id.as_deref();
        Ok(())
    }

    /// Record an element of the new tree.
    pub fn insert_right(&mut self, element: &'a Element) -> ModelResult<()> {
        let slot = self.slot(element)?;
        if slot.right.is_some() {
            return Err(ModelError::DuplicateId(element.id.clone()));
        }
        slot.right = Some(element);
        slot.right_parent_id = element.parent_id.as_deref();
        Ok(())
    }

    fn slot(&mut self, element: &'a Element) -> ModelResult<&mut Match<'a>> {
        if element.id.is_empty() {
            return Err(ModelError::MissingId {
                ty: element.ty.clone(),
            });
        }
        Ok(self.matches.entry(element.id.as_str()).or_default())
    }

    /// Record for one identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Match<'a>> {
        self.matches.get(id)
    }

    /// All records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Match<'a>> {
        self.matches.values()
    }

    /// Right-only records.
    pub fn added(&self) -> impl Iterator<Item = &Match<'a>> {
        self.iter().filter(|m| m.is_added())
    }

    /// Left-only records.
    pub fn removed(&self) -> impl Iterator<Item = &Match<'a>> {
        self.iter().filter(|m| m.is_removed())
    }

    /// Two-sided records.
    pub fn pairs(&self) -> impl Iterator<Item = &Match<'a>> {
        self.iter().filter(|m| m.is_pair())
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Pairs elements of two trees by identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelMatcher;

impl ModelMatcher {
    /// Create a matcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Match every element of `left` against every element of `right`.
    pub fn match_models<'a>(&self, left: &'a Model, right: &'a Model) -> ModelResult<MatchResult<'a>> {
        let mut result = MatchResult::new();
        for element in left.iter() {
            result.insert_left(element)?;
        }
        for element in right.iter() {
            result.insert_right(element)?;
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "dgm.matcher",
            records = result.len(),
            added = result.added().count(),
            removed = result.removed().count(),
            "matched models"
        );
        Ok(result)
    }
}

/// Wire form of a match record, as sent by a server that computed the diff.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<ElementSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<ElementSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_parent_id: Option<String>,
}

impl MatchSchema {
    /// An addition of `right` below `parent_id`.
    #[must_use]
    pub fn added(right: ElementSchema, parent_id: impl Into<String>) -> Self {
        Self {
            right: Some(right),
            right_parent_id: Some(parent_id.into()),
            ..Self::default()
        }
    }

    /// A removal of `left` from below `parent_id`.
    #[must_use]
    pub fn removed(left: ElementSchema, parent_id: impl Into<String>) -> Self {
        Self {
            left: Some(left),
            left_parent_id: Some(parent_id.into()),
            ..Self::default()
        }
    }

    /// A replacement of `left` by `right`.
    #[must_use]
    pub fn changed(
        left: ElementSchema,
        left_parent_id: impl Into<String>,
        right: ElementSchema,
        right_parent_id: impl Into<String>,
    ) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            left_parent_id: Some(left_parent_id.into()),
            right_parent_id: Some(right_parent_id.into()),
        }
    }
}

/// A match record that owns materialized elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OwnedMatch {
    pub left: Option<Element>,
    pub right: Option<Element>,
    pub left_parent_id: Option<String>,
    pub right_parent_id: Option<String>,
}

impl OwnedMatch {
    /// Materialize both sides of a wire record.
    #[must_use]
    pub fn from_schema(factory: &ModelFactory, schema: &MatchSchema) -> Self {
        let left_parent_id = schema.left_parent_id.as_deref();
        let right_parent_id = schema.right_parent_id.as_deref();
        Self {
            left: schema
                .left
                .as_ref()
                .map(|s| factory.create_element(s, left_parent_id)),
            right: schema
                .right
                .as_ref()
                .map(|s| factory.create_element(s, right_parent_id)),
            left_parent_id: schema.left_parent_id.clone(),
            right_parent_id: schema.right_parent_id.clone(),
        }
    }

    /// Borrowing view, validated.
    pub fn as_match(&self) -> ModelResult<Match<'_>> {
        match (&self.left, &self.right) {
            (None, None) => Err(ModelError::EmptyMatch),
            (Some(l), Some(r)) if l.id != r.id => Err(ModelError::MismatchedPair {
                left: l.id.clone(),
                right: r.id.clone(),
            }),
            (left, right) => Ok(Match {
                left: left.as_ref(),
                right: right.as_ref(),
                left_parent_id: self.left_parent_id.as_deref(),
                right_parent_id: self.right_parent_id.as_deref(),
            }),
        }
    }
}
