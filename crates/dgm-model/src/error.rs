#![forbid(unsafe_code)]

//! Errors raised by model construction, validation, and matching.

use thiserror::Error;

/// A model violated one of the tree invariants.
///
/// All variants describe malformed input: the matcher and the tree
/// mutators fail fast on them instead of silently pairing the wrong
/// elements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The same identifier appears more than once within one tree.
    #[error("malformed model: duplicate element id `{0}`")]
    DuplicateId(String),
    /// An element has an empty identifier.
    #[error("malformed model: element of type `{ty}` has no id")]
    MissingId { ty: String },
    /// A lookup by identifier found nothing.
    #[error("element `{0}` not found in model")]
    UnknownElement(String),
    /// A child's parent reference does not point at its container.
    #[error("malformed model: `{child}` is contained in `{container}` but refers to parent {declared:?}")]
    ParentMismatch {
        child: String,
        container: String,
        declared: Option<String>,
    },
    /// Two sides of a match record carry different identifiers.
    #[error("malformed match: left `{left}` and right `{right}` differ")]
    MismatchedPair { left: String, right: String },
    /// A match record with neither side.
    #[error("malformed match: record has neither a left nor a right element")]
    EmptyMatch,
    /// The root element cannot be detached or replaced through a child operation.
    #[error("`{0}` is the model root")]
    RootElement(String),
}

impl ModelError {
    /// Whether this error reports malformed input (as opposed to a failed lookup).
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::UnknownElement(_) | Self::RootElement(_))
    }
}

/// Standard result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
