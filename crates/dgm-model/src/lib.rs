#![forbid(unsafe_code)]

//! Diagram model: schema, live tree, factory, and matcher.
//!
//! # Role in dgm
//! `dgm-model` is the data layer. Servers send [`ElementSchema`] trees; the
//! [`ModelFactory`] materializes them into a [`Model`]; the [`ModelMatcher`]
//! pairs the elements of two models by identifier so the runtime
//! (`dgm-runtime`) can decide what to fade and what to move.
//!
//! # How it fits in the system
//! Nothing here schedules, renders, or logs by default. The runtime owns the
//! live root as an immutable `Arc<Model>` snapshot and replaces it wholesale
//! at command boundaries.

pub mod element;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod matching;
pub mod schema;

pub use element::{Element, ElementKind, Model};
pub use error::{ModelError, ModelResult};
pub use factory::{ElementSource, ModelFactory};
pub use geometry::{Dimension, Point};
pub use matching::{Match, MatchResult, MatchSchema, ModelMatcher, OwnedMatch};
pub use schema::{ElementSchema, basic_type};
