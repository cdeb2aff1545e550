use thiserror::Error;

use crate::node::Tag;
use crate::tree::Generation;

/// Errors produced while building, measuring, and committing shadow trees.
///
/// Structural variants abort a single tree-construction operation and leave
/// the committed tree untouched. `MeasurementOverflow` is never returned from
/// an operation; it only travels through [`Diagnostics`](crate::Diagnostics).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum UmbraError {
    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    #[error("component `{0}` is already registered")]
    DuplicateComponent(String),

    #[error("component registry is frozen; cannot register `{0}`")]
    RegistryFrozen(String),

    #[error("node {child} is not a child of node {parent}")]
    ChildNotFound { parent: Tag, child: Tag },

    #[error("node {0} is not part of the tree")]
    NodeNotFound(Tag),

    #[error("generation {attempted} is stale; committed generation is {committed}")]
    StaleGeneration {
        attempted: Generation,
        committed: Generation,
    },

    #[error("state update for node {tag} is based on version {base}, current is {current}")]
    StaleState { tag: Tag, base: u64, current: u64 },

    #[error("node {tag} does not fit its constraints ({needed:.1}pt needed, {available:.1}pt available)")]
    MeasurementOverflow {
        tag: Tag,
        needed: f32,
        available: f32,
    },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("layout failed: {0}")]
    Layout(String),

    #[error("mounting failed: {0}")]
    Mount(String),
}

pub type Result<T> = std::result::Result<T, UmbraError>;
