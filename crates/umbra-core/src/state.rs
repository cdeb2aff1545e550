use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::text::ParagraphState;
use crate::{Result, Tag, UmbraError};

/// Native-computed payload of a node, kept apart from props.
#[derive(Clone)]
pub enum StateData {
    Empty,
    Paragraph(ParagraphState),
    Custom(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for StateData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateData::Empty => write!(f, "Empty"),
            StateData::Paragraph(p) => f.debug_tuple("Paragraph").field(p).finish(),
            StateData::Custom(_) => write!(f, "Custom(<opaque>)"),
        }
    }
}

/// Versioned state. Every accepted update produces version `base + 1`.
#[derive(Clone, Debug)]
pub struct State {
    version: u64,
    data: Arc<StateData>,
}

impl State {
    pub fn initial(data: StateData) -> Self {
        Self {
            version: 0,
            data: Arc::new(data),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn data(&self) -> &StateData {
        &self.data
    }

    pub fn paragraph(&self) -> Option<&ParagraphState> {
        match &*self.data {
            StateData::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    /// Applies `update` if it was computed against this exact version.
    pub fn apply(&self, update: &StateUpdate) -> Result<State> {
        if update.base_version != self.version {
            return Err(UmbraError::StaleState {
                tag: update.tag,
                base: update.base_version,
                current: self.version,
            });
        }
        Ok(State {
            version: self.version + 1,
            data: Arc::new(update.data.clone()),
        })
    }

    /// Successor state written by the layout engine for the node it measures.
    pub fn next(&self, data: StateData) -> State {
        State {
            version: self.version + 1,
            data: Arc::new(data),
        }
    }

    pub fn same_as(&self, other: &State) -> bool {
        self.version == other.version && Arc::ptr_eq(&self.data, &other.data)
    }
}

#[derive(Clone, Debug)]
pub struct StateUpdate {
    pub tag: Tag,
    pub base_version: u64,
    pub data: StateData,
}

impl StateUpdate {
    pub fn new(tag: Tag, base_version: u64, data: StateData) -> Self {
        Self {
            tag,
            base_version,
            data,
        }
    }
}
