//! Asynchronous event delivery.
//!
//! Nodes receive an [`EventEmitter`] when they are created. Emitting pushes a
//! record into a shared [`EventQueue`]; nothing calls back into application
//! code. Every payload carries the generation it was computed for, so a
//! consumer can drop events describing a tree that has since been superseded.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::text::LineMetrics;
use crate::tree::Generation;
use crate::{Rect, Tag};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    Layout,
    TextLayout,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Layout => "onLayout",
            EventKind::TextLayout => "onTextLayout",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LayoutEventPayload {
    pub instance_id: Tag,
    pub generation: Generation,
    pub frame: Rect,
    /// Empty for `onLayout`.
    pub line_metrics: Vec<LineMetrics>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub kind: EventKind,
    pub payload: LayoutEventPayload,
}

#[derive(Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<Event>>>,
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.len())
            .finish()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitter(&self, tag: Tag) -> EventEmitter {
        EventEmitter {
            tag,
            queue: self.clone(),
        }
    }

    pub fn push(&self, event: Event) {
        log::trace!(
            "{} for node {} (generation {})",
            event.kind.name(),
            event.payload.instance_id,
            event.payload.generation
        );
        self.inner.lock().push_back(event);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn drain(&self) -> Vec<Event> {
        self.inner.lock().drain(..).collect()
    }

    /// Returns events for `committed`, drops older ones, and leaves events
    /// of newer (not yet committed) generations queued.
    pub fn drain_current(&self, committed: Generation) -> Vec<Event> {
        let mut q = self.inner.lock();
        let mut out = Vec::new();
        let mut keep = VecDeque::new();
        for event in q.drain(..) {
            let g = event.payload.generation;
            if g == committed {
                out.push(event);
            } else if g > committed {
                keep.push_back(event);
            } else {
                log::debug!(
                    "dropping stale {} for node {} (generation {g} < {committed})",
                    event.kind.name(),
                    event.payload.instance_id
                );
            }
        }
        *q = keep;
        out
    }
}

/// Capability to emit events on behalf of one node.
#[derive(Clone)]
pub struct EventEmitter {
    tag: Tag,
    queue: EventQueue,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("tag", &self.tag)
            .field("queue", &"<queue>")
            .finish()
    }
}

impl EventEmitter {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn emit(
        &self,
        kind: EventKind,
        generation: Generation,
        frame: Rect,
        line_metrics: Vec<LineMetrics>,
    ) {
        self.queue.push(Event {
            kind,
            payload: LayoutEventPayload {
                instance_id: self.tag,
                generation,
                frame,
                line_metrics,
            },
        });
    }
}
