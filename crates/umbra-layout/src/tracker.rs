//! Per-node measurement states.
//!
//! A node is `Clean` after a measurement whose result was kept, `Dirty`
//! after a change it has not been measured for, and `Measuring` while at
//! least one pass holds a [`MeasureTicket`] for it. Passes over independent
//! candidates may measure the same node at once; each ticket whose epoch is
//! still current keeps its result. A change bumps the epoch, so finishing a
//! ticket taken before it reports `false` and the result must be discarded.

use std::collections::HashMap;

use parking_lot::Mutex;
use umbra_core::Tag;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureState {
    Clean,
    Dirty,
    Measuring,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    state: MeasureState,
    epoch: u64,
    in_flight: u32,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            state: MeasureState::Dirty,
            epoch: 0,
            in_flight: 0,
        }
    }
}

/// Proof that a pass started measuring `tag` at a given epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct MeasureTicket {
    tag: Tag,
    epoch: u64,
}

impl MeasureTicket {
    pub fn tag(&self) -> Tag {
        self.tag
    }
}

#[derive(Debug, Default)]
pub struct MeasurementTracker {
    nodes: Mutex<HashMap<Tag, Entry>>,
}

impl MeasurementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown nodes have never been measured and count as dirty.
    pub fn state(&self, tag: Tag) -> MeasureState {
        self.nodes
            .lock()
            .get(&tag)
            .map_or(MeasureState::Dirty, |e| e.state)
    }

    pub fn mark_dirty(&self, tag: Tag) {
        let mut nodes = self.nodes.lock();
        let entry = nodes.entry(tag).or_default();
        entry.state = MeasureState::Dirty;
        entry.epoch += 1;
    }

    pub fn begin(&self, tag: Tag) -> MeasureTicket {
        let mut nodes = self.nodes.lock();
        let entry = nodes.entry(tag).or_default();
        entry.state = MeasureState::Measuring;
        entry.in_flight += 1;
        MeasureTicket {
            tag,
            epoch: entry.epoch,
        }
    }

    /// Ends a measurement. Returns `false` when a change superseded it; the
    /// node then stays dirty until a newer ticket finishes.
    pub fn finish(&self, ticket: MeasureTicket) -> bool {
        let mut nodes = self.nodes.lock();
        let Some(e) = nodes.get_mut(&ticket.tag) else {
            return false;
        };
        e.in_flight = e.in_flight.saturating_sub(1);
        if e.epoch == ticket.epoch {
            if e.in_flight == 0 {
                e.state = MeasureState::Clean;
            }
            return true;
        }
        log::debug!(
            "measurement of node {} superseded (epoch {} -> {})",
            ticket.tag,
            ticket.epoch,
            e.epoch
        );
        if e.in_flight == 0 {
            e.state = MeasureState::Dirty;
        }
        false
    }

    /// Ends a measurement whose pass failed before producing a result.
    pub fn cancel(&self, ticket: MeasureTicket) {
        let mut nodes = self.nodes.lock();
        if let Some(e) = nodes.get_mut(&ticket.tag) {
            e.in_flight = e.in_flight.saturating_sub(1);
            if e.in_flight == 0 && e.state == MeasureState::Measuring {
                e.state = MeasureState::Dirty;
            }
        }
    }

    /// Drops a node that left the tree.
    pub fn forget(&self, tag: Tag) {
        self.nodes.lock().remove(&tag);
    }

    /// Drops every idle node for which `live` is false. Nodes some pass is
    /// still measuring are kept.
    pub fn retain(&self, mut live: impl FnMut(Tag) -> bool) {
        self.nodes
            .lock()
            .retain(|&tag, e| e.in_flight > 0 || live(tag));
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let t = MeasurementTracker::new();
        assert_eq!(t.state(1), MeasureState::Dirty);

        let ticket = t.begin(1);
        assert_eq!(t.state(1), MeasureState::Measuring);
        assert!(t.finish(ticket));
        assert_eq!(t.state(1), MeasureState::Clean);

        t.mark_dirty(1);
        assert_eq!(t.state(1), MeasureState::Dirty);
    }

    #[test]
    fn test_change_during_measurement_discards_result() {
        let t = MeasurementTracker::new();
        let ticket = t.begin(7);
        t.mark_dirty(7);
        assert!(!t.finish(ticket));
        assert_eq!(t.state(7), MeasureState::Dirty);

        // the next pass succeeds
        let ticket = t.begin(7);
        assert!(t.finish(ticket));
        assert_eq!(t.state(7), MeasureState::Clean);

        t.forget(7);
        assert!(t.is_empty());
    }

    #[test]
    fn test_concurrent_passes_keep_results() {
        let t = MeasurementTracker::new();
        let a = t.begin(5);
        let b = t.begin(5);
        assert!(t.finish(a));
        assert_eq!(t.state(5), MeasureState::Measuring);
        assert!(t.finish(b));
        assert_eq!(t.state(5), MeasureState::Clean);

        // a change between two begins only invalidates the older ticket
        let old = t.begin(5);
        t.mark_dirty(5);
        let new = t.begin(5);
        assert!(!t.finish(old));
        assert_eq!(t.state(5), MeasureState::Measuring);
        assert!(t.finish(new));
        assert_eq!(t.state(5), MeasureState::Clean);
    }

    #[test]
    fn test_cancel_and_retain() {
        let t = MeasurementTracker::new();
        t.cancel(t.begin(1));
        assert_eq!(t.state(1), MeasureState::Dirty);

        let held = t.begin(2);
        t.mark_dirty(3);
        t.retain(|_| false);
        // only the node with a ticket out survives
        assert_eq!(t.len(), 1);
        assert_eq!(t.state(2), MeasureState::Measuring);
        assert!(t.finish(held));
        t.retain(|tag| tag != 2);
        assert!(t.is_empty());
    }
}
