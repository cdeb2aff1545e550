//! Commit coordinator: the only place a candidate becomes the committed tree.
//!
//! Candidates are built and laid out without any lock. `commit` takes the
//! mounting-layer mutex, checks that the candidate was derived from the tree
//! that is still committed, diffs, hands the transaction to the mounting
//! layer and swaps the committed pointer. If any step fails the committed
//! tree is left exactly as it was.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::{
    CandidateTree, EventKind, Generation, MountingLayer, MountingTransaction, Mutation, Rect,
    Result, ShadowTree, SharedNode, SurfaceId, Tag, UmbraError, diff, mount_all,
};

/// Outcome of a successful commit.
#[derive(Debug)]
pub struct CommitReport {
    pub generation: Generation,
    /// Generation that was committed before this one.
    pub superseded: Generation,
    pub mutations: Vec<Mutation>,
    /// `onLayout` events queued by this commit.
    pub layout_events: usize,
}

pub struct CommitCoordinator<M: MountingLayer> {
    surface_id: SurfaceId,
    committed: RwLock<Arc<ShadowTree>>,
    mounting: Mutex<M>,
    next_generation: AtomicU64,
    layout_events: AtomicBool,
}

impl<M: MountingLayer> CommitCoordinator<M> {
    /// Mounts `root` as generation 0 of a new surface.
    pub fn new(surface_id: SurfaceId, root: SharedNode, mut mounting: M) -> Result<Self> {
        let tree = ShadowTree::new(root, 0);
        mounting.apply(&MountingTransaction {
            surface_id,
            generation: 0,
            mutations: mount_all(tree.root()),
        })?;
        log::debug!("surface {surface_id}: mounted {} nodes", tree.len());
        Ok(Self {
            surface_id,
            committed: RwLock::new(Arc::new(tree)),
            mounting: Mutex::new(mounting),
            next_generation: AtomicU64::new(1),
            layout_events: AtomicBool::new(true),
        })
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Enables or disables `onLayout` emission after commits.
    pub fn set_layout_events(&self, enabled: bool) {
        self.layout_events.store(enabled, Ordering::Relaxed);
    }

    /// The committed snapshot. Readers keep it alive as long as they hold it.
    pub fn committed(&self) -> Arc<ShadowTree> {
        self.committed.read().clone()
    }

    pub fn committed_generation(&self) -> Generation {
        self.committed.read().generation()
    }

    /// Absolute frame of `tag` in the committed tree.
    pub fn committed_frame(&self, tag: Tag) -> Option<Rect> {
        self.committed.read().absolute_frame(tag)
    }

    /// Allocates a generation and derives a candidate from the current
    /// committed tree. The generation is taken while that tree is pinned, so
    /// it is newer than the candidate's base.
    pub fn create_candidate(&self) -> CandidateTree {
        let committed = self.committed.read();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "candidate {generation} derived from generation {}",
            committed.generation()
        );
        CandidateTree::from_committed(&committed, generation)
    }

    pub fn commit(&self, candidate: CandidateTree) -> Result<CommitReport> {
        let mut mounting = self.mounting.lock();
        let current = self.committed();
        if candidate.base_generation() != current.generation()
            || candidate.generation() <= current.generation()
        {
            log::debug!(
                "rejecting candidate {} (base {}, committed {})",
                candidate.generation(),
                candidate.base_generation(),
                current.generation()
            );
            return Err(UmbraError::StaleGeneration {
                attempted: candidate.generation(),
                committed: current.generation(),
            });
        }

        let transaction = MountingTransaction {
            surface_id: self.surface_id,
            generation: candidate.generation(),
            mutations: diff(candidate.root(), current.root()),
        };
        if !transaction.mutations.is_empty() {
            if let Err(e) = mounting.apply(&transaction) {
                log::warn!(
                    "mounting generation {} failed, commit discarded: {e}",
                    transaction.generation
                );
                return Err(e);
            }
        }

        let tree = Arc::new(
            ShadowTree::new(candidate.root().clone(), candidate.generation())
                .with_constraints(candidate.constraints()),
        );
        *self.committed.write() = tree.clone();
        drop(mounting);

        log::debug!(
            "committed generation {} ({} mutations, superseded {})",
            tree.generation(),
            transaction.mutations.len(),
            current.generation()
        );

        let layout_events = if self.layout_events.load(Ordering::Relaxed) {
            emit_layout_events(&tree, &transaction.mutations)
        } else {
            0
        };

        Ok(CommitReport {
            generation: tree.generation(),
            superseded: current.generation(),
            mutations: transaction.mutations,
            layout_events,
        })
    }

    /// Runs `f` with exclusive access to the mounting layer; commits wait.
    pub fn with_mounting<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.mounting.lock())
    }
}

fn emit_layout_events(tree: &ShadowTree, mutations: &[Mutation]) -> usize {
    let mut emitted = 0;
    for m in mutations {
        let node = match m {
            Mutation::Insert { node, .. } => node,
            Mutation::Update { old, new } if old.layout() != new.layout() => new,
            _ => continue,
        };
        if node.props().emits_layout_events() {
            node.emitter().emit(
                EventKind::Layout,
                tree.generation(),
                node.layout().frame,
                Vec::new(),
            );
            emitted += 1;
        }
    }
    emitted
}
