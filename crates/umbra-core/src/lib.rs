//! # Shadow trees
//!
//! Umbra keeps a native mirror of an application's declared UI: the *shadow
//! tree*. It is laid out off the UI thread and handed to the platform as a
//! list of mutations once a new version is ready.
//!
//! The pieces, leaf first:
//!
//! - [`ShadowNode`] is an immutable tree element: a stable [`Tag`], typed
//!   [`Props`], versioned [`State`], an [`EventEmitter`], computed
//!   [`LayoutMetrics`] and structural [`NodeTraits`]. Changing anything means
//!   cloning: the clone keeps the tag, bumps the revision and shares every
//!   child it did not touch.
//! - [`ComponentRegistry`] maps component names to [`ComponentDescriptor`]s,
//!   which build correctly typed nodes from dynamic [`RawProps`].
//! - [`CandidateTree`] is the working copy of one render pass. Structural
//!   edits copy only the root-to-node path.
//! - [`diff`] turns a candidate and the committed tree into ordered
//!   [`Mutation`]s.
//! - [`CommitCoordinator`] owns the committed [`ShadowTree`], serializes
//!   commits, rejects candidates derived from a superseded generation and
//!   hands each diff to a [`MountingLayer`].
//!
//! ```rust
//! use std::sync::Arc;
//! use umbra_core::*;
//!
//! let registry = ComponentRegistry::with_builtins();
//! let events = EventQueue::new();
//! let root = registry.create("RootView", &RawProps::new(), 1, &events).unwrap();
//! let coordinator = CommitCoordinator::new(1, Arc::new(root), StubViewTree::new()).unwrap();
//!
//! let mut builder = TreeBuilder::new(&registry, &events, coordinator.create_candidate());
//! builder.apply(TreeUpdate::Create { element: Element::new("View", 2) }).unwrap();
//! builder.apply(TreeUpdate::UpdateChildren { tag: 1, children: vec![2] }).unwrap();
//!
//! let report = coordinator.commit(builder.finish()).unwrap();
//! assert_eq!(report.mutations.len(), 1); // insert view 2 under the root
//! assert!(coordinator.with_mounting(|m| m.find(2).is_some()));
//! ```
//!
//! Layout lives in `umbra-layout` and text measurement in `umbra-text`; this
//! crate has no opinion on how frames are computed.

pub mod commit;
pub mod component;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod event;
pub mod geometry;
pub mod mounting;
pub mod node;
pub mod props;
pub mod state;
pub mod text;
pub mod traits;
pub mod tree;
pub mod update;

pub use commit::*;
pub use component::*;
pub use diagnostics::*;
pub use diff::*;
pub use error::*;
pub use event::*;
pub use geometry::*;
pub use mounting::*;
pub use node::*;
pub use props::*;
pub use state::*;
pub use traits::*;
pub use tree::*;
pub use update::*;
