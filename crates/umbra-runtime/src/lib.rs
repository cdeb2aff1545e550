//! Umbra render passes.
//!
//! A [`Renderer`] owns one surface: a frozen component registry, the layout
//! engine and the commit coordinator. Each pass applies a batch of
//! [`TreeUpdate`](umbra_core::TreeUpdate)s to a candidate derived from the
//! committed tree, lays it out, and commits it. Building and layout take no
//! lock, so passes may be prepared on several threads; only the first one
//! derived from the current generation commits.
//!
//! ```rust
//! use umbra_core::{ComponentRegistry, Element, StubViewTree, TreeUpdate};
//! use umbra_runtime::{ROOT_TAG, Renderer, RendererConfig};
//!
//! let renderer = Renderer::new(
//!     RendererConfig::default().with_viewport(200.0, 100.0),
//!     ComponentRegistry::with_builtins(),
//!     StubViewTree::new(),
//! )
//! .unwrap();
//!
//! renderer
//!     .render(vec![
//!         TreeUpdate::Create { element: Element::new("View", 2).prop("height", 40) },
//!         TreeUpdate::UpdateChildren { tag: ROOT_TAG, children: vec![2] },
//!     ])
//!     .unwrap();
//! assert_eq!(renderer.committed_frame(2).unwrap().w, 200.0);
//! ```

mod config;
mod renderer;

pub use config::RendererConfig;
pub use renderer::{PreparedPass, ROOT_TAG, RenderReport, Renderer};
