//! Layout for Umbra shadow trees.
//!
//! [`LayoutEngine::measure`] translates every node's [`LayoutStyle`] into a
//! taffy style, runs flexbox over the candidate, and writes frames back by
//! clone-on-write. `MEASURABLE` nodes are taffy leaves whose intrinsic size
//! comes from the [`ContentMeasurer`] registered for their component;
//! paragraphs use [`TextMeasurer`] out of the box.
//!
//! [`LayoutStyle`]: umbra_core::LayoutStyle

mod engine;
mod measure;
mod style;
mod text;
mod tracker;

#[cfg(test)]
mod tests;

pub use engine::LayoutEngine;
pub use measure::{ContentMeasurer, MeasureConstraints, Measurement};
pub use text::TextMeasurer;
pub use tracker::{MeasureState, MeasureTicket, MeasurementTracker};

pub use umbra_core::LayoutConstraints;
