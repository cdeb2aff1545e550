//! Layout passes over candidate trees.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;
use taffy::prelude::length;
use taffy::{AvailableSpace, NodeId, TaffyTree};
use umbra_core::props::Dimension;
use umbra_core::{
    CandidateTree, Diagnostics, EdgeInsets, EventKind, Generation, LayoutConstraints,
    LayoutMetrics, NodeFragment, NodeTraits, Rect, Result, SharedNode, StateData, Tag,
    UmbraError,
};
use umbra_text::ParagraphMeasurer;

use crate::style::{inline_style, taffy_style};
use crate::{
    ContentMeasurer, MeasureConstraints, MeasureTicket, Measurement, MeasurementTracker,
    TextMeasurer,
};

struct NodeContext {
    index: usize,
}

struct MeasuredNode {
    node: SharedNode,
    ticket: MeasureTicket,
    hidden: bool,
}

type MeasureCache = HashMap<Tag, SmallVec<[(MeasureConstraints, Measurement); 2]>>;

fn layout_error(e: taffy::TaffyError) -> UmbraError {
    UmbraError::Layout(e.to_string())
}

fn lookup(
    measurers: &HashMap<String, Arc<dyn ContentMeasurer>>,
    cache: &mut MeasureCache,
    node: &SharedNode,
    constraints: MeasureConstraints,
) -> Measurement {
    let entries = cache.entry(node.tag()).or_default();
    if let Some((_, m)) = entries.iter().find(|(c, _)| *c == constraints) {
        return m.clone();
    }
    let m = match measurers.get(node.component().as_str()) {
        Some(measurer) => measurer.measure(node, &constraints),
        None => {
            log::warn!(
                "no content measurer for measurable component {}; node {} sized to zero",
                node.component(),
                node.tag()
            );
            Measurement::default()
        }
    };
    entries.push((constraints, m.clone()));
    m
}

/// Flexbox layout through taffy, with `MEASURABLE` nodes sized by the
/// [`ContentMeasurer`] registered for their component.
pub struct LayoutEngine {
    measurers: HashMap<String, Arc<dyn ContentMeasurer>>,
    tracker: Arc<MeasurementTracker>,
    diagnostics: Diagnostics,
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.measurers.keys().collect();
        names.sort();
        f.debug_struct("LayoutEngine")
            .field("measurers", &names)
            .field("tracked", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl LayoutEngine {
    /// Engine with paragraph measurement registered for `Paragraph`.
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self::with_paragraphs(diagnostics, ParagraphMeasurer::default())
    }

    pub fn with_paragraphs(diagnostics: Diagnostics, paragraphs: ParagraphMeasurer) -> Self {
        let mut engine = Self {
            measurers: HashMap::new(),
            tracker: Arc::new(MeasurementTracker::new()),
            diagnostics,
        };
        engine.register_measurer(
            umbra_core::ParagraphDescriptor::NAME,
            TextMeasurer::new(paragraphs),
        );
        engine
    }

    /// Registers or replaces the measurer for `component`.
    pub fn register_measurer(
        &mut self,
        component: impl Into<String>,
        measurer: impl ContentMeasurer + 'static,
    ) {
        self.measurers.insert(component.into(), Arc::new(measurer));
    }

    pub fn tracker(&self) -> &Arc<MeasurementTracker> {
        &self.tracker
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Lays out `candidate` and writes frames and measured state back by
    /// clone-on-write; nodes whose results did not change keep their
    /// identity. A clean candidate already laid out under `constraints` is
    /// returned untouched.
    pub fn measure(
        &self,
        candidate: CandidateTree,
        constraints: &LayoutConstraints,
    ) -> Result<CandidateTree> {
        if !candidate.root().is_layout_dirty() && candidate.constraints() == Some(*constraints) {
            log::trace!("layout of generation {} skipped: clean", candidate.generation());
            return Ok(candidate);
        }

        let mut pass = Pass {
            taffy: TaffyTree::new(),
            nodes: HashMap::new(),
            measured: Vec::new(),
            tracker: &self.tracker,
        };
        pass.taffy.disable_rounding();
        let root_id = match pass.build(candidate.root(), false, Some(constraints)) {
            Ok(id) => id,
            Err(e) => {
                self.release(pass.measured);
                return Err(e);
            }
        };

        let Pass {
            mut taffy,
            nodes,
            measured,
            ..
        } = pass;

        let mut cache = MeasureCache::new();
        let available = taffy::Size {
            width: AvailableSpace::Definite(constraints.viewport.width),
            height: AvailableSpace::Definite(constraints.viewport.height),
        };
        let computed = taffy
            .compute_layout_with_measure(root_id, available, |known, available, _, ctx, _| {
                let Some(ctx) = ctx else {
                    return taffy::Size::ZERO;
                };
                let entry = &measured[ctx.index];
                let axis = |known: Option<f32>, available: AvailableSpace| {
                    known.or(match available {
                        AvailableSpace::Definite(v) => Some(v),
                        AvailableSpace::MinContent => Some(0.0),
                        AvailableSpace::MaxContent => None,
                    })
                };
                let c = MeasureConstraints {
                    max_width: axis(known.width, available.width),
                    max_height: known.height,
                    font_scale: constraints.font_scale,
                };
                let m = lookup(&self.measurers, &mut cache, &entry.node, c);
                taffy::Size {
                    width: known.width.unwrap_or(m.size.width),
                    height: known.height.unwrap_or(m.size.height),
                }
            });
        if let Err(e) = computed {
            self.release(measured);
            return Err(layout_error(e));
        }

        let mut write = WriteBack {
            engine: self,
            taffy: &taffy,
            nodes: &nodes,
            measured: measured
                .into_iter()
                .map(|m| (m.node.tag(), m))
                .collect(),
            cache,
            font_scale: constraints.font_scale,
            generation: candidate.generation(),
            changed: 0,
        };
        let (root, _) = write.node(candidate.root())?;
        log::debug!(
            "layout of generation {}: {} nodes, {} rewritten",
            candidate.generation(),
            nodes.len(),
            write.changed
        );
        Ok(candidate.with_root(root).laid_out_with(Some(*constraints)))
    }

    /// Gives back the tickets of a pass that failed before writing back.
    fn release(&self, measured: impl IntoIterator<Item = MeasuredNode>) {
        for m in measured {
            self.tracker.cancel(m.ticket);
        }
    }
}

struct Pass<'a> {
    taffy: TaffyTree<NodeContext>,
    nodes: HashMap<Tag, NodeId>,
    measured: Vec<MeasuredNode>,
    tracker: &'a MeasurementTracker,
}

impl Pass<'_> {
    /// `root` is set only for the tree root, which fills the viewport.
    fn build(
        &mut self,
        node: &SharedNode,
        hidden_above: bool,
        root: Option<&LayoutConstraints>,
    ) -> Result<NodeId> {
        let traits = node.traits();
        let hidden = hidden_above || traits.contains(NodeTraits::HIDDEN);
        let mut style = match node.props().layout_style() {
            Some(s) => taffy_style(s, hidden),
            None => inline_style(hidden),
        };
        if let Some(c) = root {
            if style.size.width == taffy::Dimension::auto() {
                style.size.width = length(c.viewport.width);
            }
            if style.size.height == taffy::Dimension::auto() {
                style.size.height = length(c.viewport.height);
            }
        }
        let hidden = hidden || style.display == taffy::Display::None;

        let id = if traits.is_measurable() {
            let index = self.measured.len();
            self.measured.push(MeasuredNode {
                node: node.clone(),
                ticket: self.tracker.begin(node.tag()),
                hidden,
            });
            self.taffy
                .new_leaf_with_context(style, NodeContext { index })
                .map_err(layout_error)?
        } else {
            let mut children = Vec::new();
            if !traits.is_leaf() {
                children.reserve(node.children().len());
                for child in node.children() {
                    children.push(self.build(child, hidden, None)?);
                }
            }
            self.taffy
                .new_with_children(style, &children)
                .map_err(layout_error)?
        };
        self.nodes.insert(node.tag(), id);
        Ok(id)
    }
}

struct WriteBack<'a> {
    engine: &'a LayoutEngine,
    taffy: &'a TaffyTree<NodeContext>,
    nodes: &'a HashMap<Tag, NodeId>,
    measured: HashMap<Tag, MeasuredNode>,
    cache: MeasureCache,
    font_scale: f32,
    generation: Generation,
    changed: usize,
}

impl Drop for WriteBack<'_> {
    fn drop(&mut self) {
        // left over only when write-back stopped on an error
        self.engine.release(self.measured.drain().map(|(_, m)| m));
    }
}

impl WriteBack<'_> {
    /// New node and whether it is still layout-dirty.
    fn node(&mut self, node: &SharedNode) -> Result<(SharedNode, bool)> {
        let Some(&id) = self.nodes.get(&node.tag()) else {
            return Ok((node.clone(), false));
        };
        let layout = self.taffy.layout(id).map_err(layout_error)?;
        let frame = Rect::new(
            layout.location.x,
            layout.location.y,
            layout.size.width,
            layout.size.height,
        );
        let content_insets = EdgeInsets {
            left: layout.padding.left + layout.border.left,
            top: layout.padding.top + layout.border.top,
            right: layout.padding.right + layout.border.right,
            bottom: layout.padding.bottom + layout.border.bottom,
        };
        let mut metrics = LayoutMetrics {
            frame,
            content_insets,
            intrinsic_size: node.layout().intrinsic_size,
        };

        let mut fragment = NodeFragment::default();
        let mut dirty = false;

        if let Some(entry) = self.measured.remove(&node.tag()) {
            let m = self.final_measurement(&entry, &metrics);
            if self.engine.tracker.finish(entry.ticket) {
                if let Some(m) = m {
                    metrics.intrinsic_size = Some(m.size);
                    self.apply_measurement(node, m, frame, &mut fragment);
                }
            } else {
                dirty = true;
            }
        } else if !node.traits().is_leaf() {
            let mut children = Vec::with_capacity(node.children().len());
            let mut replaced = false;
            for child in node.children() {
                let (new, child_dirty) = self.node(child)?;
                replaced |= !Arc::ptr_eq(&new, child);
                dirty |= child_dirty;
                children.push(new);
            }
            if replaced {
                fragment.children = Some(Arc::from(children));
            }
        }

        if metrics != *node.layout() {
            fragment.layout = Some(metrics);
        }
        let untouched = fragment.props.is_none()
            && fragment.state.is_none()
            && fragment.children.is_none()
            && fragment.layout.is_none();
        if untouched && node.is_layout_dirty() == dirty {
            return Ok((node.clone(), dirty));
        }
        fragment.layout_dirty = Some(dirty);
        self.changed += 1;
        Ok((Arc::new(node.clone_with(fragment)), dirty))
    }

    fn final_measurement(
        &mut self,
        entry: &MeasuredNode,
        metrics: &LayoutMetrics,
    ) -> Option<Measurement> {
        if entry.hidden {
            return None;
        }
        let content = metrics.content_frame();
        let fixed_height = entry.node.props().layout_style().is_some_and(|s| {
            !matches!(s.height, Dimension::Auto) || !matches!(s.max_height, Dimension::Auto)
        });
        let c = MeasureConstraints {
            max_width: Some(content.w),
            max_height: fixed_height.then_some(content.h),
            font_scale: self.font_scale,
        };
        Some(lookup(&self.engine.measurers, &mut self.cache, &entry.node, c))
    }

    fn apply_measurement(
        &self,
        node: &SharedNode,
        m: Measurement,
        frame: Rect,
        fragment: &mut NodeFragment,
    ) {
        if let Some(overflow) = m.overflow {
            self.engine.diagnostics.report(
                self.generation,
                UmbraError::MeasurementOverflow {
                    tag: node.tag(),
                    needed: overflow.needed,
                    available: overflow.available,
                },
            );
        }
        let Some(data) = m.state else {
            return;
        };
        let unchanged = match (&data, node.state().data()) {
            (StateData::Paragraph(new), StateData::Paragraph(old)) => new == old,
            (StateData::Empty, StateData::Empty) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        fragment.state = Some(node.state().next(data));
        if let Some(lines) = m.line_metrics {
            node.emitter()
                .emit(EventKind::TextLayout, self.generation, frame, lines);
        }
    }
}
