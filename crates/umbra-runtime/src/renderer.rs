//! Render passes: tree updates → candidate → layout → commit.

use std::sync::Arc;

use parking_lot::RwLock;
use web_time::Instant;

use umbra_core::{
    CandidateTree, CommitCoordinator, ComponentRegistry, Diagnostics, Event, EventQueue,
    Generation, MountingLayer, Mutation, RawProps, Rect, Result, RootViewDescriptor, Size,
    StateUpdate, StubViewTree, Tag, TreeBuilder, TreeUpdate,
};
use umbra_layout::{ContentMeasurer, LayoutConstraints, LayoutEngine};
use umbra_text::ParagraphMeasurer;

use crate::RendererConfig;

/// Tag of the surface's root view; application elements use other tags.
pub const ROOT_TAG: Tag = 1;

fn ms(since: Instant) -> f32 {
    since.elapsed().as_secs_f32() * 1000.0
}

/// A candidate that has been built and laid out but not committed.
#[derive(Debug)]
pub struct PreparedPass {
    candidate: CandidateTree,
    build_ms: f32,
    layout_ms: f32,
}

impl PreparedPass {
    pub fn candidate(&self) -> &CandidateTree {
        &self.candidate
    }

    pub fn generation(&self) -> Generation {
        self.candidate.generation()
    }
}

#[derive(Debug)]
pub struct RenderReport {
    pub generation: Generation,
    pub mutations: Vec<Mutation>,
    pub layout_events: usize,
    /// Nodes in the committed tree.
    pub nodes: usize,
    pub build_ms: f32,
    pub layout_ms: f32,
    pub commit_ms: f32,
}

pub struct Renderer<M: MountingLayer = StubViewTree> {
    registry: ComponentRegistry,
    events: EventQueue,
    diagnostics: Diagnostics,
    layout: LayoutEngine,
    coordinator: CommitCoordinator<M>,
    constraints: RwLock<LayoutConstraints>,
}

impl<M: MountingLayer> std::fmt::Debug for Renderer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("surface_id", &self.coordinator.surface_id())
            .field("generation", &self.coordinator.committed_generation())
            .field("constraints", &*self.constraints.read())
            .finish_non_exhaustive()
    }
}

impl<M: MountingLayer> Renderer<M> {
    /// Freezes `registry`, lays out an empty root view and mounts it as
    /// generation 0.
    pub fn new(config: RendererConfig, mut registry: ComponentRegistry, mounting: M) -> Result<Self> {
        registry.freeze();
        let events = EventQueue::new();
        let diagnostics = Diagnostics::new();
        let layout = LayoutEngine::with_paragraphs(
            diagnostics.clone(),
            ParagraphMeasurer::default().with_policy(config.truncation.clone()),
        );
        let constraints = LayoutConstraints {
            viewport: config.viewport,
            font_scale: config.font_scale,
        };

        let root = registry.create(RootViewDescriptor::NAME, &RawProps::new(), ROOT_TAG, &events)?;
        let initial = layout.measure(
            CandidateTree::new(Arc::new(root), 0, 0),
            &constraints,
        )?;
        let coordinator = CommitCoordinator::new(config.surface_id, initial.root().clone(), mounting)?;
        coordinator.set_layout_events(config.layout_events);
        log::debug!(
            "renderer for surface {} ready ({}x{})",
            config.surface_id,
            config.viewport.width,
            config.viewport.height
        );

        Ok(Self {
            registry,
            events,
            diagnostics,
            layout,
            coordinator,
            constraints: RwLock::new(constraints),
        })
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn coordinator(&self) -> &CommitCoordinator<M> {
        &self.coordinator
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Adds intrinsic sizing for a custom `MEASURABLE` component.
    pub fn register_measurer(
        &mut self,
        component: impl Into<String>,
        measurer: impl ContentMeasurer + 'static,
    ) {
        self.layout.register_measurer(component, measurer);
    }

    pub fn constraints(&self) -> LayoutConstraints {
        *self.constraints.read()
    }

    /// Takes effect on the next pass.
    pub fn set_viewport(&self, viewport: Size) {
        self.constraints.write().viewport = viewport;
    }

    pub fn set_font_scale(&self, scale: f32) {
        self.constraints.write().font_scale = scale;
    }

    /// Applies `updates` to a fresh candidate and lays it out. Nothing is
    /// committed; the first failing update aborts the pass.
    pub fn prepare(&self, updates: Vec<TreeUpdate>) -> Result<PreparedPass> {
        self.prepare_with(|builder| {
            for update in updates {
                self.track(&update);
                builder.apply(update)?;
            }
            Ok(())
        })
    }

    fn prepare_with(
        &self,
        f: impl FnOnce(&mut TreeBuilder<'_>) -> Result<()>,
    ) -> Result<PreparedPass> {
        let started = Instant::now();
        let mut builder = TreeBuilder::new(
            &self.registry,
            &self.events,
            self.coordinator.create_candidate(),
        );
        f(&mut builder)?;
        let candidate = builder.finish();
        let build_ms = ms(started);

        let started = Instant::now();
        let candidate = self.layout.measure(candidate, &self.constraints())?;
        let layout_ms = ms(started);

        Ok(PreparedPass {
            candidate,
            build_ms,
            layout_ms,
        })
    }

    fn track(&self, update: &TreeUpdate) {
        let tracker = self.layout.tracker();
        match update {
            TreeUpdate::UpdateProps { tag, .. } => tracker.mark_dirty(*tag),
            TreeUpdate::Delete { tag } => tracker.forget(*tag),
            _ => {}
        }
    }

    /// Commits a prepared pass. Fails with `StaleGeneration` if another pass
    /// committed since it was prepared.
    pub fn commit(&self, pass: PreparedPass) -> Result<RenderReport> {
        let started = Instant::now();
        let report = self.coordinator.commit(pass.candidate)?;
        let commit_ms = ms(started);
        let committed = self.coordinator.committed();
        let nodes = committed.len();
        self.layout
            .tracker()
            .retain(|tag| committed.contains(tag));
        log::debug!(
            "generation {}: build {:.2} ms, layout {:.2} ms, commit {:.2} ms",
            report.generation,
            pass.build_ms,
            pass.layout_ms,
            commit_ms
        );
        Ok(RenderReport {
            generation: report.generation,
            mutations: report.mutations,
            layout_events: report.layout_events,
            nodes,
            build_ms: pass.build_ms,
            layout_ms: pass.layout_ms,
            commit_ms,
        })
    }

    pub fn render(&self, updates: Vec<TreeUpdate>) -> Result<RenderReport> {
        let pass = self.prepare(updates)?;
        self.commit(pass)
    }

    /// Lays out and commits the current tree again, e.g. after a viewport
    /// change.
    pub fn relayout(&self) -> Result<RenderReport> {
        self.render(Vec::new())
    }

    pub fn update_state(&self, update: StateUpdate) -> Result<RenderReport> {
        self.layout.tracker().mark_dirty(update.tag);
        let pass = self.prepare_with(|builder| builder.apply_state(&update))?;
        self.commit(pass)
    }

    /// Events for the committed generation; events of superseded
    /// generations are dropped.
    pub fn drain_events(&self) -> Vec<Event> {
        self.events
            .drain_current(self.coordinator.committed_generation())
    }

    pub fn committed_frame(&self, tag: Tag) -> Option<Rect> {
        self.coordinator.committed_frame(tag)
    }

    pub fn with_mounting<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        self.coordinator.with_mounting(f)
    }
}
