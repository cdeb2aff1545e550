use std::sync::Arc;

use umbra_core::*;

use crate::*;

struct Fixture {
    registry: ComponentRegistry,
    events: EventQueue,
}

impl Fixture {
    fn new() -> Self {
        let mut registry = ComponentRegistry::with_builtins();
        registry
            .register(
                CustomComponentDescriptor::new("Badge")
                    .traits(NodeTraits::FORMS_VIEW | NodeTraits::MEASURABLE),
            )
            .unwrap();
        registry
            .register(
                CustomComponentDescriptor::new("Ghost")
                    .traits(NodeTraits::FORMS_VIEW | NodeTraits::HIDDEN),
            )
            .unwrap();
        Self {
            registry,
            events: EventQueue::new(),
        }
    }

    fn node(&self, name: &str, tag: Tag, props: RawProps, children: Vec<SharedNode>) -> SharedNode {
        let node = self
            .registry
            .create(name, &props, tag, &self.events)
            .unwrap();
        Arc::new(node.with_children(children))
    }

    fn text(&self, tag: Tag, text: &str) -> SharedNode {
        self.node("RawText", tag, RawProps::new().set("text", text), vec![])
    }
}

fn viewport() -> LayoutConstraints {
    LayoutConstraints::new(Size::new(300.0, 200.0))
}

fn frame(tree: &CandidateTree, tag: Tag) -> Rect {
    tree.find(tag).unwrap().layout().frame
}

#[test]
fn test_flex_row_frames() {
    let f = Fixture::new();
    let root = f.node(
        "RootView",
        1,
        RawProps::new()
            .set("flexDirection", "row")
            .set("alignItems", "flex-start"),
        vec![
            f.node("View", 2, RawProps::new().set("width", 100).set("height", 40), vec![]),
            f.node(
                "View",
                3,
                RawProps::new()
                    .set("width", 50)
                    .set("height", 20)
                    .set("padding", 5),
                vec![],
            ),
        ],
    );
    let engine = LayoutEngine::new(Diagnostics::new());
    let out = engine
        .measure(CandidateTree::new(root, 1, 0), &viewport())
        .unwrap();

    assert_eq!(frame(&out, 1), Rect::new(0.0, 0.0, 300.0, 200.0));
    assert_eq!(frame(&out, 2), Rect::new(0.0, 0.0, 100.0, 40.0));
    assert_eq!(frame(&out, 3), Rect::new(100.0, 0.0, 50.0, 20.0));
    let third = out.find(3).unwrap();
    assert_eq!(third.layout().content_insets, EdgeInsets::all(5.0));
    assert_eq!(third.layout().content_frame(), Rect::new(5.0, 5.0, 40.0, 10.0));
    assert!(!out.root().is_layout_dirty());
}

#[test]
fn test_paragraph_fallback_reports_overflow() {
    let f = Fixture::new();
    let paragraph = f.node(
        "Paragraph",
        2,
        RawProps::new()
            .set("width", 100)
            .set("numberOfLines", 1)
            .set("adjustsFontSizeToFit", true)
            .set("minimumFontScale", 0.5)
            .set("onTextLayout", true),
        vec![f.text(
            3,
            "the quick brown fox jumps over the lazy dog and keeps on running",
        )],
    );
    let root = f.node(
        "RootView",
        1,
        RawProps::new().set("alignItems", "flex-start"),
        vec![paragraph],
    );
    let diagnostics = Diagnostics::new();
    let engine = LayoutEngine::new(diagnostics.clone());
    let out = engine
        .measure(CandidateTree::new(root, 4, 3), &viewport())
        .unwrap();

    let p = out.find(2).unwrap();
    let state = p.state().paragraph().unwrap();
    assert_eq!(state.font_scale, 0.5);
    assert!(state.truncated);
    assert_eq!(state.lines.len(), 1);
    assert!(state.lines[0].text.ends_with('\u{2026}'));
    assert_eq!(p.layout().frame.w, 100.0);
    assert!((p.layout().frame.h - 9.1).abs() < 1e-3);

    let reported = diagnostics.take();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].generation, 4);
    assert!(matches!(
        reported[0].error,
        UmbraError::MeasurementOverflow { tag: 2, .. }
    ));

    let events = f.events.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::TextLayout);
    assert_eq!(events[0].payload.instance_id, 2);
    assert_eq!(events[0].payload.generation, 4);
    assert_eq!(events[0].payload.line_metrics, state.lines);
}

#[test]
fn test_measurement_is_idempotent() {
    let f = Fixture::new();
    let root = f.node(
        "RootView",
        1,
        RawProps::new().set("padding", 7),
        vec![
            f.node(
                "Paragraph",
                2,
                RawProps::new().set("fontSize", 13).set("onTextLayout", true),
                vec![f.text(3, "wrapped across a few lines of the viewport, maybe more")],
            ),
            f.node("View", 4, RawProps::new().set("flex", 1), vec![]),
        ],
    );
    let engine = LayoutEngine::new(Diagnostics::new());
    let first = engine
        .measure(CandidateTree::new(root, 1, 0), &viewport())
        .unwrap();
    assert_eq!(f.events.drain().len(), 1);

    // clean tree, same constraints: untouched
    let again = engine.measure(first.clone(), &viewport()).unwrap();
    assert!(Arc::ptr_eq(again.root(), first.root()));

    // dirty but unchanged: same frames, same state, no new event
    let mut dirty = first.clone();
    let props = dirty.find(2).unwrap().props().clone();
    dirty.clone_node_with_props(2, props).unwrap();
    assert!(dirty.root().is_layout_dirty());
    let second = engine.measure(dirty, &viewport()).unwrap();
    for tag in [1, 2, 4] {
        assert!(frame(&first, tag).bit_eq(&frame(&second, tag)), "node {tag}");
    }
    assert_eq!(
        first.find(2).unwrap().state().version(),
        second.find(2).unwrap().state().version()
    );
    assert!(f.events.drain().is_empty());
    assert!(!second.root().is_layout_dirty());

    // new constraints force a pass even on a clean tree
    let wider = LayoutConstraints::new(Size::new(400.0, 200.0));
    let third = engine.measure(second.clone(), &wider).unwrap();
    assert_eq!(frame(&third, 1).w, 400.0);
}

#[test]
fn test_custom_measurer() {
    let f = Fixture::new();
    let root = f.node(
        "RootView",
        1,
        RawProps::new().set("alignItems", "flex-start"),
        vec![
            f.node("Badge", 2, RawProps::new().set("margin", 4), vec![]),
            f.node("Badge", 3, RawProps::new().set("width", 60), vec![]),
        ],
    );
    let mut engine = LayoutEngine::new(Diagnostics::new());
    engine.register_measurer("Badge", |node: &ShadowNode, c: &MeasureConstraints| {
        let label = if node.tag() == 2 { 40.0 } else { 10.0 };
        Measurement::sized(Size::new(c.max_width.map_or(label, |w| w.min(label)), 12.0))
    });
    let out = engine
        .measure(CandidateTree::new(root, 1, 0), &viewport())
        .unwrap();

    assert_eq!(frame(&out, 2), Rect::new(4.0, 4.0, 40.0, 12.0));
    assert_eq!(out.find(2).unwrap().layout().intrinsic_size, Some(Size::new(40.0, 12.0)));
    // the explicit width wins over the measured one
    assert_eq!(frame(&out, 3), Rect::new(0.0, 20.0, 60.0, 12.0));
}

#[test]
fn test_hidden_nodes_take_no_space() {
    let f = Fixture::new();
    let root = f.node(
        "RootView",
        1,
        RawProps::new(),
        vec![
            f.node("Ghost", 2, RawProps::new().set("height", 50), vec![]),
            f.node("View", 3, RawProps::new().set("height", 20), vec![]),
        ],
    );
    let engine = LayoutEngine::new(Diagnostics::new());
    let out = engine
        .measure(CandidateTree::new(root, 1, 0), &viewport())
        .unwrap();
    assert_eq!(frame(&out, 2).size(), Size::ZERO);
    assert_eq!(frame(&out, 3), Rect::new(0.0, 0.0, 300.0, 20.0));
}

#[test]
fn test_superseded_measurement_stays_dirty() {
    let f = Fixture::new();
    let root = f.node(
        "RootView",
        1,
        RawProps::new().set("alignItems", "flex-start"),
        vec![f.node("Badge", 2, RawProps::new(), vec![])],
    );
    let mut engine = LayoutEngine::new(Diagnostics::new());
    let tracker = engine.tracker().clone();
    engine.register_measurer("Badge", move |node: &ShadowNode, _: &MeasureConstraints| {
        // a props change lands while the pass is running
        tracker.mark_dirty(node.tag());
        Measurement::sized(Size::new(30.0, 10.0))
    });
    let out = engine
        .measure(CandidateTree::new(root, 1, 0), &viewport())
        .unwrap();

    let badge = out.find(2).unwrap();
    assert_eq!(badge.layout().intrinsic_size, None);
    assert!(badge.is_layout_dirty());
    assert!(out.root().is_layout_dirty());
    assert_eq!(engine.tracker().state(2), MeasureState::Dirty);
}

#[test]
fn test_skip_follows_the_tree_not_the_last_pass() {
    let f = Fixture::new();
    let root = f.node(
        "RootView",
        1,
        RawProps::new(),
        vec![f.node("View", 2, RawProps::new().set("height", 20), vec![])],
    );
    let engine = LayoutEngine::new(Diagnostics::new());
    let narrow = engine
        .measure(CandidateTree::new(root, 1, 0), &viewport())
        .unwrap();
    assert_eq!(narrow.constraints(), Some(viewport()));

    // a wider pass whose result is thrown away
    let wider = LayoutConstraints::new(Size::new(500.0, 300.0));
    drop(engine.measure(narrow.clone(), &wider).unwrap());

    // the narrow tree was never laid out at 500 wide
    let out = engine.measure(narrow.clone(), &wider).unwrap();
    assert!(!Arc::ptr_eq(out.root(), narrow.root()));
    assert_eq!(frame(&out, 2).w, 500.0);
    assert_eq!(out.constraints(), Some(wider));

    let again = engine.measure(narrow.clone(), &viewport()).unwrap();
    assert!(Arc::ptr_eq(again.root(), narrow.root()));
}

#[test]
fn test_tracker_settles_after_passes() {
    let f = Fixture::new();
    let paragraph = |tag| {
        f.node(
            "Paragraph",
            tag,
            RawProps::new(),
            vec![f.text(tag + 100, "settled")],
        )
    };
    let root = f.node("RootView", 1, RawProps::new(), vec![paragraph(2), paragraph(3)]);
    let engine = LayoutEngine::new(Diagnostics::new());
    let candidate = CandidateTree::new(root, 1, 0);

    // two passes over the same unchanged nodes both keep their results
    let a = engine.measure(candidate.clone(), &viewport()).unwrap();
    let b = engine.measure(candidate, &viewport()).unwrap();
    for out in [&a, &b] {
        assert!(out.find(2).unwrap().state().paragraph().is_some());
        assert!(!out.root().is_layout_dirty());
    }
    assert_eq!(engine.tracker().state(2), MeasureState::Clean);
    assert_eq!(engine.tracker().len(), 2);
}
