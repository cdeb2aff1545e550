use std::sync::Barrier;
use std::thread;

use umbra_core::*;
use umbra_layout::MeasureState;
use umbra_runtime::{ROOT_TAG, Renderer, RendererConfig};

const LONG: &str = "the quick brown fox jumps over the lazy dog and keeps on running";

fn renderer() -> Renderer {
    Renderer::new(
        RendererConfig::default().with_viewport(300.0, 200.0),
        ComponentRegistry::with_builtins(),
        StubViewTree::new(),
    )
    .unwrap()
}

fn fitted_paragraph(tag: Tag, text_tag: Tag) -> Element {
    Element::new("Paragraph", tag)
        .prop("width", 100)
        .prop("numberOfLines", 1)
        .prop("adjustsFontSizeToFit", true)
        .prop("minimumFontScale", 0.5)
        .prop("onTextLayout", true)
        .child(Element::raw_text(text_tag, LONG))
}

fn mount(r: &Renderer, element: Element, children: Vec<Tag>) -> umbra_runtime::RenderReport {
    r.render(vec![
        TreeUpdate::Create { element },
        TreeUpdate::UpdateChildren {
            tag: ROOT_TAG,
            children,
        },
    ])
    .unwrap()
}

#[test]
fn test_render_mounts_laid_out_views() {
    let r = renderer();
    let report = mount(
        &r,
        Element::new("View", 2)
            .prop("flexDirection", "row")
            .prop("height", 50)
            .prop("padding", 10)
            .children([
                Element::new("View", 3).prop("width", 30),
                Element::new("View", 4).prop("flex", 1),
            ]),
        vec![2],
    );

    assert_eq!(report.generation, 1);
    assert_eq!(report.nodes, 4);
    assert!(report.mutations.iter().any(|m| m.kind() == "insert" && m.tag() == 2));

    assert_eq!(r.committed_frame(2), Some(Rect::new(0.0, 0.0, 300.0, 50.0)));
    assert_eq!(r.committed_frame(3), Some(Rect::new(10.0, 10.0, 30.0, 30.0)));
    assert_eq!(r.committed_frame(4), Some(Rect::new(40.0, 10.0, 250.0, 30.0)));

    r.with_mounting(|views| {
        assert_eq!(views.generation(), Some(1));
        assert_eq!(views.len(), 4);
        assert_eq!(views.find(4).unwrap().layout.frame.w, 250.0);
    });
}

#[test]
fn test_text_fallback_pipeline() {
    let r = renderer();
    let report = mount(&r, fitted_paragraph(2, 3), vec![2]);

    let committed = r.coordinator().committed();
    let paragraph = committed.find(2).unwrap();
    let state = paragraph.state().paragraph().unwrap();
    assert_eq!(state.font_scale, 0.5);
    assert!(state.truncated);
    assert!(state.lines[0].text.ends_with('\u{2026}'));

    // inline text is never mounted on its own
    r.with_mounting(|views| {
        assert!(views.find(2).is_some());
        assert!(views.find(3).is_none());
    });

    let diagnostics = r.diagnostics().take();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].generation, report.generation);
    assert!(matches!(
        diagnostics[0].error,
        UmbraError::MeasurementOverflow { tag: 2, .. }
    ));

    let events = r.drain_events();
    let text: Vec<_> = events
        .iter()
        .filter(|e| e.kind == EventKind::TextLayout)
        .collect();
    assert_eq!(text.len(), 1);
    assert_eq!(text[0].payload.instance_id, 2);
    assert_eq!(text[0].payload.generation, report.generation);
    assert_eq!(text[0].payload.line_metrics.len(), 1);
}

#[test]
fn test_prop_update_reflows_and_keeps_tags() {
    let r = renderer();
    mount(&r, Element::new("View", 2).prop("height", 40), vec![2]);
    let before = r.coordinator().committed().find(2).unwrap();

    let report = r
        .render(vec![TreeUpdate::UpdateProps {
            tag: 2,
            props: RawProps::new().set("height", 80).set("onLayout", true),
        }])
        .unwrap();
    let after = r.coordinator().committed().find(2).unwrap();
    assert_eq!(after.tag(), before.tag());
    assert!(after.revision() > before.revision());
    assert_eq!(r.committed_frame(2).unwrap().h, 80.0);
    assert!(report.mutations.iter().any(|m| m.kind() == "update" && m.tag() == 2));

    assert_eq!(report.layout_events, 1);
    let events = r.drain_events();
    assert!(
        events
            .iter()
            .any(|e| e.kind == EventKind::Layout && e.payload.frame.h == 80.0)
    );
}

#[test]
fn test_failed_update_leaves_committed_tree() {
    let r = renderer();
    mount(&r, Element::new("View", 2), vec![2]);
    let generation = r.coordinator().committed_generation();

    let err = r
        .render(vec![TreeUpdate::UpdateChildren {
            tag: ROOT_TAG,
            children: vec![2, 99],
        }])
        .unwrap_err();
    assert!(matches!(err, UmbraError::ChildNotFound { child: 99, .. }));
    assert_eq!(r.coordinator().committed_generation(), generation);
    assert!(r.committed_frame(2).is_some());

    let err = r
        .render(vec![TreeUpdate::Create {
            element: Element::new("Slider", 5),
        }])
        .unwrap_err();
    assert!(matches!(err, UmbraError::UnknownComponent(_)));
}

#[test]
fn test_concurrent_passes_one_commits() {
    let r = renderer();
    mount(&r, Element::new("View", 2).prop("height", 10), vec![2]);
    let base = r.coordinator().committed_generation();
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = [20, 30]
            .into_iter()
            .map(|height| {
                let r = &r;
                let barrier = &barrier;
                s.spawn(move || {
                    let pass = r
                        .prepare(vec![TreeUpdate::UpdateProps {
                            tag: 2,
                            props: RawProps::new().set("height", height),
                        }])
                        .unwrap();
                    // both candidates derive from the same committed tree
                    barrier.wait();
                    r.commit(pass)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let committed: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let rejected: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(committed.len(), 1);
    assert_eq!(rejected.len(), 1);
    assert!(matches!(
        rejected[0],
        UmbraError::StaleGeneration { committed: c, .. } if *c == committed[0].generation
    ));
    assert!(committed[0].generation > base);
    assert_eq!(r.coordinator().committed_generation(), committed[0].generation);

    let h = r.committed_frame(2).unwrap().h;
    assert!(h == 20.0 || h == 30.0);
}

#[test]
fn test_viewport_and_font_scale_changes() {
    let r = renderer();
    mount(
        &r,
        Element::new("Paragraph", 2)
            .child(Element::raw_text(3, "scaled text")),
        vec![2],
    );
    let base_height = r.committed_frame(2).unwrap().h;

    // nothing changed: the pass commits without mutations
    let report = r.relayout().unwrap();
    assert!(report.mutations.is_empty());

    r.set_viewport(Size::new(500.0, 300.0));
    r.relayout().unwrap();
    assert_eq!(r.committed_frame(ROOT_TAG).unwrap().w, 500.0);
    assert_eq!(r.committed_frame(2).unwrap().w, 500.0);

    r.set_font_scale(2.0);
    r.relayout().unwrap();
    let scaled = r.committed_frame(2).unwrap().h;
    assert!((scaled - base_height * 2.0).abs() < 1e-3);
}

#[test]
fn test_abandoned_pass_does_not_hide_new_constraints() {
    let r = renderer();
    mount(&r, Element::new("View", 2).prop("height", 20), vec![2]);

    r.set_viewport(Size::new(500.0, 300.0));
    drop(r.prepare(Vec::new()).unwrap());
    r.relayout().unwrap();
    assert_eq!(r.committed_frame(ROOT_TAG).unwrap().w, 500.0);
    assert_eq!(r.committed_frame(2).unwrap().w, 500.0);
    assert_eq!(
        r.coordinator().committed().constraints(),
        Some(r.constraints())
    );
}

#[test]
fn test_tracker_forgets_unmounted_nodes() {
    let r = renderer();
    for tag in 10..60 {
        r.render(vec![
            TreeUpdate::Create {
                element: Element::new("Paragraph", tag).child(Element::raw_text(tag + 1000, "swap")),
            },
            TreeUpdate::UpdateChildren {
                tag: ROOT_TAG,
                children: vec![tag],
            },
        ])
        .unwrap();
    }
    assert_eq!(r.coordinator().committed().len(), 2);
    assert_eq!(r.layout_engine().tracker().len(), 1);
    assert_eq!(r.layout_engine().tracker().state(59), MeasureState::Clean);
}

#[test]
fn test_state_updates_are_versioned() {
    let r = renderer();
    mount(
        &r,
        Element::new("Paragraph", 2).child(Element::raw_text(3, "hi")),
        vec![2],
    );
    let version = r.coordinator().committed().find(2).unwrap().state().version();

    let stale = StateUpdate::new(2, version + 5, StateData::Empty);
    let err = r.update_state(stale).unwrap_err();
    assert!(matches!(err, UmbraError::StaleState { tag: 2, .. }));

    // an accepted update is re-measured by the next layout pass
    let fresh = StateUpdate::new(2, version, StateData::Empty);
    r.update_state(fresh).unwrap();
    let node = r.coordinator().committed().find(2).unwrap();
    assert!(node.state().version() > version);
    assert!(node.state().paragraph().is_some());
}

#[cfg(feature = "serde")]
mod serde_shape {
    use super::*;

    #[test]
    fn test_config_from_json() {
        let config: RendererConfig = serde_json::from_str(
            r#"{ "viewport": { "width": 320.0, "height": 480.0 }, "fontScale": 1.5 }"#,
        )
        .unwrap();
        assert_eq!(config.viewport, Size::new(320.0, 480.0));
        assert_eq!(config.font_scale, 1.5);
        assert!(config.layout_events);
        assert_eq!(config.truncation.ellipsis, "\u{2026}");
    }

    #[test]
    fn test_text_layout_payload_shape() {
        let r = renderer();
        mount(&r, fitted_paragraph(2, 3), vec![2]);
        let event = r
            .drain_events()
            .into_iter()
            .find(|e| e.kind == EventKind::TextLayout)
            .unwrap();
        let json = serde_json::to_value(&event.payload).unwrap();
        assert_eq!(json["instanceId"], 2);
        assert!(json["generation"].is_u64());
        assert!(json["frame"].is_object());
        let line = &json["lineMetrics"][0];
        for key in ["index", "byteRange", "charRange", "frame", "text"] {
            assert!(line.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_raw_props_from_json() {
        let props: RawProps =
            serde_json::from_str(r#"{ "width": 10, "display": "none", "onLayout": true }"#).unwrap();
        assert_eq!(props.get("width"), Some(&RawValue::Number(10.0)));
        assert_eq!(props.get("onLayout"), Some(&RawValue::Bool(true)));
    }
}
