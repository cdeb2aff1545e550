use umbra_core::{ComponentRegistry, Element, EventKind, RawProps, StubViewTree, TreeUpdate};
use umbra_devtools::{Inspector, dump_tree};
use umbra_runtime::{ROOT_TAG, Renderer, RendererConfig};

const HEADLINE: &str = "Shadow trees lay out off the main thread and commit atomically";

fn headline(width: f32) -> Element {
    Element::new("Paragraph", 10)
        .prop("width", width)
        .prop("numberOfLines", 1)
        .prop("adjustsFontSizeToFit", true)
        .prop("minimumFontScale", 0.5)
        .prop("fontSize", 20)
        .prop("onTextLayout", true)
        .child(Element::raw_text(11, HEADLINE))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let renderer = Renderer::new(
        RendererConfig::default().with_viewport(480.0, 320.0),
        ComponentRegistry::with_builtins(),
        StubViewTree::new(),
    )?;
    let mut inspector = Inspector::new();
    inspector.toggle();

    let report = renderer.render(vec![
        TreeUpdate::Create {
            element: Element::new("View", 2)
                .prop("padding", 16)
                .prop("alignItems", "flex-start")
                .child(headline(440.0)),
        },
        TreeUpdate::UpdateChildren {
            tag: ROOT_TAG,
            children: vec![2],
        },
    ])?;
    inspector.record(&report);

    // shrink the box until the headline no longer fits even at half size
    for width in [360.0, 260.0, 160.0] {
        let report = renderer.render(vec![TreeUpdate::UpdateProps {
            tag: 10,
            props: RawProps::new().set("width", width),
        }])?;
        inspector.record(&report);

        for event in renderer.drain_events() {
            if event.kind == EventKind::TextLayout {
                for line in &event.payload.line_metrics {
                    println!("width {width:>5}: line {} {:?}", line.index, line.text);
                }
            }
        }
        inspector.collect(renderer.diagnostics());
    }

    println!("{}", dump_tree(&renderer.coordinator().committed()));
    println!("{}", inspector.hud.summary());
    for line in inspector.log() {
        println!("{line}");
    }
    Ok(())
}
