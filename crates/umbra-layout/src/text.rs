//! Paragraph measurement as a [`ContentMeasurer`].

use umbra_core::{ShadowNode, StateData};
use umbra_text::{AttributedString, ParagraphConstraints, ParagraphMeasurer};

use crate::{ContentMeasurer, MeasureConstraints, Measurement};

#[derive(Clone, Debug, Default)]
pub struct TextMeasurer {
    paragraphs: ParagraphMeasurer,
}

impl TextMeasurer {
    pub fn new(paragraphs: ParagraphMeasurer) -> Self {
        Self { paragraphs }
    }
}

impl ContentMeasurer for TextMeasurer {
    fn measure(&self, node: &ShadowNode, constraints: &MeasureConstraints) -> Measurement {
        let Some(props) = node.props().as_paragraph() else {
            log::warn!(
                "text measurer asked to measure {} node {}",
                node.component(),
                node.tag()
            );
            return Measurement::default();
        };
        let text = AttributedString::from_paragraph(node);
        let layout = self.paragraphs.measure(
            &text,
            props,
            &ParagraphConstraints {
                max_width: constraints.max_width,
                max_height: constraints.max_height,
                font_scale: constraints.font_scale,
            },
        );
        Measurement {
            size: layout.size(),
            line_metrics: props.on_text_layout.then(|| layout.state.lines.clone()),
            overflow: layout.overflow,
            state: Some(StateData::Paragraph(layout.state)),
        }
    }
}
