//! Flattening a paragraph's span tree into one string with styled runs.

use std::ops::Range;

use umbra_core::props::Dimension;
use umbra_core::text::TextAttributes;
use umbra_core::{NodeTraits, Props, ShadowNode, Size, Tag};

/// Object replacement character standing in for inline attachments.
pub const ATTACHMENT_CHAR: char = '\u{FFFC}';

#[derive(Clone, Debug, PartialEq)]
pub enum RunKind {
    Text,
    /// Fixed-size inline box (an image or view nested in text).
    Attachment(Size),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// Byte range into [`AttributedString::text`].
    pub range: Range<usize>,
    /// Inherited attributes with every level of nesting applied.
    pub attributes: TextAttributes,
    /// Node the run came from.
    pub source: Tag,
    pub kind: RunKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributedString {
    pub text: String,
    pub runs: Vec<TextRun>,
}

impl AttributedString {
    /// Flattens the children of `paragraph`; the paragraph's own attributes
    /// are the root of inheritance.
    pub fn from_paragraph(paragraph: &ShadowNode) -> Self {
        let base = paragraph
            .props()
            .as_paragraph()
            .map(|p| p.attributes.clone())
            .unwrap_or_default();
        let mut out = AttributedString::default();
        for child in paragraph.children() {
            out.flatten(child, &base);
        }
        out
    }

    pub fn push_text(&mut self, text: &str, attributes: TextAttributes, source: Tag) {
        if text.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(text);
        self.runs.push(TextRun {
            range: start..self.text.len(),
            attributes,
            source,
            kind: RunKind::Text,
        });
    }

    pub fn push_attachment(&mut self, size: Size, attributes: TextAttributes, source: Tag) {
        let start = self.text.len();
        self.text.push(ATTACHMENT_CHAR);
        self.runs.push(TextRun {
            range: start..self.text.len(),
            attributes,
            source,
            kind: RunKind::Attachment(size),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Index of the run containing byte `offset`.
    pub fn run_at(&self, offset: usize) -> Option<usize> {
        self.runs
            .binary_search_by(|r| {
                if r.range.end <= offset {
                    std::cmp::Ordering::Less
                } else if r.range.start > offset {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
    }

    fn flatten(&mut self, node: &ShadowNode, inherited: &TextAttributes) {
        match node.props() {
            Props::RawText(raw) => self.push_text(&raw.text, inherited.clone(), node.tag()),
            Props::Text(span) => {
                let mut attrs = inherited.clone();
                attrs.apply(&span.attributes);
                for child in node.children() {
                    self.flatten(child, &attrs);
                }
            }
            _ if node.traits().contains(NodeTraits::TEXT_KIND) => {
                log::debug!("nested {} inside text is flattened as a span", node.component());
                for child in node.children() {
                    self.flatten(child, inherited);
                }
            }
            _ => self.push_attachment(attachment_size(node), inherited.clone(), node.tag()),
        }
    }
}

/// Explicit point size from the node's style, falling back to its last
/// computed frame.
fn attachment_size(node: &ShadowNode) -> Size {
    let frame = node.layout().frame;
    let style = node.props().layout_style();
    let points = |d: Option<Dimension>, fallback: f32| match d {
        Some(Dimension::Points(v)) => v,
        _ => fallback,
    };
    Size::new(
        points(style.map(|s| s.width), frame.w),
        points(style.map(|s| s.height), frame.h),
    )
}
