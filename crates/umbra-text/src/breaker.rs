//! Grapheme clusters and greedy line breaking.
//!
//! Lines break at word boundaries. Whitespace at the end of a line hangs past
//! the available width and is not counted in the line's width. A single word
//! wider than the line is broken between graphemes.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::{AttributedString, FontMetrics, FontSpec, RunKind};

/// Tolerance for float accumulation when comparing against constraints.
pub(crate) const EPSILON: f32 = 0.001;

#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// Byte range into the attributed text.
    pub range: Range<usize>,
    pub run: usize,
    pub advance: f32,
    pub height: f32,
    pub whitespace: bool,
    pub newline: bool,
}

/// Clusters of one attributed string at one font scale, with word segments
/// as ranges of cluster indices.
#[derive(Clone, Debug, Default)]
pub struct Shaped {
    pub clusters: Vec<Cluster>,
    pub segments: Vec<Range<usize>>,
}

impl Shaped {
    pub fn new(text: &AttributedString, fonts: &[FontSpec], metrics: &dyn FontMetrics) -> Self {
        let mut clusters = Vec::new();
        for (start, g) in text.text.grapheme_indices(true) {
            let Some(run) = text.run_at(start) else {
                continue;
            };
            let font = &fonts[run];
            let newline = matches!(g, "\n" | "\r\n" | "\r" | "\u{2028}" | "\u{2029}");
            let whitespace = !newline && g.chars().all(char::is_whitespace);
            let (advance, height) = match &text.runs[run].kind {
                RunKind::Attachment(size) => (size.width, size.height),
                RunKind::Text => {
                    let height = font
                        .line_height
                        .unwrap_or_else(|| metrics.line_height(font));
                    let advance = if newline {
                        0.0
                    } else {
                        metrics.advance(g, font) + font.letter_spacing
                    };
                    (advance, height)
                }
            };
            clusters.push(Cluster {
                range: start..start + g.len(),
                run,
                advance,
                height,
                whitespace,
                newline,
            });
        }

        let mut segments = Vec::new();
        let mut next = 0;
        for (start, word) in text.text.split_word_bound_indices() {
            let end = start + word.len();
            let first = next;
            while next < clusters.len() && clusters[next].range.start < end {
                next += 1;
            }
            if next > first {
                segments.push(first..next);
            }
        }
        Self { clusters, segments }
    }

    pub fn width(&self, range: Range<usize>) -> f32 {
        self.clusters[range].iter().map(|c| c.advance).sum()
    }

    fn is_whitespace(&self, seg: &Range<usize>) -> bool {
        self.clusters[seg.clone()].iter().all(|c| c.whitespace)
    }

    fn is_newline(&self, seg: &Range<usize>) -> bool {
        self.clusters[seg.clone()].iter().any(|c| c.newline)
    }

    /// Whether a word boundary falls right before cluster `index`.
    pub fn is_word_boundary(&self, index: usize) -> bool {
        index == 0
            || index >= self.clusters.len()
            || self.segments.iter().any(|s| s.start == index)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// Cluster indices, including hanging whitespace and the line break.
    pub clusters: Range<usize>,
    /// Width without trailing whitespace.
    pub width: f32,
    pub height: f32,
}

impl Line {
    fn new(shaped: &Shaped, clusters: Range<usize>, width: f32) -> Self {
        let height = shaped.clusters[clusters.clone()]
            .iter()
            .map(|c| c.height)
            .fold(0.0, f32::max);
        Self {
            clusters,
            width,
            height,
        }
    }
}

/// Greedy line breaking; `None` wraps only at explicit line breaks.
pub fn break_lines(shaped: &Shaped, max_width: Option<f32>) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut width = 0.0f32;
    let mut content_width = 0.0f32;
    let mut has_content = false;

    for seg in &shaped.segments {
        if shaped.is_newline(seg) {
            lines.push(Line::new(shaped, start..seg.end, content_width));
            start = seg.end;
            width = 0.0;
            content_width = 0.0;
            has_content = false;
            continue;
        }
        let seg_width = shaped.width(seg.clone());
        if shaped.is_whitespace(seg) {
            width += seg_width;
            continue;
        }
        if let Some(max) = max_width {
            if has_content && width + seg_width > max + EPSILON {
                lines.push(Line::new(shaped, start..seg.start, content_width));
                start = seg.start;
                width = 0.0;
                content_width = 0.0;
                has_content = false;
            }
            if !has_content && width + seg_width > max + EPSILON {
                for i in seg.clone() {
                    let advance = shaped.clusters[i].advance;
                    if has_content && width + advance > max + EPSILON {
                        lines.push(Line::new(shaped, start..i, content_width));
                        start = i;
                        width = 0.0;
                    }
                    width += advance;
                    content_width = width;
                    has_content = true;
                }
                continue;
            }
        }
        width += seg_width;
        content_width = width;
        has_content = true;
    }
    if start < shaped.clusters.len() {
        lines.push(Line::new(shaped, start..shaped.clusters.len(), content_width));
    }
    lines
}
