//! Paragraph measurement: line layout, font-size fitting and the
//! truncation fallback.

use std::ops::Range;
use std::sync::Arc;

use umbra_core::text::{LineMetrics, ParagraphProps, ParagraphState, RunFragment, TextAlign};
use umbra_core::{Rect, Size};

use crate::breaker::{EPSILON, Line, Shaped, break_lines};
use crate::truncate::{Item, truncate_last_line};
use crate::{
    ApproximateFontMetrics, AttributedString, FontMetrics, FontSpec, TruncationPolicy,
};

/// Smallest scale the fitting search will try, whatever `minimumFontScale`
/// says.
pub const MIN_FONT_SCALE: f32 = 0.01;

/// Search stops once the fitting interval is narrower than this.
pub const FONT_SCALE_PRECISION: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParagraphConstraints {
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
    /// Surface dynamic-type multiplier.
    pub font_scale: f32,
}

impl Default for ParagraphConstraints {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            font_scale: 1.0,
        }
    }
}

/// Content that still did not fit after the fallback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overflow {
    pub needed: f32,
    pub available: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParagraphLayout {
    pub state: ParagraphState,
    pub overflow: Option<Overflow>,
}

impl ParagraphLayout {
    pub fn size(&self) -> Size {
        self.state.measured_size
    }
}

struct Attempt {
    scale: f32,
    fonts: Vec<FontSpec>,
    shaped: Shaped,
    lines: Vec<Line>,
}

impl Attempt {
    fn height(&self) -> f32 {
        self.lines.iter().map(|l| l.height).sum()
    }
}

#[derive(Clone)]
pub struct ParagraphMeasurer {
    metrics: Arc<dyn FontMetrics>,
    policy: TruncationPolicy,
}

impl Default for ParagraphMeasurer {
    fn default() -> Self {
        Self::new(Arc::new(ApproximateFontMetrics))
    }
}

impl std::fmt::Debug for ParagraphMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParagraphMeasurer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ParagraphMeasurer {
    pub fn new(metrics: Arc<dyn FontMetrics>) -> Self {
        Self {
            metrics,
            policy: TruncationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TruncationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &TruncationPolicy {
        &self.policy
    }

    /// Lays out `text` under `constraints`. Never fails: content that cannot
    /// fit is truncated and reported through [`ParagraphLayout::overflow`].
    pub fn measure(
        &self,
        text: &AttributedString,
        props: &ParagraphProps,
        constraints: &ParagraphConstraints,
    ) -> ParagraphLayout {
        let base: Vec<FontSpec> = text
            .runs
            .iter()
            .map(|r| FontSpec::resolve(&r.attributes, constraints.font_scale))
            .collect();
        let attempt = |scale: f32| self.attempt(text, &base, scale, constraints.max_width);
        let fits = |a: &Attempt| {
            (props.maximum_number_of_lines == 0 || a.lines.len() <= props.maximum_number_of_lines)
                && constraints
                    .max_height
                    .is_none_or(|h| a.height() <= h + EPSILON)
        };

        let natural = attempt(1.0);
        if fits(&natural) || !props.adjusts_font_size_to_fit {
            return self.finish(text, natural, props, constraints, None);
        }

        let min_scale = props.minimum_font_scale.clamp(MIN_FONT_SCALE, 1.0);
        let smallest = attempt(min_scale);
        if !fits(&smallest) {
            let available = self.available_height(&smallest, props, constraints);
            let overflow = Overflow {
                needed: smallest.height(),
                available,
            };
            log::debug!(
                "paragraph does not fit at scale {min_scale}: {:.1} > {:.1}",
                overflow.needed,
                overflow.available
            );
            return self.finish(text, smallest, props, constraints, Some(overflow));
        }

        // invariant: `low` fits, `high` does not
        let mut best = smallest;
        let (mut low, mut high) = (min_scale, 1.0f32);
        while high - low > FONT_SCALE_PRECISION {
            let mid = (low + high) / 2.0;
            let a = attempt(mid);
            if fits(&a) {
                low = mid;
                best = a;
            } else {
                high = mid;
            }
        }
        log::trace!("fitted font scale {:.3}", best.scale);
        self.finish(text, best, props, constraints, None)
    }

    fn attempt(
        &self,
        text: &AttributedString,
        base: &[FontSpec],
        scale: f32,
        max_width: Option<f32>,
    ) -> Attempt {
        let fonts: Vec<FontSpec> = base.iter().map(|f| f.scaled(scale)).collect();
        let shaped = Shaped::new(text, &fonts, self.metrics.as_ref());
        let lines = break_lines(&shaped, max_width);
        Attempt {
            scale,
            fonts,
            shaped,
            lines,
        }
    }

    /// Height the visible lines may take.
    fn available_height(
        &self,
        a: &Attempt,
        props: &ParagraphProps,
        constraints: &ParagraphConstraints,
    ) -> f32 {
        let by_lines = (props.maximum_number_of_lines > 0).then(|| {
            a.lines
                .iter()
                .take(props.maximum_number_of_lines)
                .map(|l| l.height)
                .sum::<f32>()
        });
        match (by_lines, constraints.max_height) {
            (Some(l), Some(h)) => l.min(h),
            (Some(l), None) => l,
            (None, Some(h)) => h,
            (None, None) => a.height(),
        }
    }

    /// Number of lines shown: the line limit and the height constraint, but
    /// always at least one line when there is text.
    fn visible_lines(
        &self,
        a: &Attempt,
        props: &ParagraphProps,
        constraints: &ParagraphConstraints,
    ) -> usize {
        let mut n = a.lines.len();
        if props.maximum_number_of_lines > 0 {
            n = n.min(props.maximum_number_of_lines);
        }
        if let Some(max_h) = constraints.max_height {
            let mut y = 0.0;
            let fitting = a.lines[..n]
                .iter()
                .take_while(|l| {
                    y += l.height;
                    y <= max_h + EPSILON
                })
                .count();
            n = fitting.max(1).min(n);
        }
        n
    }

    fn finish(
        &self,
        text: &AttributedString,
        a: Attempt,
        props: &ParagraphProps,
        constraints: &ParagraphConstraints,
        overflow: Option<Overflow>,
    ) -> ParagraphLayout {
        let shown = self.visible_lines(&a, props, constraints);
        let truncated = shown < a.lines.len();

        let mut rows: Vec<(Vec<Item>, f32)> = Vec::with_capacity(shown);
        for (index, line) in a.lines[..shown].iter().enumerate() {
            let items = if truncated && index + 1 == shown {
                let ellipsis = |run: usize| {
                    self.policy
                        .ellipsis
                        .chars()
                        .map(|c| {
                            let mut buf = [0u8; 4];
                            self.metrics.advance(c.encode_utf8(&mut buf), &a.fonts[run])
                        })
                        .sum::<f32>()
                };
                truncate_last_line(
                    &a.shaped,
                    line.clusters.start..a.shaped.clusters.len(),
                    props.line_break_mode,
                    &self.policy,
                    constraints.max_width,
                    &ellipsis,
                )
            } else {
                line.clusters
                    .clone()
                    .filter(|&i| !a.shaped.clusters[i].newline)
                    .map(Item::Cluster)
                    .collect()
            };
            rows.push((items, line.height));
        }

        let item_width = |item: &Item| match item {
            Item::Cluster(i) => a.shaped.clusters[*i].advance,
            Item::Ellipsis { advance, .. } => *advance,
        };
        let row_width = |items: &[Item]| {
            let end = items
                .iter()
                .rposition(|item| match item {
                    Item::Cluster(i) => !a.shaped.clusters[*i].whitespace,
                    Item::Ellipsis { .. } => true,
                })
                .map_or(0, |p| p + 1);
            items[..end].iter().map(item_width).sum::<f32>()
        };

        let mut content_width = rows
            .iter()
            .map(|(items, _)| row_width(items))
            .fold(0.0, f32::max);
        if let Some(w) = constraints.max_width {
            content_width = content_width.min(w);
        }
        let box_width = constraints.max_width.unwrap_or(content_width);

        let mut lines = Vec::with_capacity(rows.len());
        let mut fragments = Vec::new();
        let mut y = 0.0;
        for (index, (items, height)) in rows.iter().enumerate() {
            let width = row_width(items).min(box_width);
            let x0 = match props.text_align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((box_width - width) / 2.0).max(0.0),
                TextAlign::Right => (box_width - width).max(0.0),
            };

            let mut visible = String::new();
            let mut bytes: Option<Range<usize>> = None;
            let mut x = x0;
            let mut current: Option<RunFragment> = None;
            for item in items {
                let (run, range) = match item {
                    Item::Cluster(i) => {
                        let c = &a.shaped.clusters[*i];
                        visible.push_str(&text.text[c.range.clone()]);
                        bytes = Some(match bytes {
                            Some(b) => b.start.min(c.range.start)..b.end.max(c.range.end),
                            None => c.range.clone(),
                        });
                        (c.run, Some(c.range.clone()))
                    }
                    Item::Ellipsis { run, .. } => {
                        visible.push_str(&self.policy.ellipsis);
                        (*run, None)
                    }
                };
                let w = item_width(item);
                match current.as_mut() {
                    Some(f) if f.run == run => {
                        f.frame.w += w;
                        if let Some(r) = range {
                            f.byte_range = if f.byte_range.is_empty() {
                                r
                            } else {
                                f.byte_range.start.min(r.start)..f.byte_range.end.max(r.end)
                            };
                        }
                    }
                    _ => {
                        fragments.extend(current.take());
                        current = Some(RunFragment {
                            run,
                            line: index,
                            source: text.runs[run].source,
                            byte_range: range.unwrap_or(0..0),
                            frame: Rect::new(x, y, w, *height),
                        });
                    }
                }
                x += w;
            }
            fragments.extend(current.take());

            let byte_range = bytes.unwrap_or_else(|| {
                let at = a.lines[index].clusters.start;
                let offset = a.shaped.clusters.get(at).map_or(text.text.len(), |c| c.range.start);
                offset..offset
            });
            let char_start = text.text[..byte_range.start].chars().count();
            let char_len = text.text[byte_range.clone()].chars().count();
            lines.push(LineMetrics {
                index,
                byte_range,
                char_range: char_start..char_start + char_len,
                frame: Rect::new(x0, y, width, *height),
                text: visible,
            });
            y += height;
        }

        let mut height = y;
        if let Some(h) = constraints.max_height {
            height = height.min(h);
        }

        ParagraphLayout {
            state: ParagraphState {
                measured_size: Size::new(content_width, height),
                font_scale: a.scale,
                lines,
                fragments,
                truncated,
                laid_out_width: constraints.max_width,
            },
            overflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use umbra_core::text::{LineBreakMode, TextAttributes};

    use super::*;

    fn text(s: &str) -> AttributedString {
        let mut a = AttributedString::default();
        a.push_text(s, TextAttributes::default(), 7);
        a
    }

    fn width(w: f32) -> ParagraphConstraints {
        ParagraphConstraints {
            max_width: Some(w),
            ..Default::default()
        }
    }

    #[test]
    fn test_natural_layout() {
        let m = ParagraphMeasurer::default();
        let out = m.measure(&text("hello world"), &ParagraphProps::default(), &width(200.0));
        let s = &out.state;
        assert_eq!(s.lines.len(), 1);
        assert_eq!(s.font_scale, 1.0);
        assert!(!s.truncated);
        assert!(out.overflow.is_none());
        // 10 letters at 8.4pt plus a 4.2pt space
        assert!((s.measured_size.width - 88.2).abs() < 0.01);
        assert!((s.measured_size.height - 18.2).abs() < 0.01);
        assert_eq!(s.fragments.len(), 1);
        assert_eq!(s.fragments[0].source, 7);
    }

    #[test]
    fn test_shrinks_to_fit_one_line() {
        let m = ParagraphMeasurer::default();
        let props = ParagraphProps {
            maximum_number_of_lines: 1,
            adjusts_font_size_to_fit: true,
            minimum_font_scale: 0.5,
            ..Default::default()
        };
        // 71.4pt at full size, so the largest fitting scale is just over 0.84
        let out = m.measure(&text("aaaa aaaa"), &props, &width(60.0));
        let s = &out.state;
        assert_eq!(s.lines.len(), 1);
        assert!(!s.truncated);
        assert!(out.overflow.is_none());
        assert!(s.font_scale <= 0.8404 && s.font_scale > 0.82, "{}", s.font_scale);
        assert_eq!(s.lines[0].text, "aaaa aaaa");
    }

    #[test]
    fn test_fallback_at_minimum_scale() {
        let m = ParagraphMeasurer::default();
        let props = ParagraphProps {
            maximum_number_of_lines: 1,
            adjusts_font_size_to_fit: true,
            minimum_font_scale: 0.5,
            line_break_mode: LineBreakMode::TruncatingTail,
            ..Default::default()
        };
        let content = "the quick brown fox jumps over the lazy dog and keeps on running";
        let out = m.measure(&text(content), &props, &width(100.0));
        let s = &out.state;
        assert_eq!(s.font_scale, 0.5);
        assert_eq!(s.lines.len(), 1);
        assert!(s.truncated);
        assert!(s.lines[0].text.ends_with('\u{2026}'));
        assert!(content.starts_with(s.lines[0].text.trim_end_matches('\u{2026}')));
        assert!(s.measured_size.width <= 100.0);
        let overflow = out.overflow.expect("overflow reported");
        assert!(overflow.needed > overflow.available);
    }

    #[test]
    fn test_line_limit_without_fitting() {
        let m = ParagraphMeasurer::default();
        let props = ParagraphProps {
            maximum_number_of_lines: 2,
            line_break_mode: LineBreakMode::TruncatingHead,
            ..Default::default()
        };
        let out = m.measure(&text("one two three four five six"), &props, &width(50.0));
        let s = &out.state;
        assert_eq!(s.lines.len(), 2);
        assert!(s.truncated);
        assert_eq!(s.font_scale, 1.0);
        assert!(s.lines[1].text.starts_with('\u{2026}'));
        assert!(s.lines[1].text.ends_with("six"));
        // plain truncation is not an overflow
        assert!(out.overflow.is_none());
    }

    #[test]
    fn test_height_constraint_limits_lines() {
        let m = ParagraphMeasurer::default();
        let c = ParagraphConstraints {
            max_width: Some(50.0),
            max_height: Some(20.0),
            font_scale: 1.0,
        };
        let out = m.measure(&text("one two three"), &ParagraphProps::default(), &c);
        assert_eq!(out.state.lines.len(), 1);
        assert!(out.state.truncated);
        assert!(out.state.measured_size.height <= 20.0);
    }

    #[test]
    fn test_line_metrics_ranges_and_alignment() {
        let m = ParagraphMeasurer::default();
        let props = ParagraphProps {
            text_align: TextAlign::Right,
            ..Default::default()
        };
        let out = m.measure(&text("héllo wörld"), &props, &width(60.0));
        let lines = &out.state.lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "héllo ");
        assert_eq!(lines[0].char_range, 0..6);
        assert_eq!(lines[0].byte_range, 0..7);
        assert_eq!(lines[1].char_range, 6..11);
        assert_eq!(lines[1].byte_range, 7..13);
        // right aligned: 5 letters are 42pt wide in a 60pt box
        assert!((lines[1].frame.x - 18.0).abs() < 0.01);
        assert!((lines[1].frame.y - 18.2).abs() < 0.01);
    }

    #[test]
    fn test_middle_truncation_ranges_cover_hidden_text() {
        let m = ParagraphMeasurer::default();
        let props = ParagraphProps {
            maximum_number_of_lines: 1,
            line_break_mode: LineBreakMode::TruncatingMiddle,
            ..Default::default()
        };
        let out = m.measure(&text("abcdefghijklmnop"), &props, &width(50.0));
        let line = &out.state.lines[0];
        assert!(out.state.truncated);
        assert_eq!(line.text, "ab\u{2026}op");
        // the span runs from the visible head to the visible tail
        assert_eq!(line.byte_range, 0..16);
        assert_eq!(line.char_range, 0..16);
    }

    #[test]
    fn test_font_scaling_multiplier() {
        let m = ParagraphMeasurer::default();
        let c = ParagraphConstraints {
            font_scale: 2.0,
            ..Default::default()
        };
        let out = m.measure(&text("ab"), &ParagraphProps::default(), &c);
        assert!((out.state.measured_size.width - 33.6).abs() < 0.01);
    }
}
