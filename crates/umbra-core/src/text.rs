//! Data carried by text components: paragraph, span and raw-text props, and
//! the paragraph state the measurer writes back. The measurement algorithm
//! itself lives in `umbra-text`.

use std::ops::Range;

use crate::props::{LayoutStyle, RawProps, RawValue};
use crate::{Rect, Size, Tag};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Text attributes; `None` means "inherit from the enclosing run".
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextAttributes {
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_size_multiplier: Option<f32>,
    pub font_weight: Option<u16>,
    pub font_style: Option<FontStyle>,
    pub letter_spacing: Option<f32>,
    pub line_height: Option<f32>,
    pub allow_font_scaling: Option<bool>,
}

impl TextAttributes {
    /// Overlays every attribute `child` sets on top of `self`.
    pub fn apply(&mut self, child: &TextAttributes) {
        if child.font_family.is_some() {
            self.font_family = child.font_family.clone();
        }
        self.font_size = child.font_size.or(self.font_size);
        self.font_size_multiplier = child.font_size_multiplier.or(self.font_size_multiplier);
        self.font_weight = child.font_weight.or(self.font_weight);
        self.font_style = child.font_style.or(self.font_style);
        self.letter_spacing = child.letter_spacing.or(self.letter_spacing);
        self.line_height = child.line_height.or(self.line_height);
        self.allow_font_scaling = child.allow_font_scaling.or(self.allow_font_scaling);
    }

    pub fn apply_raw(&mut self, raw: &RawProps) {
        raw.patch_opt_string("fontFamily", &mut self.font_family);
        raw.patch_opt_f32("fontSize", &mut self.font_size);
        raw.patch_opt_f32("fontSizeMultiplier", &mut self.font_size_multiplier);
        raw.patch("fontWeight", &mut self.font_weight, None, parse_font_weight);
        raw.patch("fontStyle", &mut self.font_style, None, |v| match v.as_str()? {
            "normal" => Some(Some(FontStyle::Normal)),
            "italic" => Some(Some(FontStyle::Italic)),
            _ => None,
        });
        raw.patch_opt_f32("letterSpacing", &mut self.letter_spacing);
        raw.patch_opt_f32("lineHeight", &mut self.line_height);
        raw.patch_opt_bool("allowFontScaling", &mut self.allow_font_scaling);
    }
}

fn parse_font_weight(v: &RawValue) -> Option<Option<u16>> {
    match v {
        RawValue::Number(n) => Some(Some((*n as u16).clamp(100, 900))),
        RawValue::String(s) => match s.as_str() {
            "normal" => Some(Some(400)),
            "bold" => Some(Some(700)),
            other => other.parse::<u16>().ok().map(|w| Some(w.clamp(100, 900))),
        },
        _ => None,
    }
}

/// How the last visible line is cut when content does not fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineBreakMode {
    /// Cut at the last word boundary that fits, no ellipsis.
    WordWrapping,
    /// Cut at the last grapheme that fits, no ellipsis.
    CharWrapping,
    /// Cut at the constraint, possibly through a glyph run.
    Clipping,
    TruncatingHead,
    #[default]
    TruncatingTail,
    TruncatingMiddle,
}

impl LineBreakMode {
    fn parse(v: &RawValue) -> Option<LineBreakMode> {
        Some(match v.as_str()? {
            "word" | "wordWrapping" => LineBreakMode::WordWrapping,
            "char" | "charWrapping" => LineBreakMode::CharWrapping,
            "clip" | "clipping" => LineBreakMode::Clipping,
            "head" => LineBreakMode::TruncatingHead,
            "tail" => LineBreakMode::TruncatingTail,
            "middle" => LineBreakMode::TruncatingMiddle,
            _ => return None,
        })
    }

    pub fn uses_ellipsis(self) -> bool {
        matches!(
            self,
            LineBreakMode::TruncatingHead
                | LineBreakMode::TruncatingTail
                | LineBreakMode::TruncatingMiddle
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParagraphProps {
    pub style: LayoutStyle,
    pub attributes: TextAttributes,
    /// `0` means unlimited.
    pub maximum_number_of_lines: usize,
    pub line_break_mode: LineBreakMode,
    pub adjusts_font_size_to_fit: bool,
    pub minimum_font_scale: f32,
    pub text_align: TextAlign,
    pub on_text_layout: bool,
    pub on_layout: bool,
}

impl Default for ParagraphProps {
    fn default() -> Self {
        Self {
            style: LayoutStyle::default(),
            attributes: TextAttributes::default(),
            maximum_number_of_lines: 0,
            line_break_mode: LineBreakMode::default(),
            adjusts_font_size_to_fit: false,
            minimum_font_scale: 0.0,
            text_align: TextAlign::default(),
            on_text_layout: false,
            on_layout: false,
        }
    }
}

impl ParagraphProps {
    pub fn apply_raw(&mut self, raw: &RawProps) {
        self.style.apply_raw(raw);
        self.attributes.apply_raw(raw);
        let parse_lines = |v: &RawValue| v.as_f32().map(|n| n.max(0.0) as usize);
        raw.patch("numberOfLines", &mut self.maximum_number_of_lines, 0, parse_lines);
        raw.patch(
            "maximumNumberOfLines",
            &mut self.maximum_number_of_lines,
            0,
            parse_lines,
        );
        raw.patch(
            "ellipsizeMode",
            &mut self.line_break_mode,
            LineBreakMode::default(),
            LineBreakMode::parse,
        );
        raw.patch(
            "lineBreakMode",
            &mut self.line_break_mode,
            LineBreakMode::default(),
            LineBreakMode::parse,
        );
        raw.patch_bool("adjustsFontSizeToFit", &mut self.adjusts_font_size_to_fit, false);
        raw.patch("minimumFontScale", &mut self.minimum_font_scale, 0.0, |v| {
            v.as_f32().map(|s| s.clamp(0.0, 1.0))
        });
        raw.patch("textAlign", &mut self.text_align, TextAlign::Left, |v| {
            Some(match v.as_str()? {
                "left" | "auto" => TextAlign::Left,
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                _ => return None,
            })
        });
        raw.patch_bool("onTextLayout", &mut self.on_text_layout, false);
        raw.patch_bool("onLayout", &mut self.on_layout, false);
    }
}

/// Nested span inside a paragraph.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextProps {
    pub attributes: TextAttributes,
}

impl TextProps {
    pub fn apply_raw(&mut self, raw: &RawProps) {
        self.attributes.apply_raw(raw);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawTextProps {
    pub text: String,
}

impl RawTextProps {
    pub fn apply_raw(&mut self, raw: &RawProps) {
        let mut text = Some(std::mem::take(&mut self.text));
        raw.patch_opt_string("text", &mut text);
        self.text = text.unwrap_or_default();
    }
}

/// Metrics of one laid-out line, as surfaced by `onTextLayout`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LineMetrics {
    pub index: usize,
    /// Byte range into the flattened paragraph text, from the line's first
    /// visible cluster to its last. On a middle-truncated line it includes
    /// the source text the ellipsis stands for, so it can be longer than
    /// `text`.
    pub byte_range: Range<usize>,
    /// `byte_range` in chars.
    pub char_range: Range<usize>,
    /// Frame relative to the paragraph's content box.
    pub frame: Rect,
    /// Visible text of the line, including any inserted ellipsis.
    pub text: String,
}

/// Geometry of one styled run on one line.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RunFragment {
    pub run: usize,
    pub line: usize,
    /// Tag of the span, raw text or attachment node the run came from.
    pub source: Tag,
    pub byte_range: Range<usize>,
    pub frame: Rect,
}

/// Paragraph state written by text measurement.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ParagraphState {
    pub measured_size: Size,
    /// Fit scale actually used (`1.0` unless the font was shrunk to fit).
    pub font_scale: f32,
    pub lines: Vec<LineMetrics>,
    pub fragments: Vec<RunFragment>,
    pub truncated: bool,
    /// Width the layout was computed for; `None` when unconstrained.
    pub laid_out_width: Option<f32>,
}

impl Default for ParagraphState {
    fn default() -> Self {
        Self {
            measured_size: Size::ZERO,
            font_scale: 1.0,
            lines: Vec::new(),
            fragments: Vec::new(),
            truncated: false,
            laid_out_width: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_inherit_only_unset() {
        let mut parent = TextAttributes {
            font_size: Some(14.0),
            font_weight: Some(400),
            ..Default::default()
        };
        let child = TextAttributes {
            font_weight: Some(700),
            ..Default::default()
        };
        parent.apply(&child);
        assert_eq!(parent.font_size, Some(14.0));
        assert_eq!(parent.font_weight, Some(700));
    }

    #[test]
    fn test_paragraph_props_from_raw() {
        let mut p = ParagraphProps::default();
        p.apply_raw(
            &RawProps::new()
                .set("numberOfLines", 2)
                .set("ellipsizeMode", "middle")
                .set("adjustsFontSizeToFit", true)
                .set("minimumFontScale", 0.5)
                .set("fontWeight", "bold"),
        );
        assert_eq!(p.maximum_number_of_lines, 2);
        assert_eq!(p.line_break_mode, LineBreakMode::TruncatingMiddle);
        assert!(p.adjusts_font_size_to_fit);
        assert_eq!(p.minimum_font_scale, 0.5);
        assert_eq!(p.attributes.font_weight, Some(700));
    }

    #[test]
    fn test_raw_text_reset() {
        let mut t = RawTextProps::default();
        t.apply_raw(&RawProps::new().set("text", "hello"));
        assert_eq!(t.text, "hello");
        t.apply_raw(&RawProps::new().set("text", RawValue::Null));
        assert_eq!(t.text, "");
    }
}
