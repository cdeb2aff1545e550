//! Glyph metrics.
//!
//! Real shaping belongs to the platform. Measurement only needs advances and
//! line heights, which come from a [`FontMetrics`] implementation; the
//! default [`ApproximateFontMetrics`] uses fixed per-class ratios so layout is
//! deterministic everywhere, including tests.

use umbra_core::text::{FontStyle, TextAttributes};
use unicode_width::UnicodeWidthChar;

pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Fully resolved font for one run at one scale.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    pub family: Option<String>,
    pub size: f32,
    pub weight: u16,
    pub style: FontStyle,
    pub letter_spacing: f32,
    /// Explicit line height; `None` uses the font's natural one.
    pub line_height: Option<f32>,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: None,
            size: DEFAULT_FONT_SIZE,
            weight: 400,
            style: FontStyle::Normal,
            letter_spacing: 0.0,
            line_height: None,
        }
    }
}

impl FontSpec {
    /// Resolves inherited attributes. `surface_scale` is the surface's
    /// dynamic-type multiplier; an attribute-level `fontSizeMultiplier`
    /// replaces it, and `allowFontScaling: false` disables both.
    pub fn resolve(attrs: &TextAttributes, surface_scale: f32) -> Self {
        let multiplier = if attrs.allow_font_scaling.unwrap_or(true) {
            attrs.font_size_multiplier.unwrap_or(surface_scale)
        } else {
            1.0
        };
        let size = attrs.font_size.unwrap_or(DEFAULT_FONT_SIZE) * multiplier;
        Self {
            family: attrs.font_family.clone(),
            size,
            weight: attrs.font_weight.unwrap_or(400),
            style: attrs.font_style.unwrap_or_default(),
            letter_spacing: attrs.letter_spacing.unwrap_or(0.0) * multiplier,
            line_height: attrs.line_height.map(|h| h * multiplier),
        }
    }

    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            family: self.family.clone(),
            size: self.size * scale,
            weight: self.weight,
            style: self.style,
            letter_spacing: self.letter_spacing * scale,
            line_height: self.line_height.map(|h| h * scale),
        }
    }
}

pub trait FontMetrics: Send + Sync {
    /// Horizontal advance of one grapheme cluster, letter spacing excluded.
    fn advance(&self, grapheme: &str, font: &FontSpec) -> f32;

    /// Natural line height of `font`.
    fn line_height(&self, font: &FontSpec) -> f32;
}

/// Width-class estimate from the cluster's East Asian width: 0.6em for a
/// narrow glyph, 0.3em for a narrow space, a full em for wide characters and
/// emoji sequences, nothing for zero-width and control clusters.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApproximateFontMetrics;

impl ApproximateFontMetrics {
    fn em_width(grapheme: &str) -> f32 {
        // a cluster is as wide as its base character
        let Some(base) = grapheme.chars().next() else {
            return 0.0;
        };
        if base.is_control() {
            return 0.0;
        }
        let emoji_sequence = grapheme
            .chars()
            .skip(1)
            .any(|c| matches!(c, '\u{200D}' | '\u{FE0F}'));
        let cells = if emoji_sequence {
            2
        } else {
            base.width().unwrap_or(0)
        };
        match cells {
            0 => 0.0,
            1 if base.is_whitespace() => 0.3,
            1 => 0.6,
            _ => 1.0,
        }
    }
}

impl FontMetrics for ApproximateFontMetrics {
    fn advance(&self, grapheme: &str, font: &FontSpec) -> f32 {
        let bold = if font.weight >= 600 { 1.05 } else { 1.0 };
        Self::em_width(grapheme) * font.size * bold
    }

    fn line_height(&self, font: &FontSpec) -> f32 {
        font.size * 1.3
    }
}
