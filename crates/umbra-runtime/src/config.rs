use umbra_core::{Size, SurfaceId};
use umbra_text::TruncationPolicy;

/// Surface settings for a [`Renderer`](crate::Renderer).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct RendererConfig {
    pub surface_id: SurfaceId,
    /// Size the root view fills.
    pub viewport: Size,
    /// Dynamic-type multiplier applied to text that allows font scaling.
    pub font_scale: f32,
    pub truncation: TruncationPolicy,
    /// Queue `onLayout` events after each commit.
    pub layout_events: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_id: 1,
            viewport: Size::new(360.0, 640.0),
            font_scale: 1.0,
            truncation: TruncationPolicy::default(),
            layout_events: true,
        }
    }
}

impl RendererConfig {
    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Size::new(width, height);
        self
    }

    pub fn with_font_scale(mut self, scale: f32) -> Self {
        self.font_scale = scale;
        self
    }
}
