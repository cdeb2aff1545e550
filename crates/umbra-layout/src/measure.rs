use umbra_core::text::LineMetrics;
use umbra_core::{ShadowNode, Size, StateData};
use umbra_text::Overflow;

/// Content-box constraints for one intrinsic measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureConstraints {
    /// `None` measures at max-content width.
    pub max_width: Option<f32>,
    pub max_height: Option<f32>,
    pub font_scale: f32,
}

#[derive(Clone, Debug, Default)]
pub struct Measurement {
    pub size: Size,
    /// State to store on the node once this measurement is final.
    pub state: Option<StateData>,
    /// Line metrics for an `onTextLayout` event, when the node asked for one.
    pub line_metrics: Option<Vec<LineMetrics>>,
    pub overflow: Option<Overflow>,
}

impl Measurement {
    pub fn sized(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }
}

/// Intrinsic sizing for `MEASURABLE` nodes of one component.
///
/// The engine may call `measure` several times per pass with different
/// constraints and keeps the result for the node's final content size. It
/// must be deterministic.
pub trait ContentMeasurer: Send + Sync {
    fn measure(&self, node: &ShadowNode, constraints: &MeasureConstraints) -> Measurement;
}

impl<F> ContentMeasurer for F
where
    F: Fn(&ShadowNode, &MeasureConstraints) -> Measurement + Send + Sync,
{
    fn measure(&self, node: &ShadowNode, constraints: &MeasureConstraints) -> Measurement {
        self(node, constraints)
    }
}
