//! `LayoutStyle` to `taffy::Style`.

use taffy::prelude::{auto, length, percent};
use taffy::{
    AlignItems, Display as TDisplay, FlexDirection as TFlexDirection, FlexWrap as TFlexWrap,
    JustifyContent, Position, Style,
};
use umbra_core::props::{Align, Dimension, Display, FlexDirection, FlexWrap, Justify, PositionType};
use umbra_core::{EdgeInsets, LayoutStyle};

fn dimension(d: Dimension) -> taffy::Dimension {
    match d {
        Dimension::Auto => auto(),
        Dimension::Points(v) => length(v),
        Dimension::Percent(p) => percent(p),
    }
}

fn inset(v: Option<f32>) -> taffy::LengthPercentageAuto {
    v.map(length).unwrap_or_else(auto)
}

fn edges(e: &EdgeInsets) -> taffy::Rect<taffy::LengthPercentage> {
    taffy::Rect {
        left: length(e.left),
        right: length(e.right),
        top: length(e.top),
        bottom: length(e.bottom),
    }
}

fn align(a: Align) -> AlignItems {
    match a {
        Align::FlexStart => AlignItems::FlexStart,
        Align::Center => AlignItems::Center,
        Align::FlexEnd => AlignItems::FlexEnd,
        Align::Stretch => AlignItems::Stretch,
        Align::Baseline => AlignItems::Baseline,
    }
}

fn justify(j: Justify) -> JustifyContent {
    match j {
        Justify::FlexStart => JustifyContent::FlexStart,
        Justify::Center => JustifyContent::Center,
        Justify::FlexEnd => JustifyContent::FlexEnd,
        Justify::SpaceBetween => JustifyContent::SpaceBetween,
        Justify::SpaceAround => JustifyContent::SpaceAround,
        Justify::SpaceEvenly => JustifyContent::SpaceEvenly,
    }
}

/// Flexbox style for one node. `hidden` forces `display: none`.
pub(crate) fn taffy_style(s: &LayoutStyle, hidden: bool) -> Style {
    let mut t = Style::default();

    t.display = if hidden || s.display == Display::None {
        TDisplay::None
    } else {
        TDisplay::Flex
    };
    t.position = match s.position {
        PositionType::Relative => Position::Relative,
        PositionType::Absolute => Position::Absolute,
    };
    t.flex_direction = match s.flex_direction {
        FlexDirection::Column => TFlexDirection::Column,
        FlexDirection::ColumnReverse => TFlexDirection::ColumnReverse,
        FlexDirection::Row => TFlexDirection::Row,
        FlexDirection::RowReverse => TFlexDirection::RowReverse,
    };
    t.flex_wrap = match s.flex_wrap {
        FlexWrap::NoWrap => TFlexWrap::NoWrap,
        FlexWrap::Wrap => TFlexWrap::Wrap,
    };
    t.flex_grow = s.flex_grow;
    t.flex_shrink = s.flex_shrink;
    t.flex_basis = dimension(s.flex_basis);

    t.align_items = s.align_items.map(align);
    t.align_self = s.align_self.map(align);
    t.justify_content = s.justify_content.map(justify);

    t.size = taffy::Size {
        width: dimension(s.width),
        height: dimension(s.height),
    };
    t.min_size = taffy::Size {
        width: dimension(s.min_width),
        height: dimension(s.min_height),
    };
    t.max_size = taffy::Size {
        width: dimension(s.max_width),
        height: dimension(s.max_height),
    };
    t.aspect_ratio = s.aspect_ratio.map(|r| r.max(0.0));

    t.padding = edges(&s.padding);
    t.margin = taffy::Rect {
        left: length(s.margin.left),
        right: length(s.margin.right),
        top: length(s.margin.top),
        bottom: length(s.margin.bottom),
    };
    t.inset = taffy::Rect {
        left: inset(s.left),
        right: inset(s.right),
        top: inset(s.top),
        bottom: inset(s.bottom),
    };
    t.gap = taffy::Size {
        width: length(s.gap),
        height: length(s.gap),
    };
    t
}

/// Style for nodes without flexbox props (inline text outside a paragraph).
pub(crate) fn inline_style(hidden: bool) -> Style {
    let mut t = Style::default();
    t.display = if hidden { TDisplay::None } else { TDisplay::Flex };
    t
}
