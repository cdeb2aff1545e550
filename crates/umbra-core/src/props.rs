//! Typed props for the built-in component families, plus the dynamic
//! [`RawProps`] bag that application descriptions send.
//!
//! Raw props are patches: a key that is absent keeps the previous value, a
//! `Null` value resets it to the default, and a value of the wrong type is
//! logged and ignored.

use std::collections::BTreeMap;

use crate::text::{ParagraphProps, RawTextProps, TextProps};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<RawValue>),
    Object(BTreeMap<String, RawValue>),
}

impl RawValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            RawValue::Number(n) => Some(*n as f32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Number(v as f64)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::String(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::String(v)
    }
}

/// String-keyed props patch as issued by the application description.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RawProps {
    values: BTreeMap<String, RawValue>,
}

impl RawProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.values.iter()
    }

    /// Applies `key` to `slot`: absent keeps, `Null` resets to `default`,
    /// otherwise `parse` decides; unparseable values are logged and skipped.
    pub fn patch<T>(
        &self,
        key: &str,
        slot: &mut T,
        default: T,
        parse: impl Fn(&RawValue) -> Option<T>,
    ) {
        match self.values.get(key) {
            None => {}
            Some(RawValue::Null) => *slot = default,
            Some(v) => match parse(v) {
                Some(parsed) => *slot = parsed,
                None => log::warn!("ignoring prop `{key}`: unexpected value {v:?}"),
            },
        }
    }

    pub fn patch_f32(&self, key: &str, slot: &mut f32, default: f32) {
        self.patch(key, slot, default, RawValue::as_f32);
    }

    pub fn patch_opt_f32(&self, key: &str, slot: &mut Option<f32>) {
        self.patch(key, slot, None, |v| v.as_f32().map(Some));
    }

    pub fn patch_bool(&self, key: &str, slot: &mut bool, default: bool) {
        self.patch(key, slot, default, RawValue::as_bool);
    }

    pub fn patch_opt_bool(&self, key: &str, slot: &mut Option<bool>) {
        self.patch(key, slot, None, |v| v.as_bool().map(Some));
    }

    pub fn patch_opt_string(&self, key: &str, slot: &mut Option<String>) {
        self.patch(key, slot, None, |v| v.as_str().map(|s| Some(s.to_string())));
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawProps {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dimension {
    #[default]
    Auto,
    Points(f32),
    /// Fraction of the parent, `0.5` for `"50%"`.
    Percent(f32),
}

impl Dimension {
    fn parse(v: &RawValue) -> Option<Dimension> {
        match v {
            RawValue::Number(n) => Some(Dimension::Points(*n as f32)),
            RawValue::String(s) if s == "auto" => Some(Dimension::Auto),
            RawValue::String(s) => s
                .strip_suffix('%')
                .and_then(|p| p.trim().parse::<f32>().ok())
                .map(|p| Dimension::Percent(p / 100.0)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Display {
    #[default]
    Flex,
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PositionType {
    #[default]
    Relative,
    Absolute,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlexDirection {
    #[default]
    Column,
    ColumnReverse,
    Row,
    RowReverse,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlexWrap {
    #[default]
    NoWrap,
    Wrap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    FlexStart,
    Center,
    FlexEnd,
    Stretch,
    Baseline,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Justify {
    FlexStart,
    Center,
    FlexEnd,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

fn parse_keyword<T: Copy>(v: &RawValue, table: &[(&str, T)]) -> Option<T> {
    let s = v.as_str()?;
    table.iter().find(|(k, _)| *k == s).map(|(_, t)| *t)
}

const ALIGN_KEYWORDS: &[(&str, Align)] = &[
    ("flex-start", Align::FlexStart),
    ("center", Align::Center),
    ("flex-end", Align::FlexEnd),
    ("stretch", Align::Stretch),
    ("baseline", Align::Baseline),
];

const JUSTIFY_KEYWORDS: &[(&str, Justify)] = &[
    ("flex-start", Justify::FlexStart),
    ("center", Justify::Center),
    ("flex-end", Justify::FlexEnd),
    ("space-between", Justify::SpaceBetween),
    ("space-around", Justify::SpaceAround),
    ("space-evenly", Justify::SpaceEvenly),
];

/// Flexbox inputs shared by every component that takes part in layout.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutStyle {
    pub display: Display,
    pub position: PositionType,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Dimension,
    pub align_items: Option<Align>,
    pub align_self: Option<Align>,
    pub justify_content: Option<Justify>,
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub min_height: Dimension,
    pub max_width: Dimension,
    pub max_height: Dimension,
    pub aspect_ratio: Option<f32>,
    pub padding: crate::EdgeInsets,
    pub margin: crate::EdgeInsets,
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub gap: f32,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        Self {
            display: Display::Flex,
            position: PositionType::Relative,
            flex_direction: FlexDirection::Column,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 0.0,
            flex_basis: Dimension::Auto,
            align_items: None,
            align_self: None,
            justify_content: None,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            min_height: Dimension::Auto,
            max_width: Dimension::Auto,
            max_height: Dimension::Auto,
            aspect_ratio: None,
            padding: crate::EdgeInsets::ZERO,
            margin: crate::EdgeInsets::ZERO,
            left: None,
            top: None,
            right: None,
            bottom: None,
            gap: 0.0,
        }
    }
}

impl LayoutStyle {
    pub fn apply_raw(&mut self, raw: &RawProps) {
        raw.patch("display", &mut self.display, Display::Flex, |v| {
            parse_keyword(v, &[("flex", Display::Flex), ("none", Display::None)])
        });
        raw.patch("position", &mut self.position, PositionType::Relative, |v| {
            parse_keyword(
                v,
                &[
                    ("relative", PositionType::Relative),
                    ("absolute", PositionType::Absolute),
                ],
            )
        });
        raw.patch(
            "flexDirection",
            &mut self.flex_direction,
            FlexDirection::Column,
            |v| {
                parse_keyword(
                    v,
                    &[
                        ("column", FlexDirection::Column),
                        ("column-reverse", FlexDirection::ColumnReverse),
                        ("row", FlexDirection::Row),
                        ("row-reverse", FlexDirection::RowReverse),
                    ],
                )
            },
        );
        raw.patch("flexWrap", &mut self.flex_wrap, FlexWrap::NoWrap, |v| {
            parse_keyword(v, &[("nowrap", FlexWrap::NoWrap), ("wrap", FlexWrap::Wrap)])
        });
        raw.patch_f32("flexGrow", &mut self.flex_grow, 0.0);
        raw.patch_f32("flexShrink", &mut self.flex_shrink, 0.0);
        raw.patch("flexBasis", &mut self.flex_basis, Dimension::Auto, Dimension::parse);
        if let Some(RawValue::Number(flex)) = raw.get("flex") {
            // `flex: n` is shorthand for grow n, shrink 1, basis 0.
            if *flex > 0.0 {
                self.flex_grow = *flex as f32;
                self.flex_shrink = 1.0;
                self.flex_basis = Dimension::Points(0.0);
            }
        }
        raw.patch("alignItems", &mut self.align_items, None, |v| {
            parse_keyword(v, ALIGN_KEYWORDS).map(Some)
        });
        raw.patch("alignSelf", &mut self.align_self, None, |v| {
            parse_keyword(v, ALIGN_KEYWORDS).map(Some)
        });
        raw.patch("justifyContent", &mut self.justify_content, None, |v| {
            parse_keyword(v, JUSTIFY_KEYWORDS).map(Some)
        });
        raw.patch("width", &mut self.width, Dimension::Auto, Dimension::parse);
        raw.patch("height", &mut self.height, Dimension::Auto, Dimension::parse);
        raw.patch("minWidth", &mut self.min_width, Dimension::Auto, Dimension::parse);
        raw.patch("minHeight", &mut self.min_height, Dimension::Auto, Dimension::parse);
        raw.patch("maxWidth", &mut self.max_width, Dimension::Auto, Dimension::parse);
        raw.patch("maxHeight", &mut self.max_height, Dimension::Auto, Dimension::parse);
        raw.patch_opt_f32("aspectRatio", &mut self.aspect_ratio);
        patch_edges(raw, "padding", &mut self.padding);
        patch_edges(raw, "margin", &mut self.margin);
        raw.patch_opt_f32("left", &mut self.left);
        raw.patch_opt_f32("top", &mut self.top);
        raw.patch_opt_f32("right", &mut self.right);
        raw.patch_opt_f32("bottom", &mut self.bottom);
        raw.patch_f32("gap", &mut self.gap, 0.0);
    }
}

// `padding`, then `paddingHorizontal`/`paddingVertical`, then per-edge keys;
// more specific keys win.
fn patch_edges(raw: &RawProps, prefix: &str, edges: &mut crate::EdgeInsets) {
    let mut all = None;
    raw.patch_opt_f32(prefix, &mut all);
    if let Some(v) = all {
        *edges = crate::EdgeInsets::all(v);
    }
    let mut horizontal = None;
    raw.patch_opt_f32(&format!("{prefix}Horizontal"), &mut horizontal);
    if let Some(v) = horizontal {
        edges.left = v;
        edges.right = v;
    }
    let mut vertical = None;
    raw.patch_opt_f32(&format!("{prefix}Vertical"), &mut vertical);
    if let Some(v) = vertical {
        edges.top = v;
        edges.bottom = v;
    }
    raw.patch_f32(&format!("{prefix}Left"), &mut edges.left, 0.0);
    raw.patch_f32(&format!("{prefix}Top"), &mut edges.top, 0.0);
    raw.patch_f32(&format!("{prefix}Right"), &mut edges.right, 0.0);
    raw.patch_f32(&format!("{prefix}Bottom"), &mut edges.bottom, 0.0);
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewProps {
    pub style: LayoutStyle,
    pub opacity: f32,
    pub native_id: Option<String>,
    /// Emit `onLayout` whenever the committed frame changes.
    pub on_layout: bool,
}

impl Default for ViewProps {
    fn default() -> Self {
        Self {
            style: LayoutStyle::default(),
            opacity: 1.0,
            native_id: None,
            on_layout: false,
        }
    }
}

impl ViewProps {
    pub fn apply_raw(&mut self, raw: &RawProps) {
        self.style.apply_raw(raw);
        raw.patch_f32("opacity", &mut self.opacity, 1.0);
        raw.patch_opt_string("nativeID", &mut self.native_id);
        raw.patch_bool("onLayout", &mut self.on_layout, false);
    }
}

/// Props of components registered through the extension point: layout style
/// is typed, everything else is kept as raw values.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomProps {
    pub style: LayoutStyle,
    pub on_layout: bool,
    pub values: BTreeMap<String, RawValue>,
}

impl CustomProps {
    pub fn apply_raw(&mut self, raw: &RawProps) {
        self.style.apply_raw(raw);
        raw.patch_bool("onLayout", &mut self.on_layout, false);
        for (k, v) in raw.iter() {
            match v {
                RawValue::Null => {
                    self.values.remove(k);
                }
                _ => {
                    self.values.insert(k.clone(), v.clone());
                }
            }
        }
    }
}

/// Closed set of prop families; generic tree code only uses the accessors.
#[derive(Clone, Debug, PartialEq)]
pub enum Props {
    RootView(ViewProps),
    View(ViewProps),
    Paragraph(ParagraphProps),
    Text(TextProps),
    RawText(RawTextProps),
    Custom(CustomProps),
}

impl Props {
    /// Flexbox inputs, `None` for inline text content.
    pub fn layout_style(&self) -> Option<&LayoutStyle> {
        match self {
            Props::RootView(p) | Props::View(p) => Some(&p.style),
            Props::Paragraph(p) => Some(&p.style),
            Props::Custom(p) => Some(&p.style),
            Props::Text(_) | Props::RawText(_) => None,
        }
    }

    pub fn emits_layout_events(&self) -> bool {
        match self {
            Props::RootView(p) | Props::View(p) => p.on_layout,
            Props::Paragraph(p) => p.on_layout,
            Props::Custom(p) => p.on_layout,
            Props::Text(_) | Props::RawText(_) => false,
        }
    }

    pub fn as_paragraph(&self) -> Option<&ParagraphProps> {
        match self {
            Props::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextProps> {
        match self {
            Props::Text(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_raw_text(&self) -> Option<&RawTextProps> {
        match self {
            Props::RawText(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_keeps_resets_and_ignores() {
        let mut style = LayoutStyle::default();
        style.apply_raw(&RawProps::new().set("width", 120).set("flexGrow", 2));
        assert_eq!(style.width, Dimension::Points(120.0));
        assert_eq!(style.flex_grow, 2.0);

        // absent key keeps, null resets, wrong type is ignored
        style.apply_raw(
            &RawProps::new()
                .set("width", RawValue::Null)
                .set("flexGrow", "lots"),
        );
        assert_eq!(style.width, Dimension::Auto);
        assert_eq!(style.flex_grow, 2.0);
    }

    #[test]
    fn test_percent_and_keywords() {
        let mut style = LayoutStyle::default();
        style.apply_raw(
            &RawProps::new()
                .set("height", "50%")
                .set("flexDirection", "row")
                .set("justifyContent", "space-between"),
        );
        assert_eq!(style.height, Dimension::Percent(0.5));
        assert_eq!(style.flex_direction, FlexDirection::Row);
        assert_eq!(style.justify_content, Some(Justify::SpaceBetween));
    }

    #[test]
    fn test_edges_specific_keys_win() {
        let mut style = LayoutStyle::default();
        style.apply_raw(
            &RawProps::new()
                .set("padding", 4)
                .set("paddingHorizontal", 8)
                .set("paddingTop", 1),
        );
        assert_eq!(style.padding.left, 8.0);
        assert_eq!(style.padding.right, 8.0);
        assert_eq!(style.padding.top, 1.0);
        assert_eq!(style.padding.bottom, 4.0);
    }

    #[test]
    fn test_custom_props_keep_unknown_values() {
        let mut p = CustomProps::default();
        p.apply_raw(&RawProps::new().set("tintColor", "#ff0000").set("width", 10));
        assert_eq!(p.values.get("tintColor"), Some(&RawValue::from("#ff0000")));
        p.apply_raw(&RawProps::new().set("tintColor", RawValue::Null));
        assert!(!p.values.contains_key("tintColor"));
        assert_eq!(p.style.width, Dimension::Points(10.0));
    }
}
