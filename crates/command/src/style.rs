//! Style vocabulary: the fixed set of style properties, their values,
//! full snapshots and authored partial styles.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{AsRefStr, EnumCount as EnumCountMacro, EnumIter, EnumString};

use crate::Value;

/// Prefix marking a style value as a symbolic reference, e.g. `"@stroke"`.
pub const STYLE_SIGIL: char = '@';

/// The recognized style properties.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    AsRefStr,
    EnumCountMacro,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StyleKey {
    Fill,
    Stroke,
    LineWidth,
    LineCap,
    LineJoin,
    Dash,
    DashOffset,
    MiterLimit,
    Shadow,
    Font,
    HorizontalAnchor,
    VerticalAnchor,
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl StyleKey {
    pub fn default_value(self) -> StyleValue {
        match self {
            StyleKey::Fill => StyleValue::text("transparent"),
            StyleKey::Stroke => StyleValue::text("black"),
            StyleKey::LineWidth => StyleValue::Number(1.0),
            StyleKey::LineCap => StyleValue::text("butt"),
            StyleKey::LineJoin => StyleValue::text("miter"),
            StyleKey::Dash => StyleValue::List(Vec::new()),
            StyleKey::DashOffset => StyleValue::Number(0.0),
            StyleKey::MiterLimit => StyleValue::Number(10.0),
            StyleKey::Shadow => StyleValue::Shadow(Shadow::default()),
            StyleKey::Font => StyleValue::text("normal 14px sans-serif"),
            StyleKey::HorizontalAnchor => StyleValue::text("left"),
            StyleKey::VerticalAnchor => StyleValue::text("bottom"),
        }
    }
}

/// Drop shadow parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: String,
    #[serde(default)]
    pub blur: f64,
    #[serde(default)]
    pub dx: f64,
    #[serde(default)]
    pub dy: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: "transparent".to_string(),
            blur: 0.0,
            dx: 0.0,
            dy: 0.0,
        }
    }
}

/// A single style property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
    List(Vec<f64>),
    Shadow(Shadow),
}

impl StyleValue {
    pub fn text(s: impl Into<String>) -> Self {
        StyleValue::Text(s.into())
    }

    /// The referenced name if this is a symbolic reference.
    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            StyleValue::Text(s) => s.strip_prefix(STYLE_SIGIL),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Paint values that draw nothing.
    pub fn is_invisible(&self) -> bool {
        matches!(self.as_str(), Some("transparent" | "none" | ""))
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Text(s.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        StyleValue::Text(s)
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        StyleValue::Number(n)
    }
}

impl From<Vec<f64>> for StyleValue {
    fn from(list: Vec<f64>) -> Self {
        StyleValue::List(list)
    }
}

impl From<Shadow> for StyleValue {
    fn from(shadow: Shadow) -> Self {
        StyleValue::Shadow(shadow)
    }
}

/// A complete style: every property has a resolved value.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    values: [StyleValue; StyleKey::COUNT],
}

impl Default for Style {
    fn default() -> Self {
        let mut keys = StyleKey::iter();
        Self {
            values: std::array::from_fn(|_| {
                keys.next()
                    .map(StyleKey::default_value)
                    .unwrap_or(StyleValue::Number(0.0))
            }),
        }
    }
}

impl Style {
    pub fn get(&self, key: StyleKey) -> &StyleValue {
        &self.values[key as usize]
    }

    pub fn set(&mut self, key: StyleKey, value: StyleValue) {
        self.values[key as usize] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleKey, &StyleValue)> {
        StyleKey::iter().map(move |key| (key, self.get(key)))
    }

    /// Keys whose value differs in `other`, paired with `other`'s value.
    pub fn diff(&self, other: &Style) -> Vec<(StyleKey, StyleValue)> {
        StyleKey::iter()
            .filter(|key| self.get(*key) != other.get(*key))
            .map(|key| (key, other.get(key).clone()))
            .collect()
    }

    /// Whether the fill paints anything.
    pub fn is_filled(&self) -> bool {
        !self.get(StyleKey::Fill).is_invisible()
    }
}

impl Serialize for Style {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(StyleKey::COUNT))?;
        for (key, value) in self.iter() {
            map.serialize_entry(&key, value)?;
        }
        map.end()
    }
}

/// An authored, partial style. Values may be deferred or symbolic; they
/// are resolved only when the style is applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleArgs(BTreeMap<StyleKey, Value<StyleValue>>);

impl StyleArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: StyleKey) -> Option<&Value<StyleValue>> {
        self.0.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleKey, &Value<StyleValue>)> {
        self.0.iter().map(|(key, value)| (*key, value))
    }

    pub fn insert(&mut self, key: StyleKey, value: Value<StyleValue>) {
        self.0.insert(key, value);
    }

    pub fn set(mut self, key: StyleKey, value: impl Into<StyleValue>) -> Self {
        self.0.insert(key, Value::Literal(value.into()));
        self
    }

    pub fn set_deferred(mut self, key: StyleKey, thunk: impl Fn() -> StyleValue + 'static) -> Self {
        self.0.insert(key, Value::deferred(thunk));
        self
    }

    pub fn fill(self, value: impl Into<StyleValue>) -> Self {
        self.set(StyleKey::Fill, value)
    }

    pub fn stroke(self, value: impl Into<StyleValue>) -> Self {
        self.set(StyleKey::Stroke, value)
    }

    pub fn line_width(self, width: f64) -> Self {
        self.set(StyleKey::LineWidth, width)
    }

    pub fn dash(self, pattern: Vec<f64>) -> Self {
        self.set(StyleKey::Dash, pattern)
    }

    pub fn font(self, font: impl Into<String>) -> Self {
        self.set(StyleKey::Font, font.into())
    }

    /// `self` overridden by `other`.
    pub fn merged(&self, other: &StyleArgs) -> StyleArgs {
        let mut merged = self.clone();
        for (key, value) in other.iter() {
            merged.insert(key, value.clone());
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(StyleKey::LineWidth.as_ref(), "line-width");
        assert_eq!("horizontal-anchor".parse::<StyleKey>().unwrap(), StyleKey::HorizontalAnchor);
        assert!("Fill".parse::<StyleKey>().is_err());
        assert_eq!(StyleKey::COUNT, 12);
    }

    #[test]
    fn test_default_style_is_complete() {
        let style = Style::default();
        assert_eq!(style.iter().count(), 12);
        assert_eq!(style.get(StyleKey::LineWidth), &StyleValue::Number(1.0));
        assert!(!style.is_filled());
    }

    #[test]
    fn test_symbol_name() {
        assert_eq!(StyleValue::text("@stroke").symbol_name(), Some("stroke"));
        assert_eq!(StyleValue::text("red").symbol_name(), None);
        assert_eq!(StyleValue::Number(1.0).symbol_name(), None);
    }

    #[test]
    fn test_style_args_json() {
        let args = StyleArgs::new().fill("red").line_width(2.0).dash(vec![4.0, 2.0]);
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["fill"], "red");
        assert_eq!(json["line-width"], 2.0);
        let back: StyleArgs = serde_json::from_value(json).unwrap();
        assert_eq!(back, args);
    }

    #[test]
    fn test_diff_reports_other_values() {
        let base = Style::default();
        let mut other = base.clone();
        other.set(StyleKey::Stroke, "red".into());
        assert_eq!(base.diff(&other), vec![(StyleKey::Stroke, StyleValue::text("red"))]);
        assert!(base.diff(&base).is_empty());
    }
}
