//! Argument records, one per command kind.
//!
//! Scalars are [`Value`]s so any of them may be bound to live state.
//! Every drawing kind carries an optional partial [`StyleArgs`] applied
//! around that element only.

use std::rc::Rc;

use geometry::{Matrix, Points};
use serde::{Deserialize, Serialize};

use crate::{CommandQueue, StyleArgs, Value};

fn one() -> Value<f64> {
    Value::Literal(1.0)
}

fn is_one(value: &Value<f64>) -> bool {
    value.get() == 1.0
}

fn is_zero(value: &Value<f64>) -> bool {
    value.get() == 0.0
}

fn is_false(value: &bool) -> bool {
    !*value
}

macro_rules! with_style {
    ($($args:ty),* $(,)?) => {
        $(
            impl $args {
                pub fn with_style(mut self, style: StyleArgs) -> Self {
                    self.style = style;
                    self
                }
            }
        )*
    };
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CircleArgs {
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
    #[serde(default)]
    pub r: Value<f64>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl CircleArgs {
    pub fn new(x: f64, y: f64, r: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            r: r.into(),
            style: StyleArgs::new(),
        }
    }
}

/// Ellipse with semi-axes `rx`, `ry`, rotated by `w`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EllipseArgs {
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
    #[serde(default)]
    pub rx: Value<f64>,
    #[serde(default)]
    pub ry: Value<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub w: Value<f64>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl EllipseArgs {
    pub fn new(x: f64, y: f64, rx: f64, ry: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            rx: rx.into(),
            ry: ry.into(),
            ..Default::default()
        }
    }
}

/// Circular arc in center form: starts at angle `w`, sweeps `dw`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArcArgs {
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
    #[serde(default)]
    pub r: Value<f64>,
    #[serde(default)]
    pub w: Value<f64>,
    #[serde(default)]
    pub dw: Value<f64>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl ArcArgs {
    pub fn new(x: f64, y: f64, r: f64, w: f64, dw: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            r: r.into(),
            w: w.into(),
            dw: dw.into(),
            style: StyleArgs::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RectArgs {
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
    #[serde(default)]
    pub width: Value<f64>,
    #[serde(default)]
    pub height: Value<f64>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl RectArgs {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
            style: StyleArgs::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineArgs {
    #[serde(default)]
    pub x1: Value<f64>,
    #[serde(default)]
    pub y1: Value<f64>,
    #[serde(default)]
    pub x2: Value<f64>,
    #[serde(default)]
    pub y2: Value<f64>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl LineArgs {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.into(),
            y1: y1.into(),
            x2: x2.into(),
            y2: y2.into(),
            style: StyleArgs::new(),
        }
    }
}

/// Straight segments through `pts`; `closed` makes it a polygon.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolylineArgs {
    pub pts: Points,
    #[serde(default, skip_serializing_if = "is_false")]
    pub closed: bool,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl PolylineArgs {
    pub fn new(pts: impl Into<Points>) -> Self {
        Self {
            pts: pts.into(),
            ..Default::default()
        }
    }

    pub fn polygon(pts: impl Into<Points>) -> Self {
        Self {
            pts: pts.into(),
            closed: true,
            ..Default::default()
        }
    }
}

/// Centripetal Catmull-Rom curve through `pts`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SplineArgs {
    pub pts: Points,
    #[serde(default, skip_serializing_if = "is_false")]
    pub closed: bool,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl SplineArgs {
    pub fn new(pts: impl Into<Points>) -> Self {
        Self {
            pts: pts.into(),
            ..Default::default()
        }
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }
}

/// Text anchored at `(x, y)`, rotated by `w`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextArgs {
    pub text: Value<String>,
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub w: Value<f64>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl TextArgs {
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: Value::Literal(text.into()),
            x: x.into(),
            y: y.into(),
            ..Default::default()
        }
    }
}

/// An image loaded from `uri`. Missing sizes use the image's own.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageArgs {
    pub uri: String,
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub w: Value<f64>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl ImageArgs {
    pub fn new(uri: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            uri: uri.into(),
            x: x.into(),
            y: y.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Target of `moveto` and `lineto`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointArgs {
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
}

impl PointArgs {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

/// Cubic Bezier from the pen through two control points to `(x, y)`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveArgs {
    pub x1: Value<f64>,
    pub y1: Value<f64>,
    pub x2: Value<f64>,
    pub y2: Value<f64>,
    pub x: Value<f64>,
    pub y: Value<f64>,
}

impl CurveArgs {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) -> Self {
        Self {
            x1: x1.into(),
            y1: y1.into(),
            x2: x2.into(),
            y2: y2.into(),
            x: x.into(),
            y: y.into(),
        }
    }
}

/// Arc from the pen to `(x, y)` sweeping `dw`. `k` is the axis ratio
/// `ry / rx` and `phi` the ellipse rotation; the defaults draw a circle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArcToArgs {
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
    #[serde(default)]
    pub dw: Value<f64>,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub k: Value<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub phi: Value<f64>,
}

impl Default for ArcToArgs {
    fn default() -> Self {
        Self {
            x: Value::default(),
            y: Value::default(),
            dw: Value::default(),
            k: one(),
            phi: Value::default(),
        }
    }
}

impl ArcToArgs {
    pub fn new(x: f64, y: f64, dw: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            dw: dw.into(),
            ..Default::default()
        }
    }

    pub fn elliptical(mut self, k: f64, phi: f64) -> Self {
        self.k = k.into();
        self.phi = phi.into();
        self
    }
}

/// Arguments of `stroke` and `fill`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaintArgs {
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

/// Opens a group: a local transform and a style level.
///
/// The local transform is `matrix` when given, otherwise translation
/// `(x, y)`, rotation `w` and uniform scale `scl`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupArgs {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub x: Value<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub y: Value<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub w: Value<f64>,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scl: Value<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Matrix>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl Default for GroupArgs {
    fn default() -> Self {
        Self {
            x: Value::default(),
            y: Value::default(),
            w: Value::default(),
            scl: one(),
            matrix: None,
            style: StyleArgs::new(),
        }
    }
}

impl GroupArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            ..Default::default()
        }
    }

    pub fn rotate(w: f64) -> Self {
        Self {
            w: w.into(),
            ..Default::default()
        }
    }

    pub fn scale(scl: f64) -> Self {
        Self {
            scl: scl.into(),
            ..Default::default()
        }
    }

    pub fn matrix(matrix: Matrix) -> Self {
        Self {
            matrix: Some(matrix),
            ..Default::default()
        }
    }

    /// A group that only opens a style level.
    pub fn styled(style: StyleArgs) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    pub fn local_matrix(&self) -> Matrix {
        match self.matrix {
            Some(matrix) => matrix,
            None => Matrix::from_trs(self.x.get(), self.y.get(), self.w.get(), self.scl.get()),
        }
    }
}

/// Viewport setup. With `cartesian` the y axis points up and the
/// origin sits at the bottom of the surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewArgs {
    #[serde(default)]
    pub x: Value<f64>,
    #[serde(default)]
    pub y: Value<f64>,
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub scl: Value<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub cartesian: bool,
}

impl Default for ViewArgs {
    fn default() -> Self {
        Self {
            x: Value::default(),
            y: Value::default(),
            scl: one(),
            cartesian: false,
        }
    }
}

impl ViewArgs {
    pub fn new(x: f64, y: f64, scl: f64) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            scl: scl.into(),
            cartesian: false,
        }
    }

    pub fn cartesian(mut self) -> Self {
        self.cartesian = true;
        self
    }

    /// The view matrix for a surface of the given height.
    pub fn matrix(&self, height: f64) -> Matrix {
        let scl = self.scl.get();
        if self.cartesian {
            Matrix::new(scl, 0.0, 0.0, -scl, self.x.get(), height - self.y.get())
        } else {
            Matrix::new(scl, 0.0, 0.0, scl, self.x.get(), self.y.get())
        }
    }
}

/// Reference to another queue. `name` is the symbol it was resolved
/// from, if any; the resolved queue itself is never serialized.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UseArgs {
    #[serde(rename = "grp", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip)]
    pub queue: Rc<CommandQueue>,
    #[serde(default, skip_serializing_if = "StyleArgs::is_empty")]
    pub style: StyleArgs,
}

impl UseArgs {
    pub fn new(queue: Rc<CommandQueue>) -> Self {
        Self {
            name: None,
            queue,
            style: StyleArgs::new(),
        }
    }

    pub fn named(name: impl Into<String>, queue: Rc<CommandQueue>) -> Self {
        Self {
            name: Some(name.into()),
            queue,
            style: StyleArgs::new(),
        }
    }
}

with_style!(
    CircleArgs,
    EllipseArgs,
    ArcArgs,
    RectArgs,
    LineArgs,
    PolylineArgs,
    SplineArgs,
    TextArgs,
    ImageArgs,
    PaintArgs,
    GroupArgs,
    UseArgs,
);

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::DVec2;

    #[test]
    fn test_group_local_matrix() {
        let group = GroupArgs::translate(10.0, 5.0);
        assert_eq!(group.local_matrix().apply(DVec2::ZERO), DVec2::new(10.0, 5.0));

        let raw = Matrix::scale(2.0, 3.0);
        assert_eq!(GroupArgs::matrix(raw).local_matrix(), raw);
    }

    #[test]
    fn test_group_defaults_from_json() {
        let group: GroupArgs = serde_json::from_str(r#"{"x": 4}"#).unwrap();
        assert_eq!(group.scl.get(), 1.0);
        assert_eq!(serde_json::to_string(&group).unwrap(), r#"{"x":4.0}"#);
    }

    #[test]
    fn test_cartesian_view_flips_y() {
        let view = ViewArgs::new(0.0, 0.0, 1.0).cartesian();
        let m = view.matrix(100.0);
        assert_eq!(m.apply(DVec2::new(0.0, 10.0)), DVec2::new(0.0, 90.0));
    }

    #[test]
    fn test_use_skips_queue_when_serialized() {
        let args = UseArgs::named("wheel", Rc::new(CommandQueue::new()));
        assert_eq!(serde_json::to_string(&args).unwrap(), r#"{"grp":"wheel"}"#);
    }
}
