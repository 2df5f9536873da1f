//! The closed set of command kinds.

use std::fmt;

use geometry::DVec2;

use crate::{
    ArcArgs, ArcToArgs, Capabilities, CircleArgs, CommandQueue, CurveArgs, Element, EllipseArgs,
    GroupArgs, ImageArgs, LineArgs, PaintArgs, PointArgs, PolylineArgs, RectArgs, SplineArgs,
    StyleArgs, TextArgs, UseArgs, ViewArgs,
};

/// A drawable kind defined outside this crate.
///
/// Custom kinds travel through queues like built-ins. Backends that do
/// not know the kind see it through [`Element`]: a custom element that
/// expands into built-in commands renders everywhere.
pub trait CustomElement: Element {
    fn kind(&self) -> &str;
    /// Arguments as they appear in the interchange format.
    fn args(&self) -> serde_json::Value;
    fn clone_box(&self) -> Box<dyn CustomElement>;
    fn as_element(&self) -> &dyn Element;
    fn as_element_mut(&mut self) -> &mut dyn Element;
}

pub struct Custom(Box<dyn CustomElement>);

impl Custom {
    pub fn new(element: impl CustomElement + 'static) -> Self {
        Self(Box::new(element))
    }

    pub fn from_box(element: Box<dyn CustomElement>) -> Self {
        Self(element)
    }

    pub fn kind(&self) -> &str {
        self.0.kind()
    }

    pub fn args(&self) -> serde_json::Value {
        self.0.args()
    }

    pub fn element(&self) -> &dyn Element {
        self.0.as_element()
    }

    pub fn element_mut(&mut self) -> &mut dyn Element {
        self.0.as_element_mut()
    }
}

impl Clone for Custom {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom")
            .field("kind", &self.kind())
            .field("args", &self.args())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub enum Command {
    Clear,
    View(ViewArgs),
    BeginGroup(GroupArgs),
    EndGroup,
    /// Changes the current style level without opening a new one.
    Style(StyleArgs),
    Circle(CircleArgs),
    Ellipse(EllipseArgs),
    Arc(ArcArgs),
    Rect(RectArgs),
    Line(LineArgs),
    Polyline(PolylineArgs),
    Spline(SplineArgs),
    Text(TextArgs),
    Image(ImageArgs),
    MoveTo(PointArgs),
    LineTo(PointArgs),
    CurveTo(CurveArgs),
    ArcTo(ArcToArgs),
    ClosePath,
    Stroke(PaintArgs),
    Fill(PaintArgs),
    Use(UseArgs),
    Custom(Custom),
}

impl Command {
    /// Kind name as used by handlers and the interchange format.
    pub fn kind(&self) -> &str {
        match self {
            Command::Clear => "clear",
            Command::View(_) => "view",
            Command::BeginGroup(_) => "begin",
            Command::EndGroup => "end",
            Command::Style(_) => "style",
            Command::Circle(_) => "circle",
            Command::Ellipse(_) => "ellipse",
            Command::Arc(_) => "arc",
            Command::Rect(_) => "rect",
            Command::Line(_) => "line",
            Command::Polyline(_) => "polyline",
            Command::Spline(_) => "spline",
            Command::Text(_) => "text",
            Command::Image(_) => "image",
            Command::MoveTo(_) => "moveto",
            Command::LineTo(_) => "lineto",
            Command::CurveTo(_) => "curveto",
            Command::ArcTo(_) => "arcto",
            Command::ClosePath => "closepath",
            Command::Stroke(_) => "stroke",
            Command::Fill(_) => "fill",
            Command::Use(_) => "use",
            Command::Custom(custom) => custom.kind(),
        }
    }

    pub fn element(&self) -> Option<&dyn Element> {
        match self {
            Command::Circle(args) => Some(args),
            Command::Ellipse(args) => Some(args),
            Command::Arc(args) => Some(args),
            Command::Rect(args) => Some(args),
            Command::Line(args) => Some(args),
            Command::Polyline(args) => Some(args),
            Command::Spline(args) => Some(args),
            Command::Text(args) => Some(args),
            Command::Image(args) => Some(args),
            Command::Custom(custom) => Some(custom.element()),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut dyn Element> {
        match self {
            Command::Circle(args) => Some(args),
            Command::Ellipse(args) => Some(args),
            Command::Arc(args) => Some(args),
            Command::Rect(args) => Some(args),
            Command::Line(args) => Some(args),
            Command::Polyline(args) => Some(args),
            Command::Spline(args) => Some(args),
            Command::Text(args) => Some(args),
            Command::Image(args) => Some(args),
            Command::Custom(custom) => Some(custom.element_mut()),
            _ => None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.element()
            .map(Element::capabilities)
            .unwrap_or_else(Capabilities::empty)
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities().contains(capability)
    }

    /// Rewrites the command into primitives, if it knows how.
    pub fn expand(&self) -> Option<CommandQueue> {
        if !self.has(Capabilities::EXPAND) {
            return None;
        }
        self.element().and_then(Element::expand)
    }

    /// Moves the element by `delta`. Returns false for kinds that
    /// cannot be dragged.
    pub fn drag(&mut self, delta: DVec2) -> bool {
        if !self.has(Capabilities::DRAG) {
            return false;
        }
        match self.element_mut() {
            Some(element) => {
                element.drag(delta);
                true
            }
            None => false,
        }
    }

    /// The per-element style, applied around this command only.
    pub fn element_style(&self) -> Option<&StyleArgs> {
        let style = match self {
            Command::Circle(args) => &args.style,
            Command::Ellipse(args) => &args.style,
            Command::Arc(args) => &args.style,
            Command::Rect(args) => &args.style,
            Command::Line(args) => &args.style,
            Command::Polyline(args) => &args.style,
            Command::Spline(args) => &args.style,
            Command::Text(args) => &args.style,
            Command::Image(args) => &args.style,
            Command::Stroke(args) => &args.style,
            Command::Fill(args) => &args.style,
            _ => return None,
        };
        (!style.is_empty()).then_some(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Marker {
        at: DVec2,
    }

    impl Element for Marker {
        fn capabilities(&self) -> Capabilities {
            Capabilities::EXPAND | Capabilities::DRAG
        }

        fn expand(&self) -> Option<CommandQueue> {
            let mut queue = CommandQueue::new();
            queue.circle(CircleArgs::new(self.at.x, self.at.y, 2.0));
            Some(queue)
        }

        fn drag(&mut self, delta: DVec2) {
            self.at += delta;
        }
    }

    impl CustomElement for Marker {
        fn kind(&self) -> &str {
            "marker"
        }

        fn args(&self) -> serde_json::Value {
            serde_json::json!({ "x": self.at.x, "y": self.at.y })
        }

        fn clone_box(&self) -> Box<dyn CustomElement> {
            Box::new(self.clone())
        }

        fn as_element(&self) -> &dyn Element {
            self
        }

        fn as_element_mut(&mut self) -> &mut dyn Element {
            self
        }
    }

    #[test]
    fn test_builtin_kinds() {
        assert_eq!(Command::Circle(CircleArgs::new(0.0, 0.0, 1.0)).kind(), "circle");
        assert_eq!(Command::EndGroup.kind(), "end");
        assert!(Command::EndGroup.capabilities().is_empty());
    }

    #[test]
    fn test_custom_expands_and_drags() {
        let mut command = Command::Custom(Custom::new(Marker { at: DVec2::ZERO }));
        assert_eq!(command.kind(), "marker");
        assert!(command.drag(DVec2::new(3.0, 4.0)));

        let expanded = command.expand().unwrap();
        match expanded.get(0) {
            Some(Command::Circle(circle)) => assert_eq!(circle.center(), DVec2::new(3.0, 4.0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_drag_refused_without_capability() {
        let mut command = Command::ClosePath;
        assert!(!command.drag(DVec2::ONE));
    }

    #[test]
    fn test_element_style_only_when_set() {
        let plain = Command::Circle(CircleArgs::new(0.0, 0.0, 1.0));
        assert!(plain.element_style().is_none());
        let styled = Command::Circle(
            CircleArgs::new(0.0, 0.0, 1.0).with_style(StyleArgs::new().fill("red")),
        );
        assert_eq!(styled.element_style().map(StyleArgs::len), Some(1));
    }
}
