//! Hit-testing backend: reports which commands lie under a point.

use std::cell::RefCell;
use std::rc::Rc;

use command::{
    ArcArgs, Capabilities, CircleArgs, Command, CommandQueue, Custom, Element, EllipseArgs,
    GroupArgs, ImageArgs, LineArgs, PolylineArgs, RectArgs, SplineArgs, StyleArgs, ViewArgs,
};
use geometry::{DVec2, Matrix};
use handler::{ExecState, Handler, HandlerContext, Image};
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    /// On the outline.
    Contour,
    /// Inside a filled shape.
    Inner,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Hit {
    /// Index path of the command, outermost queue first.
    pub path: Vec<usize>,
    pub kind: HitKind,
    pub command: String,
    /// Local-to-device transform the command was drawn with.
    pub transform: Matrix,
}

/// A pick query and, after execution, its hits in drawing order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Pick {
    /// Query point in device space.
    pub point: DVec2,
    /// Tolerance in device units.
    pub eps: f64,
    /// Device height, for y-up views.
    pub height: f64,
    pub hits: Vec<Hit>,
}

impl Pick {
    pub fn new(point: DVec2, eps: f64) -> Self {
        Self {
            point,
            eps,
            ..Default::default()
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// The last hit, i.e. the topmost element.
    pub fn topmost(&self) -> Option<&Hit> {
        self.hits.last()
    }
}

/// Target type the picker adopts.
#[derive(Clone, Debug)]
pub struct PickTarget(pub Rc<RefCell<Pick>>);

impl PickTarget {
    pub fn new(pick: Pick) -> Self {
        Self(Rc::new(RefCell::new(pick)))
    }
}

pub struct Picker {
    pick: Rc<RefCell<Pick>>,
    state: ExecState,
    base_style: StyleArgs,
    path: Vec<usize>,
}

impl Picker {
    pub fn new(pick: Rc<RefCell<Pick>>, context: &HandlerContext) -> Self {
        Self {
            pick,
            state: ExecState::new(Rc::clone(&context.symbols)),
            base_style: context.settings.base_style.clone(),
            path: Vec::new(),
        }
    }

    /// Tests `element` at the query point, mapped into the element's
    /// local space. Interiors count only when the current style fills.
    fn test(&mut self, kind: &str, element: &dyn Element) -> bool {
        let transform = self.state.transform();
        let Some(inverse) = transform.inverse() else {
            return true;
        };
        let mut pick = self.pick.borrow_mut();
        let point = inverse.apply(pick.point);
        let eps = pick.eps / transform.scale_factor();
        let caps = element.capabilities();

        let hit = if caps.contains(Capabilities::HIT_CONTOUR) && element.hit_contour(point, eps) {
            Some(HitKind::Contour)
        } else if caps.contains(Capabilities::HIT_INNER)
            && self.state.style().is_filled()
            && element.hit_inner(point, eps)
        {
            Some(HitKind::Inner)
        } else {
            None
        };
        if let Some(kind_hit) = hit {
            log::trace!("pick: {} at {:?} ({:?})", kind, self.path, kind_hit);
            pick.hits.push(Hit {
                path: self.path.clone(),
                kind: kind_hit,
                command: kind.to_string(),
                transform,
            });
        }
        true
    }
}

impl Handler for Picker {
    fn init(&mut self, _queue: &CommandQueue, style: Option<&StyleArgs>) -> bool {
        self.state.reset(&self.base_style, style);
        self.pick.borrow_mut().hits.clear();
        true
    }

    /// Kinds that can be hit are tested as a whole, not expanded.
    fn wants_expansion(&self, command: &Command) -> bool {
        !command.capabilities().intersects(Capabilities::HIT_CONTOUR | Capabilities::HIT_INNER)
    }

    fn locate(&mut self, path: &[usize]) {
        self.path.clear();
        self.path.extend_from_slice(path);
    }

    fn view(&mut self, args: &ViewArgs) -> bool {
        let height = self.pick.borrow().height;
        self.state.apply_view(args, height);
        true
    }

    fn begin_group(&mut self, args: &GroupArgs) -> bool {
        self.state.begin_group(args);
        true
    }

    fn end_group(&mut self) -> bool {
        self.state.end_group();
        true
    }

    fn style(&mut self, args: &StyleArgs) -> bool {
        self.state.set_style(args);
        true
    }

    fn circle(&mut self, args: &CircleArgs) -> bool {
        self.test("circle", args)
    }

    fn ellipse(&mut self, args: &EllipseArgs) -> bool {
        self.test("ellipse", args)
    }

    fn arc(&mut self, args: &ArcArgs) -> bool {
        self.test("arc", args)
    }

    fn rect(&mut self, args: &RectArgs) -> bool {
        self.test("rect", args)
    }

    fn line(&mut self, args: &LineArgs) -> bool {
        self.test("line", args)
    }

    fn polyline(&mut self, args: &PolylineArgs) -> bool {
        self.test("polyline", args)
    }

    fn spline(&mut self, args: &SplineArgs) -> bool {
        self.test("spline", args)
    }

    /// Images are solid wherever they have a known box.
    fn image(&mut self, args: &ImageArgs, _image: Option<&Image>) -> bool {
        let transform = self.state.transform();
        let Some(inverse) = transform.inverse() else {
            return true;
        };
        let mut pick = self.pick.borrow_mut();
        let point = inverse.apply(pick.point);
        if args.hit_inner(point, 0.0) {
            pick.hits.push(Hit {
                path: self.path.clone(),
                kind: HitKind::Inner,
                command: "image".to_string(),
                transform,
            });
        }
        true
    }

    fn custom(&mut self, custom: &Custom) -> bool {
        self.test(custom.kind(), custom.element())
    }
}
