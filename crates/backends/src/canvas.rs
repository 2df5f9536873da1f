//! Rasterizing backend: turns commands into device-space path calls on
//! a [`Surface`].

use std::cell::RefCell;
use std::rc::Rc;

use command::{
    ArcArgs, ArcToArgs, CircleArgs, CommandQueue, CurveArgs, EllipseArgs, GroupArgs, ImageArgs,
    LineArgs, PaintArgs, PointArgs, PolylineArgs, RectArgs, StyleArgs, StyleKey, TextArgs,
    ViewArgs,
};
use geometry::{elliptical_arc_from_endpoints, Arc, ArcPath, CubicSegment, DVec2, Matrix};
use handler::{ExecState, Handler, HandlerContext, Image, StyleChanges};
use log::debug;

use crate::Surface;

/// Target type the canvas handler adopts.
#[derive(Clone)]
pub struct CanvasTarget(pub Rc<RefCell<dyn Surface>>);

impl CanvasTarget {
    pub fn new(surface: impl Surface + 'static) -> Self {
        Self(Rc::new(RefCell::new(surface)))
    }
}

pub struct Canvas {
    surface: Rc<RefCell<dyn Surface>>,
    state: ExecState,
    base_style: StyleArgs,
    /// Current point in local coordinates.
    pen: Option<DVec2>,
    /// The current path has been painted; the next path call starts anew.
    painted: bool,
}

impl Canvas {
    pub fn new(surface: Rc<RefCell<dyn Surface>>, context: &HandlerContext) -> Self {
        Self {
            surface,
            state: ExecState::new(Rc::clone(&context.symbols)),
            base_style: context.settings.base_style.clone(),
            pen: None,
            painted: false,
        }
    }

    pub fn state(&self) -> &ExecState {
        &self.state
    }

    pub fn transform(&self) -> Matrix {
        self.state.transform()
    }

    fn device(&self, p: DVec2) -> DVec2 {
        self.state.transform().apply(p)
    }

    fn emit(&self, changes: &StyleChanges) {
        let mut surface = self.surface.borrow_mut();
        for (key, value) in changes {
            surface.set_style(*key, value);
        }
    }

    fn new_path(&mut self) {
        self.surface.borrow_mut().begin_path();
        self.painted = false;
    }

    fn cubics(&self, segments: &[CubicSegment], start: bool) {
        let mut surface = self.surface.borrow_mut();
        if let (true, Some(first)) = (start, segments.first()) {
            surface.move_to(self.device(first.from));
        }
        for segment in segments {
            surface.cubic_to(
                self.device(segment.ctrl1),
                self.device(segment.ctrl2),
                self.device(segment.to),
            );
        }
    }

    fn polygon(&self, points: &[DVec2], closed: bool) {
        let mut surface = self.surface.borrow_mut();
        let mut points = points.iter();
        if let Some(first) = points.next() {
            surface.move_to(self.device(*first));
        }
        for p in points {
            surface.line_to(self.device(*p));
        }
        if closed {
            surface.close_path();
        }
    }

    /// Paints a closed shape: fill when visible, then stroke.
    fn paint_solid(&mut self) {
        let filled = self.state.style().is_filled();
        let stroked = !self.state.style().get(StyleKey::Stroke).is_invisible();
        let mut surface = self.surface.borrow_mut();
        if filled {
            surface.fill();
        }
        if stroked {
            surface.stroke();
        }
        self.painted = true;
    }

    fn paint_outline(&mut self) {
        self.surface.borrow_mut().stroke();
        self.painted = true;
    }

    fn full_arc(&mut self, arc: &Arc) {
        self.new_path();
        self.cubics(&arc.to_cubics(), true);
        self.surface.borrow_mut().close_path();
        self.paint_solid();
    }

    fn placement(&self, x: f64, y: f64, w: f64) -> Matrix {
        self.state
            .transform()
            .compose(&Matrix::from_trs(x, y, w, 1.0))
    }
}

impl Handler for Canvas {
    fn init(&mut self, queue: &CommandQueue, style: Option<&StyleArgs>) -> bool {
        debug!("canvas: init for queue {}", queue.id());
        let all = self.state.reset(&self.base_style, style);
        self.emit(&all);
        self.pen = None;
        self.painted = false;
        true
    }

    fn fetches_images(&self) -> bool {
        true
    }

    fn clear(&mut self) -> bool {
        self.surface.borrow_mut().clear();
        true
    }

    fn view(&mut self, args: &ViewArgs) -> bool {
        let height = self.surface.borrow().height();
        self.state.apply_view(args, height);
        true
    }

    fn begin_group(&mut self, args: &GroupArgs) -> bool {
        let changes = self.state.begin_group(args);
        self.emit(&changes);
        true
    }

    fn end_group(&mut self) -> bool {
        let changes = self.state.end_group();
        self.emit(&changes);
        true
    }

    fn style(&mut self, args: &StyleArgs) -> bool {
        let changes = self.state.set_style(args);
        self.emit(&changes);
        true
    }

    fn circle(&mut self, args: &CircleArgs) -> bool {
        let arc = Arc::circle(args.center(), args.r.get(), 0.0, std::f64::consts::TAU);
        self.full_arc(&arc);
        true
    }

    fn ellipse(&mut self, args: &EllipseArgs) -> bool {
        self.full_arc(&args.arc());
        true
    }

    fn arc(&mut self, args: &ArcArgs) -> bool {
        self.new_path();
        self.cubics(&args.arc().to_cubics(), true);
        self.paint_outline();
        true
    }

    fn rect(&mut self, args: &RectArgs) -> bool {
        self.new_path();
        self.polygon(&args.corners(), true);
        self.paint_solid();
        true
    }

    fn line(&mut self, args: &LineArgs) -> bool {
        self.new_path();
        self.polygon(&[args.from(), args.to()], false);
        self.paint_outline();
        true
    }

    fn polyline(&mut self, args: &PolylineArgs) -> bool {
        self.new_path();
        self.polygon(&args.pts.to_vec(), args.closed);
        if args.closed {
            self.paint_solid();
        } else {
            self.paint_outline();
        }
        true
    }

    fn text(&mut self, args: &TextArgs) -> bool {
        let placement = self.placement(args.x.get(), args.y.get(), args.w.get());
        self.surface.borrow_mut().text(&args.text.get(), placement);
        true
    }

    fn image(&mut self, args: &ImageArgs, image: Option<&Image>) -> bool {
        let Some(image) = image else {
            return false;
        };
        let size = DVec2::new(
            args.width.unwrap_or(image.width),
            args.height.unwrap_or(image.height),
        );
        let placement = self.placement(args.x.get(), args.y.get(), args.w.get());
        self.surface.borrow_mut().image(image, placement, size);
        true
    }

    fn moveto(&mut self, args: &PointArgs) -> bool {
        if self.painted {
            self.new_path();
        }
        let p = DVec2::new(args.x.get(), args.y.get());
        self.surface.borrow_mut().move_to(self.device(p));
        self.pen = Some(p);
        true
    }

    fn lineto(&mut self, args: &PointArgs) -> bool {
        let p = DVec2::new(args.x.get(), args.y.get());
        self.surface.borrow_mut().line_to(self.device(p));
        self.pen = Some(p);
        true
    }

    fn curveto(&mut self, args: &CurveArgs) -> bool {
        let p = DVec2::new(args.x.get(), args.y.get());
        self.surface.borrow_mut().cubic_to(
            self.device(DVec2::new(args.x1.get(), args.y1.get())),
            self.device(DVec2::new(args.x2.get(), args.y2.get())),
            self.device(p),
        );
        self.pen = Some(p);
        true
    }

    fn arcto(&mut self, args: &ArcToArgs) -> bool {
        let target = DVec2::new(args.x.get(), args.y.get());
        let Some(from) = self.pen else {
            return self.moveto(&PointArgs::new(target.x, target.y));
        };
        match elliptical_arc_from_endpoints(from, target, args.dw.get(), args.k.get(), args.phi.get()) {
            ArcPath::Line { to, .. } => self.surface.borrow_mut().line_to(self.device(to)),
            ArcPath::Arc(arc) => self.cubics(&arc.to_cubics(), false),
        }
        self.pen = Some(target);
        true
    }

    fn closepath(&mut self) -> bool {
        self.surface.borrow_mut().close_path();
        true
    }

    fn stroke(&mut self, _args: &PaintArgs) -> bool {
        self.paint_outline();
        true
    }

    fn fill(&mut self, _args: &PaintArgs) -> bool {
        self.surface.borrow_mut().fill();
        self.painted = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RecordingSurface, SurfaceCall};
    use command::{StyleValue, SymbolTable};
    use handler::{Executor, ResourceCache, Settings};

    fn canvas(height: f64) -> (Rc<RefCell<RecordingSurface>>, Canvas) {
        let surface = Rc::new(RefCell::new(RecordingSurface::new(height)));
        let context = HandlerContext::new(Rc::new(SymbolTable::new()), Settings::default());
        let canvas = Canvas::new(surface.clone(), &context);
        (surface, canvas)
    }

    fn run(canvas: &mut Canvas, queue: &CommandQueue) {
        Executor::new(canvas, Rc::new(ResourceCache::offline()), 16).run_blocking(queue, None);
    }

    fn paths(calls: &[SurfaceCall]) -> Vec<SurfaceCall> {
        calls
            .iter()
            .filter(|c| !matches!(c, SurfaceCall::SetStyle { .. }))
            .cloned()
            .collect()
    }

    #[test]
    fn test_init_emits_full_style() {
        let (surface, mut canvas) = canvas(100.0);
        run(&mut canvas, &CommandQueue::new());
        assert_eq!(surface.borrow().calls.len(), 12);
    }

    #[test]
    fn test_cartesian_view_flips_path() {
        let (surface, mut canvas) = canvas(100.0);
        let mut queue = CommandQueue::new();
        queue
            .view(ViewArgs::new(0.0, 0.0, 1.0).cartesian())
            .line(LineArgs::new(0.0, 0.0, 0.0, 10.0));
        run(&mut canvas, &queue);
        assert_eq!(
            paths(&surface.borrow().calls),
            [
                SurfaceCall::BeginPath,
                SurfaceCall::MoveTo { x: 0.0, y: 100.0 },
                SurfaceCall::LineTo { x: 0.0, y: 90.0 },
                SurfaceCall::Stroke,
            ]
        );
    }

    #[test]
    fn test_filled_circle_fills_and_strokes() {
        let (surface, mut canvas) = canvas(100.0);
        let mut queue = CommandQueue::new();
        queue.circle(CircleArgs::new(0.0, 0.0, 5.0).with_style(StyleArgs::new().fill("red")));
        run(&mut canvas, &queue);
        let calls = surface.borrow_mut().take();
        let ops = paths(&calls[12..]);
        let cubics = ops
            .iter()
            .filter(|c| matches!(c, SurfaceCall::CubicTo { .. }))
            .count();
        assert_eq!(cubics, 4);
        assert_eq!(&ops[ops.len() - 2..], [SurfaceCall::Fill, SurfaceCall::Stroke]);

        let sets: Vec<&SurfaceCall> = calls[12..]
            .iter()
            .filter(|c| matches!(c, SurfaceCall::SetStyle { .. }))
            .collect();
        assert_eq!(
            sets,
            [
                &SurfaceCall::SetStyle {
                    key: StyleKey::Fill,
                    value: StyleValue::text("red")
                },
                &SurfaceCall::SetStyle {
                    key: StyleKey::Fill,
                    value: StyleValue::text("transparent")
                },
            ]
        );
    }

    #[test]
    fn test_oversized_arc_sweep_draws_one_turn() {
        let parsed = crate::parse::parse(
            r#"{"main": [{"c": "arc", "a": {"r": 1, "dw": 1e13}}]}"#,
            &command::KindRegistry::new(),
            &SymbolTable::new(),
        )
        .unwrap();
        let (surface, mut canvas) = canvas(100.0);
        run(&mut canvas, &parsed.main);
        let calls = surface.borrow_mut().take();
        let cubics = calls
            .iter()
            .filter(|c| matches!(c, SurfaceCall::CubicTo { .. }))
            .count();
        assert_eq!(cubics, 4);
        assert_eq!(calls.last(), Some(&SurfaceCall::Stroke));
    }

    #[test]
    fn test_path_commands_share_one_path() {
        let (surface, mut canvas) = canvas(100.0);
        let mut queue = CommandQueue::new();
        queue
            .move_to(PointArgs::new(0.0, 0.0))
            .line_to(PointArgs::new(10.0, 0.0))
            .arc_to(ArcToArgs::new(10.0, 10.0, 0.0))
            .close_path()
            .stroke(PaintArgs::default())
            .move_to(PointArgs::new(5.0, 5.0));
        run(&mut canvas, &queue);
        assert_eq!(
            paths(&surface.borrow().calls),
            [
                SurfaceCall::MoveTo { x: 0.0, y: 0.0 },
                SurfaceCall::LineTo { x: 10.0, y: 0.0 },
                SurfaceCall::LineTo { x: 10.0, y: 10.0 },
                SurfaceCall::ClosePath,
                SurfaceCall::Stroke,
                SurfaceCall::BeginPath,
                SurfaceCall::MoveTo { x: 5.0, y: 5.0 },
            ]
        );
    }

    #[test]
    fn test_images_without_fetch_fall_back_to_placeholder() {
        let (surface, mut canvas) = canvas(100.0);
        let mut queue = CommandQueue::new();
        queue.image(ImageArgs::new("missing.png", 1.0, 2.0));
        run(&mut canvas, &queue);
        let calls = surface.borrow_mut().take();
        assert_eq!(
            calls.last(),
            Some(&SurfaceCall::Image {
                uri: "missing.png".into(),
                transform: [1.0, 0.0, 0.0, 1.0, 1.0, 2.0],
                width: 16.0,
                height: 16.0,
            })
        );
    }
}
