//! Per-kind geometric capabilities.
//!
//! Backends never special-case a kind: they ask a command for its
//! [`Capabilities`] and call the matching [`Element`] method.

use std::f64::consts::TAU;

use bitflags::bitflags;
use geometry::{catmull_rom, hit, Arc, DVec2};

use crate::{
    ArcArgs, CircleArgs, CommandQueue, CurveArgs, EllipseArgs, GroupArgs, ImageArgs, LineArgs,
    PaintArgs, PointArgs, PolylineArgs, RectArgs, SplineArgs, TextArgs,
};

/// Segments per cubic when a spline is sampled for hit testing.
const SPLINE_FLATTEN_STEPS: usize = 16;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Can be rewritten into primitive commands.
        const EXPAND = 1 << 0;
        /// Can report a point and tangent at a normalized location.
        const POINT_AT = 1 << 1;
        /// Can test a point against its outline.
        const HIT_CONTOUR = 1 << 2;
        /// Can test a point against its filled interior.
        const HIT_INNER = 1 << 3;
        /// Can be moved by a delta.
        const DRAG = 1 << 4;
        /// Exposes handle points for editing.
        const HANDLES = 1 << 5;
    }
}

/// A point on an element with its unit tangent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointAt {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl PointAt {
    fn new(point: DVec2, tangent: DVec2) -> Self {
        let tangent = tangent.normalize_or_zero();
        Self {
            x: point.x,
            y: point.y,
            dx: tangent.x,
            dy: tangent.y,
        }
    }

    pub fn point(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Geometry shared by every drawable kind. Methods whose capability is
/// not advertised keep their default, inert behavior.
///
/// Hit tests take points in the element's local coordinates.
pub trait Element {
    fn capabilities(&self) -> Capabilities;

    fn expand(&self) -> Option<CommandQueue> {
        None
    }

    /// `loc` runs from 0 at the start to 1 at the end.
    fn point_at(&self, _loc: f64) -> Option<PointAt> {
        None
    }

    fn hit_contour(&self, _point: DVec2, _eps: f64) -> bool {
        false
    }

    fn hit_inner(&self, _point: DVec2, _eps: f64) -> bool {
        false
    }

    fn drag(&mut self, _delta: DVec2) {}

    fn handles(&self, _out: &mut Vec<DVec2>) {}
}

fn point_on_polyline(vertices: &[DVec2], loc: f64) -> Option<PointAt> {
    if vertices.len() < 2 {
        return None;
    }
    let total: f64 = vertices.windows(2).map(|w| w[0].distance(w[1])).sum();
    let mut remaining = loc.clamp(0.0, 1.0) * total;
    for w in vertices.windows(2) {
        let length = w[0].distance(w[1]);
        if remaining <= length {
            let t = if length > 0.0 { remaining / length } else { 0.0 };
            return Some(PointAt::new(w[0].lerp(w[1], t), w[1] - w[0]));
        }
        remaining -= length;
    }
    let n = vertices.len();
    Some(PointAt::new(vertices[n - 1], vertices[n - 1] - vertices[n - 2]))
}

impl CircleArgs {
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x.get(), self.y.get())
    }
}

impl Element for CircleArgs {
    fn capabilities(&self) -> Capabilities {
        Capabilities::POINT_AT
            | Capabilities::HIT_CONTOUR
            | Capabilities::HIT_INNER
            | Capabilities::DRAG
            | Capabilities::HANDLES
    }

    fn point_at(&self, loc: f64) -> Option<PointAt> {
        let arc = Arc::circle(self.center(), self.r.get(), 0.0, TAU);
        let angle = loc * TAU;
        Some(PointAt::new(arc.point_at_angle(angle), arc.tangent_at_angle(angle)))
    }

    fn hit_contour(&self, point: DVec2, eps: f64) -> bool {
        hit::on_circle(point, self.center(), self.r.get(), eps)
    }

    fn hit_inner(&self, point: DVec2, eps: f64) -> bool {
        hit::in_circle(point, self.center(), self.r.get(), eps)
    }

    fn drag(&mut self, delta: DVec2) {
        self.x.shift(delta.x);
        self.y.shift(delta.y);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        let center = self.center();
        out.push(center);
        out.push(center + DVec2::new(self.r.get(), 0.0));
    }
}

impl EllipseArgs {
    pub fn arc(&self) -> Arc {
        Arc::ellipse(
            DVec2::new(self.x.get(), self.y.get()),
            self.rx.get(),
            self.ry.get(),
            self.w.get(),
        )
    }
}

impl Element for EllipseArgs {
    fn capabilities(&self) -> Capabilities {
        Capabilities::POINT_AT
            | Capabilities::HIT_CONTOUR
            | Capabilities::HIT_INNER
            | Capabilities::DRAG
            | Capabilities::HANDLES
    }

    fn point_at(&self, loc: f64) -> Option<PointAt> {
        let arc = self.arc();
        let angle = loc * TAU;
        Some(PointAt::new(arc.point_at_angle(angle), arc.tangent_at_angle(angle)))
    }

    fn hit_contour(&self, point: DVec2, eps: f64) -> bool {
        let arc = self.arc();
        hit::on_ellipse(point, arc.center, arc.rx, arc.ry, arc.phi, eps)
    }

    fn hit_inner(&self, point: DVec2, eps: f64) -> bool {
        let arc = self.arc();
        hit::in_ellipse(point, arc.center, arc.rx, arc.ry, arc.phi, eps)
    }

    fn drag(&mut self, delta: DVec2) {
        self.x.shift(delta.x);
        self.y.shift(delta.y);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        let arc = self.arc();
        out.push(arc.center);
        out.push(arc.point_at_angle(0.0));
        out.push(arc.point_at_angle(TAU / 4.0));
    }
}

impl ArcArgs {
    pub fn arc(&self) -> Arc {
        Arc::circle(
            DVec2::new(self.x.get(), self.y.get()),
            self.r.get(),
            self.w.get(),
            self.dw.get(),
        )
    }
}

impl Element for ArcArgs {
    fn capabilities(&self) -> Capabilities {
        Capabilities::POINT_AT | Capabilities::HIT_CONTOUR | Capabilities::DRAG | Capabilities::HANDLES
    }

    fn point_at(&self, loc: f64) -> Option<PointAt> {
        let arc = self.arc();
        let angle = arc.start + loc * arc.sweep;
        Some(PointAt::new(arc.point_at_angle(angle), arc.tangent_at_angle(angle)))
    }

    fn hit_contour(&self, point: DVec2, eps: f64) -> bool {
        hit::on_arc(point, &self.arc(), eps)
    }

    fn drag(&mut self, delta: DVec2) {
        self.x.shift(delta.x);
        self.y.shift(delta.y);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        let arc = self.arc();
        out.push(arc.center);
        out.push(arc.start_point());
        out.push(arc.end_point());
    }
}

impl RectArgs {
    /// Corners in drawing order, starting at `(x, y)`.
    pub fn corners(&self) -> [DVec2; 4] {
        let (x, y) = (self.x.get(), self.y.get());
        let (w, h) = (self.width.get(), self.height.get());
        [
            DVec2::new(x, y),
            DVec2::new(x + w, y),
            DVec2::new(x + w, y + h),
            DVec2::new(x, y + h),
        ]
    }
}

impl Element for RectArgs {
    fn capabilities(&self) -> Capabilities {
        Capabilities::POINT_AT
            | Capabilities::HIT_CONTOUR
            | Capabilities::HIT_INNER
            | Capabilities::DRAG
            | Capabilities::HANDLES
    }

    fn point_at(&self, loc: f64) -> Option<PointAt> {
        let corners = self.corners();
        let mut outline = corners.to_vec();
        outline.push(corners[0]);
        point_on_polyline(&outline, loc)
    }

    fn hit_contour(&self, point: DVec2, eps: f64) -> bool {
        hit::on_polyline(point, &self.corners(), true, eps)
    }

    fn hit_inner(&self, point: DVec2, _eps: f64) -> bool {
        hit::in_polygon(point, &self.corners())
    }

    fn drag(&mut self, delta: DVec2) {
        self.x.shift(delta.x);
        self.y.shift(delta.y);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        out.extend(self.corners());
    }
}

impl LineArgs {
    pub fn from(&self) -> DVec2 {
        DVec2::new(self.x1.get(), self.y1.get())
    }

    pub fn to(&self) -> DVec2 {
        DVec2::new(self.x2.get(), self.y2.get())
    }
}

impl Element for LineArgs {
    fn capabilities(&self) -> Capabilities {
        Capabilities::POINT_AT | Capabilities::HIT_CONTOUR | Capabilities::DRAG | Capabilities::HANDLES
    }

    fn point_at(&self, loc: f64) -> Option<PointAt> {
        let (from, to) = (self.from(), self.to());
        Some(PointAt::new(from.lerp(to, loc), to - from))
    }

    fn hit_contour(&self, point: DVec2, eps: f64) -> bool {
        hit::on_segment(point, self.from(), self.to(), eps)
    }

    fn drag(&mut self, delta: DVec2) {
        self.x1.shift(delta.x);
        self.y1.shift(delta.y);
        self.x2.shift(delta.x);
        self.y2.shift(delta.y);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        out.push(self.from());
        out.push(self.to());
    }
}

impl Element for PolylineArgs {
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::POINT_AT
            | Capabilities::HIT_CONTOUR
            | Capabilities::DRAG
            | Capabilities::HANDLES;
        if self.closed {
            caps |= Capabilities::HIT_INNER;
        }
        caps
    }

    fn point_at(&self, loc: f64) -> Option<PointAt> {
        let mut vertices = self.pts.to_vec();
        if self.closed {
            if let Some(first) = self.pts.first() {
                vertices.push(first);
            }
        }
        point_on_polyline(&vertices, loc)
    }

    fn hit_contour(&self, point: DVec2, eps: f64) -> bool {
        hit::on_polyline(point, &self.pts.to_vec(), self.closed, eps)
    }

    fn hit_inner(&self, point: DVec2, _eps: f64) -> bool {
        self.closed && hit::in_polygon(point, &self.pts.to_vec())
    }

    fn drag(&mut self, delta: DVec2) {
        self.pts.translate(delta);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        out.extend(self.pts.iter());
    }
}

impl SplineArgs {
    /// The spline sampled into a polyline.
    pub fn flatten(&self) -> Vec<DVec2> {
        let segments = catmull_rom(&self.pts.to_vec(), self.closed);
        let mut out = Vec::with_capacity(segments.len() * SPLINE_FLATTEN_STEPS + 1);
        for (i, segment) in segments.iter().enumerate() {
            let samples = segment.flatten(SPLINE_FLATTEN_STEPS);
            let skip = if i == 0 { 0 } else { 1 };
            out.extend(samples.into_iter().skip(skip));
        }
        out
    }
}

impl Element for SplineArgs {
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::EXPAND
            | Capabilities::HIT_CONTOUR
            | Capabilities::DRAG
            | Capabilities::HANDLES;
        if self.closed {
            caps |= Capabilities::HIT_INNER;
        }
        caps
    }

    /// Rewrites the spline as `moveto` plus one `curveto` per segment,
    /// painted inside a group carrying the element's style.
    fn expand(&self) -> Option<CommandQueue> {
        let segments = catmull_rom(&self.pts.to_vec(), self.closed);
        let first = segments.first()?;

        let mut queue = CommandQueue::new();
        queue
            .begin(GroupArgs::styled(self.style.clone()))
            .move_to(PointArgs::new(first.from.x, first.from.y));
        for segment in &segments {
            queue.curve_to(CurveArgs::new(
                segment.ctrl1.x,
                segment.ctrl1.y,
                segment.ctrl2.x,
                segment.ctrl2.y,
                segment.to.x,
                segment.to.y,
            ));
        }
        if self.closed {
            queue.close_path().fill(PaintArgs::default());
        }
        queue.stroke(PaintArgs::default()).end();
        Some(queue)
    }

    fn hit_contour(&self, point: DVec2, eps: f64) -> bool {
        hit::on_polyline(point, &self.flatten(), false, eps)
    }

    fn hit_inner(&self, point: DVec2, _eps: f64) -> bool {
        self.closed && hit::in_polygon(point, &self.flatten())
    }

    fn drag(&mut self, delta: DVec2) {
        self.pts.translate(delta);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        out.extend(self.pts.iter());
    }
}

impl Element for TextArgs {
    fn capabilities(&self) -> Capabilities {
        Capabilities::DRAG | Capabilities::HANDLES
    }

    fn drag(&mut self, delta: DVec2) {
        self.x.shift(delta.x);
        self.y.shift(delta.y);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        out.push(DVec2::new(self.x.get(), self.y.get()));
    }
}

impl ImageArgs {
    /// Corners of the image box when both sizes are known.
    pub fn corners(&self) -> Option<[DVec2; 4]> {
        let (x, y) = (self.x.get(), self.y.get());
        let (w, h) = (self.width?, self.height?);
        Some([
            DVec2::new(x, y),
            DVec2::new(x + w, y),
            DVec2::new(x + w, y + h),
            DVec2::new(x, y + h),
        ])
    }
}

impl Element for ImageArgs {
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::DRAG | Capabilities::HANDLES;
        if self.corners().is_some() {
            caps |= Capabilities::HIT_INNER;
        }
        caps
    }

    fn hit_inner(&self, point: DVec2, _eps: f64) -> bool {
        self.corners()
            .is_some_and(|corners| hit::in_polygon(point, &corners))
    }

    fn drag(&mut self, delta: DVec2) {
        self.x.shift(delta.x);
        self.y.shift(delta.y);
    }

    fn handles(&self, out: &mut Vec<DVec2>) {
        match self.corners() {
            Some(corners) => out.extend(corners),
            None => out.push(DVec2::new(self.x.get(), self.y.get())),
        }
    }
}
