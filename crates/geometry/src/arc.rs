//! Endpoint-to-center arc parameterization.
//!
//! An arc is authored as "from the current point, to `p1`, sweeping
//! `dw` radians" and converted here into center form. Positive sweeps
//! run in the direction of increasing angle.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec2;
use log::trace;

use crate::spline::CubicSegment;

/// Sweeps smaller than this are drawn as straight lines.
pub const SWEEP_EPS: f64 = 1e-7;

/// An elliptical arc in center form. Circular arcs have `rx == ry`
/// and `phi == 0`.
///
/// `start` and `sweep` are parametric angles: the point at angle `t`
/// is `center + R(phi) * (rx cos t, ry sin t)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Arc {
    pub center: DVec2,
    pub rx: f64,
    pub ry: f64,
    pub phi: f64,
    pub start: f64,
    pub sweep: f64,
}

/// Result of converting an endpoint-form arc.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ArcPath {
    /// Degenerate sweep; draw a line instead.
    Line { from: DVec2, to: DVec2 },
    Arc(Arc),
}

fn rotate(v: DVec2, phi: f64) -> DVec2 {
    let (sin, cos) = phi.sin_cos();
    DVec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

impl Arc {
    pub fn circle(center: DVec2, radius: f64, start: f64, sweep: f64) -> Self {
        Self {
            center,
            rx: radius,
            ry: radius,
            phi: 0.0,
            start,
            sweep,
        }
    }

    /// A closed ellipse, starting at parametric angle 0.
    pub fn ellipse(center: DVec2, rx: f64, ry: f64, phi: f64) -> Self {
        Self {
            center,
            rx,
            ry,
            phi,
            start: 0.0,
            sweep: TAU,
        }
    }

    pub fn is_circular(&self) -> bool {
        self.rx == self.ry
    }

    /// Radius along the first axis; the radius for circular arcs.
    pub fn radius(&self) -> f64 {
        self.rx
    }

    pub fn end(&self) -> f64 {
        self.start + self.sweep
    }

    pub fn point_at_angle(&self, angle: f64) -> DVec2 {
        let (sin, cos) = angle.sin_cos();
        self.center + rotate(DVec2::new(self.rx * cos, self.ry * sin), self.phi)
    }

    /// Unit tangent at `angle`, oriented along the sweep.
    pub fn tangent_at_angle(&self, angle: f64) -> DVec2 {
        let (sin, cos) = angle.sin_cos();
        let direction = if self.sweep < 0.0 { -1.0 } else { 1.0 };
        let tangent = rotate(DVec2::new(-self.rx * sin, self.ry * cos), self.phi) * direction;
        tangent.try_normalize().unwrap_or(DVec2::X)
    }

    pub fn start_point(&self) -> DVec2 {
        self.point_at_angle(self.start)
    }

    pub fn end_point(&self) -> DVec2 {
        self.point_at_angle(self.end())
    }

    /// Whether a parametric angle lies within the swept range, modulo 2π.
    pub fn contains_angle(&self, angle: f64) -> bool {
        if self.sweep.abs() >= TAU {
            return true;
        }
        let (from, span) = if self.sweep >= 0.0 {
            (self.start, self.sweep)
        } else {
            (self.start + self.sweep, -self.sweep)
        };
        (angle - from).rem_euclid(TAU) <= span
    }

    /// Parametric angle of a point, as seen from the center.
    pub fn angle_of(&self, point: DVec2) -> f64 {
        let local = rotate(point - self.center, -self.phi);
        (local.y / self.ry).atan2(local.x / self.rx)
    }

    /// Approximates the arc with cubic Beziers of at most a quarter turn each.
    ///
    /// Sweeps beyond a full turn are drawn as one full turn. A non-finite
    /// sweep or start yields no segments.
    pub fn to_cubics(&self) -> Vec<CubicSegment> {
        if !self.sweep.is_finite() || !self.start.is_finite() {
            trace!("non-finite arc (start = {}, sweep = {}), skipping", self.start, self.sweep);
            return Vec::new();
        }
        let sweep = self.sweep.clamp(-TAU, TAU);
        let count = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / count as f64;
        let kappa = 4.0 / 3.0 * (step / 4.0).tan();
        let map = |u: DVec2| self.center + rotate(DVec2::new(self.rx * u.x, self.ry * u.y), self.phi);

        (0..count)
            .map(|i| {
                let a0 = self.start + step * i as f64;
                let a1 = a0 + step;
                let (s0, c0) = a0.sin_cos();
                let (s1, c1) = a1.sin_cos();
                let p0 = DVec2::new(c0, s0);
                let p3 = DVec2::new(c1, s1);
                CubicSegment {
                    from: map(p0),
                    ctrl1: map(p0 + DVec2::new(-s0, c0) * kappa),
                    ctrl2: map(p3 - DVec2::new(-s1, c1) * kappa),
                    to: map(p3),
                }
            })
            .collect()
    }
}

/// Derives the circle through `p0` and `p1` that subtends `dw`.
///
/// `|dw|` must be below 2π. Near-zero sweeps yield [`ArcPath::Line`].
pub fn arc_from_endpoints(p0: DVec2, p1: DVec2, dw: f64) -> ArcPath {
    elliptical_arc_from_endpoints(p0, p1, dw, 1.0, 0.0)
}

/// Elliptical generalization of [`arc_from_endpoints`]: the ellipse has
/// axis ratio `k = ry / rx` and is rotated by `phi`. With `k == 1` and
/// `phi == 0` this is exactly the circular derivation.
pub fn elliptical_arc_from_endpoints(p0: DVec2, p1: DVec2, dw: f64, k: f64, phi: f64) -> ArcPath {
    if dw.abs() < SWEEP_EPS || !(k > 0.0) || p0 == p1 {
        trace!("degenerate arc (dw = {dw}, k = {k}), drawing a line");
        return ArcPath::Line { from: p0, to: p1 };
    }

    // Map the chord into the space where the ellipse is a circle.
    let chord = rotate(p1 - p0, -phi);
    let chord = DVec2::new(chord.x, chord.y / k);

    let t = (dw / 2.0).tan();
    let rx = (chord.x - chord.y / t) / 2.0;
    let ry = (chord.y + chord.x / t) / 2.0;
    let radius = rx.hypot(ry);
    let start = (-ry).atan2(-rx);

    let offset = rotate(DVec2::new(rx, ry * k), phi);
    ArcPath::Arc(Arc {
        center: p0 + offset,
        rx: radius,
        ry: radius * k,
        phi,
        start,
        sweep: dw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn unwrap_arc(path: ArcPath) -> Arc {
        match path {
            ArcPath::Arc(arc) => arc,
            ArcPath::Line { .. } => panic!("expected an arc"),
        }
    }

    #[test]
    fn test_half_circle() {
        let arc = unwrap_arc(arc_from_endpoints(DVec2::ZERO, DVec2::new(2.0, 0.0), PI));
        assert!((arc.center - DVec2::new(1.0, 0.0)).length() < 1e-9);
        assert!((arc.radius() - 1.0).abs() < 1e-9);
        assert!((arc.start.cos() + 1.0).abs() < 1e-9);
        assert!((arc.end_point() - DVec2::new(2.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_round_trip_random() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..2000 {
            let p0 = DVec2::new(rng.random_range(-100.0..100.0), rng.random_range(-100.0..100.0));
            let mut dw: f64 = rng.random_range(-TAU..TAU);
            if dw.abs() < SWEEP_EPS {
                dw = 0.5;
            }
            let radius: f64 = rng.random_range(0.1..50.0);
            // place p1 on a circle of the given radius through p0
            let start: f64 = rng.random_range(-PI..PI);
            let center = p0 - DVec2::new(start.cos(), start.sin()) * radius;
            let p1 = center + DVec2::new((start + dw).cos(), (start + dw).sin()) * radius;
            if (p1 - p0).length() < 1e-3 {
                continue;
            }

            let arc = unwrap_arc(arc_from_endpoints(p0, p1, dw));
            let rebuilt = arc.center + DVec2::new(arc.end().cos(), arc.end().sin()) * arc.radius();
            assert!((rebuilt - p1).length() < 1e-9, "p1 {p1:?} rebuilt {rebuilt:?}");
            assert!((arc.start_point() - p0).length() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_sweep_is_line() {
        let path = arc_from_endpoints(DVec2::ZERO, DVec2::new(5.0, 5.0), 1e-12);
        assert_eq!(
            path,
            ArcPath::Line {
                from: DVec2::ZERO,
                to: DVec2::new(5.0, 5.0)
            }
        );
    }

    #[test]
    fn test_elliptical_reduces_to_circular() {
        let p0 = DVec2::new(1.0, 2.0);
        let p1 = DVec2::new(-3.0, 7.5);
        let circular = arc_from_endpoints(p0, p1, 1.3);
        let elliptical = elliptical_arc_from_endpoints(p0, p1, 1.3, 1.0, 0.0);
        assert_eq!(circular, elliptical);
    }

    #[test]
    fn test_elliptical_hits_endpoints() {
        let p0 = DVec2::new(0.0, 0.0);
        let p1 = DVec2::new(4.0, 1.0);
        let arc = unwrap_arc(elliptical_arc_from_endpoints(p0, p1, -2.0, 0.5, 0.4));
        assert!((arc.start_point() - p0).length() < 1e-9);
        assert!((arc.end_point() - p1).length() < 1e-9);
        assert!((arc.ry / arc.rx - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cubics_are_continuous() {
        let arc = Arc::circle(DVec2::new(5.0, 5.0), 3.0, 0.2, -4.0);
        let cubics = arc.to_cubics();
        assert_eq!(cubics.len(), 3);
        assert!((cubics[0].from - arc.start_point()).length() < 1e-12);
        assert!((cubics[2].to - arc.end_point()).length() < 1e-9);
        for pair in cubics.windows(2) {
            assert!((pair[0].to - pair[1].from).length() < 1e-12);
        }
    }

    #[test]
    fn test_cubics_clamp_sweep_to_full_turn() {
        let huge = Arc::circle(DVec2::ZERO, 1.0, 0.0, 1e13).to_cubics();
        assert_eq!(huge.len(), 4);
        assert!((huge[3].to - DVec2::new(1.0, 0.0)).length() < 1e-9);

        let backwards = Arc::circle(DVec2::ZERO, 1.0, 0.0, -1e13).to_cubics();
        assert_eq!(backwards.len(), 4);
    }

    #[test]
    fn test_cubics_skip_non_finite_sweep() {
        assert!(Arc::circle(DVec2::ZERO, 1.0, 0.0, f64::INFINITY).to_cubics().is_empty());
        assert!(Arc::circle(DVec2::ZERO, 1.0, 0.0, f64::NAN).to_cubics().is_empty());
    }

    #[test]
    fn test_contains_angle_negative_sweep() {
        let arc = Arc::circle(DVec2::ZERO, 1.0, 0.0, -FRAC_PI_2);
        assert!(arc.contains_angle(-0.5));
        assert!(arc.contains_angle(TAU - 0.5));
        assert!(!arc.contains_angle(0.5));
    }
}
