//! Hit-test primitives.
//!
//! Every test takes a tolerance `eps` in the same space as its inputs;
//! callers working in local coordinates convert device tolerances with
//! [`Matrix::scale_factor`](crate::Matrix::scale_factor).

use glam::DVec2;

use crate::arc::Arc;

/// Point lies within `eps` of the segment `a -> b`, measured
/// perpendicular to it, and projects onto the segment itself.
pub fn on_segment(point: DVec2, a: DVec2, b: DVec2, eps: f64) -> bool {
    let edge = b - a;
    let length = edge.length();
    if length < f64::EPSILON {
        return point.distance(a) < eps;
    }
    let unit = edge / length;
    let rel = point - a;
    let along = rel.dot(unit);
    let across = unit.perp_dot(rel).abs();
    across < eps && (0.0..=length).contains(&along)
}

pub fn on_circle(point: DVec2, center: DVec2, radius: f64, eps: f64) -> bool {
    (point.distance(center) - radius).abs() < eps
}

pub fn in_circle(point: DVec2, center: DVec2, radius: f64, eps: f64) -> bool {
    point.distance(center) < radius + eps
}

/// On the arc's curve and within its swept angle.
pub fn on_arc(point: DVec2, arc: &Arc, eps: f64) -> bool {
    let on_curve = if arc.is_circular() {
        on_circle(point, arc.center, arc.radius(), eps)
    } else {
        on_ellipse(point, arc.center, arc.rx, arc.ry, arc.phi, eps)
    };
    on_curve && arc.contains_angle(arc.angle_of(point))
}

/// Maps `point` into the unit-circle space of the ellipse, returning
/// the normalized distance and the tolerance scaled to match.
fn ellipse_space(point: DVec2, center: DVec2, rx: f64, ry: f64, phi: f64, eps: f64) -> Option<(f64, f64)> {
    let min_radius = rx.abs().min(ry.abs());
    if min_radius < f64::EPSILON {
        return None;
    }
    let (sin, cos) = (-phi).sin_cos();
    let rel = point - center;
    let local = DVec2::new(rel.x * cos - rel.y * sin, rel.x * sin + rel.y * cos);
    let normalized = DVec2::new(local.x / rx, local.y / ry);
    Some((normalized.length(), eps / min_radius))
}

pub fn on_ellipse(point: DVec2, center: DVec2, rx: f64, ry: f64, phi: f64, eps: f64) -> bool {
    ellipse_space(point, center, rx, ry, phi, eps)
        .map(|(dist, eps)| (dist - 1.0).abs() < eps)
        .unwrap_or(false)
}

pub fn in_ellipse(point: DVec2, center: DVec2, rx: f64, ry: f64, phi: f64, eps: f64) -> bool {
    ellipse_space(point, center, rx, ry, phi, eps)
        .map(|(dist, eps)| dist < 1.0 + eps)
        .unwrap_or(false)
}

/// Even-odd crossing-number test. Fewer than three vertices never contain.
pub fn in_polygon(point: DVec2, vertices: &[DVec2]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > point.y) != (vj.y > point.y) {
            let x_cross = vj.x + (point.y - vj.y) / (vi.y - vj.y) * (vi.x - vj.x);
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Within `eps` of any edge; `closed` adds the edge back to the start.
pub fn on_polyline(point: DVec2, vertices: &[DVec2], closed: bool, eps: f64) -> bool {
    match vertices {
        [] => false,
        [only] => point.distance(*only) < eps,
        _ => {
            let open = vertices
                .windows(2)
                .any(|edge| on_segment(point, edge[0], edge[1], eps));
            open || (closed && on_segment(point, vertices[vertices.len() - 1], vertices[0], eps))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_on_segment() {
        let a = DVec2::ZERO;
        let b = DVec2::new(10.0, 0.0);
        assert!(on_segment(DVec2::new(5.0, 0.5), a, b, 1.0));
        assert!(!on_segment(DVec2::new(5.0, 1.5), a, b, 1.0));
        // beyond the end: perpendicular offset is fine, projection is not
        assert!(!on_segment(DVec2::new(11.0, 0.0), a, b, 2.0));
        assert!(on_segment(DVec2::new(0.2, 0.2), a, a, 0.5));
    }

    #[test]
    fn test_circle() {
        let c = DVec2::ZERO;
        assert!(on_circle(DVec2::new(10.0, 0.0), c, 10.0, 1.0));
        assert!(!on_circle(DVec2::ZERO, c, 10.0, 1.0));
        assert!(in_circle(DVec2::ZERO, c, 10.0, 1.0));
        assert!(in_circle(DVec2::new(10.5, 0.0), c, 10.0, 1.0));
        assert!(!in_circle(DVec2::new(11.5, 0.0), c, 10.0, 1.0));
    }

    #[test]
    fn test_on_arc_respects_sweep() {
        let arc = Arc::circle(DVec2::ZERO, 5.0, 0.0, PI / 2.0);
        assert!(on_arc(DVec2::new(0.0, 5.0), &arc, 0.5));
        assert!(on_arc(DVec2::new(3.0, 4.0), &arc, 0.5));
        assert!(!on_arc(DVec2::new(0.0, -5.0), &arc, 0.5));
    }

    #[test]
    fn test_in_polygon_even_odd() {
        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
        ];
        assert!(in_polygon(DVec2::new(5.0, 5.0), &square));
        assert!(!in_polygon(DVec2::new(15.0, 5.0), &square));

        // a self-overlapping star: the pentagon in the middle is outside under even-odd
        let star: Vec<DVec2> = (0..5)
            .map(|i| {
                let a = -PI / 2.0 + i as f64 * 4.0 * PI / 5.0;
                DVec2::new(a.cos(), a.sin()) * 10.0
            })
            .collect();
        assert!(!in_polygon(DVec2::ZERO, &star));
        assert!(in_polygon(DVec2::new(0.0, -8.0), &star));
    }

    #[test]
    fn test_on_polyline() {
        let pts = [DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)];
        assert!(on_polyline(DVec2::new(10.2, 5.0), &pts, false, 0.5));
        assert!(!on_polyline(DVec2::new(5.0, 5.0), &pts, false, 0.5));
        assert!(on_polyline(DVec2::new(5.0, 5.0), &pts, true, 0.5));
    }

    #[test]
    fn test_ellipse() {
        let c = DVec2::new(1.0, 1.0);
        assert!(on_ellipse(DVec2::new(5.0, 1.0), c, 4.0, 2.0, 0.0, 0.1));
        assert!(on_ellipse(DVec2::new(1.0, 3.0), c, 4.0, 2.0, 0.0, 0.1));
        assert!(in_ellipse(DVec2::new(3.0, 1.5), c, 4.0, 2.0, 0.0, 0.0));
        assert!(!in_ellipse(DVec2::new(1.0, 4.0), c, 4.0, 2.0, 0.0, 0.1));
        // rotated a quarter turn the axes swap
        assert!(on_ellipse(DVec2::new(1.0, 5.0), c, 4.0, 2.0, PI / 2.0, 0.1));
    }
}
