//! Centripetal Catmull-Rom fitting.
//!
//! Produces one cubic Bezier per consecutive pair of input points. The
//! tangents are weighted by chord lengths, which keeps the curve free of
//! loops and cusps on unevenly spaced points.

use glam::DVec2;

/// Chord lengths are floored at this value so coincident points never
/// divide by zero.
pub const CHORD_EPS: f64 = 1e-9;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CubicSegment {
    pub from: DVec2,
    pub ctrl1: DVec2,
    pub ctrl2: DVec2,
    pub to: DVec2,
}

impl CubicSegment {
    pub fn point_at(&self, t: f64) -> DVec2 {
        let mt = 1.0 - t;
        self.from * (mt * mt * mt)
            + self.ctrl1 * (3.0 * mt * mt * t)
            + self.ctrl2 * (3.0 * mt * t * t)
            + self.to * (t * t * t)
    }

    /// Samples `steps + 1` points along the curve, endpoints included.
    pub fn flatten(&self, steps: usize) -> Vec<DVec2> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| self.point_at(i as f64 / steps as f64))
            .collect()
    }
}

fn chord(a: DVec2, b: DVec2) -> f64 {
    a.distance(b).max(CHORD_EPS)
}

/// Fits the segment `p2 -> p3` given its neighbours `p1` and `p4`.
fn segment(p1: DVec2, p2: DVec2, p3: DVec2, p4: DVec2) -> CubicSegment {
    let d1 = chord(p1, p2);
    let d2 = chord(p2, p3);
    let d3 = chord(p3, p4);
    let r12 = (d1 * d2).sqrt();
    let r23 = (d2 * d3).sqrt();

    let ctrl1 = (p1 * -d2 + p2 * (2.0 * d1 + 3.0 * r12 + d2) + p3 * d1) / (3.0 * (d1 + r12));
    let ctrl2 = (p2 * d3 + p3 * (2.0 * d3 + 3.0 * r23 + d2) - p4 * d2) / (3.0 * (d3 + r23));

    CubicSegment {
        from: p2,
        ctrl1,
        ctrl2,
        to: p3,
    }
}

/// Fits a centripetal Catmull-Rom spline through `points`.
///
/// Open curves get `n - 1` segments; their ends use a virtual neighbour
/// mirrored across the first/last point. Closed curves get `n` segments
/// and wrap around. Fewer than two points yield no segments.
pub fn catmull_rom(points: &[DVec2], closed: bool) -> Vec<CubicSegment> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    if closed {
        return (0..n)
            .map(|i| {
                segment(
                    points[(i + n - 1) % n],
                    points[i],
                    points[(i + 1) % n],
                    points[(i + 2) % n],
                )
            })
            .collect();
    }

    (0..n - 1)
        .map(|i| {
            let before = if i == 0 {
                points[0] * 2.0 - points[1]
            } else {
                points[i - 1]
            };
            let after = if i + 2 < n {
                points[i + 2]
            } else {
                points[n - 1] * 2.0 - points[n - 2]
            };
            segment(before, points[i], points[i + 1], after)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_interpolates_every_point() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 2..12 {
            let points: Vec<DVec2> = (0..n)
                .map(|_| DVec2::new(rng.random_range(-50.0..50.0), rng.random_range(-50.0..50.0)))
                .collect();
            let segments = catmull_rom(&points, false);
            assert_eq!(segments.len(), n - 1);
            for (i, seg) in segments.iter().enumerate() {
                assert_eq!(seg.from, points[i]);
                assert_eq!(seg.to, points[i + 1]);
            }
        }
    }

    #[test]
    fn test_closed_wraps_around() {
        let points = [DVec2::ZERO, DVec2::new(10.0, 0.0), DVec2::new(5.0, 8.0)];
        let segments = catmull_rom(&points, true);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].from, points[2]);
        assert_eq!(segments[2].to, points[0]);
    }

    #[test]
    fn test_uniform_spacing_matches_catmull_rom() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(3.0, 0.0),
        ];
        let segments = catmull_rom(&points, false);
        // equal chords give the uniform tangent (p3 - p1) / 6
        assert!((segments[1].ctrl1 - DVec2::new(1.0 + 2.0 / 6.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_coincident_points_stay_finite() {
        let points = [
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(4.0, 2.0),
            DVec2::new(4.0, 2.0),
        ];
        for closed in [false, true] {
            for seg in catmull_rom(&points, closed) {
                for p in [seg.ctrl1, seg.ctrl2] {
                    assert!(p.is_finite(), "non-finite control point {p:?}");
                }
            }
        }
    }

    #[test]
    fn test_single_point_yields_nothing() {
        assert!(catmull_rom(&[DVec2::ONE], false).is_empty());
    }

    #[test]
    fn test_flatten_endpoints() {
        let seg = CubicSegment {
            from: DVec2::ZERO,
            ctrl1: DVec2::new(1.0, 2.0),
            ctrl2: DVec2::new(3.0, 2.0),
            to: DVec2::new(4.0, 0.0),
        };
        let samples = seg.flatten(8);
        assert_eq!(samples.len(), 9);
        assert_eq!(samples[0], seg.from);
        assert_eq!(samples[8], seg.to);
    }
}
