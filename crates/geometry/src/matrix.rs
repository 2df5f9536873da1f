//! 2x3 affine matrices in SVG order.
//!
//! A matrix `[a, b, c, d, e, f]` maps `(x, y)` to
//! `(a*x + c*y + e, b*x + d*y + f)`.

use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// Determinants below this are treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Rotation by `w` radians.
    pub fn rotate(w: f64) -> Self {
        let (sin, cos) = w.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Translation, rotation and uniform scale, applied to child
    /// coordinates in the order scale, rotate, translate.
    pub fn from_trs(x: f64, y: f64, w: f64, scl: f64) -> Self {
        let (sin, cos) = w.sin_cos();
        Self::new(scl * cos, scl * sin, -scl * sin, scl * cos, x, y)
    }

    /// Compose `self` (parent) with `child`: child coordinates are mapped
    /// through `child` first, then through `self`.
    pub fn compose(&self, child: &Matrix) -> Matrix {
        let p = self;
        let c = child;
        Matrix {
            a: p.a * c.a + p.c * c.b,
            b: p.b * c.a + p.d * c.b,
            c: p.a * c.c + p.c * c.d,
            d: p.b * c.c + p.d * c.d,
            e: p.a * c.e + p.c * c.f + p.e,
            f: p.b * c.e + p.d * c.f + p.f,
        }
    }

    pub fn apply(&self, point: DVec2) -> DVec2 {
        DVec2::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    /// Applies only the linear part, for directions and deltas.
    pub fn apply_vector(&self, vector: DVec2) -> DVec2 {
        DVec2::new(
            self.a * vector.x + self.c * vector.y,
            self.b * vector.x + self.d * vector.y,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Geometric mean of the axis scales, used to convert device-space
    /// tolerances into local space.
    pub fn scale_factor(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Returns `None` for singular matrices.
    pub fn inverse(&self) -> Option<Matrix> {
        if self.determinant().abs() < SINGULAR_EPS {
            return None;
        }
        Some(DAffine2::from(*self).inverse().into())
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(l, r)| (l - r).abs() <= tolerance)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl From<[f64; 6]> for Matrix {
    fn from(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }
}

impl From<Matrix> for DAffine2 {
    fn from(m: Matrix) -> Self {
        DAffine2::from_cols_array(&m.to_array())
    }
}

impl From<DAffine2> for Matrix {
    fn from(affine: DAffine2) -> Self {
        Matrix::from(affine.to_cols_array())
    }
}
