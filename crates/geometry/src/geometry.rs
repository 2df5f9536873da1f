//! # Geometry kernel for quill
//!
//! Everything numerical the drawing kernel relies on lives here:
//! affine matrices, the uniform point accessor, endpoint-to-center arc
//! parameterization, centripetal Catmull-Rom fitting and the
//! epsilon-parameterized hit-test primitives.
//!
//! All math is done in `f64` on [`glam::DVec2`].

pub mod arc;
pub mod hit;
pub mod matrix;
pub mod points;
pub mod spline;

pub use arc::{arc_from_endpoints, elliptical_arc_from_endpoints, Arc, ArcPath, SWEEP_EPS};
pub use glam::DVec2;
pub use matrix::Matrix;
pub use points::{Points, XY};
pub use spline::{catmull_rom, CubicSegment, CHORD_EPS};
