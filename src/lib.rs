pub mod consts;
pub mod error;

pub mod tuple;
pub mod matrix;
pub mod ray;
pub mod color;

pub mod pattern;
pub mod light;

pub mod geometry;
pub mod shape;
pub mod intersect;
pub mod world;

pub mod camera;
pub mod canvas;
pub mod scene;

pub use error::{ Result, TraceError };

use consts::EPSILON;

/// Approximate floating point equality, used by every value type.
pub fn feq(left: f64, right: f64) -> bool {
    if left == right {
        // Covers matching infinities, e.g. unbounded cylinders.
        return true;
    }

    (left - right).abs() < EPSILON
}
