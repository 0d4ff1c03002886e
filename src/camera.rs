use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::world::World;
use crate::canvas::Canvas;
use crate::error::Result;

/// A camera record for generating a canvas.
///
/// This record gives a "frame" of the world. Based on camera parameters,
/// different perspectives can be produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Camera {
    /// The horizontal size of the resultant canvas.
    pub hsize: usize,

    /// The vertical size of the resultant canvas.
    pub vsize: usize,

    pub half_width: f64,
    pub half_height: f64,
    pub pixel_size: f64,

    /// The angle describing "how much" the camera can see.
    pub field_of_view: f64,

    /// A matrix describing how the world should be oriented relative to the
    /// camera (typically a view transformation).
    pub transform: Matrix4D,
}

impl Camera {
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64,
        transform: Matrix4D) -> Camera {
        let half_view = (field_of_view / 2.0).tan();
        let aspect = (hsize as f64) / (vsize as f64);

        let (half_width, half_height) = if aspect >= 1.0 {
            (half_view, half_view / aspect)
        } else {
            (half_view * aspect, half_view)
        };

        let pixel_size = half_width * 2.0 / (hsize as f64);
        Camera {
            hsize,
            vsize,
            half_width,
            half_height,
            pixel_size,
            field_of_view,
            transform,
        }
    }

    /// Returns the ray from the camera through the center of a pixel.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Result<Ray4D> {
        Ok(self.ray_through(&self.transform.inverse()?, px, py))
    }

    fn ray_through(&self, inverse: &Matrix4D, px: usize, py: usize) -> Ray4D {
        // Offsets from the edge of the canvas to the pixel's center
        let xoffset = (px as f64 + 0.5) * self.pixel_size;
        let yoffset = (py as f64 + 0.5) * self.pixel_size;

        // The untransformed coordinates of the pixel; the canvas sits at z = -1
        let world_x = self.half_width - xoffset;
        let world_y = self.half_height - yoffset;

        let pixel = *inverse * Tuple4D::point(world_x, world_y, -1.0);
        let origin = *inverse * Tuple4D::origin();

        Ray4D::between(origin, pixel).0
    }

    /// Renders a world onto a new canvas.
    ///
    /// Rows are traced in parallel on the current `rayon` pool. `depth` is
    /// the reflection/refraction budget of every camera ray.
    pub fn render(&self, world: &World, depth: usize) -> Result<Canvas> {
        let inverse = self.transform.inverse()?;
        let started = Instant::now();

        info!(width = self.hsize, height = self.vsize, depth, "rendering");

        let rows = (0..self.vsize)
            .into_par_iter()
            .map(|y| {
                (0..self.hsize)
                    .map(|x| world.color_at(&self.ray_through(&inverse, x, y), depth))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        info!(elapsed = ?started.elapsed(), "render finished");
        Ok(Canvas::from_rows(self.hsize, rows))
    }
}

#[cfg(test)]
use std::f64::consts::PI;

#[test]
fn pixel_size_for_canvases() {
    let horizontal = Camera::new(200, 125, PI / 2.0, Matrix4D::identity());
    let vertical = Camera::new(125, 200, PI / 2.0, Matrix4D::identity());

    assert!((horizontal.pixel_size - 0.01).abs() < 1e-4);
    assert!((vertical.pixel_size - 0.01).abs() < 1e-4);
}

#[test]
fn ray_through_center() {
    let c = Camera::new(201, 101, PI / 2.0, Matrix4D::identity());
    let r = c.ray_for_pixel(100, 50).unwrap();

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corner() {
    let c = Camera::new(201, 101, PI / 2.0, Matrix4D::identity());
    let r = c.ray_for_pixel(0, 0).unwrap();

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.66519, 0.33259, -0.66851));
}

#[test]
fn ray_when_camera_transformed() {
    let c = Camera::new(201, 101, PI / 2.0,
        Matrix4D::rotation_y(PI / 4.0) * Matrix4D::translation(0.0, -2.0, 5.0));
    let r = c.ray_for_pixel(100, 50).unwrap();

    assert_eq!(r.origin, Tuple4D::point(0.0, 2.0, -5.0));
    assert_eq!(r.direction,
        Tuple4D::vector(2.0f64.sqrt() / 2.0, 0.0, -(2.0f64.sqrt() / 2.0)));
}

#[test]
fn render_world_with_camera() {
    use crate::color::Color;

    let w = World::default();

    let from = Tuple4D::point(0.0, 0.0, -5.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);
    let c = Camera::new(11, 11, PI / 2.0, Matrix4D::view_transform(from, to, up));

    let image = c.render(&w, 5).unwrap();
    assert_eq!(image.read_pixel(5, 5).unwrap(),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn singular_camera_transform_fails() {
    let c = Camera::new(11, 11, PI / 2.0, Matrix4D::scaling(0.0, 1.0, 1.0));
    assert!(c.render(&World::default(), 5).is_err());
}
