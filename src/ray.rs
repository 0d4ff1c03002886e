use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;

/// A ray: an origin point and a direction vector.
///
/// Camera, shadow and bounce rays carry unit directions, so `t` is a
/// world-space distance for them. Rays moved into a shape's object space
/// generally do not.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray4D {
    pub origin: Tuple4D,
    pub direction: Tuple4D,
}

impl Ray4D {
    /// Creates a ray, coercing `origin` to a point and `direction` to a vector.
    pub fn new(mut origin: Tuple4D, mut direction: Tuple4D) -> Ray4D {
        origin.w = 1.0;
        direction.w = 0.0;

        Ray4D { origin, direction }
    }

    /// Creates a unit ray from `from` aimed at `to`, and the distance between
    /// the two.
    ///
    /// Shadow tests compare the hit `t` against that distance.
    pub fn between(from: Tuple4D, to: Tuple4D) -> (Ray4D, f64) {
        let v = to - from;
        (Ray4D::new(from, v.normalize()), v.magnitude())
    }

    /// The point `t` units of `direction` away from the origin.
    pub fn position(&self, t: f64) -> Tuple4D {
        self.origin + (t * self.direction)
    }

    /// Moves the ray into another frame, e.g. through a shape's inverse
    /// transform.
    pub fn transform(&self, m: &Matrix4D) -> Ray4D {
        Ray4D {
            origin: *m * self.origin,
            direction: *m * self.direction,
        }
    }
}

#[test]
fn ray_coerces_origin_and_direction() {
    let r = Ray4D::new(
        Tuple4D::vector(1.0, 2.0, 3.0),
        Tuple4D::point(0.0, 0.0, 1.0)
    );

    assert!(r.origin.is_point());
    assert!(r.direction.is_vector());
}

#[test]
fn ray_position() {
    let r = Ray4D::new(
        Tuple4D::point(2.0, 3.0, 4.0),
        Tuple4D::vector(1.0, 0.0, 0.0)
    );

    assert_eq!(r.position(0.0), Tuple4D::point(2.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Tuple4D::point(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Tuple4D::point(4.5, 3.0, 4.0));
}

#[test]
fn ray_between_points() {
    let (r, distance) = Ray4D::between(
        Tuple4D::point(1.0, 1.0, 1.0),
        Tuple4D::point(1.0, 4.0, 5.0)
    );

    assert_eq!(r.origin, Tuple4D::point(1.0, 1.0, 1.0));
    assert_eq!(r.direction, Tuple4D::vector(0.0, 0.6, 0.8));
    assert!((distance - 5.0).abs() < 1e-9);
    assert_eq!(r.position(distance), Tuple4D::point(1.0, 4.0, 5.0));
}

#[test]
fn ray_into_object_space() {
    let r = Ray4D::new(
        Tuple4D::point(1.0, 2.0, 3.0),
        Tuple4D::vector(0.0, 1.0, 0.0)
    );

    let moved = r.transform(&Matrix4D::translation(3.0, 4.0, 5.0));
    assert_eq!(moved.origin, Tuple4D::point(4.0, 6.0, 8.0));
    assert_eq!(moved.direction, Tuple4D::vector(0.0, 1.0, 0.0));

    // Scaling stretches the direction, so object-space t is not a distance.
    let scaled = r.transform(&Matrix4D::scaling(2.0, 3.0, 4.0));
    assert_eq!(scaled.origin, Tuple4D::point(2.0, 6.0, 12.0));
    assert_eq!(scaled.direction, Tuple4D::vector(0.0, 3.0, 0.0));
}
