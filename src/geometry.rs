//! Closed-form intersections and normals for each primitive.
//!
//! Everything here works in a primitive's own local frame: a unit sphere at
//! the origin, the XZ plane, the cube spanning [-1, 1] on every axis, and
//! the unit cylinder and double-napped cone around the Y axis. Intersections
//! are returned as bare `t` values; `Shape` tags them with itself.

use crate::feq;
use crate::consts::EPSILON;
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;

/// The Y extent of a cylinder or cone and whether its ends are capped.
///
/// The extent is an open interval, so a lateral hit exactly at `minimum` or
/// `maximum` is discarded (the cap reports it instead, if closed).
#[derive(Copy, Clone, Debug)]
pub struct Extent {
    pub minimum: f64,
    pub maximum: f64,
    pub closed: bool,
}

impl Default for Extent {
    fn default() -> Extent {
        Extent {
            minimum: -std::f64::INFINITY,
            maximum: std::f64::INFINITY,
            closed: false,
        }
    }
}

impl PartialEq for Extent {
    fn eq(&self, other: &Extent) -> bool {
        feq(self.minimum, other.minimum)
            && feq(self.maximum, other.maximum)
            && self.closed == other.closed
    }
}

impl Extent {
    pub fn new(minimum: f64, maximum: f64, closed: bool) -> Extent {
        Extent { minimum, maximum, closed }
    }

    fn contains(&self, y: f64) -> bool {
        self.minimum < y && y < self.maximum
    }
}

/// Intersects a ray with the unit sphere.
///
/// A tangent ray still produces two (equal) values.
pub fn intersect_sphere(ray: &Ray4D) -> Vec<f64> {
    // Note that subtracting a point removes the 'w' part of the ray origin.
    let sphere_to_ray = ray.origin - Tuple4D::origin();

    let a = ray.direction.dot(&ray.direction);
    let b = 2.0 * ray.direction.dot(&sphere_to_ray);
    let c = sphere_to_ray.dot(&sphere_to_ray) - 1.0;

    let discriminant = b.powi(2) - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }

    let t1 = (-b - discriminant.sqrt()) / (2.0 * a);
    let t2 = (-b + discriminant.sqrt()) / (2.0 * a);

    vec![t1, t2]
}

pub fn normal_at_sphere(p: Tuple4D) -> Tuple4D {
    p.as_vector().normalize()
}

/// Intersects a ray with the XZ plane.
pub fn intersect_plane(ray: &Ray4D) -> Vec<f64> {
    // Without a Y component, the ray never reaches the plane.
    if ray.direction.y.abs() < EPSILON {
        return Vec::new();
    }

    vec![-ray.origin.y / ray.direction.y]
}

pub fn normal_at_plane(_p: Tuple4D) -> Tuple4D {
    Tuple4D::vector(0.0, 1.0, 0.0)
}

/// Gets the entry and exit offsets along one axis of the unit cube.
///
/// Takes one component of a ray's origin and direction. The smaller `t` is
/// first in the tuple. A ray parallel to the axis' planes either never
/// leaves the slab (origin strictly between the planes) or never enters it;
/// a ray lying in a face plane counts as never entering.
fn check_cube_axis(origin: f64, direction: f64) -> (f64, f64) {
    if direction.abs() < EPSILON {
        return if origin.abs() < 1.0 {
            (-std::f64::INFINITY, std::f64::INFINITY)
        } else {
            (std::f64::INFINITY, std::f64::INFINITY)
        };
    }

    let tmin = (-1.0 - origin) / direction;
    let tmax = ( 1.0 - origin) / direction;

    if tmin > tmax { (tmax, tmin) } else { (tmin, tmax) }
}

/// Intersects a ray with the unit cube using the slab test.
pub fn intersect_cube(ray: &Ray4D) -> Vec<f64> {
    let (xtmin, xtmax) = check_cube_axis(ray.origin.x, ray.direction.x);
    let (ytmin, ytmax) = check_cube_axis(ray.origin.y, ray.direction.y);
    let (ztmin, ztmax) = check_cube_axis(ray.origin.z, ray.direction.z);

    let tmin = xtmin.max(ytmin).max(ztmin);
    let tmax = xtmax.min(ytmax).min(ztmax);

    // The slabs don't overlap, or the whole cube is behind the ray.
    if tmin > tmax || tmax < 0.0 {
        return Vec::new();
    }

    vec![tmin, tmax]
}

pub fn normal_at_cube(p: Tuple4D) -> Tuple4D {
    let xa = p.x.abs();
    let ya = p.y.abs();
    let za = p.z.abs();

    let max_component = xa.max(ya).max(za);
    if max_component == xa {
        Tuple4D::vector(p.x, 0.0, 0.0)
    } else if max_component == ya {
        Tuple4D::vector(0.0, p.y, 0.0)
    } else {
        Tuple4D::vector(0.0, 0.0, p.z)
    }
}

/// Solves `at^2 + bt + c = 0`, smaller root first.
fn solve_quadratic(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    let disc = b.powi(2) - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }

    let t0 = (-b - disc.sqrt()) / (2.0 * a);
    let t1 = (-b + disc.sqrt()) / (2.0 * a);

    if t0 > t1 { Some((t1, t0)) } else { Some((t0, t1)) }
}

/// Appends cap hits at `extent.minimum` and `extent.maximum`.
///
/// `radius` gives the cap radius at a given Y: 1 for a cylinder, |y| for a
/// cone.
fn intersect_caps<F>(ray: &Ray4D, extent: &Extent, radius: F, xs: &mut Vec<f64>)
    where F: Fn(f64) -> f64 {
    // If not closed, or the ray doesn't point anywhere near y, ignore caps.
    if !extent.closed || ray.direction.y.abs() < EPSILON {
        return;
    }

    for &y in [extent.minimum, extent.maximum].iter() {
        let t = (y - ray.origin.y) / ray.direction.y;
        let x = ray.origin.x + t * ray.direction.x;
        let z = ray.origin.z + t * ray.direction.z;

        if x.powi(2) + z.powi(2) <= radius(y).powi(2) {
            xs.push(t);
        }
    }
}

/// Intersects a ray with a cylinder of radius 1 around the Y axis.
pub fn intersect_cylinder(ray: &Ray4D, extent: &Extent) -> Vec<f64> {
    let mut xs = Vec::new();

    let a = ray.direction.x.powi(2) + ray.direction.z.powi(2);

    // A ray parallel to the Y axis can only hit the caps.
    if a >= EPSILON {
        let b = 2.0 * ray.origin.x * ray.direction.x
              + 2.0 * ray.origin.z * ray.direction.z;
        let c = ray.origin.x.powi(2) + ray.origin.z.powi(2) - 1.0;

        match solve_quadratic(a, b, c) {
            Some((t0, t1)) => {
                for &t in [t0, t1].iter() {
                    if extent.contains(ray.origin.y + t * ray.direction.y) {
                        xs.push(t);
                    }
                }
            },

            // Missing the infinite tube means missing the caps too.
            None => return xs,
        }
    }

    intersect_caps(ray, extent, |_| 1.0, &mut xs);
    xs
}

pub fn normal_at_cylinder(p: Tuple4D, extent: &Extent) -> Tuple4D {
    // Square of the distance from the Y axis.
    let dist = p.x.powi(2) + p.z.powi(2);

    if extent.closed && dist < 1.0 && p.y >= extent.maximum - EPSILON {
        Tuple4D::vector(0.0, 1.0, 0.0)
    } else if extent.closed && dist < 1.0 && p.y <= extent.minimum + EPSILON {
        Tuple4D::vector(0.0, -1.0, 0.0)
    } else {
        Tuple4D::vector(p.x, 0.0, p.z)
    }
}

/// Intersects a ray with a double-napped cone around the Y axis.
pub fn intersect_cone(ray: &Ray4D, extent: &Extent) -> Vec<f64> {
    let mut xs = Vec::new();

    let (o, d) = (ray.origin, ray.direction);
    let a = d.x.powi(2) - d.y.powi(2) + d.z.powi(2);
    let b = 2.0 * o.x * d.x - 2.0 * o.y * d.y + 2.0 * o.z * d.z;
    let c = o.x.powi(2) - o.y.powi(2) + o.z.powi(2);

    if a.abs() < EPSILON {
        // Parallel to one nappe: at most one lateral hit, unless b is 0 too.
        if b.abs() >= EPSILON {
            let t = -c / (2.0 * b);
            if extent.contains(o.y + t * d.y) {
                xs.push(t);
            }
        }
    } else if let Some((t0, t1)) = solve_quadratic(a, b, c) {
        for &t in [t0, t1].iter() {
            if extent.contains(o.y + t * d.y) {
                xs.push(t);
            }
        }
    }

    intersect_caps(ray, extent, f64::abs, &mut xs);
    xs
}

pub fn normal_at_cone(p: Tuple4D, extent: &Extent) -> Tuple4D {
    let dist = p.x.powi(2) + p.z.powi(2);

    if extent.closed
        && dist < extent.maximum.powi(2)
        && p.y >= extent.maximum - EPSILON {
        Tuple4D::vector(0.0, 1.0, 0.0)
    } else if extent.closed
        && dist < extent.minimum.powi(2)
        && p.y <= extent.minimum + EPSILON {
        Tuple4D::vector(0.0, -1.0, 0.0)
    } else {
        let mut y = dist.sqrt();
        if p.y > 0.0 {
            y = -y;
        }

        Tuple4D::vector(p.x, y, p.z)
    }
}

#[cfg(test)]
use approx::assert_abs_diff_eq;

#[cfg(test)]
fn ray(origin: (f64, f64, f64), direction: (f64, f64, f64)) -> Ray4D {
    Ray4D::new(
        Tuple4D::point(origin.0, origin.1, origin.2),
        Tuple4D::vector(direction.0, direction.1, direction.2).normalize()
    )
}

#[test]
fn sphere_hits_and_misses() {
    assert_eq!(intersect_sphere(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0))),
        vec![4.0, 6.0]);
    assert_eq!(intersect_sphere(&ray((0.0, 1.0, -5.0), (0.0, 0.0, 1.0))),
        vec![5.0, 5.0]);
    assert_eq!(intersect_sphere(&ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0))),
        vec![-1.0, 1.0]);
    assert!(intersect_sphere(&ray((0.0, 2.0, -5.0), (0.0, 0.0, 1.0))).is_empty());
}

#[test]
fn plane_parallel_and_crossing() {
    assert!(intersect_plane(&ray((0.0, 10.0, 0.0), (0.0, 0.0, 1.0))).is_empty());
    assert!(intersect_plane(&ray((0.0, 0.0, 0.0), (0.0, 0.0, 1.0))).is_empty());
    assert_eq!(intersect_plane(&ray((0.0, 1.0, 0.0), (0.0, -1.0, 0.0))),
        vec![1.0]);
    assert_eq!(intersect_plane(&ray((0.0, -1.0, 0.0), (0.0, 1.0, 0.0))),
        vec![1.0]);
}

#[test]
fn cube_faces() {
    let cases = [
        ((5.0, 0.5, 0.0), (-1.0, 0.0, 0.0), 4.0, 6.0),
        ((-5.0, 0.5, 0.0), (1.0, 0.0, 0.0), 4.0, 6.0),
        ((0.5, 5.0, 0.0), (0.0, -1.0, 0.0), 4.0, 6.0),
        ((0.5, -5.0, 0.0), (0.0, 1.0, 0.0), 4.0, 6.0),
        ((0.5, 0.0, 5.0), (0.0, 0.0, -1.0), 4.0, 6.0),
        ((0.5, 0.0, -5.0), (0.0, 0.0, 1.0), 4.0, 6.0),
        ((0.0, 0.5, 0.0), (0.0, 0.0, 1.0), -1.0, 1.0),
        ((0.0, 0.0, 0.0), (1.0, 0.0, 0.0), -1.0, 1.0),
    ];

    for &(origin, direction, t1, t2) in cases.iter() {
        assert_eq!(intersect_cube(&ray(origin, direction)), vec![t1, t2]);
    }
}

#[test]
fn cube_misses() {
    let cases = [
        ((-2.0, 0.0, 0.0), (0.2673, 0.5345, 0.8018)),
        ((0.0, -2.0, 0.0), (0.8018, 0.2673, 0.5345)),
        ((0.0, 0.0, -2.0), (0.5345, 0.8018, 0.2673)),
        ((2.0, 0.0, 2.0), (0.0, 0.0, -1.0)),
        ((0.0, 2.0, 2.0), (0.0, -1.0, 0.0)),
        ((2.0, 2.0, 0.0), (-1.0, 0.0, 0.0)),
        // Entirely behind the ray.
        ((0.0, 0.0, 5.0), (0.0, 0.0, 1.0)),
        // Sliding along a face or an edge.
        ((1.0, 0.0, -5.0), (0.0, 0.0, 1.0)),
        ((-1.0, 0.5, -5.0), (0.0, 0.0, 1.0)),
        ((1.0, 1.0, -5.0), (0.0, 0.0, 1.0)),
    ];

    for &(origin, direction) in cases.iter() {
        assert!(intersect_cube(&ray(origin, direction)).is_empty());
    }
}

#[test]
fn cube_normals() {
    let cases = [
        ((1.0, 0.5, -0.8), (1.0, 0.0, 0.0)),
        ((-1.0, -0.2, 0.9), (-1.0, 0.0, 0.0)),
        ((-0.4, 1.0, -0.1), (0.0, 1.0, 0.0)),
        ((0.3, -1.0, -0.7), (0.0, -1.0, 0.0)),
        ((-0.6, 0.3, 1.0), (0.0, 0.0, 1.0)),
        ((0.4, 0.4, -1.0), (0.0, 0.0, -1.0)),
        ((1.0, 1.0, 1.0), (1.0, 0.0, 0.0)),
    ];

    for &((px, py, pz), (nx, ny, nz)) in cases.iter() {
        assert_eq!(normal_at_cube(Tuple4D::point(px, py, pz)),
            Tuple4D::vector(nx, ny, nz));
    }
}

#[test]
fn infinite_cylinder() {
    let e = Extent::default();

    assert!(intersect_cylinder(&ray((1.0, 0.0, 0.0), (0.0, 1.0, 0.0)), &e)
        .is_empty());
    assert!(intersect_cylinder(&ray((0.0, 0.0, -5.0), (1.0, 1.0, 1.0)), &e)
        .is_empty());

    assert_eq!(intersect_cylinder(&ray((1.0, 0.0, -5.0), (0.0, 0.0, 1.0)), &e),
        vec![5.0, 5.0]);
    assert_eq!(intersect_cylinder(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)), &e),
        vec![4.0, 6.0]);

    let xs = intersect_cylinder(&ray((0.5, 0.0, -5.0), (0.1, 1.0, 1.0)), &e);
    assert_eq!(xs.len(), 2);
    assert_abs_diff_eq!(xs[0], 6.80798, epsilon = 1e-4);
    assert_abs_diff_eq!(xs[1], 7.08872, epsilon = 1e-4);
}

#[test]
fn truncated_cylinder() {
    let e = Extent::new(1.0, 2.0, false);
    let cases = [
        ((0.0, 1.5, 0.0), (0.1, 1.0, 0.0), 0),
        ((0.0, 3.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 0.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 2.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 1.0, -5.0), (0.0, 0.0, 1.0), 0),
        ((0.0, 1.5, -2.0), (0.0, 0.0, 1.0), 2),
    ];

    for &(origin, direction, count) in cases.iter() {
        assert_eq!(intersect_cylinder(&ray(origin, direction), &e).len(), count);
    }
}

#[test]
fn capped_cylinder() {
    let e = Extent::new(1.0, 2.0, true);
    let cases = [
        ((0.0, 3.0, 0.0), (0.0, -1.0, 0.0)),
        ((0.0, 3.0, -2.0), (0.0, -1.0, 2.0)),
        ((0.0, 4.0, -2.0), (0.0, -1.0, 1.0)),
        ((0.0, 0.0, -2.0), (0.0, 1.0, 2.0)),
        ((0.0, -1.0, -2.0), (0.0, 1.0, 1.0)),
    ];

    for &(origin, direction) in cases.iter() {
        assert_eq!(intersect_cylinder(&ray(origin, direction), &e).len(), 2);
    }
}

#[test]
fn cylinder_normals() {
    let open = Extent::default();
    assert_eq!(normal_at_cylinder(Tuple4D::point(1.0, 0.0, 0.0), &open),
        Tuple4D::vector(1.0, 0.0, 0.0));
    assert_eq!(normal_at_cylinder(Tuple4D::point(0.0, -2.0, 1.0), &open),
        Tuple4D::vector(0.0, 0.0, 1.0));

    let capped = Extent::new(1.0, 2.0, true);
    assert_eq!(normal_at_cylinder(Tuple4D::point(0.0, 1.0, 0.0), &capped),
        Tuple4D::vector(0.0, -1.0, 0.0));
    assert_eq!(normal_at_cylinder(Tuple4D::point(0.5, 1.0, 0.0), &capped),
        Tuple4D::vector(0.0, -1.0, 0.0));
    assert_eq!(normal_at_cylinder(Tuple4D::point(0.0, 2.0, 0.5), &capped),
        Tuple4D::vector(0.0, 1.0, 0.0));
}

#[test]
fn cone_lateral_hits() {
    let e = Extent::default();

    assert_eq!(intersect_cone(&ray((0.0, 0.0, -5.0), (0.0, 0.0, 1.0)), &e),
        vec![5.0, 5.0]);

    let xs = intersect_cone(&ray((0.0, 0.0, -5.0), (1.0, 1.0, 1.0)), &e);
    assert_abs_diff_eq!(xs[0], 8.66025, epsilon = 1e-4);
    assert_abs_diff_eq!(xs[1], 8.66025, epsilon = 1e-4);

    let xs = intersect_cone(&ray((1.0, 1.0, -5.0), (-0.5, -1.0, 1.0)), &e);
    assert_abs_diff_eq!(xs[0], 4.55006, epsilon = 1e-4);
    assert_abs_diff_eq!(xs[1], 49.44994, epsilon = 1e-4);
}

#[test]
fn cone_parallel_to_nappe() {
    let xs = intersect_cone(&ray((0.0, 0.0, -1.0), (0.0, 1.0, 1.0)),
        &Extent::default());

    assert_eq!(xs.len(), 1);
    assert_abs_diff_eq!(xs[0], 0.35355, epsilon = 1e-4);

    // Through the apex along the nappe: no lateral root, only the caps.
    let apex = ray((0.0, 0.0, 0.0), (0.0, 1.0, 1.0));
    assert!(intersect_cone(&apex, &Extent::new(-1.0, 1.0, false)).is_empty());

    let xs = intersect_cone(&apex, &Extent::new(-1.0, 1.0, true));
    assert_eq!(xs.len(), 2);
    assert_abs_diff_eq!(xs[0], -2.0f64.sqrt(), epsilon = 1e-4);
    assert_abs_diff_eq!(xs[1], 2.0f64.sqrt(), epsilon = 1e-4);
}

#[test]
fn capped_cone() {
    let e = Extent::new(-0.5, 0.5, true);
    let cases = [
        ((0.0, 0.0, -5.0), (0.0, 1.0, 0.0), 0),
        ((0.0, 0.0, -0.25), (0.0, 1.0, 1.0), 2),
        ((0.0, 0.0, -0.25), (0.0, 1.0, 0.0), 4),
    ];

    for &(origin, direction, count) in cases.iter() {
        assert_eq!(intersect_cone(&ray(origin, direction), &e).len(), count);
    }

    // The same rays never touch the caps of an open cone.
    let open = Extent::new(-0.5, 0.5, false);
    assert_eq!(intersect_cone(&ray((0.0, 0.0, -0.25), (0.0, 1.0, 0.0)), &open)
        .len(), 2);
}

#[test]
fn cone_normals() {
    let e = Extent::default();

    assert_eq!(normal_at_cone(Tuple4D::point(0.0, 0.0, 0.0), &e),
        Tuple4D::vector(0.0, 0.0, 0.0));
    assert_eq!(normal_at_cone(Tuple4D::point(1.0, 1.0, 1.0), &e),
        Tuple4D::vector(1.0, -(2.0f64.sqrt()), 1.0));
    assert_eq!(normal_at_cone(Tuple4D::point(-1.0, -1.0, 0.0), &e),
        Tuple4D::vector(-1.0, 1.0, 0.0));

    let capped = Extent::new(-1.0, 2.0, true);
    assert_eq!(normal_at_cone(Tuple4D::point(0.5, 2.0, 0.5), &capped),
        Tuple4D::vector(0.0, 1.0, 0.0));
    assert_eq!(normal_at_cone(Tuple4D::point(0.0, -1.0, 0.2), &capped),
        Tuple4D::vector(0.0, -1.0, 0.0));
}
