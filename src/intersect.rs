use std::cmp::Ordering;

use crate::feq;
use crate::consts::EPSILON;
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::shape::{ Shape, CsgOp };
use crate::error::Result;

/// An intersection.
///
/// This structure assumes that some ray produced an intersection. Parameter `t`
/// is analogous to `t` for a ray (the offset from the ray origin), and `what`
/// is the primitive that was hit.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub t: f64,
    pub what: &'a Shape,
}

/// Implements partial equality on an Intersection.
///
/// Two Intersection structures are equal if the offsets `t` of the
/// intersections are equivalent, and if the underlying *pointers* of the
/// intersections are equivalent.
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        feq(self.t, other.t) && std::ptr::eq(self.what, other.what)
    }
}

impl<'a> Intersection<'a> {
    pub fn new(t: f64, what: &'a Shape) -> Intersection<'a> {
        Intersection { t, what }
    }
}

/// A collection of intersections.
///
/// Mostly a wrapper for a vector of `Intersection` objects. Lists built by
/// `aggregate` are sorted by `t`; lists produced by a single primitive may
/// not be.
#[derive(Clone, Debug, Default)]
pub struct Intersections<'a> {
    pub intersections: Vec<Intersection<'a>>,
}

impl<'a> Intersections<'a> {
    /// Creates a new list of intersections.
    pub fn new() -> Intersections<'a> {
        Intersections { intersections: Vec::new() }
    }

    /// Merges several lists into one, sorted by `t`.
    pub fn aggregate(all: Vec<Intersections<'a>>) -> Intersections<'a> {
        let mut merged = Intersections {
            intersections: all.into_iter()
                .flat_map(|is| is.intersections)
                .collect()
        };

        merged.sort();
        merged
    }

    /// Sorts the intersections by `t`.
    ///
    /// The sort is stable, so exactly-equal offsets keep their order.
    pub fn sort(&mut self) {
        self.intersections.sort_by(|a, b|
            a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal)
        );
    }

    /// Finds the visible hit: the intersection with the lowest `t >= 0`.
    ///
    /// Works on unsorted lists. If no hit is registered, this function
    /// returns `None`. Of several exactly-equal offsets, the earliest in the
    /// list wins.
    pub fn hit(&self) -> Option<Intersection<'a>> {
        self.intersections.iter()
            .filter(|i| i.t >= 0.0)
            .fold(None, |best: Option<&Intersection<'a>>, i| match best {
                Some(b) if b.t <= i.t => Some(b),
                _ => Some(i),
            })
            .copied()
    }

    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }
}

/// Decides whether a CSG node keeps a boundary crossing.
///
/// `lhit` says whether the crossing belongs to the left operand; `inl` and
/// `inr` say whether the ray is currently inside the left and right operands
/// (before this crossing is counted).
pub fn intersection_allowed(op: CsgOp, lhit: bool, inl: bool, inr: bool)
    -> bool {
    match op {
        CsgOp::Union => (lhit && !inr) || (!lhit && !inl),
        CsgOp::Intersection => (lhit && inr) || (!lhit && inl),
        CsgOp::Difference => (lhit && !inr) || (!lhit && inl),
    }
}

/// Filters a sorted list of operand crossings down to the CSG's surface.
///
/// Single pass over `xs`, tracking whether the ray is inside each operand.
/// A crossing belongs to the left operand if `left` includes the shape hit.
pub fn filter_intersections<'a>(op: CsgOp, left: &Shape, xs: Intersections<'a>)
    -> Intersections<'a> {
    let mut inl = false;
    let mut inr = false;

    let mut kept = Intersections::new();
    for i in xs.intersections {
        let lhit = left.includes(i.what);

        if intersection_allowed(op, lhit, inl, inr) {
            kept.intersections.push(i);
        }

        if lhit {
            inl = !inl;
        } else {
            inr = !inr;
        }
    }

    kept
}

/// A record for computations associated with an `Intersection`.
///
/// Mostly a superset of an `Intersection`.
#[derive(Clone, Debug)]
pub struct PreComputations<'a> {
    /// The "time" of the ray intersection.
    pub t: f64,

    /// The object being intersected.
    pub obj: &'a Shape,

    /// The point where the intersection occurs.
    pub point: Tuple4D,

    /// A point slightly above the intersected surface. Used to prevent an
    /// object from shadowing itself (this causes "acne").
    pub over_point: Tuple4D,

    /// A point slightly below the intersected surface. Used as the origin of
    /// refracted rays.
    pub under_point: Tuple4D,

    pub eyev: Tuple4D,

    /// The surface normal, flipped to face the eye if needed.
    pub normalv: Tuple4D,

    /// The intersection ray, reflected across the normal.
    pub reflectv: Tuple4D,

    /// Whether the intersection occurs within the object or not.
    pub inside: bool,

    /// The refractive index of the material being exited.
    pub n1: f64,

    /// The refractive index of the material being entered.
    pub n2: f64,
}

impl<'a> PreComputations<'a> {
    /// Prepares shading values for `hit`, one of the sorted intersections
    /// `xs` of ray `r`.
    pub fn new(r: &Ray4D, hit: &Intersection<'a>, xs: &Intersections<'a>)
        -> Result<PreComputations<'a>> {
        let t = hit.t;
        let obj = hit.what;
        let point = r.position(t);
        let eyev = -r.direction;
        let mut normalv = obj.normal_at(point)?;

        let inside = normalv.dot(&eyev) < 0.0;
        if inside {
            normalv = -normalv;
        }

        let over_point = point + normalv * EPSILON;
        let under_point = point - normalv * EPSILON;
        let reflectv = r.direction.reflect(&normalv);

        let (n1, n2) = Self::refractive_indices(hit, xs);

        Ok(PreComputations {
            t, obj,
            point, over_point, under_point,
            eyev, normalv, reflectv,
            inside,
            n1, n2,
        })
    }

    /// Works out the indices on either side of `hit`.
    ///
    /// Walks the intersections in order, keeping a stack of the objects the
    /// ray is currently inside.
    fn refractive_indices(hit: &Intersection<'a>, xs: &Intersections<'a>)
        -> (f64, f64) {
        fn index(containers: &[&Shape]) -> f64 {
            containers.last().map_or(1.0, |s| s.material().refractive_index)
        }

        // Exact match: crossings of one shape can lie within EPSILON of
        // each other (thin shells, tangents).
        let is_hit = |i: &Intersection| {
            i.t == hit.t && std::ptr::eq(i.what, hit.what)
        };

        let mut containers: Vec<&'a Shape> = Vec::new();
        let mut n1 = 1.0;

        for i in xs.intersections.iter() {
            let target = is_hit(i);
            if target {
                n1 = index(&containers);
            }

            match containers.iter().position(|&x| std::ptr::eq(x, i.what)) {
                Some(j) => { containers.remove(j); },
                None => containers.push(i.what),
            }

            if target {
                return (n1, index(&containers));
            }
        }

        (n1, 1.0)
    }

    /// Calculates the reflectance of a hit with Schlick's approximation.
    ///
    /// The reflectance is a number between 0 and 1, representing what fraction
    /// of the light is reflected for the hit.
    pub fn schlick(&self) -> f64 {
        let mut cos = self.eyev.dot(&self.normalv);

        // Total internal reflection can only occur if n1 > n2.
        if self.n1 > self.n2 {
            let n = self.n1 / self.n2;
            let sin2_t = n.powi(2) * (1.0 - cos.powi(2));
            if sin2_t > 1.0 {
                return 1.0;
            }

            cos = (1.0 - sin2_t).sqrt();
        }

        let r0 = ((self.n1 - self.n2) / (self.n1 + self.n2)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos).powi(5)
    }
}

#[cfg(test)]
use crate::matrix::Matrix4D;

#[cfg(test)]
use crate::light::Material;

#[cfg(test)]
use approx::assert_abs_diff_eq;

#[cfg(test)]
fn glass_sphere() -> Shape {
    Shape::sphere().with_material(Material::glass())
}

#[test]
fn hit_with_all_positive() {
    let s = Shape::sphere();
    let i1 = Intersection::new(1.0, &s);
    let i2 = Intersection::new(2.0, &s);
    let is = Intersections { intersections: vec![i2, i1] };

    assert_eq!(is.hit().unwrap(), i1);
}

#[test]
fn hit_with_some_negative() {
    let s = Shape::sphere();
    let i1 = Intersection::new(-1.0, &s);
    let i2 = Intersection::new( 1.0, &s);
    let is = Intersections { intersections: vec![i2, i1] };

    assert_eq!(is.hit().unwrap(), i2);
}

#[test]
fn hit_with_all_negative() {
    let s = Shape::sphere();
    let i1 = Intersection::new(-2.0, &s);
    let i2 = Intersection::new(-1.0, &s);
    let is = Intersections { intersections: vec![i2, i1] };

    assert_eq!(is.hit(), None);
}

#[test]
fn hit_is_lowest_nonnegative() {
    let s = Shape::sphere();
    let i1 = Intersection::new(5.0, &s);
    let i2 = Intersection::new(7.0, &s);
    let i3 = Intersection::new(-3.0, &s);
    let i4 = Intersection::new(2.0, &s);
    let is = Intersections { intersections: vec![i1, i2, i3, i4] };

    assert_eq!(is.hit().unwrap(), i4);

    // Finding the hit leaves the list alone.
    assert_eq!(is.intersections[0], i1);
}

#[test]
fn aggregate_sorts() {
    let s = Shape::sphere();
    let xs = Intersections::aggregate(vec![
        Intersections { intersections: vec![
            Intersection::new(3.0, &s), Intersection::new(-1.0, &s)
        ]},
        Intersections { intersections: vec![Intersection::new(0.5, &s)] },
    ]);

    let ts: Vec<f64> = xs.intersections.iter().map(|i| i.t).collect();
    assert_eq!(ts, vec![-1.0, 0.5, 3.0]);
}

#[test]
fn csg_classification_table() {
    let (u, i, d) = (CsgOp::Union, CsgOp::Intersection, CsgOp::Difference);

    // (op, lhit, inl, inr, allowed)
    let table = [
        (u, true, true, true, false),
        (u, true, true, false, true),
        (u, true, false, true, false),
        (u, true, false, false, true),
        (u, false, true, true, false),
        (u, false, true, false, false),
        (u, false, false, true, true),
        (u, false, false, false, true),

        (i, true, true, true, true),
        (i, true, true, false, false),
        (i, true, false, true, true),
        (i, true, false, false, false),
        (i, false, true, true, true),
        (i, false, true, false, true),
        (i, false, false, true, false),
        (i, false, false, false, false),

        (d, true, true, true, false),
        (d, true, true, false, true),
        (d, true, false, true, false),
        (d, true, false, false, true),
        (d, false, true, true, true),
        (d, false, true, false, true),
        (d, false, false, true, false),
        (d, false, false, false, false),
    ];

    for &(op, lhit, inl, inr, allowed) in table.iter() {
        assert_eq!(intersection_allowed(op, lhit, inl, inr), allowed,
            "{:?} lhit={} inl={} inr={}", op, lhit, inl, inr);
    }
}

#[test]
fn filtering_csg_intersections() {
    let s1 = Shape::sphere();
    let s2 = Shape::cube();

    let cases = [
        (CsgOp::Union, 0, 3),
        (CsgOp::Intersection, 1, 2),
        (CsgOp::Difference, 0, 1),
    ];

    for &(op, x0, x1) in cases.iter() {
        let xs = Intersections { intersections: vec![
            Intersection::new(1.0, &s1),
            Intersection::new(2.0, &s2),
            Intersection::new(3.0, &s1),
            Intersection::new(4.0, &s2),
        ]};
        let expected = [xs.intersections[x0], xs.intersections[x1]];

        let result = filter_intersections(op, &s1, xs);
        assert_eq!(result.len(), 2);
        assert_eq!(result.intersections[0], expected[0]);
        assert_eq!(result.intersections[1], expected[1]);
    }
}

#[test]
fn precompute_outside_and_inside() {
    let s = Shape::sphere();

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let i = Intersection::new(4.0, &s);
    let comps = PreComputations::new(&r, &i, &Intersections {
        intersections: vec![i]
    }).unwrap();

    assert!(std::ptr::eq(comps.obj, &s));
    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, -1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
    assert!(!comps.inside);

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let i = Intersection::new(1.0, &s);
    let comps = PreComputations::new(&r, &i, &Intersections {
        intersections: vec![i]
    }).unwrap();

    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, 1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
    assert!(comps.inside);
}

#[test]
fn over_and_under_points() {
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let s = glass_sphere().with_transform(Matrix4D::translation(0.0, 0.0, 1.0));
    let i = Intersection::new(5.0, &s);
    let comps = PreComputations::new(&r, &i, &Intersections {
        intersections: vec![i]
    }).unwrap();

    assert!(comps.over_point.z < -EPSILON / 2.0);
    assert!(comps.point.z > comps.over_point.z);
    assert!(comps.under_point.z > EPSILON / 2.0);
    assert!(comps.point.z < comps.under_point.z);
}

#[test]
fn precompute_reflection_vector() {
    let s = Shape::plane();
    let r2 = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(
        Tuple4D::point(0.0, 1.0, -1.0), Tuple4D::vector(0.0, -r2, r2)
    );
    let i = Intersection::new(2.0f64.sqrt(), &s);
    let comps = PreComputations::new(&r, &i, &Intersections {
        intersections: vec![i]
    }).unwrap();

    assert_eq!(comps.reflectv, Tuple4D::vector(0.0, r2, r2));
}

#[test]
fn refractive_indices_at_each_crossing() {
    let a = glass_sphere()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0))
        .replace("material", Material::glass().replace("refractive_index", 1.5)
            .unwrap()).unwrap();
    let b = glass_sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, -0.25))
        .with_material(Material { refractive_index: 2.0, ..Material::glass() });
    let c = glass_sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 0.25))
        .with_material(Material { refractive_index: 2.5, ..Material::glass() });

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -4.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let xs = Intersections { intersections: vec![
        Intersection::new(2.0, &a),
        Intersection::new(2.75, &b),
        Intersection::new(3.25, &c),
        Intersection::new(4.75, &b),
        Intersection::new(5.25, &c),
        Intersection::new(6.0, &a),
    ]};

    let expected = [
        (1.0, 1.5), (1.5, 2.0), (2.0, 2.5), (2.5, 2.5), (2.5, 1.5), (1.5, 1.0)
    ];

    for (i, &(n1, n2)) in xs.intersections.iter().zip(expected.iter()) {
        let comps = PreComputations::new(&r, i, &xs).unwrap();
        assert_eq!(comps.n1, n1);
        assert_eq!(comps.n2, n2);
    }
}

#[test]
fn refractive_indices_across_a_thin_shell() {
    let s = glass_sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -2.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );

    // Entry and exit closer together than EPSILON.
    let xs = Intersections { intersections: vec![
        Intersection::new(1.0, &s),
        Intersection::new(1.00005, &s),
    ]};

    let entry = PreComputations::new(&r, &xs.intersections[0], &xs).unwrap();
    assert_eq!((entry.n1, entry.n2), (1.0, 1.5));

    let exit = PreComputations::new(&r, &xs.intersections[1], &xs).unwrap();
    assert_eq!((exit.n1, exit.n2), (1.5, 1.0));
}

#[test]
fn schlick_total_internal_reflection() {
    let s = glass_sphere();
    let r2 = 2.0f64.sqrt() / 2.0;
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, r2), Tuple4D::vector(0.0, 1.0, 0.0)
    );
    let xs = Intersections { intersections: vec![
        Intersection::new(-r2, &s), Intersection::new(r2, &s)
    ]};

    let comps = PreComputations::new(&r, &xs.intersections[1], &xs).unwrap();
    assert_eq!(comps.schlick(), 1.0);
}

#[test]
fn schlick_perpendicular_and_small_angle() {
    let s = glass_sphere();

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 1.0, 0.0)
    );
    let xs = Intersections { intersections: vec![
        Intersection::new(-1.0, &s), Intersection::new(1.0, &s)
    ]};
    let comps = PreComputations::new(&r, &xs.intersections[1], &xs).unwrap();
    assert_abs_diff_eq!(comps.schlick(), 0.04, epsilon = 1e-4);

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.99, -2.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let xs = Intersections { intersections: vec![
        Intersection::new(1.8589, &s)
    ]};
    let comps = PreComputations::new(&r, &xs.intersections[0], &xs).unwrap();
    assert_abs_diff_eq!(comps.schlick(), 0.48873, epsilon = 1e-4);
}
