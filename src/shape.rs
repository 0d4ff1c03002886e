use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::light::Material;
use crate::matrix::Matrix4D;
use crate::geometry::{ self, Extent };
use crate::intersect::{ Intersection, Intersections, filter_intersections };
use crate::error::{ Result, TraceError };

/// The boolean operation a CSG node applies to its two operands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CsgOp {
    Union,
    Intersection,
    Difference,
}

#[derive(Debug, Clone)]
pub enum ShapeType {
    /// A shape which is never hit and whose normal is the local point itself.
    /// Mostly for testing coordinate conversions.
    Test,

    /// A unit sphere with its center at the object-space origin.
    Sphere,

    /// The XZ plane, with its normal pointing up along Y.
    Plane,

    /// A 2-by-2-by-2 cube with its center at the object-space origin.
    Cube,

    /// A cylinder of radius 1 around the Y axis.
    Cylinder(Extent),

    /// A double-napped cone around the Y axis, apex at the origin.
    Cone(Extent),

    /// A group of shapes. Can include other groups of shapes.
    Group(Vec<Shape>),

    /// A boolean combination of a left and a right shape.
    Csg(CsgOp, Box<Shape>, Box<Shape>),
}

/// Checks that two ShapeTypes are equal.
///
/// Primitive parameters are compared approximately; groups and CSG nodes are
/// compared child by child, recursively.
impl PartialEq for ShapeType {
    fn eq(&self, other: &Self) -> bool {
        use ShapeType::*;
        match (self, other) {
            (Test, Test) => true,
            (Sphere, Sphere) => true,
            (Plane, Plane) => true,
            (Cube, Cube) => true,
            (Cylinder(l), Cylinder(r)) => l == r,
            (Cone(l), Cone(r)) => l == r,
            (Group(l), Group(r)) => l == r,
            (Csg(lop, ll, lr), Csg(rop, rl, rr))
                => lop == rop && ll == rl && lr == rr,
            _ => false,
        }
    }
}

/// A value handed to `Shape::replace`.
#[derive(Clone, Debug)]
pub enum ShapeValue {
    Transform(Matrix4D),
    Material(Material),
    Number(f64),
    Flag(bool),
}

impl From<Matrix4D> for ShapeValue {
    fn from(m: Matrix4D) -> ShapeValue {
        ShapeValue::Transform(m)
    }
}

impl From<Material> for ShapeValue {
    fn from(m: Material) -> ShapeValue {
        ShapeValue::Material(m)
    }
}

impl From<f64> for ShapeValue {
    fn from(n: f64) -> ShapeValue {
        ShapeValue::Number(n)
    }
}

impl From<bool> for ShapeValue {
    fn from(b: bool) -> ShapeValue {
        ShapeValue::Flag(b)
    }
}

/// A shape in a scene.
///
/// Shapes are immutable values. Every update (`with_transform`,
/// `with_material`, `replace`) returns a new shape.
///
/// Shapes nested in groups or CSG nodes remember the accumulated transform of
/// every enclosing composite (`parent`). It is only used to move points and
/// normals between world and object space, and is recomputed whenever a
/// composite is built or re-transformed.
#[derive(Debug, Clone)]
pub struct Shape {
    ty: ShapeType,
    material: Material,
    transform: Matrix4D,

    parent: Option<Matrix4D>,

    // Cached inverses of `transform` and of `parent * transform`. `None` when
    // the matrix is singular; the error is rebuilt when the inverse is used.
    inverse: Option<Matrix4D>,
    world_inverse: Option<Matrix4D>,
}

impl Default for Shape {
    fn default() -> Shape {
        Shape::new(ShapeType::Test)
    }
}

/// Checks that two Shapes are equal.
///
/// Note that the parent frame is not checked for equality; the same shape can
/// sit in different groups.
impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.transform == other.transform
            && self.material == other.material
    }
}

impl Shape {
    fn new(ty: ShapeType) -> Shape {
        let identity = Matrix4D::identity();

        let mut shape = Shape {
            ty,
            material: Default::default(),
            transform: identity,
            parent: None,
            inverse: Some(identity),
            world_inverse: Some(identity),
        };

        shape.rebind(None);
        shape
    }

    pub fn test() -> Shape {
        Shape::new(ShapeType::Test)
    }

    /// Creates a unit sphere with identity transform and default material.
    pub fn sphere() -> Shape {
        Shape::new(ShapeType::Sphere)
    }

    pub fn plane() -> Shape {
        Shape::new(ShapeType::Plane)
    }

    pub fn cube() -> Shape {
        Shape::new(ShapeType::Cube)
    }

    /// Creates an infinitely long cylinder with no end caps.
    pub fn cylinder() -> Shape {
        Shape::new(ShapeType::Cylinder(Extent::default()))
    }

    /// Creates a cylinder cut off at `minimum` and `maximum`, without caps.
    pub fn bounded_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeType::Cylinder(Extent::new(minimum, maximum, false)))
    }

    /// Creates a cylinder cut off at `minimum` and `maximum`, with caps.
    pub fn capped_cylinder(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeType::Cylinder(Extent::new(minimum, maximum, true)))
    }

    /// Creates an infinite double-napped cone with no end caps.
    pub fn cone() -> Shape {
        Shape::new(ShapeType::Cone(Extent::default()))
    }

    pub fn bounded_cone(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeType::Cone(Extent::new(minimum, maximum, false)))
    }

    pub fn capped_cone(minimum: f64, maximum: f64) -> Shape {
        Shape::new(ShapeType::Cone(Extent::new(minimum, maximum, true)))
    }

    /// Creates a group holding `children` (possibly other groups).
    ///
    /// Every descendant is rebound to the group's frame.
    pub fn group(children: Vec<Shape>) -> Shape {
        Shape::new(ShapeType::Group(children))
    }

    /// Creates a CSG node combining `left` and `right` with `op`.
    pub fn csg(op: CsgOp, left: Shape, right: Shape) -> Shape {
        Shape::new(ShapeType::Csg(op, Box::new(left), Box::new(right)))
    }

    pub fn ty(&self) -> &ShapeType {
        &self.ty
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// The accumulated transform of every enclosing group or CSG node.
    pub fn parent(&self) -> Option<&Matrix4D> {
        self.parent.as_ref()
    }

    /// Returns the children of a group.
    pub fn children(&self) -> Option<&[Shape]> {
        match self.ty {
            ShapeType::Group(ref children) => Some(children),
            _ => None,
        }
    }

    /// Returns the operation and operands of a CSG node.
    pub fn operands(&self) -> Option<(CsgOp, &Shape, &Shape)> {
        match self.ty {
            ShapeType::Csg(op, ref left, ref right) => Some((op, left, right)),
            _ => None,
        }
    }

    /// Returns a copy of this shape with a different transform.
    ///
    /// For groups and CSG nodes the new transform is propagated to every
    /// descendant's parent frame.
    pub fn with_transform(&self, transform: Matrix4D) -> Shape {
        let mut shape = self.clone();
        shape.transform = transform;
        shape.inverse = transform.inverse().ok();
        shape.rebind(self.parent);
        shape
    }

    pub fn with_material(&self, material: Material) -> Shape {
        Shape { material, ..self.clone() }
    }

    /// Returns a copy of this shape with one field replaced, by name.
    ///
    /// Every shape has `"transform"` and `"material"`. Cylinders and cones
    /// also have `"minimum"`, `"maximum"` and `"closed"`.
    pub fn replace<V: Into<ShapeValue>>(&self, field: &str, value: V)
        -> Result<Shape> {
        let value = value.into();
        let mismatch = |expected| TraceError::FieldType {
            field: field.to_string(), expected
        };

        match field {
            "transform" => match value {
                ShapeValue::Transform(m) => return Ok(self.with_transform(m)),
                _ => return Err(mismatch("a matrix")),
            },
            "material" => match value {
                ShapeValue::Material(m) => return Ok(self.with_material(m)),
                _ => return Err(mismatch("a material")),
            },
            _ => (),
        }

        let mut extent = match self.ty {
            ShapeType::Cylinder(e) | ShapeType::Cone(e) => e,
            _ => return Err(TraceError::UnknownField(field.to_string())),
        };

        match (field, value) {
            ("minimum", ShapeValue::Number(n)) => extent.minimum = n,
            ("maximum", ShapeValue::Number(n)) => extent.maximum = n,
            ("closed", ShapeValue::Flag(b)) => extent.closed = b,
            ("minimum", _) | ("maximum", _) => return Err(mismatch("a number")),
            ("closed", _) => return Err(mismatch("a boolean")),
            _ => return Err(TraceError::UnknownField(field.to_string())),
        }

        let ty = match self.ty {
            ShapeType::Cone(_) => ShapeType::Cone(extent),
            _ => ShapeType::Cylinder(extent),
        };

        Ok(Shape { ty, ..self.clone() })
    }

    /// Deduces whether a shape includes another shape.
    ///
    /// Inclusion is by identity: `other` must be this very shape or live
    /// somewhere in its tree. Structurally equal copies elsewhere (say, the
    /// same sphere in both operands of a CSG node) are not included.
    pub fn includes(&self, other: &Shape) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        match self.ty {
            ShapeType::Group(ref children)
                => children.iter().any(|c| c.includes(other)),
            ShapeType::Csg(_, ref left, ref right)
                => left.includes(other) || right.includes(other),
            _ => false,
        }
    }

    /// Sets the parent frame of this shape and propagates it downwards.
    ///
    /// The parent frame of a shape is the product of every enclosing
    /// composite's transform. For example:
    ///
    /// ```text
    /// Group(transform: A)
    ///     > Group(transform: B, parent: A)
    ///         > Cube(transform: C, parent: AB)
    /// ```
    ///
    /// Where `>` can be read as "parent of."
    fn rebind(&mut self, parent: Option<Matrix4D>) {
        self.parent = parent;
        self.world_inverse = self.world_transform().inverse().ok();

        let frame = self.world_transform();
        match self.ty {
            ShapeType::Group(ref mut children) => {
                for child in children.iter_mut() {
                    child.rebind(Some(frame));
                }
            },

            ShapeType::Csg(_, ref mut left, ref mut right) => {
                left.rebind(Some(frame));
                right.rebind(Some(frame));
            },

            _ => (),
        }
    }

    /// The transform from object space all the way to world space.
    pub fn world_transform(&self) -> Matrix4D {
        match self.parent {
            Some(parent) => parent * self.transform,
            None => self.transform,
        }
    }

    fn inverse(&self) -> Result<Matrix4D> {
        match self.inverse {
            Some(inv) => Ok(inv),
            None => self.transform.inverse(),
        }
    }

    fn world_inverse(&self) -> Result<Matrix4D> {
        match self.world_inverse {
            Some(inv) => Ok(inv),
            None => self.world_transform().inverse(),
        }
    }

    /// Moves a ray from the enclosing frame into this shape's object space.
    pub fn to_local_ray(&self, ray: &Ray4D) -> Result<Ray4D> {
        Ok(ray.transform(&self.inverse()?))
    }

    /// Converts a point from world to object space, through every parent.
    pub fn world_to_object(&self, point: Tuple4D) -> Result<Tuple4D> {
        Ok(self.world_inverse()? * point)
    }

    /// Converts a normal from object to world space, through every parent.
    ///
    /// Uses the inverse transpose so non-uniform scaling keeps the normal
    /// perpendicular to the surface.
    pub fn normal_to_world(&self, normal: Tuple4D) -> Result<Tuple4D> {
        let mut normal = self.world_inverse()?.transposition() * normal;
        normal.w = 0.0;

        Ok(normal.normalize())
    }

    /// Intersects a ray with this shape.
    ///
    /// The ray is given in the frame enclosing the shape (world space for
    /// top-level shapes) and moved into object space first.
    pub fn intersect(&self, ray: &Ray4D) -> Result<Intersections> {
        let local = self.to_local_ray(ray)?;
        self.local_intersect(&local)
    }

    /// Intersects a ray already expressed in this shape's object space.
    pub fn local_intersect(&self, ray: &Ray4D) -> Result<Intersections> {
        let ts = match self.ty {
            ShapeType::Test => Vec::new(),
            ShapeType::Sphere => geometry::intersect_sphere(ray),
            ShapeType::Plane => geometry::intersect_plane(ray),
            ShapeType::Cube => geometry::intersect_cube(ray),
            ShapeType::Cylinder(ref e) => geometry::intersect_cylinder(ray, e),
            ShapeType::Cone(ref e) => geometry::intersect_cone(ray, e),

            ShapeType::Group(ref children) => {
                let all = children.iter()
                    .map(|child| child.intersect(ray))
                    .collect::<Result<Vec<_>>>()?;

                return Ok(Intersections::aggregate(all));
            },

            ShapeType::Csg(op, ref left, ref right) => {
                let xs = Intersections::aggregate(vec![
                    left.intersect(ray)?,
                    right.intersect(ray)?,
                ]);

                return Ok(filter_intersections(op, left, xs));
            },
        };

        Ok(Intersections {
            intersections: ts.into_iter()
                .map(|t| Intersection::new(t, self))
                .collect()
        })
    }

    /// Obtain the normal vector at a point in object space.
    ///
    /// Groups and CSG nodes are never hit themselves, so asking them for a
    /// normal is an error.
    pub fn local_normal_at(&self, p: Tuple4D) -> Result<Tuple4D> {
        match self.ty {
            ShapeType::Test => Ok(p.as_vector()),
            ShapeType::Sphere => Ok(geometry::normal_at_sphere(p)),
            ShapeType::Plane => Ok(geometry::normal_at_plane(p)),
            ShapeType::Cube => Ok(geometry::normal_at_cube(p)),
            ShapeType::Cylinder(ref e) => Ok(geometry::normal_at_cylinder(p, e)),
            ShapeType::Cone(ref e) => Ok(geometry::normal_at_cone(p, e)),
            ShapeType::Group(_) | ShapeType::Csg(..)
                => Err(TraceError::CompositeNormal),
        }
    }

    /// Obtain the world-space normal vector at a world-space point.
    pub fn normal_at(&self, world_point: Tuple4D) -> Result<Tuple4D> {
        let local_point = self.world_to_object(world_point)?;
        let local_normal = self.local_normal_at(local_point)?;
        self.normal_to_world(local_normal)
    }
}

#[cfg(test)]
use std::f64::consts::PI;

#[cfg(test)]
use approx::assert_abs_diff_eq;

#[cfg(test)]
fn z_ray(x: f64, y: f64, z: f64) -> Ray4D {
    Ray4D::new(Tuple4D::point(x, y, z), Tuple4D::vector(0.0, 0.0, 1.0))
}

#[test]
fn intersect_scaled_sphere() {
    let s = Shape::sphere().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0));
    let xs = s.intersect(&z_ray(0.0, 0.0, -5.0)).unwrap();

    assert_eq!(xs.len(), 2);
    assert_eq!(xs.intersections[0].t, 3.0);
    assert_eq!(xs.intersections[1].t, 7.0);
    assert!(std::ptr::eq(xs.intersections[0].what, &s));
}

#[test]
fn intersect_translated_sphere() {
    let s = Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0));
    let xs = s.intersect(&z_ray(0.0, 0.0, -5.0)).unwrap();

    assert!(xs.is_empty());
}

#[test]
fn local_ray_of_transformed_shape() {
    let s = Shape::test().with_transform(Matrix4D::scaling(2.0, 2.0, 2.0));
    let local = s.to_local_ray(&z_ray(0.0, 0.0, -5.0)).unwrap();

    assert_eq!(local.origin, Tuple4D::point(0.0, 0.0, -2.5));
    assert_eq!(local.direction, Tuple4D::vector(0.0, 0.0, 0.5));

    let s = Shape::test().with_transform(Matrix4D::translation(5.0, 0.0, 0.0));
    let local = s.to_local_ray(&z_ray(0.0, 0.0, -5.0)).unwrap();

    assert_eq!(local.origin, Tuple4D::point(-5.0, 0.0, -5.0));
    assert_eq!(local.direction, Tuple4D::vector(0.0, 0.0, 1.0));
}

#[test]
fn normal_on_translated_sphere() {
    let s = Shape::sphere().with_transform(Matrix4D::translation(0.0, 1.0, 0.0));
    let n = s.normal_at(Tuple4D::point(0.0, 1.70711, -0.70711)).unwrap();

    assert_eq!(n, Tuple4D::vector(0.0, 0.70711, -0.70711));
}

#[test]
fn normal_on_transformed_sphere() {
    let s = Shape::sphere().with_transform(
        Matrix4D::scaling(1.0, 0.5, 1.0) * Matrix4D::rotation_z(PI / 5.0)
    );
    let n = s.normal_at(
        Tuple4D::point(0.0, 2.0f64.sqrt() / 2.0, -(2.0f64.sqrt()) / 2.0)
    ).unwrap();

    assert_eq!(n, Tuple4D::vector(0.0, 0.97014, -0.24254));
}

#[test]
fn normals_are_unit_vectors() {
    let transform = Matrix4D::translation(1.0, -2.0, 0.5)
        * Matrix4D::rotation_y(PI / 3.0)
        * Matrix4D::scaling(1.0, 3.0, 0.5);

    let shapes = vec![
        Shape::sphere(),
        Shape::plane(),
        Shape::cube(),
        Shape::cylinder(),
        Shape::capped_cylinder(-1.0, 1.0),
        Shape::capped_cone(-1.0, 0.0),
    ];

    let points = [
        Tuple4D::point(0.3, -0.6, 0.2),
        Tuple4D::point(1.0, 0.5, -0.25),
        Tuple4D::point(-0.7, 1.0, 0.7),
    ];

    for s in shapes.iter() {
        let s = s.with_transform(transform);
        for p in points.iter() {
            let n = s.normal_at(transform * *p).unwrap();
            assert_abs_diff_eq!(n.magnitude(), 1.0, epsilon = 1e-4);
            assert!(n.is_vector());
        }
    }
}

#[test]
fn singular_transform_fails_on_use() {
    let s = Shape::sphere().with_transform(Matrix4D::scaling(1.0, 0.0, 1.0));

    match s.intersect(&z_ray(0.0, 0.0, -5.0)) {
        Err(TraceError::NonInvertible { .. }) => (),
        other => panic!("expected a non-invertible error, got {:?}", other),
    }

    assert!(s.normal_at(Tuple4D::point(1.0, 0.0, 0.0)).is_err());
}

#[test]
fn shape_updates_are_functional() {
    let s = Shape::sphere();
    let moved = s.with_transform(Matrix4D::translation(2.0, 3.0, 4.0));
    let shiny = s.with_material(Material { ambient: 1.0, ..Default::default() });

    assert_eq!(*s.transform(), Matrix4D::identity());
    assert_eq!(*moved.transform(), Matrix4D::translation(2.0, 3.0, 4.0));
    assert_eq!(shiny.material().ambient, 1.0);
    assert_eq!(s.material().ambient, 0.1);
    assert_ne!(s, moved);
}

#[test]
fn replace_fields_by_name() {
    let c = Shape::cylinder();

    let capped = c.replace("minimum", 1.0).unwrap()
        .replace("maximum", 2.0).unwrap()
        .replace("closed", true).unwrap();
    assert_eq!(capped, Shape::capped_cylinder(1.0, 2.0));

    let moved = c.replace("transform", Matrix4D::translation(1.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(*moved.transform(), Matrix4D::translation(1.0, 0.0, 0.0));

    match Shape::sphere().replace("minimum", 1.0) {
        Err(TraceError::UnknownField(name)) => assert_eq!(name, "minimum"),
        other => panic!("expected an unknown field error, got {:?}", other),
    }

    match c.replace("radius", 2.0) {
        Err(TraceError::UnknownField(name)) => assert_eq!(name, "radius"),
        other => panic!("expected an unknown field error, got {:?}", other),
    }

    assert!(c.replace("closed", 1.0).is_err());
}

#[test]
fn structural_equality() {
    assert_eq!(Shape::sphere(), Shape::sphere());
    assert_ne!(Shape::sphere(), Shape::cube());
    assert_eq!(Shape::capped_cone(-1.0, 1.0), Shape::capped_cone(-1.0, 1.0));
    assert_ne!(Shape::capped_cone(-1.0, 1.0), Shape::bounded_cone(-1.0, 1.0));

    let g1 = Shape::group(vec![Shape::sphere(), Shape::cube()]);
    let g2 = Shape::group(vec![Shape::sphere(), Shape::cube()]);
    let g3 = Shape::group(vec![Shape::cube(), Shape::sphere()]);
    assert_eq!(g1, g2);
    assert_ne!(g1, g3);
}

#[test]
fn intersect_empty_group() {
    let g = Shape::group(Vec::new());
    assert!(g.local_intersect(&z_ray(0.0, 0.0, 0.0)).unwrap().is_empty());
}

#[test]
fn intersect_nonempty_group() {
    let s1 = Shape::sphere();
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, -3.0));
    let s3 = Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0));
    let g = Shape::group(vec![s1.clone(), s2.clone(), s3]);

    let xs = g.local_intersect(&z_ray(0.0, 0.0, -5.0)).unwrap();
    let children = g.children().unwrap();

    assert_eq!(xs.len(), 4);
    assert!(std::ptr::eq(xs.intersections[0].what, &children[1]));
    assert!(std::ptr::eq(xs.intersections[1].what, &children[1]));
    assert!(std::ptr::eq(xs.intersections[2].what, &children[0]));
    assert!(std::ptr::eq(xs.intersections[3].what, &children[0]));
}

#[test]
fn intersect_transformed_group() {
    let s = Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0));
    let g = Shape::group(vec![s])
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0));

    let xs = g.intersect(&z_ray(10.0, 0.0, -10.0)).unwrap();
    assert_eq!(xs.len(), 2);
}

#[test]
fn nested_group_frames() {
    let s = Shape::sphere().with_transform(Matrix4D::translation(5.0, 0.0, 0.0));
    let g2 = Shape::group(vec![s])
        .with_transform(Matrix4D::scaling(1.0, 2.0, 3.0));
    let g1 = Shape::group(vec![g2])
        .with_transform(Matrix4D::rotation_y(PI / 2.0));

    let s = &g1.children().unwrap()[0].children().unwrap()[0];

    let p = s.world_to_object(Tuple4D::point(-2.0, 0.0, -10.0)).unwrap();
    assert_eq!(p, Tuple4D::point(0.0, 0.0, -1.0));

    let r3 = 3.0f64.sqrt() / 3.0;
    let n = s.normal_to_world(Tuple4D::vector(r3, r3, r3)).unwrap();
    assert_eq!(n, Tuple4D::vector(0.2857, 0.4286, -0.8571));

    let n = s.normal_at(Tuple4D::point(1.7321, 1.1547, -5.5774)).unwrap();
    assert_eq!(n, Tuple4D::vector(0.2857, 0.4286, -0.8571));
}

#[test]
fn composites_have_no_normal() {
    let g = Shape::group(vec![Shape::sphere()]);
    let c = Shape::csg(CsgOp::Union, Shape::sphere(), Shape::cube());

    match g.normal_at(Tuple4D::point(1.0, 0.0, 0.0)) {
        Err(TraceError::CompositeNormal) => (),
        other => panic!("expected a composite normal error, got {:?}", other),
    }

    assert!(c.local_normal_at(Tuple4D::point(1.0, 0.0, 0.0)).is_err());
}

#[test]
fn includes_searches_children() {
    let g = Shape::group(vec![Shape::sphere()]);
    let csg = Shape::csg(CsgOp::Difference, g, Shape::plane());

    let (_, g, p) = csg.operands().unwrap();
    let s = &g.children().unwrap()[0];

    assert!(s.includes(s));
    assert!(g.includes(s));
    assert!(!g.includes(p));
    assert!(csg.includes(s));
    assert!(csg.includes(g));
    assert!(csg.includes(p));

    // Equal values outside the tree are not part of it.
    assert!(!s.includes(&Shape::sphere()));
    assert!(!csg.includes(&Shape::plane()));
}

#[test]
fn csg_over_groups_with_equal_children() {
    let left = Shape::group(vec![Shape::sphere()]);
    let right = Shape::group(vec![Shape::sphere()])
        .with_transform(Matrix4D::translation(0.0, 0.0, 0.5));

    let union = Shape::csg(CsgOp::Union, left.clone(), right.clone());
    let xs = union.local_intersect(&z_ray(0.0, 0.0, -5.0)).unwrap();

    assert_eq!(xs.len(), 2);
    assert_abs_diff_eq!(xs.intersections[0].t, 4.0, epsilon = 1e-4);
    assert_abs_diff_eq!(xs.intersections[1].t, 6.5, epsilon = 1e-4);

    let difference = Shape::csg(CsgOp::Difference, left, right);
    let xs = difference.local_intersect(&z_ray(0.0, 0.0, -5.0)).unwrap();

    assert_eq!(xs.len(), 2);
    assert_abs_diff_eq!(xs.intersections[0].t, 4.0, epsilon = 1e-4);
    assert_abs_diff_eq!(xs.intersections[1].t, 4.5, epsilon = 1e-4);
}

#[test]
fn csg_rebinds_operands() {
    let left = Shape::sphere();
    let right = Shape::cube();
    let c = Shape::csg(CsgOp::Union, left, right)
        .with_transform(Matrix4D::translation(1.0, 0.0, 0.0));

    let (op, l, r) = c.operands().unwrap();
    assert_eq!(op, CsgOp::Union);
    assert_eq!(l.parent(), Some(&Matrix4D::translation(1.0, 0.0, 0.0)));
    assert_eq!(r.parent(), Some(&Matrix4D::translation(1.0, 0.0, 0.0)));
}

#[test]
fn ray_misses_csg() {
    let c = Shape::csg(CsgOp::Union, Shape::sphere(), Shape::cube());
    let r = Ray4D::new(
        Tuple4D::point(0.0, 2.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0)
    );

    assert!(c.local_intersect(&r).unwrap().is_empty());
}

#[test]
fn ray_hits_csg() {
    let s1 = Shape::sphere();
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 0.5));
    let c = Shape::csg(CsgOp::Union, s1, s2);

    let xs = c.local_intersect(&z_ray(0.0, 0.0, -5.0)).unwrap();
    let (_, l, r) = c.operands().unwrap();

    assert_eq!(xs.len(), 2);
    assert_abs_diff_eq!(xs.intersections[0].t, 4.0, epsilon = 1e-4);
    assert!(std::ptr::eq(xs.intersections[0].what, l));
    assert_abs_diff_eq!(xs.intersections[1].t, 6.5, epsilon = 1e-4);
    assert!(std::ptr::eq(xs.intersections[1].what, r));
}

#[test]
fn world_round_trip() {
    let s = Shape::sphere().with_transform(
        Matrix4D::translation(1.0, 2.0, 3.0) * Matrix4D::scaling(2.0, 1.0, 0.5)
    );
    let r = Ray4D::new(
        Tuple4D::point(1.0, 2.0, -10.0),
        Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let xs = s.intersect(&r).unwrap();
    for i in xs.intersections.iter() {
        // The world-space hit lies on the unit sphere in object space.
        let local = s.world_to_object(r.position(i.t)).unwrap();
        assert_abs_diff_eq!(local.as_vector().magnitude(), 1.0, epsilon = 1e-4);
    }
}
