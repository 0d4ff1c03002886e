use crate::feq;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::shape::Shape;
use crate::error::Result;

/// The procedural textures a `Pattern` can produce.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PatternKind {
    /// Alternates between two colors every unit along X.
    Stripe(Color, Color),

    /// Linearly blends from the first color to the second across each unit of X.
    Gradient(Color, Color),

    /// Concentric rings around the Y axis.
    Ring(Color, Color),

    /// A 3D checkerboard of unit cubes.
    Checker(Color, Color),

    /// Returns the pattern-space point itself as a color. Mostly for testing.
    Coordinates,
}

/// A procedural texture with its own transform.
///
/// The pattern is evaluated in pattern space: a world point is first moved
/// into the owning shape's object space, then through this pattern's inverse
/// transform.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pattern {
    pub kind: PatternKind,
    pub transform: Matrix4D,
}

impl Pattern {
    pub fn new(kind: PatternKind) -> Pattern {
        Pattern { kind, transform: Matrix4D::identity() }
    }

    pub fn stripe(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Stripe(primary, secondary))
    }

    pub fn gradient(from: Color, to: Color) -> Pattern {
        Pattern::new(PatternKind::Gradient(from, to))
    }

    pub fn ring(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Ring(primary, secondary))
    }

    pub fn checker(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(PatternKind::Checker(primary, secondary))
    }

    pub fn coordinates() -> Pattern {
        Pattern::new(PatternKind::Coordinates)
    }

    /// Returns a copy of this pattern with a different transform.
    pub fn with_transform(&self, transform: Matrix4D) -> Pattern {
        Pattern { transform, ..*self }
    }

    /// Evaluates the pattern at a point already in pattern space.
    pub fn pattern_at(&self, p: Tuple4D) -> Color {
        match self.kind {
            PatternKind::Stripe(a, b) => {
                if feq(p.x.floor().rem_euclid(2.0), 0.0) { a } else { b }
            },

            PatternKind::Gradient(a, b) => {
                a + (b - a) * (p.x - p.x.floor())
            },

            PatternKind::Ring(a, b) => {
                let r = (p.x.powi(2) + p.z.powi(2)).sqrt();
                if feq(r.floor().rem_euclid(2.0), 0.0) { a } else { b }
            },

            PatternKind::Checker(a, b) => {
                let sum = p.x.floor() + p.y.floor() + p.z.floor();
                if feq(sum.rem_euclid(2.0), 0.0) { a } else { b }
            },

            PatternKind::Coordinates => Color::rgb(p.x, p.y, p.z),
        }
    }

    /// Evaluates the pattern at a world-space point on `shape`.
    pub fn pattern_at_shape(&self, shape: &Shape, world_point: Tuple4D)
        -> Result<Color> {
        let object_point = shape.world_to_object(world_point)?;
        let pattern_point = self.transform.inverse()? * object_point;

        Ok(self.pattern_at(pattern_point))
    }
}

#[test]
fn stripe_pattern_alternates_along_x() {
    let pattern = Pattern::stripe(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(Tuple4D::point( 0.0, 0.0, 0.0)),
        Color::white());
    assert_eq!(pattern.pattern_at(Tuple4D::point( 0.9, 2.0, 1.0)),
        Color::white());
    assert_eq!(pattern.pattern_at(Tuple4D::point( 1.0, 0.0, 0.0)),
        Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(-0.1, 0.0, 0.0)),
        Color::black());
    assert_eq!(pattern.pattern_at(Tuple4D::point(-1.1, 0.0, 0.0)),
        Color::white());
}

#[test]
fn gradient_interpolates() {
    let pattern = Pattern::gradient(Color::white(), Color::black());

    assert_eq!(pattern.pattern_at(Tuple4D::point(0.25, 0.0, 0.0)),
        Color::rgb(0.75, 0.75, 0.75));
    assert_eq!(pattern.pattern_at(Tuple4D::point(0.75, 0.0, 0.0)),
        Color::rgb(0.25, 0.25, 0.25));
}

#[test]
fn ring_and_checker() {
    let ring = Pattern::ring(Color::white(), Color::black());
    assert_eq!(ring.pattern_at(Tuple4D::point(0.0, 0.0, 0.0)), Color::white());
    assert_eq!(ring.pattern_at(Tuple4D::point(1.0, 0.0, 0.0)), Color::black());
    assert_eq!(ring.pattern_at(Tuple4D::point(0.708, 0.0, 0.708)),
        Color::black());

    let checker = Pattern::checker(Color::white(), Color::black());
    assert_eq!(checker.pattern_at(Tuple4D::point(0.99, 0.0, 0.0)),
        Color::white());
    assert_eq!(checker.pattern_at(Tuple4D::point(0.0, 1.01, 0.0)),
        Color::black());
}

#[test]
fn pattern_with_object_and_pattern_transforms() {
    let shape = Shape::sphere()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0));
    let pattern = Pattern::coordinates()
        .with_transform(Matrix4D::translation(0.5, 1.0, 1.5));

    let c = pattern.pattern_at_shape(&shape, Tuple4D::point(2.5, 3.0, 3.5))
        .unwrap();
    assert_eq!(c, Color::rgb(0.75, 0.5, 0.25));
}
