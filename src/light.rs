use crate::consts::MATERIAL_EPSILON;
use crate::color::Color;
use crate::pattern::Pattern;
use crate::tuple::Tuple4D;
use crate::shape::Shape;
use crate::error::{ Result, TraceError };

/// A point light.
///
/// A very simple light source. Provides a color and a position where light is
/// produced from.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Tuple4D,
}

impl PointLight {
    /// Creates a point light.
    ///
    /// If `position` isn't a point, it is converted to a point automatically.
    pub fn new(intensity: Color, mut position: Tuple4D) -> PointLight {
        if !position.is_point() {
            position.w = 1.0;
        }

        PointLight { intensity, position }
    }
}

/// A material record.
///
/// Materials use attributes from the Phong reflection model (ambient, diffuse,
/// specular and shininess), plus how reflective and transparent a surface is
/// and the refractive index of the medium behind it.
///
/// Materials are never edited in place. Use struct update syntax or
/// `Material::replace` to derive a new one.
#[derive(Copy, Clone, Debug)]
pub struct Material {
    pub color: Color,
    pub pattern: Option<Pattern>,

    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,

    pub reflective: f64,
    pub transparency: f64,
    pub refractive_index: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Color::rgb(1.0, 1.0, 1.0),
            pattern: None,

            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.9,
            shininess: 200.0,

            reflective: 0.0,
            transparency: 0.0,
            refractive_index: 1.0,
        }
    }
}

/// Numeric fields compare within `MATERIAL_EPSILON`; color and pattern
/// compare structurally.
impl PartialEq for Material {
    fn eq(&self, other: &Material) -> bool {
        let close = |l: f64, r: f64| (l - r).abs() < MATERIAL_EPSILON;

        self.color == other.color
            && self.pattern == other.pattern
            && close(self.ambient, other.ambient)
            && close(self.diffuse, other.diffuse)
            && close(self.specular, other.specular)
            && close(self.shininess, other.shininess)
            && close(self.reflective, other.reflective)
            && close(self.transparency, other.transparency)
            && close(self.refractive_index, other.refractive_index)
    }
}

/// A value handed to `Material::replace`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Color(Color),
    Pattern(Option<Pattern>),
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> FieldValue {
        FieldValue::Number(n)
    }
}

impl From<Color> for FieldValue {
    fn from(c: Color) -> FieldValue {
        FieldValue::Color(c)
    }
}

impl From<Pattern> for FieldValue {
    fn from(p: Pattern) -> FieldValue {
        FieldValue::Pattern(Some(p))
    }
}

impl From<Option<Pattern>> for FieldValue {
    fn from(p: Option<Pattern>) -> FieldValue {
        FieldValue::Pattern(p)
    }
}

impl FieldValue {
    fn number(self, field: &str) -> Result<f64> {
        match self {
            FieldValue::Number(n) => Ok(n),
            _ => Err(TraceError::FieldType {
                field: field.to_string(), expected: "a number"
            }),
        }
    }
}

impl Material {
    /// Returns a copy of this material with one field replaced, by name.
    ///
    /// ```
    /// # use whitted::light::Material;
    /// let glass = Material::default().replace("transparency", 1.0).unwrap();
    /// assert_eq!(glass.transparency, 1.0);
    /// assert!(glass.replace("opacity", 0.5).is_err());
    /// ```
    pub fn replace<V: Into<FieldValue>>(&self, field: &str, value: V)
        -> Result<Material> {
        let value = value.into();
        let mut m = *self;

        match field {
            "color" => match value {
                FieldValue::Color(c) => m.color = c,
                _ => return Err(TraceError::FieldType {
                    field: field.to_string(), expected: "a color"
                }),
            },
            "pattern" => match value {
                FieldValue::Pattern(p) => m.pattern = p,
                _ => return Err(TraceError::FieldType {
                    field: field.to_string(), expected: "a pattern"
                }),
            },
            "ambient" => m.ambient = value.number(field)?,
            "diffuse" => m.diffuse = value.number(field)?,
            "specular" => m.specular = value.number(field)?,
            "shininess" => m.shininess = value.number(field)?,
            "reflective" => m.reflective = value.number(field)?,
            "transparency" => m.transparency = value.number(field)?,
            "refractive_index" => m.refractive_index = value.number(field)?,
            _ => return Err(TraceError::UnknownField(field.to_string())),
        }

        Ok(m)
    }

    /// A fully transparent glass material.
    pub fn glass() -> Material {
        Material {
            transparency: 1.0,
            refractive_index: 1.5,
            ..Default::default()
        }
    }
}

/// Calculate the Phong lighting of a point on a shape.
///
/// Takes the material, the shape it belongs to (patterns are evaluated in the
/// shape's object space), a single light, the point being lit, and the eye and
/// normal vectors there. If the point is in a shadow (parameter `in_shadow`),
/// only ambient light is used.
pub fn lighting(m: &Material, obj: &Shape, light: &PointLight,
    point: Tuple4D, eyev: Tuple4D, normalv: Tuple4D, in_shadow: bool)
    -> Result<Color> {
    // If Material m has some pattern, use that for color
    let color = match m.pattern {
        Some(ref pat) => pat.pattern_at_shape(obj, point)?,
        None => m.color,
    };

    // Combine surface color with light's color
    let effective_color = color * light.intensity;
    let ambient = effective_color * m.ambient;

    if in_shadow {
        return Ok(ambient);
    }

    // For the side of the surface facing away from the light, use only ambient
    let lightv = (light.position - point).normalize();
    let light_dot_normal = lightv.dot(&normalv);
    if light_dot_normal < 0.0 {
        return Ok(ambient);
    }

    let diffuse = effective_color * m.diffuse * light_dot_normal;

    let reflectv = (-lightv).reflect(&normalv);
    let reflect_dot_eye = reflectv.dot(&eyev);

    let specular = if reflect_dot_eye <= 0.0 {
        Color::black()
    } else {
        let factor = reflect_dot_eye.powf(m.shininess);
        light.intensity * m.specular * factor
    };

    Ok(ambient + diffuse + specular)
}

#[cfg(test)]
fn lit(eyev: Tuple4D, light_position: Tuple4D, in_shadow: bool) -> Color {
    let m = Material::default();
    let s = Shape::sphere();
    let light = PointLight::new(Color::white(), light_position);

    lighting(&m, &s, &light, Tuple4D::point(0.0, 0.0, 0.0), eyev,
        Tuple4D::vector(0.0, 0.0, -1.0), in_shadow).unwrap()
}

#[test]
fn eye_between_light_and_surface() {
    let res = lit(Tuple4D::vector(0.0, 0.0, -1.0),
        Tuple4D::point(0.0, 0.0, -10.0), false);
    assert_eq!(res, Color::rgb(1.9, 1.9, 1.9));
}

#[test]
fn eye_between_light_and_surface_offset_45() {
    let res = lit(Tuple4D::vector(0.0, 2.0f64.sqrt() / 2.0, 2.0f64.sqrt() / 2.0),
        Tuple4D::point(0.0, 0.0, -10.0), false);
    assert_eq!(res, Color::rgb(1.0, 1.0, 1.0));
}

#[test]
fn eye_opposite_from_surface_offset_45() {
    let res = lit(Tuple4D::vector(0.0, 0.0, -1.0),
        Tuple4D::point(0.0, 10.0, -10.0), false);
    assert_eq!(res, Color::rgb(0.7364, 0.7364, 0.7364));
}

#[test]
fn eye_in_path_of_reflection() {
    let res = lit(Tuple4D::vector(0., -(2.0f64.sqrt())/2., -(2.0f64.sqrt())/2.),
        Tuple4D::point(0.0, 10.0, -10.0), false);
    assert_eq!(res, Color::rgb(1.6364, 1.6364, 1.6364));
}

#[test]
fn light_behind_surface_or_in_shadow() {
    let behind = lit(Tuple4D::vector(0.0, 0.0, -1.0),
        Tuple4D::point(0.0, 0.0, 10.0), false);
    assert_eq!(behind, Color::rgb(0.1, 0.1, 0.1));

    let shadowed = lit(Tuple4D::vector(0.0, 0.0, -1.0),
        Tuple4D::point(0.0, 0.0, -10.0), true);
    assert_eq!(shadowed, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn lighting_with_stripe_pattern() {
    let m = Material {
        pattern: Some(Pattern::stripe(Color::white(), Color::black())),
        ambient: 1.0,
        diffuse: 0.0,
        specular: 0.0,
        ..Default::default()
    };

    let s = Shape::sphere().with_material(m);
    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = PointLight::new(
        Color::white(), Tuple4D::point(0.0, 0.0, -10.0)
    );

    assert_eq!(
        lighting(&m, &s, &light, Tuple4D::point(0.9, 0.0, 0.0),
            eyev, normalv, false).unwrap(),
        Color::white()
    );

    assert_eq!(
        lighting(&m, &s, &light, Tuple4D::point(1.1, 0.0, 0.0),
            eyev, normalv, false).unwrap(),
        Color::black()
    );
}

#[test]
fn material_replace_is_functional() {
    let m = Material::default();
    let shiny = m.replace("reflective", 0.5).unwrap();

    assert_eq!(m.reflective, 0.0);
    assert_eq!(shiny.reflective, 0.5);
    assert_ne!(m, shiny);

    let red = m.replace("color", Color::rgb(1.0, 0.0, 0.0)).unwrap();
    assert_eq!(red.color, Color::rgb(1.0, 0.0, 0.0));
}

#[test]
fn material_replace_rejects_unknown_fields() {
    let m = Material::default();

    match m.replace("glossiness", 1.0) {
        Err(TraceError::UnknownField(name)) => assert_eq!(name, "glossiness"),
        other => panic!("expected an unknown field error, got {:?}", other),
    }

    match m.replace("ambient", Color::white()) {
        Err(TraceError::FieldType { field, .. }) => assert_eq!(field, "ambient"),
        other => panic!("expected a field type error, got {:?}", other),
    }
}

#[test]
fn material_equality_is_approximate() {
    let a = Material::default();
    let b = Material { ambient: 0.1004, ..Default::default() };
    let c = Material { ambient: 0.2, ..Default::default() };

    assert_eq!(a, b);
    assert_ne!(a, c);
}
