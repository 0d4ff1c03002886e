//! JSON scene descriptions.
//!
//! A scene file holds a camera, a list of lights and a list of shapes:
//!
//! ```json
//! {
//!   "camera": { "width": 320, "height": 160, "field_of_view": 1.0472,
//!               "from": [0, 1.5, -5], "to": [0, 1, 0], "up": [0, 1, 0] },
//!   "lights": [ { "intensity": [1, 1, 1], "position": [-10, 10, -10] } ],
//!   "shapes": [
//!     { "type": "plane", "material": { "reflective": 0.3 } },
//!     { "type": "csg", "operation": "difference",
//!       "left": { "type": "cube" },
//!       "right": { "type": "sphere",
//!                  "transform": [ { "scale": [1.3, 1.3, 1.3] } ] } }
//!   ]
//! }
//! ```
//!
//! Transforms are lists applied in order, first entry first. Material keys
//! are applied one at a time through `Material::replace`, so a misspelled
//! key is reported rather than ignored.

use std::fs;
use std::path::Path;

use serde::{ Serialize, Deserialize };
use serde_json::Value;
use tracing::debug;

use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::pattern::{ Pattern, PatternKind };
use crate::light::{ PointLight, Material, FieldValue };
use crate::shape::{ Shape, CsgOp };
use crate::world::World;
use crate::camera::Camera;
use crate::error::{ Result, TraceError };

/// A world plus the camera looking at it.
pub struct Scene {
    pub world: World,
    pub camera: Camera,
}

impl Scene {
    /// Parses a scene from JSON text.
    pub fn from_json(text: &str) -> Result<Scene> {
        let scene_json: SceneJson = serde_json::from_str(text)?;
        Scene::try_from_json(scene_json)
    }

    /// Reads and parses a scene file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene> {
        let text = fs::read_to_string(path.as_ref())?;
        let scene = Scene::from_json(&text)?;

        debug!(
            path = %path.as_ref().display(),
            objects = scene.world.objects().len(),
            lights = scene.world.lights().len(),
            "loaded scene"
        );

        Ok(scene)
    }

    fn try_from_json(scene_json: SceneJson) -> Result<Scene> {
        let cam = scene_json.camera;
        let camera = Camera::new(
            cam.width,
            cam.height,
            cam.field_of_view,
            Matrix4D::view_transform(
                point(cam.from), point(cam.to), vector(cam.up)
            )
        );

        let mut world = World::empty();
        for light in scene_json.lights {
            world = world.with_light(PointLight::new(
                color(light.intensity), point(light.position)
            ));
        }

        for shape in scene_json.shapes {
            world = world.with_object(shape.into_shape()?);
        }

        Ok(Scene { world, camera })
    }
}

fn point(p: [f64; 3]) -> Tuple4D {
    Tuple4D::point(p[0], p[1], p[2])
}

fn vector(v: [f64; 3]) -> Tuple4D {
    Tuple4D::vector(v[0], v[1], v[2])
}

fn color(c: [f64; 3]) -> Color {
    Color::from(c)
}

#[derive(Serialize, Deserialize)]
struct SceneJson {
    camera: CameraJson,

    #[serde(default)]
    lights: Vec<LightJson>,

    #[serde(default)]
    shapes: Vec<ShapeJson>,
}

#[derive(Clone, Serialize, Deserialize)]
struct CameraJson {
    width: usize,
    height: usize,
    field_of_view: f64,

    from: [f64; 3],
    to: [f64; 3],
    up: [f64; 3],
}

#[derive(Clone, Serialize, Deserialize)]
struct LightJson {
    intensity: [f64; 3],
    position: [f64; 3],
}

/// One step of a transform list.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TransformJson {
    Translate([f64; 3]),
    Scale([f64; 3]),
    RotateX(f64),
    RotateY(f64),
    RotateZ(f64),
    Shear([f64; 6]),
}

impl TransformJson {
    fn matrix(&self) -> Matrix4D {
        match *self {
            TransformJson::Translate([x, y, z]) => Matrix4D::translation(x, y, z),
            TransformJson::Scale([x, y, z]) => Matrix4D::scaling(x, y, z),
            TransformJson::RotateX(r) => Matrix4D::rotation_x(r),
            TransformJson::RotateY(r) => Matrix4D::rotation_y(r),
            TransformJson::RotateZ(r) => Matrix4D::rotation_z(r),
            TransformJson::Shear([xy, xz, yx, yz, zx, zy])
                => Matrix4D::shearing(xy, xz, yx, yz, zx, zy),
        }
    }
}

/// Composes a transform list; later steps are applied after earlier ones.
fn compose(steps: &[TransformJson]) -> Matrix4D {
    steps.iter().fold(Matrix4D::identity(), |acc, step| step.matrix() * acc)
}

#[derive(Clone, Serialize, Deserialize)]
struct PatternJson {
    #[serde(rename = "type")]
    ty: String,

    #[serde(default)]
    colors: Vec<[f64; 3]>,

    #[serde(default)]
    transform: Vec<TransformJson>,
}

impl PatternJson {
    fn into_pattern(self) -> Result<Pattern> {
        let pair = || match self.colors.as_slice() {
            [a, b] => Ok((color(*a), color(*b))),
            _ => Err(TraceError::InvalidScene(
                format!("pattern `{}` needs exactly two colors", self.ty)
            )),
        };

        let kind = match self.ty.as_str() {
            "stripe" => { let (a, b) = pair()?; PatternKind::Stripe(a, b) },
            "gradient" => { let (a, b) = pair()?; PatternKind::Gradient(a, b) },
            "ring" => { let (a, b) = pair()?; PatternKind::Ring(a, b) },
            "checker" => { let (a, b) = pair()?; PatternKind::Checker(a, b) },
            "coordinates" => PatternKind::Coordinates,
            other => return Err(TraceError::InvalidScene(
                format!("unrecognized pattern type `{}`", other)
            )),
        };

        Ok(Pattern::new(kind).with_transform(compose(&self.transform)))
    }
}

/// Converts one JSON material entry into a value for `Material::replace`.
fn field_value(field: &str, value: Value) -> Result<FieldValue> {
    match value {
        Value::Number(ref n) => n.as_f64()
            .map(FieldValue::Number)
            .ok_or_else(|| TraceError::FieldType {
                field: field.to_string(), expected: "a finite number"
            }),

        Value::Array(_) => {
            let c: [f64; 3] = serde_json::from_value(value)?;
            Ok(FieldValue::Color(color(c)))
        },

        Value::Object(_) => {
            let p: PatternJson = serde_json::from_value(value)?;
            Ok(FieldValue::Pattern(Some(p.into_pattern()?)))
        },

        Value::Null => Ok(FieldValue::Pattern(None)),

        _ => Err(TraceError::FieldType {
            field: field.to_string(), expected: "a number, color or pattern"
        }),
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct ShapeJson {
    #[serde(rename = "type")]
    ty: String,

    #[serde(default)]
    transform: Vec<TransformJson>,

    #[serde(default)]
    material: serde_json::Map<String, Value>,

    // Cylinders and cones
    minimum: Option<f64>,
    maximum: Option<f64>,
    closed: Option<bool>,

    // Groups
    children: Option<Vec<ShapeJson>>,

    // CSG nodes
    operation: Option<String>,
    left: Option<Box<ShapeJson>>,
    right: Option<Box<ShapeJson>>,
}

impl ShapeJson {
    fn into_shape(self) -> Result<Shape> {
        let mut shape = match self.ty.as_str() {
            // Primitives
            "test" => Shape::test(),
            "sphere" => Shape::sphere(),
            "plane" => Shape::plane(),
            "cube" => Shape::cube(),
            "cylinder" => Shape::cylinder(),
            "cone" => Shape::cone(),

            // Group-likes
            "group" => {
                // It's okay to have an empty group (no children).
                let children = self.children.unwrap_or_default()
                    .into_iter()
                    .map(ShapeJson::into_shape)
                    .collect::<Result<Vec<_>>>()?;

                Shape::group(children)
            },

            "csg" => {
                let op = match self.operation.as_deref() {
                    Some("union") => CsgOp::Union,
                    Some("intersection") => CsgOp::Intersection,
                    Some("difference") => CsgOp::Difference,
                    other => return Err(TraceError::InvalidScene(
                        format!("unrecognized CSG operation {:?}", other)
                    )),
                };

                match (self.left, self.right) {
                    (Some(left), Some(right))
                        => Shape::csg(op, left.into_shape()?, right.into_shape()?),
                    _ => return Err(TraceError::InvalidScene(
                        "CSG nodes need a left and a right operand".to_string()
                    )),
                }
            },

            other => return Err(TraceError::InvalidScene(
                format!("unrecognized shape type `{}`", other)
            )),
        };

        if let Some(minimum) = self.minimum {
            shape = shape.replace("minimum", minimum)?;
        }
        if let Some(maximum) = self.maximum {
            shape = shape.replace("maximum", maximum)?;
        }
        if let Some(closed) = self.closed {
            shape = shape.replace("closed", closed)?;
        }

        let mut material = Material::default();
        for (field, value) in self.material {
            let value = field_value(&field, value)?;
            material = material.replace(&field, value)?;
        }

        Ok(shape
            .with_material(material)
            .with_transform(compose(&self.transform)))
    }
}

#[cfg(test)]
const SCENE: &str = r#"{
    "camera": {
        "width": 40, "height": 20, "field_of_view": 1.0472,
        "from": [0, 1.5, -5], "to": [0, 1, 0], "up": [0, 1, 0]
    },
    "lights": [
        { "intensity": [1, 1, 1], "position": [-10, 10, -10] }
    ],
    "shapes": [
        {
            "type": "plane",
            "material": {
                "reflective": 0.5,
                "pattern": {
                    "type": "checker",
                    "colors": [[1, 1, 1], [0, 0, 0]],
                    "transform": [ { "scale": [0.5, 0.5, 0.5] } ]
                }
            }
        },
        {
            "type": "cylinder", "minimum": 0, "maximum": 2, "closed": true,
            "transform": [
                { "scale": [0.5, 1, 0.5] },
                { "translate": [1, 0, 0] }
            ],
            "material": { "color": [1, 0, 0], "refractive_index": 1.5 }
        },
        {
            "type": "group",
            "transform": [ { "rotate_y": 0.5 } ],
            "children": [
                { "type": "sphere" },
                {
                    "type": "csg", "operation": "difference",
                    "left": { "type": "cube" },
                    "right": { "type": "sphere" }
                }
            ]
        }
    ]
}"#;

#[test]
fn parse_scene() {
    let scene = Scene::from_json(SCENE).unwrap();

    assert_eq!(scene.camera.hsize, 40);
    assert_eq!(scene.camera.vsize, 20);
    assert_eq!(scene.world.lights().len(), 1);
    assert_eq!(scene.world.objects().len(), 3);

    let floor = &scene.world.objects()[0];
    assert_eq!(floor.material().reflective, 0.5);
    assert!(floor.material().pattern.is_some());

    let cylinder = &scene.world.objects()[1];
    assert_eq!(*cylinder, Shape::capped_cylinder(0.0, 2.0)
        .with_material(Material {
            color: Color::rgb(1.0, 0.0, 0.0),
            refractive_index: 1.5,
            ..Default::default()
        })
        .with_transform(
            Matrix4D::translation(1.0, 0.0, 0.0) * Matrix4D::scaling(0.5, 1.0, 0.5)
        ));

    let group = &scene.world.objects()[2];
    let children = group.children().unwrap();
    assert_eq!(children.len(), 2);
    assert!(children[1].operands().is_some());
    assert_eq!(children[0].parent(), Some(&Matrix4D::rotation_y(0.5)));
}

#[test]
fn parsed_scene_renders() {
    let scene = Scene::from_json(SCENE).unwrap();
    let canvas = scene.camera.render(&scene.world, 2).unwrap();

    assert_eq!(canvas.width, 40);
    assert_eq!(canvas.height, 20);
}

#[test]
fn unknown_material_keys_are_reported() {
    let text = r#"{
        "camera": { "width": 1, "height": 1, "field_of_view": 1.0,
                    "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0] },
        "shapes": [ { "type": "sphere", "material": { "shine": 3 } } ]
    }"#;

    match Scene::from_json(text) {
        Err(TraceError::UnknownField(name)) => assert_eq!(name, "shine"),
        Err(e) => panic!("expected an unknown field error, got {:?}", e),
        Ok(_) => panic!("expected an unknown field error"),
    }
}

#[test]
fn invalid_shapes_are_reported() {
    let bad_type = r#"{
        "camera": { "width": 1, "height": 1, "field_of_view": 1.0,
                    "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0] },
        "shapes": [ { "type": "teapot" } ]
    }"#;
    assert!(matches!(Scene::from_json(bad_type),
        Err(TraceError::InvalidScene(_))));

    let sphere_extent = r#"{
        "camera": { "width": 1, "height": 1, "field_of_view": 1.0,
                    "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0] },
        "shapes": [ { "type": "sphere", "minimum": 1 } ]
    }"#;
    assert!(matches!(Scene::from_json(sphere_extent),
        Err(TraceError::UnknownField(_))));

    assert!(matches!(Scene::from_json("{ not json"), Err(TraceError::Json(_))));
}
