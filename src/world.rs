use tracing::trace;

use crate::feq;
use crate::consts::EPSILON;
use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::matrix::Matrix4D;
use crate::light::{ PointLight, Material, lighting };
use crate::shape::Shape;
use crate::intersect::{ Intersections, PreComputations };
use crate::error::Result;

/// A world with objects and lights.
///
/// Worlds collect all objects as well as lights for rendering. Most shading
/// logic is performed within worlds for the ray tracer.
///
/// Worlds are immutable; `with_object`, `with_light` and `replace` build new
/// ones.
#[derive(Clone, Debug)]
pub struct World {
    lights: Vec<PointLight>,
    objects: Vec<Shape>,
}

/// The default world: two concentric spheres lit from the upper left.
impl Default for World {
    fn default() -> World {
        let light = PointLight::new(
            Color::rgb(1.0, 1.0, 1.0),
            Tuple4D::point(-10.0, 10.0, -10.0)
        );

        let s1 = Shape::sphere().with_material(Material {
            color: Color::rgb(0.8, 1.0, 0.6),
            diffuse: 0.7,
            specular: 0.2,
            ..Default::default()
        });

        let s2 = Shape::sphere()
            .with_transform(Matrix4D::scaling(0.5, 0.5, 0.5));

        World {
            lights: vec![light],
            objects: vec![s1, s2],
        }
    }
}

impl World {
    /// Creates an empty world with no objects and no lights.
    pub fn empty() -> World {
        World { lights: Vec::new(), objects: Vec::new() }
    }

    pub fn with_object(mut self, shape: Shape) -> World {
        self.objects.push(shape);
        self
    }

    pub fn with_light(mut self, light: PointLight) -> World {
        self.lights.push(light);
        self
    }

    pub fn objects(&self) -> &[Shape] {
        &self.objects
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Checks whether a structurally equal shape is in the world.
    pub fn contains(&self, shape: &Shape) -> bool {
        self.objects.iter().any(|o| o == shape)
    }

    pub fn contains_light(&self, light: &PointLight) -> bool {
        self.lights.iter().any(|l| l == light)
    }

    /// Returns a world where every object equal to `old` is swapped for `new`.
    pub fn replace(&self, old: &Shape, new: Shape) -> World {
        World {
            lights: self.lights.clone(),
            objects: self.objects.iter()
                .map(|o| if o == old { new.clone() } else { o.clone() })
                .collect(),
        }
    }

    /// Intersects a ray against all objects in a world, sorted by `t`.
    pub fn intersect(&self, r: &Ray4D) -> Result<Intersections> {
        let all = self.objects.iter()
            .map(|obj| obj.intersect(r))
            .collect::<Result<Vec<_>>>()?;

        Ok(Intersections::aggregate(all))
    }

    /// Determines whether a point is hidden from a light.
    pub fn is_shadowed(&self, p: Tuple4D, light: &PointLight) -> Result<bool> {
        let (r, distance) = Ray4D::between(p, light.position);
        let xs = self.intersect(&r)?;

        Ok(match xs.hit() {
            Some(i) => i.t < distance,
            None => false,
        })
    }

    /// Calculates the color for a hit, based on shadows, lights, reflection
    /// and refraction.
    ///
    /// `remaining` bounds how many more reflected or refracted rays may be
    /// cast from here.
    pub fn shade_hit(&self, comps: &PreComputations, remaining: usize)
        -> Result<Color> {
        let m = comps.obj.material();

        let surface = self.lights.iter()
            .map(|light| {
                let shadowed = self.is_shadowed(comps.over_point, light)?;
                lighting(m, comps.obj, light,
                    comps.over_point, comps.eyev, comps.normalv, shadowed)
            })
            .sum::<Result<Color>>()?;

        let reflected = self.reflected_color(comps, remaining)?;
        let refracted = self.refracted_color(comps, remaining)?;

        if m.reflective > 0.0 && m.transparency > 0.0 {
            let reflectance = comps.schlick();
            Ok(surface
                + reflected * reflectance
                + refracted * (1.0 - reflectance))
        } else {
            Ok(surface + reflected + refracted)
        }
    }

    /// Determines the color seen along a ray.
    ///
    /// If no object is hit, the background (black) is returned.
    pub fn color_at(&self, r: &Ray4D, remaining: usize) -> Result<Color> {
        let xs = self.intersect(r)?;

        match xs.hit() {
            None => Ok(Color::black()),
            Some(hit) => {
                let comps = PreComputations::new(r, &hit, &xs)?;
                self.shade_hit(&comps, remaining)
            },
        }
    }

    /// The color contributed by a mirror reflection at the hit.
    pub fn reflected_color(&self, comps: &PreComputations, remaining: usize)
        -> Result<Color> {
        let reflective = comps.obj.material().reflective;
        if reflective < EPSILON {
            return Ok(Color::black());
        }

        if remaining == 0 {
            trace!("recursion budget exhausted on reflection");
            return Ok(Color::black());
        }

        let reflect_ray = Ray4D::new(comps.over_point, comps.reflectv);
        Ok(self.color_at(&reflect_ray, remaining - 1)? * reflective)
    }

    /// The color seen through a transparent surface at the hit.
    pub fn refracted_color(&self, comps: &PreComputations, remaining: usize)
        -> Result<Color> {
        let transparency = comps.obj.material().transparency;
        if feq(transparency, 0.0) || feq(comps.n1, 0.0) || feq(comps.n2, 0.0) {
            return Ok(Color::black());
        }

        if remaining == 0 {
            trace!("recursion budget exhausted on refraction");
            return Ok(Color::black());
        }

        // Snell's law, with the ratio of the indices and the angle of incidence
        let n_ratio = comps.n1 / comps.n2;
        let cos_i = comps.eyev.dot(&comps.normalv);
        let sin2_t = n_ratio.powi(2) * (1.0 - cos_i.powi(2));

        if sin2_t > 1.0 {
            trace!(n1 = comps.n1, n2 = comps.n2, "total internal reflection");
            return Ok(Color::black());
        }

        let cos_t = (1.0 - sin2_t).sqrt();
        let direction = comps.normalv * (n_ratio * cos_i - cos_t)
            - comps.eyev * n_ratio;

        let refract_ray = Ray4D::new(comps.under_point, direction);
        Ok(self.color_at(&refract_ray, remaining - 1)? * transparency)
    }
}

#[cfg(test)]
use crate::intersect::Intersection;

#[cfg(test)]
use crate::consts::MAX_RECURSION_DEPTH;

#[cfg(test)]
fn r2() -> f64 {
    2.0f64.sqrt() / 2.0
}

#[cfg(test)]
fn comps_for<'a>(r: &Ray4D, t: f64, s: &'a Shape) -> PreComputations<'a> {
    let i = Intersection::new(t, s);
    PreComputations::new(r, &i, &Intersections { intersections: vec![i] })
        .unwrap()
}

#[test]
fn default_world_contents() {
    let w = World::default();
    let light = PointLight::new(
        Color::white(), Tuple4D::point(-10.0, 10.0, -10.0)
    );

    assert!(w.contains_light(&light));
    assert!(w.contains(&Shape::sphere()
        .with_transform(Matrix4D::scaling(0.5, 0.5, 0.5))));
    assert!(!w.contains(&Shape::cube()));
}

#[test]
fn worlds_are_immutable() {
    let w = World::empty();
    let w2 = w.clone().with_object(Shape::sphere());

    assert!(w.objects().is_empty());
    assert_eq!(w2.objects().len(), 1);

    let moved = Shape::sphere().with_transform(Matrix4D::translation(1.0, 0.0, 0.0));
    let w3 = w2.replace(&Shape::sphere(), moved.clone());
    assert!(w3.contains(&moved));
    assert!(w2.contains(&Shape::sphere()));
}

#[test]
fn intersect_default_world_with_ray() {
    let w = World::default();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let xs = w.intersect(&r).unwrap();

    assert_eq!(xs.len(), 4);
    assert_eq!(xs.intersections[0].t, 4.0);
    assert_eq!(xs.intersections[1].t, 4.5);
    assert_eq!(xs.intersections[2].t, 5.5);
    assert_eq!(xs.intersections[3].t, 6.0);
}

#[test]
fn shade_intersection_from_outside() {
    let w = World::default();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let comps = comps_for(&r, 4.0, &w.objects()[0]);
    let c = w.shade_hit(&comps, MAX_RECURSION_DEPTH).unwrap();

    assert_eq!(c, Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn shade_hit_in_shadow() {
    let s2 = Shape::sphere().with_transform(Matrix4D::translation(0.0, 0.0, 10.0));
    let w = World::empty()
        .with_light(PointLight::new(
            Color::white(), Tuple4D::point(0.0, 0.0, -10.0)
        ))
        .with_object(Shape::sphere())
        .with_object(s2);

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 5.0),
        Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let comps = comps_for(&r, 4.0, &w.objects()[1]);

    assert_eq!(w.shade_hit(&comps, MAX_RECURSION_DEPTH).unwrap(),
        Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn shade_hit_sums_lights() {
    let w = World::default();
    let twice = w.clone().with_light(w.lights()[0]);

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let once = w.color_at(&r, MAX_RECURSION_DEPTH).unwrap();
    let doubled = twice.color_at(&r, MAX_RECURSION_DEPTH).unwrap();
    assert_eq!(doubled, once * 2.0);
}

#[test]
fn color_when_ray_misses_or_hits() {
    let w = World::default();

    let miss = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 1.0, 0.0)
    );
    assert_eq!(w.color_at(&miss, MAX_RECURSION_DEPTH).unwrap(), Color::black());

    let hit = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    assert_eq!(w.color_at(&hit, MAX_RECURSION_DEPTH).unwrap(),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn color_with_intersection_behind_ray() {
    let w = World::default();
    let outer = &w.objects()[0];
    let inner = &w.objects()[1];

    let w = w.replace(outer, outer.with_material(
        Material { ambient: 1.0, ..*outer.material() }
    ));
    let w = w.replace(inner, inner.with_material(
        Material { ambient: 1.0, ..*inner.material() }
    ));

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.75), Tuple4D::vector(0.0, 0.0, -1.0)
    );

    assert_eq!(w.color_at(&r, MAX_RECURSION_DEPTH).unwrap(),
        w.objects()[1].material().color);
}

#[test]
fn shadows() {
    let w = World::default();
    let light = w.lights()[0];

    let cases = [
        (Tuple4D::point(0.0, 10.0, 0.0), false),
        (Tuple4D::point(10.0, -10.0, 10.0), true),
        (Tuple4D::point(-20.0, 20.0, -20.0), false),
        (Tuple4D::point(-2.0, 2.0, -2.0), false),
    ];

    for &(p, shadowed) in cases.iter() {
        assert_eq!(w.is_shadowed(p, &light).unwrap(), shadowed);
    }
}

#[test]
fn reflected_color_for_nonreflective_material() {
    let w = World::default();
    let inner = &w.objects()[1];
    let inner = inner.with_material(Material { ambient: 1.0, ..*inner.material() });

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );
    let comps = comps_for(&r, 1.0, &inner);

    assert_eq!(w.reflected_color(&comps, MAX_RECURSION_DEPTH).unwrap(),
        Color::black());
}

#[cfg(test)]
fn reflective_floor() -> Shape {
    Shape::plane()
        .with_material(Material { reflective: 0.5, ..Default::default() })
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0))
}

#[test]
fn reflected_color_for_reflective_material() {
    let w = World::default().with_object(reflective_floor());
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -3.0), Tuple4D::vector(0.0, -r2(), r2())
    );
    let comps = comps_for(&r, 2.0f64.sqrt(), &w.objects()[2]);

    assert_eq!(w.reflected_color(&comps, MAX_RECURSION_DEPTH).unwrap(),
        Color::rgb(0.19032, 0.2379, 0.14274));
    assert_eq!(w.shade_hit(&comps, MAX_RECURSION_DEPTH).unwrap(),
        Color::rgb(0.87677, 0.92436, 0.82918));

    // Out of budget, the mirror contributes nothing.
    assert_eq!(w.reflected_color(&comps, 0).unwrap(), Color::black());
}

#[test]
fn mutually_reflective_surfaces_terminate() {
    let mirror = Material { reflective: 1.0, ..Default::default() };
    let lower = Shape::plane()
        .with_material(mirror)
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0));
    let upper = Shape::plane()
        .with_material(mirror)
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0));

    let w = World::empty()
        .with_light(PointLight::new(Color::white(), Tuple4D::origin()))
        .with_object(lower)
        .with_object(upper);

    let r = Ray4D::new(Tuple4D::origin(), Tuple4D::vector(0.0, 1.0, 0.0));

    // With no budget left, the bounce between the mirrors ends in black.
    let comps = comps_for(&r, 1.0, &w.objects()[1]);
    assert_eq!(w.reflected_color(&comps, 0).unwrap(), Color::black());

    for remaining in 0..8 {
        let c = w.color_at(&r, remaining).unwrap();
        assert!(c.r.is_finite() && c.g.is_finite() && c.b.is_finite());
    }
}

#[test]
fn refracted_color_of_opaque_surface_or_out_of_budget() {
    let w = World::default();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0)
    );

    let opaque = &w.objects()[0];
    let comps = comps_for(&r, 4.0, opaque);
    assert_eq!(w.refracted_color(&comps, 5).unwrap(), Color::black());

    let glass = opaque.with_material(Material {
        transparency: 1.0, refractive_index: 1.5, ..*opaque.material()
    });
    let xs = Intersections { intersections: vec![
        Intersection::new(4.0, &glass), Intersection::new(6.0, &glass)
    ]};
    let comps = PreComputations::new(&r, &xs.intersections[0], &xs).unwrap();
    assert_eq!(w.refracted_color(&comps, 0).unwrap(), Color::black());
}

#[test]
fn refracted_color_under_total_internal_reflection() {
    let w = World::default();
    let outer = &w.objects()[0];
    let glass = outer.with_material(Material {
        transparency: 1.0, refractive_index: 1.5, ..*outer.material()
    });

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, r2()), Tuple4D::vector(0.0, 1.0, 0.0)
    );
    let xs = Intersections { intersections: vec![
        Intersection::new(-r2(), &glass), Intersection::new(r2(), &glass)
    ]};
    let comps = PreComputations::new(&r, &xs.intersections[1], &xs).unwrap();

    assert_eq!(w.refracted_color(&comps, 5).unwrap(), Color::black());
}

#[cfg(test)]
fn transparent_floor_world(reflective: f64) -> World {
    let floor = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0))
        .with_material(Material {
            reflective,
            transparency: 0.5,
            refractive_index: 1.5,
            ..Default::default()
        });

    let ball = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, -3.5, -0.5))
        .with_material(Material {
            color: Color::rgb(1.0, 0.0, 0.0),
            ambient: 0.5,
            ..Default::default()
        });

    World::default().with_object(floor).with_object(ball)
}

#[test]
fn shade_hit_with_transparent_material() {
    let w = transparent_floor_world(0.0);
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -3.0), Tuple4D::vector(0.0, -r2(), r2())
    );
    let comps = comps_for(&r, 2.0f64.sqrt(), &w.objects()[2]);

    assert_eq!(w.shade_hit(&comps, 5).unwrap(),
        Color::rgb(0.93642, 0.68642, 0.68642));
}

#[test]
fn shade_hit_with_reflective_transparent_material() {
    let w = transparent_floor_world(0.5);
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -3.0), Tuple4D::vector(0.0, -r2(), r2())
    );
    let comps = comps_for(&r, 2.0f64.sqrt(), &w.objects()[2]);

    assert_eq!(w.shade_hit(&comps, 5).unwrap(),
        Color::rgb(0.93391, 0.69643, 0.69643));
}
