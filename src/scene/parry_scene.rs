//! A scene oracle over parry3d shapes. Rays are cast against each object in turn and the nearest
//! hit wins, which is plenty for the handful of objects a simulated test bench holds.

use super::{SceneHit, SceneOracle, SurfaceColor, Texture2};
use crate::common::Color;
use crate::errors::SceneError;
use crate::{Iso3, Point3, SurfacePoint3, Vector3};
use parry3d_f64::query::{Ray, RayCast};
use parry3d_f64::shape::SharedShape;
use std::sync::Arc;

/// Maps an object-local point to texture coordinates by projecting it onto two axes. Each axis
/// vector spans exactly one repeat of the texture, so `u = (p - origin) . u_axis / |u_axis|^2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvProjection {
    pub origin: Point3,
    pub u_axis: Vector3,
    pub v_axis: Vector3,
}

impl UvProjection {
    pub fn new(origin: Point3, u_axis: Vector3, v_axis: Vector3) -> Self {
        Self {
            origin,
            u_axis,
            v_axis,
        }
    }

    pub fn uv(&self, local: &Point3) -> [f64; 2] {
        let d = local - self.origin;
        [
            d.dot(&self.u_axis) / self.u_axis.norm_squared(),
            d.dot(&self.v_axis) / self.v_axis.norm_squared(),
        ]
    }
}

/// The appearance of an object's surface
#[derive(Debug, Clone)]
pub enum Surface {
    Textured {
        texture: Arc<Texture2>,
        projection: UvProjection,
    },
    Flat(Color),
    Bare,
}

/// A shape placed in the scene with a surface appearance
#[derive(Clone)]
pub struct SceneObject {
    pub shape: SharedShape,
    pub pose: Iso3,
    pub surface: Surface,
}

impl SceneObject {
    pub fn new(shape: SharedShape, pose: Iso3, surface: Surface) -> Self {
        Self {
            shape,
            pose,
            surface,
        }
    }

    fn surface_color(&self, world_point: &Point3) -> SurfaceColor {
        match &self.surface {
            Surface::Textured {
                texture,
                projection,
            } => {
                let local = self.pose.inverse_transform_point(world_point);
                SurfaceColor::Textured {
                    texture: texture.clone(),
                    uv: projection.uv(&local),
                }
            }
            Surface::Flat(color) => SurfaceColor::Flat(*color),
            Surface::Bare => SurfaceColor::None,
        }
    }
}

#[derive(Clone, Default)]
pub struct ParryScene {
    objects: Vec<SceneObject>,
}

impl ParryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object to the scene and returns its index
    pub fn add(&mut self, object: SceneObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn with_object(mut self, object: SceneObject) -> Self {
        self.add(object);
        self
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl SceneOracle for ParryScene {
    fn cast_ray(&self, ray: &Ray, max_distance: f64) -> Result<Option<SceneHit>, SceneError> {
        if !(ray.dir.iter().all(|v| v.is_finite()) && ray.origin.iter().all(|v| v.is_finite())) {
            return Err(SceneError::InvalidRay);
        }

        let nearest = self
            .objects
            .iter()
            .enumerate()
            .filter_map(|(i, obj)| {
                obj.shape
                    .cast_ray_and_get_normal(&obj.pose, ray, max_distance, false)
                    .map(|ri| (i, ri))
            })
            .min_by(|a, b| a.1.time_of_impact.total_cmp(&b.1.time_of_impact));

        let Some((i, ri)) = nearest else {
            return Ok(None);
        };

        let point = ray.point_at(ri.time_of_impact);
        let sp = SurfacePoint3::try_new_normalize(point, ri.normal)
            .ok_or(SceneError::DegenerateNormal { object: i })?;

        Ok(Some(SceneHit {
            point: sp.point,
            normal: sp.normal,
            distance: ri.time_of_impact,
            color: self.objects[i].surface_color(&point),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnitVec3;
    use approx::assert_relative_eq;

    fn wall(z: f64, surface: Surface) -> SceneObject {
        SceneObject::new(
            SharedShape::cuboid(5.0, 5.0, 0.5),
            Iso3::translation(0.0, 0.0, z + 0.5),
            surface,
        )
    }

    #[test]
    fn nearest_object_wins() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        let scene = ParryScene::new()
            .with_object(wall(20.0, Surface::Flat(blue)))
            .with_object(wall(10.0, Surface::Flat(red)));

        let ray = Ray::new(Point3::origin(), Vector3::z());
        let hit = scene.cast_ray(&ray, 100.0).unwrap().unwrap();
        assert_relative_eq!(hit.distance, 10.0, epsilon = 1.0e-9);
        assert_relative_eq!(hit.point.z, 10.0, epsilon = 1.0e-9);
        assert_relative_eq!(hit.normal.z, -1.0, epsilon = 1.0e-9);
        assert_eq!(hit.color.resolve(), red);
    }

    #[test]
    fn max_distance_limits_hits() {
        let scene = ParryScene::new().with_object(wall(10.0, Surface::Bare));
        let ray = Ray::new(Point3::origin(), Vector3::z());
        assert!(scene.cast_ray(&ray, 5.0).unwrap().is_none());
        assert!(scene.cast_ray(&ray, 15.0).unwrap().is_some());
    }

    #[test]
    fn ray_outside_bounds_misses() {
        let scene = ParryScene::new().with_object(wall(10.0, Surface::Bare));
        let dir = UnitVec3::new_normalize(Vector3::new(1.0, 0.0, 1.0));
        let ray = Ray::new(Point3::origin(), dir.into_inner());
        assert!(scene.cast_ray(&ray, 100.0).unwrap().is_none());
    }

    #[test]
    fn textured_hit_reports_uv() {
        let texture = Arc::new(Texture2::checkerboard(2, 1, Color::BLACK, Color::WHITE));
        let projection = UvProjection::new(
            Point3::new(-5.0, -5.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(0.0, 10.0, 0.0),
        );
        let scene = ParryScene::new().with_object(wall(
            10.0,
            Surface::Textured {
                texture,
                projection,
            },
        ));

        let ray = Ray::new(Point3::new(-2.5, -2.5, 0.0), Vector3::z());
        let hit = scene.cast_ray(&ray, 100.0).unwrap().unwrap();
        match hit.color {
            SurfaceColor::Textured { uv, .. } => {
                assert_relative_eq!(uv[0], 0.25, epsilon = 1.0e-9);
                assert_relative_eq!(uv[1], 0.25, epsilon = 1.0e-9);
            }
            other => panic!("expected a textured hit, got {other:?}"),
        }
        assert_eq!(hit.color.resolve(), Color::BLACK);
    }

    #[test]
    fn non_finite_ray_is_an_error() {
        let scene = ParryScene::new().with_object(wall(10.0, Surface::Bare));
        let ray = Ray::new(Point3::origin(), Vector3::new(f64::NAN, 0.0, 1.0));
        assert_eq!(scene.cast_ray(&ray, 100.0).unwrap_err(), SceneError::InvalidRay);
    }
}
