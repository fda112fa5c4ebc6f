//! The scene oracle boundary. The scanner never owns geometry; it only asks an oracle what a ray
//! hits. `ParryScene` is a ready-made oracle over parry3d shapes, and anything else (a spatial
//! index, an engine bridge, a test mock) can stand in by implementing `SceneOracle`.

mod parry_scene;
mod texture;

use crate::common::Color;
use crate::errors::SceneError;
use crate::{Point3, SurfacePoint3, UnitVec3};
use parry3d_f64::query::Ray;
use std::sync::Arc;

pub use parry_scene::{ParryScene, SceneObject, Surface, UvProjection};
pub use texture::Texture2;

/// Answers ray queries against a scene. Implementations are read-only from the scanner's point of
/// view and may be queried from several threads at once.
pub trait SceneOracle: Send + Sync {
    /// Casts a ray and returns the nearest hit within `max_distance` of the ray origin. The ray
    /// direction is unit length, so distances along it are in scene units.
    ///
    /// # Returns
    /// - `Ok(Some(hit))` - the nearest surface hit
    /// - `Ok(None)` - nothing was hit within range
    /// - `Err` - the query failed, which the scanner treats as a miss
    fn cast_ray(&self, ray: &Ray, max_distance: f64) -> Result<Option<SceneHit>, SceneError>;
}

impl<T: SceneOracle + ?Sized> SceneOracle for Arc<T> {
    fn cast_ray(&self, ray: &Ray, max_distance: f64) -> Result<Option<SceneHit>, SceneError> {
        (**self).cast_ray(ray, max_distance)
    }
}

/// Where the color of a hit comes from. This is a statement of what the hit surface can offer,
/// and the color is resolved from whichever source is present.
#[derive(Debug, Clone)]
pub enum SurfaceColor {
    /// The surface has a texture and the hit has texture coordinates on it
    Textured { texture: Arc<Texture2>, uv: [f64; 2] },

    /// The surface has a single base color
    Flat(Color),

    /// The surface has no color information
    None,
}

impl SurfaceColor {
    /// Resolves the color of the hit: a bilinear texture sample, the flat base color, or opaque
    /// white if the surface has nothing to offer
    pub fn resolve(&self) -> Color {
        match self {
            SurfaceColor::Textured { texture, uv } => texture.sample_bilinear(uv[0], uv[1]),
            SurfaceColor::Flat(color) => *color,
            SurfaceColor::None => Color::WHITE,
        }
    }
}

/// A ray hit reported by a scene oracle
#[derive(Debug, Clone)]
pub struct SceneHit {
    pub point: Point3,
    pub normal: UnitVec3,

    /// Distance from the ray origin to the hit point
    pub distance: f64,

    pub color: SurfaceColor,
}

impl SceneHit {
    pub fn surface_point(&self) -> SurfacePoint3 {
        SurfacePoint3::new(self.point, self.normal)
    }
}
