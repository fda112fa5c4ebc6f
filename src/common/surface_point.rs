use crate::{Iso3, Point3, UnitVec3, Vector3};
use serde::{Deserialize, Serialize};

/// A point on a surface together with the unit normal of the surface at that point. Ray hits
/// are reported this way, and range noise is applied by sliding the point along its normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint3 {
    pub point: Point3,
    pub normal: UnitVec3,
}

impl SurfacePoint3 {
    pub fn new(point: Point3, normal: UnitVec3) -> Self {
        Self { point, normal }
    }

    /// Builds a surface point from a normal which is not yet unit length. Returns `None` if the
    /// normal is too short to have a meaningful direction.
    pub fn try_new_normalize(point: Point3, normal: Vector3) -> Option<Self> {
        UnitVec3::try_new(normal, 1.0e-12).map(|n| Self::new(point, n))
    }

    /// Returns the point offset from the surface point by the given distance along the normal
    pub fn at_distance(&self, distance: f64) -> Point3 {
        self.point + self.normal.as_ref() * distance
    }

    /// Returns the cosine of the angle between the normal and the reverse of `direction`, the
    /// Lambertian factor of a ray arriving along `direction`. Negative values mean the ray hit
    /// the back of the surface.
    pub fn incidence_cosine(&self, direction: &UnitVec3) -> f64 {
        -direction.dot(self.normal.as_ref())
    }

    /// Returns a new surface point transformed by the given isometry
    pub fn transformed(&self, t: &Iso3) -> Self {
        Self::new(t * self.point, t * self.normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn displacement_follows_normal() {
        let sp = SurfacePoint3::new(Point3::new(1.0, 2.0, 3.0), Vector3::z_axis());
        let p = sp.at_distance(-0.5);
        assert_relative_eq!(p.z, 2.5);
        assert_eq!(sp.at_distance(0.0), sp.point);
    }

    #[test]
    fn degenerate_normal_is_rejected() {
        assert!(SurfacePoint3::try_new_normalize(Point3::origin(), Vector3::zeros()).is_none());
    }

    #[test]
    fn transformed_moves_point_and_rotates_normal() {
        let sp = SurfacePoint3::new(Point3::origin(), Vector3::x_axis());
        let t = Iso3::new(
            Vector3::new(0.0, 0.0, 5.0),
            Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
        );
        let moved = sp.transformed(&t);
        assert_relative_eq!(moved.point.z, 5.0);
        assert_relative_eq!(moved.normal.y, 1.0, epsilon = 1.0e-12);
    }
}
