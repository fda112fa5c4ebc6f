//! Turns ray hits into LiDAR points: the range is perturbed with Gaussian noise along the surface
//! normal, the intensity follows the cosine of the incidence angle, and the color comes from
//! whatever the hit surface offers.

use crate::frame::LidarPoint;
use crate::scene::{SceneHit, SceneOracle};
use crate::{Point3, SensorConfig, UnitVec3};
use log::trace;
use parry3d_f64::query::Ray;
use rand::Rng;
use std::f64::consts::PI;

/// Draws one sample from a normal distribution using the Box-Muller transform. Both uniforms are
/// taken from (0, 1] so the logarithm is always finite.
pub fn gaussian<R: Rng>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = 1.0 - rng.random::<f64>();
    let standard = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();
    mean + std_dev * standard
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSampler {
    scan_radius: f64,
    noise_std_dev: f64,
}

impl RangeSampler {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            scan_radius: config.scan_radius(),
            noise_std_dev: config.noise_std_dev(),
        }
    }

    pub fn scan_radius(&self) -> f64 {
        self.scan_radius
    }

    /// Queries the oracle for the hit along a ray, limited to the scan radius. Oracle failures
    /// are reported as misses.
    pub fn cast<S: SceneOracle + ?Sized>(
        &self,
        origin: &Point3,
        direction: &UnitVec3,
        oracle: &S,
    ) -> Option<SceneHit> {
        let ray = Ray::new(*origin, direction.into_inner());
        match oracle.cast_ray(&ray, self.scan_radius) {
            Ok(hit) => hit,
            Err(e) => {
                trace!("Scene query failed, treating as a miss: {e}");
                None
            }
        }
    }

    /// Builds a point from a hit. Exactly one Gaussian draw is taken from `rng` per call, even
    /// when the noise is zero, so the random stream depends only on the number of hits.
    pub fn point_from_hit<R: Rng>(
        &self,
        hit: &SceneHit,
        direction: &UnitVec3,
        rng: &mut R,
    ) -> LidarPoint {
        let noise = gaussian(rng, 0.0, self.noise_std_dev);
        let surface = hit.surface_point();
        let position = surface.at_distance(noise);
        let intensity = surface.incidence_cosine(direction).max(0.0);
        LidarPoint::new(position, intensity, hit.color.resolve())
    }

    /// Samples a single ray, producing a point on a hit and nothing on a miss
    pub fn sample<S: SceneOracle + ?Sized, R: Rng>(
        &self,
        origin: &Point3,
        direction: &UnitVec3,
        oracle: &S,
        rng: &mut R,
    ) -> Option<LidarPoint> {
        self.cast(origin, direction, oracle)
            .map(|hit| self.point_from_hit(&hit, direction, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Color;
    use crate::errors::SceneError;
    use crate::scene::SurfaceColor;
    use crate::Vector3;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// An infinite plane at z = `depth` facing the sensor, or a failing oracle
    struct PlaneOracle {
        depth: f64,
        fail: bool,
    }

    impl SceneOracle for PlaneOracle {
        fn cast_ray(&self, ray: &Ray, max_distance: f64) -> Result<Option<SceneHit>, SceneError> {
            if self.fail {
                return Err(SceneError::Other("backend unavailable".to_string()));
            }
            if ray.dir.z <= 0.0 {
                return Ok(None);
            }
            let t = (self.depth - ray.origin.z) / ray.dir.z;
            if t > max_distance {
                return Ok(None);
            }
            Ok(Some(SceneHit {
                point: ray.point_at(t),
                normal: -Vector3::z_axis(),
                distance: t,
                color: SurfaceColor::Flat(Color::rgb(0.2, 0.4, 0.6)),
            }))
        }
    }

    fn sampler(radius: f64, noise: f64) -> RangeSampler {
        let mut config = SensorConfig::default();
        config.set_scan_radius(radius).unwrap();
        config.set_noise_std_dev(noise).unwrap();
        RangeSampler::new(&config)
    }

    #[test]
    fn zero_noise_lands_on_surface() {
        let oracle = PlaneOracle { depth: 10.0, fail: false };
        let mut rng = StdRng::seed_from_u64(1);
        let dir = UnitVec3::new_normalize(Vector3::new(0.3, -0.2, 1.0));
        let hit = sampler(100.0, 0.0).cast(&Point3::origin(), &dir, &oracle).unwrap();
        let p = sampler(100.0, 0.0).point_from_hit(&hit, &dir, &mut rng);
        assert_eq!(p.position, hit.point);
        assert_eq!(p.color, Color::rgb(0.2, 0.4, 0.6));
    }

    #[test]
    fn head_on_hit_has_full_intensity() {
        let oracle = PlaneOracle { depth: 10.0, fail: false };
        let mut rng = StdRng::seed_from_u64(1);
        let p = sampler(100.0, 0.0)
            .sample(&Point3::origin(), &Vector3::z_axis(), &oracle, &mut rng)
            .unwrap();
        assert_relative_eq!(p.intensity, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn tangent_hit_has_zero_intensity() {
        let hit = SceneHit {
            point: Point3::new(0.0, 0.0, 5.0),
            normal: Vector3::y_axis(),
            distance: 5.0,
            color: SurfaceColor::None,
        };
        let mut rng = StdRng::seed_from_u64(2);
        let p = sampler(100.0, 0.0).point_from_hit(&hit, &Vector3::z_axis(), &mut rng);
        assert_eq!(p.intensity, 0.0);
        assert_eq!(p.color, Color::WHITE);
    }

    #[test]
    fn back_face_intensity_clamps_to_zero() {
        let hit = SceneHit {
            point: Point3::new(0.0, 0.0, 5.0),
            normal: Vector3::z_axis(),
            distance: 5.0,
            color: SurfaceColor::None,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let p = sampler(100.0, 0.0).point_from_hit(&hit, &Vector3::z_axis(), &mut rng);
        assert_eq!(p.intensity, 0.0);
    }

    #[test]
    fn out_of_range_and_failures_are_misses() {
        let mut rng = StdRng::seed_from_u64(4);
        let near = PlaneOracle { depth: 10.0, fail: false };
        let broken = PlaneOracle { depth: 10.0, fail: true };
        let s = sampler(5.0, 0.0);
        assert!(s.sample(&Point3::origin(), &Vector3::z_axis(), &near, &mut rng).is_none());
        let s = sampler(50.0, 0.0);
        assert!(s.sample(&Point3::origin(), &Vector3::z_axis(), &broken, &mut rng).is_none());
    }

    #[test]
    fn noise_moves_along_normal_only() {
        let oracle = PlaneOracle { depth: 10.0, fail: false };
        let mut rng = StdRng::seed_from_u64(5);
        let s = sampler(100.0, 0.05);
        for _ in 0..100 {
            let p = s.sample(&Point3::origin(), &Vector3::z_axis(), &oracle, &mut rng).unwrap();
            assert_eq!(p.position.x, 0.0);
            assert_eq!(p.position.y, 0.0);
            assert!((p.position.z - 10.0).abs() < 0.05 * 8.0);
        }
    }

    #[test]
    fn gaussian_statistics() {
        let mut rng = StdRng::seed_from_u64(6);
        let n = 20000;
        let samples = (0..n).map(|_| gaussian(&mut rng, 1.0, 2.0)).collect::<Vec<_>>();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
        assert_relative_eq!(mean, 1.0, epsilon = 0.1);
        assert_relative_eq!(var.sqrt(), 2.0, epsilon = 0.1);
    }

    #[test]
    fn same_seed_same_points() {
        let oracle = PlaneOracle { depth: 10.0, fail: false };
        let s = sampler(100.0, 0.1);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..10)
                .map(|_| s.sample(&Point3::origin(), &Vector3::z_axis(), &oracle, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
        assert_ne!(run(9), run(10));
    }
}
