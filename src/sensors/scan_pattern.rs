//! The scan pattern maps a (line, point) index pair to a ray direction. Lines tessellate the
//! vertical field of view and points tessellate the horizontal one, both centered on the forward
//! axis. An optional radial "fisheye" distortion magnifies both angles more strongly toward the
//! edges of the field.

use crate::common::{normalized_index, tessellate, SweepDir};
use crate::geom3::forward;
use crate::{SensorConfig, UnitQuat, UnitVec3, Vector3};

/// The deflection of a single ray from the forward axis, in degrees. Positive vertical angles
/// point down (toward `-Y`) and positive horizontal angles point right (toward `+X`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanAngles {
    pub vertical: f64,
    pub horizontal: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanPattern {
    vertical_fov: f64,
    horizontal_fov: f64,
    line_count: usize,
    points_per_line: usize,
    fisheye_strength: f64,
}

impl ScanPattern {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            vertical_fov: config.vertical_fov(),
            horizontal_fov: config.horizontal_fov(),
            line_count: config.line_count(),
            points_per_line: config.points_per_line(),
            fisheye_strength: config.fisheye_strength(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn points_per_line(&self) -> usize {
        self.points_per_line
    }

    /// The linear tessellation angles before any distortion is applied
    pub fn undistorted_angles(&self, line: usize, index: usize) -> ScanAngles {
        ScanAngles {
            vertical: tessellate(self.vertical_fov, self.line_count, line),
            horizontal: tessellate(self.horizontal_fov, self.points_per_line, index),
        }
    }

    /// The factor both angles are multiplied by: `1 + strength * (h^2 + v^2)` where `h` and `v`
    /// are the indices normalized to [-1, 1]
    pub fn fisheye_scale(&self, line: usize, index: usize) -> f64 {
        let norm_h = normalized_index(self.points_per_line, index);
        let norm_v = normalized_index(self.line_count, line);
        1.0 + self.fisheye_strength * (norm_h * norm_h + norm_v * norm_v)
    }

    /// The final deflection angles of a ray, distortion included
    pub fn angles(&self, line: usize, index: usize) -> ScanAngles {
        let base = self.undistorted_angles(line, index);
        let scale = self.fisheye_scale(line, index);
        ScanAngles {
            vertical: base.vertical * scale,
            horizontal: base.horizontal * scale,
        }
    }

    /// The ray direction in the sensor-local frame: the forward axis rotated about X by the
    /// vertical angle and then about Y by the horizontal angle
    pub fn local_direction(&self, line: usize, index: usize) -> UnitVec3 {
        let a = self.angles(line, index);
        let rotation = UnitQuat::from_axis_angle(&Vector3::y_axis(), a.horizontal.to_radians())
            * UnitQuat::from_axis_angle(&Vector3::x_axis(), a.vertical.to_radians());
        rotation * forward()
    }

    /// The ray direction in the world frame for a sensor with the given orientation
    pub fn world_direction(&self, orientation: &UnitQuat, line: usize, index: usize) -> UnitVec3 {
        orientation * self.local_direction(line, index)
    }

    /// The sweep direction of a line along with its point indices in emission order. Both sweep
    /// directions visit the same set of horizontal angles.
    pub fn traversal(&self, line: usize) -> (SweepDir, Vec<usize>) {
        let dir = SweepDir::from_line_index(line);
        (dir, dir.traversal(self.points_per_line).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn pattern(lines: usize, points: usize, v_fov: f64, h_fov: f64, fisheye: f64) -> ScanPattern {
        let mut config = SensorConfig::default();
        config.set_line_count(lines).unwrap();
        config.set_points_per_line(points).unwrap();
        config.set_vertical_fov(v_fov).unwrap();
        config.set_horizontal_fov(h_fov).unwrap();
        config.set_fisheye_strength(fisheye).unwrap();
        ScanPattern::new(&config)
    }

    #[test]
    fn zero_fisheye_is_exact_tessellation() {
        let p = pattern(4, 8, 30.0, 90.0, 0.0);
        for line in 0..4 {
            for i in 0..8 {
                let a = p.angles(line, i);
                assert_eq!(a.vertical, tessellate(30.0, 4, line));
                assert_eq!(a.horizontal, tessellate(90.0, 8, i));
            }
        }
    }

    #[test]
    fn fisheye_magnifies_edges_not_center() {
        let p = pattern(5, 5, 20.0, 40.0, 0.5);
        let center = p.angles(2, 2);
        assert_eq!(center.vertical, 0.0);
        assert_eq!(center.horizontal, 0.0);
        assert_eq!(p.fisheye_scale(2, 2), 1.0);

        // Corner is at normalized (1, 1), so the scale is 1 + 0.5 * 2
        let corner = p.angles(4, 4);
        assert_relative_eq!(corner.vertical, 20.0, epsilon = 1.0e-12);
        assert_relative_eq!(corner.horizontal, 40.0, epsilon = 1.0e-12);

        // Edge midpoint is at normalized (1, 0)
        assert_relative_eq!(p.fisheye_scale(2, 4), 1.5, epsilon = 1.0e-12);
    }

    #[test]
    fn center_ray_points_forward() {
        let p = pattern(3, 3, 30.0, 90.0, 0.0);
        let d = p.local_direction(1, 1);
        assert_relative_eq!(d.z, 1.0, epsilon = 1.0e-12);
    }

    #[test_case(10.0, 0.0)]
    #[test_case(0.0, 30.0)]
    #[test_case(-15.0, -45.0)]
    fn direction_matches_spherical_form(v: f64, h: f64) {
        // A 1 line by 1 point pattern sits at -fov/2, so pick fovs which produce the angle
        let p = pattern(1, 1, -2.0 * v, -2.0 * h, 0.0);
        let d = p.local_direction(0, 0);
        let (v, h) = (v.to_radians(), h.to_radians());
        assert_relative_eq!(d.x, v.cos() * h.sin(), epsilon = 1.0e-12);
        assert_relative_eq!(d.y, -v.sin(), epsilon = 1.0e-12);
        assert_relative_eq!(d.z, v.cos() * h.cos(), epsilon = 1.0e-12);
    }

    #[test]
    fn sweep_direction_only_reorders() {
        let p = pattern(2, 6, 10.0, 60.0, 0.3);
        let (d0, even) = p.traversal(0);
        let (d1, odd) = p.traversal(1);
        assert_eq!(d0, SweepDir::LeftToRight);
        assert_eq!(d1, SweepDir::RightToLeft);
        let mut reversed = odd.clone();
        reversed.reverse();
        assert_eq!(even, reversed);
        assert_eq!(p.angles(1, odd[0]).horizontal, p.angles(1, 5).horizontal);
    }

    #[test]
    fn world_direction_applies_orientation() {
        let p = pattern(3, 3, 30.0, 90.0, 0.0);
        let yaw = UnitQuat::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2);
        let d = p.world_direction(&yaw, 1, 1);
        assert_relative_eq!(d.x, 1.0, epsilon = 1.0e-12);
    }
}
