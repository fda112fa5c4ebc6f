//! This module contains common constructs for working with scan angles and sensor orientations

use crate::{UnitQuat, Vector3};
use serde::{Deserialize, Serialize};

/// Enumerates the two directions a scan line can be traversed in. The mechanical scanner being
/// modeled is bidirectional, so consecutive lines alternate between them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepDir {
    LeftToRight,
    RightToLeft,
}

impl SweepDir {
    /// Even lines sweep left to right, odd lines sweep right to left
    pub fn from_line_index(line_index: usize) -> Self {
        if line_index % 2 == 0 {
            SweepDir::LeftToRight
        } else {
            SweepDir::RightToLeft
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            SweepDir::LeftToRight => SweepDir::RightToLeft,
            SweepDir::RightToLeft => SweepDir::LeftToRight,
        }
    }

    /// Compact ASCII label used in point cloud header comments
    pub fn short_label(self) -> &'static str {
        match self {
            SweepDir::LeftToRight => "L->R",
            SweepDir::RightToLeft => "R->L",
        }
    }

    pub fn long_label(self) -> &'static str {
        match self {
            SweepDir::LeftToRight => "Left to Right",
            SweepDir::RightToLeft => "Right to Left",
        }
    }

    /// Returns the point indices of a line of `count` points in the order they are emitted. The
    /// index itself always identifies the same horizontal angle; only the order changes.
    pub fn traversal(self, count: usize) -> Box<dyn Iterator<Item = usize> + Send> {
        match self {
            SweepDir::LeftToRight => Box::new(0..count),
            SweepDir::RightToLeft => Box::new((0..count).rev()),
        }
    }
}

/// Re-expresses an angle, specified in degrees, in the range [0, 360).
///
/// # Examples
///
/// ```
/// use lidar_sim::common::angle_to_360;
/// assert_eq!(angle_to_360(-90.0), 270.0);
/// assert_eq!(angle_to_360(725.0), 5.0);
/// ```
pub fn angle_to_360(angle: f64) -> f64 {
    // Adding zero turns -0.0 into 0.0, and rem_euclid can round up to exactly 360.0 for tiny
    // negative inputs
    let angle = angle.rem_euclid(360.0) + 0.0;
    if angle >= 360.0 { 0.0 } else { angle }
}

/// Builds a rotation from Euler angles in degrees, applied about Z first, then X, then Y, so that
/// `R = Ry(y) * Rx(x) * Rz(z)`. This is the same composition the scan pattern uses for its
/// vertical (X) and horizontal (Y) deflection.
pub fn rotation_from_euler_zxy(x: f64, y: f64, z: f64) -> UnitQuat {
    UnitQuat::from_axis_angle(&Vector3::y_axis(), y.to_radians())
        * UnitQuat::from_axis_angle(&Vector3::x_axis(), x.to_radians())
        * UnitQuat::from_axis_angle(&Vector3::z_axis(), z.to_radians())
}

/// Decomposes a rotation into the Z-X-Y Euler angles of `rotation_from_euler_zxy`, returning
/// `[x, y, z]` in degrees, each wrapped to [0, 360).
pub fn euler_zxy_degrees(rotation: &UnitQuat) -> [f64; 3] {
    let m = rotation.to_rotation_matrix();
    let m = m.matrix();

    let sx = (-m[(1, 2)]).clamp(-1.0, 1.0);
    let x = sx.asin();
    let (y, z) = if sx.abs() < 1.0 - 1.0e-9 {
        (m[(0, 2)].atan2(m[(2, 2)]), m[(1, 0)].atan2(m[(1, 1)]))
    } else {
        // Gimbal lock, fold all of the remaining rotation into y
        ((-m[(2, 0)]).atan2(m[(0, 0)]), 0.0)
    };

    [
        angle_to_360(x.to_degrees()),
        angle_to_360(y.to_degrees()),
        angle_to_360(z.to_degrees()),
    ]
}
