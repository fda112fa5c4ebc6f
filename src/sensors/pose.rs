use crate::common::rotation_from_euler_zxy;
use crate::{Iso3, Point3, UnitQuat};
use parking_lot::RwLock;
use std::sync::Arc;

/// Tells the sensor where it is mounted in the world. It is read once per captured packet.
pub trait PoseSource: Send + Sync {
    fn position(&self) -> Point3;
    fn orientation(&self) -> UnitQuat;

    fn pose(&self) -> Iso3 {
        Iso3::from_parts(self.position().coords.into(), self.orientation())
    }
}

/// A sensor bolted in place
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPose(pub Iso3);

impl FixedPose {
    pub fn identity() -> Self {
        Self(Iso3::identity())
    }
}

impl PoseSource for FixedPose {
    fn position(&self) -> Point3 {
        Point3::from(self.0.translation.vector)
    }

    fn orientation(&self) -> UnitQuat {
        self.0.rotation
    }
}

/// A pose which can be moved while the sensor is running. Clones share the same pose, so one can
/// be handed to the sensor and another kept to drive it.
#[derive(Debug, Clone, Default)]
pub struct SharedPose {
    inner: Arc<RwLock<Iso3>>,
}

/// The world axes a position component can be set along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl SharedPose {
    pub fn new(pose: Iso3) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pose)),
        }
    }

    pub fn set_pose(&self, pose: Iso3) {
        *self.inner.write() = pose;
    }

    pub fn set_position(&self, position: Point3) {
        self.inner.write().translation.vector = position.coords;
    }

    /// Sets a single component of the position, leaving the others as they are
    pub fn set_position_axis(&self, axis: Axis, value: f64) {
        let mut pose = self.inner.write();
        match axis {
            Axis::X => pose.translation.vector.x = value,
            Axis::Y => pose.translation.vector.y = value,
            Axis::Z => pose.translation.vector.z = value,
        }
    }

    /// Sets the orientation from Z-X-Y Euler angles in degrees, see `rotation_from_euler_zxy`
    pub fn set_rotation_euler(&self, x: f64, y: f64, z: f64) {
        self.inner.write().rotation = rotation_from_euler_zxy(x, y, z);
    }
}

impl PoseSource for SharedPose {
    fn position(&self) -> Point3 {
        Point3::from(self.inner.read().translation.vector)
    }

    fn orientation(&self) -> UnitQuat {
        self.inner.read().rotation
    }

    fn pose(&self) -> Iso3 {
        *self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::euler_zxy_degrees;
    use crate::Vector3;
    use approx::assert_relative_eq;

    #[test]
    fn shared_pose_is_shared_between_clones() {
        let driver = SharedPose::default();
        let sensor_side = driver.clone();
        driver.set_position(Point3::new(1.0, 2.0, 3.0));
        driver.set_position_axis(Axis::Y, -4.0);
        assert_eq!(sensor_side.position(), Point3::new(1.0, -4.0, 3.0));
    }

    #[test]
    fn euler_rotation_round_trips() {
        let pose = SharedPose::default();
        pose.set_rotation_euler(5.0, 90.0, 0.0);
        let [x, y, z] = euler_zxy_degrees(&pose.orientation());
        assert_relative_eq!(x, 5.0, epsilon = 1.0e-9);
        assert_relative_eq!(y, 90.0, epsilon = 1.0e-9);
        assert_relative_eq!(z, 0.0, epsilon = 1.0e-9);
    }

    #[test]
    fn pose_is_never_torn_by_concurrent_writes() {
        let a = Iso3::translation(1.0, 0.0, 0.0);
        let b = Iso3::from_parts(
            Vector3::new(0.0, 5.0, 0.0).into(),
            UnitQuat::from_euler_angles(0.0, 0.0, 1.0),
        );
        let shared = SharedPose::new(a);
        let writer = shared.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..10_000 {
                writer.set_pose(if i % 2 == 0 { b } else { a });
            }
        });
        for _ in 0..10_000 {
            let read = shared.pose();
            assert!(read == a || read == b);
        }
        handle.join().unwrap();
    }

    #[test]
    fn fixed_pose_reports_parts() {
        let iso = Iso3::translation(1.0, 0.0, -2.0);
        let fixed = FixedPose(iso);
        assert_eq!(fixed.position(), Point3::new(1.0, 0.0, -2.0));
        assert_eq!(fixed.pose(), iso);
    }
}
