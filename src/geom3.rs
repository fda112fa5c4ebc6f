//! Geometry aliases shared by the scan engine. Everything is `f64` and built on the nalgebra types
//! re-exported by parry, so scene shapes and sensor math speak the same language.
//!
//! The sensor-local frame has forward along `+Z`, up along `+Y` and right along `+X`.

pub use crate::common::surface_point::SurfacePoint3;

pub type Point3 = parry3d_f64::na::Point3<f64>;
pub type Vector3 = parry3d_f64::na::Vector3<f64>;
pub type UnitVec3 = parry3d_f64::na::Unit<Vector3>;
pub type UnitQuat = parry3d_f64::na::UnitQuaternion<f64>;
pub type Iso3 = parry3d_f64::na::Isometry3<f64>;

/// The forward axis of the sensor-local frame, along which an undeflected ray travels
pub fn forward() -> UnitVec3 {
    Vector3::z_axis()
}
