//! Simulation of an external scanning LiDAR mounted in a 3D scene. A bidirectional scan pattern
//! is traced against a scene oracle line by line, each line becomes a timestamped packet, and a
//! full sweep becomes a frame that can be exported as an ASCII PLY point cloud.

use std::error::Error;

pub mod common;
pub mod config;
pub mod errors;
pub mod frame;
pub mod geom3;
pub mod io;
pub mod scene;
pub mod sensors;

pub use config::{AutoSave, SensorConfig};
pub use frame::{LidarFrame, LidarPacket, LidarPoint};
pub use geom3::{Iso3, Point3, SurfacePoint3, UnitQuat, UnitVec3, Vector3};
pub use sensors::{ExternalLidar, ScanOutcome};

pub type Result<T> = std::result::Result<T, Box<dyn Error>>;
