//! This module contains the simulated external LiDAR and the pieces it is assembled from: the
//! scan pattern, the range sampler, and the collaborators that tell it where it is and what time
//! it is.

mod clock;
mod external_lidar;
mod pose;
mod range_sampler;
mod scan_pattern;

pub use clock::{Clock, SimClock};
pub use external_lidar::{ExternalLidar, FrameListener, PacketListener, ScanOutcome};
pub use pose::{Axis, FixedPose, PoseSource, SharedPose};
pub use range_sampler::{gaussian, RangeSampler};
pub use scan_pattern::{ScanAngles, ScanPattern};
