//! Point, packet and frame records produced by the scanner

use crate::common::{Color, SweepDir};
use crate::{Iso3, Point3, UnitQuat};
use serde::{Deserialize, Serialize};

/// A single sampled surface return
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidarPoint {
    /// Scene position after range noise has been applied
    pub position: Point3,

    /// Lambertian incidence factor, 0 for grazing hits and 1 for head-on hits
    pub intensity: f64,

    pub color: Color,
}

impl LidarPoint {
    pub fn new(position: Point3, intensity: f64, color: Color) -> Self {
        Self {
            position,
            intensity,
            color,
        }
    }
}

/// One scan line worth of points along with the conditions it was captured under. The points are
/// in emission order, so a right-to-left packet lists its points from the highest horizontal
/// index down. A packet may be empty if every ray on the line missed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LidarPacket {
    pub line_index: usize,
    pub direction: SweepDir,
    pub points: Vec<LidarPoint>,

    /// Simulation time at which the line was captured, in seconds
    pub timestamp: f64,

    pub sensor_position: Point3,
    pub sensor_rotation: UnitQuat,
}

impl LidarPacket {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The sensor pose at the moment the packet was captured
    pub fn sensor_pose(&self) -> Iso3 {
        Iso3::from_parts(self.sensor_position.coords.into(), self.sensor_rotation)
    }
}

/// One full sweep across every scan line. While a frame is being captured its end time is unset
/// and `total_points` only counts packets which have been fully appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LidarFrame {
    /// Sequence number of the frame within the sensor which produced it
    pub frame_index: u64,

    packets: Vec<LidarPacket>,
    frame_start_time: f64,
    frame_end_time: Option<f64>,
    total_points: usize,
}

impl LidarFrame {
    pub fn new(frame_index: u64, frame_start_time: f64) -> Self {
        Self {
            frame_index,
            packets: Vec::new(),
            frame_start_time,
            frame_end_time: None,
            total_points: 0,
        }
    }

    /// Appends a packet, keeping the running point total in step with the packet contents
    pub fn push_packet(&mut self, packet: LidarPacket) {
        self.total_points += packet.len();
        self.packets.push(packet);
    }

    /// Marks the frame as complete at the given time
    pub fn finish(&mut self, frame_end_time: f64) {
        self.frame_end_time = Some(frame_end_time);
    }

    pub fn packets(&self) -> &[LidarPacket] {
        &self.packets
    }

    pub fn total_points(&self) -> usize {
        self.total_points
    }

    pub fn frame_start_time(&self) -> f64 {
        self.frame_start_time
    }

    /// The completion time, `None` while the frame is still being captured or if the capture was
    /// cancelled
    pub fn frame_end_time(&self) -> Option<f64> {
        self.frame_end_time
    }

    pub fn is_complete(&self) -> bool {
        self.frame_end_time.is_some()
    }

    pub fn duration(&self) -> Option<f64> {
        self.frame_end_time.map(|end| end - self.frame_start_time)
    }

    /// Iterates every point in frame order: packet order, then point order within each packet
    pub fn points(&self) -> impl Iterator<Item = &LidarPoint> {
        self.packets.iter().flat_map(|p| p.points.iter())
    }

    /// Flattens the frame into a single point cloud in frame order
    pub fn point_cloud(&self) -> Vec<LidarPoint> {
        self.points().copied().collect()
    }
}
