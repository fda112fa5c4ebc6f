//! Plain-text frame statistics, one block per packet

use super::{fmt_seconds, fmt_triple, ExportStatus, FileSink};
use crate::common::euler_zxy_degrees;
use crate::frame::LidarFrame;
use crate::Result;
use log::{info, warn};
use std::fmt::Write;
use std::path::Path;

fn write_report(out: &mut String, frame: &LidarFrame) -> std::fmt::Result {
    writeln!(out, "LiDAR Frame Statistics")?;
    writeln!(out, "=====================")?;
    writeln!(out)?;
    writeln!(out, "Frame Start Time: {:.6}s", frame.frame_start_time())?;
    writeln!(out, "Frame End Time: {}", fmt_seconds(frame.frame_end_time()))?;
    writeln!(out, "Frame Duration: {}", fmt_seconds(frame.duration()))?;
    writeln!(out, "Total Packets: {}", frame.packets().len())?;
    writeln!(out, "Total Points: {}", frame.total_points())?;
    writeln!(out)?;
    writeln!(out, "Packet Details:")?;
    writeln!(out, "===============")?;

    for (i, packet) in frame.packets().iter().enumerate() {
        writeln!(out, "Packet {}:", i + 1)?;
        writeln!(out, "  Line Index: {}", packet.line_index)?;
        writeln!(out, "  Direction: {}", packet.direction.long_label())?;
        writeln!(out, "  Points: {}", packet.len())?;
        writeln!(out, "  Timestamp: {:.6}s", packet.timestamp)?;
        writeln!(
            out,
            "  Sensor Position: {}",
            fmt_triple(packet.sensor_position.coords.into())
        )?;
        writeln!(
            out,
            "  Sensor Rotation: {}",
            fmt_triple(euler_zxy_degrees(&packet.sensor_rotation))
        )?;
        writeln!(out)?;
    }
    Ok(())
}

/// Renders the statistics report of a frame, or `None` if the frame holds no points
pub fn frame_report(frame: &LidarFrame) -> Option<String> {
    if frame.total_points() == 0 {
        return None;
    }
    let mut out = String::new();
    write_report(&mut out, frame).ok()?;
    Some(out)
}

/// Writes the statistics report of a frame to `path` through the sink. A missing or empty frame
/// is skipped with a warning and the sink is not touched.
pub fn write_frame_report(
    sink: &dyn FileSink,
    path: &Path,
    frame: Option<&LidarFrame>,
) -> Result<ExportStatus> {
    let Some(text) = frame.and_then(frame_report) else {
        warn!("No LiDAR frame data to report");
        return Ok(ExportStatus::Skipped);
    };

    sink.write(path, &text)
        .map_err(|e| format!("Error saving packet info {}: {e}", path.display()))?;
    info!("Packet info saved: {}", path.display());
    Ok(ExportStatus::Written(path.to_path_buf()))
}
