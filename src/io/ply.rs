//! ASCII PLY export of frames and packets, plus a reader for the same subset of the format so
//! exported files can be checked. Every vertex carries a position, an intensity, and an 8-bit RGB
//! color. Metadata about the capture is written as header comments.

use super::{fmt_seconds, fmt_triple, ExportStatus, FileSink};
use crate::common::euler_zxy_degrees;
use crate::frame::{LidarFrame, LidarPacket, LidarPoint};
use crate::{Point3, Result};
use log::{info, warn};
use std::fmt::Write;
use std::path::Path;

const VERTEX_PROPERTIES: [(&str, &str); 7] = [
    ("float", "x"),
    ("float", "y"),
    ("float", "z"),
    ("float", "intensity"),
    ("uchar", "red"),
    ("uchar", "green"),
    ("uchar", "blue"),
];

fn write_header(out: &mut String, vertex_count: usize, comments: &[String]) -> std::fmt::Result {
    writeln!(out, "ply")?;
    writeln!(out, "format ascii 1.0")?;
    writeln!(out, "element vertex {vertex_count}")?;
    for (kind, name) in VERTEX_PROPERTIES {
        writeln!(out, "property {kind} {name}")?;
    }
    for c in comments {
        writeln!(out, "comment {c}")?;
    }
    writeln!(out, "end_header")
}

fn write_vertex(out: &mut String, point: &LidarPoint) -> std::fmt::Result {
    let [r, g, b] = point.color.to_rgb8();
    let p = &point.position;
    writeln!(
        out,
        "{:.6} {:.6} {:.6} {:.6} {r} {g} {b}",
        p.x, p.y, p.z, point.intensity
    )
}

fn frame_comments(frame: &LidarFrame) -> Vec<String> {
    let mut comments = vec![
        "LiDAR Frame Information:".to_string(),
        format!("Frame Start Time: {:.6}s", frame.frame_start_time()),
        format!("Frame End Time: {}", fmt_seconds(frame.frame_end_time())),
        format!("Frame Duration: {}", fmt_seconds(frame.duration())),
        format!("Total Packets: {}", frame.packets().len()),
        format!("Total Points: {}", frame.total_points()),
        "Packet Information:".to_string(),
    ];
    comments.extend(frame.packets().iter().enumerate().map(|(i, p)| {
        format!(
            "Packet {i}: Line {}, Direction: {}, Points: {}, Time: {:.6}s, Position: {}",
            p.line_index,
            p.direction.short_label(),
            p.len(),
            p.timestamp,
            fmt_triple(p.sensor_position.coords.into()),
        )
    }));
    comments
}

fn packet_comments(packet: &LidarPacket) -> Vec<String> {
    vec![
        "LiDAR Packet Information:".to_string(),
        format!("Line Index: {}", packet.line_index),
        format!("Direction: {}", packet.direction.long_label()),
        format!("Points Count: {}", packet.len()),
        format!("Timestamp: {:.6}s", packet.timestamp),
        format!(
            "Sensor Position: {}",
            fmt_triple(packet.sensor_position.coords.into())
        ),
        format!(
            "Sensor Rotation: {}",
            fmt_triple(euler_zxy_degrees(&packet.sensor_rotation))
        ),
    ]
}

/// Renders a frame as ASCII PLY text with one vertex per point in frame order. Returns `None`
/// when the frame holds no points.
///
/// # Arguments
///
/// * `frame`: the frame to render; it does not need to be complete
/// * `include_packet_info`: whether to write the frame and packet summary as header comments
///
/// returns: Option<String>
pub fn frame_to_ply(frame: &LidarFrame, include_packet_info: bool) -> Option<String> {
    if frame.total_points() == 0 {
        return None;
    }
    let comments = if include_packet_info {
        frame_comments(frame)
    } else {
        Vec::new()
    };

    let mut out = String::new();
    write_header(&mut out, frame.total_points(), &comments).ok()?;
    for point in frame.points() {
        write_vertex(&mut out, point).ok()?;
    }
    Some(out)
}

/// Renders a single packet as ASCII PLY text with its capture details in the header comments.
/// Returns `None` when the packet holds no points.
pub fn packet_to_ply(packet: &LidarPacket) -> Option<String> {
    if packet.is_empty() {
        return None;
    }
    let mut out = String::new();
    write_header(&mut out, packet.len(), &packet_comments(packet)).ok()?;
    for point in packet.points.iter() {
        write_vertex(&mut out, point).ok()?;
    }
    Some(out)
}

/// Writes a frame to `path` through the sink. A missing or empty frame is skipped with a warning
/// and the sink is not touched.
pub fn write_frame_ply(
    sink: &dyn FileSink,
    path: &Path,
    frame: Option<&LidarFrame>,
    include_packet_info: bool,
) -> Result<ExportStatus> {
    let Some(text) = frame.and_then(|f| frame_to_ply(f, include_packet_info)) else {
        warn!("No LiDAR frame data to export");
        return Ok(ExportStatus::Skipped);
    };

    sink.write(path, &text)
        .map_err(|e| format!("Error saving LiDAR frame to PLY {}: {e}", path.display()))?;
    info!("LiDAR frame saved to PLY: {}", path.display());
    Ok(ExportStatus::Written(path.to_path_buf()))
}

/// Writes a single packet to `path` through the sink. An empty packet is skipped with a warning.
pub fn write_packet_ply(
    sink: &dyn FileSink,
    path: &Path,
    packet: &LidarPacket,
) -> Result<ExportStatus> {
    let Some(text) = packet_to_ply(packet) else {
        warn!("No LiDAR packet data to export");
        return Ok(ExportStatus::Skipped);
    };

    sink.write(path, &text)
        .map_err(|e| format!("Error saving LiDAR packet to PLY {}: {e}", path.display()))?;
    info!("LiDAR packet saved to PLY: {}", path.display());
    Ok(ExportStatus::Written(path.to_path_buf()))
}

/// A vertex read back from an ASCII PLY file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlyVertex {
    pub position: Point3,
    pub intensity: f64,
    pub rgb: [u8; 3],
}

/// The content of an ASCII PLY file in the layout written by this module
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlyCloud {
    pub comments: Vec<String>,
    pub vertices: Vec<PlyVertex>,
}

fn parse_vertex(line: &str, line_number: usize) -> Result<PlyVertex> {
    let fields = line.split_whitespace().collect::<Vec<_>>();
    if fields.len() != VERTEX_PROPERTIES.len() {
        return Err(format!(
            "line {line_number}: expected {} values, found {}",
            VERTEX_PROPERTIES.len(),
            fields.len()
        )
        .into());
    }

    let float = |i: usize| -> Result<f64> {
        fields[i]
            .parse::<f64>()
            .map_err(|e| format!("line {line_number}: bad value '{}': {e}", fields[i]).into())
    };
    let byte = |i: usize| -> Result<u8> {
        fields[i]
            .parse::<u8>()
            .map_err(|e| format!("line {line_number}: bad color '{}': {e}", fields[i]).into())
    };

    Ok(PlyVertex {
        position: Point3::new(float(0)?, float(1)?, float(2)?),
        intensity: float(3)?,
        rgb: [byte(4)?, byte(5)?, byte(6)?],
    })
}

/// Parses ASCII PLY text with the vertex layout written by [`frame_to_ply`]. The number of
/// vertex lines in the body must match the declared vertex count.
pub fn parse_ascii_ply(text: &str) -> Result<PlyCloud> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

    match lines.next() {
        Some((_, "ply")) => {}
        _ => return Err("missing 'ply' magic line".into()),
    }
    match lines.next() {
        Some((_, "format ascii 1.0")) => {}
        Some((n, other)) => return Err(format!("line {n}: unsupported format '{other}'").into()),
        None => return Err("missing format line".into()),
    }

    let mut cloud = PlyCloud::default();
    let mut vertex_count: Option<usize> = None;
    let mut properties = Vec::new();
    let mut header_closed = false;

    for (n, line) in lines.by_ref() {
        if line == "end_header" {
            header_closed = true;
            break;
        } else if let Some(comment) = line.strip_prefix("comment ") {
            cloud.comments.push(comment.to_string());
        } else if let Some(count) = line.strip_prefix("element vertex ") {
            let count = count
                .trim()
                .parse::<usize>()
                .map_err(|e| format!("line {n}: bad vertex count: {e}"))?;
            vertex_count = Some(count);
        } else if let Some(property) = line.strip_prefix("property ") {
            let mut parts = property.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(kind), Some(name)) => properties.push((kind.to_string(), name.to_string())),
                _ => return Err(format!("line {n}: malformed property").into()),
            }
        } else {
            return Err(format!("line {n}: unexpected header line '{line}'").into());
        }
    }

    if !header_closed {
        return Err("missing 'end_header'".into());
    }
    let vertex_count = vertex_count.ok_or("missing 'element vertex' declaration")?;
    let expected = VERTEX_PROPERTIES
        .iter()
        .map(|(k, n)| (k.to_string(), n.to_string()))
        .collect::<Vec<_>>();
    if properties != expected {
        return Err("vertex properties do not match x y z intensity red green blue".into());
    }

    for (n, line) in lines.filter(|(_, l)| !l.is_empty()) {
        cloud.vertices.push(parse_vertex(line, n)?);
    }

    if cloud.vertices.len() != vertex_count {
        return Err(format!(
            "header declares {vertex_count} vertices but the body holds {}",
            cloud.vertices.len()
        )
        .into());
    }

    Ok(cloud)
}
