//! Export of frames and packets: ASCII PLY point clouds, a plain-text statistics report, and the
//! file sinks they are written through. Exports of empty input are skipped with a warning rather
//! than treated as errors.

mod ply;
mod sink;
mod stats;

use itertools::Itertools;
use std::path::PathBuf;

pub use ply::{
    frame_to_ply, packet_to_ply, parse_ascii_ply, write_frame_ply, write_packet_ply, PlyCloud,
    PlyVertex,
};
pub use sink::{FileSink, FsSink, MemorySink};
pub use stats::{frame_report, write_frame_report};

/// What an export call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Written(PathBuf),

    /// There was nothing to export, so nothing was written
    Skipped,
}

/// Formats three values as `(a, b, c)` with three decimals
fn fmt_triple(values: [f64; 3]) -> String {
    format!("({})", values.iter().map(|v| format!("{v:.3}")).join(", "))
}

/// Formats a time in seconds with six decimals, or `n/a` if the time has not been set
fn fmt_seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.6}s"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_formatting() {
        assert_eq!(fmt_triple([1.0, -2.5, 0.0004]), "(1.000, -2.500, 0.000)");
        assert_eq!(fmt_seconds(Some(0.5)), "0.500000s");
        assert_eq!(fmt_seconds(None), "n/a");
    }
}
