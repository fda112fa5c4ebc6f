//! Sensor configuration. A `SensorConfig` is a plain value: the scanner takes a snapshot of it at
//! the start of every frame, so changes made while a frame is being captured apply to the next one.

use crate::errors::ConfigError;
use crate::Result;
use log::error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Maximum ray distance, in meters
    scan_radius: f64,

    /// Vertical field of view, in degrees
    vertical_fov: f64,

    /// Horizontal field of view, in degrees
    horizontal_fov: f64,

    /// Number of scan lines per frame, one packet per line
    line_count: usize,

    points_per_line: usize,

    /// Standard deviation of the Gaussian range noise, in meters
    noise_std_dev: f64,

    /// Strength of the radial angular magnification, 0 disables it
    fisheye_strength: f64,

    point_delay_ms: f64,
    packet_delay_ms: f64,
    frame_end_delay_ms: f64,
    delays_enabled: bool,

    /// Seed for the range noise generator, `None` seeds from the operating system
    pub seed: Option<u64>,

    pub auto_save: AutoSave,
}

/// Files written automatically each time a frame completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSave {
    pub ply: bool,
    pub packet_info: bool,
    pub include_packet_comments: bool,
    pub folder: PathBuf,
}

impl Default for AutoSave {
    fn default() -> Self {
        Self {
            ply: true,
            packet_info: true,
            include_packet_comments: true,
            folder: PathBuf::from("SensorData").join("LidarPLY"),
        }
    }
}

impl AutoSave {
    /// An auto-save setting which never writes anything
    pub fn disabled() -> Self {
        Self {
            ply: false,
            packet_info: false,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ply || self.packet_info
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            scan_radius: 100.0,
            vertical_fov: 30.0,
            horizontal_fov: 360.0,
            line_count: 64,
            points_per_line: 1024,
            noise_std_dev: 0.01,
            fisheye_strength: 0.0,
            point_delay_ms: 0.1,
            packet_delay_ms: 10.0,
            frame_end_delay_ms: 100.0,
            delays_enabled: true,
            seed: None,
            auto_save: AutoSave::default(),
        }
    }
}

fn check_non_negative(field: &'static str, value: f64) -> std::result::Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Delays become a `Duration` when the scan suspends, so they must also fit in one
fn check_delay(field: &'static str, value: f64) -> std::result::Result<f64, ConfigError> {
    let value = check_non_negative(field, value)?;
    Duration::try_from_secs_f64(value / 1000.0)
        .map(|_| value)
        .map_err(|_| ConfigError::DelayOutOfRange { field, value })
}

fn check_finite(field: &'static str, value: f64) -> std::result::Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn check_count(field: &'static str, value: usize) -> std::result::Result<usize, ConfigError> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(ConfigError::ZeroCount { field })
    }
}

fn log_rejected<T>(result: std::result::Result<T, ConfigError>) -> std::result::Result<T, ConfigError> {
    if let Err(e) = &result {
        error!("Rejected sensor configuration value: {e}");
    }
    result
}

impl SensorConfig {
    pub fn scan_radius(&self) -> f64 {
        self.scan_radius
    }

    pub fn vertical_fov(&self) -> f64 {
        self.vertical_fov
    }

    pub fn horizontal_fov(&self) -> f64 {
        self.horizontal_fov
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn points_per_line(&self) -> usize {
        self.points_per_line
    }

    pub fn noise_std_dev(&self) -> f64 {
        self.noise_std_dev
    }

    pub fn fisheye_strength(&self) -> f64 {
        self.fisheye_strength
    }

    pub fn point_delay_ms(&self) -> f64 {
        self.point_delay_ms
    }

    pub fn packet_delay_ms(&self) -> f64 {
        self.packet_delay_ms
    }

    pub fn frame_end_delay_ms(&self) -> f64 {
        self.frame_end_delay_ms
    }

    pub fn delays_enabled(&self) -> bool {
        self.delays_enabled
    }

    /// The suspension after each packet, or `None` if delays are disabled or zero
    pub fn packet_delay(&self) -> Option<Duration> {
        self.active_delay(self.packet_delay_ms)
    }

    /// The suspension after the last packet of a frame, or `None` if delays are disabled or zero
    pub fn frame_end_delay(&self) -> Option<Duration> {
        self.active_delay(self.frame_end_delay_ms)
    }

    fn active_delay(&self, ms: f64) -> Option<Duration> {
        if self.delays_enabled && ms > 0.0 {
            Duration::try_from_secs_f64(ms / 1000.0).ok()
        } else {
            None
        }
    }

    pub fn set_scan_radius(&mut self, radius: f64) -> std::result::Result<(), ConfigError> {
        if !(radius.is_finite() && radius > 0.0) {
            return log_rejected(Err(ConfigError::InvalidScanRadius(radius)));
        }
        self.scan_radius = radius;
        Ok(())
    }

    pub fn set_vertical_fov(&mut self, fov: f64) -> std::result::Result<(), ConfigError> {
        self.vertical_fov = log_rejected(check_finite("vertical FOV", fov))?;
        Ok(())
    }

    pub fn set_horizontal_fov(&mut self, fov: f64) -> std::result::Result<(), ConfigError> {
        self.horizontal_fov = log_rejected(check_finite("horizontal FOV", fov))?;
        Ok(())
    }

    pub fn set_line_count(&mut self, count: usize) -> std::result::Result<(), ConfigError> {
        self.line_count = log_rejected(check_count("line count", count))?;
        Ok(())
    }

    pub fn set_points_per_line(&mut self, count: usize) -> std::result::Result<(), ConfigError> {
        self.points_per_line = log_rejected(check_count("points per line", count))?;
        Ok(())
    }

    pub fn set_noise_std_dev(&mut self, std_dev: f64) -> std::result::Result<(), ConfigError> {
        self.noise_std_dev = log_rejected(check_non_negative("noise standard deviation", std_dev))?;
        Ok(())
    }

    pub fn set_fisheye_strength(&mut self, strength: f64) -> std::result::Result<(), ConfigError> {
        self.fisheye_strength = log_rejected(check_non_negative("fisheye strength", strength))?;
        Ok(())
    }

    pub fn set_point_delay_ms(&mut self, delay: f64) -> std::result::Result<(), ConfigError> {
        self.point_delay_ms = log_rejected(check_delay("point delay", delay))?;
        Ok(())
    }

    pub fn set_packet_delay_ms(&mut self, delay: f64) -> std::result::Result<(), ConfigError> {
        self.packet_delay_ms = log_rejected(check_delay("packet delay", delay))?;
        Ok(())
    }

    pub fn set_frame_end_delay_ms(&mut self, delay: f64) -> std::result::Result<(), ConfigError> {
        self.frame_end_delay_ms = log_rejected(check_delay("frame end delay", delay))?;
        Ok(())
    }

    pub fn set_delays_enabled(&mut self, enabled: bool) {
        self.delays_enabled = enabled;
    }

    /// Checks every field of the configuration, returning the first problem found. Values loaded
    /// through serde bypass the setters, so anything deserialized must pass through here.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.scan_radius.is_finite() && self.scan_radius > 0.0) {
            return Err(ConfigError::InvalidScanRadius(self.scan_radius));
        }
        check_finite("vertical FOV", self.vertical_fov)?;
        check_finite("horizontal FOV", self.horizontal_fov)?;
        check_count("line count", self.line_count)?;
        check_count("points per line", self.points_per_line)?;
        check_non_negative("noise standard deviation", self.noise_std_dev)?;
        check_non_negative("fisheye strength", self.fisheye_strength)?;
        check_delay("point delay", self.point_delay_ms)?;
        check_delay("packet delay", self.packet_delay_ms)?;
        check_delay("frame end delay", self.frame_end_delay_ms)?;
        Ok(())
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: SensorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn defaults_are_valid() {
        let config = SensorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.line_count(), 64);
        assert_eq!(config.points_per_line(), 1024);
        assert_eq!(config.packet_delay(), Some(Duration::from_millis(10)));
    }

    #[test_case(0.0)]
    #[test_case(-1.0)]
    #[test_case(f64::NAN)]
    #[test_case(f64::INFINITY)]
    fn bad_radius_keeps_prior_value(radius: f64) {
        let mut config = SensorConfig::default();
        config.set_scan_radius(42.0).unwrap();
        assert!(config.set_scan_radius(radius).is_err());
        assert_eq!(config.scan_radius(), 42.0);
    }

    #[test]
    fn zero_counts_are_rejected() {
        let mut config = SensorConfig::default();
        assert_eq!(
            config.set_line_count(0),
            Err(ConfigError::ZeroCount { field: "line count" })
        );
        assert!(config.set_points_per_line(0).is_err());
        assert_eq!(config.line_count(), 64);
        assert_eq!(config.points_per_line(), 1024);
    }

    #[test]
    fn negative_noise_and_delays_are_rejected() {
        let mut config = SensorConfig::default();
        assert!(config.set_noise_std_dev(-0.1).is_err());
        assert!(config.set_fisheye_strength(-1.0).is_err());
        assert!(config.set_packet_delay_ms(-5.0).is_err());
        assert_eq!(config.noise_std_dev(), 0.01);
        assert_eq!(config.packet_delay_ms(), 10.0);
        config.set_noise_std_dev(0.0).unwrap();
        assert_eq!(config.noise_std_dev(), 0.0);
    }

    #[test_case(1.0e300)]
    #[test_case(f64::MAX)]
    fn unschedulable_delays_are_rejected(delay: f64) {
        let mut config = SensorConfig::default();
        assert_eq!(
            config.set_packet_delay_ms(delay),
            Err(ConfigError::DelayOutOfRange { field: "packet delay", value: delay })
        );
        assert!(config.set_point_delay_ms(delay).is_err());
        assert!(config.set_frame_end_delay_ms(delay).is_err());
        assert_eq!(config.packet_delay_ms(), 10.0);
        assert_eq!(config.packet_delay(), Some(Duration::from_millis(10)));
        assert_eq!(config.frame_end_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn json_unschedulable_delay_fails_validation() {
        let result = SensorConfig::from_json_str(r#"{"frame_end_delay_ms": 1.0e300}"#);
        assert!(result.is_err());
    }

    #[test]
    fn disabled_or_zero_delays_do_not_suspend() {
        let mut config = SensorConfig::default();
        config.set_frame_end_delay_ms(0.0).unwrap();
        assert_eq!(config.frame_end_delay(), None);
        config.set_delays_enabled(false);
        assert_eq!(config.packet_delay(), None);
    }

    #[test]
    fn json_partial_override() {
        let config = SensorConfig::from_json_str(r#"{"line_count": 4, "seed": 7}"#).unwrap();
        assert_eq!(config.line_count(), 4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.scan_radius(), 100.0);
    }

    #[test]
    fn json_invalid_values_are_rejected() {
        assert!(SensorConfig::from_json_str(r#"{"points_per_line": 0}"#).is_err());
        assert!(SensorConfig::from_json_str(r#"{"scan_radius": -3.0}"#).is_err());
        assert!(SensorConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let mut config = SensorConfig::default();
        config.set_fisheye_strength(0.25).unwrap();
        config.auto_save = AutoSave::disabled();
        let text = config.to_json_string().unwrap();
        assert_eq!(SensorConfig::from_json_str(&text).unwrap(), config);
    }
}
