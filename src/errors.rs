use thiserror::Error;

/// A configuration value was rejected. The value it would have replaced is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("scan radius must be positive and finite, got {0}")]
    InvalidScanRadius(f64),

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },

    #[error("{field} of {value} ms is too long to schedule")]
    DelayOutOfRange { field: &'static str, value: f64 },
}

/// A scene oracle could not answer a ray query. The sampler treats this as a miss.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("hit on object {object} has a degenerate surface normal")]
    DegenerateNormal { object: usize },

    #[error("ray direction is not a finite unit vector")]
    InvalidRay,

    #[error("{0}")]
    Other(String),
}
