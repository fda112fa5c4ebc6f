use serde::{Deserialize, Serialize};

/// A linear RGBA color with components nominally in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// An opaque color
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Linear interpolation between this color and another, `f = 0` being this color
    pub fn lerp(&self, other: &Color, f: f64) -> Color {
        Color::new(
            self.r + (other.r - self.r) * f,
            self.g + (other.g - self.g) * f,
            self.b + (other.b - self.b) * f,
            self.a + (other.a - self.a) * f,
        )
    }

    /// Quantizes the color channels to bytes, rounding half to even and clamping to [0, 255]
    ///
    /// # Examples
    ///
    /// ```
    /// use lidar_sim::common::Color;
    /// assert_eq!(Color::rgb(1.0, 0.5, -0.2).to_rgb8(), [255, 128, 0]);
    /// assert_eq!(Color::rgb(2.0, 0.0, 0.25).to_rgb8(), [255, 0, 64]);
    /// ```
    pub fn to_rgb8(&self) -> [u8; 3] {
        [channel_u8(self.r), channel_u8(self.g), channel_u8(self.b)]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

fn channel_u8(c: f64) -> u8 {
    (c * 255.0).round_ties_even().clamp(0.0, 255.0) as u8
}
