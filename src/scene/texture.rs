use crate::Result;
use crate::common::Color;

/// A 2D RGBA texture stored row-major, with row 0 at `v = 0`. Texture coordinates wrap, so any
/// finite (u, v) can be sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2 {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Texture2 {
    pub fn try_new(width: usize, height: usize, pixels: Vec<Color>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err("texture must be at least 1x1".into());
        }
        if pixels.len() != width * height {
            return Err(format!(
                "texture of {width}x{height} needs {} pixels, got {}",
                width * height,
                pixels.len()
            )
            .into());
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A texture filled with a single color
    pub fn solid(width: usize, height: usize, color: Color) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixels: vec![color; width.max(1) * height.max(1)],
        }
    }

    /// A checkerboard of `cells` x `cells` squares, each `cell_px` pixels wide, starting with `a`
    /// in the corner at (0, 0)
    pub fn checkerboard(cells: usize, cell_px: usize, a: Color, b: Color) -> Self {
        let size = (cells * cell_px).max(1);
        let cell_px = cell_px.max(1);
        let pixels = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (x / cell_px + y / cell_px) % 2 == 0 { a } else { b }
            })
            .collect();
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The pixel at integer coordinates, wrapping around the edges
    pub fn pixel(&self, x: i64, y: i64) -> Color {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.pixels[y * self.width + x]
    }

    /// Samples the texture at (u, v) with bilinear filtering. Pixel centers sit at
    /// `(i + 0.5) / size`, so sampling exactly on a center returns that pixel unblended.
    ///
    /// # Arguments
    ///
    /// * `u`: horizontal texture coordinate, one texture width per unit
    /// * `v`: vertical texture coordinate, one texture height per unit
    ///
    /// returns: Color
    pub fn sample_bilinear(&self, u: f64, v: f64) -> Color {
        let x = u * self.width as f64 - 0.5;
        let y = v * self.height as f64 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let bottom = self.pixel(x0, y0).lerp(&self.pixel(x0 + 1, y0), fx);
        let top = self.pixel(x0, y0 + 1).lerp(&self.pixel(x0 + 1, y0 + 1), fx);
        bottom.lerp(&top, fy)
    }
}
