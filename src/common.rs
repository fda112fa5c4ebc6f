mod angles;
mod color;
pub mod surface_point;

pub use angles::{angle_to_360, euler_zxy_degrees, rotation_from_euler_zxy, SweepDir};
pub use color::Color;

/// Returns the angle of the `index`-th of `count` evenly spaced samples across a field of view
/// of `fov` degrees which is centered on zero. The first sample sits at `-fov / 2`. The step
/// denominator never drops below 1, so a single sample (`count == 1`) is valid and lands on the
/// lower edge of the field.
///
/// # Arguments
///
/// * `fov`: the full field of view, in degrees
/// * `count`: the total number of samples across the field
/// * `index`: the sample to compute, in `0..count`
///
/// returns: f64
///
/// # Examples
///
/// ```
/// use lidar_sim::common::tessellate;
/// assert_eq!(tessellate(90.0, 3, 0), -45.0);
/// assert_eq!(tessellate(90.0, 3, 1), 0.0);
/// assert_eq!(tessellate(90.0, 3, 2), 45.0);
/// ```
pub fn tessellate(fov: f64, count: usize, index: usize) -> f64 {
    let step = fov / step_denominator(count);
    -fov / 2.0 + index as f64 * step
}

/// Maps a sample index to the range [-1, 1], where -1 is the first sample and 1 is the last.
///
/// # Examples
///
/// ```
/// use lidar_sim::common::normalized_index;
/// assert_eq!(normalized_index(5, 0), -1.0);
/// assert_eq!(normalized_index(5, 2), 0.0);
/// assert_eq!(normalized_index(5, 4), 1.0);
/// ```
pub fn normalized_index(count: usize, index: usize) -> f64 {
    (index as f64 / step_denominator(count)) * 2.0 - 1.0
}

fn step_denominator(count: usize) -> f64 {
    count.saturating_sub(1).max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 0, -15.0)]
    #[test_case(2, 1, 15.0)]
    #[test_case(4, 0, -15.0)]
    #[test_case(4, 3, 15.0)]
    #[test_case(7, 3, 0.0)]
    fn tessellate_vertical(count: usize, index: usize, expected: f64) {
        assert_eq!(tessellate(30.0, count, index), expected);
    }

    #[test]
    fn single_sample_does_not_divide_by_zero() {
        assert!(tessellate(30.0, 1, 0).is_finite());
        assert_eq!(normalized_index(1, 0), -1.0);
        assert_eq!(normalized_index(0, 0), -1.0);
    }
}
