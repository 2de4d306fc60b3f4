//! Power-law curve mapper
//!
//! Maps a value from an observed input range onto an output range along a
//! power-law curve. The curve parameter bends the response:
//!
//! - `0.0` is a straight line
//! - negative values compress the low end of the normalized scale and open
//!   up the high end (more resolution far from the pad)
//! - positive values do the opposite
//!
//! Use cases:
//! - Pitch electrodes, where the hand covers a much wider distance than the
//!   sensor's most sensitive zone
//! - Volume swells that should feel even to the player

use serde::{Deserialize, Serialize};

use super::Mapper;

/// Largest magnitude accepted for the curve parameter
pub const CURVE_LIMIT: f64 = 10.0;

/// Turn a curve parameter into the exponent applied to the normalized input.
///
/// The curve is clamped to `[-CURVE_LIMIT, CURVE_LIMIT]` first, so `-10`
/// yields an exponent of `10` and `+10` yields `0.1`.
pub fn curve_exponent(curve: f64) -> f64 {
    let curve = curve.clamp(-CURVE_LIMIT, CURVE_LIMIT);
    10.0_f64.powf(curve * -0.1)
}

/// Map `value` from `[in_min, in_max]` onto `out_a..out_b` along a curve.
///
/// The order of `out_a` and `out_b` encodes direction: if `out_b > out_a`
/// the mapping rises with the input, otherwise `in_min` lands on `out_a`
/// and the output falls toward `out_b`.
///
/// Degenerate ranges never divide:
/// - `in_min > in_max` returns `0.0`
/// - `in_min == in_max` returns `out_a`
pub fn scale(in_min: f64, in_max: f64, out_a: f64, out_b: f64, value: f64, curve: f64) -> f64 {
    let exponent = curve_exponent(curve);

    if in_min > in_max {
        return 0.0;
    }

    let span = in_max - in_min;
    if span == 0.0 {
        return out_a;
    }

    let value = value.clamp(in_min, in_max);
    let normalized = (value - in_min) / span;
    let curved = normalized.powf(exponent);

    if out_b > out_a {
        out_a + curved * (out_b - out_a)
    } else {
        out_a - curved * (out_a - out_b)
    }
}

/// Output shape for one channel: bounds, direction and curvature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingSpec {
    /// Lower output bound
    pub low: f64,

    /// Upper output bound
    pub high: f64,

    /// When true the smallest reading maps to `high`
    #[serde(default)]
    pub inverted: bool,

    /// Curvature in `[-10, 10]`, 0 is linear
    #[serde(default)]
    pub curve: f64,
}

impl MappingSpec {
    pub fn new(low: f64, high: f64, inverted: bool, curve: f64) -> Self {
        Self { low, high, inverted, curve }
    }

    /// Output endpoints in mapping order: `(out_a, out_b)`
    pub fn endpoints(&self) -> (f64, f64) {
        if self.inverted {
            (self.high, self.low)
        } else {
            (self.low, self.high)
        }
    }

    /// The same curve on an ascending `[0, 1]` output.
    ///
    /// Used as a proximity fraction: `1.0` sits at the largest reading seen.
    pub fn unit(&self) -> Self {
        Self::new(0.0, 1.0, false, self.curve)
    }

    /// Map `value` observed within `[in_min, in_max]`
    pub fn apply(&self, in_min: f64, in_max: f64, value: f64) -> f64 {
        let (out_a, out_b) = self.endpoints();
        scale(in_min, in_max, out_a, out_b, value, self.curve)
    }
}

/// Curve mapper over a fixed input range
pub struct CurveMapper {
    name: String,
    in_min: f64,
    in_max: f64,
    spec: MappingSpec,
}

impl CurveMapper {
    /// Create a new curve mapper
    pub fn new(name: impl Into<String>, in_min: f64, in_max: f64, spec: MappingSpec) -> Self {
        Self {
            name: name.into(),
            in_min,
            in_max,
            spec,
        }
    }
}

impl Mapper for CurveMapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn map(&self, input: f64) -> f64 {
        self.spec.apply(self.in_min, self.in_max, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn test_exponent_from_curve() {
        assert_float_eq!(curve_exponent(0.0), 1.0, abs <= 1e-12);
        assert_float_eq!(curve_exponent(-10.0), 10.0, abs <= 1e-9);
        assert_float_eq!(curve_exponent(10.0), 0.1, abs <= 1e-12);
    }

    #[test]
    fn test_curve_is_clamped() {
        assert_float_eq!(curve_exponent(-50.0), curve_exponent(-10.0), abs <= 1e-12);
        assert_float_eq!(curve_exponent(50.0), curve_exponent(10.0), abs <= 1e-12);
    }

    #[test]
    fn test_descending_midpoint_note() {
        // Hand halfway between the calibrated extremes, notes 100 down to 40
        let note = scale(100.0, 200.0, 100.0, 40.0, 150.0, 0.0);
        assert_float_eq!(note, 70.0, abs <= 1e-9);
    }

    #[test]
    fn test_linear_when_curve_is_zero() {
        let (in_min, in_max, out_a, out_b) = (-20.0, 40.0, 100.0, 400.0);
        for value in [-20.0, -7.5, 0.0, 13.0, 39.0, 40.0] {
            let expected = out_a + (value - in_min) / (in_max - in_min) * (out_b - out_a);
            assert_float_eq!(scale(in_min, in_max, out_a, out_b, value, 0.0), expected, abs <= 1e-9);
        }
    }

    #[test]
    fn test_output_stays_in_bounds() {
        for curve in [-10.0, -4.5, -1.0, 0.0, 0.3, 6.0, 10.0] {
            for step in 1..100 {
                let value = 100.0 + step as f64;
                let up = scale(100.0, 200.0, 10.0, 90.0, value, curve);
                let down = scale(100.0, 200.0, 90.0, 10.0, value, curve);
                assert!((10.0..=90.0).contains(&up), "curve {} value {} -> {}", curve, value, up);
                assert!((10.0..=90.0).contains(&down), "curve {} value {} -> {}", curve, value, down);
            }
        }
    }

    #[test]
    fn test_monotonic_in_both_directions() {
        for curve in [-10.0, -3.0, 0.0, 2.5, 10.0] {
            let mut last_up = f64::NEG_INFINITY;
            let mut last_down = f64::INFINITY;
            for value in 0..=1000 {
                let up = scale(0.0, 1000.0, 0.0, 127.0, value as f64, curve);
                let down = scale(0.0, 1000.0, 127.0, 0.0, value as f64, curve);
                assert!(up >= last_up);
                assert!(down <= last_down);
                last_up = up;
                last_down = down;
            }
        }
    }

    #[test]
    fn test_negative_curve_favours_low_end() {
        // Exponent > 1 keeps the midpoint below linear
        let curved = scale(0.0, 100.0, 0.0, 1.0, 50.0, -5.0);
        assert!(curved < 0.5, "got {}", curved);

        let curved = scale(0.0, 100.0, 0.0, 1.0, 50.0, 5.0);
        assert!(curved > 0.5, "got {}", curved);
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(scale(0.0, 100.0, 0.0, 1.0, -40.0, 0.0), 0.0);
        assert_eq!(scale(0.0, 100.0, 0.0, 1.0, 400.0, 0.0), 1.0);
    }

    #[test]
    fn test_degenerate_ranges() {
        assert_eq!(scale(200.0, 100.0, 40.0, 100.0, 150.0, 0.0), 0.0);
        assert_eq!(scale(150.0, 150.0, 40.0, 100.0, 150.0, 0.0), 40.0);
    }

    #[test]
    fn test_spec_endpoints() {
        let spec = MappingSpec::new(40.0, 100.0, true, 0.0);
        assert_eq!(spec.endpoints(), (100.0, 40.0));
        assert_eq!(spec.unit().endpoints(), (0.0, 1.0));

        let spec = MappingSpec::new(0.0, 127.0, false, -2.0);
        assert_eq!(spec.endpoints(), (0.0, 127.0));
        assert_eq!(spec.unit().curve, -2.0);
    }

    #[test]
    fn test_curve_mapper_trait() {
        let mapper = CurveMapper::new("pitch", 100.0, 200.0, MappingSpec::new(40.0, 100.0, true, 0.0));
        assert_eq!(mapper.name(), "pitch");
        assert_float_eq!(mapper.map(100.0), 100.0, abs <= 1e-9);
        assert_float_eq!(mapper.map(200.0), 40.0, abs <= 1e-9);
    }
}
