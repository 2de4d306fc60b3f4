//! Touch-to-calibrate range tracking
//!
//! Proximity electrodes have no fixed scale: the reading with nothing near
//! the pad drifts with humidity, cable length and the board. Instead of a
//! calibration mode, each channel remembers the smallest and largest
//! readings it has ever seen. Touching the pad drives the signal to one
//! extreme and moving away returns it to the baseline, so a few passes of
//! the hand are enough to span the useful range.

use super::MappingSpec;

/// Observed extremes of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationRange {
    /// No sample seen yet
    #[default]
    Uncalibrated,
    /// Smallest and largest samples seen so far
    Observed { min: i32, max: i32 },
}

impl CalibrationRange {
    pub fn new() -> Self {
        Self::Uncalibrated
    }

    /// Widen the range to include `sample`.
    ///
    /// Returns true when a bound moved.
    pub fn observe(&mut self, sample: i32) -> bool {
        match *self {
            Self::Uncalibrated => {
                *self = Self::Observed { min: sample, max: sample };
                true
            }
            Self::Observed { min, max } => {
                if sample < min || sample > max {
                    *self = Self::Observed {
                        min: min.min(sample),
                        max: max.max(sample),
                    };
                    true
                } else {
                    false
                }
            }
        }
    }

    /// `(min, max)` once at least one sample has been seen
    pub fn bounds(&self) -> Option<(i32, i32)> {
        match *self {
            Self::Uncalibrated => None,
            Self::Observed { min, max } => Some((min, max)),
        }
    }

    /// True once the range covers more than a single reading
    pub fn is_usable(&self) -> bool {
        matches!(*self, Self::Observed { min, max } if min < max)
    }

    /// Map `value` through `spec` using the observed range.
    ///
    /// Refuses with `None` until the range is usable.
    pub fn map(&self, spec: &MappingSpec, value: i32) -> Option<f64> {
        match *self {
            Self::Observed { min, max } if min < max => {
                Some(spec.apply(min as f64, max as f64, value as f64))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn test_starts_uncalibrated() {
        let range = CalibrationRange::new();
        assert_eq!(range.bounds(), None);
        assert!(!range.is_usable());
        assert_eq!(range.map(&MappingSpec::new(0.0, 1.0, false, 0.0), 10), None);
    }

    #[test]
    fn test_first_sample_sets_both_bounds() {
        let mut range = CalibrationRange::new();
        assert!(range.observe(512));
        assert_eq!(range.bounds(), Some((512, 512)));
        // A single point is not a range yet
        assert!(!range.is_usable());
        assert_eq!(range.map(&MappingSpec::new(0.0, 1.0, false, 0.0), 512), None);
    }

    #[test]
    fn test_range_only_widens() {
        let mut range = CalibrationRange::new();
        let samples = [500, 480, 530, 490, 700, 100, 650, 650, 99, 701];
        let mut last: Option<(i32, i32)> = None;

        for sample in samples {
            range.observe(sample);
            let (min, max) = range.bounds().unwrap();
            assert!(min <= sample && sample <= max);
            if let Some((last_min, last_max)) = last {
                assert!(min <= last_min);
                assert!(max >= last_max);
            }
            last = Some((min, max));
        }

        assert_eq!(range.bounds(), Some((99, 701)));
    }

    #[test]
    fn test_observe_reports_movement() {
        let mut range = CalibrationRange::new();
        assert!(range.observe(10));
        assert!(range.observe(20));
        assert!(!range.observe(15));
        assert!(!range.observe(20));
        assert!(range.observe(5));
    }

    #[test]
    fn test_map_uses_observed_range() {
        let mut range = CalibrationRange::new();
        range.observe(100);
        range.observe(200);

        let pitch = MappingSpec::new(40.0, 100.0, true, 0.0);
        assert_float_eq!(range.map(&pitch, 150).unwrap(), 70.0, abs <= 1e-9);
        assert_float_eq!(range.map(&pitch, 100).unwrap(), 100.0, abs <= 1e-9);
        assert_float_eq!(range.map(&pitch, 200).unwrap(), 40.0, abs <= 1e-9);
    }
}
