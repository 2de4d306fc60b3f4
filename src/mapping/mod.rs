//! Mapping system for turning raw proximity readings into MIDI values
//!
//! Readings are tracked per channel, then mapped onto note or volume ranges
//! with a power-law curve and optionally snapped to a scale.

mod calibration;
mod curve;
mod mapper;
mod quantize;

pub use calibration::CalibrationRange;
pub use curve::{curve_exponent, scale, CurveMapper, MappingSpec, CURVE_LIMIT};
pub use mapper::{Mapper, MappingPipeline};
pub use quantize::{pitch_class, QuantizeMapper, Scale};
