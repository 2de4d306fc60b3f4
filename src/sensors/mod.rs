//! Touch sensors for Theremidi
//!
//! Drivers deliver per-electrode filtered readings and new-touch edges.
//! Real controllers sit behind the [`TouchDriver`] trait; recorded traces
//! and a simulated performer implement it for hosted runs.

mod driver;
mod replay;
mod simulated;

pub use driver::{DriverError, Frame, LoggedResetLine, ResetLine, TouchDriver, ELECTRODE_COUNT};
pub use replay::{ReplayDriver, TraceFrame};
pub use simulated::{SimulatedDriver, SimulationSettings};
