//! Touch driver boundary
//!
//! A touch controller exposes, per electrode, a continuously filtered
//! proximity reading and a "new touch" edge since the last update. The
//! engine refreshes every channel once per poll before reading any of them.

use log::debug;
use thiserror::Error;

use crate::config::ElectrodeMap;

/// Electrodes on a standard 12-channel capacitive touch controller
pub const ELECTRODE_COUNT: u8 = 12;

/// Why the touch controller could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("touch controller not found at address {0:#04x}")]
    AddressMismatch(u8),

    #[error("touch controller register readback failed")]
    ReadbackFailure,

    #[error("overcurrent detected on the touch controller")]
    Overcurrent,

    #[error("electrode {0} is out of range")]
    ElectrodeOutOfRange(u8),

    #[error("touch controller used before initialization")]
    NotInitialized,

    #[error("unknown touch controller error")]
    Unknown,
}

/// A capacitive touch controller
pub trait TouchDriver {
    /// Get the name of this driver
    fn name(&self) -> &str;

    /// Number of electrodes the controller exposes
    fn electrode_count(&self) -> u8 {
        ELECTRODE_COUNT
    }

    /// Detect and configure the controller
    fn begin(&mut self) -> Result<(), DriverError>;

    /// Choose which pin signals new data
    fn select_interrupt(&mut self, pin: u8) -> Result<(), DriverError>;

    /// Read every register regardless of pending interrupts
    fn force_update(&mut self) -> Result<(), DriverError> {
        self.update_all()
    }

    /// Refresh readings and edges for all electrodes
    fn update_all(&mut self) -> Result<(), DriverError>;

    /// Filtered proximity reading of one electrode
    fn filtered(&self, electrode: u8) -> Result<i32, DriverError>;

    /// True if the electrode became touched since the previous update
    fn new_touch(&self, electrode: u8) -> Result<bool, DriverError>;

    /// True once the driver has no further readings to give
    fn finished(&self) -> bool {
        false
    }
}

/// Everything the session needs from one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub pitch: i32,
    pub volume: i32,
    pub instrument_up: bool,
    pub instrument_down: bool,
}

impl Frame {
    /// Read the assigned electrodes from an already updated driver
    pub fn read(driver: &dyn TouchDriver, electrodes: &ElectrodeMap) -> Result<Self, DriverError> {
        Ok(Self {
            pitch: driver.filtered(electrodes.pitch)?,
            volume: driver.filtered(electrodes.volume)?,
            instrument_up: driver.new_touch(electrodes.instrument_up)?,
            instrument_down: driver.new_touch(electrodes.instrument_down)?,
        })
    }

    /// Frame with both edges low
    pub fn hands(pitch: i32, volume: i32) -> Self {
        Self {
            pitch,
            volume,
            instrument_up: false,
            instrument_down: false,
        }
    }
}

/// Output line that holds the synthesizer in reset while low
pub trait ResetLine {
    fn set_low(&mut self);
    fn set_high(&mut self);
}

/// Reset line for hosts without one; only logs
#[derive(Debug, Default)]
pub struct LoggedResetLine;

impl ResetLine for LoggedResetLine {
    fn set_low(&mut self) {
        debug!("reset line low");
    }

    fn set_high(&mut self) {
        debug!("reset line high");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_messages() {
        assert_eq!(
            DriverError::AddressMismatch(0x5A).to_string(),
            "touch controller not found at address 0x5a"
        );
        assert_eq!(
            DriverError::ElectrodeOutOfRange(14).to_string(),
            "electrode 14 is out of range"
        );
    }

    #[test]
    fn test_frame_hands() {
        let frame = Frame::hands(300, 410);
        assert_eq!(frame.pitch, 300);
        assert_eq!(frame.volume, 410);
        assert!(!frame.instrument_up);
        assert!(!frame.instrument_down);
    }
}
