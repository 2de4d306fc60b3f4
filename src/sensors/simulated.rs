//! Simulated performer
//!
//! Generates deterministic readings without hardware: the pitch hand
//! drifts toward the pad and away again, the volume hand swells slowly,
//! and the instrument-up pad is tapped every so often. Useful for trying
//! a synth patch or a mapping curve from the command line.

use std::f64::consts::TAU;

use super::driver::{DriverError, TouchDriver, ELECTRODE_COUNT};
use crate::config::ElectrodeMap;

/// Shape of the simulated performance
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Reading with no hand near a pad
    pub baseline: i32,
    /// Reading with a finger on the pad
    pub touch_level: i32,
    /// Polls for one approach-and-retreat of the pitch hand
    pub pitch_period: u32,
    /// Polls for one volume swell
    pub volume_period: u32,
    /// Polls between taps on the instrument-up pad, 0 disables taps
    pub tap_every: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            baseline: 560,
            touch_level: 140,
            pitch_period: 400,
            volume_period: 1000,
            tap_every: 1500,
        }
    }
}

/// Touch driver fed by a simulated performer
pub struct SimulatedDriver {
    settings: SimulationSettings,
    electrodes: ElectrodeMap,
    readings: Vec<i32>,
    touched: Vec<bool>,
    edges: Vec<bool>,
    tick: u64,
    initialized: bool,
}

impl SimulatedDriver {
    pub fn new(electrodes: ElectrodeMap, settings: SimulationSettings) -> Self {
        let count = ELECTRODE_COUNT as usize;
        Self {
            readings: vec![settings.baseline; count],
            touched: vec![false; count],
            edges: vec![false; count],
            settings,
            electrodes,
            tick: 0,
            initialized: false,
        }
    }

    /// How far a hand has come in, `0.0` at baseline and `1.0` on the pad
    fn approach(tick: u64, period: u32) -> f64 {
        if period == 0 {
            return 0.0;
        }
        let phase = (tick % period as u64) as f64 / period as f64;
        // Raised cosine: starts and ends away from the pad
        (1.0 - (phase * TAU).cos()) / 2.0
    }

    fn reading(&self, approach: f64) -> i32 {
        let depth = (self.settings.baseline - self.settings.touch_level) as f64;
        self.settings.baseline - (depth * approach).round() as i32
    }
}

impl TouchDriver for SimulatedDriver {
    fn name(&self) -> &str {
        "simulated"
    }

    fn begin(&mut self) -> Result<(), DriverError> {
        for electrode in [
            self.electrodes.pitch,
            self.electrodes.volume,
            self.electrodes.instrument_up,
            self.electrodes.instrument_down,
        ] {
            if electrode >= ELECTRODE_COUNT {
                return Err(DriverError::ElectrodeOutOfRange(electrode));
            }
        }
        self.initialized = true;
        Ok(())
    }

    fn select_interrupt(&mut self, _pin: u8) -> Result<(), DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }
        Ok(())
    }

    fn update_all(&mut self) -> Result<(), DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }

        self.tick += 1;
        let tick = self.tick;

        let pitch = self.reading(Self::approach(tick, self.settings.pitch_period));
        let volume = self.reading(Self::approach(tick, self.settings.volume_period) * 0.8);
        self.readings[self.electrodes.pitch as usize] = pitch;
        self.readings[self.electrodes.volume as usize] = volume;

        let up = self.electrodes.instrument_up as usize;
        let every = u64::from(self.settings.tap_every);
        // Taps last three polls and the first one lands a full period in
        let tapping = every > 0 && tick >= every && tick % every < 3;
        self.edges.iter_mut().for_each(|e| *e = false);
        self.edges[up] = tapping && !self.touched[up];
        self.touched[up] = tapping;
        self.readings[up] = if tapping {
            self.settings.touch_level
        } else {
            self.settings.baseline
        };

        Ok(())
    }

    fn filtered(&self, electrode: u8) -> Result<i32, DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }
        self.readings
            .get(electrode as usize)
            .copied()
            .ok_or(DriverError::ElectrodeOutOfRange(electrode))
    }

    fn new_touch(&self, electrode: u8) -> Result<bool, DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }
        self.edges
            .get(electrode as usize)
            .copied()
            .ok_or(DriverError::ElectrodeOutOfRange(electrode))
    }
}
