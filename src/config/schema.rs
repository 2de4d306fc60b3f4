//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::mapping::{pitch_class, MappingSpec, Scale, CURVE_LIMIT};
use crate::sensors::ELECTRODE_COUNT;

/// Main configuration for Theremidi
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TheremidiConfig {
    /// MIDI channel and message settings
    #[serde(default)]
    pub midi: MidiConfig,

    /// Where MIDI bytes go
    #[serde(default)]
    pub output: OutputConfig,

    /// Poll cadence and startup timing
    #[serde(default)]
    pub timing: TimingConfig,

    /// Which electrode does what
    #[serde(default)]
    pub electrodes: ElectrodeMap,

    /// Pitch hand
    #[serde(default)]
    pub pitch: PitchConfig,

    /// Volume hand
    #[serde(default)]
    pub volume: VolumeConfig,

    /// Instrument bank
    #[serde(default)]
    pub instruments: InstrumentConfig,
}

impl TheremidiConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // MIDI
        if self.midi.channel > 15 {
            bail!("MIDI channel must be between 0 and 15");
        }
        if self.midi.velocity > 127 {
            bail!("Velocity must be between 0 and 127");
        }
        if self.midi.volume_controller > 127 {
            bail!("Volume controller must be between 0 and 127");
        }
        if self.midi.initial_volume > 127 {
            bail!("Initial volume must be between 0 and 127");
        }

        // Timing
        if self.timing.poll_ms == 0 || self.timing.poll_ms > 1000 {
            bail!("Poll period must be between 1 and 1000 ms");
        }

        // Electrodes
        let electrodes = self.electrodes.all();
        for (role, electrode) in &electrodes {
            if *electrode >= ELECTRODE_COUNT {
                bail!(
                    "Electrode for {} must be below {}, got {}",
                    role,
                    ELECTRODE_COUNT,
                    electrode
                );
            }
        }
        for (i, (role, electrode)) in electrodes.iter().enumerate() {
            if let Some((other, _)) = electrodes[i + 1..].iter().find(|(_, e)| e == electrode) {
                bail!("Electrode {} is assigned to both {} and {}", electrode, role, other);
            }
        }

        // Mappings
        validate_range("pitch", self.pitch.low, self.pitch.high, self.pitch.curve)?;
        validate_range("volume", self.volume.low, self.volume.high, self.volume.curve)?;
        if !(self.pitch.silence_threshold > 0.0 && self.pitch.silence_threshold <= 1.0) {
            bail!("Silence threshold must be in (0, 1]");
        }
        if pitch_class(&self.pitch.key).is_none() {
            bail!("Unknown key '{}'", self.pitch.key);
        }
        if Scale::from_name(&self.pitch.scale).is_none() {
            bail!("Unknown scale '{}'", self.pitch.scale);
        }

        // Instruments
        let inst = &self.instruments;
        if inst.last > 127 {
            bail!("Last instrument must be at most 127");
        }
        if inst.first > inst.last {
            bail!("First instrument must not be above the last");
        }
        if inst.default < inst.first || inst.default > inst.last {
            bail!(
                "Default instrument {} is outside {}..={}",
                inst.default,
                inst.first,
                inst.last
            );
        }

        Ok(())
    }
}

fn validate_range(name: &str, low: f64, high: f64, curve: f64) -> Result<()> {
    if !(0.0..=127.0).contains(&low) || !(0.0..=127.0).contains(&high) {
        bail!("The {} range must lie within 0 and 127", name);
    }
    if low >= high {
        bail!("The {} low bound must be below the high bound", name);
    }
    if !(-CURVE_LIMIT..=CURVE_LIMIT).contains(&curve) {
        bail!("The {} curve must be between -10 and 10", name);
    }
    Ok(())
}

/// MIDI message settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MidiConfig {
    /// MIDI channel 0-15 (default: 0)
    #[serde(default)]
    pub channel: u8,

    /// Note-on velocity (default: 127)
    #[serde(default = "default_velocity")]
    pub velocity: u8,

    /// Controller used for volume (default: 7, channel volume)
    #[serde(default = "default_volume_controller")]
    pub volume_controller: u8,

    /// Volume sent at startup (default: 127)
    #[serde(default = "default_initial_volume")]
    pub initial_volume: u8,
}

fn default_velocity() -> u8 { 127 }
fn default_volume_controller() -> u8 { 7 }
fn default_initial_volume() -> u8 { 127 }

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            velocity: default_velocity(),
            volume_controller: default_volume_controller(),
            initial_volume: default_initial_volume(),
        }
    }
}

/// MIDI output destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputConfig {
    /// System MIDI port, matched by name substring (None = first port)
    MidiPort {
        #[serde(default)]
        port: Option<String>,
    },
    /// Raw bytes to a serial device node
    Serial { path: PathBuf },
    /// Hex dump on stdout
    Stdout,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::MidiPort { port: None }
    }
}

/// Timing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    /// Delay between polls in ms (default: 10)
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,

    /// How long the synth reset line is held at each level in ms (default: 100)
    #[serde(default = "default_reset_hold_ms")]
    pub reset_hold_ms: u64,

    /// Interrupt pin handed to the touch controller (default: 2)
    #[serde(default = "default_interrupt_pin")]
    pub interrupt_pin: u8,
}

fn default_poll_ms() -> u64 { 10 }
fn default_reset_hold_ms() -> u64 { 100 }
fn default_interrupt_pin() -> u8 { 2 }

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_ms: default_poll_ms(),
            reset_hold_ms: default_reset_hold_ms(),
            interrupt_pin: default_interrupt_pin(),
        }
    }
}

/// Electrode assignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ElectrodeMap {
    #[serde(default)]
    pub pitch: u8,

    #[serde(default = "default_volume_electrode")]
    pub volume: u8,

    #[serde(default = "default_up_electrode")]
    pub instrument_up: u8,

    #[serde(default = "default_down_electrode")]
    pub instrument_down: u8,
}

fn default_volume_electrode() -> u8 { 11 }
fn default_up_electrode() -> u8 { 5 }
fn default_down_electrode() -> u8 { 6 }

impl ElectrodeMap {
    /// Every assignment with its role name
    pub fn all(&self) -> [(&'static str, u8); 4] {
        [
            ("pitch", self.pitch),
            ("volume", self.volume),
            ("instrument_up", self.instrument_up),
            ("instrument_down", self.instrument_down),
        ]
    }
}

impl Default for ElectrodeMap {
    fn default() -> Self {
        Self {
            pitch: 0,
            volume: default_volume_electrode(),
            instrument_up: default_up_electrode(),
            instrument_down: default_down_electrode(),
        }
    }
}

/// Pitch hand settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PitchConfig {
    /// Lowest note (default: 40)
    #[serde(default = "default_low_note")]
    pub low: f64,

    /// Highest note (default: 100)
    #[serde(default = "default_high_note")]
    pub high: f64,

    /// Closest hand plays the highest note (default: true)
    #[serde(default = "default_inverted")]
    pub inverted: bool,

    /// Curvature in [-10, 10] (default: 0, linear)
    #[serde(default)]
    pub curve: f64,

    /// Proximity fraction that counts as no hand (default: 0.95)
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f64,

    /// Key root for quantization (default: C)
    #[serde(default = "default_key")]
    pub key: String,

    /// Scale for quantization (default: chromatic)
    #[serde(default = "default_scale")]
    pub scale: String,
}

fn default_low_note() -> f64 { 40.0 }
fn default_high_note() -> f64 { 100.0 }
fn default_inverted() -> bool { true }
fn default_silence_threshold() -> f64 { 0.95 }
fn default_key() -> String { "C".to_string() }
fn default_scale() -> String { "chromatic".to_string() }

impl PitchConfig {
    pub fn mapping(&self) -> MappingSpec {
        MappingSpec::new(self.low, self.high, self.inverted, self.curve)
    }
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            low: default_low_note(),
            high: default_high_note(),
            inverted: default_inverted(),
            curve: 0.0,
            silence_threshold: default_silence_threshold(),
            key: default_key(),
            scale: default_scale(),
        }
    }
}

/// Volume hand settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeConfig {
    /// Quietest level (default: 0)
    #[serde(default)]
    pub low: f64,

    /// Loudest level (default: 127)
    #[serde(default = "default_high_volume")]
    pub high: f64,

    /// Closest hand is loudest (default: true)
    #[serde(default = "default_inverted")]
    pub inverted: bool,

    /// Curvature in [-10, 10] (default: 0, linear)
    #[serde(default)]
    pub curve: f64,
}

fn default_high_volume() -> f64 { 127.0 }

impl VolumeConfig {
    pub fn mapping(&self) -> MappingSpec {
        MappingSpec::new(self.low, self.high, self.inverted, self.curve)
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            low: 0.0,
            high: default_high_volume(),
            inverted: default_inverted(),
            curve: 0.0,
        }
    }
}

/// Instrument bank settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentConfig {
    /// First program in the bank (default: 0)
    #[serde(default)]
    pub first: u8,

    /// Last program in the bank (default: 127)
    #[serde(default = "default_last_instrument")]
    pub last: u8,

    /// Program selected at startup (default: 0)
    #[serde(default)]
    pub default: u8,
}

fn default_last_instrument() -> u8 { 127 }

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            first: 0,
            last: default_last_instrument(),
            default: 0,
        }
    }
}
