//! Per-performance state and the work done on each poll
//!
//! A [`Session`] owns everything that changes while playing: calibration of
//! both hands, the voice, and the selected instrument. It turns one
//! [`Frame`] of sensor input into the MIDI messages that frame implies and
//! never touches I/O itself.

use log::debug;

use super::instrument::InstrumentSelector;
use super::midi::MidiMessage;
use super::voice::{PerformanceState, PitchReading, Voicing};
use crate::config::TheremidiConfig;
use crate::mapping::{pitch_class, CalibrationRange, MappingSpec, QuantizeMapper, Scale};
use crate::sensors::Frame;

/// Change detection and calibration for one continuous electrode
#[derive(Debug, Clone, Default)]
pub struct ChannelInput {
    last: Option<i32>,
    range: CalibrationRange,
}

impl ChannelInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reading; `Some` only when it differs from the previous one.
    ///
    /// Accepted readings widen the calibration range.
    pub fn accept(&mut self, reading: i32) -> Option<i32> {
        if self.last == Some(reading) {
            return None;
        }
        self.last = Some(reading);
        self.range.observe(reading);
        Some(reading)
    }

    pub fn range(&self) -> &CalibrationRange {
        &self.range
    }

    pub fn last(&self) -> Option<i32> {
        self.last
    }
}

/// State of one performance
pub struct Session {
    pitch: ChannelInput,
    volume: ChannelInput,
    pitch_mapping: MappingSpec,
    volume_mapping: MappingSpec,
    quantizer: QuantizeMapper,
    voicing: Voicing,
    initial_volume: u8,
    performance: PerformanceState,
    instrument: InstrumentSelector,
}

impl Session {
    /// Create a fresh, uncalibrated session
    pub fn new(config: &TheremidiConfig) -> Self {
        let root = pitch_class(&config.pitch.key).unwrap_or(0);
        let scale = Scale::from_name(&config.pitch.scale).unwrap_or_else(Scale::chromatic);
        let inst = &config.instruments;

        Self {
            pitch: ChannelInput::new(),
            volume: ChannelInput::new(),
            pitch_mapping: config.pitch.mapping(),
            volume_mapping: config.volume.mapping(),
            quantizer: QuantizeMapper::new("pitch", root, scale),
            voicing: Voicing {
                channel: config.midi.channel,
                velocity: config.midi.velocity,
                volume_controller: config.midi.volume_controller,
                silence_threshold: config.pitch.silence_threshold,
            },
            initial_volume: config.midi.initial_volume,
            performance: PerformanceState::new(),
            instrument: InstrumentSelector::new(inst.first, inst.last, inst.default),
        }
    }

    /// Initial volume and program, sent once after the synth comes out of reset
    pub fn startup_messages(&mut self) -> Vec<MidiMessage> {
        self.performance.assume_volume(self.initial_volume);
        vec![
            MidiMessage::ControlChange(
                self.voicing.channel,
                self.voicing.volume_controller,
                self.initial_volume,
            ),
            MidiMessage::ProgramChange(self.voicing.channel, self.instrument.current()),
        ]
    }

    /// Process one poll.
    ///
    /// Instrument edges win over hand movement: a poll that changes the
    /// instrument does not evaluate pitch or volume. "Up" wins over "down".
    pub fn poll(&mut self, frame: &Frame) -> Vec<MidiMessage> {
        if frame.instrument_up {
            self.instrument.step_up();
            return self.instrument_changed();
        }
        if frame.instrument_down {
            self.instrument.step_down();
            return self.instrument_changed();
        }

        let mut messages = Vec::new();
        if let Some(sample) = self.pitch.accept(frame.pitch) {
            messages.extend(self.evaluate_pitch(sample));
        }
        if let Some(sample) = self.volume.accept(frame.volume) {
            messages.extend(self.evaluate_volume(sample));
        }
        messages
    }

    fn instrument_changed(&mut self) -> Vec<MidiMessage> {
        let mut messages = vec![MidiMessage::ProgramChange(
            self.voicing.channel,
            self.instrument.current(),
        )];
        messages.extend(self.performance.release_all(&self.voicing));
        messages
    }

    fn evaluate_pitch(&mut self, sample: i32) -> Vec<MidiMessage> {
        let range = self.pitch.range();
        debug!("pitch {} in {:?}", sample, range.bounds());

        let proximity = range.map(&self.pitch_mapping.unit(), sample);
        let position = range.map(&self.pitch_mapping, sample);
        let (Some(proximity), Some(position)) = (proximity, position) else {
            return Vec::new();
        };

        let note = self
            .quantizer
            .quantize_note(position.round().clamp(0.0, 127.0) as u8);
        self.performance
            .on_pitch(PitchReading { proximity, note }, &self.voicing)
    }

    fn evaluate_volume(&mut self, sample: i32) -> Option<MidiMessage> {
        let range = self.volume.range();
        debug!("volume {} in {:?}", sample, range.bounds());

        let level = range.map(&self.volume_mapping, sample)?;
        self.performance
            .on_volume(level.round().clamp(0.0, 127.0) as u8, &self.voicing)
    }

    pub fn performance(&self) -> &PerformanceState {
        &self.performance
    }

    pub fn instrument(&self) -> &InstrumentSelector {
        &self.instrument
    }

    pub fn pitch_input(&self) -> &ChannelInput {
        &self.pitch
    }

    pub fn volume_input(&self) -> &ChannelInput {
        &self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::voice::Voice;

    fn session() -> Session {
        Session::new(&TheremidiConfig::default())
    }

    #[test]
    fn test_channel_input_skips_repeats() {
        let mut input = ChannelInput::new();
        assert_eq!(input.accept(500), Some(500));
        assert_eq!(input.accept(500), None);
        assert_eq!(input.accept(480), Some(480));
        assert_eq!(input.range().bounds(), Some((480, 500)));
    }

    #[test]
    fn test_startup_messages() {
        let mut s = session();
        assert_eq!(
            s.startup_messages(),
            vec![MidiMessage::ControlChange(0, 7, 127), MidiMessage::ProgramChange(0, 0)]
        );
        assert_eq!(s.performance().volume(), Some(127));
    }

    #[test]
    fn test_first_sample_is_not_playable() {
        let mut s = session();
        assert!(s.poll(&Frame::hands(600, 600)).is_empty());
        assert_eq!(s.performance().voice(), Voice::Silent);
    }

    #[test]
    fn test_midpoint_plays_note_70() {
        let mut s = session();
        s.poll(&Frame::hands(200, 600));
        s.poll(&Frame::hands(100, 600));
        let msgs = s.poll(&Frame::hands(150, 600));

        assert_eq!(msgs[0], MidiMessage::NoteOn(0, 70, 127));
        assert_eq!(s.performance().voice(), Voice::Sounding(70));
    }

    #[test]
    fn test_play_then_far_hand_silences() {
        let mut s = session();
        assert!(s.poll(&Frame::hands(1000, 600)).is_empty());

        // Closest possible hand: top of the range
        assert_eq!(s.poll(&Frame::hands(0, 600)), vec![MidiMessage::NoteOn(0, 100, 127)]);

        assert_eq!(
            s.poll(&Frame::hands(500, 600)),
            vec![MidiMessage::NoteOn(0, 70, 127), MidiMessage::NoteOff(0, 100, 0)]
        );

        // 980 of 0..1000 is within 5% of the baseline
        assert_eq!(
            s.poll(&Frame::hands(980, 600)),
            vec![MidiMessage::NoteOff(0, 100, 0), MidiMessage::NoteOff(0, 70, 0)]
        );
        assert_eq!(s.performance().voice(), Voice::Silent);

        // Every changed far reading repeats the note-offs
        assert_eq!(
            s.poll(&Frame::hands(990, 600)),
            vec![MidiMessage::NoteOff(0, 100, 0), MidiMessage::NoteOff(0, 70, 0)]
        );
        assert!(s.poll(&Frame::hands(990, 600)).is_empty());
    }

    #[test]
    fn test_unchanged_reading_sends_nothing() {
        let mut s = session();
        s.poll(&Frame::hands(1000, 600));
        s.poll(&Frame::hands(300, 600));

        for _ in 0..20 {
            assert!(s.poll(&Frame::hands(300, 600)).is_empty());
        }
    }

    #[test]
    fn test_nearby_readings_on_same_note_send_nothing() {
        let mut s = session();
        s.poll(&Frame::hands(1000, 600));
        s.poll(&Frame::hands(0, 600));
        s.poll(&Frame::hands(500, 600));

        // 1000 counts span 60 notes; a couple of counts stays on 70
        assert!(s.poll(&Frame::hands(501, 600)).is_empty());
        assert!(s.poll(&Frame::hands(499, 600)).is_empty());
    }

    #[test]
    fn test_volume_follows_range_update() {
        let mut s = session();
        s.startup_messages();

        assert!(s.poll(&Frame::hands(500, 200)).is_empty());

        // New maximum: hand far away, quietest level sent in the same poll
        assert_eq!(
            s.poll(&Frame::hands(500, 600)),
            vec![MidiMessage::ControlChange(0, 7, 0)]
        );

        // Back at the minimum: loudest
        assert_eq!(
            s.poll(&Frame::hands(500, 200)),
            vec![MidiMessage::ControlChange(0, 7, 127)]
        );
    }

    #[test]
    fn test_volume_does_not_trigger_notes() {
        let mut s = session();
        s.poll(&Frame::hands(500, 200));
        let msgs = s.poll(&Frame::hands(500, 400));
        assert!(msgs
            .iter()
            .all(|m| matches!(m, MidiMessage::ControlChange(..))));
    }

    #[test]
    fn test_instrument_up_wraps_and_silences() {
        let mut config = TheremidiConfig::default();
        config.instruments.default = 127;
        let mut s = Session::new(&config);
        s.poll(&Frame::hands(1000, 600));
        s.poll(&Frame::hands(0, 600));
        s.poll(&Frame::hands(500, 600));

        let frame = Frame {
            instrument_up: true,
            ..Frame::hands(500, 600)
        };
        assert_eq!(
            s.poll(&frame),
            vec![
                MidiMessage::ProgramChange(0, 0),
                MidiMessage::NoteOff(0, 70, 0),
                MidiMessage::NoteOff(0, 100, 0),
            ]
        );
        assert_eq!(s.instrument().current(), 0);
    }

    #[test]
    fn test_instrument_change_before_any_note() {
        let mut s = session();
        let frame = Frame {
            instrument_up: true,
            ..Frame::hands(0, 0)
        };
        assert_eq!(s.poll(&frame), vec![MidiMessage::ProgramChange(0, 1)]);
    }

    #[test]
    fn test_instrument_down_wraps() {
        let mut s = session();
        let frame = Frame {
            instrument_down: true,
            ..Frame::hands(0, 0)
        };
        assert_eq!(s.poll(&frame)[0], MidiMessage::ProgramChange(0, 127));
    }

    #[test]
    fn test_up_wins_over_down() {
        let mut s = session();
        let frame = Frame {
            instrument_up: true,
            instrument_down: true,
            ..Frame::hands(0, 0)
        };
        s.poll(&frame);
        assert_eq!(s.instrument().current(), 1);
    }

    #[test]
    fn test_instrument_change_skips_hands() {
        let mut s = session();
        s.poll(&Frame::hands(1000, 600));
        s.poll(&Frame::hands(0, 600));

        let frame = Frame {
            instrument_up: true,
            ..Frame::hands(500, 100)
        };
        let msgs = s.poll(&frame);
        assert_eq!(
            msgs,
            vec![
                MidiMessage::ProgramChange(0, 1),
                MidiMessage::NoteOff(0, 100, 0),
            ]
        );
        assert_eq!(s.pitch_input().last(), Some(0));
        assert_eq!(s.volume_input().last(), Some(600));

        // The held hand is picked up on the next poll
        let msgs = s.poll(&Frame::hands(500, 100));
        assert!(msgs.contains(&MidiMessage::NoteOn(0, 70, 127)));
    }

    #[test]
    fn test_scale_quantization() {
        let mut config = TheremidiConfig::default();
        config.pitch.scale = "major".to_string();
        config.pitch.key = "C".to_string();
        let mut s = Session::new(&config);

        s.poll(&Frame::hands(1000, 600));
        s.poll(&Frame::hands(0, 600));
        // Linear midpoint is 70 (A#), snapped down to A
        let msgs = s.poll(&Frame::hands(500, 600));
        assert_eq!(msgs[0], MidiMessage::NoteOn(0, 69, 127));
    }
}
