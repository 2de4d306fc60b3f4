//! Monophonic note and volume state machine
//!
//! One note sounds at a time. Moving the hand changes the note; pulling it
//! back to the baseline silences the voice. Volume is a separate stream of
//! control changes and never starts or stops notes.

use log::info;

use super::midi::MidiMessage;

/// What the voice is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    Silent,
    Sounding(u8),
}

/// Fixed parameters for the voice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voicing {
    /// MIDI channel (0-15)
    pub channel: u8,
    /// Note-on velocity
    pub velocity: u8,
    /// Controller number used for volume
    pub volume_controller: u8,
    /// Proximity fraction at or above which the hand counts as gone
    pub silence_threshold: f64,
}

/// One evaluated pitch sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchReading {
    /// Reading mapped onto `[0, 1]`, `1.0` at the baseline
    pub proximity: f64,
    /// Reading mapped onto the note range
    pub note: u8,
}

/// Current and previous output of the voice
///
/// Notes are `None` until something has been played and keep the last
/// notes sent after the voice goes silent.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceState {
    voice: Voice,
    current_note: Option<u8>,
    previous_note: Option<u8>,
    volume: Option<u8>,
    previous_volume: Option<u8>,
}

impl PerformanceState {
    pub fn new() -> Self {
        Self {
            voice: Voice::Silent,
            current_note: None,
            previous_note: None,
            volume: None,
            previous_volume: None,
        }
    }

    pub fn voice(&self) -> Voice {
        self.voice
    }

    pub fn current_note(&self) -> Option<u8> {
        self.current_note
    }

    pub fn previous_note(&self) -> Option<u8> {
        self.previous_note
    }

    pub fn volume(&self) -> Option<u8> {
        self.volume
    }

    pub fn previous_volume(&self) -> Option<u8> {
        self.previous_volume
    }

    /// Record a volume that was sent outside the state machine
    pub fn assume_volume(&mut self, level: u8) {
        self.previous_volume = self.volume;
        self.volume = Some(level);
    }

    /// Apply one pitch sample
    pub fn on_pitch(&mut self, reading: PitchReading, voicing: &Voicing) -> Vec<MidiMessage> {
        if reading.proximity >= voicing.silence_threshold {
            return self.silence(voicing);
        }

        let note = reading.note;
        match self.voice {
            Voice::Sounding(current) if current == note => Vec::new(),
            Voice::Sounding(current) => {
                info!("note {} -> {}", current, note);
                self.advance(note);
                vec![
                    MidiMessage::NoteOn(voicing.channel, note, voicing.velocity),
                    MidiMessage::NoteOff(voicing.channel, current, 0),
                ]
            }
            Voice::Silent => {
                info!("note on {}", note);
                self.advance(note);
                vec![MidiMessage::NoteOn(voicing.channel, note, voicing.velocity)]
            }
        }
    }

    /// Turn off the previous and current note.
    ///
    /// Repeated on every far-hand sample, so a lost note-off is sent again.
    pub fn silence(&mut self, voicing: &Voicing) -> Vec<MidiMessage> {
        if let Voice::Sounding(note) = self.voice {
            info!("note off {}", note);
        }
        self.voice = Voice::Silent;
        note_offs([self.previous_note, self.current_note], voicing)
    }

    /// Turn off the current and previous note
    pub fn release_all(&mut self, voicing: &Voicing) -> Vec<MidiMessage> {
        self.voice = Voice::Silent;
        note_offs([self.current_note, self.previous_note], voicing)
    }

    /// Apply one volume sample
    pub fn on_volume(&mut self, level: u8, voicing: &Voicing) -> Option<MidiMessage> {
        if self.volume == Some(level) {
            return None;
        }

        info!("volume {}", level);
        self.assume_volume(level);
        Some(MidiMessage::ControlChange(
            voicing.channel,
            voicing.volume_controller,
            level,
        ))
    }

    fn advance(&mut self, note: u8) {
        self.previous_note = self.current_note;
        self.current_note = Some(note);
        self.voice = Voice::Sounding(note);
    }
}

fn note_offs(notes: [Option<u8>; 2], voicing: &Voicing) -> Vec<MidiMessage> {
    notes
        .into_iter()
        .flatten()
        .map(|note| MidiMessage::NoteOff(voicing.channel, note, 0))
        .collect()
}

impl Default for PerformanceState {
    fn default() -> Self {
        Self::new()
    }
}
