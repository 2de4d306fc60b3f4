//! MIDI messages and their wire encoding.
//!
//! Messages are turned into raw bytes by [`encode`], which decides how many
//! data bytes follow a status byte from its high nibble alone. Data bytes
//! are passed through as given; keeping them below `0x80` is up to the
//! caller.

use log::warn;

use super::transport::MidiTransport;

/// Highest status nibble that still carries two data bytes (control change)
const TWO_DATA_BYTES_MAX: u8 = 0xB0;

/// Controller number for channel volume
pub const CHANNEL_VOLUME: u8 = 7;

/// MIDI message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note on: channel (0-15), note (0-127), velocity (0-127)
    NoteOn(u8, u8, u8),
    /// Note off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff(u8, u8, u8),
    /// Control change: channel (0-15), controller (0-127), value (0-127)
    ControlChange(u8, u8, u8),
    /// Program change: channel (0-15), program (0-127)
    ProgramChange(u8, u8),
}

impl MidiMessage {
    /// Status byte and both data slots; unused slots are zero.
    pub fn status_bytes(&self) -> (u8, u8, u8) {
        match *self {
            MidiMessage::NoteOn(ch, note, vel) => (0x90 | ch, note, vel),
            MidiMessage::NoteOff(ch, note, vel) => (0x80 | ch, note, vel),
            MidiMessage::ControlChange(ch, ctrl, val) => (0xB0 | ch, ctrl, val),
            MidiMessage::ProgramChange(ch, prog) => (0xC0 | ch, prog, 0),
        }
    }

    /// Convert to raw MIDI bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (status, data1, data2) = self.status_bytes();
        encode(status, data1, data2)
    }
}

/// Serialize one message.
///
/// Statuses up to and including the `0xB0` nibble carry both data bytes,
/// everything from `0xC0` up carries only `data1`.
pub fn encode(status: u8, data1: u8, data2: u8) -> Vec<u8> {
    if status & 0xF0 <= TWO_DATA_BYTES_MAX {
        vec![status, data1, data2]
    } else {
        vec![status, data1]
    }
}

/// Outgoing MIDI stream.
///
/// Writes are fire-and-forget: a failed write is logged and dropped so the
/// poll loop never stalls on the transport.
pub struct MidiOut {
    transport: Box<dyn MidiTransport>,
    sent: u64,
    dropped: u64,
}

impl MidiOut {
    pub fn new(transport: Box<dyn MidiTransport>) -> Self {
        Self {
            transport,
            sent: 0,
            dropped: 0,
        }
    }

    /// Encode and write one message
    pub fn send(&mut self, msg: MidiMessage) {
        let bytes = msg.to_bytes();
        match self.transport.write_bytes(&bytes) {
            Ok(()) => self.sent += 1,
            Err(e) => {
                self.dropped += 1;
                warn!("dropped {:?}: {}", msg, e);
            }
        }
    }

    /// Send a batch in order
    pub fn send_all(&mut self, messages: &[MidiMessage]) {
        for msg in messages {
            self.send(*msg);
        }
    }

    /// Messages written successfully
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Messages lost to transport errors
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn transport(&self) -> &dyn MidiTransport {
        self.transport.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::transport::{MemoryTransport, TransportError};

    #[test]
    fn test_midi_message_note_on() {
        let msg = MidiMessage::NoteOn(0, 60, 100);
        assert_eq!(msg.to_bytes(), vec![0x90, 60, 100]);
    }

    #[test]
    fn test_midi_message_note_on_channel() {
        let msg = MidiMessage::NoteOn(5, 72, 80);
        assert_eq!(msg.to_bytes(), vec![0x95, 72, 80]);
    }

    #[test]
    fn test_midi_message_note_off() {
        let msg = MidiMessage::NoteOff(0, 60, 0);
        assert_eq!(msg.to_bytes(), vec![0x80, 60, 0]);
    }

    #[test]
    fn test_midi_message_cc() {
        let msg = MidiMessage::ControlChange(0, CHANNEL_VOLUME, 64);
        assert_eq!(msg.to_bytes(), vec![0xB0, 7, 64]);
    }

    #[test]
    fn test_midi_message_program_change_has_no_third_byte() {
        let msg = MidiMessage::ProgramChange(0, 42);
        assert_eq!(msg.to_bytes(), vec![0xC0, 42]);

        let msg = MidiMessage::ProgramChange(9, 0);
        assert_eq!(msg.to_bytes(), vec![0xC9, 0]);
    }

    #[test]
    fn test_encode_uses_high_nibble() {
        assert_eq!(encode(0x8F, 1, 2).len(), 3);
        assert_eq!(encode(0xBF, 1, 2).len(), 3);
        assert_eq!(encode(0xC0, 1, 2), vec![0xC0, 1]);
        assert_eq!(encode(0xD3, 1, 2), vec![0xD3, 1]);
        assert_eq!(encode(0xE0, 1, 2), vec![0xE0, 1]);
    }

    #[test]
    fn test_encode_passes_data_through() {
        assert_eq!(encode(0x90, 200, 255), vec![0x90, 200, 255]);
    }

    #[test]
    fn test_midi_out_counts_writes() {
        let transport = MemoryTransport::new();
        let bytes = transport.handle();
        let mut out = MidiOut::new(Box::new(transport));

        out.send_all(&[
            MidiMessage::ProgramChange(0, 5),
            MidiMessage::NoteOn(0, 60, 127),
        ]);

        assert_eq!(out.sent(), 2);
        assert_eq!(out.dropped(), 0);
        assert_eq!(bytes.borrow().as_slice(), &[0xC0, 5, 0x90, 60, 127]);
    }

    struct Broken;

    impl MidiTransport for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn write_bytes(&mut self, _bytes: &[u8]) -> Result<(), TransportError> {
            Err(TransportError::Closed)
        }
    }

    #[test]
    fn test_midi_out_drops_failed_writes() {
        let mut out = MidiOut::new(Box::new(Broken));
        out.send(MidiMessage::NoteOn(0, 60, 127));
        out.send(MidiMessage::NoteOff(0, 60, 0));

        assert_eq!(out.sent(), 0);
        assert_eq!(out.dropped(), 2);
    }
}
