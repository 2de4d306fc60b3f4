//! Byte sinks for the MIDI stream.
//!
//! The engine only ever writes complete messages, so transports need no
//! framing of their own.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use midir::{MidiOutput, MidiOutputConnection};
use thiserror::Error;

/// Errors raised by a transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no MIDI output ports available")]
    NoPorts,

    #[error("MIDI port '{0}' not found")]
    PortNotFound(String),

    #[error("MIDI backend unavailable: {0}")]
    Backend(String),

    #[error("failed to send MIDI: {0}")]
    Send(String),

    #[error("transport closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Something raw MIDI bytes can be written to
pub trait MidiTransport {
    /// Human readable name, for logs
    fn name(&self) -> &str;

    /// Write one complete message
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Output through a system MIDI port
pub struct PortTransport {
    name: String,
    conn: MidiOutputConnection,
}

impl PortTransport {
    /// Connect to the first port whose name contains `port_name`, or to the
    /// first port at all.
    pub fn connect(port_name: Option<&str>) -> Result<Self, TransportError> {
        let midi_out = MidiOutput::new("theremidi").map_err(|e| TransportError::Backend(e.to_string()))?;
        let ports = midi_out.ports();

        if ports.is_empty() {
            return Err(TransportError::NoPorts);
        }

        let port = match port_name {
            Some(name) => ports
                .iter()
                .find(|p| {
                    midi_out
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| TransportError::PortNotFound(name.to_string()))?
                .clone(),
            None => ports[0].clone(),
        };

        let name = midi_out
            .port_name(&port)
            .map_err(|e| TransportError::Backend(e.to_string()))?;
        let conn = midi_out
            .connect(&port, "theremidi-output")
            .map_err(|e| TransportError::Backend(e.to_string()))?;

        Ok(Self { name, conn })
    }
}

impl MidiTransport for PortTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.conn
            .send(bytes)
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// List available MIDI output ports.
pub fn list_ports() -> Result<Vec<String>, TransportError> {
    let midi_out = MidiOutput::new("theremidi-list").map_err(|e| TransportError::Backend(e.to_string()))?;
    let ports = midi_out.ports();

    let names: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok(names)
}

/// Raw bytes to a serial device node or file.
///
/// Line settings (31250 baud for DIN MIDI) are configured outside.
pub struct SerialTransport<W: Write = File> {
    name: String,
    writer: W,
}

impl SerialTransport<File> {
    /// Open a device node or file for writing
    pub fn open(path: &Path) -> Result<Self, TransportError> {
        let file = OpenOptions::new().write(true).create(true).open(path)?;
        Ok(Self::new(path.display().to_string(), file))
    }
}

impl<W: Write> SerialTransport<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }
}

impl<W: Write> MidiTransport for SerialTransport<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Hex dump to stdout, one message per line
pub struct StdoutTransport;

impl MidiTransport for StdoutTransport {
    fn name(&self) -> &str {
        "stdout"
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", hex_line(bytes))?;
        Ok(())
    }
}

/// Format bytes as `"90 46 7f"`
pub fn hex_line(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// In-memory capture, shared through [`MemoryTransport::handle`]
#[derive(Default)]
pub struct MemoryTransport {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of everything written so far
    pub fn handle(&self) -> Rc<RefCell<Vec<u8>>> {
        Rc::clone(&self.bytes)
    }
}

impl MidiTransport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.bytes.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }
}
