//! Performance engine for Theremidi
//!
//! Ties the touch driver, the session and the MIDI output together in a
//! single-threaded poll loop.

mod instrument;
mod midi;
mod session;
mod transport;
mod voice;

pub use instrument::{InstrumentSelector, MAX_PROGRAM};
pub use midi::{encode, MidiMessage, MidiOut, CHANNEL_VOLUME};
pub use session::{ChannelInput, Session};
pub use transport::{
    hex_line, list_ports, MemoryTransport, MidiTransport, PortTransport, SerialTransport,
    StdoutTransport, TransportError,
};
pub use voice::{PerformanceState, PitchReading, Voice, Voicing};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{error, info};
use thiserror::Error;

use crate::config::{OutputConfig, TheremidiConfig};
use crate::sensors::{DriverError, Frame, ResetLine, TouchDriver};

/// Startup step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStage {
    Begin,
    SelectInterrupt,
    ForceUpdate,
}

impl fmt::Display for StartupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StartupStage::Begin => "initialization",
            StartupStage::SelectInterrupt => "interrupt selection",
            StartupStage::ForceUpdate => "first update",
        };
        f.write_str(name)
    }
}

/// Fatal error while bringing the instrument up
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("touch controller {stage} failed: {source}")]
pub struct StartupError {
    pub stage: StartupStage,
    pub source: DriverError,
}

impl StartupError {
    fn at(stage: StartupStage) -> impl FnOnce(DriverError) -> Self {
        move |source| Self { stage, source }
    }
}

/// Open the transport named by the configuration
pub fn open_transport(output: &OutputConfig) -> Result<Box<dyn MidiTransport>, TransportError> {
    let transport: Box<dyn MidiTransport> = match output {
        OutputConfig::MidiPort { port } => Box::new(PortTransport::connect(port.as_deref())?),
        OutputConfig::Serial { path } => Box::new(SerialTransport::open(path)?),
        OutputConfig::Stdout => Box::new(StdoutTransport),
    };
    Ok(transport)
}

/// The main performance engine
pub struct Engine {
    config: TheremidiConfig,
    driver: Box<dyn TouchDriver>,
    reset: Box<dyn ResetLine>,
    out: MidiOut,
    session: Session,
    polls: u64,
}

impl Engine {
    /// Create a new engine with the given configuration
    pub fn new(
        config: TheremidiConfig,
        driver: Box<dyn TouchDriver>,
        reset: Box<dyn ResetLine>,
        transport: Box<dyn MidiTransport>,
    ) -> Self {
        let session = Session::new(&config);
        Self {
            config,
            driver,
            reset,
            out: MidiOut::new(transport),
            session,
            polls: 0,
        }
    }

    /// Bring up the touch controller and the synthesizer.
    ///
    /// Any touch controller failure is fatal; nothing is sent to the synth.
    pub fn start(&mut self) -> Result<(), StartupError> {
        let result = self.bring_up();
        if let Err(e) = &result {
            error!("{}", e);
        }
        result
    }

    fn bring_up(&mut self) -> Result<(), StartupError> {
        self.driver.begin().map_err(StartupError::at(StartupStage::Begin))?;
        self.driver
            .select_interrupt(self.config.timing.interrupt_pin)
            .map_err(StartupError::at(StartupStage::SelectInterrupt))?;
        self.driver
            .force_update()
            .map_err(StartupError::at(StartupStage::ForceUpdate))?;
        info!("touch controller '{}' ready", self.driver.name());

        let hold = Duration::from_millis(self.config.timing.reset_hold_ms);
        self.reset.set_low();
        thread::sleep(hold);
        self.reset.set_high();
        thread::sleep(hold);

        let messages = self.session.startup_messages();
        self.out.send_all(&messages);
        info!(
            "synth ready on '{}', instrument {}",
            self.out.transport().name(),
            self.session.instrument().current()
        );
        Ok(())
    }

    /// Run one poll: refresh the driver, update the session, send MIDI.
    ///
    /// Returns the number of messages sent.
    pub fn step(&mut self) -> Result<usize, DriverError> {
        self.driver.update_all()?;
        let frame = Frame::read(self.driver.as_ref(), &self.config.electrodes)?;
        let messages = self.session.poll(&frame);
        self.out.send_all(&messages);
        self.polls += 1;
        Ok(messages.len())
    }

    /// Poll at the configured period until `running` clears, `max_polls`
    /// is reached or the driver runs out of readings
    pub fn run(&mut self, running: &AtomicBool, max_polls: Option<u64>) -> Result<(), DriverError> {
        let period = Duration::from_millis(self.config.timing.poll_ms);
        while running.load(Ordering::SeqCst) {
            if max_polls.is_some_and(|max| self.polls >= max) {
                break;
            }
            if self.driver.finished() {
                info!("'{}' has no more readings", self.driver.name());
                break;
            }
            self.step()?;
            thread::sleep(period);
        }
        info!(
            "stopped after {} polls, {} messages sent, {} dropped",
            self.polls,
            self.out.sent(),
            self.out.dropped()
        );
        Ok(())
    }

    /// Number of completed polls
    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn output(&self) -> &MidiOut {
        &self.out
    }
}
