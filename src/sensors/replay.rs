//! Replay of recorded touch controller traces
//!
//! A trace is a JSON-lines file, one poll per line:
//!
//! ```text
//! {"filtered":[512,498,...],"touched":[false,false,...]}
//! ```
//!
//! `filtered` must hold one reading per electrode. `touched` may be shorter
//! or missing; absent electrodes read as untouched. New-touch edges are
//! derived from untouched-to-touched transitions between lines. When the
//! trace runs out the last line is held.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::driver::{DriverError, TouchDriver, ELECTRODE_COUNT};

/// One recorded poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub filtered: Vec<i32>,

    #[serde(default)]
    pub touched: Vec<bool>,
}

impl TraceFrame {
    fn touched(&self, electrode: usize) -> bool {
        self.touched.get(electrode).copied().unwrap_or(false)
    }
}

/// Touch driver that plays back a trace
pub struct ReplayDriver {
    name: String,
    frames: Vec<TraceFrame>,
    next: usize,
    current: Option<usize>,
    edges: Vec<bool>,
    initialized: bool,
    interrupt_pin: Option<u8>,
}

impl ReplayDriver {
    /// Load a JSON-lines trace
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read trace: {:?}", path))?;

        let mut frames = Vec::new();
        for (i, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let frame: TraceFrame = serde_json::from_str(line)
                .with_context(|| format!("{:?} line {}", path, i + 1))?;
            frames.push(frame);
        }

        Self::from_frames(path.display().to_string(), frames)
    }

    /// Build from frames already in memory
    pub fn from_frames(name: impl Into<String>, frames: Vec<TraceFrame>) -> Result<Self> {
        if frames.is_empty() {
            bail!("Trace contains no frames");
        }
        for (i, frame) in frames.iter().enumerate() {
            if frame.filtered.len() != ELECTRODE_COUNT as usize {
                bail!(
                    "Trace frame {} has {} readings, expected {}",
                    i + 1,
                    frame.filtered.len(),
                    ELECTRODE_COUNT
                );
            }
        }

        Ok(Self {
            name: name.into(),
            frames,
            next: 0,
            current: None,
            edges: vec![false; ELECTRODE_COUNT as usize],
            initialized: false,
            interrupt_pin: None,
        })
    }

    /// Number of frames in the trace
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn interrupt_pin(&self) -> Option<u8> {
        self.interrupt_pin
    }

    fn frame(&self) -> Result<&TraceFrame, DriverError> {
        self.current
            .map(|i| &self.frames[i])
            .ok_or(DriverError::NotInitialized)
    }

    fn check_electrode(&self, electrode: u8) -> Result<(), DriverError> {
        if electrode >= self.electrode_count() {
            return Err(DriverError::ElectrodeOutOfRange(electrode));
        }
        Ok(())
    }
}

impl TouchDriver for ReplayDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&mut self) -> Result<(), DriverError> {
        self.initialized = true;
        Ok(())
    }

    fn select_interrupt(&mut self, pin: u8) -> Result<(), DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }
        self.interrupt_pin = Some(pin);
        Ok(())
    }

    fn update_all(&mut self) -> Result<(), DriverError> {
        if !self.initialized {
            return Err(DriverError::NotInitialized);
        }

        let previous = self.current;
        if self.next < self.frames.len() {
            self.current = Some(self.next);
            self.next += 1;
        }

        let now = &self.frames[self.current.unwrap_or(0)];
        for (electrode, edge) in self.edges.iter_mut().enumerate() {
            let was = match previous {
                Some(p) if Some(p) != self.current => self.frames[p].touched(electrode),
                // Holding the last frame: nothing new
                Some(_) => true,
                None => false,
            };
            *edge = now.touched(electrode) && !was;
        }

        Ok(())
    }

    fn filtered(&self, electrode: u8) -> Result<i32, DriverError> {
        self.check_electrode(electrode)?;
        Ok(self.frame()?.filtered[electrode as usize])
    }

    fn new_touch(&self, electrode: u8) -> Result<bool, DriverError> {
        self.check_electrode(electrode)?;
        self.frame()?;
        Ok(self.edges[electrode as usize])
    }

    /// Every frame has been played; further updates hold the last one
    fn finished(&self) -> bool {
        self.next >= self.frames.len()
    }
}
