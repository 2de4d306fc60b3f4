//! Theremidi - a capacitive proximity theremin that speaks MIDI
//!
//! Two electrodes sense how close a hand is: one sets the pitch, the other
//! the volume. Ranges calibrate themselves as the player moves, readings
//! are mapped onto notes along a power-law curve, and a monophonic voice
//! turns them into note-on, note-off and control-change messages. Two more
//! electrodes step through the instrument bank.

pub mod config;
pub mod engine;
pub mod mapping;
pub mod sensors;

pub use config::TheremidiConfig;
pub use engine::Engine;
