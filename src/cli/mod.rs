//! CLI interface for Theremidi

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Capacitive proximity theremin that speaks MIDI
#[derive(Parser)]
#[command(name = "theremidi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play from a recorded trace or a simulated performer
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "theremidi.yaml")]
        config: PathBuf,

        /// JSON-lines touch controller trace to replay
        #[arg(short, long, conflicts_with = "simulate")]
        trace: Option<PathBuf>,

        /// Use the simulated performer instead of a trace
        #[arg(short, long)]
        simulate: bool,

        /// Stop after this many polls
        #[arg(short, long)]
        polls: Option<u64>,
    },

    /// List available MIDI output ports
    Ports,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "theremidi.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,

    /// Print the response of a mapping curve
    Curve(CurveArgs),
}

#[derive(Args)]
pub struct CurveArgs {
    /// Curvature in [-10, 10]
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    pub curve: f64,

    /// Smallest reading
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub in_min: f64,

    /// Largest reading
    #[arg(long, default_value = "1000", allow_hyphen_values = true)]
    pub in_max: f64,

    /// Lowest output
    #[arg(long, default_value = "40")]
    pub low: f64,

    /// Highest output
    #[arg(long, default_value = "100")]
    pub high: f64,

    /// Smallest reading maps to the highest output
    #[arg(long)]
    pub inverted: bool,

    /// Snap outputs to a scale, e.g. "major"
    #[arg(long)]
    pub scale: Option<String>,

    /// Key for --scale
    #[arg(long, default_value = "C")]
    pub key: String,

    /// Number of rows
    #[arg(long, default_value = "11")]
    pub steps: u32,
}
