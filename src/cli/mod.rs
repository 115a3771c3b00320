//! CLI interface for tonebank

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A bank of independently streamed waveform oscillators
#[derive(Parser)]
#[command(name = "tonebank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream the configured oscillators to the output device
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "tonebank.yaml")]
        config: PathBuf,

        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Render each oscillator to its own WAV file
    Record {
        /// Configuration file path
        #[arg(short, long, default_value = "tonebank.yaml")]
        config: PathBuf,

        /// Output path; oscillator N is written to <stem>-N.wav
        #[arg(short, long)]
        output: PathBuf,

        /// Duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,
    },

    /// List available audio output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "tonebank.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
