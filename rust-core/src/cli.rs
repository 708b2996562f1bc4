use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "voice-stress", about = "Microtremor stress estimate from voice audio")]
pub struct Cli {
    /// Config file (TOML). Defaults to ./voice-stress.toml when present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a mono 16-bit WAV file
    File {
        /// Input WAV file (canonical 44-byte header)
        path: PathBuf,

        /// Score every whole block instead of only the first
        #[arg(long)]
        all_blocks: bool,

        /// Sample rate of the file in Hz (overrides the config)
        #[arg(long)]
        sample_rate: Option<u32>,
    },

    /// Analyze the microphone live
    Listen {
        /// Stop after this many readings
        #[arg(long)]
        blocks: Option<u64>,

        /// Input device name (overrides the config)
        #[arg(long)]
        device: Option<String>,
    },

    /// List available input devices and exit
    Devices,
}
