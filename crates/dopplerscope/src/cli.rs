//! Command-line interface for `dopplerscope`.
//!
//! Every simulation parameter has a flag; flags override the config file,
//! which overrides the built-in defaults.
//!
//! # Examples
//!
//! ```bash
//! # Interactive run with the default flyby
//! dopplerscope
//!
//! # A slower source passing closer, logged to a file
//! dopplerscope --source-pos=-150,5 --source-vel 60,0 --log-file run.log
//!
//! # Headless: ten seconds at 30 Hz as JSON lines, plus the audio track
//! dopplerscope --headless --duration 10 --rate 30 --format json --pcm-out flyby.f32
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use doppler::Vector2;
use tracing::Level;

/// Watch and hear a sound source fly past an observer.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dopplerscope",
    author,
    version,
    about = "Watch and hear a sound source fly past an observer",
    long_about = "Simulates one moving sound source and one moving observer in a plane. \
                  Shows the separation, closing speed, loudness and the Doppler-shifted \
                  frequency heard by the observer, live in the terminal or as a headless \
                  frame dump."
)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, short = 'c', env = "DOPPLERSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Source position at the start, as X,Y
    #[arg(long, value_name = "X,Y", value_parser = parse_vector, allow_hyphen_values = true)]
    pub source_pos: Option<Vector2>,

    /// Source velocity, as X,Y units per second
    #[arg(long, value_name = "X,Y", value_parser = parse_vector, allow_hyphen_values = true)]
    pub source_vel: Option<Vector2>,

    /// Observer position at the start, as X,Y
    #[arg(long, value_name = "X,Y", value_parser = parse_vector, allow_hyphen_values = true)]
    pub observer_pos: Option<Vector2>,

    /// Observer velocity, as X,Y units per second
    #[arg(long, value_name = "X,Y", value_parser = parse_vector, allow_hyphen_values = true)]
    pub observer_vel: Option<Vector2>,

    /// Emitted frequency in Hz
    #[arg(long, short = 'f')]
    pub frequency: Option<f64>,

    /// Acoustic power of the source in watts
    #[arg(long)]
    pub power: Option<f64>,

    /// Speed of sound in the medium, units per second
    #[arg(long)]
    pub medium_speed: Option<f64>,

    /// Render scale, screen pixels per distance unit
    #[arg(long, short = 'z')]
    pub zoom: Option<f64>,

    /// Exponent applied to the normalized gain (at least 1)
    #[arg(long)]
    pub emphasis: Option<f64>,

    /// Target frame rate of the interactive display
    #[arg(long)]
    pub fps: Option<u32>,

    /// Number of frame deltas averaged for drawn motion
    #[arg(long)]
    pub timing_window: Option<usize>,

    /// Halt after every frame until resumed
    #[arg(long)]
    pub single_step: bool,

    /// Run without a terminal UI and print one line per frame
    #[arg(long)]
    pub headless: bool,

    /// Headless run length in seconds
    #[arg(long, default_value_t = 5.0)]
    pub duration: f64,

    /// Headless frame rate in Hz (defaults to the display fps)
    #[arg(long, requires = "headless")]
    pub rate: Option<f64>,

    /// Headless output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the synthesized tone as raw 32-bit float little-endian PCM
    #[arg(long, value_name = "PATH")]
    pub pcm_out: Option<PathBuf>,

    /// Do not open the audio output device
    #[arg(long)]
    pub mute: bool,

    /// Sample rate of the PCM output
    #[arg(long, default_value_t = 44_100)]
    pub sample_rate: u32,

    /// Write logs to this file (interactive mode logs nowhere otherwise)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Frame output formats for headless runs.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One human-readable line per frame
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl Cli {
    /// Parse command line arguments.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create CLI from iterator (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if argument parsing fails.
    pub fn try_parse_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Maximum log level implied by `-v`.
    #[must_use]
    pub const fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Parses `X,Y` into a vector.
fn parse_vector(s: &str) -> Result<Vector2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{s}'"))?;
    let component = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{}': {e}", v.trim()))
    };
    Ok(Vector2::new(component(x)?, component(y)?))
}
