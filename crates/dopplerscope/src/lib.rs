#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]

//! # Dopplerscope
//!
//! Terminal front end for the [`doppler`] engine.
//!
//! The binary and the integration tests share this library:
//!
//! - [`cli`] - command-line flags
//! - [`config`] - layered runtime configuration (defaults, TOML, flags)
//! - [`canvas`] - half-block render sink
//! - [`panel`] - readout display sink
//! - [`app`] - interactive crossterm loop and key bindings
//! - [`headless`] - synthetic-clock driver with text/JSON output
//! - [`audio`] - live tone output (`cpal`, behind the `audio` feature)
//! - [`pcm`] - raw PCM export of the tone
//! - [`logging`] - `tracing` subscriber setup

pub mod app;
pub mod audio;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod error;
pub mod headless;
pub mod logging;
pub mod panel;
pub mod pcm;

pub use error::{AppError, Result};

use app::App;
use audio::Speaker;
use cli::Cli;
use config::Config;
use pcm::PcmWriter;
use tracing::warn;

/// Runs whichever mode the CLI selects with an already built config.
///
/// # Errors
///
/// Returns the first error that ends the run.
pub fn run(cli: &Cli, config: &Config) -> Result<()> {
    if cli.headless {
        headless::run_cli(cli, config)?;
        return Ok(());
    }

    let (cols, rows) = crossterm::terminal::size()?;
    let mut app = App::new(config, cols, rows, cli.sample_rate)?;
    if let Some(path) = cli.pcm_out.as_deref() {
        let pcm = PcmWriter::create(path).map_err(|e| AppError::output(path, e))?;
        app = app.with_pcm(pcm);
    }
    if !cli.mute {
        match Speaker::open() {
            Ok(speaker) => app = app.with_speaker(speaker),
            Err(e) => warn!(error = %e, "running without sound"),
        }
    }
    app.run()
}
