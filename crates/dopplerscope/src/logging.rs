//! Log subscriber setup.
//!
//! Headless runs log to stderr so stdout stays clean for frame output. The
//! interactive UI owns the terminal, so it logs only when `--log-file` is
//! given. `RUST_LOG` overrides the level picked by `-v`.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{AppError, Result};

/// Where log records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    /// Standard error.
    Stderr,
    /// A file, truncated on start.
    File(&'a Path),
    /// Nowhere.
    Off,
}

impl<'a> LogTarget<'a> {
    /// Picks the target for a run.
    pub const fn for_run(headless: bool, log_file: Option<&'a Path>) -> Self {
        match (log_file, headless) {
            (Some(path), _) => Self::File(path),
            (None, true) => Self::Stderr,
            (None, false) => Self::Off,
        }
    }
}

/// Builds the filter for `level` unless `RUST_LOG` is set.
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_ascii_lowercase()))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`AppError::Output`] if the log file cannot be created, or
/// [`AppError::Logging`] if a subscriber is already installed.
pub fn init(target: LogTarget<'_>, level: Level) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false);

    let installed = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = File::create(path).map_err(|e| AppError::output(path, e))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
    };
    installed.map_err(|e| AppError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_prefers_log_file() {
        let path = Path::new("run.log");
        assert_eq!(LogTarget::for_run(true, Some(path)), LogTarget::File(path));
        assert_eq!(LogTarget::for_run(false, Some(path)), LogTarget::File(path));
    }

    #[test]
    fn target_defaults_by_mode() {
        assert_eq!(LogTarget::for_run(true, None), LogTarget::Stderr);
        assert_eq!(LogTarget::for_run(false, None), LogTarget::Off);
    }

    #[test]
    fn off_installs_nothing() {
        assert!(init(LogTarget::Off, Level::TRACE).is_ok());
    }
}
