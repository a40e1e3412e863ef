//! Errors surfaced by the host application.

use std::io;
use std::path::PathBuf;

use doppler::ParamError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can end a `dopplerscope` run.
///
/// Numeric trouble inside a run (a singular Doppler shift, a non-finite
/// gain) never shows up here; the engine handles it per frame and logs it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Terminal setup, polling, drawing or frame output failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The configuration could not be assembled.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A live parameter change or reset was rejected.
    #[error("invalid simulation parameters: {0}")]
    Params(#[from] ParamError),

    /// An output file could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    Output {
        /// File that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A frame could not be encoded as JSON.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    /// The headless clock settings are unusable.
    #[error("invalid headless run: {0}")]
    InvalidRun(String),

    /// The audio output device could not be opened.
    #[error("audio output unavailable: {0}")]
    Audio(String),

    /// The log subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

impl AppError {
    /// Wraps an I/O error with the path it concerns.
    pub fn output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Output {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for host operations.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_error_names_the_path() {
        let err = AppError::output(
            "/tmp/flyby.f32",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/flyby.f32"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn config_errors_pass_through() {
        let err: AppError = ConfigError::Params(ParamError::EmphasisBelowOne(0.5)).into();
        assert_eq!(
            err.to_string(),
            "invalid simulation parameters: volume emphasis must be at least 1, got 0.5"
        );
    }
}
