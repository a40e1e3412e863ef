//! Runtime configuration for `dopplerscope`.
//!
//! [`Config`] is the single source of truth for a run, independent of where
//! each value came from. Values are layered in this order, later layers
//! winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config` or `DOPPLERSCOPE_CONFIG`)
//! 3. Command-line flags
//!
//! # Example file
//!
//! ```toml
//! [simulation]
//! source_position = { x = -200.0, y = 20.0 }
//! source_velocity = { x = 100.0, y = 0.0 }
//! source_frequency = 440.0
//! volume_emphasis = 4.0
//!
//! [display]
//! fps = 30
//! source_color = "#ff8800"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use doppler::{DiscStyle, ParamError, Rgb, SchedulerOptions, SimulationParams, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;

/// Highest display frame rate accepted.
pub const MAX_FPS: u32 = 240;

/// Errors raised while assembling a [`Config`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML for [`Config`].
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A simulation parameter is out of range.
    #[error("invalid simulation parameters: {0}")]
    Params(#[from] ParamError),

    /// A display setting is out of range.
    #[error("invalid display setting {field}: {reason}")]
    Display {
        /// Name of the offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Complete configuration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Physics parameters handed to the engine.
    pub simulation: SimulationParams,
    /// Presentation settings.
    pub display: DisplayConfig,
}

/// Presentation settings that never affect the physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Target frame rate of the interactive display.
    pub fps: u32,
    /// Number of frame deltas averaged for drawn motion.
    pub timing_window: usize,
    /// Halt after every frame until resumed.
    pub single_step: bool,
    /// Radius of the source disc, in screen pixels.
    pub source_radius: f64,
    /// Radius of the observer disc, in screen pixels.
    pub observer_radius: f64,
    /// Fill color of the source disc.
    #[serde(with = "hex_color")]
    pub source_color: Rgb,
    /// Fill color of the observer disc.
    #[serde(with = "hex_color")]
    pub observer_color: Rgb,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let options = SchedulerOptions::default();
        Self {
            fps: 60,
            timing_window: DEFAULT_CAPACITY,
            single_step: false,
            source_radius: options.source_disc.radius,
            observer_radius: options.observer_disc.radius,
            source_color: options.source_disc.color,
            observer_color: options.observer_disc.color,
        }
    }
}

impl DisplayConfig {
    /// Checks every display setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Display`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ConfigError::Display {
                field: "fps",
                reason: format!("must be between 1 and {MAX_FPS}, got {}", self.fps),
            });
        }
        if self.timing_window == 0 {
            return Err(ConfigError::Display {
                field: "timing_window",
                reason: "must hold at least one frame".to_string(),
            });
        }
        for (field, radius) in [
            ("source_radius", self.source_radius),
            ("observer_radius", self.observer_radius),
        ] {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::Display {
                    field,
                    reason: format!("must be a positive number, got {radius}"),
                });
            }
        }
        Ok(())
    }
}

impl Config {
    /// Parses a config from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the config for a run from CLI arguments.
    ///
    /// Starts from the file named by `--config` (or the defaults), applies
    /// the flags on top, then validates the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be loaded or the merged
    /// values are out of range.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Overwrites every value the command line sets explicitly.
    pub fn apply_cli(&mut self, cli: &Cli) {
        let sim = &mut self.simulation;
        if let Some(p) = cli.source_pos {
            sim.source_position = p;
        }
        if let Some(v) = cli.source_vel {
            sim.source_velocity = v;
        }
        if let Some(p) = cli.observer_pos {
            sim.observer_position = p;
        }
        if let Some(v) = cli.observer_vel {
            sim.observer_velocity = v;
        }
        if let Some(f) = cli.frequency {
            sim.source_frequency = f;
        }
        if let Some(p) = cli.power {
            sim.source_power = p;
        }
        if let Some(c) = cli.medium_speed {
            sim.medium_speed = c;
        }
        if let Some(z) = cli.zoom {
            sim.zoom = z;
        }
        if let Some(e) = cli.emphasis {
            sim.volume_emphasis = e;
        }

        let display = &mut self.display;
        if let Some(fps) = cli.fps {
            display.fps = fps;
        }
        if let Some(window) = cli.timing_window {
            display.timing_window = window;
        }
        display.single_step |= cli.single_step;
    }

    /// Checks the simulation parameters and the display settings.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.display.validate()
    }

    /// Scheduler options derived from the display settings.
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            timing_window: self.display.timing_window,
            single_step: self.display.single_step,
            source_disc: DiscStyle {
                radius: self.display.source_radius,
                color: self.display.source_color,
            },
            observer_disc: DiscStyle {
                radius: self.display.observer_radius,
                color: self.display.observer_color,
            },
        }
    }

    /// Renders the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns the TOML serialization error.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// `#rrggbb` strings for [`Rgb`] fields.
mod hex_color {
    use doppler::Rgb;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(color: &Rgb, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(color)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rgb, D::Error> {
        let text = String::deserialize(deserializer)?;
        Rgb::from_hex(&text)
            .ok_or_else(|| de::Error::custom(format!("expected a #rrggbb color, got '{text}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppler::Vector2;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["dopplerscope"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn config_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation, SimulationParams::default());
        assert_eq!(config.display.fps, 60);
        assert_eq!(config.display.timing_window, DEFAULT_CAPACITY);
    }

    #[test]
    fn config_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r##"
            [simulation]
            source_frequency = 440.0
            observer_velocity = { x = 0.0, y = 5.0 }

            [display]
            source_color = "#ff8800"
            "##,
        )
        .unwrap();

        assert_eq!(config.simulation.source_frequency, 440.0);
        assert_eq!(config.simulation.observer_velocity, Vector2::new(0.0, 5.0));
        assert_eq!(config.simulation.source_position, Vector2::new(-200.0, 20.0));
        assert_eq!(config.display.source_color, Rgb(0xff, 0x88, 0x00));
        assert_eq!(config.display.fps, 60);
    }

    #[test]
    fn config_rejects_unknown_keys() {
        assert!(Config::from_toml_str("[display]\nframes_per_second = 30\n").is_err());
        assert!(Config::from_toml_str("[physics]\n").is_err());
    }

    #[test]
    fn config_rejects_bad_color() {
        assert!(Config::from_toml_str("[display]\nobserver_color = \"blue\"\n").is_err());
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut config = Config::default();
        config.display.observer_color = Rgb(1, 2, 3);
        config.simulation.zoom = 2.5;
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("observer_color = \"#010203\""));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn config_load_reports_parse_error() {
        let file = config_file("[simulation\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn config_cli_overrides_file() {
        let file = config_file(
            r"
            [simulation]
            source_frequency = 440.0
            source_power = 2.0

            [display]
            fps = 30
            ",
        );
        let path = file.path().to_str().unwrap();
        let cli = cli(&["--config", path, "-f", "880", "--fps", "50", "--source-pos=-10,0"]);
        let config = Config::from_cli(&cli).unwrap();

        assert_eq!(config.simulation.source_frequency, 880.0);
        assert_eq!(config.simulation.source_power, 2.0);
        assert_eq!(config.simulation.source_position, Vector2::new(-10.0, 0.0));
        assert_eq!(config.display.fps, 50);
    }

    #[test]
    fn config_from_cli_validates() {
        let err = Config::from_cli(&cli(&["--emphasis", "0.5"])).unwrap_err();
        assert!(matches!(err, ConfigError::Params(ParamError::EmphasisBelowOne(_))));

        let err = Config::from_cli(&cli(&["--fps", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::Display { field: "fps", .. }));

        let err = Config::from_cli(&cli(&["--timing-window", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::Display { field: "timing_window", .. }));
    }

    #[test]
    fn config_rejects_bad_radius() {
        let mut config = Config::default();
        config.display.observer_radius = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Display { field: "observer_radius", .. })
        ));
    }

    #[test]
    fn config_scheduler_options() {
        let mut config = Config::default();
        config.display.timing_window = 5;
        config.display.single_step = true;
        config.display.source_radius = 3.0;
        let options = config.scheduler_options();
        assert_eq!(options.timing_window, 5);
        assert!(options.single_step);
        assert_eq!(options.source_disc.radius, 3.0);
        assert_eq!(options.observer_disc, SchedulerOptions::default().observer_disc);
    }

    #[test]
    fn config_single_step_flag_is_additive() {
        let file = config_file("[display]\nsingle_step = true\n");
        let path = file.path().to_str().unwrap();
        let config = Config::from_cli(&cli(&["--config", path])).unwrap();
        assert!(config.display.single_step);
    }
}
