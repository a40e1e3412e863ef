//! User-supplied simulation parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::acoustics::DEFAULT_MEDIUM_SPEED;
use crate::body::Body;
use crate::vector::Vector2;

/// Error returned when simulation parameters are out of range.
///
/// # Example
///
/// ```rust
/// use doppler::{ParamError, SimulationParams};
///
/// let params = SimulationParams::default().with_frequency(-1.0);
/// assert!(matches!(params.validate(), Err(ParamError::NotPositive { .. })));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// A value was NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NotFinite {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A value that must be strictly positive was not.
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// The emphasis exponent was below one.
    #[error("volume emphasis must be at least 1, got {0}")]
    EmphasisBelowOne(f64),
}

/// Everything the host collects before (re)starting a run.
///
/// Defaults describe a source passing 20 units in front of a resting
/// observer at 100 units/s, emitting 660 Hz into a 340 units/s medium.
///
/// # Example
///
/// ```rust
/// use doppler::{SimulationParams, Vector2};
///
/// let params = SimulationParams::new()
///     .with_source(Vector2::new(-100.0, 0.0), Vector2::new(50.0, 0.0))
///     .with_frequency(440.0)
///     .with_volume_emphasis(1.0);
///
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Source position at the epoch.
    pub source_position: Vector2,
    /// Source velocity.
    pub source_velocity: Vector2,
    /// Observer position at the epoch.
    pub observer_position: Vector2,
    /// Observer velocity.
    pub observer_velocity: Vector2,
    /// Emitted frequency in Hz.
    pub source_frequency: f64,
    /// Acoustic power of the source in watts.
    pub source_power: f64,
    /// Speed of sound in the medium, units per second.
    pub medium_speed: f64,
    /// Render scale in pixels (or cells) per distance unit.
    pub zoom: f64,
    /// Exponent applied to the normalized gain.
    pub volume_emphasis: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            source_position: Vector2::new(-200.0, 20.0),
            source_velocity: Vector2::new(100.0, 0.0),
            observer_position: Vector2::new(50.0, 0.0),
            observer_velocity: Vector2::zero(),
            source_frequency: 660.0,
            source_power: 1.0,
            medium_speed: DEFAULT_MEDIUM_SPEED,
            zoom: 1.0,
            volume_emphasis: 6.0,
        }
    }
}

impl SimulationParams {
    /// Creates parameters with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source position and velocity.
    pub fn with_source(mut self, position: Vector2, velocity: Vector2) -> Self {
        self.source_position = position;
        self.source_velocity = velocity;
        self
    }

    /// Sets the observer position and velocity.
    pub fn with_observer(mut self, position: Vector2, velocity: Vector2) -> Self {
        self.observer_position = position;
        self.observer_velocity = velocity;
        self
    }

    /// Sets the emitted frequency.
    pub fn with_frequency(mut self, hz: f64) -> Self {
        self.source_frequency = hz;
        self
    }

    /// Sets the source power.
    pub fn with_power(mut self, watts: f64) -> Self {
        self.source_power = watts;
        self
    }

    /// Sets the speed of sound.
    pub fn with_medium_speed(mut self, speed: f64) -> Self {
        self.medium_speed = speed;
        self
    }

    /// Sets the render scale.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Sets the gain emphasis exponent.
    pub fn with_volume_emphasis(mut self, exponent: f64) -> Self {
        self.volume_emphasis = exponent;
        self
    }

    /// The source as a body.
    pub fn source(&self) -> Body {
        Body::new(self.source_position, self.source_velocity)
    }

    /// The observer as a body.
    pub fn observer(&self) -> Body {
        Body::new(self.observer_position, self.observer_velocity)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParamError`] found, checking vectors first and
    /// then scalars in declaration order.
    pub fn validate(&self) -> Result<(), ParamError> {
        let vectors = [
            ("source_position", self.source_position),
            ("source_velocity", self.source_velocity),
            ("observer_position", self.observer_position),
            ("observer_velocity", self.observer_velocity),
        ];
        for (field, v) in vectors {
            for value in [v.x, v.y] {
                check_finite(field, value)?;
            }
        }

        let positives = [
            ("source_frequency", self.source_frequency),
            ("source_power", self.source_power),
            ("medium_speed", self.medium_speed),
            ("zoom", self.zoom),
        ];
        for (field, value) in positives {
            check_finite(field, value)?;
            if value <= 0.0 {
                return Err(ParamError::NotPositive { field, value });
            }
        }

        validate_emphasis(self.volume_emphasis)
    }
}

pub(crate) fn validate_emphasis(exponent: f64) -> Result<(), ParamError> {
    check_finite("volume_emphasis", exponent)?;
    if exponent < 1.0 {
        return Err(ParamError::EmphasisBelowOne(exponent));
    }
    Ok(())
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ParamError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParamError::NotFinite { field, value })
    }
}
