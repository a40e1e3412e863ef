//! Inverse-square intensity, decibel loudness and the Doppler formula.

use core::f64::consts::PI;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Threshold of hearing in W/m², the 0 dB reference.
pub const REFERENCE_INTENSITY: f64 = 1e-12;

/// Speed of sound in air, in distance units per second.
pub const DEFAULT_MEDIUM_SPEED: f64 = 340.0;

/// Intensity of a point source of `power` watts at `distance`.
///
/// `distance` is expected to be floored already (see
/// [`MIN_SEPARATION`](crate::MIN_SEPARATION)); a zero distance yields infinity.
///
/// # Example
///
/// ```rust
/// use doppler::intensity;
///
/// let near = intensity(1.0, 1.0);
/// let far = intensity(1.0, 2.0);
/// assert!((near / far - 4.0).abs() < 1e-12);
/// ```
#[inline]
pub fn intensity(power: f64, distance: f64) -> f64 {
    power / (4.0 * PI * distance * distance)
}

/// Sound intensity level in decibels relative to [`REFERENCE_INTENSITY`].
#[inline]
pub fn loudness_db(intensity: f64) -> f64 {
    10.0 * (intensity / REFERENCE_INTENSITY).log10()
}

/// Frequency heard by the observer.
///
/// `relative_velocity` is the closing speed: positive while source and
/// observer approach each other. The formula
/// `medium_speed · f / (medium_speed − relative_velocity)` has a pole at
/// `relative_velocity == medium_speed`; there the result is `0.0` instead of
/// an infinity. Beyond the pole the raw (negative) value is returned.
///
/// # Example
///
/// ```rust
/// use doppler::doppler_frequency;
///
/// assert_eq!(doppler_frequency(660.0, 340.0, 0.0), 660.0);
/// assert!(doppler_frequency(660.0, 340.0, 30.0) > 660.0);
/// assert!(doppler_frequency(660.0, 340.0, -30.0) < 660.0);
/// assert_eq!(doppler_frequency(660.0, 340.0, 340.0), 0.0);
/// ```
#[inline]
pub fn doppler_frequency(source_frequency: f64, medium_speed: f64, relative_velocity: f64) -> f64 {
    let shifted = medium_speed * source_frequency / (medium_speed - relative_velocity);
    if shifted.is_finite() { shifted } else { 0.0 }
}

/// How the observed frequency relates to the emitted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DopplerShift {
    /// Bodies are closing; pitch is raised.
    Approaching,
    /// Bodies are separating; pitch is lowered.
    Receding,
    /// No closing speed; pitch is unchanged.
    Unshifted,
    /// Closing speed equals the medium speed; frequency fell back to 0.
    Singular,
    /// Closing speed exceeds the medium speed; the frequency is a negative
    /// artifact of the formula.
    Supersonic,
}

impl DopplerShift {
    /// Classifies a closing speed against the medium speed.
    pub fn classify(medium_speed: f64, relative_velocity: f64) -> Self {
        if relative_velocity == medium_speed {
            Self::Singular
        } else if relative_velocity > medium_speed {
            Self::Supersonic
        } else if relative_velocity > 0.0 {
            Self::Approaching
        } else if relative_velocity < 0.0 {
            Self::Receding
        } else {
            Self::Unshifted
        }
    }

    /// True for the two cases where the frequency is not physically meaningful.
    pub const fn is_degenerate(self) -> bool {
        matches!(self, Self::Singular | Self::Supersonic)
    }

    /// Returns the snake_case name used in serialized output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approaching => "approaching",
            Self::Receding => "receding",
            Self::Unshifted => "unshifted",
            Self::Singular => "singular",
            Self::Supersonic => "supersonic",
        }
    }
}

impl fmt::Display for DopplerShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
