//! Mapping loudness to an audio gain.
//!
//! The gain is the ratio of the current loudness to the loudest moment of the
//! run, both in decibels, raised to an emphasis exponent. Dividing two dB
//! values is an approximation; a proper conversion would be `10^(dB/20)`.

use crate::acoustics::{intensity, loudness_db};
use crate::motion::{RelativeMotion, MIN_SEPARATION};

/// Normalizes loudness against the loudest attainable value of a run.
///
/// Build one per reset: the maximum depends only on the two bodies and the
/// source power, so it goes stale whenever any of those change.
///
/// # Example
///
/// ```rust
/// use doppler::{Body, LoudnessNormalizer, RelativeMotion, Vector2, intensity, loudness_db};
///
/// let source = Body::new(Vector2::new(-200.0, 20.0), Vector2::new(100.0, 0.0));
/// let observer = Body::stationary(Vector2::new(50.0, 0.0));
/// let motion = RelativeMotion::between(&source, &observer);
/// let normalizer = LoudnessNormalizer::new(&motion, 1.0);
///
/// // At closest approach (20 units away) the gain is exactly one.
/// let peak = loudness_db(intensity(1.0, 20.0));
/// assert_eq!(normalizer.linear_gain(peak), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessNormalizer {
    max_loudness_db: f64,
}

impl LoudnessNormalizer {
    /// Computes the maximum loudness from the closest approach of `motion`.
    ///
    /// When the bodies share a velocity there is no closest approach; the
    /// floor distance [`MIN_SEPARATION`] is used instead.
    pub fn new(motion: &RelativeMotion, power: f64) -> Self {
        let closest = motion
            .closest_separation()
            .map_or(MIN_SEPARATION, |d| d.max(MIN_SEPARATION));
        Self {
            max_loudness_db: loudness_db(intensity(power, closest)),
        }
    }

    /// Builds a normalizer from an already known maximum.
    pub const fn from_max_loudness_db(max_loudness_db: f64) -> Self {
        Self { max_loudness_db }
    }

    /// Loudness at the loudest moment of the run, in dB.
    pub const fn max_loudness_db(&self) -> f64 {
        self.max_loudness_db
    }

    /// Current loudness as a fraction of the maximum (dB over dB).
    pub fn linear_gain(&self, loudness_db: f64) -> f64 {
        loudness_db / self.max_loudness_db
    }

    /// Gain to hand to the audio sink, or `None` when it is not finite.
    pub fn sink_gain(&self, loudness_db: f64, emphasis: f64) -> Option<f64> {
        let gain = emphasize(self.linear_gain(loudness_db), emphasis);
        gain.is_finite().then_some(gain)
    }
}

/// Raises `gain` to the perceptual emphasis `exponent`.
///
/// An exponent of exactly 1 returns `gain` untouched.
#[inline]
pub fn emphasize(gain: f64, exponent: f64) -> f64 {
    if exponent == 1.0 {
        return gain;
    }
    gain.powf(exponent)
}
