//! The state of one simulation run.

use std::time::Duration;

use serde::Serialize;

use crate::acoustics::{doppler_frequency, intensity, loudness_db, DopplerShift};
use crate::body::Body;
use crate::loudness::LoudnessNormalizer;
use crate::motion::RelativeMotion;
use crate::params::{validate_emphasis, ParamError, SimulationParams};

/// Acoustic quantities at one instant of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Acoustics {
    /// Exact distance between the bodies.
    pub separation: f64,
    /// Distance used for intensity (never below the floor).
    pub floored_separation: f64,
    /// Closing speed; positive while approaching.
    pub relative_velocity: f64,
    /// Intensity at the observer, W/m².
    pub intensity: f64,
    /// Intensity level in dB.
    pub loudness_db: f64,
    /// Loudness over maximum loudness (dB ratio).
    pub linear_gain: f64,
    /// Emphasized gain for the audio sink; `None` when not finite.
    pub sink_gain: Option<f64>,
    /// Frequency heard by the observer.
    pub doppler_frequency: f64,
    /// Classification of the shift.
    pub shift: DopplerShift,
}

/// Parameters and derived constants of the active run.
///
/// A state is only ever built whole through [`SimulationState::new`]; the
/// scheduler replaces it on reset rather than editing fields. The emphasis
/// exponent is the exception, since it does not feed any derived value.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    source: Body,
    observer: Body,
    source_frequency: f64,
    source_power: f64,
    medium_speed: f64,
    epoch: Duration,
    volume_emphasis: f64,
    motion: RelativeMotion,
    normalizer: LoudnessNormalizer,
}

impl SimulationState {
    /// Builds the state for a run starting at `epoch` on the host clock.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] when `params` fail validation.
    pub fn new(params: &SimulationParams, epoch: Duration) -> Result<Self, ParamError> {
        params.validate()?;
        let source = params.source();
        let observer = params.observer();
        let motion = RelativeMotion::between(&source, &observer);
        let normalizer = LoudnessNormalizer::new(&motion, params.source_power);
        Ok(Self {
            source,
            observer,
            source_frequency: params.source_frequency,
            source_power: params.source_power,
            medium_speed: params.medium_speed,
            epoch,
            volume_emphasis: params.volume_emphasis,
            motion,
            normalizer,
        })
    }

    /// Evaluates every acoustic quantity `elapsed` seconds after the epoch.
    pub fn evaluate(&self, elapsed: f64) -> Acoustics {
        let separation = self.motion.separation(elapsed);
        let floored_separation = self.motion.floored_separation(elapsed);
        let relative_velocity = self.motion.relative_velocity(elapsed);
        let intensity = intensity(self.source_power, floored_separation);
        let loudness_db = loudness_db(intensity);
        Acoustics {
            separation,
            floored_separation,
            relative_velocity,
            intensity,
            loudness_db,
            linear_gain: self.normalizer.linear_gain(loudness_db),
            sink_gain: self.normalizer.sink_gain(loudness_db, self.volume_emphasis),
            doppler_frequency: doppler_frequency(
                self.source_frequency,
                self.medium_speed,
                relative_velocity,
            ),
            shift: DopplerShift::classify(self.medium_speed, relative_velocity),
        }
    }

    /// Seconds elapsed between the epoch and `now`, never negative.
    pub fn elapsed_since_epoch(&self, now: Duration) -> f64 {
        now.saturating_sub(self.epoch).as_secs_f64()
    }

    /// Changes the emphasis exponent without restarting the run.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] for a non-finite exponent or one below 1.
    pub fn set_volume_emphasis(&mut self, exponent: f64) -> Result<(), ParamError> {
        validate_emphasis(exponent)?;
        self.volume_emphasis = exponent;
        Ok(())
    }

    /// The sound source.
    pub const fn source(&self) -> &Body {
        &self.source
    }

    /// The listener.
    pub const fn observer(&self) -> &Body {
        &self.observer
    }

    /// Relative kinematics of the pair.
    pub const fn motion(&self) -> &RelativeMotion {
        &self.motion
    }

    /// Emitted frequency.
    pub const fn source_frequency(&self) -> f64 {
        self.source_frequency
    }

    /// Source power.
    pub const fn source_power(&self) -> f64 {
        self.source_power
    }

    /// Speed of sound.
    pub const fn medium_speed(&self) -> f64 {
        self.medium_speed
    }

    /// Host clock reading at which the run started.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }

    /// Current emphasis exponent.
    pub const fn volume_emphasis(&self) -> f64 {
        self.volume_emphasis
    }

    /// Loudness at closest approach, the gain denominator.
    pub const fn max_loudness_db(&self) -> f64 {
        self.normalizer.max_loudness_db()
    }
}
