#![forbid(unsafe_code)]
// Allow these clippy lints for physics/math code readability
#![allow(clippy::must_use_candidate)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::use_self)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::module_name_repetitions)]

//! # Doppler
//!
//! A kinematics-acoustics engine for one moving sound source and one moving
//! observer in a 2D plane.
//!
//! Doppler provides:
//! - **Motion**: closed-form separation and closing speed between two
//!   constant-velocity bodies, including the time of closest approach
//! - **Acoustics**: inverse-square intensity, decibel loudness and the
//!   Doppler-shifted frequency heard by the observer
//! - **Loudness normalization**: a gain relative to the loudest attainable
//!   moment of the run
//! - **Scheduler**: a `tick(now)` driven loop that feeds audio, display and
//!   render sinks, with frame-time smoothing for drawn motion
//!
//! ## Engine Example
//!
//! ```rust
//! use doppler::{Body, RelativeMotion, Vector2, doppler_frequency};
//!
//! let source = Body::new(Vector2::new(-200.0, 20.0), Vector2::new(100.0, 0.0));
//! let observer = Body::stationary(Vector2::new(50.0, 0.0));
//! let motion = RelativeMotion::between(&source, &observer);
//!
//! // One second in, the source is still approaching.
//! let closing = motion.relative_velocity(1.0);
//! assert!(closing > 0.0);
//! assert!(doppler_frequency(660.0, 340.0, closing) > 660.0);
//! ```
//!
//! ## Scheduler Example
//!
//! ```rust
//! use std::time::Duration;
//! use doppler::{NullSink, Scheduler, SchedulerOptions, SimulationParams};
//!
//! let mut scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default())?;
//! let mut sink = NullSink;
//!
//! // The host calls tick at its own cadence with a monotonic clock.
//! for frame in 0..60u64 {
//!     let now = Duration::from_millis(frame * 16);
//!     scheduler.tick(now, &mut sink);
//! }
//!
//! assert!(scheduler.state().is_some());
//! # Ok::<(), doppler::ParamError>(())
//! ```
//!
//! ## Approximations
//!
//! The gain sent to the audio sink is the ratio of the current loudness to
//! the maximum loudness, both in decibels, raised to an emphasis exponent.
//! This is not a decibel-to-amplitude conversion, and a run whose loudness
//! drops below 0 dB produces gains the scheduler has to skip.

mod acoustics;
mod body;
mod loudness;
mod motion;
mod params;
mod scheduler;
mod sink;
mod state;
mod timing;
mod tone;
mod vector;

pub use acoustics::{
    doppler_frequency, intensity, loudness_db, DopplerShift, DEFAULT_MEDIUM_SPEED,
    REFERENCE_INTENSITY,
};
pub use body::{Body, BodyRole};
pub use loudness::{emphasize, LoudnessNormalizer};
pub use motion::{RelativeMotion, MIN_SEPARATION};
pub use params::{ParamError, SimulationParams};
pub use scheduler::{DiscStyle, Frame, LoopState, Scheduler, SchedulerOptions, Sinks};
pub use sink::{AudioSink, DisplaySink, NullSink, Readouts, RenderSink, Rgb, Viewport};
pub use state::{Acoustics, SimulationState};
pub use timing::{fps, FrameTimingWindow, DEFAULT_CAPACITY};
pub use tone::ToneGenerator;
pub use vector::Vector2;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::body::{Body, BodyRole};
    pub use crate::motion::RelativeMotion;
    pub use crate::params::SimulationParams;
    pub use crate::scheduler::{Frame, Scheduler, SchedulerOptions};
    pub use crate::sink::{AudioSink, DisplaySink, RenderSink};
    pub use crate::vector::Vector2;
}
