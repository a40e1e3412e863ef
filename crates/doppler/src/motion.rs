//! Closed-form relative motion between the source and the observer.
//!
//! With both bodies moving at constant velocity, the separation vector is
//! `Δp + Δv·t` where `Δp = source.position0 − observer.position0` and
//! `Δv = source.velocity − observer.velocity`. Its norm is
//!
//! ```text
//! s(t) = sqrt((Δv·Δv)·t² + 2(Δp·Δv)·t + Δp·Δp)
//! ```
//!
//! and the derivative gives the closing speed directly:
//!
//! ```text
//! −s'(t) = −((Δv·Δv)·t + Δp·Δv) / s(t)
//! ```
//!
//! Setting `s'(t) = 0` yields the time of closest approach
//! `t* = −(Δp·Δv) / (Δv·Δv)`.

use crate::body::Body;
use crate::vector::Vector2;

/// Smallest distance fed into the intensity computation.
///
/// Coincident bodies would otherwise divide by zero in the inverse-square law.
pub const MIN_SEPARATION: f64 = 0.5;

/// Precomputed relative kinematics of a source/observer pair.
///
/// # Example
///
/// ```rust
/// use doppler::{Body, RelativeMotion, Vector2};
///
/// let source = Body::new(Vector2::new(-10.0, 3.0), Vector2::new(1.0, 0.0));
/// let observer = Body::stationary(Vector2::new(0.0, 0.0));
/// let motion = RelativeMotion::between(&source, &observer);
///
/// assert_eq!(motion.time_of_closest_approach(), Some(10.0));
/// assert_eq!(motion.closest_separation(), Some(3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeMotion {
    dp: Vector2,
    dv: Vector2,
    dv_dv: f64,
    dp_dv: f64,
}

impl RelativeMotion {
    /// Derives the relative motion of `source` as seen from `observer`.
    pub fn between(source: &Body, observer: &Body) -> Self {
        let dp = source.position0 - observer.position0;
        let dv = source.velocity - observer.velocity;
        Self {
            dp,
            dv,
            dv_dv: dv.dot(dv),
            dp_dv: dp.dot(dv),
        }
    }

    /// Separation vector (source minus observer) at the epoch.
    pub const fn initial_offset(&self) -> Vector2 {
        self.dp
    }

    /// Velocity of the source relative to the observer.
    pub const fn relative_velocity_vector(&self) -> Vector2 {
        self.dv
    }

    /// Distance between the bodies `t` seconds after the epoch.
    pub fn separation(&self, t: f64) -> f64 {
        (self.dp + self.dv * t).magnitude()
    }

    /// Separation clamped below by [`MIN_SEPARATION`].
    pub fn floored_separation(&self, t: f64) -> f64 {
        self.separation(t).max(MIN_SEPARATION)
    }

    /// Closing speed at time `t`: positive while the distance shrinks.
    ///
    /// This is the exact negated derivative of [`separation`](Self::separation).
    /// At the instant the bodies coincide there is no direction to close
    /// along, and 0 is returned.
    pub fn relative_velocity(&self, t: f64) -> f64 {
        let separation = self.separation(t);
        if separation == 0.0 {
            return 0.0;
        }
        -(self.dv_dv * t + self.dp_dv) / separation
    }

    /// Time at which the separation is smallest.
    ///
    /// Returns `None` when the bodies share a velocity: the distance is then
    /// constant and no single instant of closest approach exists. The result
    /// may be negative when the closest approach happened before the epoch.
    pub fn time_of_closest_approach(&self) -> Option<f64> {
        if self.dv_dv == 0.0 {
            return None;
        }
        let t = -self.dp_dv / self.dv_dv;
        t.is_finite().then_some(t)
    }

    /// Separation at the time of closest approach.
    pub fn closest_separation(&self) -> Option<f64> {
        self.time_of_closest_approach().map(|t| self.separation(t))
    }
}
