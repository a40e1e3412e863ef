//! Constant-velocity bodies.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::vector::Vector2;

/// A point moving with constant velocity.
///
/// Unlike a frame-stepped projectile, a body is described by where it was at
/// the simulation epoch (`t = 0`) and its velocity, so its position at any
/// time is available in closed form without accumulating error.
///
/// # Example
///
/// ```rust
/// use doppler::{Body, Vector2};
///
/// let body = Body::new(Vector2::new(-200.0, 20.0), Vector2::new(100.0, 0.0));
/// assert_eq!(body.position_at(2.5), Vector2::new(50.0, 20.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Position at the simulation epoch.
    pub position0: Vector2,
    /// Constant velocity in distance units per second.
    pub velocity: Vector2,
}

impl Body {
    /// Creates a body from its epoch position and velocity.
    #[inline]
    pub const fn new(position0: Vector2, velocity: Vector2) -> Self {
        Self {
            position0,
            velocity,
        }
    }

    /// Creates a body at rest.
    #[inline]
    pub const fn stationary(position0: Vector2) -> Self {
        Self {
            position0,
            velocity: Vector2::zero(),
        }
    }

    /// Position `t` seconds after the epoch.
    #[inline]
    pub fn position_at(&self, t: f64) -> Vector2 {
        self.position0 + self.velocity * t
    }

    /// Speed (velocity magnitude).
    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }
}

/// Which of the two simulated bodies a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyRole {
    /// The body emitting the tone.
    Source,
    /// The body hearing the tone.
    Observer,
}

impl BodyRole {
    /// Returns the lowercase name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Observer => "observer",
        }
    }
}

impl fmt::Display for BodyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at_epoch_is_position0() {
        let body = Body::new(Vector2::new(1.0, 2.0), Vector2::new(3.0, 4.0));
        assert_eq!(body.position_at(0.0), Vector2::new(1.0, 2.0));
    }

    #[test]
    fn test_position_is_linear_in_time() {
        let body = Body::new(Vector2::new(0.0, 0.0), Vector2::new(60.0, -30.0));
        assert_eq!(body.position_at(1.0), Vector2::new(60.0, -30.0));
        assert_eq!(body.position_at(0.5), Vector2::new(30.0, -15.0));
        assert_eq!(body.position_at(-1.0), Vector2::new(-60.0, 30.0));
    }

    #[test]
    fn test_stationary_body_never_moves() {
        let body = Body::stationary(Vector2::new(50.0, 0.0));
        assert_eq!(body.position_at(1000.0), Vector2::new(50.0, 0.0));
        assert_eq!(body.speed(), 0.0);
    }

    #[test]
    fn test_role_names() {
        assert_eq!(BodyRole::Source.to_string(), "source");
        assert_eq!(BodyRole::Observer.as_str(), "observer");
    }
}
