//! Two-dimensional vector math shared by bodies and the motion model.
//!
//! Positions and velocities are both represented by [`Vector2`]; there is no
//! separate point type because every body position is a displacement from
//! the world origin.

use core::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A vector in the simulation plane.
///
/// `Vector2` is a plain value: every operation returns a new vector, and the
/// only in-place operation ([`AddAssign`]) mutates the receiver you own.
///
/// # Example
///
/// ```rust
/// use doppler::Vector2;
///
/// let a = Vector2::new(3.0, 4.0);
/// assert_eq!(a.magnitude(), 5.0);
///
/// let b = a + Vector2::new(1.0, 1.0) * 2.0;
/// assert_eq!(b, Vector2::new(5.0, 6.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vector2 {
    /// Creates a new vector with the given components.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the zero vector.
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Squared length. Avoids the square root when only comparisons are needed.
    #[inline]
    pub fn magnitude_squared(self) -> f64 {
        self.dot(self)
    }

    /// Returns the magnitude (length) of the vector.
    #[inline]
    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two positions.
    #[inline]
    pub fn distance_to(self, other: Vector2) -> f64 {
        (self - other).magnitude()
    }

    /// Returns this vector multiplied by `factor`.
    #[inline]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// True when both components are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    #[inline]
    fn add(self, other: Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for Vector2 {
    #[inline]
    fn add_assign(&mut self, other: Vector2) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    #[inline]
    fn sub(self, other: Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    #[inline]
    fn neg(self) -> Vector2 {
        Vector2 {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    #[inline]
    fn mul(self, scalar: f64) -> Vector2 {
        self.scale(scalar)
    }
}

impl Mul<Vector2> for f64 {
    type Output = Vector2;

    #[inline]
    fn mul(self, v: Vector2) -> Vector2 {
        v * self
    }
}

impl From<(f64, f64)> for Vector2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}
