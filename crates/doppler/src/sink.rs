//! Output seams between the engine and its host.
//!
//! The scheduler pushes every tick into three sinks: an oscillator, a set of
//! numeric readouts and a drawing surface. Hosts implement whichever they
//! have; [`NullSink`] stands in for the rest.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::vector::Vector2;

/// Receives the oscillator settings for each tick.
pub trait AudioSink {
    /// Sets the oscillator frequency in Hz.
    fn set_frequency(&mut self, hz: f64);

    /// Sets the output gain. Nominally `0..=1` but not clamped.
    fn set_gain(&mut self, gain: f64);
}

/// Receives the numeric readouts for each tick.
pub trait DisplaySink {
    /// Shows the latest readouts.
    fn show(&mut self, readouts: &Readouts);
}

/// A surface the two bodies are drawn on, in screen coordinates.
pub trait RenderSink {
    /// Width and height of the surface in pixels.
    fn surface_size(&self) -> (f64, f64);

    /// Erases the previous frame.
    fn clear(&mut self);

    /// Draws a filled disc centred at `(x, y)`.
    fn draw_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgb);
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb` or `rrggbb`.
    ///
    /// ```rust
    /// use doppler::Rgb;
    ///
    /// assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb(255, 128, 0)));
    /// assert_eq!(Rgb::from_hex("nope"), None);
    /// ```
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Maps world coordinates onto a render surface.
///
/// The world origin sits at the surface centre and world `y` grows upward,
/// so a world point `(x, y)` lands at `(zoom·x + w/2, h/2 − zoom·y)`.
///
/// # Example
///
/// ```rust
/// use doppler::{Vector2, Viewport};
///
/// let viewport = Viewport::new(200.0, 100.0, 2.0);
/// assert_eq!(viewport.to_screen(Vector2::new(10.0, 5.0)), (120.0, 40.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Surface width.
    pub width: f64,
    /// Surface height.
    pub height: f64,
    /// Pixels per world unit.
    pub zoom: f64,
}

impl Viewport {
    /// Creates a viewport.
    pub const fn new(width: f64, height: f64, zoom: f64) -> Self {
        Self {
            width,
            height,
            zoom,
        }
    }

    /// Screen position of the world origin.
    pub fn origin(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Converts a world position into surface coordinates.
    pub fn to_screen(&self, p: Vector2) -> (f64, f64) {
        let (ox, oy) = self.origin();
        (self.zoom * p.x + ox, oy - self.zoom * p.y)
    }
}

/// Numeric readouts shown each tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Readouts {
    /// Separation between source and observer.
    pub distance: f64,
    /// Closing speed.
    pub relative_velocity: f64,
    /// Intensity at the observer.
    pub intensity: f64,
    /// Intensity level in dB.
    pub loudness_db: f64,
    /// Observed frequency.
    pub doppler_frequency: f64,
    /// Smoothed frame rate.
    pub fps: f64,
}

impl Readouts {
    /// Labels in display order.
    pub const LABELS: [&'static str; 6] = [
        "distance",
        "relative velocity",
        "intensity",
        "loudness (dB)",
        "doppler frequency",
        "fps",
    ];

    /// Label/value pairs with every value at two decimals.
    ///
    /// ```rust
    /// use doppler::Readouts;
    ///
    /// let readouts = Readouts { distance: 250.797, ..Readouts::default() };
    /// assert_eq!(readouts.formatted()[0], ("distance", "250.80".to_string()));
    /// ```
    pub fn formatted(&self) -> [(&'static str, String); 6] {
        let values = [
            self.distance,
            self.relative_velocity,
            self.intensity,
            self.loudness_db,
            self.doppler_frequency,
            self.fps,
        ];
        core::array::from_fn(|i| (Self::LABELS[i], format!("{:.2}", values[i])))
    }
}

impl fmt::Display for Readouts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (label, value) in self.formatted() {
            if !first {
                f.write_str("  ")?;
            }
            first = false;
            write!(f, "{label}: {value}")?;
        }
        Ok(())
    }
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn set_frequency(&mut self, _hz: f64) {}

    fn set_gain(&mut self, _gain: f64) {}
}

impl DisplaySink for NullSink {
    fn show(&mut self, _readouts: &Readouts) {}
}

impl RenderSink for NullSink {
    fn surface_size(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    fn clear(&mut self) {}

    fn draw_disc(&mut self, _x: f64, _y: f64, _radius: f64, _color: Rgb) {}
}
