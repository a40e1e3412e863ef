//! Frame timing helpers.

use std::collections::VecDeque;

/// Number of frame deltas averaged by default.
pub const DEFAULT_CAPACITY: usize = 30;

/// Returns a time delta for a given number of frames per second.
///
/// # Example
///
/// ```rust
/// use doppler::fps;
///
/// assert_eq!(fps(50), 0.02);
/// ```
#[inline]
pub fn fps(n: u32) -> f64 {
    1.0 / n as f64
}

/// Moving average over the most recent frame deltas.
///
/// Deltas are stored most-recent-first; once the window is full the oldest
/// delta is evicted for each new one. The smoothed delta only advances drawn
/// positions. Analytic quantities are computed from elapsed time instead so
/// render jitter never reaches the audio.
///
/// # Example
///
/// ```rust
/// use doppler::FrameTimingWindow;
///
/// let mut window = FrameTimingWindow::with_capacity(2);
/// window.push(0.010);
/// window.push(0.020);
/// window.push(0.030);
///
/// assert_eq!(window.len(), 2);
/// assert!((window.smoothed_dt() - 0.025).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTimingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl FrameTimingWindow {
    /// Creates an empty window holding [`DEFAULT_CAPACITY`] deltas.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty window holding at most `capacity` deltas (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records the newest frame delta, evicting the oldest beyond capacity.
    pub fn push(&mut self, dt: f64) {
        self.samples.push_front(dt);
        self.samples.truncate(self.capacity);
    }

    /// Arithmetic mean of the stored deltas, or 0 when empty.
    pub fn smoothed_dt(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Frame rate implied by the smoothed delta, or 0 when it is not positive.
    pub fn frames_per_second(&self) -> f64 {
        let dt = self.smoothed_dt();
        if dt > 0.0 { 1.0 / dt } else { 0.0 }
    }

    /// Deltas from most recent to oldest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Number of stored deltas.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no delta has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of stored deltas.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forgets every stored delta.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for FrameTimingWindow {
    fn default() -> Self {
        Self::new()
    }
}
