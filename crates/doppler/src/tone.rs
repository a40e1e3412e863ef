//! A software sine oscillator usable as the audio sink.

use core::f64::consts::TAU;

use crate::sink::AudioSink;

/// Phase-continuous sine oscillator.
///
/// Frequency changes take effect at the next sample without resetting the
/// phase, and gain changes are ramped across the next rendered buffer so
/// per-frame updates do not click.
///
/// # Example
///
/// ```rust
/// use doppler::{AudioSink, ToneGenerator};
///
/// let mut tone = ToneGenerator::new(48_000);
/// tone.set_frequency(440.0);
/// tone.set_gain(0.5);
///
/// let mut buffer = vec![0.0f32; 480];
/// tone.render(&mut buffer);
/// assert!(buffer.iter().all(|s| s.abs() <= 0.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ToneGenerator {
    sample_rate: u32,
    frequency: f64,
    gain: f64,
    target_gain: f64,
    phase: f64,
}

impl ToneGenerator {
    /// Creates a silent oscillator running at `sample_rate` Hz (minimum 1).
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frequency: 0.0,
            gain: 0.0,
            target_gain: 0.0,
            phase: 0.0,
        }
    }

    /// Output sample rate.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current oscillator frequency.
    pub const fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Gain the oscillator is ramping toward.
    pub const fn gain(&self) -> f64 {
        self.target_gain
    }

    /// Number of samples covering `seconds` of audio.
    pub fn samples_for(&self, seconds: f64) -> usize {
        if seconds <= 0.0 || !seconds.is_finite() {
            return 0;
        }
        (seconds * f64::from(self.sample_rate)).round() as usize
    }

    /// Fills `out` with the next samples.
    pub fn render(&mut self, out: &mut [f32]) {
        if out.is_empty() {
            return;
        }
        let step = TAU * self.frequency / f64::from(self.sample_rate);
        let start = self.gain;
        let ramp = (self.target_gain - start) / out.len() as f64;
        for (i, sample) in out.iter_mut().enumerate() {
            let gain = start + ramp * (i + 1) as f64;
            *sample = (gain * self.phase.sin()) as f32;
            self.phase = (self.phase + step).rem_euclid(TAU);
        }
        self.gain = self.target_gain;
    }

    /// Renders `seconds` of audio into a new buffer.
    pub fn render_seconds(&mut self, seconds: f64) -> Vec<f32> {
        let mut buffer = vec![0.0; self.samples_for(seconds)];
        self.render(&mut buffer);
        buffer
    }
}

impl AudioSink for ToneGenerator {
    fn set_frequency(&mut self, hz: f64) {
        if hz.is_finite() {
            self.frequency = hz;
        }
    }

    fn set_gain(&mut self, gain: f64) {
        if gain.is_finite() {
            self.target_gain = gain;
        }
    }
}
