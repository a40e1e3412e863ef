//! Live audio output.
//!
//! The scheduler writes frequency and gain into a [`SharedTone`] from the UI
//! thread while the audio device pulls samples from it on its own callback
//! thread. With the `audio` feature the device is the default `cpal` output;
//! without it [`Speaker::open`] always fails and the app stays silent.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doppler::{AudioSink, ToneGenerator};

use crate::error::{AppError, Result};

/// A [`ToneGenerator`] shared between the UI thread and an audio callback.
#[derive(Debug, Clone)]
pub struct SharedTone {
    inner: Arc<Mutex<ToneGenerator>>,
}

impl SharedTone {
    /// Creates a silent shared oscillator at `sample_rate` Hz.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ToneGenerator::new(sample_rate))),
        }
    }

    // A panic on the other side leaves the generator usable.
    fn lock(&self) -> MutexGuard<'_, ToneGenerator> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current frequency of the oscillator.
    pub fn frequency(&self) -> f64 {
        self.lock().frequency()
    }

    /// Gain the oscillator is ramping toward.
    pub fn gain(&self) -> f64 {
        self.lock().gain()
    }

    /// Fills an interleaved buffer of `channels` channels with the same mono
    /// signal on every channel.
    pub fn fill_interleaved(&self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = out.len() / channels;
        self.lock().render(&mut out[..frames]);
        // Spread back to front so no mono sample is overwritten before use.
        for i in (0..frames).rev() {
            let sample = out[i];
            out[i * channels..(i + 1) * channels].fill(sample);
        }
        out[frames * channels..].fill(0.0);
    }
}

impl AudioSink for SharedTone {
    fn set_frequency(&mut self, hz: f64) {
        self.lock().set_frequency(hz);
    }

    fn set_gain(&mut self, gain: f64) {
        self.lock().set_gain(gain);
    }
}

/// An open output device playing a [`SharedTone`].
///
/// Playback stops when the speaker is dropped.
pub struct Speaker {
    tone: SharedTone,
    sample_rate: u32,
    channels: u16,
    #[cfg(feature = "audio")]
    _stream: cpal::Stream,
}

impl fmt::Debug for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Speaker")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl Speaker {
    /// Opens the default output device and starts playing silence.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Audio`] if there is no usable output device or
    /// the stream cannot be started.
    #[cfg(feature = "audio")]
    pub fn open() -> Result<Self> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
        use tracing::{error, info};

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AppError::Audio("no default output device".to_string()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| AppError::Audio(format!("failed to query output config: {e}")))?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(AppError::Audio(format!(
                "unsupported sample format {:?}",
                supported.sample_format()
            )));
        }

        let config: cpal::StreamConfig = supported.config();
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;
        let tone = SharedTone::new(sample_rate);

        let callback_tone = tone.clone();
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback_tone.fill_interleaved(data, usize::from(channels));
                },
                move |err| {
                    error!(%err, "audio stream error");
                },
                None,
            )
            .map_err(|e| AppError::Audio(format!("failed to build output stream: {e}")))?;
        stream
            .play()
            .map_err(|e| AppError::Audio(format!("failed to start output stream: {e}")))?;

        let name = device.name().unwrap_or_else(|_| "unknown".to_string());
        info!(device = %name, sample_rate, channels, "audio output started");

        Ok(Self {
            tone,
            sample_rate,
            channels,
            _stream: stream,
        })
    }

    /// Always fails: this build has no audio backend.
    ///
    /// # Errors
    ///
    /// Always returns [`AppError::Audio`].
    #[cfg(not(feature = "audio"))]
    pub fn open() -> Result<Self> {
        Err(AppError::Audio(
            "audio output not enabled, rebuild with --features audio".to_string(),
        ))
    }

    /// Handle to the tone the device plays.
    pub fn tone(&self) -> SharedTone {
        self.tone.clone()
    }

    /// Device sample rate.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Device channel count.
    pub const fn channels(&self) -> u16 {
        self.channels
    }
}
