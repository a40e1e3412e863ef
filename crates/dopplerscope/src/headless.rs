//! Headless driver: a synthetic clock instead of a terminal.
//!
//! Frame `k` is ticked at `k / rate` seconds, from zero through `duration`
//! inclusive. Each frame becomes one line of text or JSON on the output,
//! and the tone can be exported alongside as raw PCM.

use std::io::{self, Write};
use std::time::Duration;

use doppler::{
    AudioSink, DisplaySink, Frame, Readouts, RenderSink, Rgb, Scheduler, ToneGenerator,
};
use tracing::{debug, info};

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::pcm::PcmWriter;

/// Clock and output settings of a headless run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessOptions {
    /// Simulated seconds to run.
    pub duration: f64,
    /// Frames per simulated second.
    pub rate: f64,
    /// Line format.
    pub format: OutputFormat,
    /// Sample rate of the tone.
    pub sample_rate: u32,
}

impl HeadlessOptions {
    /// Takes the clock settings from the CLI, defaulting the rate to the
    /// display fps.
    pub fn from_cli(cli: &Cli, config: &Config) -> Self {
        Self {
            duration: cli.duration,
            rate: cli.rate.unwrap_or_else(|| f64::from(config.display.fps)),
            format: cli.format,
            sample_rate: cli.sample_rate,
        }
    }

    /// Checks the clock settings.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidRun`] for a negative or non-finite
    /// duration or a rate that is not positive.
    pub fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(AppError::InvalidRun(format!(
                "duration must be a non-negative number of seconds, got {}",
                self.duration
            )));
        }
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(AppError::InvalidRun(format!(
                "rate must be a positive number of frames per second, got {}",
                self.rate
            )));
        }
        if Duration::try_from_secs_f64(self.duration).is_err()
            || (self.duration * self.rate).floor() >= u64::MAX as f64
        {
            return Err(AppError::InvalidRun(format!(
                "{} seconds at {} Hz is too many frames",
                self.duration, self.rate
            )));
        }
        Ok(())
    }

    /// Number of frames the run ticks.
    pub fn frame_count(&self) -> u64 {
        ((self.duration * self.rate).floor() as u64).saturating_add(1)
    }

    /// Clock reading for frame `k`.
    pub fn frame_time(&self, k: u64) -> Duration {
        Duration::from_secs_f64(k as f64 / self.rate)
    }
}

/// What a headless run produced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// Frames ticked.
    pub frames: u64,
    /// Frames whose gain was not written to the tone.
    pub skipped_gains: u64,
    /// Lowest observed frequency.
    pub min_frequency: f64,
    /// Highest observed frequency.
    pub max_frequency: f64,
    /// Closest separation seen on a frame.
    pub min_distance: f64,
}

impl Summary {
    fn record(&mut self, frame: &Frame) {
        let a = &frame.acoustics;
        if self.frames == 0 {
            self.min_frequency = a.doppler_frequency;
            self.max_frequency = a.doppler_frequency;
            self.min_distance = a.separation;
        } else {
            self.min_frequency = self.min_frequency.min(a.doppler_frequency);
            self.max_frequency = self.max_frequency.max(a.doppler_frequency);
            self.min_distance = self.min_distance.min(a.separation);
        }
        self.frames += 1;
        if !frame.gain_applied {
            self.skipped_gains += 1;
        }
    }
}

/// Headless sinks: only the tone is kept.
#[derive(Debug)]
struct ToneOnly(ToneGenerator);

impl AudioSink for ToneOnly {
    fn set_frequency(&mut self, hz: f64) {
        self.0.set_frequency(hz);
    }

    fn set_gain(&mut self, gain: f64) {
        self.0.set_gain(gain);
    }
}

impl DisplaySink for ToneOnly {
    fn show(&mut self, _readouts: &Readouts) {}
}

impl RenderSink for ToneOnly {
    fn surface_size(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    fn clear(&mut self) {}

    fn draw_disc(&mut self, _x: f64, _y: f64, _radius: f64, _color: Rgb) {}
}

/// Formats one frame as a text line (without the newline).
pub fn text_line(frame: &Frame) -> String {
    format!(
        "t={:.3}  {}  shift: {}",
        frame.elapsed,
        frame.readouts(),
        frame.acoustics.shift
    )
}

fn write_frame<W: Write>(out: &mut W, frame: &Frame, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", text_line(frame))?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, frame)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Runs the simulation on the synthetic clock.
///
/// Stops early when single-step mode halts the scheduler after the first
/// frame.
///
/// # Errors
///
/// Returns an error for invalid clock settings, a rejected configuration,
/// or a failed write.
pub fn run<W: Write, P: Write>(
    config: &Config,
    options: &HeadlessOptions,
    out: &mut W,
    mut pcm: Option<&mut PcmWriter<P>>,
) -> Result<Summary> {
    options.validate()?;
    let mut scheduler = Scheduler::new(config.simulation, config.scheduler_options())?;
    let mut sinks = ToneOnly(ToneGenerator::new(options.sample_rate));
    let mut summary = Summary::default();

    info!(
        frames = options.frame_count(),
        rate = options.rate,
        duration = options.duration,
        "starting headless run"
    );
    for k in 0..options.frame_count() {
        let now = options.frame_time(k);
        if let Some(pcm) = pcm.as_deref_mut() {
            pcm.render_until(&mut sinks.0, now.as_secs_f64())?;
        }
        let Some(frame) = scheduler.tick(now, &mut sinks) else {
            break;
        };
        write_frame(out, &frame, options.format)?;
        summary.record(&frame);
        if !scheduler.should_continue() {
            debug!(frame = frame.index, "halted, ending headless run");
            break;
        }
    }
    out.flush()?;

    info!(
        frames = summary.frames,
        skipped_gains = summary.skipped_gains,
        min_frequency = summary.min_frequency,
        max_frequency = summary.max_frequency,
        "headless run finished"
    );
    Ok(summary)
}

/// Runs headless with stdout as the output and the CLI's PCM path.
///
/// # Errors
///
/// See [`run`]; PCM file errors name the file.
pub fn run_cli(cli: &Cli, config: &Config) -> Result<Summary> {
    let options = HeadlessOptions::from_cli(cli, config);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let Some(path) = cli.pcm_out.as_deref() else {
        return run::<_, io::Sink>(config, &options, &mut out, None);
    };
    let mut pcm = PcmWriter::create(path).map_err(|e| AppError::output(path, e))?;
    let summary = run(config, &options, &mut out, Some(&mut pcm))?;
    let samples = pcm.samples_written();
    pcm.finish().map_err(|e| AppError::output(path, e))?;
    info!(path = %path.display(), samples, "wrote pcm");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppler::SimulationParams;

    fn options(duration: f64, rate: f64, format: OutputFormat) -> HeadlessOptions {
        HeadlessOptions {
            duration,
            rate,
            format,
            sample_rate: 8_000,
        }
    }

    fn run_to_string(config: &Config, options: &HeadlessOptions) -> (Summary, String) {
        let mut out = Vec::new();
        let summary = run::<_, io::Sink>(config, options, &mut out, None).unwrap();
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn headless_frame_count_includes_both_ends() {
        assert_eq!(options(5.0, 10.0, OutputFormat::Text).frame_count(), 51);
        assert_eq!(options(0.0, 10.0, OutputFormat::Text).frame_count(), 1);
        assert_eq!(
            options(1.0, 4.0, OutputFormat::Text).frame_time(3),
            Duration::from_millis(750)
        );
    }

    #[test]
    fn headless_rejects_bad_clock() {
        assert!(options(-1.0, 10.0, OutputFormat::Text).validate().is_err());
        assert!(options(1.0, 0.0, OutputFormat::Text).validate().is_err());
        assert!(options(f64::NAN, 10.0, OutputFormat::Text).validate().is_err());
    }

    #[test]
    fn headless_rejects_runs_too_long_to_count() {
        let huge = options(1e30, 60.0, OutputFormat::Text);
        assert!(matches!(huge.validate(), Err(AppError::InvalidRun(_))));
        assert_eq!(huge.frame_count(), u64::MAX);

        // Fits in a frame count but not in a clock reading.
        let slow = options(1e25, 1e-10, OutputFormat::Text);
        assert!(matches!(slow.validate(), Err(AppError::InvalidRun(_))));

        assert!(options(3600.0, 240.0, OutputFormat::Text).validate().is_ok());
    }

    #[test]
    fn headless_text_lines() {
        let (summary, text) = run_to_string(&Config::default(), &options(5.0, 10.0, OutputFormat::Text));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(summary.frames, 51);
        assert_eq!(lines.len(), 51);
        assert!(lines[0].starts_with("t=0.000  distance: 250.80"));
        assert!(lines[0].ends_with("shift: approaching"));
        assert!(lines[50].ends_with("shift: receding"));
    }

    #[test]
    fn headless_json_lines() {
        let (_, text) = run_to_string(&Config::default(), &options(1.0, 2.0, OutputFormat::Json));
        let frames: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0]["index"], 1);
        assert_eq!(frames[2]["elapsed"], 1.0);
        assert_eq!(frames[0]["shift"], "approaching");
        assert!(frames[0]["doppler_frequency"].as_f64().unwrap() > 660.0);
    }

    #[test]
    fn headless_summary_spans_the_pass() {
        let (summary, _) = run_to_string(&Config::default(), &options(5.0, 20.0, OutputFormat::Text));
        assert!(summary.max_frequency > 660.0);
        assert!(summary.min_frequency < 660.0);
        assert!((summary.min_distance - 20.0).abs() < 1e-9);
        assert_eq!(summary.skipped_gains, 0);
    }

    #[test]
    fn headless_single_step_stops_after_one_frame() {
        let mut config = Config::default();
        config.display.single_step = true;
        let (summary, text) = run_to_string(&config, &options(5.0, 10.0, OutputFormat::Text));
        assert_eq!(summary.frames, 1);
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn headless_exports_pcm() {
        let config = Config {
            simulation: SimulationParams::default().with_volume_emphasis(1.0),
            ..Config::default()
        };
        let mut pcm = PcmWriter::new(Vec::new());
        let mut out = Vec::new();
        run(&config, &options(1.0, 10.0, OutputFormat::Text), &mut out, Some(&mut pcm)).unwrap();
        assert_eq!(pcm.samples_written(), 8_000);

        let bytes = pcm.finish().unwrap();
        let peak = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]).abs())
            .fold(0.0f32, f32::max);
        assert!(peak > 0.1 && peak <= 1.0);
    }

    #[test]
    fn headless_rejects_invalid_params() {
        let config = Config {
            simulation: SimulationParams::default().with_medium_speed(0.0),
            ..Config::default()
        };
        let mut out = Vec::new();
        let err = run::<_, io::Sink>(&config, &options(1.0, 10.0, OutputFormat::Text), &mut out, None)
            .unwrap_err();
        assert!(matches!(err, AppError::Params(_)));
    }
}
