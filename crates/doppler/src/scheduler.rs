//! The per-frame update loop.
//!
//! The host owns the clock and calls [`Scheduler::tick`] once per display
//! refresh with a monotonic `now`. The scheduler never sleeps or spawns; it
//! only turns the current [`SimulationState`] into sink updates. A reset
//! replaces the state wholesale between two ticks, so no tick ever observes a
//! half-updated run.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::body::BodyRole;
use crate::params::{validate_emphasis, ParamError, SimulationParams};
use crate::sink::{AudioSink, DisplaySink, Readouts, RenderSink, Rgb, Viewport};
use crate::state::{Acoustics, SimulationState};
use crate::timing::{FrameTimingWindow, DEFAULT_CAPACITY};
use crate::vector::Vector2;

/// Everything a tick writes to.
///
/// Implemented automatically for any type that is all three sinks.
pub trait Sinks: AudioSink + DisplaySink + RenderSink {}

impl<T: AudioSink + DisplaySink + RenderSink + ?Sized> Sinks for T {}

/// Lifecycle of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    /// No run has started.
    Idle,
    /// Ticks advance the run.
    Running,
    /// Single-step mode stopped the loop after a tick.
    Halted,
}

/// Radius and color of a drawn body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscStyle {
    /// Radius in surface pixels.
    pub radius: f64,
    /// Fill color.
    pub color: Rgb,
}

/// Scheduler settings that are not part of the physics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerOptions {
    /// Number of frame deltas averaged for drawn motion.
    pub timing_window: usize,
    /// Halt after every tick until [`Scheduler::resume`] is called.
    pub single_step: bool,
    /// Style of the source disc.
    pub source_disc: DiscStyle,
    /// Style of the observer disc.
    pub observer_disc: DiscStyle,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            timing_window: DEFAULT_CAPACITY,
            single_step: false,
            source_disc: DiscStyle {
                radius: 10.0,
                color: Rgb(0xe0, 0x4f, 0x4f),
            },
            observer_disc: DiscStyle {
                radius: 10.0,
                color: Rgb(0x4f, 0x8f, 0xe0),
            },
        }
    }
}

/// What one tick computed and pushed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    /// Number of ticks since the last reset, starting at 1.
    pub index: u64,
    /// Seconds since the run's epoch, used for every analytic quantity.
    pub elapsed: f64,
    /// Raw wall-clock delta since the previous tick.
    pub dt: f64,
    /// Moving average of recent deltas, used only for drawn motion.
    pub smoothed_dt: f64,
    /// Frame rate implied by `smoothed_dt`.
    pub fps: f64,
    /// Acoustic state at `elapsed`.
    #[serde(flatten)]
    pub acoustics: Acoustics,
    /// Whether the gain was written to the audio sink this tick.
    pub gain_applied: bool,
    /// Drawn source position (world units) at this tick.
    pub source_position: Vector2,
    /// Drawn observer position (world units) at this tick.
    pub observer_position: Vector2,
}

impl Frame {
    /// The numeric readouts this frame pushed to the display sink.
    pub fn readouts(&self) -> Readouts {
        Readouts {
            distance: self.acoustics.separation,
            relative_velocity: self.acoustics.relative_velocity,
            intensity: self.acoustics.intensity,
            loudness_db: self.acoustics.loudness_db,
            doppler_frequency: self.acoustics.doppler_frequency,
            fps: self.fps,
        }
    }
}

/// Drives one source/observer run from host ticks.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use doppler::{LoopState, NullSink, Scheduler, SchedulerOptions, SimulationParams};
///
/// let options = SchedulerOptions { single_step: true, ..SchedulerOptions::default() };
/// let mut scheduler = Scheduler::new(SimulationParams::default(), options)?;
///
/// let frame = scheduler.tick(Duration::ZERO, &mut NullSink).unwrap();
/// assert_eq!(frame.index, 1);
/// assert_eq!(scheduler.loop_state(), LoopState::Halted);
/// assert!(scheduler.tick(Duration::from_millis(16), &mut NullSink).is_none());
/// # Ok::<(), doppler::ParamError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler {
    params: SimulationParams,
    options: SchedulerOptions,
    state: Option<SimulationState>,
    timing: FrameTimingWindow,
    loop_state: LoopState,
    last_frame: Duration,
    frame_index: u64,
    zoom: f64,
    drawn_source: Vector2,
    drawn_observer: Vector2,
    warned_gain: bool,
}

impl Scheduler {
    /// Creates an idle scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] when `params` fail validation.
    pub fn new(params: SimulationParams, options: SchedulerOptions) -> Result<Self, ParamError> {
        params.validate()?;
        Ok(Self {
            params,
            options,
            state: None,
            timing: FrameTimingWindow::with_capacity(options.timing_window),
            loop_state: LoopState::Idle,
            last_frame: Duration::ZERO,
            frame_index: 0,
            zoom: params.zoom,
            drawn_source: params.source_position,
            drawn_observer: params.observer_position,
            warned_gain: false,
        })
    }

    /// Starts a run with the current parameters at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] when the stored parameters fail validation.
    pub fn start(&mut self, now: Duration) -> Result<(), ParamError> {
        let state = SimulationState::new(&self.params, now)?;
        self.install(state, now);
        Ok(())
    }

    /// Replaces the run with one built from `params`, starting at `now`.
    ///
    /// The timing window is cleared and the loop re-enters
    /// [`LoopState::Running`], even when it was halted.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] when `params` fail validation; the current run
    /// is left untouched in that case.
    pub fn reset(&mut self, params: SimulationParams, now: Duration) -> Result<(), ParamError> {
        let state = SimulationState::new(&params, now)?;
        self.params = params;
        self.zoom = params.zoom;
        self.install(state, now);
        Ok(())
    }

    fn install(&mut self, state: SimulationState, now: Duration) {
        debug!(
            max_loudness_db = state.max_loudness_db(),
            closest_approach = ?state.motion().time_of_closest_approach(),
            epoch = ?now,
            "simulation reset"
        );
        self.drawn_source = state.source().position0;
        self.drawn_observer = state.observer().position0;
        self.state = Some(state);
        self.timing.clear();
        self.last_frame = now;
        self.frame_index = 0;
        self.warned_gain = false;
        self.loop_state = LoopState::Running;
    }

    /// Advances the loop to `now` and pushes the results into `sinks`.
    ///
    /// Returns `None` without touching the sinks while halted. The first tick
    /// of an idle scheduler starts the run at `now`.
    pub fn tick<S: Sinks + ?Sized>(&mut self, now: Duration, sinks: &mut S) -> Option<Frame> {
        match self.loop_state {
            LoopState::Halted => return None,
            LoopState::Idle => self.start(now).ok()?,
            LoopState::Running => {}
        }

        let dt = if now < self.last_frame {
            warn!(?now, last = ?self.last_frame, "clock went backwards, using a zero frame delta");
            0.0
        } else {
            (now - self.last_frame).as_secs_f64()
        };
        self.last_frame = self.last_frame.max(now);
        self.timing.push(dt);
        let smoothed_dt = self.timing.smoothed_dt();
        let fps = self.timing.frames_per_second();

        let state = self.state.as_ref()?;
        let elapsed = state.elapsed_since_epoch(now);
        let acoustics = state.evaluate(elapsed);
        let source_velocity = state.source().velocity;
        let observer_velocity = state.observer().velocity;

        sinks.set_frequency(acoustics.doppler_frequency);
        let gain_applied = match acoustics.sink_gain {
            Some(gain) => {
                sinks.set_gain(gain);
                true
            }
            None => {
                if !self.warned_gain {
                    warn!(
                        loudness_db = acoustics.loudness_db,
                        "gain is not finite, keeping the previous gain"
                    );
                    self.warned_gain = true;
                }
                false
            }
        };

        self.frame_index += 1;
        let frame = Frame {
            index: self.frame_index,
            elapsed,
            dt,
            smoothed_dt,
            fps,
            acoustics,
            gain_applied,
            source_position: self.drawn_source,
            observer_position: self.drawn_observer,
        };

        sinks.show(&frame.readouts());
        self.draw(sinks);

        self.drawn_source += source_velocity * smoothed_dt;
        self.drawn_observer += observer_velocity * smoothed_dt;

        trace!(
            frame = frame.index,
            distance = acoustics.separation,
            closing_speed = acoustics.relative_velocity,
            frequency = acoustics.doppler_frequency,
            fps,
            "tick"
        );

        if self.options.single_step {
            debug!(frame = frame.index, "single step, halting");
            self.loop_state = LoopState::Halted;
        }
        Some(frame)
    }

    fn draw<S: RenderSink + ?Sized>(&self, surface: &mut S) {
        let (width, height) = surface.surface_size();
        let viewport = Viewport::new(width, height, self.zoom);
        surface.clear();
        for (role, position) in [
            (BodyRole::Observer, self.drawn_observer),
            (BodyRole::Source, self.drawn_source),
        ] {
            let style = self.disc_style(role);
            let (x, y) = viewport.to_screen(position);
            surface.draw_disc(x, y, style.radius, style.color);
        }
    }

    /// Style used to draw `role`.
    pub const fn disc_style(&self, role: BodyRole) -> DiscStyle {
        match role {
            BodyRole::Source => self.options.source_disc,
            BodyRole::Observer => self.options.observer_disc,
        }
    }

    /// Whether the host should schedule another tick.
    pub fn should_continue(&self) -> bool {
        self.loop_state != LoopState::Halted
    }

    /// Leaves the halted state; the next tick runs normally.
    ///
    /// The elapsed time keeps counting from the original epoch, so the run
    /// jumps to wherever the bodies are at the next `now`.
    pub fn resume(&mut self) {
        if self.loop_state == LoopState::Halted {
            self.loop_state = LoopState::Running;
        }
    }

    /// Turns single-step mode on or off.
    pub fn set_single_step(&mut self, enabled: bool) {
        self.options.single_step = enabled;
        if !enabled {
            self.resume();
        }
    }

    /// Changes the render scale without restarting.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] unless `zoom` is finite and positive.
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), ParamError> {
        SimulationParams { zoom, ..self.params }.validate()?;
        self.zoom = zoom;
        self.params.zoom = zoom;
        Ok(())
    }

    /// Changes the gain emphasis without restarting.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] for an exponent below 1 or not finite.
    pub fn set_volume_emphasis(&mut self, exponent: f64) -> Result<(), ParamError> {
        validate_emphasis(exponent)?;
        if let Some(state) = self.state.as_mut() {
            state.set_volume_emphasis(exponent)?;
        }
        self.params.volume_emphasis = exponent;
        Ok(())
    }

    /// Current lifecycle state.
    pub const fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// The active run, if started.
    pub const fn state(&self) -> Option<&SimulationState> {
        self.state.as_ref()
    }

    /// Parameters of the active (or next) run, including live edits.
    pub const fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Scheduler options.
    pub const fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Recent frame deltas.
    pub const fn timing(&self) -> &FrameTimingWindow {
        &self.timing
    }

    /// Current render scale.
    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Drawn position of a body.
    pub const fn drawn_position(&self, role: BodyRole) -> Vector2 {
        match role {
            BodyRole::Source => self.drawn_source,
            BodyRole::Observer => self.drawn_observer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_new_is_idle() {
        let scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default()).unwrap();
        assert_eq!(scheduler.loop_state(), LoopState::Idle);
        assert!(scheduler.state().is_none());
        assert!(scheduler.should_continue());
    }

    #[test]
    fn test_new_rejects_invalid_params() {
        let params = SimulationParams::default().with_power(-1.0);
        assert!(Scheduler::new(params, SchedulerOptions::default()).is_err());
    }

    #[test]
    fn test_first_tick_starts_run() {
        let mut scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default()).unwrap();
        let frame = scheduler.tick(ms(500), &mut NullSink).unwrap();
        assert_eq!(scheduler.loop_state(), LoopState::Running);
        assert_eq!(scheduler.state().unwrap().epoch(), ms(500));
        assert_eq!(frame.elapsed, 0.0);
        assert_eq!(frame.dt, 0.0);
    }

    #[test]
    fn test_elapsed_ignores_smoothing() {
        let mut scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default()).unwrap();
        scheduler.start(ms(0)).unwrap();
        scheduler.tick(ms(10), &mut NullSink);
        let frame = scheduler.tick(ms(1000), &mut NullSink).unwrap();
        assert!((frame.elapsed - 1.0).abs() < 1e-12);
        assert!((frame.dt - 0.99).abs() < 1e-12);
        assert!((frame.smoothed_dt - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_drawn_positions_advance_by_smoothed_dt() {
        let mut scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default()).unwrap();
        scheduler.start(ms(0)).unwrap();
        let first = scheduler.tick(ms(100), &mut NullSink).unwrap();
        assert_eq!(first.source_position, Vector2::new(-200.0, 20.0));
        // Source velocity is 100 units/s and the smoothed delta is 0.1 s.
        let moved = scheduler.drawn_position(BodyRole::Source);
        assert!((moved.x - -190.0).abs() < 1e-9);
        assert_eq!(scheduler.drawn_position(BodyRole::Observer), Vector2::new(50.0, 0.0));
    }

    #[test]
    fn test_backwards_clock_uses_zero_delta() {
        let mut scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default()).unwrap();
        scheduler.start(ms(100)).unwrap();
        scheduler.tick(ms(200), &mut NullSink);
        let frame = scheduler.tick(ms(150), &mut NullSink).unwrap();
        assert_eq!(frame.dt, 0.0);
        assert!((frame.elapsed - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_reset_replaces_state_and_clears_window() {
        let mut scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default()).unwrap();
        scheduler.start(ms(0)).unwrap();
        for i in 1..=5 {
            scheduler.tick(ms(i * 16), &mut NullSink);
        }
        assert_eq!(scheduler.timing().len(), 5);

        let params = SimulationParams::default().with_frequency(440.0);
        scheduler.reset(params, ms(100)).unwrap();
        assert!(scheduler.timing().is_empty());
        assert_eq!(scheduler.state().unwrap().source_frequency(), 440.0);
        assert_eq!(scheduler.state().unwrap().epoch(), ms(100));

        let frame = scheduler.tick(ms(116), &mut NullSink).unwrap();
        assert_eq!(frame.index, 1);
    }

    #[test]
    fn test_invalid_reset_keeps_run() {
        let mut scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default()).unwrap();
        scheduler.start(ms(0)).unwrap();
        let before = scheduler.state().cloned();
        assert!(scheduler.reset(SimulationParams::default().with_medium_speed(0.0), ms(5)).is_err());
        assert_eq!(scheduler.state().cloned(), before);
    }

    #[test]
    fn test_single_step_halts_until_resumed() {
        let options = SchedulerOptions {
            single_step: true,
            ..SchedulerOptions::default()
        };
        let mut scheduler = Scheduler::new(SimulationParams::default(), options).unwrap();
        assert!(scheduler.tick(ms(0), &mut NullSink).is_some());
        assert!(!scheduler.should_continue());
        assert!(scheduler.tick(ms(16), &mut NullSink).is_none());

        scheduler.resume();
        assert!(scheduler.tick(ms(32), &mut NullSink).is_some());
        assert_eq!(scheduler.loop_state(), LoopState::Halted);

        scheduler.set_single_step(false);
        assert_eq!(scheduler.loop_state(), LoopState::Running);
        scheduler.tick(ms(48), &mut NullSink);
        assert!(scheduler.should_continue());
    }

    #[test]
    fn test_reset_leaves_halt() {
        let options = SchedulerOptions {
            single_step: true,
            ..SchedulerOptions::default()
        };
        let mut scheduler = Scheduler::new(SimulationParams::default(), options).unwrap();
        scheduler.tick(ms(0), &mut NullSink);
        scheduler.reset(SimulationParams::default(), ms(10)).unwrap();
        assert_eq!(scheduler.loop_state(), LoopState::Running);
    }

    #[test]
    fn test_live_zoom_and_emphasis() {
        let mut scheduler = Scheduler::new(SimulationParams::default(), SchedulerOptions::default()).unwrap();
        scheduler.start(ms(0)).unwrap();
        let epoch = scheduler.state().unwrap().epoch();

        scheduler.set_zoom(4.0).unwrap();
        scheduler.set_volume_emphasis(1.0).unwrap();
        assert_eq!(scheduler.zoom(), 4.0);
        assert_eq!(scheduler.state().unwrap().volume_emphasis(), 1.0);
        assert_eq!(scheduler.state().unwrap().epoch(), epoch);

        assert!(scheduler.set_zoom(0.0).is_err());
        assert!(scheduler.set_volume_emphasis(0.0).is_err());
        assert_eq!(scheduler.zoom(), 4.0);
    }
}
