//! Interactive terminal front end.
//!
//! The app owns the host clock and the three sinks. Its loop polls crossterm
//! for input with a timeout that lands on the next frame deadline, ticks the
//! scheduler once per frame and repaints.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use doppler::{
    AudioSink, DisplaySink, Frame, LoopState, Readouts, RenderSink, Rgb, Scheduler, ToneGenerator,
};
use tracing::{debug, info, warn};

use crate::audio::{SharedTone, Speaker};
use crate::canvas::Canvas;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::panel::ReadoutPanel;
use crate::pcm::PcmWriter;

/// Factor applied to the zoom per key press.
pub const ZOOM_STEP: f64 = 1.25;

/// Change in the emphasis exponent per key press.
pub const EMPHASIS_STEP: f64 = 0.5;

/// Something the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Leave the app.
    Quit,
    /// Restart the run with the current parameters.
    Reset,
    /// Magnify the view.
    ZoomIn,
    /// Shrink the view.
    ZoomOut,
    /// Raise the gain emphasis.
    EmphasisUp,
    /// Lower the gain emphasis (never below 1).
    EmphasisDown,
    /// Turn single-step mode on or off.
    ToggleSingleStep,
    /// Run one more frame while halted.
    Step,
}

impl Action {
    /// Maps a key press to an action.
    ///
    /// | Key                  | Action             |
    /// |----------------------|--------------------|
    /// | `q`, `Esc`, `Ctrl+C` | quit               |
    /// | `r`                  | reset              |
    /// | `+` / `=`            | zoom in            |
    /// | `-` / `_`            | zoom out           |
    /// | `]` / `[`            | emphasis up / down |
    /// | `s`                  | toggle single-step |
    /// | `n`, `Space`         | step               |
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let action = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Self::Quit,
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,
            KeyCode::Char('r') => Self::Reset,
            KeyCode::Char('+' | '=') => Self::ZoomIn,
            KeyCode::Char('-' | '_') => Self::ZoomOut,
            KeyCode::Char(']') => Self::EmphasisUp,
            KeyCode::Char('[') => Self::EmphasisDown,
            KeyCode::Char('s') => Self::ToggleSingleStep,
            KeyCode::Char('n' | ' ') => Self::Step,
            _ => return None,
        };
        Some(action)
    }
}

/// The concrete sinks of the interactive app.
#[derive(Debug)]
pub struct Frontend {
    /// Render sink.
    pub canvas: Canvas,
    /// Display sink.
    pub panel: ReadoutPanel,
    /// Audio sink; also the source of PCM export.
    pub tone: ToneGenerator,
    /// Tone played by the output device, if one is open.
    pub live: Option<SharedTone>,
}

impl AudioSink for Frontend {
    fn set_frequency(&mut self, hz: f64) {
        self.tone.set_frequency(hz);
        if let Some(live) = self.live.as_mut() {
            live.set_frequency(hz);
        }
    }

    fn set_gain(&mut self, gain: f64) {
        self.tone.set_gain(gain);
        if let Some(live) = self.live.as_mut() {
            live.set_gain(gain);
        }
    }
}

impl DisplaySink for Frontend {
    fn show(&mut self, readouts: &Readouts) {
        self.panel.show(readouts);
    }
}

impl RenderSink for Frontend {
    fn surface_size(&self) -> (f64, f64) {
        self.canvas.surface_size()
    }

    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn draw_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgb) {
        self.canvas.draw_disc(x, y, radius, color);
    }
}

/// Interactive application state.
#[derive(Debug)]
pub struct App {
    scheduler: Scheduler,
    frontend: Frontend,
    fps: u32,
    cols: u16,
    pcm: Option<PcmWriter<BufWriter<File>>>,
    speaker: Option<Speaker>,
    last_frame: Option<Frame>,
    quit: bool,
}

impl App {
    /// Creates the app for a `cols` x `rows` terminal.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Params`] if the simulation parameters are invalid.
    pub fn new(config: &Config, cols: u16, rows: u16, sample_rate: u32) -> Result<Self> {
        let scheduler = Scheduler::new(config.simulation, config.scheduler_options())?;
        let mut app = Self {
            scheduler,
            frontend: Frontend {
                canvas: Canvas::new(cols, rows),
                panel: ReadoutPanel::new(),
                tone: ToneGenerator::new(sample_rate),
                live: None,
            },
            fps: config.display.fps.max(1),
            cols,
            pcm: None,
            speaker: None,
            last_frame: None,
            quit: false,
        };
        app.resize(cols, rows);
        app.refresh_status();
        Ok(app)
    }

    /// Streams the tone to `pcm` while running.
    pub fn with_pcm(mut self, pcm: PcmWriter<BufWriter<File>>) -> Self {
        self.pcm = Some(pcm);
        self
    }

    /// Mirrors every frequency and gain update into `tone`.
    pub fn with_live_tone(mut self, tone: SharedTone) -> Self {
        self.frontend.live = Some(tone);
        self
    }

    /// Plays the tone on `speaker` while running.
    pub fn with_speaker(self, speaker: Speaker) -> Self {
        let mut app = self.with_live_tone(speaker.tone());
        app.speaker = Some(speaker);
        app
    }

    /// Whether an output device is playing the tone.
    pub const fn is_audible(&self) -> bool {
        self.speaker.is_some()
    }

    /// The scheduler.
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The sinks.
    pub const fn frontend(&self) -> &Frontend {
        &self.frontend
    }

    /// The most recent frame.
    pub const fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Whether the user asked to quit.
    pub const fn should_quit(&self) -> bool {
        self.quit
    }

    /// Fits the canvas to a new terminal size, leaving room for the panel.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.frontend
            .canvas
            .resize(cols, rows.saturating_sub(ReadoutPanel::HEIGHT));
    }

    /// Applies a user action at host time `now`.
    ///
    /// Rejected live edits (a zoom that overflows, say) are logged and
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Params`] if a reset is rejected.
    pub fn apply(&mut self, action: Action, now: Duration) -> Result<()> {
        match action {
            Action::Quit => self.quit = true,
            Action::Reset => {
                let params = *self.scheduler.params();
                self.scheduler.reset(params, now)?;
                info!("run reset");
            }
            Action::ZoomIn | Action::ZoomOut => {
                let zoom = if action == Action::ZoomIn {
                    self.scheduler.zoom() * ZOOM_STEP
                } else {
                    self.scheduler.zoom() / ZOOM_STEP
                };
                if let Err(e) = self.scheduler.set_zoom(zoom) {
                    warn!(error = %e, "zoom change rejected");
                }
            }
            Action::EmphasisUp | Action::EmphasisDown => {
                let current = self.scheduler.params().volume_emphasis;
                let emphasis = if action == Action::EmphasisUp {
                    current + EMPHASIS_STEP
                } else {
                    (current - EMPHASIS_STEP).max(1.0)
                };
                if let Err(e) = self.scheduler.set_volume_emphasis(emphasis) {
                    warn!(error = %e, "emphasis change rejected");
                }
            }
            Action::ToggleSingleStep => {
                let enabled = !self.scheduler.options().single_step;
                self.scheduler.set_single_step(enabled);
                debug!(enabled, "single-step toggled");
            }
            Action::Step => self.scheduler.resume(),
        }
        self.refresh_status();
        Ok(())
    }

    /// Ticks the scheduler at host time `now` if it is not halted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the PCM stream cannot be written.
    pub fn frame(&mut self, now: Duration) -> Result<Option<Frame>> {
        if !self.scheduler.should_continue() {
            return Ok(None);
        }
        if let Some(pcm) = self.pcm.as_mut() {
            pcm.render_until(&mut self.frontend.tone, now.as_secs_f64())?;
        }
        let frame = self.scheduler.tick(now, &mut self.frontend);
        if frame.is_some() {
            self.last_frame = frame;
        }
        self.refresh_status();
        Ok(frame)
    }

    fn refresh_status(&mut self) {
        let state = match self.scheduler.loop_state() {
            LoopState::Idle => "idle",
            LoopState::Running if self.scheduler.options().single_step => "stepping",
            LoopState::Running => "running",
            LoopState::Halted => "halted (n to step)",
        };
        let sound = if self.is_audible() { "" } else { " (muted)" };
        let shift = self
            .last_frame
            .map_or_else(String::new, |f| format!(" │ {}", f.acoustics.shift));
        let status = format!(
            "{state} │ zoom {:.2} │ emphasis {:.1} │ tone {:.2} Hz × {:.2}{sound}{shift}",
            self.scheduler.zoom(),
            self.scheduler.params().volume_emphasis,
            self.frontend.tone.frequency(),
            self.frontend.tone.gain(),
        );
        self.frontend.panel.set_status(status);
    }

    /// Paints the canvas and the panel.
    ///
    /// # Errors
    ///
    /// Returns the error from writing to the terminal.
    pub fn render<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.frontend.canvas.render(writer, 0)?;
        self.frontend
            .panel
            .render(writer, self.frontend.canvas.rows(), self.cols)?;
        writer.flush()
    }

    /// Runs the app on stdout until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up or drawn to.
    pub fn run(self) -> Result<()> {
        let stdout = io::stdout();
        self.run_with_writer(stdout)
    }

    /// Runs the app on `writer`, restoring the terminal afterwards even when
    /// the loop fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up or drawn to.
    pub fn run_with_writer<W: Write>(mut self, mut writer: W) -> Result<()> {
        enable_raw_mode()?;
        execute!(writer, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

        let result = self.event_loop(&mut writer);

        let _ = execute!(writer, Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();

        let finished = match self.pcm.take() {
            Some(pcm) => pcm.finish().map(drop).map_err(AppError::from),
            None => Ok(()),
        };
        result.and(finished)
    }

    fn event_loop<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let clock = Instant::now();
        let frame_duration = Duration::from_secs_f64(1.0 / f64::from(self.fps));
        if let Ok((cols, rows)) = terminal::size() {
            self.resize(cols, rows);
        }
        info!(fps = self.fps, "interactive loop started");

        let mut next_frame = Duration::ZERO;
        let mut needs_render = true;
        while !self.quit {
            let timeout = next_frame.saturating_sub(clock.elapsed());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) => {
                        if let Some(action) = Action::from_key(key) {
                            self.apply(action, clock.elapsed())?;
                            needs_render = true;
                        }
                    }
                    Event::Resize(cols, rows) => {
                        execute!(writer, Clear(ClearType::All))?;
                        self.resize(cols, rows);
                        needs_render = true;
                    }
                    _ => {}
                }
            }

            let now = clock.elapsed();
            if now >= next_frame {
                if self.frame(now)?.is_some() {
                    needs_render = true;
                }
                next_frame = now + frame_duration;
            }

            if needs_render {
                self.render(writer)?;
                needs_render = false;
            }
        }
        info!("interactive loop finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppler::BodyRole;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(&Config::default(), 80, 24, 8_000).unwrap()
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(Action::from_key(press(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(Action::from_key(press(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(
            Action::from_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(Action::from_key(press(KeyCode::Char('r'))), Some(Action::Reset));
        assert_eq!(Action::from_key(press(KeyCode::Char('='))), Some(Action::ZoomIn));
        assert_eq!(Action::from_key(press(KeyCode::Char('-'))), Some(Action::ZoomOut));
        assert_eq!(Action::from_key(press(KeyCode::Char(']'))), Some(Action::EmphasisUp));
        assert_eq!(Action::from_key(press(KeyCode::Char('['))), Some(Action::EmphasisDown));
        assert_eq!(Action::from_key(press(KeyCode::Char('s'))), Some(Action::ToggleSingleStep));
        assert_eq!(Action::from_key(press(KeyCode::Char(' '))), Some(Action::Step));
        assert_eq!(Action::from_key(press(KeyCode::Char('c'))), None);
        assert_eq!(Action::from_key(press(KeyCode::Enter)), None);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(Action::from_key(key), None);
    }

    #[test]
    fn canvas_leaves_room_for_panel() {
        let app = app();
        assert_eq!(app.frontend().canvas.rows(), 24 - ReadoutPanel::HEIGHT);
        assert_eq!(app.frontend().canvas.cols(), 80);
    }

    #[test]
    fn frame_feeds_all_sinks() {
        let mut app = app();
        let frame = app.frame(Duration::ZERO).unwrap().unwrap();

        let front = app.frontend();
        assert_eq!(front.panel.updates(), 1);
        assert!((front.panel.readouts().distance - 250.798_724).abs() < 0.01);
        assert_eq!(front.tone.frequency(), frame.acoustics.doppler_frequency);
        assert!(front.canvas.filled_pixels() > 0);
        assert!(front.panel.status().starts_with("running"));
        assert!(front.panel.status().ends_with("approaching"));
    }

    #[test]
    fn frame_drives_live_tone() {
        let live = SharedTone::new(8_000);
        let mut app = app().with_live_tone(live.clone());
        let frame = app.frame(Duration::ZERO).unwrap().unwrap();
        assert_eq!(live.frequency(), frame.acoustics.doppler_frequency);
        assert_eq!(live.gain(), app.frontend().tone.gain());

        let frame = app.frame(Duration::from_secs(3)).unwrap().unwrap();
        assert_eq!(live.frequency(), frame.acoustics.doppler_frequency);
        assert!(live.frequency() < 660.0);

        let mut out = vec![0.0f32; 64];
        live.fill_interleaved(&mut out, 2);
        assert!(out.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn huge_configured_disc_still_draws() {
        let mut config = Config::default();
        config.display.source_radius = 1e12;
        assert!(config.validate().is_ok());

        let mut app = App::new(&config, 40, 13, 8_000).unwrap();
        assert!(app.frame(Duration::ZERO).unwrap().is_some());
        assert_eq!(app.frontend().canvas.filled_pixels(), 40 * 10 * 2);
    }

    #[test]
    fn status_flags_missing_audio() {
        let mut app = app();
        app.frame(Duration::ZERO).unwrap();
        assert!(!app.is_audible());
        assert!(app.frontend().panel.status().contains("(muted)"));
    }

    #[test]
    fn zoom_keys_scale_live() {
        let mut app = app();
        app.frame(Duration::ZERO).unwrap();
        app.apply(Action::ZoomIn, Duration::ZERO).unwrap();
        assert!((app.scheduler().zoom() - 1.25).abs() < 1e-12);
        app.apply(Action::ZoomOut, Duration::ZERO).unwrap();
        app.apply(Action::ZoomOut, Duration::ZERO).unwrap();
        assert!((app.scheduler().zoom() - 0.8).abs() < 1e-12);
        assert!(app.frontend().panel.status().contains("zoom 0.80"));
    }

    #[test]
    fn emphasis_never_drops_below_one() {
        let mut app = app();
        app.frame(Duration::ZERO).unwrap();
        for _ in 0..20 {
            app.apply(Action::EmphasisDown, Duration::ZERO).unwrap();
        }
        assert_eq!(app.scheduler().params().volume_emphasis, 1.0);
        app.apply(Action::EmphasisUp, Duration::ZERO).unwrap();
        assert_eq!(app.scheduler().state().unwrap().volume_emphasis(), 1.5);
    }

    #[test]
    fn single_step_halts_and_steps() {
        let mut app = app();
        app.apply(Action::ToggleSingleStep, Duration::ZERO).unwrap();
        assert!(app.frame(Duration::ZERO).unwrap().is_some());
        assert_eq!(app.scheduler().loop_state(), LoopState::Halted);
        assert!(app.frontend().panel.status().starts_with("halted"));
        assert!(app.frame(Duration::from_millis(16)).unwrap().is_none());

        app.apply(Action::Step, Duration::from_millis(20)).unwrap();
        let frame = app.frame(Duration::from_millis(32)).unwrap().unwrap();
        assert_eq!(frame.index, 2);
        assert_eq!(app.scheduler().loop_state(), LoopState::Halted);

        app.apply(Action::ToggleSingleStep, Duration::from_millis(40)).unwrap();
        assert_eq!(app.scheduler().loop_state(), LoopState::Running);
    }

    #[test]
    fn reset_restarts_at_now() {
        let mut app = app();
        for ms in [0, 500, 1000] {
            app.frame(Duration::from_millis(ms)).unwrap();
        }
        assert!(app.scheduler().drawn_position(BodyRole::Source).x > -200.0);

        app.apply(Action::Reset, Duration::from_secs(2)).unwrap();
        let frame = app.frame(Duration::from_secs(2)).unwrap().unwrap();
        assert_eq!(frame.index, 1);
        assert_eq!(frame.elapsed, 0.0);
        assert_eq!(frame.source_position.x, -200.0);
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = app();
        assert!(!app.should_quit());
        app.apply(Action::Quit, Duration::ZERO).unwrap();
        assert!(app.should_quit());
    }

    #[test]
    fn render_writes_canvas_and_panel() {
        let mut app = App::new(&Config::default(), 40, 12, 8_000).unwrap();
        app.frame(Duration::ZERO).unwrap();
        let mut out = Vec::new();
        app.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("distance 250.80"));
        assert!(text.contains("q quit"));
    }
}
