//! Display sink: the readout strip under the canvas.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
};
use doppler::{DisplaySink, Readouts};

/// Key help shown on the last panel line.
pub const HELP: &str = "q quit  r reset  +/- zoom  ]/[ emphasis  s single-step  n/space step";

/// Shows the latest readouts, a status line and the key help.
#[derive(Debug, Clone, Default)]
pub struct ReadoutPanel {
    readouts: Readouts,
    updates: u64,
    status: String,
}

impl ReadoutPanel {
    /// Terminal rows the panel occupies.
    pub const HEIGHT: u16 = 3;

    /// Creates an empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// The readouts last shown.
    pub const fn readouts(&self) -> &Readouts {
        &self.readouts
    }

    /// How many times the scheduler has pushed readouts.
    pub const fn updates(&self) -> u64 {
        self.updates
    }

    /// Replaces the status line.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// The status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The three panel lines, each cut or padded to `width` characters.
    pub fn lines(&self, width: usize) -> [String; 3] {
        let readouts = self
            .readouts
            .formatted()
            .iter()
            .map(|(label, value)| format!("{label} {value}"))
            .collect::<Vec<_>>()
            .join(" │ ");
        [
            fit(&readouts, width),
            fit(&self.status, width),
            fit(HELP, width),
        ]
    }

    /// Queues the panel onto `writer` starting at terminal row `top`.
    pub fn render<W: Write>(&self, writer: &mut W, top: u16, width: u16) -> io::Result<()> {
        let [readouts, status, help] = self.lines(usize::from(width));
        queue!(
            writer,
            MoveTo(0, top),
            SetAttribute(Attribute::Bold),
            Print(readouts),
            SetAttribute(Attribute::Reset),
            MoveTo(0, top + 1),
            Print(status),
            MoveTo(0, top + 2),
            SetAttribute(Attribute::Dim),
            Print(help),
            SetAttribute(Attribute::Reset),
        )
    }
}

impl DisplaySink for ReadoutPanel {
    fn show(&mut self, readouts: &Readouts) {
        self.readouts = *readouts;
        self.updates += 1;
    }
}

fn fit(text: &str, width: usize) -> String {
    let mut line: String = text.chars().take(width).collect();
    let len = line.chars().count();
    line.extend(std::iter::repeat_n(' ', width - len));
    line
}
