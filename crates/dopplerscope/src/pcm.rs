//! Raw PCM export of the synthesized tone.
//!
//! The output is headerless mono 32-bit float little-endian, playable with
//! e.g. `ffplay -f f32le -ar 44100 -ac 1 flyby.f32`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use doppler::ToneGenerator;

/// Streams a [`ToneGenerator`] to a writer on the host clock.
///
/// Each call to [`render_until`](Self::render_until) writes exactly the
/// samples between the previous call and the given time, so rounding never
/// accumulates over a long run.
#[derive(Debug)]
pub struct PcmWriter<W: Write> {
    out: W,
    samples_written: u64,
}

impl PcmWriter<BufWriter<File>> {
    /// Creates (or truncates) a PCM file.
    ///
    /// # Errors
    ///
    /// Returns the error from creating the file.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> PcmWriter<W> {
    /// Wraps a writer.
    pub const fn new(out: W) -> Self {
        Self {
            out,
            samples_written: 0,
        }
    }

    /// Total samples written so far.
    pub const fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Renders `tone` up to `seconds` after the start of the stream.
    ///
    /// Returns the number of samples written by this call.
    ///
    /// # Errors
    ///
    /// Returns the error from the underlying writer.
    pub fn render_until(&mut self, tone: &mut ToneGenerator, seconds: f64) -> io::Result<usize> {
        let due = tone.samples_for(seconds) as u64;
        if due <= self.samples_written {
            return Ok(0);
        }
        let mut buffer = vec![0.0f32; (due - self.samples_written) as usize];
        tone.render(&mut buffer);
        for sample in &buffer {
            self.out.write_all(&sample.to_le_bytes())?;
        }
        self.samples_written = due;
        Ok(buffer.len())
    }

    /// Flushes and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns the error from flushing.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
