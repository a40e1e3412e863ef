//! Terminal render sink.
//!
//! The canvas splits every character cell into two square-ish pixels with
//! the upper and lower half-block glyphs, so a disc rasterized on the pixel
//! grid stays round on screen. Surface coordinates are scaled down by
//! [`UNITS_PER_PIXEL`] so that disc radii and zoom keep roughly the meaning
//! they have on a pixel display.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
};
use doppler::{RenderSink, Rgb};

/// Surface units covered by one half-cell pixel.
pub const UNITS_PER_PIXEL: f64 = 8.0;

/// Color of the axis cross through the world origin.
pub const AXIS_COLOR: Rgb = Rgb(0x4a, 0x4a, 0x4a);

/// What to print in one character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Glyph to print.
    pub glyph: char,
    /// Foreground color, `None` for the terminal default.
    pub fg: Option<Rgb>,
    /// Background color, `None` for the terminal default.
    pub bg: Option<Rgb>,
}

/// A character-grid drawing surface.
///
/// # Example
///
/// ```rust
/// use doppler::{RenderSink, Rgb};
/// use dopplerscope::canvas::Canvas;
///
/// let mut canvas = Canvas::new(40, 10);
/// let (w, h) = canvas.surface_size();
/// canvas.clear();
/// canvas.draw_disc(w / 2.0, h / 2.0, 16.0, Rgb(255, 0, 0));
/// assert!(canvas.filled_pixels() > 0);
/// ```
#[derive(Debug, Clone)]
pub struct Canvas {
    cols: u16,
    rows: u16,
    scale: f64,
    pixels: Vec<Option<Rgb>>,
}

impl Canvas {
    /// Creates a blank canvas of `cols` x `rows` character cells.
    pub fn new(cols: u16, rows: u16) -> Self {
        let mut canvas = Self {
            cols: 0,
            rows: 0,
            scale: UNITS_PER_PIXEL,
            pixels: Vec::new(),
        };
        canvas.resize(cols, rows);
        canvas
    }

    /// Sets how many surface units one pixel covers.
    pub fn with_scale(mut self, units_per_pixel: f64) -> Self {
        if units_per_pixel.is_finite() && units_per_pixel > 0.0 {
            self.scale = units_per_pixel;
        }
        self
    }

    /// Changes the grid size and blanks it.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols.max(1);
        self.rows = rows.max(1);
        self.pixels = vec![None; self.pixel_width() * self.pixel_height()];
    }

    /// Width in character cells.
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    /// Height in character cells.
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    fn pixel_width(&self) -> usize {
        usize::from(self.cols)
    }

    fn pixel_height(&self) -> usize {
        usize::from(self.rows) * 2
    }

    /// Color of the pixel at `(x, y)`, if painted.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.pixel_width() || y >= self.pixel_height() {
            return None;
        }
        self.pixels[y * self.pixel_width() + x]
    }

    /// Number of painted pixels.
    pub fn filled_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_some()).count()
    }

    fn paint(&mut self, x: i64, y: i64, color: Rgb) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if x < self.pixel_width() && y < self.pixel_height() {
            let width = self.pixel_width();
            self.pixels[y * width + x] = Some(color);
        }
    }

    fn is_axis_column(&self, col: u16) -> bool {
        col == self.cols / 2
    }

    fn is_axis_row(&self, row: u16) -> bool {
        row == self.rows / 2
    }

    /// Glyph and colors for the cell at `(col, row)`.
    pub fn cell(&self, col: u16, row: u16) -> Cell {
        let x = usize::from(col);
        let top = self.pixel(x, usize::from(row) * 2);
        let bottom = self.pixel(x, usize::from(row) * 2 + 1);
        match (top, bottom) {
            (Some(t), Some(b)) if t == b => Cell {
                glyph: '█',
                fg: Some(t),
                bg: None,
            },
            (Some(t), Some(b)) => Cell {
                glyph: '▀',
                fg: Some(t),
                bg: Some(b),
            },
            (Some(t), None) => Cell {
                glyph: '▀',
                fg: Some(t),
                bg: None,
            },
            (None, Some(b)) => Cell {
                glyph: '▄',
                fg: Some(b),
                bg: None,
            },
            (None, None) => {
                let glyph = match (self.is_axis_column(col), self.is_axis_row(row)) {
                    (true, true) => '┼',
                    (true, false) => '│',
                    (false, true) => '─',
                    (false, false) => ' ',
                };
                Cell {
                    glyph,
                    fg: (glyph != ' ').then_some(AXIS_COLOR),
                    bg: None,
                }
            }
        }
    }

    /// The grid as plain text, one string per row.
    pub fn to_plain_lines(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| (0..self.cols).map(|col| self.cell(col, row).glyph).collect())
            .collect()
    }

    /// Queues the grid onto `writer`, starting at terminal row `top`.
    ///
    /// Color changes are only emitted when they differ from the previous
    /// cell. The caller flushes.
    pub fn render<W: Write>(&self, writer: &mut W, top: u16) -> io::Result<()> {
        for row in 0..self.rows {
            queue!(writer, MoveTo(0, top + row), ResetColor)?;
            let mut fg = None;
            let mut bg = None;
            for col in 0..self.cols {
                let cell = self.cell(col, row);
                if cell.fg != fg {
                    queue!(writer, SetForegroundColor(term_color(cell.fg)))?;
                    fg = cell.fg;
                }
                if cell.bg != bg {
                    queue!(writer, SetBackgroundColor(term_color(cell.bg)))?;
                    bg = cell.bg;
                }
                queue!(writer, Print(cell.glyph))?;
            }
        }
        queue!(writer, ResetColor)
    }
}

fn term_color(color: Option<Rgb>) -> Color {
    match color {
        Some(Rgb(r, g, b)) => Color::Rgb { r, g, b },
        None => Color::Reset,
    }
}

impl RenderSink for Canvas {
    fn surface_size(&self) -> (f64, f64) {
        (
            self.pixel_width() as f64 * self.scale,
            self.pixel_height() as f64 * self.scale,
        )
    }

    fn clear(&mut self) {
        self.pixels.fill(None);
    }

    fn draw_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgb) {
        if !(x.is_finite() && y.is_finite() && radius.is_finite()) {
            return;
        }
        let (cx, cy) = (x / self.scale, y / self.scale);
        let r = radius.max(0.0) / self.scale;

        // Only pixels on the grid are visited, whatever the radius.
        let max_x = self.pixel_width() as f64 - 1.0;
        let max_y = self.pixel_height() as f64 - 1.0;
        let x0 = (cx - r).floor().max(0.0) as i64;
        let x1 = (cx + r).ceil().min(max_x) as i64;
        let y0 = (cy - r).floor().max(0.0) as i64;
        let y1 = (cy + r).ceil().min(max_y) as i64;
        let mut painted = false;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f64 + 0.5 - cx;
                let dy = py as f64 + 0.5 - cy;
                if dx * dx + dy * dy <= r * r {
                    self.paint(px, py, color);
                    painted = true;
                }
            }
        }
        // Discs smaller than a pixel still show up as one.
        if !painted {
            self.paint(cx.floor() as i64, cy.floor() as i64, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb(255, 0, 0);
    const BLUE: Rgb = Rgb(0, 0, 255);

    #[test]
    fn test_surface_size_in_units() {
        let canvas = Canvas::new(80, 20);
        assert_eq!(canvas.surface_size(), (640.0, 320.0));
        let canvas = Canvas::new(80, 20).with_scale(1.0);
        assert_eq!(canvas.surface_size(), (80.0, 40.0));
    }

    #[test]
    fn test_disc_is_round_in_pixels() {
        let mut canvas = Canvas::new(40, 20).with_scale(1.0);
        canvas.draw_disc(20.0, 20.0, 5.0, RED);
        // Same extent horizontally and vertically on the pixel grid.
        let row: usize = (0..40).filter(|&x| canvas.pixel(x, 20).is_some()).count();
        let col: usize = (0..40).filter(|&y| canvas.pixel(20, y).is_some()).count();
        assert_eq!(row, col);
        assert!(row >= 9);
    }

    #[test]
    fn test_tiny_disc_paints_one_pixel() {
        let mut canvas = Canvas::new(10, 5);
        canvas.draw_disc(20.0, 20.0, 0.1, RED);
        assert_eq!(canvas.filled_pixels(), 1);
        assert_eq!(canvas.pixel(2, 2), Some(RED));
    }

    #[test]
    fn test_offscreen_disc_is_clipped() {
        let mut canvas = Canvas::new(10, 5).with_scale(1.0);
        canvas.draw_disc(-50.0, -50.0, 3.0, RED);
        canvas.draw_disc(f64::NAN, 0.0, 3.0, RED);
        assert_eq!(canvas.filled_pixels(), 0);

        canvas.draw_disc(0.0, 0.0, 2.0, RED);
        assert!(canvas.filled_pixels() > 0);
    }

    #[test]
    fn test_huge_disc_fills_grid_and_returns() {
        let mut canvas = Canvas::new(40, 10);
        canvas.draw_disc(0.0, 0.0, 1e12, RED);
        assert_eq!(canvas.filled_pixels(), 40 * 20);

        canvas.clear();
        canvas.draw_disc(-1e15, 1e15, 1e12, BLUE);
        assert_eq!(canvas.filled_pixels(), 0);
    }

    #[test]
    fn test_clear_blanks_pixels() {
        let mut canvas = Canvas::new(10, 5).with_scale(1.0);
        canvas.draw_disc(5.0, 5.0, 3.0, RED);
        canvas.clear();
        assert_eq!(canvas.filled_pixels(), 0);
    }

    #[test]
    fn test_half_block_cells() {
        let mut canvas = Canvas::new(4, 2).with_scale(1.0);
        canvas.paint(0, 0, RED);
        canvas.paint(1, 1, BLUE);
        canvas.paint(2, 0, RED);
        canvas.paint(2, 1, BLUE);
        canvas.paint(3, 0, RED);
        canvas.paint(3, 1, RED);

        assert_eq!(canvas.cell(0, 0), Cell { glyph: '▀', fg: Some(RED), bg: None });
        assert_eq!(canvas.cell(1, 0), Cell { glyph: '▄', fg: Some(BLUE), bg: None });
        assert_eq!(canvas.cell(2, 0), Cell { glyph: '▀', fg: Some(RED), bg: Some(BLUE) });
        assert_eq!(canvas.cell(3, 0), Cell { glyph: '█', fg: Some(RED), bg: None });
    }

    #[test]
    fn test_axis_cross_at_origin() {
        let canvas = Canvas::new(5, 3);
        assert_eq!(canvas.to_plain_lines(), vec!["  │  ", "──┼──", "  │  "]);
        assert_eq!(canvas.cell(0, 0).fg, None);
        assert_eq!(canvas.cell(2, 0).fg, Some(AXIS_COLOR));
    }

    #[test]
    fn test_discs_cover_axis() {
        let mut canvas = Canvas::new(5, 3).with_scale(1.0);
        let (w, h) = canvas.surface_size();
        canvas.draw_disc(w / 2.0, h / 2.0, 0.6, RED);
        assert_ne!(canvas.cell(2, 1).glyph, '┼');
    }

    #[test]
    fn test_resize_blanks() {
        let mut canvas = Canvas::new(10, 5).with_scale(1.0);
        canvas.draw_disc(5.0, 5.0, 3.0, RED);
        canvas.resize(20, 8);
        assert_eq!((canvas.cols(), canvas.rows()), (20, 8));
        assert_eq!(canvas.filled_pixels(), 0);

        canvas.resize(0, 0);
        assert_eq!((canvas.cols(), canvas.rows()), (1, 1));
    }

    #[test]
    fn test_render_emits_every_row() {
        let mut canvas = Canvas::new(6, 3);
        canvas.draw_disc(24.0, 24.0, 8.0, RED);
        let mut out = Vec::new();
        canvas.render(&mut out, 0).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\u{1b}[38;2;255;0;0m"));
        assert!(text.contains('┼') || text.contains('█') || text.contains('▀'));
    }
}
