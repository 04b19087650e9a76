//! LED matrix drivers.

use super::frame::{Burst, Frame, Rgb};
use super::{HEIGHT, PIXELS, WIDTH};
use crate::error::{Result, SenseError};
use std::io::Write;
use std::time::Duration;
use tokio::time::Instant;

/// An 8x8 RGB LED matrix.
///
/// Coordinates are column `x` and row `y`, both `0..8`, origin top-left.
pub trait Matrix: Send {
    /// Set one pixel.
    fn set_pixel(&mut self, x: usize, y: usize, colour: Rgb) -> Result<()>;

    /// Replace the whole frame, row-major.
    fn set_pixels(&mut self, pixels: &[Rgb; PIXELS]) -> Result<()>;

    /// Scroll `text` across the matrix once. Blocks until done.
    fn show_message(&mut self, text: &str, colour: Rgb) -> Result<()>;

    /// Turn every pixel off.
    fn clear(&mut self) -> Result<()> {
        self.set_pixels(&[Rgb::BLACK; PIXELS])
    }
}

/// Draw one frame.
///
/// # Errors
///
/// Propagates driver errors.
pub fn render_frame(matrix: &mut dyn Matrix, frame: &Frame) -> Result<()> {
    matrix.set_pixels(&frame.pixels())
}

/// Play every frame of `burst` once, `interval` apart.
///
/// Time spent drawing is taken off the wait, so frames start on a steady
/// cadence as long as drawing is faster than `interval`.
///
/// # Errors
///
/// Propagates driver errors.
pub async fn play_burst(matrix: &mut dyn Matrix, burst: &Burst, interval: Duration) -> Result<()> {
    let mut started = Instant::now();
    for frame in burst.frames() {
        render_frame(matrix, frame)?;
        tokio::time::sleep(interval.saturating_sub(started.elapsed())).await;
        started = Instant::now();
    }
    Ok(())
}

/// Matrix emulator that draws to a terminal with ANSI truecolour blocks.
pub struct TerminalMatrix<W: Write + Send> {
    out: W,
    pixels: [Rgb; PIXELS],
    drawn: bool,
}

impl TerminalMatrix<std::io::Stdout> {
    /// Draw to stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalMatrix<W> {
    /// Draw to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            pixels: [Rgb::BLACK; PIXELS],
            drawn: false,
        }
    }

    /// Current framebuffer contents.
    pub fn pixels(&self) -> &[Rgb; PIXELS] {
        &self.pixels
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self) -> Result<()> {
        let mut buf = String::new();
        if self.drawn {
            // Move back over the previous frame.
            buf.push_str(&format!("\x1b[{HEIGHT}A"));
        }
        for row in self.pixels.chunks_exact(WIDTH) {
            for p in row {
                buf.push_str(&format!("\x1b[38;2;{};{};{}m██", p.r, p.g, p.b));
            }
            buf.push_str("\x1b[0m\n");
        }
        self.out
            .write_all(buf.as_bytes())
            .and_then(|()| self.out.flush())
            .map_err(|e| SenseError::Display(format!("terminal write failed: {e}")))?;
        self.drawn = true;
        Ok(())
    }
}

impl<W: Write + Send> Matrix for TerminalMatrix<W> {
    fn set_pixel(&mut self, x: usize, y: usize, colour: Rgb) -> Result<()> {
        if x >= WIDTH || y >= HEIGHT {
            return Err(SenseError::Display(format!(
                "pixel ({x}, {y}) is outside the {WIDTH}x{HEIGHT} matrix"
            )));
        }
        self.pixels[y * WIDTH + x] = colour;
        self.redraw()
    }

    fn set_pixels(&mut self, pixels: &[Rgb; PIXELS]) -> Result<()> {
        self.pixels = *pixels;
        self.redraw()
    }

    fn show_message(&mut self, text: &str, colour: Rgb) -> Result<()> {
        writeln!(
            self.out,
            "\x1b[38;2;{};{};{}m{text}\x1b[0m",
            colour.r, colour.g, colour.b
        )
        .map_err(|e| SenseError::Display(format!("terminal write failed: {e}")))?;
        // Text scrolls the terminal; the next frame starts below it.
        self.drawn = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn set_pixel_updates_framebuffer() {
        let mut m = TerminalMatrix::new(Vec::new());
        m.set_pixel(3, 1, Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(m.pixels()[WIDTH + 3], Rgb::new(1, 2, 3));
    }

    #[test]
    fn out_of_bounds_pixel_is_an_error() {
        let mut m = TerminalMatrix::new(Vec::new());
        assert!(m.set_pixel(8, 0, Rgb::BLACK).is_err());
        assert!(m.set_pixel(0, 8, Rgb::BLACK).is_err());
    }

    #[test]
    fn second_frame_moves_cursor_back() {
        let mut m = TerminalMatrix::new(Vec::new());
        m.set_pixels(&[Rgb::BLACK; PIXELS]).unwrap();
        m.set_pixels(&[Rgb::new(255, 0, 0); PIXELS]).unwrap();
        let out = String::from_utf8(m.into_inner()).unwrap();
        assert_eq!(out.matches("\x1b[8A").count(), 1);
        assert!(out.contains("\x1b[38;2;255;0;0m"));
        assert_eq!(out.lines().count(), 2 * HEIGHT);
    }

    #[test]
    fn message_is_written_in_colour() {
        let mut m = TerminalMatrix::new(Vec::new());
        m.show_message("HKU", Rgb::new(0, 255, 0)).unwrap();
        let out = String::from_utf8(m.into_inner()).unwrap();
        assert!(out.contains("\x1b[38;2;0;255;0mHKU"));
    }

    #[test]
    fn clear_blanks_every_pixel() {
        let mut m = TerminalMatrix::new(Vec::new());
        m.set_pixels(&[Rgb::new(9, 9, 9); PIXELS]).unwrap();
        m.clear().unwrap();
        assert!(m.pixels().iter().all(|p| *p == Rgb::BLACK));
    }

    #[tokio::test(start_paused = true)]
    async fn play_burst_draws_each_frame_once() {
        let mut m = TerminalMatrix::new(Vec::new());
        let burst = Burst::Animation(vec![
            Frame::filled(Rgb::new(255, 0, 0)),
            Frame::filled(Rgb::new(0, 255, 0)),
            Frame::filled(Rgb::new(0, 0, 255)),
        ]);
        let start = Instant::now();
        play_burst(&mut m, &burst, Duration::from_secs(1)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(m.pixels()[0], Rgb::new(0, 0, 255));
    }
}
