//! Idle progress dial drawn in the lower-right quadrant of the matrix.

use super::frame::Rgb;
use super::matrix::Matrix;
use crate::error::Result;

/// Ring positions relative to the dial corner, clockwise from the top.
const RING: [(usize, usize); 8] = [
    (1, 0),
    (2, 0),
    (3, 1),
    (3, 2),
    (2, 3),
    (1, 3),
    (0, 2),
    (0, 1),
];

/// Top-left corner of the dial on the matrix.
pub const CORNER: (usize, usize) = (4, 4);

/// What the dial is signalling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialMode {
    /// Push-to-talk capture in progress.
    Recording,
    /// Waiting; `replied` is whether the last turn produced a reply.
    Idle { replied: bool },
    /// Waiting in special mode.
    Special { replied: bool },
}

impl DialMode {
    /// Head and trail colours for this mode.
    pub fn colours(self) -> (Rgb, Rgb) {
        match self {
            Self::Recording => (Rgb::new(255, 0, 0), Rgb::new(127, 0, 0)),
            Self::Idle { replied: true } => (Rgb::new(0, 255, 0), Rgb::new(0, 127, 0)),
            Self::Idle { replied: false } => (Rgb::new(255, 255, 255), Rgb::new(127, 127, 127)),
            Self::Special { replied: true } => (Rgb::new(231, 219, 116), Rgb::new(114, 109, 58)),
            Self::Special { replied: false } => (Rgb::new(159, 0, 255), Rgb::new(79, 0, 127)),
        }
    }
}

/// A three-pixel comet running around an eight-pixel ring.
#[derive(Debug, Clone, Default)]
pub struct SpinDial {
    position: usize,
}

impl SpinDial {
    /// Dial with the head at the first ring position.
    pub fn new() -> Self {
        Self::default()
    }

    fn ring(&self, back: usize) -> (usize, usize) {
        let (dx, dy) = RING[(self.position + RING.len() - back) % RING.len()];
        (CORNER.0 + dx, CORNER.1 + dy)
    }

    /// Head, trail and cleared-tail pixels for the current position.
    pub fn pixels(&self, mode: DialMode) -> [((usize, usize), Rgb); 3] {
        let (head, trail) = mode.colours();
        [
            (self.ring(0), head),
            (self.ring(1), trail),
            (self.ring(2), Rgb::BLACK),
        ]
    }

    /// Draw the current position and advance by one.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub fn step(&mut self, matrix: &mut dyn Matrix, mode: DialMode) -> Result<()> {
        for ((x, y), colour) in self.pixels(mode) {
            matrix.set_pixel(x, y, colour)?;
        }
        self.position = (self.position + 1) % RING.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::display::TerminalMatrix;
    use crate::display::WIDTH;

    #[test]
    fn first_step_wraps_trail_backwards() {
        let dial = SpinDial::new();
        let px = dial.pixels(DialMode::Recording);
        assert_eq!(px[0], ((5, 4), Rgb::new(255, 0, 0)));
        assert_eq!(px[1], ((4, 5), Rgb::new(127, 0, 0)));
        assert_eq!(px[2], ((4, 6), Rgb::BLACK));
    }

    #[test]
    fn full_turn_returns_to_start() {
        let mut m = TerminalMatrix::new(Vec::new());
        let mut dial = SpinDial::new();
        for _ in 0..8 {
            dial.step(&mut m, DialMode::Idle { replied: false }).unwrap();
        }
        assert_eq!(dial.position, 0);
    }

    #[test]
    fn step_leaves_head_and_trail_lit() {
        let mut m = TerminalMatrix::new(Vec::new());
        let mut dial = SpinDial::new();
        dial.step(&mut m, DialMode::Idle { replied: true }).unwrap();
        dial.step(&mut m, DialMode::Idle { replied: true }).unwrap();
        // Head now at (6, 4), trail at (5, 4).
        assert_eq!(m.pixels()[4 * WIDTH + 6], Rgb::new(0, 255, 0));
        assert_eq!(m.pixels()[4 * WIDTH + 5], Rgb::new(0, 127, 0));
        let lit = m.pixels().iter().filter(|p| **p != Rgb::BLACK).count();
        assert_eq!(lit, 2);
    }

    #[test]
    fn special_mode_colours() {
        assert_eq!(DialMode::Special { replied: false }.colours().0, Rgb::new(159, 0, 255));
        assert_eq!(DialMode::Special { replied: true }.colours().0, Rgb::new(231, 219, 116));
    }
}
