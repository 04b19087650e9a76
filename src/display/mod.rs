//! LED matrix output: frame types, shape sniffing, palette, drivers and the
//! refresh loop.

pub mod dial;
pub mod frame;
pub mod handler;
pub mod matrix;
pub mod palette;
pub mod shape;

pub use frame::{Burst, Frame, Rgb};
pub use handler::{DisplayHandle, DisplayHandler, DisplayRequest};
pub use matrix::{Matrix, TerminalMatrix};
pub use shape::{Layout, Shape};

/// Matrix width in pixels.
pub const WIDTH: usize = 8;
/// Matrix height in pixels.
pub const HEIGHT: usize = 8;
/// Pixels per frame.
pub const PIXELS: usize = WIDTH * HEIGHT;
