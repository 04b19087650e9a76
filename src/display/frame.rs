//! Typed frame data for the 8x8 matrix.

use super::shape::{self, Layout, Shape};
use super::{HEIGHT, PIXELS, WIDTH};
use crate::error::FrameError;
use serde_json::Value;

/// One RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// All channels off.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Build a pixel from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Each channel halved, used for trails.
    pub const fn half(self) -> Self {
        Self::new(self.r / 2, self.g / 2, self.b / 2)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// A full 8x8 frame in one of the two layouts the display accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// 64 pixels, row-major, index 0 at the top-left.
    Flat([Rgb; PIXELS]),
    /// Eight rows of eight pixels, `grid[y][x]`.
    Grid([[Rgb; WIDTH]; HEIGHT]),
}

impl Frame {
    /// A flat frame with every pixel set to `colour`.
    pub fn filled(colour: Rgb) -> Self {
        Self::Flat([colour; PIXELS])
    }

    /// A grid frame with every pixel set to `colour`.
    pub fn filled_grid(colour: Rgb) -> Self {
        Self::Grid([[colour; WIDTH]; HEIGHT])
    }

    /// Layout this frame was built with.
    pub fn layout(&self) -> Layout {
        match self {
            Self::Flat(_) => Layout::Flat,
            Self::Grid(_) => Layout::Grid,
        }
    }

    /// Pixels in row-major order regardless of layout.
    pub fn pixels(&self) -> [Rgb; PIXELS] {
        match self {
            Self::Flat(pixels) => *pixels,
            Self::Grid(rows) => {
                let mut pixels = [Rgb::BLACK; PIXELS];
                for (y, row) in rows.iter().enumerate() {
                    pixels[y * WIDTH..(y + 1) * WIDTH].copy_from_slice(row);
                }
                pixels
            }
        }
    }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }
        Some(match self {
            Self::Flat(pixels) => pixels[y * WIDTH + x],
            Self::Grid(rows) => rows[y][x],
        })
    }
}

/// One or more frames shown as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Burst {
    /// A static image.
    Single(Frame),
    /// Frames cycled at the refresh rate.
    Animation(Vec<Frame>),
}

impl Burst {
    /// Build an animation.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::EmptyAnimation`] when `frames` is empty.
    pub fn animation(frames: Vec<Frame>) -> Result<Self, FrameError> {
        if frames.is_empty() {
            return Err(FrameError::EmptyAnimation);
        }
        Ok(Self::Animation(frames))
    }

    /// Frames in display order.
    pub fn frames(&self) -> &[Frame] {
        match self {
            Self::Single(frame) => std::slice::from_ref(frame),
            Self::Animation(frames) => frames,
        }
    }

    /// Shape descriptor; the layout is taken from the first frame.
    pub fn shape(&self) -> Shape {
        let layout = self
            .frames()
            .first()
            .map(Frame::layout)
            .unwrap_or(Layout::Flat);
        Shape {
            animated: matches!(self, Self::Animation(_)),
            layout,
        }
    }

    /// Parse untyped nested lists into a burst.
    ///
    /// The shape is sniffed with [`shape::classify`], then every row, pixel
    /// and channel is checked against it.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] describing the first problem found.
    pub fn from_json(value: &Value) -> Result<Self, FrameError> {
        let shape = shape::classify(value)?;
        if shape.animated {
            let items = as_list(value, "", None)?;
            let frames = items
                .iter()
                .enumerate()
                .map(|(i, item)| parse_frame(item, shape.layout, &format!("[{i}]")))
                .collect::<Result<Vec<_>, _>>()?;
            Self::animation(frames)
        } else {
            parse_frame(value, shape.layout, "").map(Self::Single)
        }
    }
}

impl From<Frame> for Burst {
    fn from(frame: Frame) -> Self {
        Self::Single(frame)
    }
}

fn parse_frame(value: &Value, layout: Layout, path: &str) -> Result<Frame, FrameError> {
    match layout {
        Layout::Flat => {
            let cells = as_list(value, path, Some(PIXELS))?;
            let mut pixels = [Rgb::BLACK; PIXELS];
            for (i, cell) in cells.iter().enumerate() {
                pixels[i] = parse_pixel(cell, &format!("{path}[{i}]"))?;
            }
            Ok(Frame::Flat(pixels))
        }
        Layout::Grid => {
            let rows = as_list(value, path, Some(HEIGHT))?;
            let mut grid = [[Rgb::BLACK; WIDTH]; HEIGHT];
            for (y, row) in rows.iter().enumerate() {
                let row_path = format!("{path}[{y}]");
                let cells = as_list(row, &row_path, Some(WIDTH))?;
                for (x, cell) in cells.iter().enumerate() {
                    grid[y][x] = parse_pixel(cell, &format!("{row_path}[{x}]"))?;
                }
            }
            Ok(Frame::Grid(grid))
        }
    }
}

fn parse_pixel(value: &Value, path: &str) -> Result<Rgb, FrameError> {
    let channels = as_list(value, path, Some(3))?;
    let mut rgb = [0u8; 3];
    for (c, channel) in channels.iter().enumerate() {
        let channel_path = format!("{path}[{c}]");
        let n = channel.as_i64().ok_or_else(|| FrameError::Malformed {
            path: channel_path.clone(),
            reason: format!("expected an integer, found {channel}"),
        })?;
        rgb[c] = u8::try_from(n).map_err(|_| FrameError::ChannelOutOfRange {
            path: channel_path,
            value: n,
        })?;
    }
    Ok(Rgb::from(rgb))
}

fn as_list<'a>(
    value: &'a Value,
    path: &str,
    len: Option<usize>,
) -> Result<&'a Vec<Value>, FrameError> {
    let path = if path.is_empty() { "root" } else { path };
    let items = value.as_array().ok_or_else(|| FrameError::Malformed {
        path: path.to_owned(),
        reason: "expected a list".to_owned(),
    })?;
    if let Some(expected) = len {
        if items.len() != expected {
            return Err(FrameError::Malformed {
                path: path.to_owned(),
                reason: format!("expected {expected} elements, found {}", items.len()),
            });
        }
    }
    Ok(items)
}
