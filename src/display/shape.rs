//! Structural sniffing of untyped frame data.
//!
//! Frame data that arrives as nested lists (for example from a JSON file)
//! carries no tag saying whether it is a flat or a grid frame, or a single
//! frame or an animation. [`classify`] works it out by following the first
//! element of every level and looking at the trailing dimensions.

use super::{HEIGHT, PIXELS, WIDTH};
use crate::error::FrameError;
use serde_json::Value;

/// Pixel arrangement of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// 64 pixels in one row-major list.
    Flat,
    /// Eight lists of eight pixels.
    Grid,
}

/// What [`classify`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// More than one frame (a list of frames).
    pub animated: bool,
    /// Layout of each frame.
    pub layout: Layout,
}

/// Lengths of the first element at each nesting level.
pub fn dimensions(value: &Value) -> Vec<usize> {
    let mut dims = Vec::new();
    let mut current = value;
    while let Some(items) = current.as_array() {
        dims.push(items.len());
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    dims
}

/// Classify nested lists as a flat or grid frame, single or animated.
///
/// Trailing dimensions `[8, 8, 3]` mean a grid frame and `[64, 3]` a flat
/// one; one extra leading level makes it an animation.
///
/// # Errors
///
/// Returns [`FrameError::UnrecognisedShape`] for any other nesting.
pub fn classify(value: &Value) -> Result<Shape, FrameError> {
    let dims = dimensions(value);
    let unrecognised = || FrameError::UnrecognisedShape { dims: dims.clone() };

    if dims.ends_with(&[HEIGHT, WIDTH, 3]) {
        return match dims.len() {
            3 => Ok(Shape { animated: false, layout: Layout::Grid }),
            4 => Ok(Shape { animated: true, layout: Layout::Grid }),
            _ => Err(unrecognised()),
        };
    }
    if dims.ends_with(&[PIXELS, 3]) {
        return match dims.len() {
            2 => Ok(Shape { animated: false, layout: Layout::Flat }),
            3 => Ok(Shape { animated: true, layout: Layout::Flat }),
            _ => Err(unrecognised()),
        };
    }
    Err(unrecognised())
}
