//! sensevox: push-to-talk voice assistant for an 8x8 LED matrix board.
//!
//! Joystick presses record an utterance, a dialogue loop transcribes it,
//! asks a responder for a reply, plays the reply and shows it on the LED
//! matrix:
//! Joystick → Recorder → Slot → Dialogue loop → Speaker / Slot → Display
//!
//! # Architecture
//!
//! Every hand-off between an asynchronous producer (a device callback) and
//! a consumer loop goes through [`handoff::Slot`], a single-item buffer
//! whose occupancy is encoded by a pair of ready/served flags:
//! - **Audio**: finished recordings from the joystick callback to the dialogue loop
//! - **Display**: frame bursts and scrolled text to the display handler
//!
//! Speech-to-text, text-to-speech, the chat responder and the LED driver are
//! collaborators behind traits.

pub mod audio;
pub mod config;
pub mod dialogue;
pub mod display;
pub mod error;
pub mod handoff;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::SenseConfig;
pub use error::{FrameError, Result, SenseError};
pub use handoff::{Publish, Slot, SlotState};
