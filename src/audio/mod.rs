//! Audio capture, playback and PCM buffers via cpal and hound.

pub mod capture;
pub mod pcm;
pub mod playback;
pub mod recorder;

pub use capture::{CaptureSource, CpalCapture};
pub use pcm::PcmBuffer;
pub use playback::{AudioSink, CpalPlayback};
pub use recorder::PushToTalk;

/// Push-to-talk capture rate in Hz.
pub const CAPTURE_SAMPLE_RATE: u32 = 44_100;

/// Rate of synthesized speech and sound clips in Hz.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Samples per capture chunk.
pub const CAPTURE_CHUNK: usize = 4096;
