//! Push-to-talk recorder.
//!
//! Driven by joystick callbacks: [`start`](PushToTalk::start) on press,
//! [`step`](PushToTalk::step) while held, [`end`](PushToTalk::end) and
//! [`finalise`](PushToTalk::finalise) on release. Every call is a no-op
//! when it arrives in the wrong state, so a stray held or release event
//! without a press does nothing.

use super::capture::CaptureSource;
use super::pcm::PcmBuffer;
use crate::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Accumulates captured audio between a press and a release.
pub struct PushToTalk<S: CaptureSource> {
    source: S,
    recording: Arc<AtomicBool>,
    accumulated: Option<Vec<i16>>,
}

impl<S: CaptureSource> PushToTalk<S> {
    /// Wrap a capture source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            recording: Arc::new(AtomicBool::new(false)),
            accumulated: None,
        }
    }

    /// Whether capture is running.
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }

    /// Shared flag mirroring [`is_recording`](Self::is_recording), for
    /// observers on other threads.
    pub fn recording_indicator(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.recording)
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Open the source. Does nothing if already recording.
    ///
    /// # Errors
    ///
    /// Returns the source's error; the recorder stays idle.
    pub fn start(&mut self) -> Result<()> {
        if self.is_recording() {
            return Ok(());
        }
        self.source.open()?;
        self.recording.store(true, Ordering::Release);
        info!(sample_rate = self.source.sample_rate(), "recording started");
        Ok(())
    }

    /// Move whatever the source has captured into the accumulation.
    /// Does nothing unless recording.
    ///
    /// # Errors
    ///
    /// Returns the source's error.
    pub fn step(&mut self) -> Result<()> {
        if !self.is_recording() {
            return Ok(());
        }
        let samples = self.source.drain()?;
        debug!(samples = samples.len(), "recording step");
        self.accumulated
            .get_or_insert_with(Vec::new)
            .extend_from_slice(&samples);
        Ok(())
    }

    /// Close the source. Does nothing unless recording.
    ///
    /// # Errors
    ///
    /// Returns the source's error; the recorder is idle either way.
    pub fn end(&mut self) -> Result<()> {
        if !self.is_recording() {
            return Ok(());
        }
        self.recording.store(false, Ordering::Release);
        self.source.close()?;
        info!("recording stopped");
        Ok(())
    }

    /// Take the accumulated recording.
    ///
    /// Returns `None` when nothing was captured since the last call.
    pub fn finalise(&mut self) -> Option<PcmBuffer> {
        let samples = self.accumulated.take()?;
        if samples.is_empty() {
            return None;
        }
        Some(PcmBuffer::new(samples, self.source.sample_rate()))
    }

    /// Release sequence: final step, end, finalise.
    ///
    /// # Errors
    ///
    /// Returns the source's error from the step or the close.
    pub fn release(&mut self) -> Result<Option<PcmBuffer>> {
        self.step()?;
        self.end()?;
        Ok(self.finalise())
    }
}
