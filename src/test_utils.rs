//! In-memory doubles for devices, shared by unit tests.

use crate::audio::{AudioSink, CaptureSource, PcmBuffer};
use crate::display::{Matrix, PIXELS, Rgb};
use crate::error::{Result, SenseError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Matrix that records every frame and message.
#[derive(Clone, Default)]
pub struct RecordingMatrix {
    frames: Arc<Mutex<Vec<[Rgb; PIXELS]>>>,
    messages: Arc<Mutex<Vec<(String, Rgb)>>>,
    pixel_writes: Arc<Mutex<Vec<(usize, usize, Rgb)>>>,
}

impl RecordingMatrix {
    /// Every full frame drawn, in order.
    pub fn frames(&self) -> Vec<[Rgb; PIXELS]> {
        self.frames.lock().expect("lock frames").clone()
    }

    /// Top-left pixel of every full frame drawn.
    pub fn first_pixels(&self) -> Vec<Rgb> {
        self.frames().iter().map(|f| f[0]).collect()
    }

    /// Every scrolled message.
    pub fn messages(&self) -> Vec<(String, Rgb)> {
        self.messages.lock().expect("lock messages").clone()
    }

    /// Every single-pixel write.
    pub fn pixel_writes(&self) -> Vec<(usize, usize, Rgb)> {
        self.pixel_writes.lock().expect("lock pixel writes").clone()
    }
}

impl Matrix for RecordingMatrix {
    fn set_pixel(&mut self, x: usize, y: usize, colour: Rgb) -> Result<()> {
        self.pixel_writes
            .lock()
            .expect("lock pixel writes")
            .push((x, y, colour));
        Ok(())
    }

    fn set_pixels(&mut self, pixels: &[Rgb; PIXELS]) -> Result<()> {
        self.frames.lock().expect("lock frames").push(*pixels);
        Ok(())
    }

    fn show_message(&mut self, text: &str, colour: Rgb) -> Result<()> {
        self.messages
            .lock()
            .expect("lock messages")
            .push((text.to_owned(), colour));
        Ok(())
    }
}

/// Pushes samples into a [`FakeCapture`] from the test body.
#[derive(Clone)]
pub struct Feeder(Arc<Mutex<Vec<i16>>>);

impl Feeder {
    /// Make `samples` available to the next drain.
    pub fn push(&self, samples: &[i16]) {
        self.0.lock().expect("lock feed").extend_from_slice(samples);
    }
}

/// Capture source fed by hand.
pub struct FakeCapture {
    sample_rate: u32,
    feed: Arc<Mutex<Vec<i16>>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
    fail_open: AtomicBool,
}

impl FakeCapture {
    /// Idle source reporting `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            feed: Arc::default(),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            fail_open: AtomicBool::new(false),
        }
    }

    /// Handle for pushing samples.
    pub fn feeder(&self) -> Feeder {
        Feeder(Arc::clone(&self.feed))
    }

    /// Make the next `open` fail with an audio error.
    pub fn fail_next_open(&self) {
        self.fail_open.store(true, Ordering::SeqCst);
    }

    /// Successful opens so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Closes so far.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl CaptureSource for FakeCapture {
    fn open(&mut self) -> Result<()> {
        if self.fail_open.swap(false, Ordering::SeqCst) {
            return Err(SenseError::Audio("device busy".into()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn drain(&mut self) -> Result<Vec<i16>> {
        Ok(std::mem::take(&mut *self.feed.lock().expect("lock feed")))
    }

    fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Sink that remembers what it was asked to play.
#[derive(Clone, Default)]
pub struct RecordingSink {
    played: Arc<Mutex<Vec<PcmBuffer>>>,
}

impl RecordingSink {
    /// Every buffer played, in order.
    pub fn played(&self) -> Vec<PcmBuffer> {
        self.played.lock().expect("lock played").clone()
    }
}

impl AudioSink for RecordingSink {
    fn play(&mut self, pcm: &PcmBuffer) -> Result<()> {
        self.played.lock().expect("lock played").push(pcm.clone());
        Ok(())
    }
}
