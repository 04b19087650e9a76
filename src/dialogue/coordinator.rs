//! The dialogue loop: consumer side of the utterance handoff.

use super::collaborators::{Collaborators, Transcriber, Visual};
use super::commands::{ClipLibrary, CommandParser};
use crate::config::SenseConfig;
use crate::audio::{AudioSink, PcmBuffer};
use crate::display::dial::{DialMode, SpinDial};
use crate::display::handler::{SharedMatrix, try_with_matrix};
use crate::display::{DisplayHandle, Rgb, palette};
use crate::error::{Result, SenseError};
use crate::handoff::Slot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A playback device shared with blocking playback tasks.
pub type SharedSink = Arc<Mutex<dyn AudioSink>>;

/// Wrap a sink for sharing.
pub fn shared_sink<S: AudioSink + 'static>(sink: S) -> SharedSink {
    Arc::new(Mutex::new(sink))
}

/// Waits for recorded utterances and answers them.
///
/// While idle it spins the progress dial on the matrix.
pub struct DialogueLoop {
    utterances: Slot<PcmBuffer>,
    transcriber: Arc<dyn Transcriber>,
    parser: CommandParser,
    sink: SharedSink,
    display: DisplayHandle,
    matrix: SharedMatrix,
    recording: Arc<AtomicBool>,
    text_colour: Rgb,
    dial_interval: Duration,
}

impl DialogueLoop {
    /// Create a loop consuming `utterances`.
    pub fn new(
        utterances: Slot<PcmBuffer>,
        transcriber: Arc<dyn Transcriber>,
        parser: CommandParser,
        sink: SharedSink,
        display: DisplayHandle,
        matrix: SharedMatrix,
    ) -> Self {
        Self {
            utterances,
            transcriber,
            parser,
            sink,
            display,
            matrix,
            recording: Arc::new(AtomicBool::new(false)),
            text_colour: Rgb::new(255, 255, 255),
            dial_interval: Duration::from_millis(100),
        }
    }

    /// Build a loop from configuration.
    ///
    /// Clips come from `dialogue.clip_dir`, the dial ticks every
    /// `display.dial_interval_ms`, reply text uses `display.text_colour`
    /// and speech not at `audio.speech_sample_rate` is reported.
    pub fn from_config(
        config: &SenseConfig,
        utterances: Slot<PcmBuffer>,
        collaborators: Collaborators,
        sink: SharedSink,
        display: DisplayHandle,
        matrix: SharedMatrix,
    ) -> Self {
        let parser = CommandParser::new(
            collaborators.responder,
            collaborators.synthesizer,
            ClipLibrary::new(&config.dialogue.clip_dir),
        )
        .with_speech_rate(config.audio.speech_sample_rate);
        let text_colour = palette::named(&config.display.text_colour).unwrap_or_else(|| {
            warn!(colour = %config.display.text_colour, "unknown text colour, using white");
            Rgb::new(255, 255, 255)
        });

        Self::new(
            utterances,
            collaborators.transcriber,
            parser,
            sink,
            display,
            matrix,
        )
        .with_text_colour(text_colour)
        .with_dial_interval(config.display.dial_interval())
    }

    /// Show the dial in recording colours while this flag is set.
    pub fn with_recording_indicator(mut self, recording: Arc<AtomicBool>) -> Self {
        self.recording = recording;
        self
    }

    /// Colour for scrolled reply text.
    pub fn with_text_colour(mut self, colour: Rgb) -> Self {
        self.text_colour = colour;
        self
    }

    /// How often the dial advances while idle.
    pub fn with_dial_interval(mut self, interval: Duration) -> Self {
        self.dial_interval = interval;
        self
    }

    fn dial_mode(&self) -> DialMode {
        let state = self.parser.state();
        if self.recording.load(Ordering::Acquire) {
            DialMode::Recording
        } else if state.special {
            DialMode::Special {
                replied: state.replied,
            }
        } else {
            DialMode::Idle {
                replied: state.replied,
            }
        }
    }

    /// Run until `cancel` fires.
    ///
    /// A failed turn is logged and the loop waits for the next utterance.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("dialogue loop started");
        let mut dial = SpinDial::new();

        loop {
            let utterance = tokio::select! {
                _ = cancel.cancelled() => break,
                utterance = self.utterances.consume_timeout(self.dial_interval) => utterance,
            };

            match utterance {
                Some(pcm) => {
                    if let Err(e) = self.turn(pcm).await {
                        warn!("dialogue turn failed: {e}");
                    }
                }
                None => {
                    let mode = self.dial_mode();
                    match try_with_matrix(&self.matrix, |m| dial.step(m, mode)) {
                        Ok(Some(())) => {}
                        Ok(None) => debug!("matrix busy, dial step skipped"),
                        Err(e) => debug!("dial step failed: {e}"),
                    }
                }
            }
        }

        info!("dialogue loop stopped");
    }

    /// Answer one utterance.
    ///
    /// # Errors
    ///
    /// Returns collaborator or playback errors.
    pub async fn turn(&mut self, pcm: PcmBuffer) -> Result<()> {
        let Some(transcript) = self.transcriber.transcribe(&pcm).await? else {
            info!("nothing recognised");
            return Ok(());
        };
        info!(%transcript, "user command");

        let reply = self.parser.parse(&transcript).await?;
        if let Some(text) = &reply.text {
            info!(response = %text, "response");
        }

        if let Some(speech) = reply.speech {
            let sink = Arc::clone(&self.sink);
            tokio::task::spawn_blocking(move || {
                let mut sink = sink
                    .lock()
                    .map_err(|e| SenseError::Audio(format!("sink lock poisoned: {e}")))?;
                sink.play(&speech)
            })
            .await
            .map_err(|e| SenseError::Audio(format!("playback task failed: {e}")))??;
        }

        match reply.visual {
            Some(Visual::Text(text)) => {
                self.display.show_text(text, self.text_colour);
            }
            Some(Visual::Burst(burst)) => {
                self.display.show(burst);
            }
            None => {}
        }
        Ok(())
    }
}
