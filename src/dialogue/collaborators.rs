//! External services the dialogue loop talks to.

use crate::audio::PcmBuffer;
use crate::display::Burst;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one utterance. `None` when nothing was recognised.
    async fn transcribe(&self, audio: &PcmBuffer) -> Result<Option<String>>;
}

/// Text-to-speech.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text`. The returned buffer carries the synthesizer's rate.
    async fn synthesize(&self, text: &str) -> Result<PcmBuffer>;
}

/// Chat engine producing a reply to what the user said.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Reply to `utterance`.
    async fn respond(&self, utterance: &str) -> Result<String>;
}

/// The three services a dialogue loop needs.
#[derive(Clone)]
pub struct Collaborators {
    /// Speech-to-text.
    pub transcriber: Arc<dyn Transcriber>,
    /// Chat engine.
    pub responder: Arc<dyn Responder>,
    /// Text-to-speech.
    pub synthesizer: Arc<dyn Synthesizer>,
}

/// What goes on the matrix for a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visual {
    /// Scrolled text.
    Text(String),
    /// A frame or animation.
    Burst(Burst),
}

/// Everything produced for one dialogue turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Audio to play.
    pub speech: Option<PcmBuffer>,
    /// Reply text for logging.
    pub text: Option<String>,
    /// What to show.
    pub visual: Option<Visual>,
}

impl Reply {
    /// Whether the turn produced anything at all.
    pub fn is_empty(&self) -> bool {
        self.speech.is_none() && self.text.is_none() && self.visual.is_none()
    }
}
