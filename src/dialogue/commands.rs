//! Turning a transcript into a reply.
//!
//! Ordinary utterances go to the [`Responder`] and the answer is spoken
//! through the [`Synthesizer`] and scrolled on the matrix. A pass phrase
//! switches on special mode, in which a small table of spoken phrases
//! plays sound clips, lights the matrix, or mutes the audio or the display.

use super::collaborators::{Reply, Responder, Synthesizer, Visual};
use crate::audio::PcmBuffer;
use crate::display::palette;
use crate::display::{Burst, Frame, Rgb};
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const ENABLE_PHRASES: [&str; 3] = ["i am half-blood prince", "i am half blood prince", "alohomora"];

const LEAD_IN_CLIP: &str = "Lead-In_Music.wav";
const WAND_CLIP: &str = "Wand_Swing.wav";
const PRINCE_CLIP: &str = "Half-Blood_Prince.wav";
const SECRET_CLIPS: [&str; 2] = ["Out-of-Other_Business-I.wav", "Out-of-Other_Business-II.wav"];

const SOLEM_SEQUENCE: [&str; 9] = [
    "lgrey", "white", "white", "white", "white", "white", "white", "lgrey", "white",
];

/// Phrases recognised in special mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spell {
    Sectumsempra,
    RevealSecret,
    LumosMaxima,
    LumosSolem,
    Incendio,
    Nox,
    Silencio,
    Obliviate,
}

impl Spell {
    /// Match a normalised transcript.
    pub fn parse(normalised: &str) -> Option<Self> {
        Some(match normalised {
            "sectumsempra" => Self::Sectumsempra,
            "reveal your secret" | "review your secret" => Self::RevealSecret,
            "lumos maxima" => Self::LumosMaxima,
            "lumos solem" => Self::LumosSolem,
            "incendio" => Self::Incendio,
            "nox" | "knox" => Self::Nox,
            "silencio" => Self::Silencio,
            "obliviate" | "alleviate" => Self::Obliviate,
            _ => return None,
        })
    }
}

/// Lower-case and collapse whitespace so transcripts compare reliably.
pub fn normalise(transcript: &str) -> String {
    transcript
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// WAV clips played by special-mode phrases.
#[derive(Debug, Clone)]
pub struct ClipLibrary {
    dir: PathBuf,
}

impl ClipLibrary {
    /// Clips live in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Clip directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load one clip; a missing or broken file is logged and skipped.
    pub fn load(&self, name: &str) -> Option<PcmBuffer> {
        let path = self.dir.join(name);
        match PcmBuffer::load_wav(&path) {
            Ok(pcm) => Some(pcm),
            Err(e) => {
                warn!("skipping clip {}: {e}", path.display());
                None
            }
        }
    }

    /// Load clips and join them end to end. Clips that fail to load or
    /// have a different rate from the first one are skipped.
    pub fn load_joined(&self, names: &[&str]) -> Option<PcmBuffer> {
        let mut joined: Option<PcmBuffer> = None;
        for pcm in names.iter().filter_map(|name| self.load(name)) {
            match joined.as_mut() {
                None => joined = Some(pcm),
                Some(acc) => {
                    if let Err(e) = acc.append(&pcm) {
                        warn!("skipping clip: {e}");
                    }
                }
            }
        }
        joined
    }
}

/// Mode flags carried between turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeState {
    /// Special mode is on.
    pub special: bool,
    /// Speech output is muted.
    pub audio_disabled: bool,
    /// The matrix shows black instead of replies.
    pub visual_disabled: bool,
    /// The last turn produced a reply.
    pub replied: bool,
}

/// Builds a [`Reply`] for each transcript.
pub struct CommandParser {
    responder: Arc<dyn Responder>,
    synthesizer: Arc<dyn Synthesizer>,
    clips: ClipLibrary,
    state: ModeState,
    speech_rate: Option<u32>,
}

impl CommandParser {
    /// Parser backed by the given collaborators and clip directory.
    pub fn new(
        responder: Arc<dyn Responder>,
        synthesizer: Arc<dyn Synthesizer>,
        clips: ClipLibrary,
    ) -> Self {
        Self {
            responder,
            synthesizer,
            clips,
            state: ModeState::default(),
            speech_rate: None,
        }
    }

    /// Warn whenever a clip or synthesized reply is not at `rate` Hz.
    pub fn with_speech_rate(mut self, rate: u32) -> Self {
        self.speech_rate = Some(rate);
        self
    }

    /// Current mode flags.
    pub fn state(&self) -> ModeState {
        self.state
    }

    /// Where clips are loaded from.
    pub fn clips(&self) -> &ClipLibrary {
        &self.clips
    }

    /// Rate speech is expected at, if one was set.
    pub fn speech_rate(&self) -> Option<u32> {
        self.speech_rate
    }

    /// Whether `speech` is at the expected rate. Logs a warning if not.
    pub fn check_rate(&self, speech: &PcmBuffer) -> bool {
        match self.speech_rate {
            Some(expected) if speech.sample_rate() != expected => {
                warn!(
                    expected,
                    actual = speech.sample_rate(),
                    "speech sample rate differs from configuration"
                );
                false
            }
            _ => true,
        }
    }

    /// Build the reply for one transcript and update the mode flags.
    ///
    /// # Errors
    ///
    /// Returns responder or synthesizer errors. Missing clips are not errors.
    pub async fn parse(&mut self, transcript: &str) -> Result<Reply> {
        let normalised = normalise(transcript);

        let mut reply = if ENABLE_PHRASES.contains(&normalised.as_str()) {
            // The chat engine still answers; its text scrolls over the lead-in.
            let answer = self.responder.respond(transcript).await?;
            info!("special mode enabled");
            self.state.special = true;
            Reply {
                speech: self.clips.load(LEAD_IN_CLIP),
                text: Some("Enabling special mode".to_owned()),
                visual: (!answer.trim().is_empty()).then_some(Visual::Text(answer)),
            }
        } else if let Some(spell) = Spell::parse(&normalised).filter(|_| self.state.special) {
            info!(?spell, "special mode command");
            self.cast(spell)
        } else {
            self.converse(transcript).await?
        };

        self.state.replied = !reply.is_empty();
        if let Some(speech) = &reply.speech {
            self.check_rate(speech);
        }

        if self.state.audio_disabled {
            reply.speech = None;
        }
        if self.state.visual_disabled {
            reply.visual = Some(Visual::Burst(Burst::Single(Frame::filled(Rgb::BLACK))));
        }
        Ok(reply)
    }

    async fn converse(&self, transcript: &str) -> Result<Reply> {
        let text = self.responder.respond(transcript).await?;
        if text.trim().is_empty() {
            return Ok(Reply::default());
        }
        let speech = self.synthesizer.synthesize(&text).await?;
        Ok(Reply {
            speech: Some(speech),
            visual: Some(Visual::Text(text.clone())),
            text: Some(text),
        })
    }

    fn cast(&mut self, spell: Spell) -> Reply {
        let filled = |name: &str| {
            Some(Visual::Burst(Burst::Single(Frame::filled(palette::named_or_black(name)))))
        };

        let (speech, visual) = match spell {
            Spell::Sectumsempra => (self.clips.load(PRINCE_CLIP), None),
            Spell::RevealSecret => (self.clips.load_joined(&SECRET_CLIPS), None),
            Spell::LumosMaxima => (self.clips.load(WAND_CLIP), filled("grey")),
            Spell::LumosSolem => {
                let frames = SOLEM_SEQUENCE
                    .iter()
                    .map(|name| Frame::filled(palette::named_or_black(name)))
                    .collect();
                (
                    self.clips.load(WAND_CLIP),
                    Some(Visual::Burst(Burst::Animation(frames))),
                )
            }
            Spell::Incendio => (self.clips.load(WAND_CLIP), filled("red")),
            Spell::Nox => {
                self.state.visual_disabled = true;
                (self.clips.load(WAND_CLIP), None)
            }
            Spell::Silencio => {
                self.state.audio_disabled = true;
                (self.clips.load(WAND_CLIP), None)
            }
            Spell::Obliviate => {
                self.state.special = false;
                (self.clips.load(WAND_CLIP), None)
            }
        };

        Reply {
            speech,
            text: Some("Special mode command triggered".to_owned()),
            visual,
        }
    }
}
