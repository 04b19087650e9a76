//! Error types for sensevox.

/// Problems with frame data handed to the display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Nesting does not end in `[64, 3]` or `[8, 8, 3]`, or is too deep.
    #[error("unrecognised frame shape {dims:?}")]
    UnrecognisedShape {
        /// Lengths seen while walking the first element of each level.
        dims: Vec<usize>,
    },

    /// A row, pixel or channel is not what the shape promised.
    #[error("malformed frame data at {path}: {reason}")]
    Malformed {
        /// Index path to the offending element, e.g. `[2][7][1]`.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A colour channel is an integer outside `0..=255`.
    #[error("colour channel {value} at {path} is outside 0..=255")]
    ChannelOutOfRange {
        /// Index path to the channel.
        path: String,
        /// The value found.
        value: i64,
    },

    /// An animation with no frames.
    #[error("animation has no frames")]
    EmptyAnimation,
}

/// Top-level error type for sensevox.
#[derive(Debug, thiserror::Error)]
pub enum SenseError {
    /// Audio device, stream or clip error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Bad frame data.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// LED matrix driver error.
    #[error("display error: {0}")]
    Display(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Speech-to-text collaborator error.
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech collaborator error.
    #[error("TTS error: {0}")]
    Tts(String),

    /// Chat responder collaborator error.
    #[error("responder error: {0}")]
    Responder(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SenseError>;
