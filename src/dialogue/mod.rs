//! Push-to-talk dialogue: joystick producer, command parsing and the
//! consumer loop that answers each utterance.

pub mod collaborators;
pub mod commands;
pub mod coordinator;
pub mod stick;

pub use collaborators::{Collaborators, Reply, Responder, Synthesizer, Transcriber, Visual};
pub use commands::{ClipLibrary, CommandParser, ModeState, Spell};
pub use coordinator::{DialogueLoop, SharedSink, shared_sink};
pub use stick::{Action, Direction, StickEvent, StickHandler};
