//! Joystick events and the push-to-talk producer.

use crate::audio::{CaptureSource, PcmBuffer, PushToTalk};
use crate::error::Result;
use crate::handoff::Slot;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

/// What the joystick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Pushed in a direction.
    Pressed,
    /// Still pushed; repeats while held.
    Held,
    /// Let go.
    Released,
}

/// Which way the joystick moved. `Middle` is a press on the stick itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Middle,
}

/// One joystick event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickEvent {
    /// What happened.
    pub action: Action,
    /// Which way.
    pub direction: Direction,
}

impl StickEvent {
    /// Build an event.
    pub const fn new(action: Action, direction: Direction) -> Self {
        Self { action, direction }
    }
}

/// Producer side of the utterance handoff.
///
/// Runs in the joystick callback context. Holding the stick up records;
/// letting go publishes the recording for the dialogue loop. While an
/// earlier recording is still waiting to be picked up every event is
/// ignored, so a new recording can never overwrite one in flight.
pub struct StickHandler<S: CaptureSource> {
    recorder: PushToTalk<S>,
    utterances: Slot<PcmBuffer>,
}

impl<S: CaptureSource> StickHandler<S> {
    /// Record with `recorder` and publish into `utterances`.
    pub fn new(recorder: PushToTalk<S>, utterances: Slot<PcmBuffer>) -> Self {
        Self {
            recorder,
            utterances,
        }
    }

    /// Flag that is set while capture is running.
    pub fn recording_indicator(&self) -> Arc<AtomicBool> {
        self.recorder.recording_indicator()
    }

    /// React to one joystick event.
    ///
    /// # Errors
    ///
    /// Returns capture errors from the recorder.
    pub fn handle(&mut self, event: StickEvent) -> Result<()> {
        if event.direction != Direction::Up {
            return Ok(());
        }
        if self.utterances.is_pending() {
            debug!(?event, "previous utterance not consumed yet, ignoring");
            return Ok(());
        }

        match event.action {
            Action::Pressed => self.recorder.start(),
            Action::Held => self.recorder.step(),
            Action::Released => {
                let Some(pcm) = self.recorder.release()? else {
                    debug!("released without any audio");
                    return Ok(());
                };
                info!(
                    samples = pcm.len(),
                    seconds = pcm.duration().as_secs_f32(),
                    "utterance recorded"
                );
                if self.utterances.try_publish(pcm).is_err() {
                    warn!("utterance slot filled concurrently, recording dropped");
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::test_utils::FakeCapture;

    fn up(action: Action) -> StickEvent {
        StickEvent::new(action, Direction::Up)
    }

    #[test]
    fn press_hold_release_publishes_recording() {
        let source = FakeCapture::new(44_100);
        let feed = source.feeder();
        let slot = Slot::new();
        let mut handler = StickHandler::new(PushToTalk::new(source), slot.clone());

        handler.handle(up(Action::Pressed)).unwrap();
        feed.push(&[1, 2]);
        handler.handle(up(Action::Held)).unwrap();
        feed.push(&[3]);
        handler.handle(up(Action::Released)).unwrap();

        let pcm = slot.poll_and_consume().unwrap();
        assert_eq!(pcm.samples(), &[1, 2, 3]);
        assert_eq!(pcm.sample_rate(), 44_100);
    }

    #[test]
    fn other_directions_do_not_record() {
        let source = FakeCapture::new(44_100);
        let slot = Slot::new();
        let mut handler = StickHandler::new(PushToTalk::new(source), slot.clone());
        let indicator = handler.recording_indicator();

        handler
            .handle(StickEvent::new(Action::Pressed, Direction::Left))
            .unwrap();
        assert!(!indicator.load(std::sync::atomic::Ordering::Acquire));
    }

    #[test]
    fn events_ignored_while_utterance_pending() {
        let source = FakeCapture::new(44_100);
        let feed = source.feeder();
        let slot = Slot::new();
        let mut handler = StickHandler::new(PushToTalk::new(source), slot.clone());

        handler.handle(up(Action::Pressed)).unwrap();
        feed.push(&[1]);
        handler.handle(up(Action::Released)).unwrap();
        assert!(slot.is_pending());

        // Second recording attempt while the first is unread.
        feed.push(&[2]);
        handler.handle(up(Action::Pressed)).unwrap();
        handler.handle(up(Action::Released)).unwrap();

        assert_eq!(slot.poll_and_consume().unwrap().samples(), &[1]);
        assert_eq!(slot.poll_and_consume(), None);
    }

    #[test]
    fn release_without_audio_publishes_nothing() {
        let slot = Slot::new();
        let mut handler = StickHandler::new(PushToTalk::new(FakeCapture::new(44_100)), slot.clone());
        handler.handle(up(Action::Pressed)).unwrap();
        handler.handle(up(Action::Released)).unwrap();
        assert!(!slot.is_pending());
    }
}
