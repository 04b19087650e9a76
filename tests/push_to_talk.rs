//! Integration tests: joystick recording handed to a consumer task.

use sensevox::Slot;
use sensevox::audio::{CaptureSource, PcmBuffer, PushToTalk};
use sensevox::dialogue::{Action, Direction, StickEvent, StickHandler};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Capture source whose samples are pushed by the test.
struct ScriptedMic {
    feed: Arc<Mutex<Vec<i16>>>,
}

impl CaptureSource for ScriptedMic {
    fn open(&mut self) -> sensevox::Result<()> {
        Ok(())
    }

    fn drain(&mut self) -> sensevox::Result<Vec<i16>> {
        Ok(std::mem::take(&mut *self.feed.lock().expect("feed lock")))
    }

    fn close(&mut self) -> sensevox::Result<()> {
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }
}

fn up(action: Action) -> StickEvent {
    StickEvent::new(action, Direction::Up)
}

#[tokio::test]
async fn recordings_reach_consumer_in_order() {
    let feed = Arc::new(Mutex::new(Vec::new()));
    let utterances: Slot<PcmBuffer> = Slot::new();
    let mut stick = StickHandler::new(
        PushToTalk::new(ScriptedMic {
            feed: Arc::clone(&feed),
        }),
        utterances.clone(),
    );

    let cancel = CancellationToken::new();
    let consumer = {
        let utterances = utterances.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut got = Vec::new();
            while let Some(pcm) = utterances.consume(&cancel).await {
                got.push(pcm.into_samples());
            }
            got
        })
    };

    for take in 1..=3i16 {
        // Wait until the previous recording has been picked up.
        while utterances.is_pending() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        stick.handle(up(Action::Pressed)).expect("press");
        feed.lock().expect("feed lock").extend([take, take]);
        stick.handle(up(Action::Held)).expect("hold");
        feed.lock().expect("feed lock").push(-take);
        stick.handle(up(Action::Released)).expect("release");
    }
    while utterances.is_pending() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    cancel.cancel();

    let got = consumer.await.expect("consumer task");
    assert_eq!(got, vec![vec![1, 1, -1], vec![2, 2, -2], vec![3, 3, -3]]);
}

#[test]
fn pending_recording_blocks_new_ones() {
    let feed = Arc::new(Mutex::new(Vec::new()));
    let utterances: Slot<PcmBuffer> = Slot::new();
    let mut stick = StickHandler::new(
        PushToTalk::new(ScriptedMic {
            feed: Arc::clone(&feed),
        }),
        utterances.clone(),
    );
    let recording = stick.recording_indicator();

    stick.handle(up(Action::Pressed)).expect("press");
    feed.lock().expect("feed lock").push(5);
    stick.handle(up(Action::Released)).expect("release");

    stick.handle(up(Action::Pressed)).expect("press while pending");
    assert!(!recording.load(std::sync::atomic::Ordering::Acquire));

    let pcm = utterances.poll_and_consume().expect("first recording");
    assert_eq!(pcm.samples(), &[5]);
    assert_eq!(pcm.sample_rate(), 16_000);
}
