//! Display refresh loop fed through a single-slot handoff.
//!
//! [`DisplayHandler`] is the consumer: it redraws the current burst at a
//! fixed refresh rate and switches to a new one as soon as a producer
//! publishes it through a [`DisplayHandle`]. A request published while
//! another is still unread replaces it.

use super::frame::{Burst, Frame, Rgb};
use super::matrix::{Matrix, render_frame};
use crate::error::{Result, SenseError};
use crate::handoff::{Publish, Slot};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A matrix shared between the display handler and other writers (the dial).
pub type SharedMatrix = Arc<Mutex<dyn Matrix>>;

/// Wrap a driver for sharing.
pub fn shared<M: Matrix + 'static>(matrix: M) -> SharedMatrix {
    Arc::new(Mutex::new(matrix))
}

/// Run `f` with the matrix locked.
///
/// # Errors
///
/// Returns [`SenseError::Display`] if the lock is poisoned, otherwise
/// whatever `f` returns.
pub fn with_matrix<T>(
    matrix: &SharedMatrix,
    f: impl FnOnce(&mut dyn Matrix) -> Result<T>,
) -> Result<T> {
    let mut guard = matrix
        .lock()
        .map_err(|e| SenseError::Display(format!("matrix lock poisoned: {e}")))?;
    f(&mut *guard)
}

/// Like [`with_matrix`], but returns `Ok(None)` without waiting when
/// another writer holds the matrix.
///
/// # Errors
///
/// Returns [`SenseError::Display`] if the lock is poisoned, otherwise
/// whatever `f` returns.
pub fn try_with_matrix<T>(
    matrix: &SharedMatrix,
    f: impl FnOnce(&mut dyn Matrix) -> Result<T>,
) -> Result<Option<T>> {
    let mut guard = match matrix.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::WouldBlock) => return Ok(None),
        Err(TryLockError::Poisoned(e)) => {
            return Err(SenseError::Display(format!("matrix lock poisoned: {e}")));
        }
    };
    f(&mut *guard).map(Some)
}

/// Scroll `text` on a blocking thread so the runtime keeps polling other
/// tasks while the driver is busy.
async fn scroll(matrix: &SharedMatrix, text: String, colour: Rgb) -> Result<()> {
    let matrix = Arc::clone(matrix);
    tokio::task::spawn_blocking(move || with_matrix(&matrix, |m| m.show_message(&text, colour)))
        .await
        .map_err(|e| SenseError::Display(format!("scroll task failed: {e}")))?
}

/// Something to put on the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayRequest {
    /// Show a frame or loop an animation until the next request.
    Burst(Burst),
    /// Scroll text once, then go dark.
    Text {
        /// Message to scroll.
        text: String,
        /// Text colour.
        colour: Rgb,
    },
}

/// Producer side of the display handoff.
#[derive(Debug, Clone)]
pub struct DisplayHandle {
    requests: Slot<DisplayRequest>,
}

impl DisplayHandle {
    /// Queue a request, replacing any request not yet picked up.
    ///
    /// Returns `true` when an unread request was replaced.
    pub fn request(&self, request: DisplayRequest) -> bool {
        match self.requests.publish(request) {
            Publish::Stored => false,
            Publish::Replaced(old) => {
                debug!(dropped = ?request_kind(&old), "display request replaced before it was shown");
                true
            }
        }
    }

    /// Show a burst.
    pub fn show(&self, burst: Burst) -> bool {
        self.request(DisplayRequest::Burst(burst))
    }

    /// Scroll text.
    pub fn show_text(&self, text: impl Into<String>, colour: Rgb) -> bool {
        self.request(DisplayRequest::Text {
            text: text.into(),
            colour,
        })
    }

    /// Whether a request is still waiting to be shown.
    pub fn is_pending(&self) -> bool {
        self.requests.is_pending()
    }
}

fn request_kind(request: &DisplayRequest) -> &'static str {
    match request {
        DisplayRequest::Burst(Burst::Single(_)) => "frame",
        DisplayRequest::Burst(Burst::Animation(_)) => "animation",
        DisplayRequest::Text { .. } => "text",
    }
}

fn blank() -> Burst {
    Burst::Single(Frame::filled(Rgb::BLACK))
}

/// Consumer side of the display handoff: the refresh loop.
pub struct DisplayHandler {
    matrix: SharedMatrix,
    requests: Slot<DisplayRequest>,
    interval: Duration,
}

impl DisplayHandler {
    /// Create a handler drawing to `matrix` every `interval`.
    pub fn new(matrix: SharedMatrix, interval: Duration) -> Self {
        Self {
            matrix,
            requests: Slot::new(),
            interval,
        }
    }

    /// A producer handle for this handler.
    pub fn handle(&self) -> DisplayHandle {
        DisplayHandle {
            requests: self.requests.clone(),
        }
    }

    /// The matrix this handler draws to.
    pub fn matrix(&self) -> SharedMatrix {
        Arc::clone(&self.matrix)
    }

    /// Refresh until `cancel` fires, then clear the matrix.
    ///
    /// Starts with a dark frame. Driver errors are logged and the loop
    /// carries on with the next tick.
    ///
    /// # Errors
    ///
    /// Returns an error only if the final clear fails.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        info!(interval_ms = self.interval.as_millis() as u64, "display handler started");

        let mut current = blank();
        let mut index: usize = 0;
        let mut incoming: Option<DisplayRequest> = None;

        while !cancel.is_cancelled() {
            let started = Instant::now();

            if let Some(request) = incoming.take().or_else(|| self.requests.poll_and_consume()) {
                debug!(kind = request_kind(&request), "display request received");
                index = 0;
                current = match request {
                    DisplayRequest::Burst(burst) => burst,
                    DisplayRequest::Text { text, colour } => {
                        if let Err(e) = scroll(&self.matrix, text, colour).await {
                            warn!("failed to scroll text: {e}");
                        }
                        blank()
                    }
                };
            }

            let frames = current.frames();
            if let Some(frame) = frames.get(index % frames.len().max(1)) {
                if let Err(e) = with_matrix(&self.matrix, |m| render_frame(m, frame)) {
                    warn!("failed to draw frame: {e}");
                }
            }
            index = index.wrapping_add(1);

            let remaining = self.interval.saturating_sub(started.elapsed());
            tokio::select! {
                _ = cancel.cancelled() => break,
                request = self.requests.consume_timeout(remaining) => incoming = request,
            }
        }

        with_matrix(&self.matrix, |m| m.clear())?;
        info!("display handler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::display::PIXELS;
    use crate::test_utils::RecordingMatrix;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Driver whose scroll holds the caller for a while, like real hardware.
    struct SlowScroll;

    impl Matrix for SlowScroll {
        fn set_pixel(&mut self, _x: usize, _y: usize, _colour: Rgb) -> Result<()> {
            Ok(())
        }

        fn set_pixels(&mut self, _pixels: &[Rgb; PIXELS]) -> Result<()> {
            Ok(())
        }

        fn show_message(&mut self, _text: &str, _colour: Rgb) -> Result<()> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        }
    }

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);

    #[tokio::test(start_paused = true)]
    async fn animation_cycles_and_clears_on_cancel() {
        let recorder = RecordingMatrix::default();
        let handler = DisplayHandler::new(shared(recorder.clone()), Duration::from_millis(100));
        let handle = handler.handle();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(handler.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.show(Burst::Animation(vec![Frame::filled(RED), Frame::filled_grid(GREEN)]));
        tokio::time::sleep(Duration::from_millis(320)).await;
        cancel.cancel();
        task.await.unwrap().unwrap();

        let firsts = recorder.first_pixels();
        assert_eq!(firsts[..5], [Rgb::BLACK, RED, GREEN, RED, GREEN]);
        assert_eq!(firsts.last(), Some(&Rgb::BLACK));
    }

    #[tokio::test(start_paused = true)]
    async fn text_request_scrolls_then_goes_dark() {
        let recorder = RecordingMatrix::default();
        let handler = DisplayHandler::new(shared(recorder.clone()), Duration::from_millis(100));
        let handle = handler.handle();
        let cancel = CancellationToken::new();

        handle.show_text("HKU", GREEN);
        let task = tokio::spawn(handler.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(150)).await;
        cancel.cancel();
        task.await.unwrap().unwrap();

        assert_eq!(recorder.messages(), vec![("HKU".to_owned(), GREEN)]);
        assert_eq!(recorder.first_pixels()[0], Rgb::BLACK);
    }

    #[test]
    fn unread_request_is_replaced() {
        let handler = DisplayHandler::new(shared(RecordingMatrix::default()), Duration::from_secs(1));
        let handle = handler.handle();
        assert!(!handle.show(Burst::Single(Frame::filled(RED))));
        assert!(handle.show(Burst::Single(Frame::filled(GREEN))));
        assert!(handle.is_pending());
        assert_eq!(
            handler.requests.poll_and_consume(),
            Some(DisplayRequest::Burst(Burst::Single(Frame::filled(GREEN))))
        );
    }

    #[tokio::test]
    async fn slow_scroll_leaves_runtime_free() {
        let matrix = shared(SlowScroll);
        let handler = DisplayHandler::new(Arc::clone(&matrix), Duration::from_millis(20));
        let handle = handler.handle();
        let cancel = CancellationToken::new();

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                while !cancel.is_cancelled() {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        handle.show_text("HELLO", GREEN);
        let task = tokio::spawn(handler.run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Mid-scroll: the matrix is held, other writers back off.
        assert_eq!(try_with_matrix(&matrix, |_| Ok(())).unwrap(), None);
        let during = ticks.load(Ordering::SeqCst);

        cancel.cancel();
        task.await.unwrap().unwrap();
        ticker.await.unwrap();
        assert!(during >= 5, "ticker only ran {during} times during the scroll");
    }

    #[test]
    fn try_with_matrix_runs_when_free() {
        let recorder = RecordingMatrix::default();
        let matrix = shared(recorder.clone());
        let drawn = try_with_matrix(&matrix, |m| m.set_pixel(1, 2, RED)).unwrap();
        assert_eq!(drawn, Some(()));
        assert_eq!(recorder.pixel_writes(), vec![(1, 2, RED)]);
    }
}
