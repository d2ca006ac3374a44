use std::sync::Mutex;
use std::time::Duration;

use image::RgbImage;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// External frame acquisition. Returns the most recent frame, `None` when
/// no frame is available yet, and `Err` only for unrecoverable capture
/// failure.
pub trait FrameSource: Send {
    fn capture_frame(&mut self) -> anyhow::Result<Option<RgbImage>>;
}

/// Single most-recent-value slot between the capture thread and the
/// control loop. Not a queue: publishing replaces whatever was there, so
/// the consumer always sees the latest frame and intermediate frames are
/// silently dropped when it falls behind. Staleness over backlog.
pub struct FrameSlot {
    slot: Mutex<Option<RgbImage>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn publish(&self, frame: RgbImage) {
        match self.slot.lock() {
            Ok(mut guard) => *guard = Some(frame),
            Err(poisoned) => *poisoned.into_inner() = Some(frame),
        }
    }

    /// Take the latest frame, if any. Never blocks beyond the slot lock.
    pub fn take(&self) -> Option<RgbImage> {
        match self.slot.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

pub const CAPTURE_INTERVAL: Duration = Duration::from_millis(33);

/// Run a frame producer on a dedicated OS thread (image work must not
/// block the async runtime). Exits cooperatively on the shutdown token.
pub fn run_producer<S: FrameSource>(
    mut source: S,
    slot: std::sync::Arc<FrameSlot>,
    shutdown: CancellationToken,
) {
    info!("frame producer started");
    let mut capture_error_logged = false;

    while !shutdown.is_cancelled() {
        match source.capture_frame() {
            Ok(Some(frame)) => {
                capture_error_logged = false;
                slot.publish(frame);
            }
            Ok(None) => {
                // No frame yet: nothing to publish, the loop degrades to a
                // no-op pass on its own.
            }
            Err(e) => {
                if !capture_error_logged {
                    warn!("frame capture failed: {e}");
                    capture_error_logged = true;
                }
            }
        }
        std::thread::sleep(CAPTURE_INTERVAL);
    }
    info!("frame producer stopped");
}
