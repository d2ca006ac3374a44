use std::time::{Duration, Instant};

use image::imageops;
use image::{GrayImage, RgbImage};
use tracing::{debug, info};

use crate::device::reconciler::Reconciler;
use crate::device::state::Trigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FishState {
    Idle,
    Casting,
    Waiting,
    Reeling,
}

/// Side of the square motion-detection region centered on the frame.
const ROI_SIZE: u32 = 100;
/// Gaussian sigma for the pre-diff blur (noise suppression).
const BLUR_SIGMA: f32 = 3.5;
/// Per-pixel grayscale delta that counts as motion.
const PIXEL_DELTA: u8 = 25;
/// Changed-pixel count above which a splash is called.
const MOTION_THRESHOLD: f32 = 5.0;
/// The cast makes its own splash; measure but ignore motion this long.
const SPLASH_COOLDOWN: Duration = Duration::from_secs(2);
/// No bite after this long forces a reel-in.
const BITE_TIMEOUT: Duration = Duration::from_secs(45);
/// Reel animation plus recast grace before the next cast.
const REEL_SETTLE: Duration = Duration::from_millis(1500);

/// Fishing: an explicit four-state machine looping cast -> wait for
/// splash -> reel -> cast until externally stopped. The splash detector
/// is frame differencing over a blurred grayscale region, with the
/// previous tick's sample as the rolling baseline.
pub struct FishingSkill {
    state: FishState,
    last_transition: Instant,
    baseline: Option<GrayImage>,
}

impl FishingSkill {
    pub fn new() -> Self {
        Self {
            state: FishState::Idle,
            last_transition: Instant::now(),
            baseline: None,
        }
    }

    pub fn state(&self) -> FishState {
        self.state
    }

    /// The only external way into the loop.
    pub fn start(&mut self, now: Instant) {
        info!("fishing started");
        self.state = FishState::Casting;
        self.last_transition = now;
        self.baseline = None;
    }

    /// The only external way out. Ticks are no-ops in Idle.
    pub fn stop(&mut self) {
        if self.state != FishState::Idle {
            info!("fishing stopped");
        }
        self.state = FishState::Idle;
        self.baseline = None;
    }

    pub fn tick(&mut self, reconciler: &mut Reconciler, frame: &RgbImage, now: Instant) {
        match self.state {
            FishState::Idle => {}
            FishState::Casting => {
                debug!("fishing: casting rod");
                pulse_attack(reconciler);
                self.state = FishState::Waiting;
                self.last_transition = now;
                self.baseline = None;
            }
            FishState::Waiting => {
                let elapsed = now.duration_since(self.last_transition);
                if elapsed >= BITE_TIMEOUT {
                    info!("fishing: no bite, reeling in");
                    self.enter_reeling(reconciler, now);
                    return;
                }

                let sample = sample_region(frame);
                let score = self
                    .baseline
                    .as_ref()
                    .map(|prev| motion_score(prev, &sample));
                self.baseline = Some(sample);

                let Some(score) = score else { return };

                // Baseline keeps updating during the cooldown, but the
                // score is not acted on; the cast's own splash would
                // trigger instantly otherwise.
                if elapsed < SPLASH_COOLDOWN {
                    return;
                }

                if score > MOTION_THRESHOLD {
                    info!("fishing: splash detected (score {score:.0})");
                    self.enter_reeling(reconciler, now);
                }
            }
            FishState::Reeling => {
                if now.duration_since(self.last_transition) >= REEL_SETTLE {
                    self.state = FishState::Casting;
                    self.last_transition = now;
                }
            }
        }
    }

    fn enter_reeling(&mut self, reconciler: &mut Reconciler, now: Instant) {
        pulse_attack(reconciler);
        self.state = FishState::Reeling;
        self.last_transition = now;
    }
}

impl Default for FishingSkill {
    fn default() -> Self {
        Self::new()
    }
}

/// One short attack click. Two flushes, press then release; the driver
/// sees a zero-length pulse, which the game registers as a tap.
fn pulse_attack(reconciler: &mut Reconciler) {
    reconciler.set_trigger(Trigger::Right, 1.0);
    reconciler.set_trigger(Trigger::Right, 0.0);
}

/// Blurred grayscale crop of the centered ROI, clamped to frame bounds.
pub fn sample_region(frame: &RgbImage) -> GrayImage {
    let (w, h) = frame.dimensions();
    let size_x = ROI_SIZE.min(w);
    let size_y = ROI_SIZE.min(h);
    let left = (w - size_x) / 2;
    let top = (h - size_y) / 2;

    let view = imageops::crop_imm(frame, left, top, size_x, size_y);
    let gray = imageops::grayscale(&view);
    imageops::blur(&gray, BLUR_SIGMA)
}

/// Count of pixels whose blurred grayscale value moved beyond the fixed
/// delta versus the baseline. Mismatched dimensions compare the common
/// overlap.
pub fn motion_score(baseline: &GrayImage, current: &GrayImage) -> f32 {
    let w = baseline.width().min(current.width());
    let h = baseline.height().min(current.height());

    let mut changed: u32 = 0;
    for y in 0..h {
        for x in 0..w {
            let a = baseline.get_pixel(x, y).0[0];
            let b = current.get_pixel(x, y).0[0];
            if a.abs_diff(b) > PIXEL_DELTA {
                changed += 1;
            }
        }
    }
    changed as f32
}
