use crate::device::reconciler::Reconciler;
use crate::device::state::Trigger;
use crate::perception::detector::Detection;

/// Labels the combat skill will engage. Closed allow-list; everything
/// else in the detection stream is ignored.
pub const HOSTILE_LABELS: &[&str] = &["person", "zombie", "skeleton"];

/// Proportional gain per axis. 1 px of error moves the stick by this
/// much, clamped to the stick domain.
const KP_X: f32 = 0.002;
const KP_Y: f32 = 0.002;

/// Combat aiming: pick the eligible detection closest to screen center,
/// steer the look stick toward it, and hold the attack trigger only while
/// the crosshair sits inside the target box. Stateless beyond the current
/// tick's target selection, so a lost target can never leave a stale aim
/// or attack behind.
pub struct CombatSkill {
    kp_x: f32,
    kp_y: f32,
}

impl CombatSkill {
    pub fn new() -> Self {
        Self { kp_x: KP_X, kp_y: KP_Y }
    }

    pub fn tick(
        &self,
        reconciler: &mut Reconciler,
        detections: &[Detection],
        screen: (u32, u32),
    ) {
        match best_target(detections, screen) {
            Some(target) => {
                let (look_x, look_y) = self.aim_correction(target, screen);
                reconciler.set_look(look_x, look_y);

                let aimed = contains_center(target.bounds, screen);
                reconciler.set_trigger(Trigger::Right, if aimed { 1.0 } else { 0.0 });
            }
            None => {
                // No eligible target: relax everything.
                reconciler.set_look(0.0, 0.0);
                reconciler.set_trigger(Trigger::Right, 0.0);
            }
        }
    }

    /// P-control toward the target center. Screen Y grows downward, so a
    /// target below center needs a pitch-down stick input: the vertical
    /// axis is sign-inverted.
    // TODO: verify the pitch sign against the actual gamepad driver; the
    // inversion here follows the common XInput convention.
    pub fn aim_correction(&self, target: &Detection, screen: (u32, u32)) -> (f32, f32) {
        let (cx, cy) = screen_center(screen);
        let (tx, ty) = target.center();

        let dx = tx - cx;
        let dy = ty - cy;

        let look_x = (dx * self.kp_x).clamp(-1.0, 1.0);
        let look_y = (-(dy * self.kp_y)).clamp(-1.0, 1.0);
        (look_x, look_y)
    }
}

impl Default for CombatSkill {
    fn default() -> Self {
        Self::new()
    }
}

fn screen_center(screen: (u32, u32)) -> (f32, f32) {
    (screen.0 as f32 / 2.0, screen.1 as f32 / 2.0)
}

/// Eligible detection closest to the crosshair, or `None`.
pub fn best_target<'a>(
    detections: &'a [Detection],
    screen: (u32, u32),
) -> Option<&'a Detection> {
    let (cx, cy) = screen_center(screen);

    detections
        .iter()
        .filter(|d| HOSTILE_LABELS.contains(&d.label.as_str()))
        .min_by(|a, b| {
            let da = dist2(a.center(), (cx, cy));
            let db = dist2(b.center(), (cx, cy));
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Boundary-inclusive containment: a crosshair exactly on the box edge
/// still counts as aimed.
pub fn contains_center(bounds: [i32; 4], screen: (u32, u32)) -> bool {
    let (cx, cy) = screen_center(screen);
    let [x1, y1, x2, y2] = bounds;
    x1 as f32 <= cx && cx <= x2 as f32 && y1 as f32 <= cy && cy <= y2 as f32
}

fn dist2(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}
