use std::sync::Arc;

use tracing::warn;

use super::state::{clamp_axis, clamp_intensity, Button, DeviceState, Trigger};
use crate::safety::flags::SafetyFlags;

/// The physical side of the output channel. The driver receives the full
/// desired state on every flush plus the button diff computed by the
/// Reconciler, so it never has to keep its own press/release bookkeeping.
pub trait Gamepad: Send {
    fn apply(
        &mut self,
        state: &DeviceState,
        pressed: &[Button],
        released: &[Button],
    ) -> anyhow::Result<()>;
}

/// Single owner of the desired device state. Every setter clamps, mutates,
/// and flushes immediately; batching across ticks is deliberately avoided
/// so a partial update can never linger on the device.
///
/// While the safety flags report paused or terminated, every setter except
/// `emergency_stop` is inert. That is what makes the pause invariant hold
/// no matter which skill is mid-flight.
pub struct Reconciler {
    state: DeviceState,
    flushed_buttons: std::collections::HashSet<Button>,
    driver: Option<Box<dyn Gamepad>>,
    flags: Arc<SafetyFlags>,
}

impl Reconciler {
    pub fn new(driver: Option<Box<dyn Gamepad>>, flags: Arc<SafetyFlags>) -> Self {
        Self {
            state: DeviceState::neutral(),
            flushed_buttons: std::collections::HashSet::new(),
            driver,
            flags,
        }
    }

    /// Read-only view of the authoritative state.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn set_move(&mut self, x: f32, y: f32) {
        if !self.writable() {
            return;
        }
        self.state.move_x = clamp_axis(x);
        self.state.move_y = clamp_axis(y);
        self.flush();
    }

    pub fn set_look(&mut self, x: f32, y: f32) {
        if !self.writable() {
            return;
        }
        self.state.look_x = clamp_axis(x);
        self.state.look_y = clamp_axis(y);
        self.flush();
    }

    pub fn set_button(&mut self, button: Button, active: bool) {
        if !self.writable() {
            return;
        }
        if active {
            self.state.buttons.insert(button);
        } else {
            self.state.buttons.remove(&button);
        }
        self.flush();
    }

    pub fn set_trigger(&mut self, trigger: Trigger, value: f32) {
        if !self.writable() {
            return;
        }
        self.state.set_trigger(trigger, clamp_intensity(value));
        self.flush();
    }

    /// Reset everything to neutral and flush unconditionally. Works with
    /// no driver attached (in-memory state still clears) and ignores the
    /// pause gate, since this is exactly what the pause path calls.
    pub fn emergency_stop(&mut self) {
        self.state = DeviceState::neutral();
        self.flush();
    }

    fn writable(&self) -> bool {
        self.flags.is_safe_to_operate()
    }

    /// Exactly one driver write per mutation. A failed write is logged and
    /// swallowed: stopping the loop over device I/O could leave the driver
    /// stuck with movement engaged, which is worse than a dropped frame.
    fn flush(&mut self) {
        let pressed: Vec<Button> = self
            .state
            .buttons
            .iter()
            .filter(|b| !self.flushed_buttons.contains(b))
            .copied()
            .collect();
        let released: Vec<Button> = self
            .flushed_buttons
            .iter()
            .filter(|b| !self.state.buttons.contains(b))
            .copied()
            .collect();

        if let Some(driver) = self.driver.as_mut() {
            if let Err(e) = driver.apply(&self.state, &pressed, &released) {
                warn!("gamepad write failed, holding last device state: {e}");
            }
        }

        self.flushed_buttons = self.state.buttons.clone();
    }
}
