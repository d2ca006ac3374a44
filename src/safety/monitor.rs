use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::flags::SafetyFlags;
use super::modes::{Mode, ModeSwitch};
use crate::device::reconciler::Reconciler;

/// Designated operator keys. The actual key codes live in whatever
/// backend implements `KeyQuery`; the monitor only cares about roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotKey {
    Pause,
    Kill,
    CombatToggle,
    FishingToggle,
}

/// Low-latency key-state query. External collaborator; a platform
/// backend answers "is this key down right now", nothing more.
pub trait KeyQuery: Send {
    fn is_pressed(&mut self, key: HotKey) -> bool;
}

/// Outcome of one poll step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorVerdict {
    Running,
    Terminated,
}

pub const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// One physical key press spans many 10ms polls; accept one toggle per
/// debounce window.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Polls the operator keys on its own schedule, independent of the
/// control loop's frame rate. On pause or kill it forces the reconciler
/// to neutral *synchronously*, before anything else can observe the flag
/// change. Kill is terminal and checked even inside the debounce window.
pub struct SafetyMonitor<K: KeyQuery> {
    keys: K,
    flags: Arc<SafetyFlags>,
    modes: Arc<ModeSwitch>,
    reconciler: Arc<Mutex<Reconciler>>,
    debounce_until: Option<Instant>,
}

impl<K: KeyQuery> SafetyMonitor<K> {
    pub fn new(
        keys: K,
        flags: Arc<SafetyFlags>,
        modes: Arc<ModeSwitch>,
        reconciler: Arc<Mutex<Reconciler>>,
    ) -> Self {
        Self {
            keys,
            flags,
            modes,
            reconciler,
            debounce_until: None,
        }
    }

    /// One synchronous poll step. Split out from `run` so the state
    /// machine is testable with scripted keys and fabricated clocks.
    pub fn poll_once(&mut self, now: Instant) -> MonitorVerdict {
        if self.keys.is_pressed(HotKey::Kill) {
            warn!("kill switch activated");
            self.emergency_stop();
            self.flags.kill();
            return MonitorVerdict::Terminated;
        }

        if let Some(until) = self.debounce_until {
            if now < until {
                return MonitorVerdict::Running;
            }
            self.debounce_until = None;
        }

        if self.keys.is_pressed(HotKey::Pause) {
            let paused = !self.flags.is_paused();
            self.flags.set_paused(paused);
            warn!(
                "emergency {}",
                if paused { "PAUSED" } else { "RESUMED" }
            );
            if paused {
                // Invariant: no control output while paused. The stop must
                // land before this poll returns.
                self.emergency_stop();
            }
            self.debounce_until = Some(now + DEBOUNCE);
        } else if self.keys.is_pressed(HotKey::CombatToggle) {
            let mode = self.modes.toggle(Mode::Combat);
            info!("mode toggled: {:?}", mode);
            self.debounce_until = Some(now + DEBOUNCE);
        } else if self.keys.is_pressed(HotKey::FishingToggle) {
            let mode = self.modes.toggle(Mode::Fishing);
            info!("mode toggled: {:?}", mode);
            self.debounce_until = Some(now + DEBOUNCE);
        }

        MonitorVerdict::Running
    }

    fn emergency_stop(&self) {
        match self.reconciler.lock() {
            Ok(mut recon) => recon.emergency_stop(),
            Err(poisoned) => poisoned.into_inner().emergency_stop(),
        }
    }

    /// Fixed-interval polling loop. Exits when the kill key fires or when
    /// the shutdown token is cancelled elsewhere (e.g. Ctrl+C).
    pub async fn run(mut self) {
        info!("safety monitor started: pause/kill keys armed");
        let shutdown = self.flags.shutdown_token();
        loop {
            if shutdown.is_cancelled() {
                self.emergency_stop();
                break;
            }
            if self.poll_once(Instant::now()) == MonitorVerdict::Terminated {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        info!("safety monitor stopped");
    }
}
