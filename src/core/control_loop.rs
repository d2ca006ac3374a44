use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use image::RgbImage;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::arbitrator::{Action, Arbitrator, ReflexAction, UserAction};
use super::state::SharedAgentState;
use crate::device::reconciler::Reconciler;
use crate::device::state::Trigger;
use crate::perception::coords::TextReader;
use crate::perception::detector::Detector;
use crate::safety::flags::SafetyFlags;
use crate::safety::modes::{Mode, ModeSwitch};
use crate::skills::combat::CombatSkill;
use crate::skills::fishing::FishingSkill;
use crate::skills::plan::PlanRunner;
use crate::skills::retreat::RetreatBehavior;
use crate::vision::frame::FrameSlot;
use crate::vision::hazard::HazardDetector;

pub const TICK_MS: u64 = 33;
const DETECT_CONFIDENCE: f32 = 0.5;

fn lock(reconciler: &Mutex<Reconciler>) -> MutexGuard<'_, Reconciler> {
    match reconciler.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// The orchestrating driver: one perception sample, one arbitration, one
/// winning action per tick, paced to the frame budget. Everything inside
/// `tick` runs on this single task, so skill writes to the reconciler are
/// serialized by construction; only the safety monitor ever contends for
/// the reconciler lock.
pub struct ControlLoop<D: Detector, T: TextReader> {
    reconciler: Arc<Mutex<Reconciler>>,
    flags: Arc<SafetyFlags>,
    modes: Arc<ModeSwitch>,
    agent: SharedAgentState,
    slot: Arc<FrameSlot>,
    plan_rx: mpsc::Receiver<Vec<String>>,

    detector: D,
    text_reader: T,

    hazard: HazardDetector,
    combat: CombatSkill,
    fishing: FishingSkill,
    retreat: RetreatBehavior,
    runner: PlanRunner,
    arbitrator: Arbitrator,

    retreat_active: bool,
    last_mode: Mode,
    detector_error_logged: bool,
}

impl<D: Detector, T: TextReader> ControlLoop<D, T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reconciler: Arc<Mutex<Reconciler>>,
        flags: Arc<SafetyFlags>,
        modes: Arc<ModeSwitch>,
        agent: SharedAgentState,
        slot: Arc<FrameSlot>,
        plan_rx: mpsc::Receiver<Vec<String>>,
        detector: D,
        text_reader: T,
    ) -> Self {
        Self {
            reconciler,
            flags,
            modes,
            agent,
            slot,
            plan_rx,
            detector,
            text_reader,
            hazard: HazardDetector::new(),
            combat: CombatSkill::new(),
            fishing: FishingSkill::new(),
            retreat: RetreatBehavior::new(),
            runner: PlanRunner::new(),
            arbitrator: Arbitrator::new(),
            retreat_active: false,
            last_mode: Mode::Idle,
            detector_error_logged: false,
        }
    }

    /// One control tick: perception -> skills -> arbitration ->
    /// reconciliation, strictly sequential. `None` frame is a no-op pass.
    pub fn tick(&mut self, frame: Option<&RgbImage>, now: Instant) {
        if !self.flags.is_safe_to_operate() {
            // The monitor already forced the device neutral; nothing may
            // reach the arbitrator while unsafe.
            debug!("tick skipped: paused or terminating");
            return;
        }

        while let Ok(steps) = self.plan_rx.try_recv() {
            self.runner.push_plan(&steps);
        }

        self.sync_mode(now);

        let Some(frame) = frame else {
            // No frame within budget: re-check safety next tick rather
            // than stall on acquisition.
            return;
        };

        // Perception-to-state bridge. Parse failure keeps last known.
        if let Some(pos) = self.text_reader.read_coordinates(frame) {
            self.agent.update_position(pos);
        }

        let hazard = self.hazard.assess(frame);
        let reflex = hazard.detected.then_some(ReflexAction::Retreat);

        let user = match self.modes.current() {
            Mode::Combat => Some(UserAction::Combat),
            Mode::Fishing => Some(UserAction::Fishing),
            Mode::Idle => None,
        };

        let plan = self.runner.current_label();

        let decision = self.arbitrator.decide(reflex, user, plan);
        self.agent.set_active_task(decision.layer.as_str());

        // Retreat stop is edge-triggered: exactly once when the hazard
        // clears, never on every idle tick.
        if self.retreat_active && decision.action != Action::Retreat {
            self.retreat.stop(&mut lock(&self.reconciler));
            self.retreat_active = false;
        }

        // A preempted plan step must not keep driving: release what it
        // holds and re-arm it for when the plan layer next wins.
        if self.runner.has_active_step() && !matches!(decision.action, Action::Plan(_)) {
            self.runner.suspend(&mut lock(&self.reconciler));
        }

        match decision.action {
            Action::Retreat => {
                if !self.retreat_active {
                    warn!(
                        "hazard detected (coverage {:.1}%), retreating",
                        hazard.danger_level * 100.0
                    );
                }
                self.retreat.tick(&mut lock(&self.reconciler));
                self.retreat_active = true;
            }
            Action::User(UserAction::Combat) => {
                let detections = self.detect(frame);
                let screen = frame.dimensions();
                self.combat
                    .tick(&mut lock(&self.reconciler), &detections, screen);
            }
            Action::User(UserAction::Fishing) => {
                self.fishing.tick(&mut lock(&self.reconciler), frame, now);
            }
            Action::Plan(_) => {
                self.runner.tick(&mut lock(&self.reconciler), now);
            }
            Action::Idle => {}
        }
    }

    /// Handle operator mode flips: start/stop the fishing machine and
    /// relax whatever the departing mode was holding.
    fn sync_mode(&mut self, now: Instant) {
        let mode = self.modes.current();
        if mode == self.last_mode {
            return;
        }

        match self.last_mode {
            Mode::Combat => {
                let mut recon = lock(&self.reconciler);
                recon.set_look(0.0, 0.0);
                recon.set_trigger(Trigger::Right, 0.0);
            }
            Mode::Fishing => {
                self.fishing.stop();
                let mut recon = lock(&self.reconciler);
                recon.set_trigger(Trigger::Right, 0.0);
            }
            Mode::Idle => {}
        }

        if mode == Mode::Fishing {
            self.fishing.start(now);
        }
        self.last_mode = mode;
    }

    fn detect(&mut self, frame: &RgbImage) -> Vec<crate::perception::detector::Detection> {
        match self.detector.detect(frame, DETECT_CONFIDENCE) {
            Ok(detections) => {
                self.detector_error_logged = false;
                detections
            }
            Err(e) => {
                // Backend hiccup counts as zero detections this tick.
                if !self.detector_error_logged {
                    warn!("detector backend failed, treating as no detections: {e}");
                    self.detector_error_logged = true;
                }
                Vec::new()
            }
        }
    }

    /// Async driver loop. Exits when the shutdown token fires, after
    /// guaranteeing a final emergency stop.
    pub async fn run(mut self) {
        info!("control loop started, tick {}ms", TICK_MS);

        let shutdown = self.flags.shutdown_token();
        let mut cadence = interval(Duration::from_millis(TICK_MS));
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = cadence.tick() => {}
            }

            let frame = self.slot.take();
            self.tick(frame.as_ref(), Instant::now());
        }

        // Always leave the device neutral on the way out.
        lock(&self.reconciler).emergency_stop();
        info!("control loop stopped");
    }
}
