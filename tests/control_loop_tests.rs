mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use common::{reconciler_with, solid_frame, RecordingGamepad};
use gambit::core::control_loop::ControlLoop;
use gambit::core::state::SharedAgentState;
use gambit::device::state::Trigger;
use gambit::perception::coords::TextReader;
use gambit::perception::detector::{Detection, Detector};
use gambit::safety::flags::SafetyFlags;
use gambit::safety::modes::{Mode, ModeSwitch};
use gambit::vision::frame::FrameSlot;
use image::RgbImage;
use tokio::sync::mpsc;

struct ScriptedDetector {
    detections: Vec<Detection>,
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _: &RgbImage, _: f32) -> anyhow::Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}

struct FailingDetector;

impl Detector for FailingDetector {
    fn detect(&mut self, _: &RgbImage, _: f32) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("backend offline")
    }
}

struct FixedCoords;

impl TextReader for FixedCoords {
    fn read_coordinates(&mut self, _: &RgbImage) -> Option<(i32, i32, i32)> {
        Some((100, 64, -200))
    }
}

struct NoCoords;

impl TextReader for NoCoords {
    fn read_coordinates(&mut self, _: &RgbImage) -> Option<(i32, i32, i32)> {
        None
    }
}

struct Rig {
    flags: Arc<SafetyFlags>,
    modes: Arc<ModeSwitch>,
    reconciler: Arc<Mutex<gambit::Reconciler>>,
    pad: RecordingGamepad,
    agent: SharedAgentState,
}

fn rig() -> Rig {
    let flags = Arc::new(SafetyFlags::new());
    let pad = RecordingGamepad::new();
    Rig {
        modes: Arc::new(ModeSwitch::new()),
        reconciler: Arc::new(Mutex::new(reconciler_with(pad.clone(), Arc::clone(&flags)))),
        pad,
        agent: SharedAgentState::new(),
        flags,
    }
}

fn control_loop<D: Detector, T: TextReader>(
    rig: &Rig,
    detector: D,
    reader: T,
) -> (ControlLoop<D, T>, mpsc::Sender<Vec<String>>) {
    let (tx, plan_rx) = mpsc::channel(4);
    let control = ControlLoop::new(
        Arc::clone(&rig.reconciler),
        Arc::clone(&rig.flags),
        Arc::clone(&rig.modes),
        rig.agent.clone(),
        Arc::new(FrameSlot::new()),
        plan_rx,
        detector,
        reader,
    );
    (control, tx)
}

fn lava_frame() -> RgbImage {
    solid_frame(100, 100, [255, 128, 0])
}

fn safe_frame() -> RgbImage {
    solid_frame(100, 100, [20, 20, 20])
}

#[test]
fn hazard_triggers_retreat_and_clears_exactly_once() {
    let rig = rig();
    let (mut control, _plan_tx) = control_loop(&rig, ScriptedDetector { detections: vec![] }, NoCoords);
    let t0 = Instant::now();

    control.tick(Some(&lava_frame()), t0);
    assert_eq!(rig.reconciler.lock().unwrap().state().move_y, -1.0);
    assert_eq!(rig.agent.snapshot().active_task, "REFLEX");

    // Hazard clears: one stop, movement neutral.
    control.tick(Some(&safe_frame()), t0 + Duration::from_millis(33));
    assert_eq!(rig.reconciler.lock().unwrap().state().move_y, 0.0);
    let flushes_after_stop = rig.pad.flush_count();

    // Further idle ticks must not re-issue the stop.
    control.tick(Some(&safe_frame()), t0 + Duration::from_millis(66));
    control.tick(Some(&safe_frame()), t0 + Duration::from_millis(99));
    assert_eq!(rig.pad.flush_count(), flushes_after_stop);
}

#[test]
fn unsafe_ticks_skip_all_processing() {
    let rig = rig();
    let (mut control, _plan_tx) = control_loop(&rig, ScriptedDetector { detections: vec![] }, FixedCoords);

    rig.flags.set_paused(true);
    control.tick(Some(&lava_frame()), Instant::now());

    // No retreat, no position update, nothing reached the arbitrator.
    assert!(rig.reconciler.lock().unwrap().state().is_neutral());
    assert_eq!(rig.agent.snapshot().position, (0, 0, 0));
}

#[test]
fn no_frame_is_a_no_op_pass() {
    let rig = rig();
    let (mut control, _plan_tx) = control_loop(&rig, ScriptedDetector { detections: vec![] }, FixedCoords);

    control.tick(None, Instant::now());
    assert_eq!(rig.pad.flush_count(), 0);
    assert_eq!(rig.agent.snapshot().position, (0, 0, 0));
}

#[test]
fn coordinates_flow_into_agent_state() {
    let rig = rig();
    let (mut control, _plan_tx) = control_loop(&rig, ScriptedDetector { detections: vec![] }, FixedCoords);

    control.tick(Some(&safe_frame()), Instant::now());
    assert_eq!(rig.agent.snapshot().position, (100, 64, -200));
}

#[test]
fn combat_mode_engages_a_centered_target() {
    let rig = rig();
    let detector = ScriptedDetector {
        detections: vec![Detection {
            bounds: [30, 30, 70, 70], // centered on the 100x100 frame
            confidence: 0.9,
            label: "person".to_string(),
        }],
    };
    let (mut control, _plan_tx) = control_loop(&rig, detector, NoCoords);

    rig.modes.toggle(Mode::Combat);
    control.tick(Some(&safe_frame()), Instant::now());

    let recon = rig.reconciler.lock().unwrap();
    assert_eq!(recon.state().trigger(Trigger::Right), 1.0);
    assert_eq!((recon.state().look_x, recon.state().look_y), (0.0, 0.0));
    drop(recon);
    assert_eq!(rig.agent.snapshot().active_task, "USER");
}

#[test]
fn detector_failure_counts_as_no_detections() {
    let rig = rig();
    let (mut control, _plan_tx) = control_loop(&rig, FailingDetector, NoCoords);

    rig.modes.toggle(Mode::Combat);
    control.tick(Some(&safe_frame()), Instant::now());

    // Combat saw an empty list: relaxed look, no attack, loop alive.
    let recon = rig.reconciler.lock().unwrap();
    assert_eq!(recon.state().trigger(Trigger::Right), 0.0);
    assert_eq!((recon.state().look_x, recon.state().look_y), (0.0, 0.0));
}

#[test]
fn reflex_preempts_combat_mode() {
    let rig = rig();
    let detector = ScriptedDetector {
        detections: vec![Detection {
            bounds: [30, 30, 70, 70],
            confidence: 0.9,
            label: "person".to_string(),
        }],
    };
    let (mut control, _plan_tx) = control_loop(&rig, detector, NoCoords);

    rig.modes.toggle(Mode::Combat);
    control.tick(Some(&lava_frame()), Instant::now());

    // Retreat won; combat never ran this tick.
    let recon = rig.reconciler.lock().unwrap();
    assert_eq!(recon.state().move_y, -1.0);
    assert_eq!(recon.state().trigger(Trigger::Right), 0.0);
}

#[test]
fn preempted_plan_releases_held_input_and_resumes() {
    let rig = rig();
    let (mut control, plan_tx) =
        control_loop(&rig, ScriptedDetector { detections: vec![] }, NoCoords);
    let t0 = Instant::now();

    plan_tx.try_send(vec!["MOVE_FORWARD 10".to_string()]).unwrap();
    control.tick(Some(&safe_frame()), t0);
    assert_eq!(rig.reconciler.lock().unwrap().state().move_y, 1.0);
    assert_eq!(rig.agent.snapshot().active_task, "PLAN");

    // Operator takes over mid-step: the held movement releases on the
    // first tick the plan layer loses.
    rig.modes.toggle(Mode::Combat);
    control.tick(Some(&safe_frame()), t0 + Duration::from_millis(33));
    assert_eq!(rig.reconciler.lock().unwrap().state().move_y, 0.0);
    assert_eq!(rig.agent.snapshot().active_task, "USER");

    // And stays released for as long as the user layer owns the ticks.
    for i in 2..6 {
        control.tick(Some(&safe_frame()), t0 + Duration::from_millis(33 * i));
    }
    assert_eq!(rig.reconciler.lock().unwrap().state().move_y, 0.0);

    // Higher layer goes quiet: the re-armed step drives again.
    rig.modes.toggle(Mode::Combat);
    control.tick(Some(&safe_frame()), t0 + Duration::from_millis(300));
    assert_eq!(rig.reconciler.lock().unwrap().state().move_y, 1.0);
    assert_eq!(rig.agent.snapshot().active_task, "PLAN");
}

#[test]
fn leaving_fishing_mode_stops_the_machine() {
    let rig = rig();
    let (mut control, _plan_tx) = control_loop(&rig, ScriptedDetector { detections: vec![] }, NoCoords);
    let t0 = Instant::now();

    rig.modes.toggle(Mode::Fishing);
    control.tick(Some(&safe_frame()), t0); // mode sync starts the cast

    rig.modes.toggle(Mode::Fishing); // back to idle
    control.tick(Some(&safe_frame()), t0 + Duration::from_millis(33));

    // Idle tick after leaving the mode: trigger released, nothing held.
    assert_eq!(
        rig.reconciler.lock().unwrap().state().trigger(Trigger::Right),
        0.0
    );
    assert_eq!(rig.agent.snapshot().active_task, "IDLE");
}
