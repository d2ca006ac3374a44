mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{reconciler_with, solid_frame, RecordingGamepad};
use gambit::device::state::Trigger;
use gambit::safety::flags::SafetyFlags;
use gambit::skills::fishing::{motion_score, sample_region, FishState, FishingSkill};

fn setup() -> (FishingSkill, gambit::device::reconciler::Reconciler, RecordingGamepad) {
    let flags = Arc::new(SafetyFlags::new());
    let pad = RecordingGamepad::new();
    let recon = reconciler_with(pad.clone(), flags);
    (FishingSkill::new(), recon, pad)
}

#[test]
fn idle_ticks_are_no_ops() {
    let (mut fishing, mut recon, pad) = setup();
    let frame = solid_frame(200, 200, [0, 0, 0]);

    fishing.tick(&mut recon, &frame, Instant::now());
    assert_eq!(fishing.state(), FishState::Idle);
    assert_eq!(pad.flush_count(), 0);
}

#[test]
fn casting_pulses_attack_and_enters_waiting_in_one_tick() {
    let (mut fishing, mut recon, pad) = setup();
    let frame = solid_frame(200, 200, [0, 0, 0]);
    let t0 = Instant::now();

    fishing.start(t0);
    assert_eq!(fishing.state(), FishState::Casting);

    fishing.tick(&mut recon, &frame, t0);
    assert_eq!(fishing.state(), FishState::Waiting);

    // Pulse: press then release, two flushes.
    let flushes = pad.flushes.lock().unwrap();
    assert_eq!(flushes.len(), 2);
    assert_eq!(flushes[0].state.trigger(Trigger::Right), 1.0);
    assert_eq!(flushes[1].state.trigger(Trigger::Right), 0.0);
}

#[test]
fn waiting_ignores_motion_during_splash_cooldown() {
    let (mut fishing, mut recon, _pad) = setup();
    let dark = solid_frame(200, 200, [0, 0, 0]);
    let bright = solid_frame(200, 200, [255, 255, 255]);
    let t0 = Instant::now();

    fishing.start(t0);
    fishing.tick(&mut recon, &dark, t0); // -> Waiting, baseline reset

    // Baseline sample.
    fishing.tick(&mut recon, &dark, t0 + Duration::from_millis(200));
    // Huge motion, but still inside the cooldown: measured, not acted on.
    fishing.tick(&mut recon, &bright, t0 + Duration::from_millis(800));
    assert_eq!(fishing.state(), FishState::Waiting);
}

#[test]
fn waiting_reels_on_motion_after_cooldown() {
    let (mut fishing, mut recon, _pad) = setup();
    let dark = solid_frame(200, 200, [0, 0, 0]);
    let bright = solid_frame(200, 200, [255, 255, 255]);
    let t0 = Instant::now();

    fishing.start(t0);
    fishing.tick(&mut recon, &dark, t0);
    fishing.tick(&mut recon, &dark, t0 + Duration::from_millis(500));

    // Past the cooldown, the splash triggers the reel.
    fishing.tick(&mut recon, &bright, t0 + Duration::from_millis(2500));
    assert_eq!(fishing.state(), FishState::Reeling);
}

#[test]
fn waiting_stays_put_on_static_frames() {
    let (mut fishing, mut recon, _pad) = setup();
    let dark = solid_frame(200, 200, [0, 0, 0]);
    let t0 = Instant::now();

    fishing.start(t0);
    fishing.tick(&mut recon, &dark, t0);
    for i in 1..10 {
        fishing.tick(&mut recon, &dark, t0 + Duration::from_millis(500 * i));
    }
    assert_eq!(fishing.state(), FishState::Waiting);
}

#[test]
fn waiting_times_out_into_reeling() {
    let (mut fishing, mut recon, _pad) = setup();
    let dark = solid_frame(200, 200, [0, 0, 0]);
    let t0 = Instant::now();

    fishing.start(t0);
    fishing.tick(&mut recon, &dark, t0);

    fishing.tick(&mut recon, &dark, t0 + Duration::from_secs(46));
    assert_eq!(fishing.state(), FishState::Reeling);
}

#[test]
fn reeling_returns_to_casting_after_settle_delay() {
    let (mut fishing, mut recon, _pad) = setup();
    let dark = solid_frame(200, 200, [0, 0, 0]);
    let t0 = Instant::now();

    fishing.start(t0);
    fishing.tick(&mut recon, &dark, t0);
    fishing.tick(&mut recon, &dark, t0 + Duration::from_secs(46)); // -> Reeling
    let reel_at = t0 + Duration::from_secs(46);

    // Not settled yet.
    fishing.tick(&mut recon, &dark, reel_at + Duration::from_millis(500));
    assert_eq!(fishing.state(), FishState::Reeling);

    fishing.tick(&mut recon, &dark, reel_at + Duration::from_millis(1600));
    assert_eq!(fishing.state(), FishState::Casting);
}

#[test]
fn stop_is_the_only_way_out_of_the_loop() {
    let (mut fishing, mut recon, _pad) = setup();
    let dark = solid_frame(200, 200, [0, 0, 0]);
    let t0 = Instant::now();

    fishing.start(t0);
    fishing.tick(&mut recon, &dark, t0);
    fishing.stop();
    assert_eq!(fishing.state(), FishState::Idle);

    // Ticks after stop do nothing.
    fishing.tick(&mut recon, &dark, t0 + Duration::from_secs(1));
    assert_eq!(fishing.state(), FishState::Idle);
}

#[test]
fn motion_score_counts_changed_pixels() {
    let dark = sample_region(&solid_frame(200, 200, [0, 0, 0]));
    let bright = sample_region(&solid_frame(200, 200, [255, 255, 255]));

    assert_eq!(motion_score(&dark, &dark), 0.0);

    let score = motion_score(&dark, &bright);
    // Full 100x100 region flipped.
    assert_eq!(score, 10_000.0);
}

#[test]
fn sample_region_clamps_to_small_frames() {
    let tiny = solid_frame(40, 30, [10, 10, 10]);
    let sample = sample_region(&tiny);
    assert_eq!(sample.dimensions(), (40, 30));
}
