use std::sync::{Arc, Mutex};

use gambit::core::control_loop::ControlLoop;
use gambit::core::state::SharedAgentState;
use gambit::device::reconciler::{Gamepad, Reconciler};
use gambit::device::state::{Button, DeviceState};
use gambit::intake::CommandIntake;
use gambit::perception::coords::NullTextReader;
use gambit::perception::detector::NullDetector;
use gambit::planner::PlannerClient;
use gambit::safety::flags::SafetyFlags;
use gambit::safety::modes::ModeSwitch;
use gambit::safety::monitor::{HotKey, KeyQuery, SafetyMonitor};
use gambit::vision::frame::{run_producer, FrameSlot, FrameSource};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Driver-side stand-ins until the platform backends are wired. A real
/// deployment swaps these for a ViGEm/uinput pad, a screen grabber, and a
/// raw key poller; the core never knows the difference.
struct LogGamepad;

impl Gamepad for LogGamepad {
    fn apply(
        &mut self,
        state: &DeviceState,
        pressed: &[Button],
        released: &[Button],
    ) -> anyhow::Result<()> {
        tracing::trace!(
            "pad: move ({:.2},{:.2}) look ({:.2},{:.2}) +{:?} -{:?}",
            state.move_x,
            state.move_y,
            state.look_x,
            state.look_y,
            pressed,
            released
        );
        Ok(())
    }
}

struct NoFrames;

impl FrameSource for NoFrames {
    fn capture_frame(&mut self) -> anyhow::Result<Option<image::RgbImage>> {
        Ok(None)
    }
}

struct NoKeys;

impl KeyQuery for NoKeys {
    fn is_pressed(&mut self, _key: HotKey) -> bool {
        false
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    info!("gambit booting");

    let flags = Arc::new(SafetyFlags::new());
    let modes = Arc::new(ModeSwitch::new());
    let agent = SharedAgentState::new();
    let reconciler = Arc::new(Mutex::new(Reconciler::new(
        Some(Box::new(LogGamepad)),
        Arc::clone(&flags),
    )));
    let slot = Arc::new(FrameSlot::new());
    let (plan_tx, plan_rx) = mpsc::channel(16);

    // Safety monitor: its own schedule, independent of the frame rate.
    let monitor = SafetyMonitor::new(
        NoKeys,
        Arc::clone(&flags),
        Arc::clone(&modes),
        Arc::clone(&reconciler),
    );
    tokio::spawn(monitor.run());

    // Operator console.
    let intake = CommandIntake::new(
        agent.clone(),
        PlannerClient::new(),
        plan_tx,
        Arc::clone(&flags),
    );
    tokio::spawn(intake.run());

    // Frame producer on a dedicated OS thread.
    let producer_slot = Arc::clone(&slot);
    let producer_shutdown = flags.shutdown_token();
    let producer = std::thread::spawn(move || {
        run_producer(NoFrames, producer_slot, producer_shutdown);
    });

    // Ctrl+C behaves like the kill key.
    let ctrlc_flags = Arc::clone(&flags);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl+C: shutting down");
            ctrlc_flags.kill();
        }
    });

    let control = ControlLoop::new(
        reconciler,
        Arc::clone(&flags),
        modes,
        agent,
        slot,
        plan_rx,
        NullDetector,
        NullTextReader,
    );
    control.run().await;

    let _ = producer.join();
    info!("gambit shutdown complete");
    Ok(())
}
