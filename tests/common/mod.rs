#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use gambit::device::reconciler::{Gamepad, Reconciler};
use gambit::device::state::{Button, DeviceState};
use gambit::safety::flags::SafetyFlags;
use gambit::safety::monitor::{HotKey, KeyQuery};
use image::{Rgb, RgbImage};

/// One flush as the driver saw it.
#[derive(Debug, Clone)]
pub struct Flush {
    pub state: DeviceState,
    pub pressed: Vec<Button>,
    pub released: Vec<Button>,
}

/// Records every driver write for inspection.
#[derive(Clone)]
pub struct RecordingGamepad {
    pub flushes: Arc<Mutex<Vec<Flush>>>,
}

impl RecordingGamepad {
    pub fn new() -> Self {
        Self {
            flushes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Flush> {
        self.flushes.lock().unwrap().last().cloned()
    }
}

impl Gamepad for RecordingGamepad {
    fn apply(
        &mut self,
        state: &DeviceState,
        pressed: &[Button],
        released: &[Button],
    ) -> anyhow::Result<()> {
        self.flushes.lock().unwrap().push(Flush {
            state: state.clone(),
            pressed: pressed.to_vec(),
            released: released.to_vec(),
        });
        Ok(())
    }
}

/// Driver whose every write fails.
pub struct FailingGamepad;

impl Gamepad for FailingGamepad {
    fn apply(&mut self, _: &DeviceState, _: &[Button], _: &[Button]) -> anyhow::Result<()> {
        anyhow::bail!("device unplugged")
    }
}

/// Key backend driven by the test through a shared set of held keys.
#[derive(Clone)]
pub struct ScriptedKeys {
    held: Arc<Mutex<HashSet<HotKey>>>,
}

impl ScriptedKeys {
    pub fn new() -> Self {
        Self {
            held: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn press(&self, key: HotKey) {
        self.held.lock().unwrap().insert(key);
    }

    pub fn release_all(&self) {
        self.held.lock().unwrap().clear();
    }
}

impl KeyQuery for ScriptedKeys {
    fn is_pressed(&mut self, key: HotKey) -> bool {
        self.held.lock().unwrap().contains(&key)
    }
}

pub fn reconciler_with(
    driver: RecordingGamepad,
    flags: Arc<SafetyFlags>,
) -> Reconciler {
    Reconciler::new(Some(Box::new(driver)), flags)
}

pub fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(rgb))
}
