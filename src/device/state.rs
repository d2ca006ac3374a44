use std::collections::HashSet;

/// Digital buttons the virtual pad exposes. Closed set; plan steps and
/// skills can only reference these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Jump,
}

/// Analog triggers. Attack maps to the right trigger, matching the
/// game's default binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Left,
    Right,
}

impl Trigger {
    pub const COUNT: usize = 2;

    fn index(self) -> usize {
        match self {
            Trigger::Left => 0,
            Trigger::Right => 1,
        }
    }
}

/// Desired state of the virtual input device. Single instance, owned by
/// the Reconciler. All fields are kept inside their valid domain by the
/// setters; nothing else is allowed to mutate this.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub move_x: f32,
    pub move_y: f32,
    pub look_x: f32,
    pub look_y: f32,
    pub buttons: HashSet<Button>,
    triggers: [f32; Trigger::COUNT],
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::neutral()
    }
}

impl DeviceState {
    pub fn neutral() -> Self {
        Self {
            move_x: 0.0,
            move_y: 0.0,
            look_x: 0.0,
            look_y: 0.0,
            buttons: HashSet::new(),
            triggers: [0.0; Trigger::COUNT],
        }
    }

    pub fn trigger(&self, trigger: Trigger) -> f32 {
        self.triggers[trigger.index()]
    }

    pub(crate) fn set_trigger(&mut self, trigger: Trigger, value: f32) {
        self.triggers[trigger.index()] = value;
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

/// Clamp to the axis domain. Out-of-range input is never an error.
pub(crate) fn clamp_axis(v: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(-1.0, 1.0)
}

pub(crate) fn clamp_intensity(v: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 1.0)
}
