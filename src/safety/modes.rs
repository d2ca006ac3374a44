use std::sync::atomic::{AtomicU8, Ordering};

/// Operator-selected behavior mode. Combat and fishing are mutually
/// exclusive; enabling one disables the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Combat,
    Fishing,
}

impl Mode {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Mode::Combat,
            2 => Mode::Fishing,
            _ => Mode::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Mode::Idle => 0,
            Mode::Combat => 1,
            Mode::Fishing => 2,
        }
    }
}

/// Shared mode cell: toggled from the key-poll task, read by the control
/// loop every tick.
pub struct ModeSwitch {
    current: AtomicU8,
}

impl ModeSwitch {
    pub fn new() -> Self {
        Self {
            current: AtomicU8::new(Mode::Idle.as_u8()),
        }
    }

    pub fn current(&self) -> Mode {
        Mode::from_u8(self.current.load(Ordering::SeqCst))
    }

    /// Toggle semantics: pressing a mode key while that mode is active
    /// returns to Idle; otherwise the mode takes over, displacing
    /// whatever mode was active before.
    pub fn toggle(&self, mode: Mode) -> Mode {
        let next = if self.current() == mode { Mode::Idle } else { mode };
        self.current.store(next.as_u8(), Ordering::SeqCst);
        next
    }
}

impl Default for ModeSwitch {
    fn default() -> Self {
        Self::new()
    }
}
