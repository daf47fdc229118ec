//! Events delivered by the dock hardware.

/// Whether a key went down or came back up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// A single key event as reported by the dock keyboard.
///
/// The scan code is the raw hardware identifier of the key, not a logical
/// key code. Auto-repeat is reported as further `Down` events with an
/// increasing `repeat_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub scan_code: u16,
    pub repeat_count: u32,
}

impl KeyEvent {
    /// Create the first key-down event for a scan code.
    pub fn down(scan_code: u16) -> Self {
        Self {
            action: KeyAction::Down,
            scan_code,
            repeat_count: 0,
        }
    }

    /// Create a key-up event for a scan code.
    pub fn up(scan_code: u16) -> Self {
        Self {
            action: KeyAction::Up,
            scan_code,
            repeat_count: 0,
        }
    }

    /// Create an auto-repeat key-down event.
    pub fn repeat(scan_code: u16, repeat_count: u32) -> Self {
        Self {
            action: KeyAction::Down,
            scan_code,
            repeat_count,
        }
    }

    /// True for a key-down that is not an auto-repeat.
    pub fn is_initial_press(&self) -> bool {
        self.action == KeyAction::Down && self.repeat_count == 0
    }
}

/// Physical attachment state of the dock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockState {
    Undocked,
    Docked,
}

/// Events emitted by the dock input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A key on the dock keyboard changed state.
    Key(KeyEvent),
    /// The dock was attached or detached.
    Dock(DockState),
}
