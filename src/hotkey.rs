//! Scan code to action mapping.

use crate::action::Action;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

/// Scan codes of the dock keyboard's special keys.
pub mod scancode {
    pub const TOGGLE_WIFI: u16 = 238;
    pub const TOGGLE_BT: u16 = 237;
    pub const TOGGLE_TOUCHPAD: u16 = 60; // F2
    pub const BRIGHTNESS_DOWN: u16 = 224;
    pub const BRIGHTNESS_UP: u16 = 225;
    pub const BRIGHTNESS_AUTO: u16 = 61; // F3
    pub const SCREENSHOT: u16 = 212;
    pub const SETTINGS: u16 = 62; // F4
    pub const VOLUME_MUTE: u16 = 113;
}

/// Immutable mapping from hardware scan code to [`Action`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyMap {
    bindings: HashMap<u16, Action>,
}

impl HotkeyMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bindings of the dock keyboard's function row.
    pub fn dock_default() -> Self {
        Self::new()
            .with_binding(scancode::TOGGLE_WIFI, Action::ToggleWifi)
            .with_binding(scancode::TOGGLE_BT, Action::ToggleBluetooth)
            .with_binding(scancode::TOGGLE_TOUCHPAD, Action::ToggleTouchpad)
            .with_binding(scancode::BRIGHTNESS_DOWN, Action::BrightnessDown)
            .with_binding(scancode::BRIGHTNESS_UP, Action::BrightnessUp)
            .with_binding(scancode::BRIGHTNESS_AUTO, Action::ToggleAutoBrightness)
            .with_binding(scancode::SCREENSHOT, Action::Screenshot)
            .with_binding(scancode::SETTINGS, Action::LaunchSettings)
            .with_binding(scancode::VOLUME_MUTE, Action::ToggleAudioMute)
    }

    /// Return a copy of this map with `scan_code` bound to `action`,
    /// replacing any previous binding for that scan code.
    pub fn with_binding(mut self, scan_code: u16, action: Action) -> Self {
        self.bindings.insert(scan_code, action);
        self
    }

    /// Look up the action bound to a scan code.
    pub fn lookup(&self, scan_code: u16) -> Option<Action> {
        self.bindings.get(&scan_code).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Parse a binding string like "238=toggle-wifi" into a scan code and action.
pub fn parse_binding(s: &str) -> Result<(u16, Action)> {
    let (code, action) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("Binding must look like <scancode>=<action>: {}", s))?;

    let code = code.trim();
    if code.is_empty() {
        return Err(anyhow!("Missing scan code in binding: {}", s));
    }
    let scan_code = code
        .parse::<u16>()
        .with_context(|| format!("Invalid scan code in binding: {}", s))?;
    let action = Action::parse(action)?;

    Ok((scan_code, action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dock_default_bindings() {
        let map = HotkeyMap::dock_default();
        assert_eq!(map.len(), 9);
        assert_eq!(map.lookup(238), Some(Action::ToggleWifi));
        assert_eq!(map.lookup(60), Some(Action::ToggleTouchpad));
        assert_eq!(map.lookup(113), Some(Action::ToggleAudioMute));
        assert_eq!(map.lookup(30), None);
    }

    #[test]
    fn test_with_binding_overrides() {
        let map = HotkeyMap::dock_default().with_binding(238, Action::Screenshot);
        assert_eq!(map.lookup(238), Some(Action::Screenshot));
        assert_eq!(map.len(), 9);
    }

    #[test]
    fn test_parse_binding() {
        let (code, action) = parse_binding("212 = screenshot").unwrap();
        assert_eq!(code, 212);
        assert_eq!(action, Action::Screenshot);
    }

    #[test]
    fn test_parse_binding_errors() {
        assert!(parse_binding("212").is_err());
        assert!(parse_binding("=screenshot").is_err());
        assert!(parse_binding("abc=screenshot").is_err());
        assert!(parse_binding("70000=screenshot").is_err());
        assert!(parse_binding("212=unknown").is_err());
    }
}
