//! Actions bound to dock hotkeys.

use anyhow::{anyhow, Result};

/// Platform action triggered by a dock hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ToggleWifi,
    ToggleBluetooth,
    ToggleTouchpad,
    BrightnessDown,
    BrightnessUp,
    ToggleAutoBrightness,
    Screenshot,
    LaunchSettings,
    ToggleAudioMute,
}

impl Action {
    /// Parse an action from a name like "toggle-wifi" or "Screenshot".
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "toggle-wifi" => Ok(Action::ToggleWifi),
            "toggle-bluetooth" => Ok(Action::ToggleBluetooth),
            "toggle-touchpad" => Ok(Action::ToggleTouchpad),
            "brightness-down" => Ok(Action::BrightnessDown),
            "brightness-up" => Ok(Action::BrightnessUp),
            "toggle-auto-brightness" => Ok(Action::ToggleAutoBrightness),
            "screenshot" => Ok(Action::Screenshot),
            "launch-settings" => Ok(Action::LaunchSettings),
            "toggle-audio-mute" => Ok(Action::ToggleAudioMute),
            _ => Err(anyhow!("Unknown action: {}", s)),
        }
    }

    /// Whether the key event that triggered this action is consumed.
    ///
    /// Audio mute lets the event propagate so the regular mute key
    /// handling further down the input pipeline still runs.
    pub fn consumes_event(&self) -> bool {
        !matches!(self, Action::ToggleAudioMute)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::ToggleWifi => write!(f, "toggle-wifi"),
            Action::ToggleBluetooth => write!(f, "toggle-bluetooth"),
            Action::ToggleTouchpad => write!(f, "toggle-touchpad"),
            Action::BrightnessDown => write!(f, "brightness-down"),
            Action::BrightnessUp => write!(f, "brightness-up"),
            Action::ToggleAutoBrightness => write!(f, "toggle-auto-brightness"),
            Action::Screenshot => write!(f, "screenshot"),
            Action::LaunchSettings => write!(f, "launch-settings"),
            Action::ToggleAudioMute => write!(f, "toggle-audio-mute"),
        }
    }
}
