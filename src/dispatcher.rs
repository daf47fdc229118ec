//! Scan code dispatch for the dock keyboard.

use crate::action::Action;
use crate::config::DockConfig;
use crate::event::{DockState, InputEvent, KeyEvent};
use crate::hotkey::HotkeyMap;
use crate::platform::{
    BluetoothState, BrightnessMode, CallMode, Platform, RadioState, RingerMode, SystemSurface,
};
use crate::screenshot::{ScreenshotCapture, SCREENSHOT_TIMEOUT};
use crate::settings::TOUCHPAD_STATUS;
use anyhow::Result;
use std::time::Duration;

/// Lowest backlight level the brightness keys go down to (one above off).
pub const MINIMUM_BACKLIGHT: i32 = 1;
/// Highest backlight level.
pub const MAXIMUM_BACKLIGHT: i32 = 255;
/// Backlight change per key press.
pub const BRIGHTNESS_STEP: i32 = 10;

/// Translates dock key presses into platform actions.
///
/// Owns the touchpad enable state and the in-flight screenshot session.
/// Key and dock events are expected from a single dispatch thread.
pub struct KeyHandler {
    platform: Platform,
    hotkeys: HotkeyMap,
    touchpad_enabled: bool,
    screenshot: ScreenshotCapture,
}

impl KeyHandler {
    /// Create a handler and restore the persisted touchpad state.
    pub fn new(platform: Platform, hotkeys: HotkeyMap) -> Self {
        Self::with_screenshot_timeout(platform, hotkeys, SCREENSHOT_TIMEOUT)
    }

    /// Create a handler with the bindings and timeout from `config`.
    pub fn from_config(platform: Platform, config: &DockConfig) -> Result<Self> {
        Ok(Self::with_screenshot_timeout(
            platform,
            config.hotkey_map()?,
            config.screenshot_timeout(),
        ))
    }

    /// Create a handler with a custom screenshot timeout.
    ///
    /// Reads the persisted touchpad flag and switches the touchpad off right
    /// away if it was left disabled.
    pub fn with_screenshot_timeout(
        platform: Platform,
        hotkeys: HotkeyMap,
        screenshot_timeout: Duration,
    ) -> Self {
        let screenshot =
            ScreenshotCapture::with_timeout(platform.screenshot.clone(), screenshot_timeout);
        let touchpad_enabled = platform.settings.get_int(TOUCHPAD_STATUS) != Some(0);

        let handler = Self {
            platform,
            hotkeys,
            touchpad_enabled,
            screenshot,
        };
        if !handler.touchpad_enabled {
            handler.apply_touchpad();
        }
        handler
    }

    pub fn touchpad_enabled(&self) -> bool {
        self.touchpad_enabled
    }

    pub fn screenshot_in_progress(&self) -> bool {
        self.screenshot.is_active()
    }

    /// Handle a key event. Returns true if the event is consumed and must
    /// not propagate further.
    pub fn handle(&mut self, event: &KeyEvent) -> bool {
        log::trace!(
            "KeyEvent: action={:?}, scan_code={}, repeat_count={}",
            event.action,
            event.scan_code,
            event.repeat_count
        );

        if !event.is_initial_press() {
            return false;
        }

        match self.hotkeys.lookup(event.scan_code) {
            Some(action) => self.perform(action),
            None => false,
        }
    }

    /// Route an event from the dock input source. Returns true if a key
    /// event was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Key(key) => self.handle(key),
            InputEvent::Dock(state) => {
                self.on_dock_event(*state);
                false
            }
        }
    }

    /// Run a single action. Returns whether the triggering event is consumed.
    pub fn perform(&mut self, action: Action) -> bool {
        log::debug!("Performing {}", action);
        match action {
            Action::ToggleWifi => self.toggle_wifi(),
            Action::ToggleBluetooth => self.toggle_bluetooth(),
            Action::ToggleTouchpad => self.toggle_touchpad(),
            Action::BrightnessDown => self.brightness_down(),
            Action::BrightnessUp => self.brightness_up(),
            Action::ToggleAutoBrightness => self.toggle_auto_brightness(),
            Action::Screenshot => self.take_screenshot(),
            Action::LaunchSettings => self.launch_settings(),
            Action::ToggleAudioMute => self.toggle_audio_mute(),
        }
        action.consumes_event()
    }

    /// Re-assert the touchpad state to the hardware when the dock is attached.
    pub fn on_dock_event(&self, state: DockState) {
        if state != DockState::Undocked {
            self.apply_touchpad();
        }
    }

    /// Set the touchpad state explicitly, e.g. when restoring it at boot.
    pub fn enable_touchpad(&mut self, enabled: bool) {
        self.touchpad_enabled = enabled;
        self.apply_touchpad();
        self.persist_touchpad();
    }

    fn apply_touchpad(&self) {
        log::debug!("Switching touchpad {}", self.touchpad_enabled);
        if let Err(e) = self.platform.touchpad.set_enabled(self.touchpad_enabled) {
            log::error!("Failed to switch touchpad: {:#}", e);
        }
    }

    fn persist_touchpad(&self) {
        let value = i32::from(self.touchpad_enabled);
        if let Err(e) = self.platform.settings.put_int(TOUCHPAD_STATUS, value) {
            log::error!("Failed to persist touchpad state: {:#}", e);
        }
    }

    fn toggle_wifi(&self) {
        let radio = &self.platform.radio;
        let state = radio.wifi_state();
        let ap_state = radio.wifi_ap_state();

        if state.is_transitioning() || ap_state.is_transitioning() {
            return;
        }

        // Station and AP mode are exclusive, never enable both.
        if state == RadioState::Enabled || ap_state == RadioState::Enabled {
            radio.set_wifi_enabled(false);
            radio.set_wifi_ap_enabled(false);
        } else if state == RadioState::Disabled && ap_state == RadioState::Disabled {
            radio.set_wifi_enabled(true);
        }
    }

    fn toggle_bluetooth(&self) {
        let bluetooth = &self.platform.bluetooth;
        match bluetooth.state() {
            BluetoothState::Off => bluetooth.enable(),
            BluetoothState::On => bluetooth.disable(),
            BluetoothState::TurningOn | BluetoothState::TurningOff => {}
        }
    }

    fn toggle_touchpad(&mut self) {
        self.enable_touchpad(!self.touchpad_enabled);
    }

    fn brightness_down(&self) {
        self.adjust_brightness(-BRIGHTNESS_STEP, MINIMUM_BACKLIGHT);
    }

    fn brightness_up(&self) {
        self.adjust_brightness(BRIGHTNESS_STEP, MAXIMUM_BACKLIGHT);
    }

    fn adjust_brightness(&self, delta: i32, unset_default: i32) {
        let display = &self.platform.display;
        display.set_brightness_mode(BrightnessMode::Manual);

        let current = display.brightness().unwrap_or(unset_default);
        let value = current
            .saturating_add(delta)
            .clamp(MINIMUM_BACKLIGHT, MAXIMUM_BACKLIGHT);

        if let Err(e) = display.set_temporary_brightness(value) {
            log::error!("Could not set backlight brightness: {:#}", e);
        }
        display.set_brightness(value);
    }

    fn toggle_auto_brightness(&self) {
        let display = &self.platform.display;
        if !display.automatic_brightness_available() {
            return;
        }
        let mode = match display.brightness_mode().unwrap_or(BrightnessMode::Manual) {
            BrightnessMode::Manual => BrightnessMode::Automatic,
            BrightnessMode::Automatic => BrightnessMode::Manual,
        };
        display.set_brightness_mode(mode);
    }

    fn take_screenshot(&self) {
        self.screenshot.request();
    }

    fn launch_settings(&self) {
        if let Err(e) = self.platform.navigation.navigate(SystemSurface::Settings) {
            log::error!("Could not launch settings: {:#}", e);
        }
    }

    fn toggle_audio_mute(&self) {
        let audio = &self.platform.audio;
        // Ringing and calls are owned by telephony.
        if audio.mode() != CallMode::Normal {
            return;
        }
        // Vibrate counts as muted and toggles back to normal.
        let ringer = match audio.ringer_mode() {
            RingerMode::Normal => RingerMode::Silent,
            RingerMode::Silent | RingerMode::Vibrate => RingerMode::Normal,
        };
        audio.set_ringer_mode(ringer);
    }
}
