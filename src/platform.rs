//! Capabilities of the host platform used by the dock handlers.
//!
//! Everything the key handler touches outside of its own state goes through
//! one of these traits, so the dispatch logic can run against fakes.

use crate::screenshot::{CaptureReply, ScreenshotConnection, SessionToken};
use anyhow::Result;
use std::sync::Arc;

/// State of a Wi-Fi radio, either station or access-point mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Disabling,
    Disabled,
    Enabling,
    Enabled,
    Unknown,
}

impl RadioState {
    /// True while the radio is switching on or off.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, RadioState::Enabling | RadioState::Disabling)
    }
}

/// State of the Bluetooth adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BluetoothState {
    Off,
    TurningOn,
    On,
    TurningOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessMode {
    Manual,
    Automatic,
}

/// Audio routing mode. Everything but `Normal` belongs to telephony.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Normal,
    Ringtone,
    InCall,
    InCommunication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingerMode {
    Silent,
    Vibrate,
    Normal,
}

/// System surfaces the key handler can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSurface {
    Settings,
}

/// Station and access-point Wi-Fi control.
pub trait RadioControl: Send + Sync {
    fn wifi_state(&self) -> RadioState;
    fn wifi_ap_state(&self) -> RadioState;
    fn set_wifi_enabled(&self, enabled: bool);
    fn set_wifi_ap_enabled(&self, enabled: bool);
}

pub trait BluetoothControl: Send + Sync {
    fn state(&self) -> BluetoothState;
    fn enable(&self);
    fn disable(&self);
}

/// Hardware switch of the dock touchpad.
pub trait TouchpadControl: Send + Sync {
    fn set_enabled(&self, enabled: bool) -> Result<()>;
}

/// Backlight level and mode.
pub trait DisplayControl: Send + Sync {
    /// Persisted brightness level, `None` if never set.
    fn brightness(&self) -> Option<i32>;
    /// Persist a brightness level.
    fn set_brightness(&self, value: i32);
    /// Apply a brightness level immediately through the power manager.
    fn set_temporary_brightness(&self, value: i32) -> Result<()>;
    /// Persisted brightness mode, `None` if never set.
    fn brightness_mode(&self) -> Option<BrightnessMode>;
    fn set_brightness_mode(&self, mode: BrightnessMode);
    /// Whether the device has an ambient light sensor driving automatic mode.
    fn automatic_brightness_available(&self) -> bool;
}

pub trait AudioControl: Send + Sync {
    fn mode(&self) -> CallMode;
    fn ringer_mode(&self) -> RingerMode;
    fn set_ringer_mode(&self, mode: RingerMode);
}

pub trait NavigationControl: Send + Sync {
    /// Bring a system surface to the front. Fails if it is not installed.
    fn navigate(&self, surface: SystemSurface) -> Result<()>;
}

/// The system screenshot capture service.
///
/// Callbacks into the [`ScreenshotConnection`] and [`CaptureReply`] may come
/// from any thread, but never from within `bind`, `capture` or `unbind`.
pub trait ScreenshotService: Send + Sync {
    /// Start binding to the service. Returns false if the service cannot be
    /// bound; otherwise `connection.connected()` is called once it is ready.
    fn bind(&self, connection: ScreenshotConnection) -> bool;
    /// Send the capture command. The service calls `reply.complete()` when the
    /// screenshot has been taken.
    fn capture(&self, token: SessionToken, reply: CaptureReply) -> Result<()>;
    /// Release the binding made for `token`.
    fn unbind(&self, token: SessionToken);
}

/// Durable integer settings.
pub trait SettingsStore: Send + Sync {
    fn get_int(&self, key: &str) -> Option<i32>;
    fn put_int(&self, key: &str, value: i32) -> Result<()>;
}

/// The set of platform capabilities a key handler works against.
#[derive(Clone)]
pub struct Platform {
    pub radio: Arc<dyn RadioControl>,
    pub bluetooth: Arc<dyn BluetoothControl>,
    pub touchpad: Arc<dyn TouchpadControl>,
    pub display: Arc<dyn DisplayControl>,
    pub audio: Arc<dyn AudioControl>,
    pub navigation: Arc<dyn NavigationControl>,
    pub screenshot: Arc<dyn ScreenshotService>,
    pub settings: Arc<dyn SettingsStore>,
}
