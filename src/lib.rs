//! Hotkey, touchpad and battery handling for detachable keyboard docks.
//!
//! This crate is the control layer between the dock's hardware and the
//! host platform. It has two independent parts:
//!
//! - [`KeyHandler`] maps dock scan codes to platform actions (radio toggles,
//!   backlight, screenshots, ...) and owns the touchpad enable state.
//! - [`DockBatteryHandler`] polls the dock battery and reports when its
//!   power state changed.
//!
//! Platform services are reached through the traits in [`platform`], so the
//! handlers can be driven by real services or by fakes.
//!
//! # Features
//!
//! - **Scan code dispatch** - Only the first key-down of a press triggers an action
//! - **Touchpad state** - Persisted and re-applied every time the dock is attached
//! - **Screenshot handshake** - One capture at a time, released on completion or timeout
//! - **Battery change detection** - Reports dock power changes exactly once
//! - **Linux hardware access** - evdev key input, the asusdec touchpad ioctl and sysfs battery readings
//!
//! # Example
//!
//! ```no_run
//! use asusdec::{DockConfig, DockListenerBuilder, KeyHandler, Platform};
//! use std::time::Duration;
//!
//! fn run(platform: Platform) -> anyhow::Result<()> {
//!     let config = DockConfig::default();
//!     let mut keys = KeyHandler::from_config(platform, &config)?;
//!
//!     let handle = DockListenerBuilder::from_config(&config).build()?.start()?;
//!     loop {
//!         if let Ok(event) = handle.recv_timeout(Duration::from_millis(100)) {
//!             keys.handle_input(&event);
//!         }
//!     }
//! }
//! ```
//!
//! # Linux Requirements
//!
//! Reading the dock keyboard needs permission to open `/dev/input/event*`,
//! and switching the touchpad needs write access to `/dev/asusdec`.

mod action;
mod battery;
mod config;
mod dispatcher;
mod event;
mod hotkey;
mod listener;
pub mod native;
pub mod platform;
mod screenshot;
mod settings;
mod sysfs;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
mod touchpad;

pub use action::Action;
pub use battery::{
    BatterySensor, DockBatteryHandler, DockBatteryNotification, DockBatteryStatus,
    DockPowerSnapshot, DockPowerStateTracker, PluggedType, RawDockPowerSnapshot,
};
pub use config::DockConfig;
pub use dispatcher::{KeyHandler, BRIGHTNESS_STEP, MAXIMUM_BACKLIGHT, MINIMUM_BACKLIGHT};
pub use event::{DockState, InputEvent, KeyAction, KeyEvent};
pub use hotkey::{parse_binding, scancode, HotkeyMap};
pub use listener::{DockListener, DockListenerBuilder, DockListenerHandle};
pub use platform::Platform;
pub use screenshot::{
    CaptureReply, ScreenshotCapture, ScreenshotConnection, SessionToken, SCREENSHOT_TIMEOUT,
};
pub use settings::{DirSettings, MemorySettings, DEFAULT_SETTINGS_DIR, TOUCHPAD_STATUS};
pub use sysfs::{PowerSupplyPaths, SysfsBatterySensor};

#[cfg(target_os = "linux")]
pub use linux::find_dock_keyboards;

#[cfg(target_os = "linux")]
pub use touchpad::AsusdecTouchpad;
