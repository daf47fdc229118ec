//! Dock input listener builder.

use crate::config::DockConfig;
use crate::event::InputEvent;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Name of the dock keyboard input device.
pub const DEFAULT_DEVICE_NAME: &str = "asusdec";

/// Builder for creating a dock input listener.
pub struct DockListenerBuilder {
    device_name: String,
}

impl Default for DockListenerBuilder {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
        }
    }
}

impl DockListenerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for the input device named in `config`.
    pub fn from_config(config: &DockConfig) -> Self {
        Self::new().device_name(&config.input_device_name)
    }

    /// Match input devices whose name contains `name`.
    pub fn device_name(mut self, name: &str) -> Self {
        self.device_name = name.to_string();
        self
    }

    /// Build the listener. A detached dock is not an error; the listener
    /// then reports `Docked` once the dock keyboard shows up.
    #[cfg(target_os = "linux")]
    pub fn build(self) -> Result<DockListener> {
        let (keyboards, undocked) = crate::linux::open_dock_keyboards(&self.device_name);
        if undocked {
            log::info!("Dock keyboard {:?} not attached, waiting for it", self.device_name);
        }
        Ok(DockListener {
            inner: crate::linux::DockInputSource::new(keyboards, self.device_name),
        })
    }

    /// Build the listener (unsupported platform stub).
    #[cfg(not(target_os = "linux"))]
    pub fn build(self) -> Result<DockListener> {
        anyhow::bail!("Dock input is only supported on Linux")
    }
}

/// A dock input listener that runs in a background thread.
pub struct DockListener {
    #[cfg(target_os = "linux")]
    inner: crate::linux::DockInputSource,
    #[cfg(not(target_os = "linux"))]
    inner: (),
}

impl DockListener {
    /// Start listening in a background thread.
    ///
    /// Returns a [`DockListenerHandle`] that receives input events.
    /// The background thread automatically stops when the handle is dropped.
    #[cfg(target_os = "linux")]
    pub fn start(self) -> Result<DockListenerHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let rx = self.inner.start(Arc::clone(&running))?;
        Ok(DockListenerHandle { running, rx })
    }

    /// Start listening (unsupported platform stub).
    #[cfg(not(target_os = "linux"))]
    pub fn start(self) -> Result<DockListenerHandle> {
        let _ = self.inner;
        anyhow::bail!("Dock input is only supported on Linux")
    }
}

/// Handle for receiving dock input events.
///
/// # Example
///
/// ```no_run
/// use asusdec::DockListenerBuilder;
/// use std::time::Duration;
///
/// let handle = DockListenerBuilder::new().build().unwrap().start().unwrap();
///
/// while let Ok(event) = handle.recv_timeout(Duration::from_millis(100)) {
///     println!("Event: {:?}", event);
/// }
/// ```
pub struct DockListenerHandle {
    running: Arc<AtomicBool>,
    rx: Receiver<InputEvent>,
}

impl DockListenerHandle {
    /// Block until the next input event.
    pub fn recv(&self) -> Result<InputEvent, RecvError> {
        self.rx.recv()
    }

    /// Wait for the next input event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<InputEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Try to receive an input event without blocking.
    pub fn try_recv(&self) -> Result<InputEvent, std::sync::mpsc::TryRecvError> {
        self.rx.try_recv()
    }

    /// Check if the listener is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Manually stop the listener.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for DockListenerHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_build_without_dock_succeeds() {
        let listener = DockListenerBuilder::new()
            .device_name("no-such-dock-keyboard")
            .build();
        assert!(listener.is_ok());
    }

    #[test]
    fn test_builder_from_config() {
        let config = DockConfig {
            input_device_name: "dock-kbd".to_string(),
            ..Default::default()
        };
        let builder = DockListenerBuilder::from_config(&config);
        assert_eq!(builder.device_name, "dock-kbd");
        assert_eq!(DockListenerBuilder::new().device_name, DEFAULT_DEVICE_NAME);
    }
}
