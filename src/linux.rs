//! Dock keyboard input using evdev.

use crate::event::{DockState, InputEvent, KeyEvent};
use anyhow::{anyhow, Context, Result};
use evdev::Device;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use std::collections::HashMap;
use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Find the dock keyboard devices in /dev/input.
///
/// A device matches when its name contains `name_filter` (ignoring case)
/// and it reports key events.
pub fn find_dock_keyboards(name_filter: &str) -> Result<Vec<Device>> {
    let filter = name_filter.to_lowercase();
    let mut keyboards = Vec::new();

    for entry in std::fs::read_dir("/dev/input")? {
        let entry = entry?;
        let path = entry.path();

        if !path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false)
        {
            continue;
        }

        if let Ok(device) = Device::open(&path) {
            let name_matches = device
                .name()
                .map(|n| n.to_lowercase().contains(&filter))
                .unwrap_or(false);
            if name_matches && device.supported_keys().is_some() {
                log::debug!("Found dock keyboard: {:?} at {:?}", device.name(), path);
                keyboards.push(device);
            }
        }
    }

    if keyboards.is_empty() {
        Err(anyhow!(
            "No dock keyboard matching {:?} found. Is the dock attached and are you in the 'input' group?",
            name_filter
        ))
    } else {
        Ok(keyboards)
    }
}

/// Open the dock keyboards, treating a missing dock as a valid start state.
///
/// Returns the devices found and whether the dock is currently detached.
pub fn open_dock_keyboards(name_filter: &str) -> (Vec<Device>, bool) {
    initial_devices(find_dock_keyboards(name_filter))
}

fn initial_devices<T>(found: Result<Vec<T>>) -> (Vec<T>, bool) {
    match found {
        Ok(devices) if !devices.is_empty() => (devices, false),
        Ok(devices) => (devices, true),
        Err(e) => {
            log::info!("Starting undocked: {:#}", e);
            (Vec::new(), true)
        }
    }
}

/// Set non-blocking mode on keyboard devices.
fn set_nonblocking(keyboards: &[Device]) -> Result<()> {
    for device in keyboards {
        let fd = device.as_raw_fd();
        let flags = fcntl(fd, FcntlArg::F_GETFL).context("Failed to get fd flags")?;
        let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
        fcntl(fd, FcntlArg::F_SETFL(flags)).context("Failed to set non-blocking")?;
    }
    Ok(())
}

fn would_block(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::EAGAIN) || e.raw_os_error() == Some(libc::EWOULDBLOCK)
}

/// Drain events queued before the keyboards were (re)opened so that stale
/// presses don't trigger actions.
fn drain_events(keyboards: &mut [Device]) {
    for device in keyboards.iter_mut() {
        let device_name = device.name().map(String::from);
        loop {
            match device.fetch_events() {
                Ok(events) => {
                    let count = events.count();
                    if count == 0 {
                        break;
                    }
                    log::debug!("Drained {} stale events from {:?}", count, device_name);
                }
                Err(e) => {
                    if !would_block(&e) {
                        log::debug!("Error draining events from {:?}: {}", device_name, e);
                    }
                    break;
                }
            }
        }
    }
}

/// Turns raw `EV_KEY` values into [`KeyEvent`]s with repeat counts.
///
/// The kernel reports 1 for press, 0 for release and 2 for auto-repeat.
#[derive(Debug, Default)]
pub(crate) struct KeyTranslator {
    repeats: HashMap<u16, u32>,
}

impl KeyTranslator {
    pub(crate) fn translate(&mut self, code: u16, value: i32) -> Option<KeyEvent> {
        match value {
            1 => {
                self.repeats.insert(code, 0);
                Some(KeyEvent::down(code))
            }
            2 => {
                let count = self.repeats.entry(code).or_insert(0);
                *count += 1;
                Some(KeyEvent::repeat(code, *count))
            }
            0 => {
                self.repeats.remove(&code);
                Some(KeyEvent::up(code))
            }
            _ => None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.repeats.clear();
    }
}

/// Linux dock input source using evdev.
pub struct DockInputSource {
    keyboards: Vec<Device>,
    name_filter: String,
}

impl DockInputSource {
    /// Create a source reading from the given keyboards. `name_filter` is
    /// used to find them again after the dock has been reattached. With no
    /// keyboards the source starts undocked and waits for the dock.
    pub fn new(keyboards: Vec<Device>, name_filter: String) -> Self {
        Self {
            keyboards,
            name_filter,
        }
    }

    /// Start reading in a background thread.
    /// Returns a receiver for input events.
    pub fn start(self, running: Arc<AtomicBool>) -> Result<Receiver<InputEvent>> {
        let (tx, rx) = mpsc::channel();
        set_nonblocking(&self.keyboards)?;
        start_dock_listener(self.keyboards, self.name_filter, running, tx);
        Ok(rx)
    }
}

fn start_dock_listener(
    keyboards: Vec<Device>,
    name_filter: String,
    running: Arc<AtomicBool>,
    tx: Sender<InputEvent>,
) {
    thread::spawn(move || {
        let mut keyboards = keyboards;
        let mut translator = KeyTranslator::default();
        let mut undocked = keyboards.is_empty();
        // None until the first rescan, so an undocked start looks right away.
        let mut last_rescan: Option<Instant> = None;

        const RESCAN_INTERVAL: Duration = Duration::from_secs(3);

        while running.load(Ordering::Relaxed) {
            let rescan_due = last_rescan.map_or(true, |t| t.elapsed() >= RESCAN_INTERVAL);
            if undocked && rescan_due {
                log::debug!("Looking for the dock keyboard...");
                match find_dock_keyboards(&name_filter) {
                    Ok(mut new_keyboards) => {
                        // Give the embedded controller time to settle
                        thread::sleep(Duration::from_millis(100));

                        match set_nonblocking(&new_keyboards) {
                            Ok(()) => {
                                log::info!(
                                    "Dock attached: found {} device(s)",
                                    new_keyboards.len()
                                );
                                drain_events(&mut new_keyboards);
                                keyboards.clear();
                                keyboards = new_keyboards;
                                translator.reset();
                                undocked = false;
                                if tx.send(InputEvent::Dock(DockState::Docked)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                log::warn!("Failed to set non-blocking on dock keyboard: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        log::debug!("Dock keyboard not available: {}", e);
                    }
                }
                last_rescan = Some(Instant::now());
            }

            let mut any_error = false;

            for device in keyboards.iter_mut() {
                match device.fetch_events() {
                    Ok(events) => {
                        for event in events {
                            if let evdev::InputEventKind::Key(key) = event.kind() {
                                if let Some(key_event) =
                                    translator.translate(key.code(), event.value())
                                {
                                    let _ = tx.send(InputEvent::Key(key_event));
                                }
                            }
                        }
                    }
                    Err(e) => {
                        if !would_block(&e) {
                            log::debug!("Dock keyboard read error: {}", e);
                            any_error = true;
                        }
                    }
                }
            }

            // A read error on the dock keyboard means the dock went away.
            if any_error && !undocked {
                log::info!("Dock detached");
                keyboards.clear();
                undocked = true;
                last_rescan = Some(Instant::now());
                let _ = tx.send(InputEvent::Dock(DockState::Undocked));
            }

            thread::sleep(Duration::from_millis(10));
        }
    });
}
