//! Touchpad switch of the dock embedded controller.

use crate::config::DockConfig;
use crate::native::ASUSDEC_DEV;
use crate::platform::TouchpadControl;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

// From drivers/input/asusec/asusdec.h
const ASUSDEC_TP_ON: libc::c_int = 1;
const ASUSDEC_TP_OFF: libc::c_int = 0;
const ASUSDEC_IOC_MAGIC: u8 = 0xf4;

nix::ioctl_write_int_bad!(
    asusdec_tp_control,
    nix::request_code_read!(ASUSDEC_IOC_MAGIC, 5, std::mem::size_of::<libc::c_int>())
);

/// [`TouchpadControl`] talking to the asusdec driver.
#[derive(Debug, Clone)]
pub struct AsusdecTouchpad {
    device: PathBuf,
}

impl AsusdecTouchpad {
    pub fn new() -> Self {
        Self::with_device(ASUSDEC_DEV)
    }

    /// Use the touchpad device from `config`.
    pub fn from_config(config: &DockConfig) -> Self {
        Self::with_device(&config.touchpad_device)
    }

    pub fn with_device(device: impl Into<PathBuf>) -> Self {
        crate::native::init();
        Self {
            device: device.into(),
        }
    }

    pub fn device(&self) -> &Path {
        &self.device
    }
}

impl Default for AsusdecTouchpad {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchpadControl for AsusdecTouchpad {
    fn set_enabled(&self, enabled: bool) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.device)
            .with_context(|| format!("Could not open device {:?}", self.device))?;

        let on = if enabled { ASUSDEC_TP_ON } else { ASUSDEC_TP_OFF };
        // SAFETY: the fd stays open for the duration of the call and the
        // request takes its argument by value.
        unsafe { asusdec_tp_control(file.as_raw_fd(), on) }
            .with_context(|| format!("Touchpad ioctl failed on {:?}", self.device))?;

        log::debug!("Touchpad is {}", on);
        Ok(())
    }
}
