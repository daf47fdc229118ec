//! Process-wide hardware initialization.
//!
//! The power supply scan runs once per process, before the first hardware
//! access. Every hardware adapter calls [`init`] on construction, so callers
//! never need to do it themselves.

use crate::sysfs::PowerSupplyPaths;
use std::path::Path;
use std::sync::OnceLock;

/// Root of the kernel power supply class.
pub const POWER_SUPPLY_PATH: &str = "/sys/class/power_supply";

/// Character device of the dock embedded controller.
pub const ASUSDEC_DEV: &str = "/dev/asusdec";

/// Hardware state shared by all handlers in the process.
#[derive(Debug)]
pub struct NativeState {
    pub power_supply: PowerSupplyPaths,
}

static NATIVE: OnceLock<NativeState> = OnceLock::new();

/// Initialize the hardware layer. Idempotent.
pub fn init() -> &'static NativeState {
    NATIVE.get_or_init(|| {
        let state = NativeState {
            power_supply: PowerSupplyPaths::discover(Path::new(POWER_SUPPLY_PATH)),
        };
        log::info!("Dock hardware layer initialized");
        state
    })
}

pub fn is_initialized() -> bool {
    NATIVE.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = init() as *const NativeState;
        let second = init() as *const NativeState;
        assert_eq!(first, second);
        assert!(is_initialized());
    }
}
