//! Dock battery readings from the kernel power supply class.

use crate::battery::{BatterySensor, DockBatteryStatus, RawDockPowerSnapshot};
use crate::config::DockConfig;
use std::path::{Path, PathBuf};

/// Attribute files of the power supplies the dock battery handler reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerSupplyPaths {
    pub dock_battery_status: Option<PathBuf>,
    pub dock_battery_capacity: Option<PathBuf>,
    pub dock_battery_present: Option<PathBuf>,
    pub pad_usb_online: Option<PathBuf>,
    pub ac_online: Option<PathBuf>,
    pub dock_ac_online: Option<PathBuf>,
}

impl PowerSupplyPaths {
    /// Scan a power supply directory (normally `/sys/class/power_supply`)
    /// and pick up the attribute files by supply type.
    pub fn discover(root: &Path) -> Self {
        let mut paths = Self::default();

        match std::fs::read_dir(root) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let dir = entry.path();
                    let Some(kind) = read_attribute(&dir.join("type")) else {
                        continue;
                    };
                    match kind.as_str() {
                        "Mains" => paths.ac_online = readable(dir.join("online")),
                        "USB" => paths.pad_usb_online = readable(dir.join("online")),
                        "DockBattery" => {
                            paths.dock_battery_status = readable(dir.join("status"));
                            paths.dock_battery_capacity = readable(dir.join("capacity"));
                            paths.dock_battery_present =
                                readable(dir.join("device").join("ec_dock"));
                        }
                        "DockAC" => paths.dock_ac_online = readable(dir.join("online")),
                        _ => {}
                    }
                }
            }
            Err(e) => log::error!("Could not open {:?}: {}", root, e),
        }

        paths.log_missing();
        paths
    }

    fn log_missing(&self) {
        let entries = [
            ("dock battery status", &self.dock_battery_status),
            ("dock battery capacity", &self.dock_battery_capacity),
            ("dock battery present", &self.dock_battery_present),
            ("pad usb online", &self.pad_usb_online),
            ("dock ac online", &self.dock_ac_online),
            ("ac online", &self.ac_online),
        ];
        for (name, path) in entries {
            if path.is_none() {
                log::error!("{} path not found", name);
            }
        }
    }
}

fn readable(path: PathBuf) -> Option<PathBuf> {
    std::fs::File::open(&path).ok().map(|_| path)
}

/// Read a sysfs attribute with trailing newlines stripped.
/// Returns `None` if the file can't be read or is empty.
fn read_attribute(path: &Path) -> Option<String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Could not read {:?}: {}", path, e);
            return None;
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    let text = text.trim_end_matches('\n');
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn read_optional(path: &Option<PathBuf>) -> Option<String> {
    path.as_deref().and_then(read_attribute)
}

/// Leading decimal integer of `s`, 0 if there is none.
fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i32>().map(|v| sign * v).unwrap_or(0)
}

fn parse_status(s: &str) -> DockBatteryStatus {
    match s.chars().next() {
        Some('C') => DockBatteryStatus::Charging,
        Some('N') => DockBatteryStatus::NotCharging,
        _ => {
            log::warn!("Unknown dock battery status '{}'", s);
            DockBatteryStatus::Unknown
        }
    }
}

/// The `ec_dock` attribute reads "dock detect = 1" when the dock is attached.
fn parse_present(s: &str) -> bool {
    s.as_bytes().get(14) == Some(&b'1')
}

fn parse_online(s: &str) -> bool {
    !s.starts_with('0')
}

/// [`BatterySensor`] reading the dock power supplies from sysfs.
#[derive(Debug, Clone)]
pub struct SysfsBatterySensor {
    paths: PowerSupplyPaths,
}

impl SysfsBatterySensor {
    /// Use the power supplies found during native initialization.
    pub fn new() -> Self {
        Self {
            paths: crate::native::init().power_supply.clone(),
        }
    }

    /// Use the power supply root from `config`, sharing the process-wide
    /// scan when it is the system default.
    pub fn from_config(config: &DockConfig) -> Self {
        if config.power_supply_root == Path::new(crate::native::POWER_SUPPLY_PATH) {
            Self::new()
        } else {
            Self::with_root(&config.power_supply_root)
        }
    }

    /// Discover power supplies below a custom root.
    pub fn with_root(root: &Path) -> Self {
        Self::with_paths(PowerSupplyPaths::discover(root))
    }

    pub fn with_paths(paths: PowerSupplyPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PowerSupplyPaths {
        &self.paths
    }
}

impl Default for SysfsBatterySensor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatterySensor for SysfsBatterySensor {
    fn poll(&mut self) -> RawDockPowerSnapshot {
        let level = read_optional(&self.paths.dock_battery_capacity)
            .map(|s| parse_leading_int(&s))
            .unwrap_or(0);
        let status = read_optional(&self.paths.dock_battery_status)
            .map(|s| parse_status(&s))
            .unwrap_or_default();
        let present = read_optional(&self.paths.dock_battery_present)
            .map(|s| parse_present(&s))
            .unwrap_or(false);
        let online = |path: &Option<PathBuf>| {
            read_optional(path)
                .map(|s| parse_online(&s))
                .unwrap_or(false)
        };

        RawDockPowerSnapshot {
            status,
            level: level.clamp(0, 100) as u8,
            present,
            usb_online: online(&self.paths.pad_usb_online),
            ac_online: online(&self.paths.ac_online),
            dock_ac_online: online(&self.paths.dock_ac_online),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn supply(root: &Path, name: &str, kind: &str, attrs: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), format!("{}\n", kind)).unwrap();
        for (attr, value) in attrs {
            let path = dir.join(attr);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, value).unwrap();
        }
    }

    fn dock_tree(root: &Path) {
        supply(
            root,
            "dock_battery",
            "DockBattery",
            &[
                ("status", "Charging\n"),
                ("capacity", "55\n"),
                ("device/ec_dock", "dock detect = 1\n"),
            ],
        );
        supply(root, "dock_ac", "DockAC", &[("online", "0\n")]);
        supply(root, "ac", "Mains", &[("online", "0\n")]);
        supply(root, "usb", "USB", &[("online", "1\n")]);
        supply(root, "battery", "Battery", &[("capacity", "80\n")]);
    }

    #[test]
    fn test_discover_paths() {
        let tmp = tempfile::tempdir().unwrap();
        dock_tree(tmp.path());

        let paths = PowerSupplyPaths::discover(tmp.path());
        assert_eq!(
            paths.dock_battery_present,
            Some(tmp.path().join("dock_battery/device/ec_dock"))
        );
        assert_eq!(paths.pad_usb_online, Some(tmp.path().join("usb/online")));
        assert_eq!(paths.ac_online, Some(tmp.path().join("ac/online")));
        assert_eq!(paths.dock_ac_online, Some(tmp.path().join("dock_ac/online")));
    }

    #[test]
    fn test_poll_reads_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        dock_tree(tmp.path());

        let raw = SysfsBatterySensor::with_root(tmp.path()).poll();
        assert_eq!(
            raw,
            RawDockPowerSnapshot {
                status: DockBatteryStatus::Charging,
                level: 55,
                present: true,
                usb_online: true,
                ac_online: false,
                dock_ac_online: false,
            }
        );
    }

    #[test]
    fn test_from_config_custom_root() {
        let tmp = tempfile::tempdir().unwrap();
        dock_tree(tmp.path());
        let config = DockConfig {
            power_supply_root: tmp.path().to_path_buf(),
            ..Default::default()
        };

        let sensor = SysfsBatterySensor::from_config(&config);
        assert_eq!(
            sensor.paths().ac_online,
            Some(tmp.path().join("ac/online"))
        );
    }

    #[test]
    fn test_poll_without_supplies_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = SysfsBatterySensor::with_root(tmp.path()).poll();
        assert_eq!(raw, RawDockPowerSnapshot::default());

        let missing = tmp.path().join("missing");
        let raw = SysfsBatterySensor::with_root(&missing).poll();
        assert_eq!(raw, RawDockPowerSnapshot::default());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_leading_int("42%"), 42);
        assert_eq!(parse_leading_int(" -3"), -3);
        assert_eq!(parse_leading_int("full"), 0);

        assert_eq!(parse_status("Not charging"), DockBatteryStatus::NotCharging);
        assert_eq!(parse_status("Discharging"), DockBatteryStatus::Unknown);

        assert!(parse_present("dock detect = 1"));
        assert!(!parse_present("dock detect = 0"));
        assert!(!parse_present("short"));

        assert!(parse_online("1"));
        assert!(!parse_online("0"));
    }
}
