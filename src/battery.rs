//! Dock battery and power source state.

use serde::Serialize;

/// Charging status reported by the dock battery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DockBatteryStatus {
    #[default]
    Unknown,
    Charging,
    NotCharging,
}

impl DockBatteryStatus {
    /// Platform battery status constant used in broadcasts.
    pub fn code(&self) -> i32 {
        match self {
            DockBatteryStatus::Unknown => 1,
            DockBatteryStatus::Charging => 2,
            DockBatteryStatus::NotCharging => 4,
        }
    }
}

/// Power source feeding the dock battery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PluggedType {
    #[default]
    None,
    Ac,
    Usb,
}

impl PluggedType {
    /// Derive the power source from the online flags. AC sources win over USB.
    pub fn from_sources(dock_ac_online: bool, ac_online: bool, usb_online: bool) -> Self {
        if dock_ac_online || ac_online {
            PluggedType::Ac
        } else if usb_online {
            PluggedType::Usb
        } else {
            PluggedType::None
        }
    }

    /// Platform plug type constant used in broadcasts.
    pub fn code(&self) -> i32 {
        match self {
            PluggedType::None => 0,
            PluggedType::Ac => 1,
            PluggedType::Usb => 2,
        }
    }
}

/// One reading of the dock battery sensors, as produced by the hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawDockPowerSnapshot {
    pub status: DockBatteryStatus,
    /// Charge level in percent.
    pub level: u8,
    pub present: bool,
    pub usb_online: bool,
    pub ac_online: bool,
    pub dock_ac_online: bool,
}

/// Normalized dock power state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DockPowerSnapshot {
    pub status: DockBatteryStatus,
    pub level: u8,
    pub present: bool,
    pub plugged: PluggedType,
    pub usb_online: bool,
    pub ac_online: bool,
    pub dock_ac_online: bool,
}

impl DockPowerSnapshot {
    pub fn is_plugged(&self) -> bool {
        self.present && self.plugged != PluggedType::None
    }
}

impl From<RawDockPowerSnapshot> for DockPowerSnapshot {
    fn from(raw: RawDockPowerSnapshot) -> Self {
        Self {
            status: raw.status,
            level: raw.level.min(100),
            present: raw.present,
            plugged: PluggedType::from_sources(raw.dock_ac_online, raw.ac_online, raw.usb_online),
            usb_online: raw.usb_online,
            ac_online: raw.ac_online,
            dock_ac_online: raw.dock_ac_online,
        }
    }
}

/// Decides when a new snapshot is worth reporting.
///
/// Not internally synchronized; one poller per tracker.
#[derive(Debug)]
pub struct DockPowerStateTracker {
    last_reported: Option<DockPowerSnapshot>,
    is_first_report: bool,
}

impl Default for DockPowerStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DockPowerStateTracker {
    pub fn new() -> Self {
        Self {
            last_reported: None,
            is_first_report: true,
        }
    }

    /// Normalize `raw` and report whether it differs from the previous
    /// snapshot. The first update is always a change. The new snapshot is
    /// remembered either way.
    pub fn update(&mut self, raw: RawDockPowerSnapshot) -> (DockPowerSnapshot, bool) {
        let snapshot = DockPowerSnapshot::from(raw);
        let changed = self.is_first_report || self.last_reported != Some(snapshot);

        self.is_first_report = false;
        self.last_reported = Some(snapshot);
        (snapshot, changed)
    }

    /// The most recent snapshot, if any.
    pub fn last_reported(&self) -> Option<&DockPowerSnapshot> {
        self.last_reported.as_ref()
    }
}

/// Source of raw dock battery readings.
pub trait BatterySensor {
    fn poll(&mut self) -> RawDockPowerSnapshot;
}

/// Payload broadcast to the platform when the dock power state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DockBatteryNotification {
    pub dock_status: i32,
    pub dock_level: u8,
    pub dock_present: bool,
    pub dock_plugged: i32,
    pub usb_wakeup: bool,
    pub ac_online: bool,
    pub dock_ac_online: bool,
}

impl From<&DockPowerSnapshot> for DockBatteryNotification {
    fn from(snapshot: &DockPowerSnapshot) -> Self {
        Self {
            dock_status: snapshot.status.code(),
            dock_level: snapshot.level,
            dock_present: snapshot.present,
            dock_plugged: snapshot.plugged.code(),
            usb_wakeup: snapshot.usb_online,
            ac_online: snapshot.ac_online,
            dock_ac_online: snapshot.dock_ac_online,
        }
    }
}

/// Polls a [`BatterySensor`] and tracks which readings need a broadcast.
pub struct DockBatteryHandler<S> {
    sensor: S,
    tracker: DockPowerStateTracker,
    current: DockPowerSnapshot,
    pending: bool,
}

impl<S: BatterySensor> DockBatteryHandler<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor,
            tracker: DockPowerStateTracker::new(),
            current: DockPowerSnapshot::default(),
            pending: false,
        }
    }

    /// Take a fresh reading from the sensor.
    pub fn update(&mut self) {
        let raw = self.sensor.poll();
        let (snapshot, changed) = self.tracker.update(raw);
        if changed {
            log::debug!("Dock power state changed: {:?}", snapshot);
        }
        self.current = snapshot;
        self.pending |= changed;
    }

    /// Whether any update since the last call reported a change.
    pub fn has_new_data(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn notify_data(&self) -> DockBatteryNotification {
        DockBatteryNotification::from(&self.current)
    }

    pub fn snapshot(&self) -> &DockPowerSnapshot {
        &self.current
    }

    pub fn is_plugged(&self) -> bool {
        self.current.is_plugged()
    }
}
