//! Dock configuration file.

use crate::hotkey::{parse_binding, HotkeyMap};
use crate::listener::DEFAULT_DEVICE_NAME;
use crate::native::{ASUSDEC_DEV, POWER_SUPPLY_PATH};
use crate::screenshot::SCREENSHOT_TIMEOUT;
use crate::settings::DEFAULT_SETTINGS_DIR;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for wiring the dock handlers to the hardware.
///
/// ```toml
/// input_device_name = "asusdec"
/// screenshot_timeout_ms = 10000
/// bindings = ["212=screenshot", "113=toggle-audio-mute"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DockConfig {
    /// Substring of the dock keyboard's input device name.
    pub input_device_name: String,
    pub touchpad_device: PathBuf,
    pub power_supply_root: PathBuf,
    /// Directory holding the persisted touchpad flag.
    pub settings_dir: PathBuf,
    pub screenshot_timeout_ms: u64,
    /// Extra `<scancode>=<action>` bindings on top of the dock defaults.
    pub bindings: Vec<String>,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            input_device_name: DEFAULT_DEVICE_NAME.to_string(),
            touchpad_device: PathBuf::from(ASUSDEC_DEV),
            power_supply_root: PathBuf::from(POWER_SUPPLY_PATH),
            settings_dir: PathBuf::from(DEFAULT_SETTINGS_DIR),
            screenshot_timeout_ms: SCREENSHOT_TIMEOUT.as_millis() as u64,
            bindings: Vec::new(),
        }
    }
}

impl DockConfig {
    /// Load a config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config {:?}", path))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse TOML")?;
        config.hotkey_map()?;
        Ok(config)
    }

    /// The dock default bindings with the configured overrides applied.
    pub fn hotkey_map(&self) -> Result<HotkeyMap> {
        let mut map = HotkeyMap::dock_default();
        for binding in &self.bindings {
            let (scan_code, action) = parse_binding(binding)?;
            map = map.with_binding(scan_code, action);
        }
        Ok(map)
    }

    pub fn screenshot_timeout(&self) -> Duration {
        Duration::from_millis(self.screenshot_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DockConfig::from_toml_str("").unwrap();
        assert_eq!(config, DockConfig::default());
        assert_eq!(config.screenshot_timeout(), SCREENSHOT_TIMEOUT);
        assert_eq!(config.touchpad_device, Path::new(ASUSDEC_DEV));
        assert_eq!(config.power_supply_root, Path::new(POWER_SUPPLY_PATH));
        assert_eq!(config.hotkey_map().unwrap(), HotkeyMap::dock_default());
    }

    #[test]
    fn test_bindings_override_defaults() {
        let config = DockConfig::from_toml_str(
            r#"
            input_device_name = "dock-kbd"
            screenshot_timeout_ms = 500
            bindings = ["238=screenshot", "30 = toggle-touchpad"]
            "#,
        )
        .unwrap();

        let map = config.hotkey_map().unwrap();
        assert_eq!(config.input_device_name, "dock-kbd");
        assert_eq!(config.screenshot_timeout(), Duration::from_millis(500));
        assert_eq!(map.lookup(238), Some(Action::Screenshot));
        assert_eq!(map.lookup(30), Some(Action::ToggleTouchpad));
    }

    #[test]
    fn test_invalid_binding_rejected() {
        assert!(DockConfig::from_toml_str(r#"bindings = ["238=reboot"]"#).is_err());
        assert!(DockConfig::from_toml_str("screenshot_timeout_ms = \"soon\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("asusdec.toml");
        std::fs::write(&path, "settings_dir = \"/tmp/asusdec\"\n").unwrap();

        let config = DockConfig::load(&path).unwrap();
        assert_eq!(config.settings_dir, PathBuf::from("/tmp/asusdec"));
        assert!(DockConfig::load(&tmp.path().join("missing.toml")).is_err());
    }
}
