use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Captured outcome of one external command invocation. Produced once per
/// invocation and owned by the caller that issued the command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Last non-empty stdout line, trimmed. Install/uninstall report their
    /// verdict there.
    pub fn last_stdout_line(&self) -> Option<String> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .next_back()
            .map(str::to_string)
    }
}

/// Connection state as reported by the device list or `get-state`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Device,
    Offline,
    Unauthorized,
    NoDevice,
    NoPermissions,
    Unknown,
}

impl DeviceState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "device" => DeviceState::Device,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            "no device" => DeviceState::NoDevice,
            "no permissions" => DeviceState::NoPermissions,
            _ => DeviceState::Unknown,
        }
    }

    /// True when the device can be expected to answer shell queries.
    pub fn is_interactive(self) -> bool {
        matches!(self, DeviceState::Device)
    }
}

/// One entry of the bridge tool's device list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceRecord {
    /// USB serial or `ip:port` for network-attached devices.
    pub identifier: String,
    pub state: DeviceState,
    pub is_remote: bool,
}

/// Property map from `getprop` or a dumpsys scrape. Keys unique, last write
/// wins, order irrelevant.
pub type PropertyMap = HashMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatteryInfo {
    pub level: Option<u8>,
    pub health: Option<String>,
    pub status: Option<String>,
    pub voltage: Option<String>,
    pub current_temp: Option<String>,
    pub max_temp: Option<String>,
    pub max_current: Option<String>,
    /// True if AC, USB or wireless powered.
    pub powered: bool,
}

/// One line of the `meminfo` "Total PSS by process" group, in dump order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessMemoryRecord {
    pub process_name: String,
    pub pss_memory: String,
    pub pid: String,
}

/// Device-wide RAM summary from the `meminfo` dump.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total: Option<String>,
    pub free: Option<String>,
    pub used: Option<String>,
    pub lost: Option<String>,
    pub tuning: Option<String>,
}

/// Flat mapping built from `dumpsys diskstats`. Usage triplets contribute
/// `<label>_used`, `<label>_total` and `<label>_free` keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiskInfo {
    pub stats: HashMap<String, String>,
}

impl DiskInfo {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.stats.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkInterfaceInfo {
    pub name: String,
    pub ip: Option<String>,
    pub mac: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WifiStatus {
    pub status: String,
    pub access_point: String,
}

/// Screen orientation derived from the input dump's raw rotation code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Coarse device class derived from the reported display density.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    Tablet,
}

/// Swipe gesture endpoints, in screen pixels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SwipeCoords {
    pub x_from: u32,
    pub y_from: u32,
    pub x_to: u32,
    pub y_to: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_states() {
        assert_eq!(DeviceState::parse("device"), DeviceState::Device);
        assert_eq!(DeviceState::parse("no device"), DeviceState::NoDevice);
        assert_eq!(DeviceState::parse("no permissions"), DeviceState::NoPermissions);
        assert_eq!(DeviceState::parse("sideways"), DeviceState::Unknown);
    }

    #[test]
    fn last_stdout_line_skips_trailing_blanks() {
        let result = CommandResult {
            stdout: "pkg: /data/local/tmp/app.apk\nSuccess\n\n".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        };
        assert_eq!(result.last_stdout_line().as_deref(), Some("Success"));
    }

    #[test]
    fn last_stdout_line_empty_output() {
        let result = CommandResult {
            stdout: "\n".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        };
        assert_eq!(result.last_stdout_line(), None);
    }
}
