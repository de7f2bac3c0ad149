//! The long-lived device object: one instance per attached or remote
//! device, delegating every operation to the bridge client and caching
//! parsed property maps between explicit refreshes.
//!
//! Instances are not safe for concurrent mutation; callers automating
//! several devices use one instance per device.

pub mod variant;

use std::sync::Arc;

use tracing::warn;

use crate::aapt::AaptClient;
use crate::adb::parse::{is_ip_and_port, parse_ifconfig_ip};
use crate::adb::{AdbClient, MonkeyOptions};
use crate::error::{Error, Result};
use crate::models::{
    BatteryInfo, DeviceClass, DeviceRecord, DeviceState, DiskInfo, MemoryInfo, Orientation,
    ProcessMemoryRecord, PropertyMap, WifiStatus,
};

use self::variant::{kindle_unlock_gesture, Variant, MULTI_WINDOW_PACKAGE};

/// Densities above this figure classify the device as tablet-class.
pub const TABLET_DPI_THRESHOLD: u32 = 533;

const WAKEUP_KEYEVENT: &str = "26";

/// One lazily-populated cache slot. `Unfetched` after construction and
/// after [`Device::refresh`], making invalidation a visible state
/// transition rather than an implicit nil check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached<T> {
    Unfetched,
    Fetched(T),
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Cached::Unfetched
    }
}

impl<T> Cached<T> {
    fn clear(&mut self) {
        *self = Cached::Unfetched;
    }

    fn get_or_fetch(&mut self, fetch: impl FnOnce() -> Result<T>) -> Result<&T> {
        if let Cached::Unfetched = self {
            *self = Cached::Fetched(fetch()?);
        }
        match self {
            Cached::Fetched(value) => Ok(value),
            Cached::Unfetched => unreachable!("slot was just filled"),
        }
    }
}

/// Per-process PSS records plus the device RAM summary, captured together
/// from one memory dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub processes: Vec<ProcessMemoryRecord>,
    pub info: MemoryInfo,
}

#[derive(Debug, Default)]
struct DeviceCache {
    properties: Cached<PropertyMap>,
    battery: Cached<BatteryInfo>,
    memory: Cached<MemorySnapshot>,
    disk: Cached<DiskInfo>,
}

impl DeviceCache {
    fn clear(&mut self) {
        self.properties.clear();
        self.battery.clear();
        self.memory.clear();
        self.disk.clear();
    }
}

pub struct Device {
    client: Arc<AdbClient>,
    qualifier: String,
    serial: String,
    state: DeviceState,
    remote: bool,
    variant: Variant,
    cache: DeviceCache,
}

/// Builds one [`Device`] per attached device, resolving the
/// manufacturer-specific variant for each.
pub fn devices(client: &Arc<AdbClient>) -> Result<Vec<Device>> {
    let records = client.devices()?;
    records
        .into_iter()
        .map(|record| Device::attach(client.clone(), record))
        .collect()
}

/// Builds a [`Device`] for one qualifier. An identifier unknown to the
/// enumeration gets state `Unknown` rather than failing, so callers can
/// still poll it.
pub fn device(client: &Arc<AdbClient>, qualifier: &str) -> Result<Device> {
    if qualifier.trim().is_empty() {
        return Err(Error::InvalidIdentifier {
            value: qualifier.to_string(),
            reason: "qualifier is empty".to_string(),
        });
    }
    let state = client
        .devices()?
        .into_iter()
        .find(|record| record.identifier == qualifier)
        .map(|record| record.state)
        .unwrap_or(DeviceState::Unknown);
    Device::attach(
        client.clone(),
        DeviceRecord {
            identifier: qualifier.to_string(),
            state,
            is_remote: is_ip_and_port(qualifier),
        },
    )
}

impl Device {
    /// Wraps one device record, resolving its variant. Devices in a
    /// non-interactive state are never queried here: they get the default
    /// variant and the qualifier as serial.
    pub fn attach(client: Arc<AdbClient>, record: DeviceRecord) -> Result<Self> {
        let variant = resolve_variant(&client, &record);
        let mut device = Self {
            client,
            serial: record.identifier.clone(),
            qualifier: record.identifier,
            state: record.state,
            remote: record.is_remote,
            variant,
            cache: DeviceCache::default(),
        };
        // USB devices are addressed by serial already; a remote device's
        // qualifier is ip:port, so pick the real serial up from its props.
        if device.remote && device.state.is_interactive() {
            if let Ok(Some(serial)) = device.property("ro.serialno") {
                device.serial = serial;
            }
        }
        if device.variant == Variant::SamsungLike {
            device.disable_multi_window()?;
        }
        Ok(device)
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Drops every cached record; the next accessor re-queries the device.
    pub fn refresh(&mut self) {
        self.cache.clear();
    }

    fn ip_and_port(&self) -> (String, String) {
        match self.qualifier.split_once(':') {
            Some((ip, port)) => (ip.to_string(), port.to_string()),
            None => (self.qualifier.clone(), "5555".to_string()),
        }
    }

    // ---- cached property access ----

    /// One property from the cached map. The map is fetched on first use
    /// and re-fetched when the key is absent, so a property that appears
    /// after boot settles is still found.
    pub fn property(&mut self, key: &str) -> Result<Option<String>> {
        let missing = match &self.cache.properties {
            Cached::Fetched(map) => !map.contains_key(key),
            Cached::Unfetched => true,
        };
        if missing {
            self.cache.properties.clear();
            let client = self.client.clone();
            let qualifier = self.qualifier.clone();
            self.cache
                .properties
                .get_or_fetch(|| client.getprop(&qualifier))?;
        }
        match &self.cache.properties {
            Cached::Fetched(map) => Ok(map.get(key).cloned()),
            Cached::Unfetched => Ok(None),
        }
    }

    pub fn model(&mut self) -> Result<Option<String>> {
        self.property("ro.product.model")
    }

    pub fn manufacturer(&mut self) -> Result<Option<String>> {
        self.property("ro.product.manufacturer")
    }

    pub fn product_device(&mut self) -> Result<Option<String>> {
        self.property("ro.product.device")
    }

    pub fn serial_no(&mut self) -> Result<Option<String>> {
        self.property("ro.serialno")
    }

    /// OS release string (`ro.build.version.release`).
    pub fn version(&mut self) -> Result<String> {
        self.property("ro.build.version.release")?
            .ok_or_else(|| Error::FieldNotFound {
                field: "ro.build.version.release".to_string(),
                source_desc: format!("properties of {}", self.qualifier),
            })
    }

    fn version_major(&mut self) -> Result<u32> {
        let version = self.version()?;
        version
            .split('.')
            .next()
            .and_then(|major| major.parse().ok())
            .ok_or_else(|| Error::UnrecognizedOutput {
                context: "ro.build.version.release".to_string(),
                value: version,
            })
    }

    /// `<device>_<model>`, or just the device name when the two match.
    pub fn range(&mut self) -> Result<Option<String>> {
        let (Some(device), Some(model)) = (self.product_device()?, self.model()?) else {
            return Ok(None);
        };
        Ok(Some(if device == model {
            device
        } else {
            format!("{device}_{model}")
        }))
    }

    // ---- sub-records ----

    pub fn battery(&mut self) -> Result<&BatteryInfo> {
        let client = self.client.clone();
        let qualifier = self.qualifier.clone();
        self.cache
            .battery
            .get_or_fetch(|| client.get_battery_info(&qualifier))
    }

    /// Forces the next [`Device::battery`] read to re-query.
    pub fn update_battery(&mut self) -> Result<&BatteryInfo> {
        self.cache.battery.clear();
        self.battery()
    }

    pub fn battery_level(&mut self) -> Result<Option<u8>> {
        Ok(self.battery()?.level)
    }

    pub fn is_powered(&mut self) -> Result<bool> {
        Ok(self.battery()?.powered)
    }

    pub fn memory(&mut self) -> Result<&MemorySnapshot> {
        let client = self.client.clone();
        let qualifier = self.qualifier.clone();
        self.cache.memory.get_or_fetch(|| {
            let (processes, info) = client.get_memory_info(&qualifier)?;
            Ok(MemorySnapshot { processes, info })
        })
    }

    /// Re-reads the memory dump, replacing the cached snapshot.
    pub fn update_memory(&mut self) -> Result<&MemorySnapshot> {
        self.cache.memory.clear();
        self.memory()
    }

    pub fn diskstat(&mut self) -> Result<&DiskInfo> {
        let client = self.client.clone();
        let qualifier = self.qualifier.clone();
        self.cache
            .disk
            .get_or_fetch(|| client.get_disk_info(&qualifier))
    }

    pub fn update_diskstat(&mut self) -> Result<&DiskInfo> {
        self.cache.disk.clear();
        self.diskstat()
    }

    // ---- live queries (never cached) ----

    /// Current orientation from the input dump's raw rotation code.
    pub fn orientation(&self) -> Result<Orientation> {
        let info = self.client.get_input_info(&self.qualifier)?;
        match info.get("SurfaceOrientation").map(String::as_str) {
            Some("0") | Some("2") => Ok(Orientation::Portrait),
            Some("1") | Some("3") => Ok(Orientation::Landscape),
            Some(other) => Err(Error::UnrecognizedOutput {
                context: "SurfaceOrientation".to_string(),
                value: other.to_string(),
            }),
            None => Err(Error::NoDeviceConnected),
        }
    }

    pub fn imei(&self) -> Result<Option<String>> {
        let info = self.client.get_phone_info(&self.qualifier)?;
        Ok(info.get("Device ID").cloned())
    }

    /// True when the panel is lit, across both power-dump generations.
    pub fn screen_on(&self) -> Result<bool> {
        let power = self.client.get_power_info(&self.qualifier)?;
        let legacy = power
            .get("mScreenOn")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        let modern = power
            .get("Display Power: state")
            .is_some_and(|value| value.eq_ignore_ascii_case("on"));
        Ok(legacy || modern)
    }

    /// Wakes the device, and on kindle-like variants also clears the
    /// keyguard with the swipe the lockscreen expects.
    pub fn unlock(&mut self) -> Result<()> {
        if !self.screen_on()? {
            self.client.keyevent(&self.qualifier, WAKEUP_KEYEVENT)?;
        }
        if self.variant == Variant::KindleLike {
            let resolution = self.resolution()?;
            let version_major = self.version_major()?;
            let orientation = self.orientation()?;
            let coords = kindle_unlock_gesture(resolution, version_major, orientation);
            self.client.swipe(&self.qualifier, coords)?;
        }
        Ok(())
    }

    pub fn dpi(&self) -> Result<Option<u32>> {
        self.client.get_device_dpi(&self.qualifier)
    }

    /// Tablet/mobile classification from the reported density.
    pub fn device_type(&self) -> Result<DeviceClass> {
        let dpi = self.dpi()?.unwrap_or(0);
        Ok(if dpi > TABLET_DPI_THRESHOLD {
            DeviceClass::Tablet
        } else {
            DeviceClass::Mobile
        })
    }

    pub fn resolution(&self) -> Result<(u32, u32)> {
        self.client.get_resolution(&self.qualifier)
    }

    pub fn uptime(&self) -> Result<u64> {
        self.client.get_uptime(&self.qualifier)
    }

    pub fn wifi_status(&self) -> Result<WifiStatus> {
        self.client.get_wifi_status(&self.qualifier)
    }

    /// Wifi IPv4 address, from either ifconfig output generation.
    pub fn ip_address(&self) -> Result<Option<String>> {
        let output = self.client.get_network_interface(&self.qualifier, "wlan0")?;
        Ok(parse_ifconfig_ip(&output))
    }

    pub fn wifi_mac_address(&self) -> Result<Option<String>> {
        self.client.get_wifi_mac_address(&self.qualifier)
    }

    // ---- lifecycle operations ----

    /// Installs an apk; anything but a final `Success` line is surfaced as
    /// an error carrying that line.
    pub fn install(&self, apk_path: &str) -> Result<()> {
        if apk_path.trim().is_empty() {
            return Err(Error::InvalidIdentifier {
                value: apk_path.to_string(),
                reason: "no apk specified".to_string(),
            });
        }
        let verdict = self.client.install_apk(&self.qualifier, apk_path)?;
        if verdict == "Success" {
            Ok(())
        } else {
            Err(Error::BridgeCommand {
                command: format!("install {apk_path}"),
                stderr: verdict,
            })
        }
    }

    pub fn uninstall(&self, package_name: &str) -> Result<()> {
        let verdict = self.client.uninstall_apk(&self.qualifier, package_name)?;
        if verdict == "Success" {
            Ok(())
        } else {
            Err(Error::BridgeCommand {
                command: format!("uninstall {package_name}"),
                stderr: verdict,
            })
        }
    }

    /// Package name of an apk on the host, via the inspection tool.
    pub fn package_name(&self, aapt: &AaptClient, apk_path: &str) -> Result<String> {
        aapt.package_name(apk_path)
    }

    /// Version string of an apk on the host, via the inspection tool.
    pub fn app_version_number(&self, aapt: &AaptClient, apk_path: &str) -> Result<String> {
        aapt.version_name(apk_path)
    }

    pub fn list_installed_packages(&self) -> Result<Vec<String>> {
        let output = self.client.pm(&self.qualifier, "list packages")?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Blocks a package from running; the package-manager verb changed
    /// name in 5.0.
    pub fn block_package(&mut self, package: &str) -> Result<bool> {
        if self.version_major()? < 5 {
            self.client.block_package(&self.qualifier, package)
        } else {
            self.client.hide_package(&self.qualifier, package)
        }
    }

    pub fn monkey(&self, options: &MonkeyOptions) -> Result<()> {
        self.client.monkey(&self.qualifier, options)?;
        Ok(())
    }

    pub fn screenshot(&self, filename: &str) -> Result<()> {
        self.client.screencap(&self.qualifier, filename)
    }

    pub fn intent(&self, command: &str) -> Result<String> {
        self.client.am(&self.qualifier, command)
    }

    pub fn reboot(&self) -> Result<()> {
        self.client.reboot(&self.qualifier, self.remote)
    }

    pub fn connect(&self) -> Result<()> {
        let (ip, port) = self.ip_and_port();
        self.client.connect(&ip, &port)
    }

    /// Drops a remote device from the bridge. Asking a USB device to
    /// disconnect is a caller bug and fails fast.
    pub fn disconnect(&self) -> Result<()> {
        if !self.remote {
            return Err(Error::NotRemoteDevice {
                qualifier: self.qualifier.clone(),
            });
        }
        let (ip, port) = self.ip_and_port();
        self.client.disconnect(&ip, &port)
    }

    pub fn is_connected(&self) -> Result<bool> {
        Ok(self
            .client
            .devices()?
            .iter()
            .any(|record| record.identifier == self.qualifier))
    }

    /// The samsung-like construction side effect: the multi-window overlay
    /// service interferes with injected input, so it is stopped and
    /// blocked up front.
    fn disable_multi_window(&mut self) -> Result<()> {
        let packages = self.list_installed_packages()?;
        if !packages
            .iter()
            .any(|package| package == &format!("package:{MULTI_WINDOW_PACKAGE}"))
        {
            return Ok(());
        }
        self.intent(&format!("force-stop {MULTI_WINDOW_PACKAGE}"))?;
        self.block_package(MULTI_WINDOW_PACKAGE)?;
        Ok(())
    }
}

/// Picks the variant for a freshly enumerated device. Devices that cannot
/// answer (unauthorized, offline, unknown) are not queried; manufacturer
/// lookup failures also fall back to the default variant rather than
/// failing enumeration.
fn resolve_variant(client: &AdbClient, record: &DeviceRecord) -> Variant {
    if !record.state.is_interactive() {
        return Variant::Default;
    }
    match client.getprop(&record.identifier) {
        Ok(props) => {
            Variant::from_manufacturer(props.get("ro.product.manufacturer").map(String::as_str))
        }
        Err(Error::DeviceNotFound { .. }) => Variant::Default,
        Err(err) => {
            warn!(qualifier = %record.identifier, error = %err,
                  "manufacturer lookup failed; using default variant");
            Variant::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::exec::testutil::{ok, ScriptedExecutor};

    const GETPROP: &str = "\
[ro.build.version.release]: [4.1.2]
[ro.product.device]: [m7]
[ro.product.manufacturer]: [HTC]
[ro.product.model]: [HTC One]
[ro.serialno]: [SH34RW905290]
";

    fn scripted_device(
        script: impl Fn(&str) -> Result<crate::models::CommandResult> + Send + Sync + 'static,
    ) -> (Device, Arc<ScriptedExecutor>) {
        let executor = Arc::new(ScriptedExecutor::new(script));
        let client = Arc::new(AdbClient::with_executor(executor.clone()));
        let device = Device::attach(
            client,
            DeviceRecord {
                identifier: "SH34RW905290".to_string(),
                state: DeviceState::Device,
                is_remote: false,
            },
        )
        .expect("attach");
        (device, executor)
    }

    #[test]
    fn properties_are_cached_until_refresh() {
        let (mut device, executor) = scripted_device(|_| ok(GETPROP));
        // Attach resolves the variant with one getprop call.
        let attach_calls = executor.calls().len();
        assert_eq!(device.model().expect("model").as_deref(), Some("HTC One"));
        assert_eq!(
            device.manufacturer().expect("manufacturer").as_deref(),
            Some("HTC")
        );
        assert_eq!(executor.calls().len(), attach_calls + 1);

        device.refresh();
        assert_eq!(device.model().expect("model").as_deref(), Some("HTC One"));
        assert_eq!(executor.calls().len(), attach_calls + 2);
    }

    #[test]
    fn missing_property_triggers_refetch() {
        let (mut device, executor) = scripted_device(|_| ok(GETPROP));
        let baseline = executor.calls().len();
        assert_eq!(device.property("ro.not.there").expect("query"), None);
        assert_eq!(device.property("ro.not.there").expect("query"), None);
        // Two accessor calls, two fetches: an absent key is never cached.
        assert_eq!(executor.calls().len(), baseline + 2);
    }

    fn orientation_device(code: Option<&'static str>) -> Device {
        let (device, _) = scripted_device(move |command| {
            if command.contains("dumpsys input") {
                match code {
                    Some(code) => ok(&format!("  SurfaceOrientation: {code}\n")),
                    None => ok(""),
                }
            } else {
                ok(GETPROP)
            }
        });
        device
    }

    #[test]
    fn orientation_maps_rotation_codes() {
        assert_eq!(
            orientation_device(Some("0")).orientation().expect("0"),
            Orientation::Portrait
        );
        assert_eq!(
            orientation_device(Some("2")).orientation().expect("2"),
            Orientation::Portrait
        );
        assert_eq!(
            orientation_device(Some("1")).orientation().expect("1"),
            Orientation::Landscape
        );
        assert_eq!(
            orientation_device(Some("3")).orientation().expect("3"),
            Orientation::Landscape
        );
    }

    #[test]
    fn orientation_rejects_unknown_codes() {
        let err = orientation_device(Some("7")).orientation().unwrap_err();
        assert!(matches!(err, Error::UnrecognizedOutput { .. }));
    }

    #[test]
    fn orientation_without_output_is_no_device() {
        let err = orientation_device(None).orientation().unwrap_err();
        assert!(matches!(err, Error::NoDeviceConnected));
    }

    #[test]
    fn install_success_and_failure_verdicts() {
        let (device, _) = scripted_device(|command| {
            if command.contains("install /tmp/good.apk") {
                ok("Success\n")
            } else if command.contains("install") {
                ok("Failure [INSTALL_FAILED_OLDER_SDK]\n")
            } else {
                ok(GETPROP)
            }
        });
        device.install("/tmp/good.apk").expect("install");
        let err = device.install("/tmp/bad.apk").unwrap_err();
        match err {
            Error::BridgeCommand { stderr, .. } => {
                assert_eq!(stderr, "Failure [INSTALL_FAILED_OLDER_SDK]")
            }
            other => panic!("expected BridgeCommand, got {other:?}"),
        }
    }

    #[test]
    fn install_requires_an_apk_path() {
        let (device, _) = scripted_device(|_| ok(GETPROP));
        assert!(matches!(
            device.install("").unwrap_err(),
            Error::InvalidIdentifier { .. }
        ));
    }

    #[test]
    fn device_type_threshold() {
        let tablet = {
            let (device, _) = scripted_device(|command| {
                if command.contains("dumpsys window") {
                    ok("  config: sw600dp\n")
                } else {
                    ok(GETPROP)
                }
            });
            device.device_type().expect("type")
        };
        assert_eq!(tablet, DeviceClass::Tablet);

        let mobile = {
            let (device, _) = scripted_device(|command| {
                if command.contains("dumpsys window") {
                    ok("  config: sw360dp\n")
                } else {
                    ok(GETPROP)
                }
            });
            device.device_type().expect("type")
        };
        assert_eq!(mobile, DeviceClass::Mobile);
    }

    #[test]
    fn screen_on_accepts_both_power_dump_generations() {
        let (device, _) = scripted_device(|command| {
            if command.contains("dumpsys power") {
                ok("mScreenOn=true\n")
            } else {
                ok(GETPROP)
            }
        });
        assert!(device.screen_on().expect("screen"));

        let (device, _) = scripted_device(|command| {
            if command.contains("dumpsys power") {
                ok("Display Power: state=ON\n")
            } else {
                ok(GETPROP)
            }
        });
        assert!(device.screen_on().expect("screen"));
    }

    #[test]
    fn disconnect_requires_remote_device() {
        let (device, _) = scripted_device(|_| ok(GETPROP));
        assert!(matches!(
            device.disconnect().unwrap_err(),
            Error::NotRemoteDevice { .. }
        ));
    }

    #[test]
    fn non_interactive_device_is_never_queried_for_variant() {
        let executor = Arc::new(ScriptedExecutor::new(|_| ok("")));
        let client = Arc::new(AdbClient::with_executor(executor.clone()));
        let device = Device::attach(
            client,
            DeviceRecord {
                identifier: "OFFLINE123".to_string(),
                state: DeviceState::Offline,
                is_remote: false,
            },
        )
        .expect("attach");
        assert_eq!(device.variant(), Variant::Default);
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn samsung_variant_blocks_multi_window_service() {
        let executor = Arc::new(ScriptedExecutor::new(|command| {
            if command.contains("getprop") {
                ok("[ro.product.manufacturer]: [samsung]\n[ro.build.version.release]: [5.0.1]\n")
            } else if command.contains("pm list packages") {
                ok("package:com.android.settings\npackage:com.sec.android.app.FlashBarService\n")
            } else if command.contains("pm hide") {
                ok("Package com.sec.android.app.FlashBarService new hidden state: true\n")
            } else {
                ok("")
            }
        }));
        let client = Arc::new(AdbClient::with_executor(executor.clone()));
        let device = Device::attach(
            client,
            DeviceRecord {
                identifier: "SAMSUNG01".to_string(),
                state: DeviceState::Device,
                is_remote: false,
            },
        )
        .expect("attach");
        assert_eq!(device.variant(), Variant::SamsungLike);
        let calls = executor.calls();
        assert!(calls.iter().any(|c| c.contains("am force-stop com.sec.android.app.FlashBarService")));
        assert!(calls.iter().any(|c| c.contains("pm hide com.sec.android.app.FlashBarService")));
    }

    #[test]
    fn kindle_unlock_swipes_after_waking() {
        let executor = Arc::new(ScriptedExecutor::new(|command| {
            if command.contains("getprop") {
                ok("[ro.product.manufacturer]: [Amazon]\n[ro.build.version.release]: [5.1]\n")
            } else if command.contains("dumpsys power") {
                ok("mScreenOn=false\n")
            } else if command.contains("dumpsys window") {
                ok("  mUnrestrictedScreen=(0,0) 1080x1920\n")
            } else if command.contains("dumpsys input") {
                ok("  SurfaceOrientation: 0\n")
            } else {
                ok("")
            }
        }));
        let client = Arc::new(AdbClient::with_executor(executor.clone()));
        let mut device = Device::attach(
            client,
            DeviceRecord {
                identifier: "KINDLE01".to_string(),
                state: DeviceState::Device,
                is_remote: false,
            },
        )
        .expect("attach");
        assert_eq!(device.variant(), Variant::KindleLike);
        device.unlock().expect("unlock");
        let calls = executor.calls();
        assert!(calls.iter().any(|c| c.contains("input keyevent 26")));
        assert!(calls.iter().any(|c| c.contains("input swipe")));
    }
}
