//! Client for the device bridge tool. One method per sub-command, each a
//! single bounded attempt; only device enumeration goes through the retry
//! wrapper, because the bridge daemon may still be starting when the first
//! call arrives.

pub mod locator;
pub mod parse;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::exec::{
    execute_with_retry, Executor, NoopObserver, RetryObserver, RetryPolicy, SystemExecutor,
};
use crate::models::{
    BatteryInfo, CommandResult, DeviceRecord, DeviceState, DiskInfo, MemoryInfo,
    NetworkInterfaceInfo, ProcessMemoryRecord, PropertyMap, SwipeCoords, WifiStatus,
};

/// Rebooting waits for the device to come back, which can far outlast the
/// ordinary per-attempt deadline.
const REBOOT_TIMEOUT: Duration = Duration::from_secs(180);

/// Options for the monkey fuzz-test runner.
#[derive(Debug, Clone)]
pub struct MonkeyOptions {
    pub package: String,
    pub events: u32,
    pub seed: Option<u64>,
    pub throttle: Option<u64>,
}

impl MonkeyOptions {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            events: 10_000,
            seed: None,
            throttle: None,
        }
    }
}

pub struct AdbClient {
    program: String,
    executor: Arc<dyn Executor>,
    retry: RetryPolicy,
    observer: Box<dyn RetryObserver>,
}

impl Default for AdbClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AdbClient {
    pub fn new() -> Self {
        Self::with_executor(Arc::new(SystemExecutor))
    }

    /// Builds a client from configuration, rejecting an explicitly
    /// configured path that does not resolve to an executable.
    pub fn from_config(config: &Config) -> Result<Self> {
        let program = locator::resolve_program(&config.adb_path, "adb");
        locator::validate_program(&program)?;
        Ok(Self::with_executor(Arc::new(SystemExecutor))
            .program(program)
            .retry_policy(config.retry.policy()))
    }

    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            program: "adb".to_string(),
            executor,
            retry: RetryPolicy::default(),
            observer: Box::new(NoopObserver),
        }
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn observer(mut self, observer: Box<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// One attempt under the configured deadline. A non-zero exit comes
    /// back as a result, not an error; callers classify it themselves.
    fn run(&self, command: &str) -> Result<CommandResult> {
        self.executor
            .execute_with_timeout(command, self.retry.timeout)
    }

    /// Lists attached devices. This is the one retried call: the daemon may
    /// still be starting, and a hung enumeration would otherwise wedge
    /// discovery. "No devices" is an empty list, never an error.
    pub fn devices(&self) -> Result<Vec<DeviceRecord>> {
        let command = format!("{} devices", self.program);
        let result = execute_with_retry(
            self.executor.as_ref(),
            &command,
            &self.retry,
            self.observer.as_ref(),
        )?;
        if !result.success() && !is_no_device_stderr(&result.stderr) {
            return Err(Error::BridgeCommand {
                command,
                stderr: result.stderr,
            });
        }
        Ok(parse::parse_devices(&result.stdout))
    }

    /// Connection state of a single device, from `get-state`.
    pub fn get_state(&self, qualifier: &str) -> Result<DeviceState> {
        validate_qualifier(qualifier)?;
        let command = format!("{} -s '{}' get-state", self.program, qualifier);
        let result = self.run(&command)?;
        if !result.success() {
            return Err(Error::BridgeCommand {
                command,
                stderr: result.stderr,
            });
        }
        let last = result.last_stdout_line().unwrap_or_default();
        Ok(DeviceState::parse(&last))
    }

    /// Full property map from `getprop`.
    pub fn getprop(&self, qualifier: &str) -> Result<PropertyMap> {
        let result = self.shell(qualifier, "getprop")?;
        Ok(parse::parse_properties(&result.stdout))
    }

    /// Raw dumpsys output for one service.
    pub fn dumpsys(&self, qualifier: &str, service: &str) -> Result<String> {
        let result = self.shell(qualifier, &format!("dumpsys {service}"))?;
        Ok(result.stdout)
    }

    /// Input service dump as `key: value` pairs; carries the raw rotation
    /// code under `SurfaceOrientation`.
    pub fn get_input_info(&self, qualifier: &str) -> Result<PropertyMap> {
        let output = self.dumpsys(qualifier, "input")?;
        Ok(parse::parse_key_values(&output, parse::Separator::Colon))
    }

    /// Telephony dump (`iphonesubinfo`), `key = value` formatted.
    pub fn get_phone_info(&self, qualifier: &str) -> Result<PropertyMap> {
        let output = self.dumpsys(qualifier, "iphonesubinfo")?;
        Ok(parse::parse_key_values(
            &output,
            parse::Separator::SpacedEquals,
        ))
    }

    /// Power service dump, `key=value` formatted.
    pub fn get_power_info(&self, qualifier: &str) -> Result<PropertyMap> {
        let output = self.dumpsys(qualifier, "power")?;
        Ok(parse::parse_key_values(&output, parse::Separator::Equals))
    }

    /// Battery service dump as raw key/value pairs.
    pub fn get_battery_props(&self, qualifier: &str) -> Result<PropertyMap> {
        let output = self.dumpsys(qualifier, "battery")?;
        Ok(parse::parse_key_values(&output, parse::Separator::Colon))
    }

    /// Battery service dump as a typed record.
    pub fn get_battery_info(&self, qualifier: &str) -> Result<BatteryInfo> {
        let props = self.get_battery_props(qualifier)?;
        let grab = |key: &str| props.get(key).cloned();
        let powered = ["AC powered", "USB powered", "Wireless powered"]
            .iter()
            .any(|key| props.get(*key).map(String::as_str) == Some("true"));
        Ok(BatteryInfo {
            level: props.get("level").and_then(|raw| raw.parse().ok()),
            health: grab("health"),
            status: grab("status"),
            voltage: grab("voltage"),
            current_temp: grab("temperature"),
            max_temp: grab("mBatteryMaxTemp"),
            max_current: grab("mBatteryMaxCurrent"),
            powered,
        })
    }

    /// Per-process PSS figures and device RAM summary from `meminfo`.
    pub fn get_memory_info(
        &self,
        qualifier: &str,
    ) -> Result<(Vec<ProcessMemoryRecord>, MemoryInfo)> {
        let output = self.dumpsys(qualifier, "meminfo")?;
        parse::parse_meminfo(&output)
    }

    /// Disk usage statistics from `diskstats`.
    pub fn get_disk_info(&self, qualifier: &str) -> Result<DiskInfo> {
        let output = self.dumpsys(qualifier, "diskstats")?;
        Ok(parse::parse_diskstats(&output))
    }

    /// Raw `ifconfig <interface>` output.
    pub fn get_network_interface(&self, qualifier: &str, interface: &str) -> Result<String> {
        let result = self.shell(qualifier, &format!("ifconfig {interface}"))?;
        Ok(result.stdout)
    }

    /// Interface name/IP/MAC listing. Tries the legacy `netcfg` dump first;
    /// on Android 7+ that binary is gone (the not-found case surfaces as an
    /// empty result, see [`AdbClient::shell`]) and the `ip address` dump is
    /// used instead. Both output formats are accepted by the parser.
    pub fn get_network_info(&self, qualifier: &str) -> Result<Vec<NetworkInterfaceInfo>> {
        let result = self.shell(qualifier, "netcfg")?;
        if !result.stdout.trim().is_empty() {
            return Ok(parse::parse_network_interfaces(&result.stdout));
        }
        let result = self.shell(qualifier, "ip address")?;
        Ok(parse::parse_network_interfaces(&result.stdout))
    }

    /// MAC address of the wlan0 interface.
    pub fn get_wifi_mac_address(&self, qualifier: &str) -> Result<Option<String>> {
        let result = self.shell(qualifier, "ip address")?;
        Ok(parse::parse_wifi_mac(&result.stdout))
    }

    /// Wifi connection state and access point name.
    pub fn get_wifi_status(&self, qualifier: &str) -> Result<WifiStatus> {
        let result = self.shell(qualifier, "dumpsys wifi | grep mNetworkInfo")?;
        parse::parse_wifi_status(&result.stdout).ok_or_else(|| Error::UnexpectedOutput {
            command: "dumpsys wifi".to_string(),
            reason: "mNetworkInfo line not found".to_string(),
        })
    }

    /// Smallest-width density figure from the window dump.
    pub fn get_device_dpi(&self, qualifier: &str) -> Result<Option<u32>> {
        let output = self.dumpsys(qualifier, "window")?;
        Ok(parse::parse_dpi(&output))
    }

    /// Current screen resolution from the window dump.
    pub fn get_resolution(&self, qualifier: &str) -> Result<(u32, u32)> {
        let output = self.dumpsys(qualifier, "window")?;
        parse::parse_resolution(&output).ok_or_else(|| Error::UnexpectedOutput {
            command: "dumpsys window".to_string(),
            reason: "mUnrestrictedScreen line not found".to_string(),
        })
    }

    /// Installs an apk, returning the verdict line (`Success` on success).
    pub fn install_apk(&self, qualifier: &str, apk_path: &str) -> Result<String> {
        validate_qualifier(qualifier)?;
        let command = format!("{} -s '{}' install {}", self.program, qualifier, apk_path);
        self.run_for_verdict(command)
    }

    /// Uninstalls a package, returning the verdict line.
    pub fn uninstall_apk(&self, qualifier: &str, package_name: &str) -> Result<String> {
        validate_qualifier(qualifier)?;
        let command = format!(
            "{} -s '{}' uninstall {}",
            self.program, qualifier, package_name
        );
        self.run_for_verdict(command)
    }

    fn run_for_verdict(&self, command: String) -> Result<String> {
        let result = self.run(&command)?;
        if !result.success() {
            return Err(Error::BridgeCommand {
                command,
                stderr: result.stderr,
            });
        }
        result
            .last_stdout_line()
            .ok_or_else(|| Error::UnexpectedOutput {
                command,
                reason: "no output".to_string(),
            })
    }

    /// Device uptime in whole seconds.
    pub fn get_uptime(&self, qualifier: &str) -> Result<u64> {
        let result = self.shell(qualifier, "cat /proc/uptime")?;
        parse::parse_uptime(&result.stdout).ok_or_else(|| Error::UnexpectedOutput {
            command: "cat /proc/uptime".to_string(),
            reason: format!("unparsable uptime: {}", result.stdout.trim()),
        })
    }

    /// Reboots the device. A remote device is rebooted and then dropped
    /// from the bridge; a local device is waited for until it reappears.
    pub fn reboot(&self, qualifier: &str, remote: bool) -> Result<()> {
        validate_qualifier(qualifier)?;
        if remote {
            let command = format!("{} -s '{}' reboot", self.program, qualifier);
            self.run(&command)?;
            let (ip, port) = qualifier.split_once(':').unwrap_or((qualifier, "5555"));
            return self.disconnect(ip, port);
        }
        let command = format!(
            "{prog} -s '{q}' reboot && {prog} -s '{q}' wait-for-device shell \
             'while [ \"$(getprop dev.bootcomplete | tr -d \"\\r\")\" != \"1\" ]; do sleep 1; done'",
            prog = self.program,
            q = qualifier
        );
        let result = self
            .executor
            .execute_with_timeout(&command, REBOOT_TIMEOUT)?;
        if !result.success() {
            return Err(Error::BridgeCommand {
                command,
                stderr: result.stderr,
            });
        }
        Ok(())
    }

    /// Runs monkey testing against one package.
    pub fn monkey(&self, qualifier: &str, options: &MonkeyOptions) -> Result<CommandResult> {
        let mut command = format!("monkey -p {} -v {}", options.package, options.events);
        if let Some(seed) = options.seed {
            command.push_str(&format!(" -s {seed}"));
        }
        if let Some(throttle) = options.throttle {
            command.push_str(&format!(" -t {throttle}"));
        }
        self.shell(qualifier, &command)
    }

    /// Captures a screenshot into a host-side file. Pre-7 devices emit
    /// CR/LF-mangled PNG data over the shell transport, so that branch
    /// pipes through a CR/LF repair before the redirect.
    pub fn screencap(&self, qualifier: &str, filename: &str) -> Result<()> {
        let release = self
            .getprop(qualifier)?
            .get("ro.build.version.release")
            .and_then(|release| release.split('.').next()?.parse::<u32>().ok())
            .unwrap_or(0);
        let command = if release < 7 {
            format!(r"screencap -p | perl -pe 's/\x0D\x0A/\x0A/g' > {filename}")
        } else {
            format!("screencap -p > {filename}")
        };
        self.shell(qualifier, &command)?;
        Ok(())
    }

    /// Sends one key event.
    pub fn keyevent(&self, qualifier: &str, keyevent: &str) -> Result<String> {
        Ok(self
            .shell(qualifier, &format!("input keyevent {keyevent}"))?
            .stdout)
    }

    /// Sends a swipe gesture.
    pub fn swipe(&self, qualifier: &str, coords: SwipeCoords) -> Result<String> {
        let command = format!(
            "input swipe {} {} {} {}",
            coords.x_from, coords.y_from, coords.x_to, coords.y_to
        );
        Ok(self.shell(qualifier, &command)?.stdout)
    }

    /// Activity manager passthrough (`am <command>`).
    pub fn am(&self, qualifier: &str, command: &str) -> Result<String> {
        Ok(self.shell(qualifier, &format!("am {command}"))?.stdout)
    }

    /// Package manager passthrough (`pm <command>`).
    pub fn pm(&self, qualifier: &str, command: &str) -> Result<String> {
        Ok(self.shell(qualifier, &format!("pm {command}"))?.stdout)
    }

    /// Blocks a package; the `block` verb exists on pre-KitKat builds only.
    pub fn block_package(&self, qualifier: &str, package: &str) -> Result<bool> {
        let output = self.pm(qualifier, &format!("block {package}"))?;
        Ok(output.contains("true"))
    }

    /// Hides a package; KitKat and above.
    pub fn hide_package(&self, qualifier: &str, package: &str) -> Result<bool> {
        let output = self.pm(qualifier, &format!("hide {package}"))?;
        Ok(output.contains("true"))
    }

    /// Connects to a network-attached device. "Already connected" is split
    /// out from a genuine connection failure.
    pub fn connect(&self, ip_address: &str, port: &str) -> Result<()> {
        let address = format!("{ip_address}:{port}");
        parse::validate_address(&address)?;
        let command = format!("{} connect {}", self.program, address);
        let result = self.run(&command)?;
        if result.stdout.contains("already connected to") {
            return Err(Error::DeviceAlreadyConnected { address });
        }
        if !result.stdout.contains("connected to") {
            return Err(Error::BridgeCommand {
                command,
                stderr: format!("unable to connect to {address}: {}", result.stdout.trim()),
            });
        }
        Ok(())
    }

    /// Disconnects a network-attached device.
    pub fn disconnect(&self, ip_address: &str, port: &str) -> Result<()> {
        let address = format!("{ip_address}:{port}");
        parse::validate_address(&address)?;
        let command = format!("{} disconnect {}", self.program, address);
        let result = self.run(&command)?;
        if !result.success() {
            return Err(Error::BridgeCommand {
                command,
                stderr: format!(
                    "unable to disconnect {address}: {}",
                    result.stdout.trim()
                ),
            });
        }
        Ok(())
    }

    /// Shell passthrough, and the central error-classification point:
    /// a non-zero exit is mapped from stderr to unauthorized / not-found /
    /// generic bridge failure. One documented carve-out: `netcfg` was
    /// removed in Android 7, and the resulting "not found" stderr differs
    /// in exit code across host platforms, so it is returned as a
    /// successful empty result to keep [`AdbClient::get_network_info`]
    /// consistent everywhere.
    pub fn shell(&self, qualifier: &str, command: &str) -> Result<CommandResult> {
        validate_qualifier(qualifier)?;
        let full = format!("{} -s '{}' shell {}", self.program, qualifier, command);
        let result = self.run(&full)?;
        if !result.success() {
            debug!(command = %full, exit = ?result.exit_code, "shell command failed");
            let stderr = result.stderr.clone();
            if stderr.starts_with("error: device unauthorized") {
                return Err(Error::UnauthorizedDevice { stderr });
            }
            if stderr.starts_with("error: device not found")
                || stderr.starts_with("error: device offline")
            {
                return Err(Error::DeviceNotFound { stderr });
            }
            if stderr.contains("netcfg: not found") {
                return Ok(result);
            }
            return Err(Error::BridgeCommand {
                command: full,
                stderr,
            });
        }
        Ok(result)
    }
}

/// Recognized "no device attached" stderr patterns; enumeration treats
/// these as an empty list rather than a failure.
fn is_no_device_stderr(stderr: &str) -> bool {
    let lowered = stderr.to_lowercase();
    lowered.contains("no devices") || lowered.contains("device not found")
}

/// Validates a serial or `ip:port` qualifier before any subprocess spawns.
fn validate_qualifier(qualifier: &str) -> Result<()> {
    if qualifier.trim().is_empty() {
        return Err(Error::InvalidIdentifier {
            value: qualifier.to_string(),
            reason: "qualifier is empty".to_string(),
        });
    }
    if qualifier
        .chars()
        .any(|c| c.is_whitespace() || c == '\'' || c == '"')
    {
        return Err(Error::InvalidIdentifier {
            value: qualifier.to_string(),
            reason: "qualifier contains whitespace or quotes".to_string(),
        });
    }
    Ok(())
}
