//! Pure text parsers for the bridge tool's sub-command output. Each parser
//! is a function over a defined line grammar, pinned to literal sample
//! output in the tests below; tool-version quirks (old vs new network-info
//! format) are named branches, not incidental regex tweaks.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{Error, Result};
use crate::models::{
    DeviceRecord, DeviceState, DiskInfo, MemoryInfo, NetworkInterfaceInfo, ProcessMemoryRecord,
    PropertyMap, WifiStatus,
};

/// Parses the device-list dump. Banner lines ("List of devices attached"),
/// daemon-startup notices and blank lines carry no tab and are skipped, as
/// is any trailing garbage that does not match `<identifier>\t<state>`.
/// An empty device list is an empty vector, never an error.
pub fn parse_devices(output: &str) -> Vec<DeviceRecord> {
    output
        .lines()
        .filter_map(|line| {
            let (identifier, state) = line.split_once('\t')?;
            let identifier = identifier.trim();
            if identifier.is_empty() || identifier.contains('?') {
                return None;
            }
            Some(DeviceRecord {
                identifier: identifier.to_string(),
                state: DeviceState::parse(state),
                is_remote: is_ip_and_port(identifier),
            })
        })
        .collect()
}

/// True when the identifier has the `a.b.c.d:port` shape used for
/// network-attached devices.
pub fn is_ip_and_port(identifier: &str) -> bool {
    let Some((ip, port)) = identifier.split_once(':') else {
        return false;
    };
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let octets: Vec<&str> = ip.split('.').collect();
    octets.len() == 4
        && octets
            .iter()
            .all(|octet| (1..=3).contains(&octet.len()) && octet.bytes().all(|b| b.is_ascii_digit()))
}

/// Rejects a malformed `ip:port` before any subprocess is spawned.
pub fn validate_address(address: &str) -> Result<()> {
    if is_ip_and_port(address) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier {
            value: address.to_string(),
            reason: "expected <ip>:<port>".to_string(),
        })
    }
}

/// Parses `getprop` output: one `[key]: [value]` pair per line. Malformed
/// lines are skipped; duplicate keys keep the last value.
pub fn parse_properties(output: &str) -> PropertyMap {
    let mut map = PropertyMap::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('[') {
            continue;
        }
        let Some((key_part, value_part)) = trimmed.split_once("]: [") else {
            continue;
        };
        let key = key_part.trim_start_matches('[').trim();
        let value = value_part.trim_end_matches(']').trim();
        if !key.is_empty() {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

/// Field separator used by the generic dumpsys scraper. Different services
/// format their dumps differently: battery and input use `key: value`,
/// iphonesubinfo uses `key = value`, power uses `key=value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Colon,
    SpacedEquals,
    Equals,
}

impl Separator {
    fn pattern(self) -> &'static str {
        match self {
            Separator::Colon => r"^(.*):\s+(.*)$",
            Separator::SpacedEquals => r"^(.*) =\s+(.*)$",
            Separator::Equals => r"^(.*)=(.*)$",
        }
    }
}

/// Scrapes `key<sep>value` lines into a map. Lines without the separator
/// are skipped; duplicate keys keep the last value. The key group is
/// greedy, so a value may itself contain the separator ("Display Power:
/// state=ON" keys as "Display Power: state" under `Equals`).
pub fn parse_key_values(output: &str, separator: Separator) -> PropertyMap {
    let mut map = PropertyMap::new();
    let Ok(re) = Regex::new(separator.pattern()) else {
        return map;
    };
    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(caps) = re.captures(trimmed) {
            let key = caps[1].trim().to_string();
            let value = caps[2].trim().to_string();
            if !key.is_empty() {
                map.insert(key, value);
            }
        }
    }
    map
}

/// Splits a dump into blank-line-delimited groups of trimmed lines.
fn blank_line_groups(output: &str) -> Vec<Vec<&str>> {
    let mut groups = Vec::new();
    let mut current = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
            }
        } else {
            current.push(trimmed);
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

const PSS_GROUP_MARKER: &str = "Total PSS by process:";
const RAM_GROUP_MARKER: &str = "Total RAM:";

/// Parses `dumpsys meminfo`: the per-process PSS group plus the RAM
/// summary. Both groups are located by content, never by position in the
/// dump; missing markers raise rather than returning garbled data.
pub fn parse_meminfo(output: &str) -> Result<(Vec<ProcessMemoryRecord>, MemoryInfo)> {
    let groups = blank_line_groups(output);

    let pss_group = groups
        .iter()
        .find(|group| group.first() == Some(&PSS_GROUP_MARKER))
        .ok_or_else(|| Error::UnexpectedOutput {
            command: "dumpsys meminfo".to_string(),
            reason: format!("`{PSS_GROUP_MARKER}` group not found"),
        })?;
    let ram_group = groups
        .iter()
        .find(|group| group.iter().any(|line| line.starts_with(RAM_GROUP_MARKER)))
        .ok_or_else(|| Error::UnexpectedOutput {
            command: "dumpsys meminfo".to_string(),
            reason: format!("`{RAM_GROUP_MARKER}` group not found"),
        })?;

    let process_re = Regex::new(r"^(.*):\s+(.*)\s+\(.*pid\s+(\S*).*\)$").map_err(io_regex)?;
    let mut processes = Vec::new();
    for line in pss_group {
        if let Some(caps) = process_re.captures(line) {
            processes.push(ProcessMemoryRecord {
                process_name: caps[2].to_string(),
                pss_memory: caps[1].to_string(),
                pid: caps[3].to_string(),
            });
        }
    }

    let tuning_re = Regex::new(r"^Tuning:\s+(.*)$").map_err(io_regex)?;
    let summary_re = Regex::new(r"^(.*):\s(-?[0-9][0-9,.]*\s?\S*)").map_err(io_regex)?;
    let mut ram_info: HashMap<String, String> = HashMap::new();
    for line in ram_group {
        if let Some(caps) = tuning_re.captures(line) {
            ram_info.insert("tuning".to_string(), caps[1].to_string());
        } else if let Some(caps) = summary_re.captures(line) {
            ram_info.insert(caps[1].trim().to_lowercase(), caps[2].to_string());
        }
    }

    let info = MemoryInfo {
        total: ram_info.get("total ram").cloned(),
        free: ram_info.get("free ram").cloned(),
        used: ram_info.get("used ram").cloned(),
        lost: ram_info.get("lost ram").cloned(),
        tuning: ram_info.get("tuning").cloned(),
    };
    Ok((processes, info))
}

fn io_regex(err: regex::Error) -> Error {
    Error::UnexpectedOutput {
        command: "<parser>".to_string(),
        reason: err.to_string(),
    }
}

/// Parses `dumpsys diskstats`. Two line shapes contribute to one flat map:
/// the usage triplet `Data-Free: 12K / 55K total = 22% free` keyed as
/// `data_used`/`data_total`/`data_free`, and the simple `Latency: 38ms`
/// shape keyed by the lower-cased label.
pub fn parse_diskstats(output: &str) -> DiskInfo {
    let mut stats = HashMap::new();
    let Ok(triplet_re) =
        Regex::new(r"^(.*)-.*:\s(.*)\s/\s([0-9]*[A-Z])\s[a-z]*\s=\s([0-9]*%)")
    else {
        return DiskInfo::default();
    };
    let Ok(simple_re) = Regex::new(r"^(.*):\s(\S*)") else {
        return DiskInfo::default();
    };
    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(caps) = triplet_re.captures(trimmed) {
            let label = caps[1].to_lowercase();
            stats.insert(format!("{label}_total"), caps[3].to_string());
            stats.insert(format!("{label}_free"), caps[4].to_string());
            stats.insert(format!("{label}_used"), caps[2].to_string());
        } else if let Some(caps) = simple_re.captures(trimmed) {
            stats.insert(caps[1].to_lowercase(), caps[2].to_string());
        }
    }
    DiskInfo { stats }
}

/// Parses interface listings in either of the two historical formats:
/// the compact one-line-per-interface `netcfg` dump, or the block-shaped
/// `ip address` dump that replaced it. The format is detected from the
/// input, never assumed.
pub fn parse_network_interfaces(output: &str) -> Vec<NetworkInterfaceInfo> {
    let Ok(block_header_re) = Regex::new(r"^\d+:\s+([^:@\s]+)") else {
        return Vec::new();
    };
    let is_block_format = output
        .lines()
        .any(|line| block_header_re.is_match(line.trim()));
    if is_block_format {
        parse_ip_address_blocks(output, &block_header_re)
    } else {
        parse_netcfg_lines(output)
    }
}

/// `wlan0    UP   10.0.1.34/24  0x00001043 38:aa:3c:11:22:33`
fn parse_netcfg_lines(output: &str) -> Vec<NetworkInterfaceInfo> {
    output
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 5 {
                return None;
            }
            let ip = tokens[2].split('/').next().map(str::to_string);
            Some(NetworkInterfaceInfo {
                name: tokens[0].to_string(),
                ip,
                mac: Some(tokens[4].to_string()),
            })
        })
        .collect()
}

/// `2: wlan0: <...>` header lines followed by indented `link/ether` and
/// `inet` detail lines.
fn parse_ip_address_blocks(
    output: &str,
    header_re: &Regex,
) -> Vec<NetworkInterfaceInfo> {
    let mut interfaces: Vec<NetworkInterfaceInfo> = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(caps) = header_re.captures(trimmed) {
            interfaces.push(NetworkInterfaceInfo {
                name: caps[1].to_string(),
                ip: None,
                mac: None,
            });
            continue;
        }
        let Some(current) = interfaces.last_mut() else {
            continue;
        };
        if let Some(rest) = trimmed.strip_prefix("link/") {
            if current.mac.is_none() {
                current.mac = rest.split_whitespace().nth(1).map(str::to_string);
            }
        } else if let Some(rest) = trimmed.strip_prefix("inet ") {
            if current.ip.is_none() {
                current.ip = rest
                    .split_whitespace()
                    .next()
                    .and_then(|addr| addr.split('/').next())
                    .map(str::to_string);
            }
        }
    }
    interfaces
}

/// Extracts an interface's IPv4 address from `ifconfig <iface>` output.
/// Handles both the modern `ip 10.0.1.34 mask ...` line and the legacy
/// `inet addr:10.0.1.34  Bcast:...` line.
pub fn parse_ifconfig_ip(output: &str) -> Option<String> {
    let modern = Regex::new(r"ip (.*) mask").ok()?;
    if let Some(caps) = modern.captures(output) {
        return Some(caps[1].trim().to_string());
    }
    let legacy = Regex::new(r"inet addr:(.*?)\s+Bcast").ok()?;
    legacy
        .captures(output)
        .map(|caps| caps[1].trim().to_string())
}

/// Extracts the wlan0 MAC from `ip address` output. The dump may wrap the
/// interesting line, so CR/LF pairs are folded away before matching.
pub fn parse_wifi_mac(output: &str) -> Option<String> {
    let folded = output.replace("\r\n", "");
    let re = Regex::new(r"wlan0: .+? (\w{2}:\w{2}:\w{2}:\w{2}:\w{2}:\w{2})").ok()?;
    re.captures(&folded).map(|caps| caps[1].to_string())
}

/// Extracts connection state and access point name from the `mNetworkInfo`
/// line of `dumpsys wifi`.
pub fn parse_wifi_status(output: &str) -> Option<WifiStatus> {
    let state_re = Regex::new(r"state:(.*?),").ok()?;
    let extra_re = Regex::new(r"extra:(.*?),").ok()?;
    let status = state_re.captures(output)?[1].trim().to_string();
    let access_point = extra_re.captures(output)?[1].trim().replace('"', "");
    Some(WifiStatus {
        status,
        access_point,
    })
}

/// Extracts the leading seconds value from a `/proc/uptime` dump, rounded
/// half-away-from-zero to whole seconds.
pub fn parse_uptime(output: &str) -> Option<u64> {
    let seconds: f64 = output.split_whitespace().next()?.parse().ok()?;
    Some(seconds.round() as u64)
}

/// Pulls the smallest-width density figure (`sw<N>dp`) from a `dumpsys
/// window` dump. When the token occurs more than once the last one wins.
pub fn parse_dpi(output: &str) -> Option<u32> {
    let re = Regex::new(r"sw(\d+)dp").ok()?;
    let mut dpi = None;
    for line in output.lines() {
        if let Some(caps) = re.captures(line) {
            dpi = caps[1].parse::<u32>().ok();
        }
    }
    dpi
}

/// Extracts `(width, height)` from the `mUnrestrictedScreen` line of a
/// window dump.
pub fn parse_resolution(output: &str) -> Option<(u32, u32)> {
    let re = Regex::new(r"(\d+)x(\d+)\s*$").ok()?;
    for line in output.lines() {
        if !line.contains("mUnrestrictedScreen") {
            continue;
        }
        if let Some(caps) = re.captures(line.trim()) {
            let width = caps[1].parse().ok()?;
            let height = caps[2].parse().ok()?;
            return Some((width, height));
        }
    }
    None
}
