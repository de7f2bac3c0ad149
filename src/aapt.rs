//! Client for the package-inspection tool. Extracts apk metadata from its
//! `dump badging` output and exposes the archive file listing used by the
//! signing service.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::adb::locator;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::exec::{Executor, SystemExecutor};

/// Nested map built from `dump badging` output: section name to field map.
pub type AppProps = HashMap<String, HashMap<String, String>>;

pub struct AaptClient {
    program: String,
    executor: Arc<dyn Executor>,
    // Capability probe result; checked once, not inferred from a failed run.
    available: OnceLock<bool>,
}

impl Default for AaptClient {
    fn default() -> Self {
        Self::new()
    }
}

impl AaptClient {
    pub fn new() -> Self {
        Self::with_executor(Arc::new(SystemExecutor))
    }

    /// Builds a client from configuration, rejecting an explicitly
    /// configured path that does not resolve to an executable.
    pub fn from_config(config: &Config) -> Result<Self> {
        let program = locator::resolve_program(&config.aapt_path, "aapt");
        locator::validate_program(&program)?;
        Ok(Self::with_executor(Arc::new(SystemExecutor)).program(program))
    }

    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            program: "aapt".to_string(),
            executor,
            available: OnceLock::new(),
        }
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// True when the inspection tool resolves on this host.
    pub fn available(&self) -> bool {
        *self.available.get_or_init(|| {
            self.executor
                .execute(&format!("which {}", self.program))
                .map(|result| result.success())
                .unwrap_or(false)
        })
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available() {
            Ok(())
        } else {
            Err(Error::ToolUnavailable {
                tool: self.program.clone(),
                reason: "not found on PATH - add the Android build tools to PATH or configure aapt_path".to_string(),
            })
        }
    }

    /// Scrapes `dump badging` output into a nested section/field map. Each
    /// matching line is `<section>: <k='v' k='v' ...>`; wrapping quotes are
    /// stripped from every token. For repeated sections the first wins.
    pub fn get_app_props(&self, apk_path: &str) -> Result<AppProps> {
        self.ensure_available()?;
        let command = format!("{} dump badging {}", self.program, apk_path);
        let result = self.executor.execute(&command)?;
        if !result.success() {
            return Err(Error::InspectionCommand {
                command,
                stderr: result.stderr,
            });
        }
        Ok(parse_badging(&result.stdout))
    }

    /// Package name from the `package` section.
    pub fn package_name(&self, apk_path: &str) -> Result<String> {
        self.package_field(apk_path, "name")
    }

    /// Version string from the `package` section.
    pub fn version_name(&self, apk_path: &str) -> Result<String> {
        self.package_field(apk_path, "versionName")
    }

    fn package_field(&self, apk_path: &str, field: &str) -> Result<String> {
        let props = self.get_app_props(apk_path)?;
        props
            .get("package")
            .and_then(|section| section.get(field))
            .cloned()
            .ok_or_else(|| Error::FieldNotFound {
                field: field.to_string(),
                source_desc: format!("badging output for {apk_path}"),
            })
    }

    /// Archive file listing (`aapt list`), one entry per line.
    pub fn list(&self, apk_path: &str) -> Result<Vec<String>> {
        self.ensure_available()?;
        let command = format!("{} list {}", self.program, apk_path);
        let result = self.executor.execute(&command)?;
        if !result.success() {
            return Err(Error::InspectionCommand {
                command,
                stderr: result.stderr,
            });
        }
        Ok(result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

fn parse_badging(output: &str) -> AppProps {
    let mut props = AppProps::new();
    let Ok(line_re) = Regex::new(r"^(.*): (.*)$") else {
        return props;
    };
    for line in output.lines() {
        let Some(caps) = line_re.captures(line.trim_end()) else {
            continue;
        };
        let section = caps[1].to_string();
        let fields = props.entry(section).or_default();
        for token in caps[2].split_whitespace() {
            let cleaned = token.replace(['\'', '"'], "");
            if let Some((key, value)) = cleaned.split_once('=') {
                fields.entry(key.to_string()).or_insert_with(|| value.to_string());
            }
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::exec::testutil::{failed, ok, ScriptedExecutor};

    const BADGING: &str = "\
package: name='bbc.iplayer.android' versionCode='4200066' versionName='4.2.0.66'
sdkVersion:'15'
application-label:'BBC iPlayer'
uses-permission: name='android.permission.INTERNET'
";

    fn client_with(
        script: impl Fn(&str) -> crate::error::Result<crate::models::CommandResult>
            + Send
            + Sync
            + 'static,
    ) -> AaptClient {
        AaptClient::with_executor(Arc::new(ScriptedExecutor::new(script)))
    }

    fn probe_then(badging: &'static str) -> AaptClient {
        client_with(move |command| {
            if command.starts_with("which") {
                ok("/usr/local/bin/aapt\n")
            } else {
                ok(badging)
            }
        })
    }

    #[test]
    fn from_config_rejects_bad_explicit_path() {
        let config = Config {
            aapt_path: "/this/path/should/not/exist/aapt".to_string(),
            ..Config::default()
        };
        let err = AaptClient::from_config(&config).err().expect("invalid path");
        assert!(matches!(err, Error::ToolUnavailable { .. }));
    }

    #[test]
    fn parses_badging_sections() {
        let props = parse_badging(BADGING);
        let package = props.get("package").expect("package section");
        assert_eq!(package.get("name").map(String::as_str), Some("bbc.iplayer.android"));
        assert_eq!(package.get("versionCode").map(String::as_str), Some("4200066"));
        assert_eq!(
            props.get("uses-permission").and_then(|s| s.get("name")).map(String::as_str),
            Some("android.permission.INTERNET")
        );
    }

    #[test]
    fn package_name_and_version() {
        let client = probe_then(BADGING);
        assert_eq!(client.package_name("app.apk").expect("name"), "bbc.iplayer.android");
        assert_eq!(client.version_name("app.apk").expect("version"), "4.2.0.66");
    }

    #[test]
    fn missing_name_token_is_field_not_found() {
        let client = probe_then("package: versionCode='1' versionName='1.0'\n");
        let err = client.package_name("app.apk").unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { .. }));
    }

    #[test]
    fn unavailable_tool_is_fatal_and_probed_once() {
        let executor = Arc::new(ScriptedExecutor::new(|_| failed(1, "")));
        let client = AaptClient::with_executor(executor.clone());
        assert!(matches!(
            client.get_app_props("app.apk").unwrap_err(),
            Error::ToolUnavailable { .. }
        ));
        assert!(matches!(
            client.package_name("app.apk").unwrap_err(),
            Error::ToolUnavailable { .. }
        ));
        // One `which` probe, no badging attempts.
        assert_eq!(executor.calls(), vec!["which aapt"]);
    }

    #[test]
    fn dump_failure_is_attributed_to_aapt() {
        let client = client_with(|command| {
            if command.starts_with("which") {
                ok("/usr/local/bin/aapt\n")
            } else {
                failed(1, "ERROR: dump failed because assets could not be loaded\n")
            }
        });
        let err = client.get_app_props("broken.apk").unwrap_err();
        assert!(matches!(err, Error::InspectionCommand { .. }));
        let message = err.to_string();
        assert!(message.starts_with("aapt command failed:"), "got: {message}");
        assert!(!message.contains("adb"), "got: {message}");
    }

    #[test]
    fn list_returns_archive_entries() {
        let client = client_with(|command| {
            if command.starts_with("which") {
                ok("/usr/local/bin/aapt\n")
            } else {
                ok("AndroidManifest.xml\nclasses.dex\nMETA-INF/CERT.RSA\n")
            }
        });
        let entries = client.list("app.apk").expect("listing");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2], "META-INF/CERT.RSA");
    }
}
