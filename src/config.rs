use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::exec::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};

/// Retry tuning for the enumeration call, in plain numbers so it can sit
/// in a config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrySettings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.timeout_secs),
            max_attempts: self.max_attempts,
        }
    }
}

/// Tool locations and execution tuning. Empty paths fall back to PATH
/// lookup of the bare tool names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub adb_path: String,
    pub aapt_path: String,
    pub retry: RetrySettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_constants() {
        let config = Config::default();
        let policy = config.retry.policy();
        assert_eq!(policy.timeout, DEFAULT_TIMEOUT);
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: Config = serde_json::from_str(r#"{"adb_path": "/opt/sdk/adb"}"#)
            .expect("partial config");
        assert_eq!(config.adb_path, "/opt/sdk/adb");
        assert_eq!(config.retry, RetrySettings::default());
    }
}
