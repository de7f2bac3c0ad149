use std::io;

use thiserror::Error;

/// Crate-wide error type. Every variant that originates from an external
/// tool carries the offending command or identifier and, where available,
/// the tool's raw stderr.
#[derive(Debug, Error)]
pub enum Error {
    /// A required external tool could not be located. Fatal to the calling
    /// operation, never retried.
    #[error("required tool `{tool}` not available: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    /// The bridge tool exited non-zero and stderr matched no more specific
    /// pattern.
    #[error("adb command failed: {command}: {stderr}")]
    BridgeCommand { command: String, stderr: String },

    /// The package-inspection tool exited non-zero. Kept apart from the
    /// bridge failure so a broken apk is never reported as an adb fault.
    #[error("aapt command failed: {command}: {stderr}")]
    InspectionCommand { command: String, stderr: String },

    /// The device is attached but has not authorized this host.
    #[error("device unauthorized: {stderr}")]
    UnauthorizedDevice { stderr: String },

    /// The device vanished or was never reachable.
    #[error("device not found: {stderr}")]
    DeviceNotFound { stderr: String },

    /// `adb connect` reported the address as already connected. A subtype of
    /// the bridge command failure, split out so callers can treat it as
    /// non-fatal.
    #[error("device {address} already connected")]
    DeviceAlreadyConnected { address: String },

    /// Every retry attempt hit the per-attempt deadline.
    #[error("command `{command}` timed out after {attempts} attempt(s)")]
    CommandTimeout { command: String, attempts: u32 },

    /// Tool output did not match any known grammar for the sub-command.
    #[error("unexpected output format from `{command}`: {reason}")]
    UnexpectedOutput { command: String, reason: String },

    /// Output was well-formed but carried a value outside the known set.
    #[error("unrecognized value in output: {context}: got `{value}`")]
    UnrecognizedOutput { context: String, value: String },

    /// A query that requires a live device produced no usable output.
    #[error("no output returned - is a device connected?")]
    NoDeviceConnected,

    /// A requested field was absent from otherwise well-formed output.
    #[error("field `{field}` not found in {source_desc}")]
    FieldNotFound { field: String, source_desc: String },

    /// Malformed serial or ip:port supplied by the caller. Checked before
    /// any subprocess is spawned.
    #[error("invalid identifier `{value}`: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    /// Disconnect was requested on a device that is not a remote device.
    #[error("device `{qualifier}` is not a remote device")]
    NotRemoteDevice { qualifier: String },

    /// The subprocess itself could not be spawned. Distinct from a non-zero
    /// exit, which is a successful execution.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The signing tool exited non-zero.
    #[error("signing command failed: {stderr}")]
    Signing { stderr: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for the connect special case that callers commonly ignore.
    pub fn is_already_connected(&self) -> bool {
        matches!(self, Error::DeviceAlreadyConnected { .. })
    }
}
