//! Android device automation over the platform command-line tools.
//!
//! Shells out to `adb` (and `aapt` for apk inspection), parses the text
//! those tools print into typed records, and exposes device lifecycle
//! operations on a per-device handle.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use droidbridge::adb::AdbClient;
//! use droidbridge::device;
//!
//! fn main() -> droidbridge::Result<()> {
//!     let client = Arc::new(AdbClient::new());
//!     for mut device in device::devices(&client)? {
//!         let model = device.model()?;
//!         println!("{} {:?}", device.serial(), model);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aapt;
pub mod adb;
pub mod config;
pub mod device;
pub mod error;
pub mod exec;
pub mod logging;
pub mod models;
pub mod signing;

pub use adb::AdbClient;
pub use config::Config;
pub use device::{device, devices, Device};
pub use error::{Error, Result};
