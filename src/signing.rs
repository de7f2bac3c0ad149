//! Keystore generation and apk signing, driven through the JDK's keytool
//! and jarsigner plus the inspector's archive listing.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::info;
use zip::{ZipArchive, ZipWriter};

use crate::aapt::AaptClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::exec::{Executor, SystemExecutor};

const DEFAULT_ALIAS: &str = "automation";
const DEFAULT_DNAME: &str = "CN=automation";
const DEFAULT_PASSWORD: &str = "automation";
const KEY_VALIDITY_DAYS: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct KeystoreOptions {
    pub keystore: PathBuf,
    pub alias: String,
    pub dname: String,
    pub password: String,
}

impl KeystoreOptions {
    pub fn new(keystore: impl Into<PathBuf>) -> Self {
        Self {
            keystore: keystore.into(),
            alias: DEFAULT_ALIAS.to_string(),
            dname: DEFAULT_DNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignOptions {
    pub apk: PathBuf,
    pub keystore: PathBuf,
    pub alias: String,
    pub keystore_password: String,
    /// Strip any existing signature and sign again instead of treating an
    /// already-signed archive as done.
    pub resign: bool,
}

impl SignOptions {
    pub fn new(apk: impl Into<PathBuf>, keystore: impl Into<PathBuf>) -> Self {
        Self {
            apk: apk.into(),
            keystore: keystore.into(),
            alias: DEFAULT_ALIAS.to_string(),
            keystore_password: DEFAULT_PASSWORD.to_string(),
            resign: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutcome {
    Signed,
    /// The archive already carried a signature and `resign` was not set.
    AlreadySigned,
}

pub struct SigningService {
    executor: Arc<dyn Executor>,
    aapt: AaptClient,
}

impl Default for SigningService {
    fn default() -> Self {
        Self::new()
    }
}

impl SigningService {
    pub fn new() -> Self {
        Self {
            executor: Arc::new(SystemExecutor),
            aapt: AaptClient::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            executor: Arc::new(SystemExecutor),
            aapt: AaptClient::from_config(config)?,
        })
    }

    pub fn with_parts(executor: Arc<dyn Executor>, aapt: AaptClient) -> Self {
        Self { executor, aapt }
    }

    /// Generates a fresh RSA keystore. A pre-existing keystore file is
    /// renamed to `<path>.backup` first, never silently destroyed.
    pub fn generate_keystore(&self, options: &KeystoreOptions) -> Result<()> {
        if options.keystore.exists() {
            let backup = backup_path(&options.keystore);
            info!(keystore = %options.keystore.display(), backup = %backup.display(),
                  "backing up existing keystore");
            fs::rename(&options.keystore, &backup)?;
        }
        let command = format!(
            "keytool -genkey -noprompt -alias {alias} -dname '{dname}' -keystore {keystore} \
             -storepass {password} -keypass {password} -keyalg RSA -keysize 2048 -validity {validity}",
            alias = options.alias,
            dname = options.dname,
            keystore = options.keystore.display(),
            password = options.password,
            validity = KEY_VALIDITY_DAYS,
        );
        let result = self.executor.execute(&command)?;
        if !result.success() {
            return Err(Error::Signing {
                stderr: result.stderr,
            });
        }
        Ok(())
    }

    /// Signs an apk with jarsigner. Signing an already-signed archive is a
    /// no-op unless `resign` is set, in which case the existing signature
    /// entries are stripped before signing.
    pub fn sign_apk(&self, options: &SignOptions) -> Result<SignOutcome> {
        let apk = options.apk.to_string_lossy();
        if self.is_signed(&apk)? {
            if !options.resign {
                return Ok(SignOutcome::AlreadySigned);
            }
            self.unsign(&options.apk)?;
        }
        let command = format!(
            "jarsigner -verbose -sigalg SHA1withRSA -digestalg SHA1 -keystore {keystore} \
             -storepass {password} {apk} {alias}",
            keystore = options.keystore.display(),
            password = options.keystore_password,
            apk = apk,
            alias = options.alias,
        );
        let result = self.executor.execute(&command)?;
        if !result.success() {
            return Err(Error::Signing {
                stderr: result.stderr,
            });
        }
        Ok(SignOutcome::Signed)
    }

    /// True when the archive's file listing carries signature-block
    /// entries under META-INF.
    pub fn is_signed(&self, apk_path: &str) -> Result<bool> {
        let entries = self.aapt.list(apk_path)?;
        Ok(entries.iter().any(|entry| is_signature_entry(entry)))
    }

    /// Rewrites the archive without its signature entries. The rewritten
    /// copy replaces the original atomically.
    pub fn unsign(&self, apk_path: &Path) -> Result<()> {
        let mut archive = ZipArchive::new(File::open(apk_path)?)?;
        let stripped_path = apk_path.with_extension("unsigned.tmp");
        let mut writer = ZipWriter::new(File::create(&stripped_path)?);

        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            if is_signature_entry(entry.name()) || is_signature_manifest(entry.name()) {
                continue;
            }
            writer.raw_copy_file(entry)?;
        }
        writer.finish()?;
        fs::rename(&stripped_path, apk_path)?;
        Ok(())
    }
}

fn backup_path(keystore: &Path) -> PathBuf {
    let mut backup = keystore.as_os_str().to_os_string();
    backup.push(".backup");
    PathBuf::from(backup)
}

/// Signature blocks live under META-INF with an .RSA/.DSA/.EC suffix.
fn is_signature_entry(name: &str) -> bool {
    static PATTERN: &str = r"^META-INF/.*\.(RSA|DSA|EC)$";
    Regex::new(PATTERN)
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// The matching .SF digest files must go too, or jarsigner refuses the
/// re-sign.
fn is_signature_manifest(name: &str) -> bool {
    name.starts_with("META-INF/") && name.ends_with(".SF")
}
