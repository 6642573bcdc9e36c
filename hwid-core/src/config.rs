//! Identity configuration
//!
//! Describes where fingerprints are stored and which collectors run. Every
//! field has a default, so an absent config file simply means "use the
//! platform defaults".
//!
//! ```json
//! {
//!   "app_name": "hwid",
//!   "package_dir": "/opt/game",
//!   "platform_id_file": "/etc/machine-id",
//!   "command_timeout_ms": 500
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{config, paths, process, record};
use crate::error::{HwidError, Result};
use crate::storage::StorageScope;

/// One configured storage location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub path: PathBuf,
    pub scope: StorageScope,
}

impl StorageEntry {
    pub fn new(path: impl Into<PathBuf>, scope: StorageScope) -> Self {
        Self {
            path: path.into(),
            scope,
        }
    }
}

/// Settings for collectors and storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Names the per-application directory under the user config dir
    pub app_name: String,

    /// Explicit storage locations in load order; empty means platform defaults
    pub storage: Vec<StorageEntry>,

    /// Directory of the installed package; defaults to the working directory
    pub package_dir: Option<PathBuf>,

    /// File holding a platform-supplied device id
    pub platform_id_file: Option<PathBuf>,

    /// Helper commands whose output tokens are candidates
    pub commands: Vec<String>,

    /// How long each helper may run
    pub command_timeout_ms: u64,

    pub sysfs_root: PathBuf,
    pub procfs_root: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            app_name: config::DEFAULT_APP_NAME.to_string(),
            storage: Vec::new(),
            package_dir: None,
            platform_id_file: None,
            commands: process::DEFAULT_COMMANDS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            command_timeout_ms: process::DEFAULT_TIMEOUT.as_millis() as u64,
            sysfs_root: PathBuf::from(paths::SYSFS_ROOT),
            procfs_root: PathBuf::from(paths::PROCFS_ROOT),
        }
    }
}

impl IdentityConfig {
    /// Load from `path`, or from `$HWID_CONFIG` when no path is given
    ///
    /// A missing file yields the defaults; an oversized or malformed file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match std::env::var_os(config::ENV_PATH) {
                Some(p) if !p.is_empty() => PathBuf::from(p),
                _ => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(path = ?path, "No identity config found, using defaults");
            return Ok(Self::default());
        }

        let metadata = fs::metadata(&path).map_err(|e| HwidError::file_read(&path, e))?;
        if metadata.len() > config::MAX_FILE_SIZE {
            return Err(HwidError::FileTooLarge {
                path,
                size: metadata.len(),
                max_size: config::MAX_FILE_SIZE,
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| HwidError::file_read(&path, e))?;
        let parsed: Self = serde_json::from_str(&content)?;
        parsed.validate()?;

        debug!(path = ?path, storage = parsed.storage.len(), "Loaded identity config");
        Ok(parsed)
    }

    /// Reject values that would make every run fail the same way
    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(HwidError::config("app_name must not be empty"));
        }
        if self.app_name.contains(['/', '\\']) || self.app_name.contains("..") {
            return Err(HwidError::config("app_name must be a plain directory name"));
        }
        if self.command_timeout_ms == 0 {
            return Err(HwidError::config("command_timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Storage locations in load order
    pub fn storage_entries(&self) -> Vec<StorageEntry> {
        if !self.storage.is_empty() {
            return self.storage.clone();
        }
        self.default_storage()
    }

    /// Config dir, then the home-relative chain, then the package directory
    fn default_storage(&self) -> Vec<StorageEntry> {
        let mut entries = Vec::new();

        if let Some(dir) = user_config_dir() {
            entries.push(StorageEntry::new(
                dir.join(&self.app_name).join(record::FILE_NAME),
                StorageScope::System,
            ));
        }

        if let Some(home) = paths::user_home_dir() {
            for dir in [home.join(".config"), home.join(".local"), home] {
                entries.push(StorageEntry::new(dir.join(record::FILE_NAME), StorageScope::System));
            }
        }

        entries.push(StorageEntry::new(
            self.package_dir().join(record::FILE_NAME),
            StorageScope::Package,
        ));

        entries.dedup_by(|a, b| a.path == b.path);
        entries
    }

    pub fn package_dir(&self) -> PathBuf {
        self.package_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// XDG config dir of the user this process acts for
fn user_config_dir() -> Option<PathBuf> {
    if std::env::var_os("SUDO_USER").is_none() && std::env::var_os("PKEXEC_UID").is_none() {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|x| !x.is_empty()) {
            return Some(PathBuf::from(xdg));
        }
    }

    paths::user_home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}
