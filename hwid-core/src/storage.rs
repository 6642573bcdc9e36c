//! Fingerprint persistence
//!
//! A stored record is the raw 64-bit fingerprint XORed with the mask of its
//! storage scope, written as 16 uppercase hex digits with nothing after it.
//! System and package scopes use different masks, so a value copied from one
//! scope into the other decodes to garbage and fails the consistency check.
//!
//! Every location is independent: a read or write failure on one never
//! affects the others.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bloom::BloomValue;
use crate::constants::{mask, record};
use crate::error::{HwidError, Result};

// ============================================================================
// Storage Scope
// ============================================================================

/// Which obfuscation mask a location uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageScope {
    /// Per-user or system-wide locations
    System,
    /// Files next to the installed package
    Package,
}

impl StorageScope {
    pub const fn mask(self) -> u64 {
        match self {
            Self::System => mask::SYSTEM,
            Self::Package => mask::PACKAGE,
        }
    }
}

// ============================================================================
// Record Format
// ============================================================================

/// Obfuscate a raw fingerprint for `scope`
pub fn encode_record(raw: BloomValue, scope: StorageScope) -> String {
    format!("{:016X}", raw.raw() ^ scope.mask())
}

/// Parse the masked value of a stored record
///
/// Leading whitespace and an optional `0x` prefix are skipped, then up to 16
/// hex digits of either case are read. Anything after them is ignored.
pub fn parse_record(text: &str) -> Result<u64> {
    let text = text.trim_start();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    let digits: String = text
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .take(record::HEX_DIGITS)
        .collect();

    if digits.is_empty() {
        return Err(HwidError::invalid_record("no hex digits"));
    }

    u64::from_str_radix(&digits, 16).map_err(|e| HwidError::invalid_record(e.to_string()))
}

// ============================================================================
// Storage Locations
// ============================================================================

/// A place a fingerprint record can be read from and written to
#[cfg_attr(test, mockall::automock)]
pub trait StorageLocation {
    /// Human readable name for logs and reports
    fn describe(&self) -> String;

    fn scope(&self) -> StorageScope;

    /// Stored text; an absent record is an error like any other
    fn read(&self) -> Result<String>;

    fn write(&self, contents: &str) -> Result<()>;
}

/// A record kept in a plain file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    path: PathBuf,
    scope: StorageScope,
}

impl FileLocation {
    pub fn new(path: impl Into<PathBuf>, scope: StorageScope) -> Self {
        Self {
            path: path.into(),
            scope,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageLocation for FileLocation {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn scope(&self) -> StorageScope {
        self.scope
    }

    fn read(&self) -> Result<String> {
        let metadata = fs::metadata(&self.path).map_err(|e| HwidError::file_read(&self.path, e))?;
        if metadata.len() > record::MAX_FILE_SIZE {
            return Err(HwidError::FileTooLarge {
                path: self.path.clone(),
                size: metadata.len(),
                max_size: record::MAX_FILE_SIZE,
            });
        }

        fs::read_to_string(&self.path).map_err(|e| HwidError::file_read(&self.path, e))
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| HwidError::file_write(parent, e))?;
        }

        // Write to a temp file then rename, so a crash never leaves a
        // truncated record behind.
        let temp_path = self.path.with_extension("tmp");
        let mut file =
            fs::File::create(&temp_path).map_err(|e| HwidError::file_write(&temp_path, e))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| HwidError::file_write(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| HwidError::file_write(&self.path, e))?;
        debug!(path = ?self.path, "Wrote fingerprint record");
        Ok(())
    }
}

// ============================================================================
// Fingerprint Record
// ============================================================================

/// A raw fingerprint recovered from one storage location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    /// Unmasked composite fingerprint
    pub raw: BloomValue,
    /// Location the record came from
    pub origin: String,
    pub scope: StorageScope,
    pub mask: u64,
}

/// Read and unmask the record at `location`
///
/// Returns `Ok(None)` when the stored value parses to zero, which counts as
/// "nothing stored".
pub fn load_record<L: StorageLocation + ?Sized>(location: &L) -> Result<Option<FingerprintRecord>> {
    let masked = parse_record(&location.read()?)?;
    if masked == 0 {
        return Ok(None);
    }

    let scope = location.scope();
    Ok(Some(FingerprintRecord {
        raw: BloomValue::from_raw(masked ^ scope.mask()),
        origin: location.describe(),
        scope,
        mask: scope.mask(),
    }))
}

/// Mask `raw` for the location's scope and write it
pub fn store_record<L: StorageLocation + ?Sized>(location: &L, raw: BloomValue) -> Result<()> {
    location.write(&encode_record(raw, location.scope()))
}

// ============================================================================
// Tests
// ============================================================================
