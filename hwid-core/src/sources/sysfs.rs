//! Linux pseudo-file collectors
//!
//! - CPU serial from `/proc/cpuinfo` (present on most ARM boards)
//! - Permanent MAC addresses from `/sys/class/net/*/address`
//! - MMC/SD card ids from `/sys/block/*/device/cid`
//!
//! Both roots are configurable so fixture trees can stand in for a machine.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::trace;

use super::{CandidateSource, SourceTag};
use crate::constants::paths;
use crate::error::{HwidError, Result};

/// Collector reading sysfs and procfs
#[derive(Debug, Clone)]
pub struct SysfsSource {
    sysfs_root: PathBuf,
    procfs_root: PathBuf,
}

impl SysfsSource {
    pub fn new(sysfs_root: impl Into<PathBuf>, procfs_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
            procfs_root: procfs_root.into(),
        }
    }

    /// CPU serial from cpuinfo, if the kernel exposes one
    pub fn cpu_serial(&self) -> Result<Option<String>> {
        let path = self.procfs_root.join(paths::CPUINFO);
        let content = fs::read_to_string(&path).map_err(|e| HwidError::file_read(&path, e))?;
        Ok(parse_cpu_serial(&content))
    }

    /// Addresses of network interfaces whose MAC is permanent
    pub fn net_addresses(&self) -> Result<Vec<String>> {
        let class = self.sysfs_root.join(paths::NET_CLASS);
        let mut addresses = Vec::new();

        for (name, dev) in sorted_entries(&class)? {
            if !is_permanent_net_device(&name, &dev) {
                trace!(device = %name, "Skipping network device with volatile address");
                continue;
            }

            if let Some(address) = read_attr(&dev, "address") {
                addresses.push(address.replace(':', ""));
            }
        }

        Ok(addresses)
    }

    /// Card ids of block devices that expose one
    pub fn block_ids(&self) -> Result<Vec<String>> {
        let class = self.sysfs_root.join(paths::BLOCK_CLASS);

        Ok(sorted_entries(&class)?
            .into_iter()
            .filter_map(|(_, dev)| read_attr(&dev, paths::BLOCK_CID))
            .collect())
    }
}

impl Default for SysfsSource {
    fn default() -> Self {
        Self::new(paths::SYSFS_ROOT, paths::PROCFS_ROOT)
    }
}

impl CandidateSource for SysfsSource {
    fn list_candidates(&self, tag: SourceTag) -> Result<Vec<String>> {
        match tag {
            SourceTag::CpuSerial => Ok(self.cpu_serial()?.into_iter().collect()),
            SourceTag::NetDevice => self.net_addresses(),
            SourceTag::BlockDevice => self.block_ids(),
            SourceTag::PlatformId | SourceTag::ProcessOutput => Ok(Vec::new()),
        }
    }
}

/// Extract the value of the first `Serial` line of a cpuinfo dump
pub fn parse_cpu_serial(cpuinfo: &str) -> Option<String> {
    let pattern = Regex::new(r"(?m)^Serial\s*:\s*(\S+)\s*$").ok()?;
    pattern
        .captures(cpuinfo)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Interfaces with regenerated or randomized MACs never identify a device.
/// A missing `addr_assign_type` means an old kernel and is accepted.
fn is_permanent_net_device(name: &str, dev: &Path) -> bool {
    let lowered = name.to_ascii_lowercase();
    if paths::VOLATILE_NET_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return false;
    }

    match read_attr(dev, "addr_assign_type") {
        Some(kind) => kind.parse::<i32>().map(|k| k == 0).unwrap_or(false),
        None => true,
    }
}

/// Directory entries sorted by name, so enumeration is stable across runs
fn sorted_entries(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries: Vec<(String, PathBuf)> = fs::read_dir(dir)
        .map_err(|e| HwidError::file_read(dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .collect();

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn read_attr(path: &Path, attr: &str) -> Option<String> {
    if attr.contains("..") || attr.contains('\0') {
        return None;
    }
    fs::read_to_string(path.join(attr))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
