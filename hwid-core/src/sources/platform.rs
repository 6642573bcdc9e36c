//! Per-target composite collector
//!
//! Selects the collectors that make sense for the compile target: pseudo-files
//! on Linux and Android, helper processes wherever commands are configured,
//! and an optional platform id file everywhere.

use std::fs;
use std::path::PathBuf;

use super::{CandidateSource, ProcessSource, SourceTag, SysfsSource};
use crate::config::IdentityConfig;
use crate::error::{HwidError, Result};

/// The collector used by a real process
#[derive(Debug, Clone)]
pub struct PlatformSource {
    sysfs: Option<SysfsSource>,
    process: ProcessSource,
    platform_id_file: Option<PathBuf>,
}

impl PlatformSource {
    pub fn from_config(config: &IdentityConfig) -> Self {
        let sysfs = if cfg!(any(target_os = "linux", target_os = "android")) {
            Some(SysfsSource::new(&config.sysfs_root, &config.procfs_root))
        } else {
            None
        };

        Self {
            sysfs,
            process: ProcessSource::new(config.commands.clone(), config.command_timeout()),
            platform_id_file: config.platform_id_file.clone(),
        }
    }

    fn platform_id(&self) -> Result<Vec<String>> {
        let Some(path) = &self.platform_id_file else {
            return Ok(Vec::new());
        };

        let content = fs::read_to_string(path).map_err(|e| HwidError::file_read(path, e))?;
        let id = content.trim();
        if id.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![id.to_string()])
    }
}

impl CandidateSource for PlatformSource {
    fn list_candidates(&self, tag: SourceTag) -> Result<Vec<String>> {
        match tag {
            SourceTag::PlatformId => self.platform_id(),
            SourceTag::ProcessOutput => self.process.list_candidates(tag),
            SourceTag::CpuSerial | SourceTag::NetDevice | SourceTag::BlockDevice => {
                match &self.sysfs {
                    Some(sysfs) => sysfs.list_candidates(tag),
                    None => Ok(Vec::new()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_platform_id_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machine-id");
        fs::write(&path, "4f1c8d2e9a7b40c3b5d6e7f809a1b2c3\n").unwrap();

        let config = IdentityConfig {
            platform_id_file: Some(path),
            commands: Vec::new(),
            ..IdentityConfig::default()
        };
        let source = PlatformSource::from_config(&config);

        assert_eq!(
            source.list_candidates(SourceTag::PlatformId).unwrap(),
            vec!["4f1c8d2e9a7b40c3b5d6e7f809a1b2c3".to_string()]
        );
        assert!(source.list_candidates(SourceTag::ProcessOutput).unwrap().is_empty());
    }

    #[test]
    fn test_unconfigured_platform_id_is_empty() {
        let config = IdentityConfig {
            commands: Vec::new(),
            ..IdentityConfig::default()
        };
        let source = PlatformSource::from_config(&config);
        assert!(source.list_candidates(SourceTag::PlatformId).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_platform_id_fails() {
        let dir = TempDir::new().unwrap();
        let config = IdentityConfig {
            platform_id_file: Some(dir.path().join("missing")),
            commands: Vec::new(),
            ..IdentityConfig::default()
        };
        let source = PlatformSource::from_config(&config);
        assert!(source.list_candidates(SourceTag::PlatformId).is_err());
    }
}
