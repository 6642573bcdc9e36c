//! Constants and configuration values for hwid
//!
//! Centralizes the bit budgets, masks, paths and timeouts used by the
//! identification engine. Add new magic numbers here first.

use std::time::Duration;

/// Bloom filter parameters
pub mod bloom {
    /// Smallest buffer that contributes to a filter
    pub const MIN_INPUT_LEN: usize = 1;

    /// Largest buffer that contributes to a filter
    pub const MAX_INPUT_LEN: usize = 512;

    /// Each checksum chunk selects one of 64 bit positions
    pub const CHUNK_BITS: u32 = 6;

    /// Mask extracting one chunk from the checksum
    pub const CHUNK_MASK: u32 = (1 << CHUNK_BITS) - 1;
}

/// Weight budgets for generation and checking
pub mod weight {
    /// Enumerable sources stop contributing once the composite reaches this weight
    pub const MAX_BITS_GEN: u32 = 30;

    /// Stored fingerprints heavier than this are treated as corrupt
    pub const MAX_BITS_CHECK: u32 = MAX_BITS_GEN + 6;

    /// Weight is divided by this to get the number of required corroborations
    pub const MATCH_DIVISOR: u32 = 4;

    /// A fingerprint always needs at least this many corroborations
    pub const MIN_MATCHES: u32 = 1;
}

/// Obfuscation masks applied to persisted raw values
pub mod mask {
    /// Per-user and system-wide storage locations
    pub const SYSTEM: u64 = 0x1033_1c2d_ce4c_91db;

    /// Storage next to the installed package
    pub const PACKAGE: u64 = 0x7ffc_48fb_ac17_11f1;
}

/// Plausibility heuristics
pub mod plausibility {
    /// Length of a public identifier (128-bit digest as hex)
    pub const PUBLIC_ID_LEN: usize = 32;

    /// Candidates must use more than this many distinct hex digits
    pub const MAX_TRIVIAL_DIGITS: u32 = 2;
}

/// Stored record format
pub mod record {
    /// Hex digits in a persisted raw value
    pub const HEX_DIGITS: usize = 16;

    /// Stored records larger than this are not parsed
    pub const MAX_FILE_SIZE: u64 = 4 * 1024;

    /// File name used for every file-backed location
    pub const FILE_NAME: &str = ".hwid_id";
}

/// Configuration file limits
pub mod config {
    /// Config files larger than this are rejected
    pub const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Environment variable naming an explicit config file
    pub const ENV_PATH: &str = "HWID_CONFIG";

    /// Default application name used for the config-dir location
    pub const DEFAULT_APP_NAME: &str = "hwid";
}

/// External process sources
pub mod process {
    use super::*;

    /// How long a helper process may run before it counts as failed
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

    /// Poll interval while waiting for a helper to exit
    pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Helper output beyond this is ignored
    pub const MAX_OUTPUT: usize = 4096;

    /// Default helper commands for the current target
    #[cfg(target_os = "windows")]
    pub const DEFAULT_COMMANDS: &[&str] = &[
        "wmic path win32_physicalmedia get SerialNumber",
        "wmic bios get serialnumber",
    ];

    #[cfg(not(target_os = "windows"))]
    pub const DEFAULT_COMMANDS: &[&str] = &[];
}

/// System paths
pub mod paths {
    /// Default sysfs mount point
    pub const SYSFS_ROOT: &str = "/sys";

    /// Default procfs mount point
    pub const PROCFS_ROOT: &str = "/proc";

    /// Network interfaces, relative to the sysfs root
    pub const NET_CLASS: &str = "class/net";

    /// Block devices, relative to the sysfs root
    pub const BLOCK_CLASS: &str = "block";

    /// Per-block-device card id, relative to the device entry
    pub const BLOCK_CID: &str = "device/cid";

    /// CPU information, relative to the procfs root
    pub const CPUINFO: &str = "cpuinfo";

    /// Network interfaces whose MAC address is regenerated on every boot
    pub const VOLATILE_NET_PREFIXES: &[&str] = &["ccmni", "ifb"];

    /// Home directory of the user this process acts for
    ///
    /// When elevated through sudo or pkexec the invoking user's home is used,
    /// so the identifier lands next to the user's other settings instead of
    /// in root's home.
    pub fn user_home_dir() -> Option<std::path::PathBuf> {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if let Some(home) = get_user_home(&sudo_user) {
                return Some(home);
            }
        }

        if let Ok(pkexec_uid) = std::env::var("PKEXEC_UID") {
            if let Some(home) = pkexec_uid.parse::<u32>().ok().and_then(get_home_by_uid) {
                return Some(home);
            }
        }

        if let Ok(home) = std::env::var("HOME") {
            if !home.is_empty() {
                return Some(std::path::PathBuf::from(home));
            }
        }

        dirs::home_dir()
    }

    /// Whether the process runs with an effective uid of root
    #[cfg(unix)]
    pub fn is_elevated() -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    pub fn is_elevated() -> bool {
        false
    }

    /// Get home directory for a username
    fn get_user_home(username: &str) -> Option<std::path::PathBuf> {
        let passwd = std::fs::read_to_string("/etc/passwd").ok()?;
        passwd_field(&passwd, |parts| parts[0] == username)
    }

    /// Get home directory by UID
    fn get_home_by_uid(uid: u32) -> Option<std::path::PathBuf> {
        let passwd = std::fs::read_to_string("/etc/passwd").ok()?;
        passwd_field(&passwd, |parts| parts[2].parse::<u32>().ok() == Some(uid))
    }

    fn passwd_field(
        passwd: &str,
        matches: impl Fn(&[&str]) -> bool,
    ) -> Option<std::path::PathBuf> {
        passwd
            .lines()
            .map(|line| line.split(':').collect::<Vec<&str>>())
            .find(|parts| parts.len() >= 6 && matches(parts))
            .map(|parts| std::path::PathBuf::from(parts[5]))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const PASSWD: &str = "root:x:0:0:root:/root:/bin/bash\n\
                              alice:x:1000:1000:Alice:/home/alice:/bin/zsh\n\
                              broken:x\n";

        #[test]
        fn test_passwd_lookup_by_name() {
            let home = passwd_field(PASSWD, |parts| parts[0] == "alice");
            assert_eq!(home, Some(std::path::PathBuf::from("/home/alice")));
        }

        #[test]
        fn test_passwd_lookup_by_uid() {
            let home = passwd_field(PASSWD, |parts| parts[2].parse::<u32>().ok() == Some(0));
            assert_eq!(home, Some(std::path::PathBuf::from("/root")));
        }

        #[test]
        fn test_passwd_skips_short_lines() {
            assert_eq!(passwd_field(PASSWD, |parts| parts[0] == "broken"), None);
        }
    }
}
