//! Identifier sources
//!
//! Everything platform specific sits behind [`CandidateSource`]: given a
//! [`SourceTag`] it returns the raw identifier strings currently visible for
//! that category. The bloom logic in `aggregate` and `consistency` only ever
//! talks to this trait, so it can be exercised without touching the machine.
//!
//! A source failure (missing pseudo-file, permission denied, helper process
//! timing out) is reported as an `Err` and treated by callers as "no
//! candidates". It is never fatal.

mod platform;
mod process;
mod sysfs;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HwidError, Result};

pub use platform::PlatformSource;
pub use process::{run_helper, ProcessSource};
pub use sysfs::{parse_cpu_serial, SysfsSource};

// ============================================================================
// Source Categories
// ============================================================================

/// Category of hardware identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Platform-supplied device id (e.g. a machine id file)
    PlatformId,
    /// CPU serial number
    CpuSerial,
    /// One entry per block device card id
    BlockDevice,
    /// One entry per network interface with a permanent address
    NetDevice,
    /// Tokens printed by an external helper process
    ProcessOutput,
}

impl SourceTag {
    /// All categories in generation order
    pub const ALL: [SourceTag; 5] = [
        SourceTag::PlatformId,
        SourceTag::CpuSerial,
        SourceTag::BlockDevice,
        SourceTag::NetDevice,
        SourceTag::ProcessOutput,
    ];

    /// Enumerable categories may yield many candidates, each checked on its own.
    /// Singleton categories yield at most one.
    pub fn is_enumerable(self) -> bool {
        !matches!(self, Self::PlatformId | Self::CpuSerial)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlatformId => "platform_id",
            Self::CpuSerial => "cpu_serial",
            Self::BlockDevice => "block_device",
            Self::NetDevice => "net_device",
            Self::ProcessOutput => "process_output",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Capability Interface
// ============================================================================

/// Capability that lists raw identifier strings per category
#[cfg_attr(test, mockall::automock)]
pub trait CandidateSource {
    /// List the candidates currently visible for `tag`
    ///
    /// Categories a source does not know about return an empty list.
    fn list_candidates(&self, tag: SourceTag) -> Result<Vec<String>>;
}

impl<T: CandidateSource + ?Sized> CandidateSource for &T {
    fn list_candidates(&self, tag: SourceTag) -> Result<Vec<String>> {
        (**self).list_candidates(tag)
    }
}

impl<T: CandidateSource + ?Sized> CandidateSource for Box<T> {
    fn list_candidates(&self, tag: SourceTag) -> Result<Vec<String>> {
        (**self).list_candidates(tag)
    }
}

// ============================================================================
// In-Memory Source
// ============================================================================

/// Fixed candidate lists, used for replaying hardware and for tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    candidates: HashMap<SourceTag, Vec<String>>,
    failing: HashSet<SourceTag>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidates of one category
    pub fn with<I, S>(mut self, tag: SourceTag, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(tag, candidates);
        self
    }

    /// Make one category fail as if the device were unreadable
    pub fn failing(mut self, tag: SourceTag) -> Self {
        self.failing.insert(tag);
        self
    }

    pub fn set<I, S>(&mut self, tag: SourceTag, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing.remove(&tag);
        self.candidates
            .insert(tag, candidates.into_iter().map(Into::into).collect());
    }

    /// Forget a category entirely, as if the hardware was removed
    pub fn remove(&mut self, tag: SourceTag) {
        self.candidates.remove(&tag);
    }
}

impl CandidateSource for StaticSource {
    fn list_candidates(&self, tag: SourceTag) -> Result<Vec<String>> {
        if self.failing.contains(&tag) {
            return Err(HwidError::unavailable(format!("{} is failing", tag)));
        }
        Ok(self.candidates.get(&tag).cloned().unwrap_or_default())
    }
}
