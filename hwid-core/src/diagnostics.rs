//! Operator diagnostics
//!
//! Small reports used to inspect the encoder, the verifiers and the CPU serial
//! collector by hand. Each report renders to the one-line text the console
//! prints and serializes for `--json` output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::collect_candidates;
use crate::bloom::BloomValue;
use crate::plausibility::Plausibility;
use crate::sources::{CandidateSource, SourceTag};

/// Composite filter of a list of strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomReport {
    pub weight: u32,
    pub value: BloomValue,
}

impl fmt::Display for BloomReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weight, self.value)
    }
}

/// Encode every string and union the results
///
/// No plausibility filtering happens here; every string is encoded as given.
pub fn bloom_report<I, S>(inputs: I) -> BloomReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let value: BloomValue = inputs
        .into_iter()
        .map(|s| BloomValue::encode_str(s.as_ref()))
        .collect();

    BloomReport {
        weight: value.weight(),
        value,
    }
}

/// Verdict of a plausibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Good,
    Bad,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "Good"),
            Self::Bad => write!(f, "Bad"),
        }
    }
}

pub fn verify_report(candidate: &str, mode: Plausibility) -> Verdict {
    if mode.verify(candidate) {
        Verdict::Good
    } else {
        Verdict::Bad
    }
}

/// Result of probing the CPU serial collector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CpuSerialProbe {
    Found { serial: String, value: BloomValue },
    Missing,
}

impl fmt::Display for CpuSerialProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found { value, .. } => write!(f, "Got {}", value),
            Self::Missing => write!(f, "Could not get serial"),
        }
    }
}

/// Filter of the first plausible CPU serial the source reports
pub fn probe_cpu_serial<S: CandidateSource + ?Sized>(source: &S) -> CpuSerialProbe {
    collect_candidates(source, SourceTag::CpuSerial)
        .into_iter()
        .find(|c| c.plausible)
        .map(|c| CpuSerialProbe::Found {
            value: c.filter(),
            serial: c.value,
        })
        .unwrap_or(CpuSerialProbe::Missing)
}
