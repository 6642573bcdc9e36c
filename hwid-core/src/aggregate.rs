//! Identifier aggregation
//!
//! Pulls candidates from every category, drops implausible ones, encodes the
//! rest and unions them into one composite fingerprint. Enumerable categories
//! stop contributing once the composite reaches the generation weight cap, so
//! a machine with dozens of interfaces cannot saturate the filter. Singleton
//! categories contribute only their first plausible candidate, the same one
//! the consistency check later tests.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bloom::BloomValue;
use crate::constants::weight::MAX_BITS_GEN;
use crate::plausibility::verify_lenient;
use crate::sources::{CandidateSource, SourceTag};

/// A raw identifier together with its plausibility verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub tag: SourceTag,
    pub value: String,
    pub plausible: bool,
}

impl Candidate {
    pub fn new(tag: SourceTag, value: impl Into<String>) -> Self {
        let value = value.into();
        let plausible = verify_lenient(&value);
        Self {
            tag,
            value,
            plausible,
        }
    }

    /// Filter of this candidate alone; empty when implausible
    pub fn filter(&self) -> BloomValue {
        if self.plausible {
            BloomValue::encode_str(&self.value)
        } else {
            BloomValue::EMPTY
        }
    }
}

/// Candidates of one category; a failing source yields none
pub fn collect_candidates<S: CandidateSource + ?Sized>(source: &S, tag: SourceTag) -> Vec<Candidate> {
    match source.list_candidates(tag) {
        Ok(values) => values
            .into_iter()
            .map(|value| Candidate::new(tag, value))
            .collect(),
        Err(e) => {
            trace!(source = %tag, error = %e, "Source unavailable");
            Vec::new()
        }
    }
}

/// Build a composite fingerprint from everything currently visible
///
/// The result is [`BloomValue::EMPTY`] when no plausible identifier exists.
pub fn generate<S: CandidateSource + ?Sized>(source: &S) -> BloomValue {
    let mut composite = BloomValue::EMPTY;
    let mut contributed = 0usize;

    for tag in SourceTag::ALL {
        let mut taken = 0usize;
        for candidate in collect_candidates(source, tag) {
            if !tag.is_enumerable() && taken == 1 {
                trace!(source = %tag, "Ignoring extra singleton candidate");
                break;
            }

            if tag.is_enumerable() && composite.weight() >= MAX_BITS_GEN {
                trace!(source = %tag, "Generation weight cap reached");
                break;
            }

            if !candidate.plausible {
                trace!(source = %tag, "Discarding implausible candidate");
                continue;
            }

            composite |= candidate.filter();
            contributed += 1;
            taken += 1;
        }
    }

    debug!(
        contributed,
        weight = composite.weight(),
        "Generated composite fingerprint"
    );
    composite
}

// ============================================================================
// Tests
// ============================================================================
