//! Consistency checking of stored fingerprints
//!
//! A stored composite filter is re-checked against live hardware by
//! recomputing every candidate's individual filter and counting how many are
//! contained in the stored one. Each still-present device corroborates on its
//! own, so losing one interface or card does not invalidate the identifier.
//!
//! # Acceptance
//!
//! A fingerprint `F` is accepted iff
//!
//! - `weight(F) <= 36` (heavier values are corrupt), and
//! - `matches >= max(1, weight(F) / 4)`.
//!
//! The bar grows with the information encoded in `F`: a heavy fingerprint
//! that only one device on this machine reproduces is rejected.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::aggregate::collect_candidates;
use crate::bloom::BloomValue;
use crate::constants::weight::{MATCH_DIVISOR, MAX_BITS_CHECK, MIN_MATCHES};
use crate::sources::{CandidateSource, SourceTag};

/// Outcome of checking one stored fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub weight: u32,
    pub matches: u32,
    pub required: u32,
    pub accepted: bool,
}

/// Count live candidates whose filter is contained in `fingerprint`
///
/// Enumerable categories contribute one match per contained candidate;
/// singleton categories are tested once.
pub fn check<S: CandidateSource + ?Sized>(fingerprint: BloomValue, source: &S) -> u32 {
    let mut matches = 0;

    for tag in SourceTag::ALL {
        let candidates = collect_candidates(source, tag);
        let limit = if tag.is_enumerable() { candidates.len() } else { 1 };

        for candidate in candidates.iter().filter(|c| c.plausible).take(limit) {
            let filter = candidate.filter();
            if filter.is_empty() {
                continue;
            }
            if fingerprint.contains(filter) {
                trace!(source = %tag, "Candidate corroborates fingerprint");
                matches += 1;
            }
        }
    }

    matches
}

/// Matches needed before a fingerprint of this weight is trusted
pub fn required_matches(fingerprint: BloomValue) -> u32 {
    (fingerprint.weight() / MATCH_DIVISOR).max(MIN_MATCHES)
}

/// Apply the acceptance rule to a match count
pub fn accepts(fingerprint: BloomValue, matches: u32) -> bool {
    fingerprint.weight() <= MAX_BITS_CHECK && matches >= required_matches(fingerprint)
}

/// Check a stored fingerprint against live hardware
///
/// Overweight fingerprints are rejected without consulting any source.
pub fn validate<S: CandidateSource + ?Sized>(fingerprint: BloomValue, source: &S) -> CheckReport {
    let weight = fingerprint.weight();
    let required = required_matches(fingerprint);

    if weight > MAX_BITS_CHECK {
        debug!(weight, "Stored fingerprint too heavy, treating as corrupt");
        return CheckReport {
            weight,
            matches: 0,
            required,
            accepted: false,
        };
    }

    let matches = check(fingerprint, source);
    let accepted = accepts(fingerprint, matches);

    debug!(weight, matches, required, accepted, "Checked stored fingerprint");
    CheckReport {
        weight,
        matches,
        required,
        accepted,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::generate;
    use crate::sources::{MockCandidateSource, StaticSource};

    const PLATFORM: &str = "4f1c8d2e9a7b40c3b5d6e7f809a1b2c3";
    const CPU: &str = "00000000a1b2c3d4";
    const CARD: &str = "1b534d30303030301064f5a2c600d3";
    const NIC: &str = "b827eb123456";

    fn four_category_machine() -> StaticSource {
        StaticSource::new()
            .with(SourceTag::PlatformId, [PLATFORM])
            .with(SourceTag::CpuSerial, [CPU])
            .with(SourceTag::BlockDevice, [CARD])
            .with(SourceTag::NetDevice, [NIC])
    }

    /// Set the lowest free bits until the value weighs at least `target`
    fn pad_to_weight(mut value: BloomValue, target: u32) -> BloomValue {
        let mut bit = 0;
        while value.weight() < target {
            value |= BloomValue::from_raw(1 << bit);
            bit += 1;
        }
        value
    }

    #[test]
    fn test_unchanged_hardware_corroborates_everything() {
        let machine = four_category_machine();
        let fingerprint = generate(&machine);
        assert_eq!(check(fingerprint, &machine), 4);

        // Weight 11 needs two matches.
        let small = StaticSource::new()
            .with(SourceTag::CpuSerial, [CPU])
            .with(SourceTag::NetDevice, [NIC]);
        let report = validate(generate(&small), &small);
        assert_eq!(report.weight, 11);
        assert_eq!(report.required, 2);
        assert_eq!(report.matches, 2);
        assert!(report.accepted);
    }

    #[test]
    fn test_enumerable_categories_count_each_device() {
        let machine = StaticSource::new().with(SourceTag::NetDevice, [NIC, "0a1b2c3d4e5f", "deadbeef0042"]);
        let fingerprint = generate(&machine);
        assert_eq!(check(fingerprint, &machine), 3);
    }

    #[test]
    fn test_singleton_categories_count_once() {
        let stored = StaticSource::new().with(SourceTag::CpuSerial, [CPU]);
        let fingerprint = generate(&stored);

        let live = StaticSource::new().with(SourceTag::CpuSerial, [CPU, CPU]);
        assert_eq!(check(fingerprint, &live), 1);
    }

    #[test]
    fn test_implausible_live_candidates_are_ignored() {
        // The empty filter is contained in everything; it must not count.
        let live = StaticSource::new().with(SourceTag::NetDevice, ["000000000000", "zz"]);
        assert_eq!(check(BloomValue::from_raw(u64::MAX >> 30), &live), 0);
    }

    #[test]
    fn test_partial_corroboration_rejected_at_weight_twenty() {
        let fingerprint = pad_to_weight(generate(&four_category_machine()), 20);
        assert!(fingerprint.weight() >= 20);

        let mut live = four_category_machine();
        live.remove(SourceTag::NetDevice);

        let matches = check(fingerprint, &live);
        assert_eq!(matches, 3);
        assert!(required_matches(fingerprint) >= 5);
        assert!(!accepts(fingerprint, matches));
        assert!(!validate(fingerprint, &live).accepted);
    }

    #[test]
    fn test_acceptance_formula() {
        let weight_20 = BloomValue::from_raw((1 << 20) - 1);
        assert_eq!(required_matches(weight_20), 5);
        assert!(!accepts(weight_20, 3));
        assert!(!accepts(weight_20, 4));
        assert!(accepts(weight_20, 5));

        let weight_3 = BloomValue::from_raw(0b111);
        assert_eq!(required_matches(weight_3), 1);
        assert!(accepts(weight_3, 1));
        assert!(!accepts(weight_3, 0));

        assert_eq!(required_matches(BloomValue::EMPTY), 1);
        assert!(!accepts(BloomValue::EMPTY, 0));
    }

    #[test]
    fn test_weight_limit() {
        let weight_36 = BloomValue::from_raw((1 << 36) - 1);
        assert!(accepts(weight_36, 9));

        let weight_37 = BloomValue::from_raw((1 << 37) - 1);
        assert!(!accepts(weight_37, 64));
    }

    #[test]
    fn test_overweight_skips_sources() {
        let mut source = MockCandidateSource::new();
        source.expect_list_candidates().never();

        let report = validate(BloomValue::from_raw(u64::MAX), &source);
        assert!(!report.accepted);
        assert_eq!(report.weight, 64);
        assert_eq!(report.matches, 0);
    }

    #[test]
    fn test_failing_sources_count_nothing() {
        let machine = four_category_machine();
        let fingerprint = generate(&machine);

        let live = machine
            .failing(SourceTag::CpuSerial)
            .failing(SourceTag::NetDevice);
        assert_eq!(check(fingerprint, &live), 2);
    }
}
