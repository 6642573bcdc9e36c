//! Plausibility checks for identifier strings
//!
//! Hardware serials that are placeholders (`000000`, `ffffff`) or synthetic
//! (`0123456789abcdef...`) carry no per-device information. These checks
//! reject them before they can mark any filter bits.
//!
//! Two modes exist:
//!
//! - **Strict**: validates a public identifier (32 hex characters).
//! - **Lenient**: validates raw hardware identifiers of any length.

use serde::{Deserialize, Serialize};

use crate::constants::plausibility::{MAX_TRIVIAL_DIGITS, PUBLIC_ID_LEN};

/// Which verifier to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plausibility {
    Strict,
    Lenient,
}

impl Plausibility {
    pub fn verify(self, candidate: &str) -> bool {
        match self {
            Self::Strict => verify_strict(candidate),
            Self::Lenient => verify_lenient(candidate),
        }
    }
}

/// Summary of a hex string scan
#[derive(Debug, Clone, Copy, Default)]
struct HexScan {
    /// Bit `n` set when hex digit `n` occurs
    digits: u16,
    /// Cleared by the first jump of more than one between neighbours
    monotonic: bool,
    len: usize,
}

impl HexScan {
    fn distinct_digits(&self) -> u32 {
        self.digits.count_ones()
    }
}

/// Scan a string, returning `None` on the first non-hex character
fn scan_hex(candidate: &str) -> Option<HexScan> {
    let mut scan = HexScan {
        monotonic: true,
        ..HexScan::default()
    };
    let mut prev: Option<u32> = None;

    for byte in candidate.bytes() {
        let digit = (byte as char).to_digit(16)?;

        // Neighbouring digits one step apart on the 0..f wheel keep the
        // string monotonic, so 'f' -> '0' does not count as a jump.
        if let Some(prev) = prev {
            let step = (digit + 16 - prev) % 16;
            if !matches!(step, 0 | 1 | 15) {
                scan.monotonic = false;
            }
        }

        scan.digits |= 1 << digit;
        scan.len += 1;
        prev = Some(digit);
    }

    Some(scan)
}

/// Strict check for a 32-character public identifier
///
/// Rejects unless the string is exactly 32 hex characters, is not monotonic
/// across its entire length, and uses at least three distinct hex digits.
/// A single jump anywhere clears monotonicity for the whole string.
pub fn verify_strict(candidate: &str) -> bool {
    let Some(scan) = scan_hex(candidate) else {
        return false;
    };

    if scan.monotonic {
        return false;
    }

    if scan.len != PUBLIC_ID_LEN {
        return false;
    }

    scan.distinct_digits() > MAX_TRIVIAL_DIGITS
}

/// Lenient check for raw hardware identifiers of any length
///
/// Rejects empty strings, non-hex characters and strings using two or fewer
/// distinct hex digits.
pub fn verify_lenient(candidate: &str) -> bool {
    match scan_hex(candidate) {
        Some(scan) => scan.distinct_digits() > MAX_TRIVIAL_DIGITS,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_ID: &str = "9f86d081884c7d659a2feaa0c55ad015";

    #[test]
    fn test_strict_accepts_random_hex() {
        assert!(verify_strict(GOOD_ID));
        assert!(verify_strict(&GOOD_ID.to_uppercase()));
    }

    #[test]
    fn test_strict_rejects_wrong_length() {
        assert!(!verify_strict(&GOOD_ID[..31]));
        assert!(!verify_strict(&format!("{}a", GOOD_ID)));
        assert!(!verify_strict(""));
    }

    #[test]
    fn test_strict_rejects_non_hex() {
        let mut bad = GOOD_ID.to_string();
        bad.replace_range(5..6, "g");
        assert!(!verify_strict(&bad));
    }

    #[test]
    fn test_strict_rejects_fully_monotonic() {
        assert!(!verify_strict("0123456789abcdef0123456789abcdef"));
        assert!(!verify_strict("01234567898765432101234567898765"));
        assert!(!verify_strict("abcdefedcbabcdefedcbabcdefedcbab"));
        assert!(!verify_strict("FEDCBA9876543210FEDCBA9876543210"));
    }

    #[test]
    fn test_strict_rejects_two_digit_strings() {
        assert!(!verify_strict("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        assert!(!verify_strict("a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0"));
    }

    #[test]
    fn test_single_jump_clears_monotonic_flag() {
        // A long flat run followed by one jump is enough.
        let mostly_flat = "111111111111111111111111111193ab";
        assert!(verify_strict(mostly_flat));
    }

    #[test]
    fn test_lenient_examples() {
        assert!(verify_lenient("aa11bb22cc33"));
        assert!(verify_lenient("AA11BB22CC33"));
        assert!(!verify_lenient("111111"));
        assert!(!verify_lenient("12xg"));
        assert!(!verify_lenient(""));
        assert!(!verify_lenient("1212"));
    }

    #[test]
    fn test_lenient_ignores_length_and_order() {
        assert!(verify_lenient("123"));
        assert!(verify_lenient("0123456789abcdef0123456789abcdef0123"));
    }

    #[test]
    fn test_mode_dispatch() {
        assert!(Plausibility::Strict.verify(GOOD_ID));
        assert!(!Plausibility::Strict.verify("aa11bb22cc33"));
        assert!(Plausibility::Lenient.verify("aa11bb22cc33"));
    }
}
