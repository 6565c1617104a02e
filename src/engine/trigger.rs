//! Trigger scanning (line pre-classification).
//!
//! Most lines of a build log are chatter that no rule will claim: compiler
//! command lines, progress messages, test output. Before the session offers a
//! line to its rules it computes a few cheap [`LineTraits`]. Every built-in
//! rule declares the traits it cannot match without, and the session skips a
//! rule outright when the line lacks them. A rule may also name traits that
//! admit a line on their own, for fixed texts it claims anywhere.
//!
//! ## Design notes
//!
//! - This is a *necessary-condition* scan. False positives are fine, because the
//!   rule still has to recognize the full grammar. False negatives are not: a
//!   trait must never be missing from a line that the declaring rule would
//!   claim.
//! - The scan runs on the untrimmed line, so a trait seen in any view of the
//!   line is seen in all of them.

use super::compiled_rules::LineTraits;
use crate::rules::UNDECLARED_FOLLOWUPS;

/// Coarse traits detected on one physical line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TriggerInfo {
    pub traits: LineTraits,
}

impl TriggerInfo {
    /// Scan `line` for coarse traits.
    pub fn scan(line: &str) -> Self {
        let mut traits = LineTraits::empty();
        let bytes = line.as_bytes();

        if memchr::memchr(b':', bytes).is_some() {
            traits |= LineTraits::HAS_COLON;
        }

        if bytes.iter().any(u8::is_ascii_digit) {
            traits |= LineTraits::HAS_DIGITS;
        }

        // make tool markers ("make:", "gmake[2]:") and makefile names, or the
        // "***" that only make prints.
        if line.contains("***") || contains_ascii_ci(bytes, b"make") || line.contains(".mk:") {
            traits |= LineTraits::MAKEISH;
        }

        if UNDECLARED_FOLLOWUPS.iter().any(|text| line.contains(text)) {
            traits |= LineTraits::GCC_FOLLOWUP;
        }

        TriggerInfo { traits }
    }
}

fn contains_ascii_ci(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_line_has_colon_and_digits() {
        let info = TriggerInfo::scan("main.c:6: error: `wrong' undeclared");
        assert!(info.traits.contains(LineTraits::HAS_COLON | LineTraits::HAS_DIGITS));
        assert!(!info.traits.contains(LineTraits::MAKEISH));
    }

    #[test]
    fn make_markers_are_detected() {
        assert!(TriggerInfo::scan("make: *** [Hello.o] Error 1").traits.contains(LineTraits::MAKEISH));
        assert!(TriggerInfo::scan("GNUmakefile:12: warning: x").traits.contains(LineTraits::MAKEISH));
        assert!(TriggerInfo::scan("rules.mk:3: *** missing separator.  Stop.").traits.contains(LineTraits::MAKEISH));
    }

    #[test]
    fn bare_undeclared_followups_are_marked() {
        let info = TriggerInfo::scan("  (Each undeclared identifier is reported only once");
        assert_eq!(info.traits, LineTraits::GCC_FOLLOWUP);
        assert!(TriggerInfo::scan("for each function it appears in.)").traits.contains(LineTraits::GCC_FOLLOWUP));
        assert!(!TriggerInfo::scan("x.c:3: error: each function").traits.contains(LineTraits::GCC_FOLLOWUP));
    }

    #[test]
    fn plain_chatter_has_no_traits() {
        assert!(TriggerInfo::scan("Building target all").traits.is_empty());
    }
}
