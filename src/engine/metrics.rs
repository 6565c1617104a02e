//! Session metrics.
//!
//! Counters collected while a [`Session`](super::Session) runs, returned by
//! `Session::close`. They are cheap enough to collect unconditionally: a few
//! integer increments per line and one `Instant` per session.
//!
//! ## Design notes
//!
//! - `offered` counts lines a rule actually saw, after the trait prefilter, so
//!   `lines - offered` is the work the prefilter saved for that rule.
//! - Severity counts are taken when a record is finalized, so a pending
//!   continuation is counted once, after its last merge.

use crate::Severity;
use std::time::Duration;

/// Per-rule counters, in active-rule order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RuleMetrics {
    pub id: String,
    /// Lines offered to the rule after prefiltering.
    pub offered: usize,
    /// Lines the rule claimed.
    pub claimed: usize,
    /// Diagnostics the rule produced.
    pub reported: usize,
}

/// Counters for one classification session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionMetrics {
    /// Wall time from session construction to `close`.
    pub total: Duration,
    /// Logical lines seen.
    pub lines: usize,
    /// Lines claimed by some rule.
    pub claimed: usize,
    pub build_errors: usize,
    pub resource_errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub rules: Vec<RuleMetrics>,
}

impl SessionMetrics {
    pub(crate) fn record(&mut self, severity: Severity) {
        match severity {
            Severity::ErrorBuild => self.build_errors += 1,
            Severity::ErrorResource => self.resource_errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.infos += 1,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::ErrorBuild => self.build_errors,
            Severity::ErrorResource => self.resource_errors,
            Severity::Warning => self.warnings,
            Severity::Info => self.infos,
        }
    }

    /// Errors of either kind.
    pub fn errors(&self) -> usize {
        self.build_errors + self.resource_errors
    }

    pub fn diagnostics(&self) -> usize {
        self.errors() + self.warnings + self.infos
    }

    pub fn rule(&self, id: &str) -> Option<&RuleMetrics> {
        self.rules.iter().find(|r| r.id == id)
    }
}
