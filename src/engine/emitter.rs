//! Marker emission.
//!
//! Rules hand unresolved [`Marker`]s to the emitter through their
//! [`LineContext`](super::LineContext). The emitter owns the one piece of
//! cross-line state a session has: the *pending* record.
//!
//! ```text
//!            report_pending            continue_pending (same rule)
//!   Idle ───────────────────▶ Pending ◀────────────────────────────┐
//!    ▲                          │  └────────────────────────────────┘
//!    │   report / line not      │
//!    └──── continued / close ◀──┘   (finalize: resolve, count, sink)
//! ```
//!
//! Finalizing a record resolves its file token, counts it, and calls the sink.
//! Records reach the sink in emission order; a pending record is emitted
//! before any record reported after it.

use super::metrics::SessionMetrics;
use super::resolve::Resolver;
use crate::{Diagnostic, Marker};
use tracing::trace;

pub(crate) type Sink<'a> = Box<dyn FnMut(Diagnostic) + 'a>;

#[derive(Debug)]
struct Pending {
    rule: usize,
    marker: Marker,
    /// Set when the record was created or extended on the current line.
    touched: bool,
}

pub(crate) struct Emitter<'a> {
    pub resolver: Resolver<'a>,
    pub metrics: SessionMetrics,
    sink: Option<Sink<'a>>,
    pending: Option<Pending>,
}

impl<'a> Emitter<'a> {
    pub fn new(resolver: Resolver<'a>, sink: Option<Sink<'a>>, metrics: SessionMetrics) -> Self {
        Emitter { resolver, metrics, sink, pending: None }
    }

    pub fn report(&mut self, rule: usize, marker: Marker) {
        self.flush_pending();
        self.finalize(rule, marker);
    }

    pub fn report_pending(&mut self, rule: usize, marker: Marker) {
        self.flush_pending();
        self.pending = Some(Pending { rule, marker, touched: true });
    }

    /// Append `text` as given to the pending record if `rule` owns it.
    pub fn continue_pending(&mut self, rule: usize, text: &str) -> bool {
        match &mut self.pending {
            Some(p) if p.rule == rule => {
                if !text.is_empty() {
                    if !p.marker.description.is_empty() {
                        p.marker.description.push(' ');
                    }
                    p.marker.description.push_str(text);
                }
                p.touched = true;
                true
            }
            _ => false,
        }
    }

    pub fn pending_description(&self, rule: usize) -> Option<&str> {
        self.pending.as_ref().filter(|p| p.rule == rule).map(|p| p.marker.description.as_str())
    }

    pub fn pending_owner(&self) -> Option<usize> {
        self.pending.as_ref().map(|p| p.rule)
    }

    /// Close out the current line: a pending record nobody continued is final.
    pub fn end_line(&mut self) {
        let Some(p) = self.pending.as_mut() else { return };
        if p.touched {
            p.touched = false;
        } else {
            self.flush_pending();
        }
    }

    pub fn finish(&mut self) {
        self.flush_pending();
    }

    fn flush_pending(&mut self) {
        if let Some(p) = self.pending.take() {
            self.finalize(p.rule, p.marker);
        }
    }

    fn finalize(&mut self, rule: usize, marker: Marker) {
        let file = self.resolver.resolve(marker.file.as_deref());
        self.metrics.record(marker.severity);

        let rule_id = match self.metrics.rules.get_mut(rule) {
            Some(m) => {
                m.reported += 1;
                m.id.clone()
            }
            None => String::new(),
        };
        trace!(rule = %rule_id, severity = %marker.severity, %file, line = marker.line, "diagnostic");

        let diagnostic = Diagnostic {
            severity: marker.severity,
            file_token: marker.file,
            file,
            line: marker.line,
            description: marker.description,
            variable: marker.variable,
            rule: rule_id,
        };
        if let Some(sink) = self.sink.as_mut() {
            sink(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::metrics::RuleMetrics;
    use crate::engine::resolve::PathStrategy;
    use crate::{FileIdentity, Severity};
    use pretty_assertions::assert_eq;

    fn emitter<'a>(out: &'a mut Vec<Diagnostic>) -> Emitter<'a> {
        let resolver = Resolver::new(Some("demo".into()), None, PathStrategy::BaseName, false, None);
        let metrics = SessionMetrics {
            rules: vec![RuleMetrics { id: "a".into(), ..Default::default() }, RuleMetrics { id: "b".into(), ..Default::default() }],
            ..Default::default()
        };
        Emitter::new(resolver, Some(Box::new(move |d| out.push(d))), metrics)
    }

    #[test]
    fn pending_record_is_flushed_before_next_report() {
        let mut out = Vec::new();
        let mut e = emitter(&mut out);
        e.report_pending(0, Marker::new(Severity::Warning, "`").at("x.h", 3));
        assert!(e.continue_pending(0, "T' is implicitly a typename"));
        e.end_line();
        e.report(1, Marker::new(Severity::ErrorResource, "boom"));
        e.finish();
        let metrics = e.metrics.clone();
        drop(e);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "` T' is implicitly a typename");
        assert_eq!(out[0].rule, "a");
        assert_eq!(out[1].file, FileIdentity::Project("demo".into()));
        assert_eq!(metrics.warnings, 1);
        assert_eq!(metrics.rules[1].reported, 1);
    }

    #[test]
    fn untouched_pending_record_is_final_after_the_line() {
        let mut out = Vec::new();
        let mut e = emitter(&mut out);
        e.report_pending(0, Marker::new(Severity::Warning, "`"));
        e.end_line();
        assert_eq!(e.pending_owner(), Some(0));
        e.end_line();
        assert_eq!(e.pending_owner(), None);
        drop(e);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn continuation_text_keeps_its_whitespace() {
        let mut out = Vec::new();
        let mut e = emitter(&mut out);
        e.report_pending(0, Marker::new(Severity::Info, "table:"));
        assert!(e.continue_pending(0, "  a | b  "));
        e.finish();
        drop(e);
        assert_eq!(out[0].description, "table:   a | b  ");
    }

    #[test]
    fn other_rules_cannot_continue_a_record() {
        let mut out = Vec::new();
        let mut e = emitter(&mut out);
        e.report_pending(0, Marker::new(Severity::Info, "note"));
        assert!(!e.continue_pending(1, "more"));
        assert_eq!(e.pending_description(1), None);
        assert_eq!(e.pending_description(0), Some("note"));
    }
}
