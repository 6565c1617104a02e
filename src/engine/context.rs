//! What a rule sees while it processes one line.

use super::emitter::Emitter;
use crate::Marker;
use std::path::Path;

/// Per-line handle passed to [`Rule::process_line`](crate::Rule::process_line).
///
/// Reports go through the session's emitter and are attributed to the rule
/// currently being offered the line.
pub struct LineContext<'s, 'a> {
    emitter: &'s mut Emitter<'a>,
    rule: usize,
    previous_line: Option<&'s str>,
}

impl<'s, 'a> LineContext<'s, 'a> {
    pub(crate) fn new(emitter: &'s mut Emitter<'a>, rule: usize, previous_line: Option<&'s str>) -> Self {
        LineContext { emitter, rule, previous_line }
    }

    /// Emit a finished record. Any pending record is emitted first.
    pub fn report(&mut self, marker: Marker) {
        self.emitter.report(self.rule, marker);
    }

    /// Emit a record that later lines may still extend with
    /// [`continue_pending`](Self::continue_pending).
    pub fn report_pending(&mut self, marker: Marker) {
        self.emitter.report_pending(self.rule, marker);
    }

    /// Append `text` (space separated, not trimmed) to this rule's pending record.
    ///
    /// Returns `false` when there is nothing to continue.
    pub fn continue_pending(&mut self, text: &str) -> bool {
        self.emitter.continue_pending(self.rule, text)
    }

    /// Description of this rule's pending record, if it has one.
    pub fn pending_description(&self) -> Option<&str> {
        self.emitter.pending_description(self.rule)
    }

    /// The previous logical line (trimmed), whichever rule claimed it.
    pub fn previous_line(&self) -> Option<&str> {
        self.previous_line
    }

    pub fn push_directory(&mut self, dir: impl AsRef<Path>) {
        self.emitter.resolver.push_directory(dir.as_ref());
    }

    pub fn pop_directory(&mut self) {
        self.emitter.resolver.pop_directory();
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.emitter.resolver.working_directory()
    }
}
