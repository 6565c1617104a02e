//! GNU C/C++ compiler diagnostics.
//!
//! Recognized shapes:
//!
//! ```text
//! file:line: severity: text
//! file:line:col: severity: text
//! file:line: text                      (no severity word: error)
//! file(line): severity: text           (legacy)
//! file:line:col:   instantiated from here
//! ```
//!
//! Severity words: `error` / `fatal error` are errors, `warning` is a warning,
//! `note` / `info` / `remark` and any other single word are informational.
//!
//! A diagnostic whose text is nothing but an opening quote is the first half of
//! an old two-line message (`` x.h:3: warning: ` `` followed by
//! `` T' is implicitly a typename ``). It is reported as pending, and the
//! following non-diagnostic line is appended to it.

use super::helpers::{first_quoted, has_open_quote, is_makefile, parse_line_number};
use crate::engine::{LineContext, LineTraits};
use crate::{Marker, Severity};

/// Lines gcc prints after the first "undeclared" error of a function.
pub(crate) const UNDECLARED_FOLLOWUPS: [&str; 2] = ["(Each undeclared identifier is reported only once", "for each function it appears in.)"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerRule;

impl CompilerRule {
    pub fn new() -> Self {
        CompilerRule
    }

    pub(crate) fn requires() -> LineTraits {
        LineTraits::HAS_COLON | LineTraits::HAS_DIGITS
    }

    /// The undeclared-identifier follow-ups are claimed even without a location.
    pub(crate) fn sufficient() -> LineTraits {
        LineTraits::GCC_FOLLOWUP
    }

    pub fn process_line(&mut self, line: &str, ctx: &mut LineContext<'_, '_>) -> bool {
        if UNDECLARED_FOLLOWUPS.iter().any(|s| line.contains(s)) {
            return true;
        }
        if line.starts_with("In file included from") || line.starts_with("from ") {
            return false;
        }

        let located = regex!(r"^(?P<file>.*?):(?P<line>\d+):(?:(?P<col>\d+):)?\s*(?P<rest>.*)$")
            .captures(line)
            .or_else(|| regex!(r"^(?P<file>[^\s(][^(]*?)\((?P<line>\d+)\)\s*:\s*(?P<rest>.*)$").captures(line));

        let Some(caps) = located else {
            return continue_message(line, ctx);
        };

        let file = &caps["file"];
        let rest = caps["rest"].trim();
        if file.is_empty() || file.contains("***") || rest.is_empty() || rest.starts_with("***") || is_makefile(file) {
            return false;
        }

        let Some((severity, description)) = classify(file, rest) else {
            return false;
        };

        let marker = Marker::new(severity, description)
            .at(file, parse_line_number(&caps["line"]))
            .with_variable(variable(description).map(str::to_string));

        if is_opening_quote(description) {
            ctx.report_pending(marker);
        } else {
            ctx.report(marker);
        }
        true
    }
}

/// Severity and description for the text after `file:line:`.
///
/// `None` leaves the line to the assembler rule: GAS capitalizes its severity
/// words and reports `{standard input}` or `.s` sources.
fn classify<'l>(file: &str, rest: &'l str) -> Option<(Severity, &'l str)> {
    if rest.contains("instantiated from here") || rest.contains("required from here") {
        return Some((Severity::Info, rest));
    }

    let Some(caps) = regex!(r"^(?P<word>[Ff]atal error|[A-Za-z]+)\s*:\s*(?P<text>.*)$").captures(rest) else {
        return Some((Severity::ErrorResource, rest));
    };
    let word = caps.name("word").map_or("", |m| m.as_str());
    let text = caps.name("text").map_or("", |m| m.as_str());

    if matches!(word, "Error" | "Warning" | "Fatal error") && is_assembler_source(file) {
        return None;
    }

    let severity = match word.to_ascii_lowercase().as_str() {
        "error" | "fatal error" => Severity::ErrorResource,
        "warning" => Severity::Warning,
        _ => Severity::Info,
    };
    Some((severity, text))
}

fn is_assembler_source(file: &str) -> bool {
    file == "{standard input}" || [".s", ".S", ".sx", ".asm"].iter().any(|ext| file.ends_with(ext))
}

/// Identifier named by the common "undeclared"-family messages.
fn variable(description: &str) -> Option<&str> {
    let known = regex!(
        r"(?:^[`'‘].*?['’] (?:undeclared|defined but not used))|(?:conflicting types for )|(?:parse error before )"
    );
    let found = known.find(description)?;
    first_quoted(&description[found.start()..])
}

fn is_opening_quote(description: &str) -> bool {
    matches!(description, "`" | "‘")
}

fn continue_message(line: &str, ctx: &mut LineContext<'_, '_>) -> bool {
    match ctx.pending_description() {
        Some(pending) if has_open_quote(pending) => ctx.continue_pending(line.trim()),
        _ => false,
    }
}
