//! GNU assembler (`as`) diagnostics.
//!
//! ```text
//! boot.s: Assembler messages:
//! boot.s:12: Error: bad register name `%rax'
//! {standard input}:7: Warning: ignoring changed section attributes
//! boot.s: Warning: end of file not at end of a line
//! ```
//!
//! GAS announces the file once with `Assembler messages:`. Messages from code
//! piped in by the compiler say `{standard input}`; they are attributed to the
//! announced file.

use super::helpers::parse_line_number;
use crate::engine::{LineContext, LineTraits};
use crate::{Marker, Severity};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblerRule {
    /// File named by the last `Assembler messages:` line.
    context: Option<String>,
}

impl AssemblerRule {
    pub fn new() -> Self {
        AssemblerRule::default()
    }

    pub(crate) fn requires() -> LineTraits {
        LineTraits::HAS_COLON
    }

    pub fn process_line(&mut self, line: &str, ctx: &mut LineContext<'_, '_>) -> bool {
        if let Some(caps) = regex!(r"^(?P<file>.+?): Assembler messages:$").captures(line) {
            self.context = Some(caps["file"].to_string());
            return true;
        }

        let caps = regex!(r"^(?P<file>.+?):(?P<line>\d+): (?P<sev>Error|Warning|Fatal error|Info): (?P<text>.*)$")
            .captures(line)
            .or_else(|| regex!(r"^(?P<file>.+?): (?P<sev>Error|Warning|Fatal error): (?P<text>.*)$").captures(line));
        let Some(caps) = caps else {
            return false;
        };

        let severity = match &caps["sev"] {
            "Warning" => Severity::Warning,
            "Info" => Severity::Info,
            _ => Severity::ErrorResource,
        };
        let file = match &caps["file"] {
            "{standard input}" => self.context.clone(),
            file => Some(file.to_string()),
        };
        let line_number = caps.name("line").map_or(0, |m| parse_line_number(m.as_str()));

        let mut marker = Marker::new(severity, &caps["text"]).with_file(file);
        marker.line = line_number;
        ctx.report(marker);
        true
    }
}
