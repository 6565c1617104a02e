//! GNU make diagnostics.
//!
//! Messages from make itself start with the tool name, optionally with a path,
//! a cross prefix, `.exe`, and the recursion level:
//!
//! ```text
//! make: *** [Hello.o] Error 1                 build error
//! make[2]: [clean] Error 2 (ignored)          info
//! make: *** [Makefile:12: all] Error 2        build error at Makefile:12 (make 4)
//! make: Circular a <- b dependency dropped.   warning
//! make: warning: jobserver unavailable        warning
//! make: *** No rule to make target 'x'.  Stop.
//! make[1]: Entering directory '/src/lib'      directory stack
//! ```
//!
//! Makefile parse errors name the makefile instead:
//!
//! ```text
//! Makefile:12: *** missing separator.  Stop.
//! GNUmakefile:3: warning: overriding recipe for target 'x'
//! ```
//!
//! Anything else, in particular compiler diagnostics echoed in the same stream,
//! is left to other rules.

use super::helpers::{is_makefile, parse_line_number};
use crate::engine::{LineContext, LineTraits};
use crate::{Marker, Severity};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakeRule;

impl MakeRule {
    pub fn new() -> Self {
        MakeRule
    }

    pub(crate) fn requires() -> LineTraits {
        LineTraits::HAS_COLON | LineTraits::MAKEISH
    }

    pub fn process_line(&mut self, line: &str, ctx: &mut LineContext<'_, '_>) -> bool {
        let tool = regex!(r"^(?:.*[/\\])?(?:[\w.]+-)?g?make(?:\.exe)?(?:\[\d+\])?:\s+(?P<msg>.*)$");
        if let Some(caps) = tool.captures(line) {
            let msg = caps.name("msg").map_or("", |m| m.as_str());
            return tool_message(msg, ctx);
        }

        let located = regex!(r"^(?P<file>.+?):(?P<line>\d+): (?:(?P<stop>\*\*\* )|(?P<warn>warning: ))(?P<text>.*)$");
        let Some(caps) = located.captures(line) else {
            return false;
        };
        let file = caps.name("file").map_or("", |m| m.as_str());
        let text = caps.name("text").map_or("", |m| m.as_str());
        let number = caps.name("line").map_or(0, |m| parse_line_number(m.as_str()));

        let severity = if caps.name("stop").is_some() {
            Severity::ErrorBuild
        } else if is_makefile(file) {
            Severity::Warning
        } else {
            return false;
        };
        ctx.report(Marker::new(severity, text).at(file, number));
        true
    }
}

fn tool_message(msg: &str, ctx: &mut LineContext<'_, '_>) -> bool {
    let recipe = regex!(r"^(?:\*\*\* )?\[(?P<target>[^\]]+)\] Error (?P<code>\d+)(?P<ignored> \(ignored\))?$");
    if let Some(caps) = recipe.captures(msg) {
        let severity = if caps.name("ignored").is_some() { Severity::Info } else { Severity::ErrorBuild };
        let target = caps.name("target").map_or("", |m| m.as_str());
        let description = msg.strip_prefix("*** ").unwrap_or(msg);

        // make 4 prints the recipe location inside the brackets
        let marker = match regex!(r"^(?P<file>.+?):(?P<line>\d+): (?P<target>.+)$").captures(target) {
            Some(loc) => Marker::new(severity, description)
                .at(&loc["file"], parse_line_number(&loc["line"]))
                .with_variable(Some(loc["target"].to_string())),
            None => Marker::new(severity, description).with_variable(Some(target.to_string())),
        };
        ctx.report(marker);
        return true;
    }

    if let Some(caps) = regex!(r"^(?P<dir>Entering|Leaving) directory [`'‘](?P<path>.*)['’]$").captures(msg) {
        match &caps["dir"] {
            "Entering" => ctx.push_directory(&caps["path"]),
            _ => ctx.pop_directory(),
        }
        return true;
    }

    if regex!(r"^Circular .+ dependency dropped\.?$").is_match(msg) {
        ctx.report(Marker::new(Severity::Warning, msg));
        return true;
    }

    if let Some(text) = msg.strip_prefix("*** ") {
        ctx.report(Marker::new(Severity::ErrorBuild, text));
        return true;
    }

    if let Some(text) = msg.strip_prefix("warning: ") {
        ctx.report(Marker::new(Severity::Warning, text));
        return true;
    }

    false
}
