//! GNU linker (`ld`) diagnostics.
//!
//! The linker reports a function context first and the references after it:
//!
//! ```text
//! main.o: In function `main':                        context (nothing reported)
//! main.c:(.text+0x14): undefined reference to `foo'  error, file main.c
//! main.o(.text+0x20): undefined reference to `bar'   error, file main.o
//! undefined reference to `baz'                       error, file from context
//! ```
//!
//! A reference line names its own file when it can; the context only fills in
//! a missing file. Context lines are never diagnostics of their own. The
//! context lasts while the lines keep coming from the same link step: any
//! other line in between (a compiler diagnostic, a command echo) drops it.
//!
//! Newer binutils prefix everything with the linker's path
//! (`/usr/bin/ld: main.o: in function ...`). After such a prefix the remainder
//! is read like any other linker line; a remainder that is neither a context
//! nor a reference is a linker error (or warning) for the whole project.

use super::helpers::{first_quoted, is_windows_path, last_file_segment, parse_line_number};
use crate::engine::{LineContext, LineTraits, base_name};
use crate::{Marker, Severity};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerRule {
    /// File token from the last `In function` line.
    context: Option<String>,
}

impl LinkerRule {
    pub fn new() -> Self {
        LinkerRule::default()
    }

    pub(crate) fn requires() -> LineTraits {
        LineTraits::empty()
    }

    pub fn process_line(&mut self, line: &str, ctx: &mut LineContext<'_, '_>) -> bool {
        if !ctx.previous_line().is_some_and(is_link_step_line) {
            self.context = None;
        }

        if let Some((_, rest)) = split_linker_prefix(line) {
            if self.context_or_reference(rest, ctx) {
                return true;
            }
            let marker = match strip_prefix_ci(rest, "warning:") {
                Some(text) => Marker::new(Severity::Warning, text.trim_start()),
                None => Marker::new(Severity::ErrorResource, rest),
            };
            ctx.report(marker);
            return true;
        }

        if self.context_or_reference(line, ctx) {
            return true;
        }

        // `file:line: warning:` right after a context line belongs to the linker
        // (e.g. glibc's link-time warnings about dangerous functions).
        let after_context = ctx.previous_line().is_some_and(|prev| {
            let prev = split_linker_prefix(prev).map_or(prev, |(_, rest)| rest);
            context_location(prev).is_some()
        });
        if after_context {
            let warning = regex!(r"^(?P<file>.+?):(?P<line>\d+):\s*warning:\s*(?P<text>.*)$");
            if let Some(caps) = warning.captures(line) {
                let marker =
                    Marker::new(Severity::Warning, &caps["text"]).at(&caps["file"], parse_line_number(&caps["line"]));
                ctx.report(marker);
                return true;
            }
        }

        false
    }

    fn context_or_reference(&mut self, line: &str, ctx: &mut LineContext<'_, '_>) -> bool {
        if let Some(location) = context_location(line) {
            self.context = Some(file_token(location).to_string());
            return true;
        }

        let Some(reference) = Reference::parse(line) else {
            return false;
        };
        let Some(severity) = reference_severity(reference.text) else {
            return false;
        };

        let file = reference.file.map(str::to_string).or_else(|| self.context.clone());
        let marker = Marker::new(severity, reference.text)
            .with_file(file)
            .with_variable(first_quoted(reference.text).map(str::to_string));
        ctx.report(Marker { line: reference.line, ..marker });
        true
    }
}

/// Location part of an `In function` context line.
fn context_location(line: &str) -> Option<&str> {
    let caps = regex!(r"(?i)^(?P<loc>.+?):\s*in (?:static )?(?:member )?function\b.*:$").captures(line)?;
    caps.name("loc").map(|m| m.as_str())
}

/// Context or reference line, with or without a linker prefix.
fn is_link_step_line(line: &str) -> bool {
    let line = split_linker_prefix(line).map_or(line, |(_, rest)| rest);
    context_location(line).is_some()
        || Reference::parse(line).and_then(|r| reference_severity(r.text)).is_some()
}

/// A reference line split into its location and message.
#[derive(Debug, PartialEq, Eq)]
struct Reference<'l> {
    file: Option<&'l str>,
    line: u32,
    text: &'l str,
}

impl<'l> Reference<'l> {
    fn parse(line: &'l str) -> Option<Self> {
        // file:(section+off): text, also archive(member):(section): text
        if let Some(caps) = regex!(r"^(?P<loc>.+?):\((?P<sect>[^)]*)\):\s*(?P<text>.*)$").captures(line) {
            let loc = caps.name("loc")?.as_str();
            return Some(Reference { file: Some(file_token(loc)), line: 0, text: caps.name("text")?.as_str() });
        }
        // file:line: text
        if let Some(caps) = regex!(r"^(?P<file>.+?):(?P<line>\d+):\s*(?P<text>.*)$").captures(line) {
            let file = last_file_segment(caps.name("file")?.as_str());
            let number = parse_line_number(caps.name("line")?.as_str());
            return Some(Reference { file: Some(file), line: number, text: caps.name("text")?.as_str() });
        }
        // obj(section+off): text
        if let Some(caps) = regex!(r"^(?P<loc>[^\s:()]+\([^)]*\)):\s*(?P<text>.*)$").captures(line) {
            let loc = caps.name("loc")?.as_str();
            return Some(Reference { file: Some(file_token(loc)), line: 0, text: caps.name("text")?.as_str() });
        }
        // (section+off): text
        if let Some(caps) = regex!(r"^\([^)]*\):\s*(?P<text>.*)$").captures(line) {
            return Some(Reference { file: None, line: 0, text: caps.name("text")?.as_str() });
        }
        Some(Reference { file: None, line: 0, text: line })
    }
}

fn reference_severity(text: &str) -> Option<Severity> {
    if text.starts_with("more undefined references to") {
        Some(Severity::Info)
    } else if text.contains("undefined reference to") || text.contains("multiple definition of") {
        Some(Severity::ErrorResource)
    } else if text.contains("first defined here") {
        Some(Severity::Info)
    } else {
        None
    }
}

/// File token of a location: `obj.o(.text+0x1b)` is `obj.o`, an archive member
/// `libx.a(obj.o)` is `obj.o`, `a.o:src.c` is `src.c`.
fn file_token(loc: &str) -> &str {
    let loc = regex!(r"^(?P<loc>.+?):\([^)]*\)$").captures(loc).and_then(|c| c.name("loc")).map_or(loc, |m| m.as_str());

    if let Some(caps) = regex!(r"^(?P<obj>[^()]+)\((?P<inner>[^)]*)\)$").captures(loc) {
        let obj = caps.name("obj").map_or(loc, |m| m.as_str());
        let inner = caps.name("inner").map_or("", |m| m.as_str());
        return if inner.starts_with('.') || inner.is_empty() { last_file_segment(obj) } else { inner };
    }
    last_file_segment(loc)
}

/// Split `<path>ld[.exe]: rest`.
///
/// The executable is whatever precedes the first `": "`; its last path segment
/// must be `ld` or end in `-ld` (cross linkers), optionally with `.exe`. Case
/// only matters for paths that do not look like Windows paths.
fn split_linker_prefix(line: &str) -> Option<(&str, &str)> {
    let split = line.find(": ")?;
    let (exe, rest) = (&line[..split], &line[split + 2..]);
    if exe.is_empty() || (exe.contains(' ') && !is_windows_path(exe)) {
        return None;
    }

    let name = base_name(exe);
    let name = if is_windows_path(exe) { name.to_ascii_lowercase() } else { name.to_string() };
    let stem = name.strip_suffix(".exe").unwrap_or(&name);
    (stem == "ld" || stem.ends_with("-ld")).then_some((exe, rest))
}

fn strip_prefix_ci<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_locations() {
        assert_eq!(context_location("main.o: In function `main':"), Some("main.o"));
        assert_eq!(context_location("mytest.o(.text+0x1b): In function `main':"), Some("mytest.o(.text+0x1b)"));
        assert_eq!(context_location("libx.a(obj.o): in function 'f':"), Some("libx.a(obj.o)"));
        assert_eq!(context_location("x.cpp: In member function `void A::f()':"), Some("x.cpp"));
        assert_eq!(context_location("main.c:12: undefined reference to `f'"), None);
    }

    #[test]
    fn link_step_lines() {
        assert!(is_link_step_line("main.o: In function `main':"));
        assert!(is_link_step_line("/usr/bin/ld: main.o: in function `main':"));
        assert!(is_link_step_line("main.c:(.text+0x14): undefined reference to `foo'"));
        assert!(is_link_step_line("init.c:(.text+0x0): first defined here"));
        assert!(!is_link_step_line("main.c:3: warning: unused variable 'x'"));
        assert!(!is_link_step_line("gcc -o app main.o util.o"));
    }

    #[test]
    fn file_tokens() {
        assert_eq!(file_token("main.o"), "main.o");
        assert_eq!(file_token("mytest.o(.text+0x1b)"), "mytest.o");
        assert_eq!(file_token("libx.a(obj.o)"), "obj.o");
        assert_eq!(file_token("main.o:main.c:(.text+0x5)"), "main.c");
        assert_eq!(file_token("C:\\w\\main.o"), "C:\\w\\main.o");
    }

    #[test]
    fn reference_shapes() {
        let r = Reference::parse("main.c:(.text+0x14): undefined reference to `foo()'").unwrap();
        assert_eq!(r.file, Some("main.c"));
        let r = Reference::parse("a.o:src.c:(.text+0x14): undefined reference to `foo()'").unwrap();
        assert_eq!(r.file, Some("src.c"));
        let r = Reference::parse("main.o(.text+0x14): undefined reference to `foo()'").unwrap();
        assert_eq!(r.file, Some("main.o"));
        let r = Reference::parse("main.c:12: undefined reference to `foo()'").unwrap();
        assert_eq!((r.file, r.line), (Some("main.c"), 12));
        let r = Reference::parse("(.text+0x14): undefined reference to `foo()'").unwrap();
        assert_eq!(r.file, None);
        let r = Reference::parse("undefined reference to `foo()'").unwrap();
        assert_eq!((r.file, r.text), (None, "undefined reference to `foo()'"));
    }

    #[test]
    fn linker_prefixes() {
        assert!(split_linker_prefix("/usr/bin/ld: cannot find -lfoo").is_some());
        assert!(split_linker_prefix("ld: warning: x").is_some());
        assert!(split_linker_prefix("/opt/x/bin/arm-none-eabi-ld: warning: x").is_some());
        assert!(split_linker_prefix("C:\\MinGW\\bin\\ld.exe: cannot find -lfoo").is_some());
        assert!(split_linker_prefix("C:\\MinGW\\bin\\LD.EXE: cannot find -lfoo").is_some());
        assert!(split_linker_prefix("c:/mingw/bin/../lib/gcc/mingw32/ld.exe: cannot find -lfoo").is_some());
        assert!(split_linker_prefix("/usr/bin/LD: cannot find -lfoo").is_none());
        assert!(split_linker_prefix("notld: warning: x").is_none());
        assert!(split_linker_prefix("collect2: ld returned 1 exit status").is_none());
        assert!(split_linker_prefix("/usr/bin/ld.gold.old: x").is_none());
    }
}
