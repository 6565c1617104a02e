//! Classification session.
//!
//! A [`Session`] is the push-driven orchestrator: the caller writes raw bytes
//! (it implements [`io::Write`]) and closes it once. Internally:
//!
//! ```text
//! write(bytes) ── LineAccumulator ── line ──┬─ TriggerInfo::scan ─ traits
//!                                           ├─ LineViews (trim / cap)
//!                                           v
//!                  pending owner, then rules in order (skip if not admitted)
//!                              first rule returning `true` claims the line
//!                                           │
//!                            Emitter::end_line (finalize stale pending)
//! ```
//!
//! The session is single-threaded and performs no I/O of its own except on the
//! optional echo writer.

use super::accumulator::LineAccumulator;
use super::compiled_rules::CompiledRules;
use super::context::LineContext;
use super::emitter::{Emitter, Sink};
use super::metrics::{RuleMetrics, SessionMetrics};
use super::resolve::{FileIndex, PathStrategy, Resolver};
use super::trigger::TriggerInfo;
use crate::{Diagnostic, LineBehavior, ParserRegistry, Rule};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, trace};

/// Default cap, in characters, applied to lines offered to rules that do not
/// keep long lines.
pub const DEFAULT_MAX_LINE_LEN: usize = 1000;

/// Configures and creates a [`Session`].
pub struct SessionBuilder<'a> {
    registry: &'a ParserRegistry,
    rule_ids: Option<Vec<String>>,
    rule_set: Option<Vec<Rule>>,
    project: Option<String>,
    working_directory: Option<PathBuf>,
    file_index: Option<Box<dyn FileIndex + 'a>>,
    path_strategy: PathStrategy,
    case_insensitive: bool,
    max_line_len: usize,
    sink: Option<Sink<'a>>,
    echo: Option<Box<dyn Write + 'a>>,
}

impl<'a> SessionBuilder<'a> {
    fn new(registry: &'a ParserRegistry) -> Self {
        SessionBuilder {
            registry,
            rule_ids: None,
            rule_set: None,
            project: None,
            working_directory: None,
            file_index: None,
            path_strategy: PathStrategy::default(),
            case_insensitive: cfg!(windows),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            sink: None,
            echo: None,
        }
    }

    /// Active rule ids, in priority order. Unknown ids are ignored.
    /// Defaults to the registry's default ids.
    pub fn rules<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Use these rules instead of selecting by id from the registry.
    pub fn rule_set(mut self, rules: Vec<Rule>) -> Self {
        self.rule_set = Some(rules);
        self
    }

    /// Project that records without a file are attributed to.
    pub fn project(mut self, name: impl Into<String>) -> Self {
        self.project = Some(name.into());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn file_index(mut self, index: impl FileIndex + 'a) -> Self {
        self.file_index = Some(Box::new(index));
        self
    }

    pub fn path_strategy(mut self, strategy: PathStrategy) -> Self {
        self.path_strategy = strategy;
        self
    }

    /// Fold file-cache keys to lowercase. Defaults to `true` on Windows.
    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.case_insensitive = yes;
        self
    }

    pub fn max_line_len(mut self, chars: usize) -> Self {
        self.max_line_len = chars;
        self
    }

    /// Receiver of finalized diagnostics, in emission order.
    pub fn sink(mut self, sink: impl FnMut(Diagnostic) + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Writer that receives every logical line, newline terminated.
    pub fn echo(mut self, writer: impl Write + 'a) -> Self {
        self.echo = Some(Box::new(writer));
        self
    }

    pub fn build(self) -> Session<'a> {
        let rules = match self.rule_set {
            Some(rules) => rules,
            None => {
                let ids = self.rule_ids.unwrap_or_else(|| self.registry.default_ids());
                self.registry.select(&ids)
            }
        };
        let compiled = CompiledRules::new(rules);
        debug!(rules = ?compiled.ids(), project = ?self.project, "session ready");

        let metrics = SessionMetrics {
            rules: compiled.ids().into_iter().map(|id| RuleMetrics { id, ..Default::default() }).collect(),
            ..Default::default()
        };
        let resolver = Resolver::new(
            self.project,
            self.file_index,
            self.path_strategy,
            self.case_insensitive,
            self.working_directory,
        );

        Session {
            accumulator: LineAccumulator::new(),
            classifier: Classifier {
                rules: compiled,
                emitter: Emitter::new(resolver, self.sink, metrics),
                echo: self.echo,
                previous: None,
                max_line_len: self.max_line_len,
                started: Instant::now(),
            },
        }
    }
}

/// A streaming classification pass over one build log.
///
/// ```
/// use buildmark::{ParserRegistry, Session};
/// use std::io::Write;
///
/// let registry = ParserRegistry::new();
/// let mut found = Vec::new();
/// let mut session = Session::builder(&registry).sink(|d| found.push(d)).build();
/// session.write_all(b"main.c:6: error: `wrong' undeclared (first use in this function)\n").unwrap();
/// let metrics = session.close().unwrap();
///
/// assert_eq!(metrics.errors(), 1);
/// assert_eq!(found[0].line, 6);
/// ```
pub struct Session<'a> {
    accumulator: LineAccumulator,
    classifier: Classifier<'a>,
}

struct Classifier<'a> {
    rules: CompiledRules,
    emitter: Emitter<'a>,
    echo: Option<Box<dyn Write + 'a>>,
    previous: Option<String>,
    max_line_len: usize,
    started: Instant,
}

impl<'a> Session<'a> {
    pub fn builder(registry: &'a ParserRegistry) -> SessionBuilder<'a> {
        SessionBuilder::new(registry)
    }

    /// Rule ids active in this session, in priority order.
    pub fn rule_ids(&self) -> Vec<String> {
        self.classifier.rules.ids()
    }

    /// Flush the trailing partial line, finalize any pending record, and
    /// return the session's counters.
    pub fn close(self) -> io::Result<SessionMetrics> {
        let Session { mut accumulator, mut classifier } = self;

        let flushed = accumulator.finish(|line| classifier.process(line));
        classifier.emitter.finish();
        flushed?;
        if let Some(echo) = classifier.echo.as_mut() {
            echo.flush()?;
        }

        let mut metrics = std::mem::take(&mut classifier.emitter.metrics);
        metrics.total = classifier.started.elapsed();
        debug!(lines = metrics.lines, claimed = metrics.claimed, diagnostics = metrics.diagnostics(), "session closed");
        Ok(metrics)
    }
}

impl Write for Session<'_> {
    /// Buffers `buf` and classifies every completed line.
    ///
    /// An echo-writer failure is returned after the bytes were accepted; lines
    /// already classified stay classified.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Session { accumulator, classifier } = self;
        accumulator.push(buf, |line| classifier.process(line))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.classifier.echo.as_mut() {
            Some(echo) => echo.flush(),
            None => Ok(()),
        }
    }
}

impl Classifier<'_> {
    fn process(&mut self, line: &str) -> io::Result<()> {
        self.classify(line);
        if let Some(echo) = self.echo.as_mut() {
            echo.write_all(line.as_bytes())?;
            echo.write_all(b"\n")?;
        }
        Ok(())
    }

    fn classify(&mut self, line: &str) {
        self.emitter.metrics.lines += 1;

        let traits = TriggerInfo::scan(line).traits;
        let views = LineViews::new(line, self.max_line_len);
        let owner = self.emitter.pending_owner();
        let previous = self.previous.as_deref();

        // Pending owner first, then everyone else in priority order.
        let order = owner.into_iter().chain((0..self.rules.len()).filter(move |&i| Some(i) != owner));
        for i in order {
            if owner != Some(i) && !self.rules.admits(i, traits) {
                continue;
            }
            let view = views.select(self.rules.behaviors[i]);
            self.emitter.metrics.rules[i].offered += 1;

            let mut ctx = LineContext::new(&mut self.emitter, i, previous);
            if self.rules.rules[i].process_line(view, &mut ctx) {
                trace!(rule = self.rules.rules[i].id(), line = view, "line claimed");
                self.emitter.metrics.rules[i].claimed += 1;
                self.emitter.metrics.claimed += 1;
                break;
            }
        }

        self.emitter.end_line();
        self.previous = Some(views.trimmed.to_string());
    }
}

/// The four presentations of one logical line.
struct LineViews<'l> {
    raw: &'l str,
    trimmed: &'l str,
    max: usize,
}

impl<'l> LineViews<'l> {
    fn new(raw: &'l str, max: usize) -> Self {
        LineViews { raw, trimmed: raw.trim(), max }
    }

    fn select(&self, behavior: LineBehavior) -> &'l str {
        let base = if behavior.keep_untrimmed { self.raw } else { self.trimmed };
        if behavior.keep_long_lines { base } else { cap(base, self.max) }
    }
}

/// First `max` characters of `s`.
fn cap(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileIdentity, PatternSeverity, RegexRule, Severity, SubPattern};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const BUILD_LOG: &str = "make all\n\
        gcc -c main.c\n\
        main.c: In function `main':\r\n\
        main.c:6: error: `wrong' undeclared (first use in this function)\n\
        main.c:6: error: (Each undeclared identifier is reported only once\n\
        main.c:6: error: for each function it appears in.)\n\
        main.c:9:5: warning: unused variable 'x' [-Wunused-variable]\n\
        x.h:3: warning: `\n\
        std::vector<T>::iterator' is implicitly a typename\n\
        main.o(.text+0x1b): undefined reference to `foo'\r\n\
        make: *** [main.o] Error 1\n\
        make: [clean] Error 2 (ignored)";

    fn run(registry: &ParserRegistry, chunks: &[&[u8]]) -> (Vec<Diagnostic>, SessionMetrics) {
        let mut out = Vec::new();
        let mut session = Session::builder(registry).project("demo").sink(|d| out.push(d)).build();
        for chunk in chunks {
            session.write_all(chunk).unwrap();
        }
        let metrics = session.close().unwrap();
        (out, metrics)
    }

    fn custom(rule: RegexRule) -> Rule {
        Rule::Regex(rule)
    }

    #[test]
    fn default_rules_classify_a_mixed_log() {
        let registry = ParserRegistry::new();
        let (out, metrics) = run(&registry, &[BUILD_LOG.as_bytes()]);

        let summary: Vec<(Severity, Option<String>, u32)> =
            out.iter().map(|d| (d.severity, d.file.file_name(), d.line)).collect();
        assert_eq!(
            summary,
            vec![
                (Severity::ErrorResource, Some("main.c".into()), 6),
                (Severity::Warning, Some("main.c".into()), 9),
                (Severity::Warning, Some("x.h".into()), 3),
                (Severity::ErrorResource, Some("main.o".into()), 0),
                (Severity::ErrorBuild, None, 0),
                (Severity::Info, None, 0),
            ]
        );
        assert_eq!(out[2].description, "` std::vector<T>::iterator' is implicitly a typename");
        assert_eq!(out[4].file, FileIdentity::Project("demo".into()));
        assert_eq!(metrics.lines, 12);
        assert_eq!(metrics.errors(), 3);
        assert_eq!(metrics.rule("gcc").map(|r| r.reported), Some(3));
    }

    #[test]
    fn unknown_rule_ids_are_ignored() {
        let registry = ParserRegistry::new();
        let session = Session::builder(&registry).rules(["nope", "gmake"]).build();
        assert_eq!(session.rule_ids(), vec!["gmake".to_string()]);
    }

    #[test]
    fn default_views_are_trimmed_and_capped() {
        let registry = ParserRegistry::new();
        let mut rule = RegexRule::new("t", "Test");
        rule.add_pattern(SubPattern::new("(.*)").unwrap().description("$1").severity(PatternSeverity::Info));

        let mut out = Vec::new();
        let mut session =
            Session::builder(&registry).rule_set(vec![custom(rule)]).max_line_len(4).sink(|d| out.push(d)).build();
        session.write_all(b"   abcdefg   \n").unwrap();
        session.close().unwrap();

        assert_eq!(out[0].description, "abcd");
    }

    #[test]
    fn untrimmed_rule_sees_leading_whitespace() {
        let registry = ParserRegistry::new();
        let mut rule = RegexRule::new("t", "Test").with_behavior(LineBehavior::UNTRIMMED);
        rule.add_pattern(SubPattern::new("(.*)").unwrap().description("$1").severity(PatternSeverity::Info));

        let mut out = Vec::new();
        let mut session = Session::builder(&registry).rule_set(vec![custom(rule)]).sink(|d| out.push(d)).build();
        session.write_all(b"  x  \n").unwrap();
        session.close().unwrap();

        assert_eq!(out[0].description, "  x  ");
    }

    #[test]
    fn echo_receives_every_line() {
        let registry = ParserRegistry::new();
        let mut echoed = Vec::new();
        let mut session = Session::builder(&registry).echo(&mut echoed).build();
        session.write_all(b"one\r\ntwo\rthree").unwrap();
        session.close().unwrap();
        assert_eq!(String::from_utf8(echoed).unwrap(), "one\ntwo\nthree\n");
    }

    #[test]
    fn echo_failure_surfaces_from_write() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "console closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let registry = ParserRegistry::new();
        let mut session = Session::builder(&registry).echo(Broken).build();
        let err = session.write(b"make: *** [all] Error 2\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn prefilter_skips_rules_without_required_traits() {
        let registry = ParserRegistry::new();
        let (_, metrics) = run(&registry, &[b"Building target all\n"]);
        assert_eq!(metrics.rule("gcc").map(|r| r.offered), Some(0));
        assert_eq!(metrics.rule("gld").map(|r| r.offered), Some(1));
    }

    #[test]
    fn cap_respects_char_boundaries() {
        assert_eq!(cap("‘ab’", 2), "‘a");
        assert_eq!(cap("ab", 5), "ab");
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_diagnostics(
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
        ) {
            let registry = ParserRegistry::new();
            let bytes = BUILD_LOG.as_bytes();
            let mut offsets: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
            offsets.sort_unstable();
            offsets.dedup();

            let mut chunks: Vec<&[u8]> = Vec::new();
            let mut prev = 0;
            for off in offsets {
                chunks.push(&bytes[prev..off]);
                prev = off;
            }
            chunks.push(&bytes[prev..]);

            let (whole, _) = run(&registry, &[bytes]);
            let (split, _) = run(&registry, &chunks);
            prop_assert_eq!(split, whole);
        }
    }
}
