extern crate self as buildmark;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[macro_use]
mod macros;
mod api;
pub mod config;
mod engine;
mod error;
pub mod registry;
mod rules;

pub use api::{ClassifyResult, Options, classify, classify_with};
pub use engine::{
    DEFAULT_MAX_LINE_LEN, FileIndex, LineContext, PathStrategy, RuleMetrics, Session, SessionBuilder, SessionMetrics,
};
pub use error::{Error, Result};
pub use registry::ParserRegistry;
pub use rules::{
    AssemblerRule, CompilerRule, GAS_RULE_ID, GCC_RULE_ID, GLD_RULE_ID, GMAKE_RULE_ID, LinkerRule, MakeRule, RegexRule,
    Rule, SubPattern,
};

// --- Severity ---------------------------------------------------------------

/// Severity of a finalized diagnostic.
///
/// The ordering is only meaningful for statistics (`Info` < `Warning` <
/// `ErrorResource` < `ErrorBuild`); records are delivered in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Info,
    Warning,
    /// An error attributed to a source resource (compiler, assembler, linker).
    ErrorResource,
    /// An error of the build itself (make failures, makefile syntax).
    ErrorBuild,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::ErrorResource | Severity::ErrorBuild)
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::ErrorResource => "error",
            Severity::ErrorBuild => "build error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity attached to a regex sub-pattern.
///
/// `Skip` recognizes a line and consumes it without reporting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternSeverity {
    Skip,
    Info,
    Warning,
    #[default]
    ErrorResource,
    ErrorBuild,
}

impl PatternSeverity {
    /// The severity to report, or `None` for the skip sentinel.
    pub fn severity(self) -> Option<Severity> {
        match self {
            PatternSeverity::Skip => None,
            PatternSeverity::Info => Some(Severity::Info),
            PatternSeverity::Warning => Some(Severity::Warning),
            PatternSeverity::ErrorResource => Some(Severity::ErrorResource),
            PatternSeverity::ErrorBuild => Some(Severity::ErrorBuild),
        }
    }
}

impl From<Severity> for PatternSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Info => PatternSeverity::Info,
            Severity::Warning => PatternSeverity::Warning,
            Severity::ErrorResource => PatternSeverity::ErrorResource,
            Severity::ErrorBuild => PatternSeverity::ErrorBuild,
        }
    }
}

// --- Line behavior ----------------------------------------------------------

/// How a rule wants candidate lines presented to it.
///
/// By default lines are trimmed and capped at the session's maximum line
/// length before a rule sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LineBehavior {
    /// Keep leading and trailing whitespace.
    #[serde(default)]
    pub keep_untrimmed: bool,
    /// Hand over the full line even when it exceeds the length cap.
    #[serde(default)]
    pub keep_long_lines: bool,
}

impl LineBehavior {
    pub const DEFAULT: LineBehavior = LineBehavior { keep_untrimmed: false, keep_long_lines: false };
    pub const UNTRIMMED: LineBehavior = LineBehavior { keep_untrimmed: true, keep_long_lines: false };
    pub const LONG_LINES: LineBehavior = LineBehavior { keep_untrimmed: false, keep_long_lines: true };
    pub const RAW: LineBehavior = LineBehavior { keep_untrimmed: true, keep_long_lines: true };
}

// --- Records ----------------------------------------------------------------

/// An unresolved record produced by a rule for one build-tool message.
///
/// `file` is the raw file token as written in the log; resolution into a
/// [`FileIdentity`] happens when the record is finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub severity: Severity,
    pub file: Option<String>,
    /// 1-based line number; 0 means "no specific line".
    pub line: u32,
    pub description: String,
    pub variable: Option<String>,
}

impl Marker {
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Marker { severity, file: None, line: 0, description: description.into(), variable: None }
    }

    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        let file = file.into();
        self.file = if file.is_empty() { None } else { Some(file) };
        self.line = line;
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file.filter(|f| !f.is_empty());
        self
    }

    pub fn with_variable(mut self, variable: Option<String>) -> Self {
        self.variable = variable.filter(|v| !v.is_empty());
        self
    }
}

/// Concrete resource a diagnostic is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileIdentity {
    /// No project context was supplied and the record names no file.
    Workspace,
    /// The record names no file; attributed to the session's project.
    Project(String),
    /// A file found through the session's [`FileIndex`].
    File(PathBuf),
    /// A file the index does not know about, kept as a location outside the project.
    External(PathBuf),
}

impl FileIdentity {
    /// Path of the file, if the identity denotes one.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            FileIdentity::File(path) | FileIdentity::External(path) => Some(path),
            FileIdentity::Workspace | FileIdentity::Project(_) => None,
        }
    }

    /// Last path component, used by reports and tests.
    pub fn file_name(&self) -> Option<String> {
        self.path().and_then(|p| p.file_name()).map(|n| n.to_string_lossy().into_owned())
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileIdentity::Workspace => f.write_str("<workspace>"),
            FileIdentity::Project(name) => write!(f, "<project {name}>"),
            FileIdentity::File(path) => write!(f, "{}", path.display()),
            FileIdentity::External(path) => write!(f, "{} (external)", path.display()),
        }
    }
}

/// A finalized diagnostic, as delivered to the session's sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Raw file token extracted from the log line, if any.
    pub file_token: Option<String>,
    pub file: FileIdentity,
    pub line: u32,
    pub description: String,
    pub variable: Option<String>,
    /// Id of the rule that produced the record.
    pub rule: String,
}
