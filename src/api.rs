use crate::engine::{PathStrategy, Session, SessionMetrics};
use crate::{Diagnostic, ParserRegistry, Severity};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Options for a one-shot classification.
///
/// Every field left at its default falls back to the session default (see
/// [`SessionBuilder`](crate::SessionBuilder)).
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Active rule ids in priority order; `None` uses the registry defaults.
    pub rules: Option<Vec<String>>,
    /// Project that records without a file are attributed to.
    pub project: Option<String>,
    /// Directory relative file tokens are resolved against.
    pub working_directory: Option<PathBuf>,
    pub path_strategy: PathStrategy,
    /// Fold file-cache keys to lowercase; `None` means "on Windows only".
    pub case_insensitive: Option<bool>,
}

/// Result from [`classify`] and [`classify_with`].
#[derive(Debug, Clone)]
pub struct ClassifyResult {
    /// Diagnostics in emission order.
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: SessionMetrics,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl ClassifyResult {
    pub fn count(&self, severity: Severity) -> usize {
        self.metrics.count(severity)
    }

    pub fn has_errors(&self) -> bool {
        self.metrics.errors() > 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity.is_error())
    }
}

/// Classify a complete build log with the process-wide registry defaults.
///
/// # Example
/// ```
/// use buildmark::{Severity, classify};
///
/// let out = classify("make: *** [Hello.o] Error 1\n");
/// assert_eq!(out.count(Severity::ErrorBuild), 1);
/// ```
pub fn classify(text: &str) -> ClassifyResult {
    classify_with(text, ParserRegistry::global(), &Options::default())
}

/// Classify a complete build log against `registry` with explicit `options`.
pub fn classify_with(text: &str, registry: &ParserRegistry, options: &Options) -> ClassifyResult {
    let mut diagnostics = Vec::new();

    let mut builder = Session::builder(registry).path_strategy(options.path_strategy);
    if let Some(ids) = &options.rules {
        builder = builder.rules(ids.iter().cloned());
    }
    if let Some(project) = &options.project {
        builder = builder.project(project.clone());
    }
    if let Some(dir) = &options.working_directory {
        builder = builder.working_directory(dir.clone());
    }
    if let Some(yes) = options.case_insensitive {
        builder = builder.case_insensitive(yes);
    }

    let mut session = builder.sink(|d| diagnostics.push(d)).build();
    // No echo writer, so the session itself cannot fail.
    let metrics = match session.write_all(text.as_bytes()).and_then(|()| session.close()) {
        Ok(metrics) => metrics,
        Err(err) => {
            warn!(%err, "classification stopped early");
            SessionMetrics::default()
        }
    };

    ClassifyResult { diagnostics, elapsed: metrics.total, metrics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileIdentity, GCC_RULE_ID, GLD_RULE_ID, GMAKE_RULE_ID};
    use pretty_assertions::assert_eq;

    fn with_rules(ids: &[&str]) -> Options {
        Options { rules: Some(ids.iter().map(|s| s.to_string()).collect()), ..Default::default() }
    }

    #[test]
    fn classify_uses_registry_defaults() {
        let out = classify("main.c:6: error: `wrong' undeclared (first use in this function)\n");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].rule, GCC_RULE_ID);
        assert!(out.has_errors());
    }

    #[test]
    fn project_option_is_the_fallback_identity() {
        let registry = ParserRegistry::new();
        let options = Options { project: Some("hello".into()), ..with_rules(&[GLD_RULE_ID]) };
        let out = classify_with("undefined reference to `foo'", &registry, &options);
        assert_eq!(out.diagnostics[0].file, FileIdentity::Project("hello".into()));
    }

    #[test]
    fn working_directory_anchors_external_files() {
        let registry = ParserRegistry::new();
        let options = Options { working_directory: Some("/build".into()), ..with_rules(&[GCC_RULE_ID]) };
        let out = classify_with("src/a.c:1: warning: x", &registry, &options);
        assert_eq!(out.diagnostics[0].file, FileIdentity::External("/build/src/a.c".into()));
    }

    #[test]
    fn rule_selection_limits_recognition() {
        let registry = ParserRegistry::new();
        let out = classify_with("main.c:6: error: x\nmake: *** [all] Error 2\n", &registry, &with_rules(&[GMAKE_RULE_ID]));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.count(Severity::ErrorBuild), 1);
        assert_eq!(out.errors().count(), 1);
    }
}
