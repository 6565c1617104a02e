//! User-defined regex rules.
//!
//! A [`RegexRule`] is pure data: an ordered list of [`SubPattern`]s. Each
//! sub-pattern is a regular expression that must match a whole line, plus
//! back-reference templates (see `template.rs`) that build the marker's file,
//! line, description and variable.
//!
//! ## Matching
//!
//! ```text
//! for each sub-pattern, in insertion order:
//!     no match             -> next sub-pattern
//!     severity Skip        -> stop; claimed if eat_line
//!     template error       -> warn, next sub-pattern
//!     report marker        -> stop if eat_line, else next sub-pattern
//! no eating match          -> not claimed
//! ```
//!
//! A non-eating match reports and then lets later sub-patterns, and later
//! rules, look at the same line.

use super::helpers::parse_line_number;
use super::template::{TemplateError, expand};
use crate::engine::LineContext;
use crate::{Error, LineBehavior, Marker, PatternSeverity, Result, Severity};
use regex::{Captures, Regex};
use tracing::warn;

/// One match expression with its extraction templates.
#[derive(Debug, Clone)]
pub struct SubPattern {
    expression: String,
    regex: Regex,
    file: String,
    line: String,
    description: String,
    variable: String,
    severity: PatternSeverity,
    eat_line: bool,
}

impl SubPattern {
    /// Compile `expression`. It is anchored, so it has to match the whole line.
    pub fn new(expression: impl Into<String>) -> Result<Self> {
        let expression = expression.into();
        let regex = Regex::new(&format!("^(?:{expression})$"))
            .map_err(|source| Error::InvalidExpression { expression: expression.clone(), source })?;
        Ok(SubPattern {
            expression,
            regex,
            file: String::new(),
            line: String::new(),
            description: String::new(),
            variable: String::new(),
            severity: PatternSeverity::default(),
            eat_line: true,
        })
    }

    pub fn file(mut self, template: impl Into<String>) -> Self {
        self.file = template.into();
        self
    }

    pub fn line(mut self, template: impl Into<String>) -> Self {
        self.line = template.into();
        self
    }

    pub fn description(mut self, template: impl Into<String>) -> Self {
        self.description = template.into();
        self
    }

    pub fn variable(mut self, template: impl Into<String>) -> Self {
        self.variable = template.into();
        self
    }

    pub fn severity(mut self, severity: PatternSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Whether a match hides the line from later sub-patterns and rules.
    /// Defaults to `true`.
    pub fn eat_line(mut self, eat: bool) -> Self {
        self.eat_line = eat;
        self
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn file_template(&self) -> &str {
        &self.file
    }

    pub fn line_template(&self) -> &str {
        &self.line
    }

    pub fn description_template(&self) -> &str {
        &self.description
    }

    pub fn variable_template(&self) -> &str {
        &self.variable
    }

    pub fn pattern_severity(&self) -> PatternSeverity {
        self.severity
    }

    pub fn eats_line(&self) -> bool {
        self.eat_line
    }

    fn marker(&self, severity: Severity, caps: &Captures<'_>) -> std::result::Result<Marker, TemplateError> {
        let file = expand(&self.file, &self.regex, caps)?;
        let line = parse_line_number(&expand(&self.line, &self.regex, caps)?);
        let description = expand(&self.description, &self.regex, caps)?;
        let variable = expand(&self.variable, &self.regex, caps)?;
        Ok(Marker::new(severity, description).at(file, line).with_variable(Some(variable)))
    }
}

impl PartialEq for SubPattern {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
            && self.file == other.file
            && self.line == other.line
            && self.description == other.description
            && self.variable == other.variable
            && self.severity == other.severity
            && self.eat_line == other.eat_line
    }
}

impl Eq for SubPattern {}

/// An ordered list of sub-patterns under a rule id.
///
/// Equality compares id, name and the sub-pattern sequence; `Clone` copies the
/// list, so a clone can be edited without touching the original.
#[derive(Debug, Clone)]
pub struct RegexRule {
    id: String,
    name: String,
    behavior: LineBehavior,
    patterns: Vec<SubPattern>,
}

impl RegexRule {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        RegexRule { id: id.into(), name: name.into(), behavior: LineBehavior::DEFAULT, patterns: Vec::new() }
    }

    pub fn with_behavior(mut self, behavior: LineBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_pattern(mut self, pattern: SubPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn behavior(&self) -> LineBehavior {
        self.behavior
    }

    pub fn add_pattern(&mut self, pattern: SubPattern) {
        self.patterns.push(pattern);
    }

    /// Remove the first sub-pattern equal to `pattern`. Returns whether one was found.
    pub fn remove_pattern(&mut self, pattern: &SubPattern) -> bool {
        match self.patterns.iter().position(|p| p == pattern) {
            Some(index) => {
                self.patterns.remove(index);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the sub-patterns, in insertion order.
    pub fn patterns(&self) -> Vec<SubPattern> {
        self.patterns.clone()
    }

    pub fn process_line(&mut self, line: &str, ctx: &mut LineContext<'_, '_>) -> bool {
        for pattern in &self.patterns {
            let Some(caps) = pattern.regex.captures(line) else { continue };

            let Some(severity) = pattern.severity.severity() else {
                return pattern.eat_line;
            };

            match pattern.marker(severity, &caps) {
                Ok(marker) => {
                    ctx.report(marker);
                    if pattern.eat_line {
                        return true;
                    }
                }
                Err(err) => {
                    warn!(rule = %self.id, expression = %pattern.expression, %err, "sub-pattern ignored");
                }
            }
        }
        false
    }
}

impl PartialEq for RegexRule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.patterns == other.patterns
    }
}

impl Eq for RegexRule {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(expr: &str) -> SubPattern {
        SubPattern::new(expr).unwrap().description("$1")
    }

    #[test]
    fn invalid_expression_is_an_error() {
        let err = SubPattern::new("(unclosed").unwrap_err();
        assert!(matches!(err, Error::InvalidExpression { ref expression, .. } if expression == "(unclosed"));
    }

    #[test]
    fn clone_is_independent_and_equal() {
        let mut original = RegexRule::new("r", "Rule").with_pattern(pattern("a(.*)")).with_pattern(pattern("b(.*)"));
        let copy = original.clone();
        assert_eq!(copy, original);

        original.add_pattern(pattern("c(.*)"));
        assert_ne!(copy, original);
        assert_eq!(copy.patterns().len(), 2);
    }

    #[test]
    fn remove_takes_the_first_equal_entry() {
        let mut rule = RegexRule::new("r", "Rule");
        rule.add_pattern(pattern("a(.*)"));
        rule.add_pattern(pattern("b(.*)"));
        rule.add_pattern(pattern("a(.*)"));

        assert!(rule.remove_pattern(&pattern("a(.*)")));
        let left: Vec<String> = rule.patterns().iter().map(|p| p.expression().to_string()).collect();
        assert_eq!(left, vec!["b(.*)", "a(.*)"]);
        assert!(!rule.remove_pattern(&pattern("zzz")));
    }

    #[test]
    fn equality_ignores_behavior_but_not_order() {
        let ab = RegexRule::new("r", "Rule").with_pattern(pattern("a")).with_pattern(pattern("b"));
        let ba = RegexRule::new("r", "Rule").with_pattern(pattern("b")).with_pattern(pattern("a"));
        assert_ne!(ab, ba);
        assert_eq!(ab.clone().with_behavior(LineBehavior::RAW), ab);
    }

    #[test]
    fn expressions_are_anchored() {
        let p = pattern("error");
        assert!(p.regex.is_match("error"));
        assert!(!p.regex.is_match("an error here"));
    }
}
