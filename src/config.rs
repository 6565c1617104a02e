//! Rule files.
//!
//! User-defined regex rules and the default id list persist as TOML:
//!
//! ```toml
//! default = ["gcc", "gld", "gmake", "ti"]
//!
//! [[rule]]
//! id = "ti"
//! name = "TI compiler"
//! keep-untrimmed = false
//!
//! [[rule.pattern]]
//! expression = '"(.*)", line (\d+): error: (.*)'
//! file = "$1"
//! line = "$2"
//! description = "$3"
//! severity = "error-resource"
//!
//! [[rule.pattern]]
//! expression = '.*remark.*'
//! severity = "skip"
//! ```
//!
//! Omitted templates are empty, `severity` defaults to `error-resource` and
//! `eat-line` to `true`.

use crate::{Error, LineBehavior, ParserRegistry, PatternSeverity, RegexRule, Result, SubPattern};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A rule file document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleFile {
    /// Default active ids. Left untouched in the registry when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default: Vec<String>,
    #[serde(default, rename = "rule", skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub keep_untrimmed: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub keep_long_lines: bool,
    #[serde(default, rename = "pattern")]
    pub patterns: Vec<PatternEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PatternEntry {
    pub expression: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub line: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub variable: String,
    #[serde(default)]
    pub severity: PatternSeverity,
    #[serde(default = "yes")]
    pub eat_line: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn yes() -> bool {
    true
}

impl RuleFile {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        let file = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), rules = file.rules.len(), "rule file loaded");
        Ok(file)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?).map_err(|source| Error::Io { path: path.to_path_buf(), source })
    }

    /// The registry's user-defined rules and default ids.
    pub fn from_registry(registry: &ParserRegistry) -> Self {
        RuleFile {
            default: registry.default_ids(),
            rules: registry.user_defined().iter().map(RuleEntry::from_rule).collect(),
        }
    }

    /// Compile every entry.
    pub fn to_rules(&self) -> Result<Vec<RegexRule>> {
        self.rules.iter().map(RuleEntry::to_rule).collect()
    }

    /// Replace the registry's user-defined rules (and default ids, when the file
    /// names any). Nothing changes if an entry fails to compile.
    pub fn apply(&self, registry: &ParserRegistry) -> Result<()> {
        registry.set_user_defined(self.to_rules()?)?;
        if !self.default.is_empty() {
            registry.set_default_ids(self.default.iter().cloned());
        }
        Ok(())
    }
}

impl RuleEntry {
    fn from_rule(rule: &RegexRule) -> Self {
        let behavior = rule.behavior();
        RuleEntry {
            id: rule.id().to_string(),
            name: rule.name().to_string(),
            keep_untrimmed: behavior.keep_untrimmed,
            keep_long_lines: behavior.keep_long_lines,
            patterns: rule
                .patterns()
                .iter()
                .map(|p| PatternEntry {
                    expression: p.expression().to_string(),
                    file: p.file_template().to_string(),
                    line: p.line_template().to_string(),
                    description: p.description_template().to_string(),
                    variable: p.variable_template().to_string(),
                    severity: p.pattern_severity(),
                    eat_line: p.eats_line(),
                })
                .collect(),
        }
    }

    fn to_rule(&self) -> Result<RegexRule> {
        let behavior = LineBehavior { keep_untrimmed: self.keep_untrimmed, keep_long_lines: self.keep_long_lines };
        let name = if self.name.is_empty() { &self.id } else { &self.name };
        let mut rule = RegexRule::new(&self.id, name).with_behavior(behavior);
        for p in &self.patterns {
            rule.add_pattern(
                SubPattern::new(&p.expression)?
                    .file(&p.file)
                    .line(&p.line)
                    .description(&p.description)
                    .variable(&p.variable)
                    .severity(p.severity)
                    .eat_line(p.eat_line),
            );
        }
        Ok(rule)
    }
}
