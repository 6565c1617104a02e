//! The closed set of rules.
//!
//! Built-in rules recognize one tool family each with a fixed algorithm;
//! [`RegexRule`]s are user data. Both are wrapped in [`Rule`] so a session can
//! hold an ordered, owned list of them.

mod assembler;
mod compiler;
mod helpers;
mod linker;
mod make;
mod regex_rule;
mod template;

pub(crate) use compiler::UNDECLARED_FOLLOWUPS;

pub use assembler::AssemblerRule;
pub use compiler::CompilerRule;
pub use linker::LinkerRule;
pub use make::MakeRule;
pub use regex_rule::{RegexRule, SubPattern};

use crate::LineBehavior;
use crate::engine::{LineContext, LineTraits};

pub const GCC_RULE_ID: &str = "gcc";
pub const GAS_RULE_ID: &str = "gas";
pub const GLD_RULE_ID: &str = "gld";
pub const GMAKE_RULE_ID: &str = "gmake";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Compiler(CompilerRule),
    Assembler(AssemblerRule),
    Linker(LinkerRule),
    Make(MakeRule),
    Regex(RegexRule),
}

impl Rule {
    /// The built-in rules, in default priority order.
    pub fn builtins() -> Vec<Rule> {
        vec![
            Rule::Compiler(CompilerRule::new()),
            Rule::Assembler(AssemblerRule::new()),
            Rule::Linker(LinkerRule::new()),
            Rule::Make(MakeRule::new()),
        ]
    }

    pub fn id(&self) -> &str {
        match self {
            Rule::Compiler(_) => GCC_RULE_ID,
            Rule::Assembler(_) => GAS_RULE_ID,
            Rule::Linker(_) => GLD_RULE_ID,
            Rule::Make(_) => GMAKE_RULE_ID,
            Rule::Regex(rule) => rule.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Rule::Compiler(_) => "GNU C/C++ Error Parser",
            Rule::Assembler(_) => "GNU Assembler Error Parser",
            Rule::Linker(_) => "GNU Linker Error Parser",
            Rule::Make(_) => "GNU Make Error Parser",
            Rule::Regex(rule) => rule.name(),
        }
    }

    pub fn behavior(&self) -> LineBehavior {
        match self {
            Rule::Regex(rule) => rule.behavior(),
            _ => LineBehavior::DEFAULT,
        }
    }

    /// Traits a line must have for this rule to possibly claim it.
    pub(crate) fn requires(&self) -> LineTraits {
        match self {
            Rule::Compiler(_) => CompilerRule::requires(),
            Rule::Assembler(_) => AssemblerRule::requires(),
            Rule::Linker(_) => LinkerRule::requires(),
            Rule::Make(_) => MakeRule::requires(),
            Rule::Regex(_) => LineTraits::empty(),
        }
    }

    /// Traits any one of which gets a line offered to this rule regardless of
    /// [`requires`](Self::requires).
    pub(crate) fn sufficient(&self) -> LineTraits {
        match self {
            Rule::Compiler(_) => CompilerRule::sufficient(),
            _ => LineTraits::empty(),
        }
    }

    /// Offer one line. Returns `true` when the rule claims it, in which case no
    /// later rule sees the line.
    pub fn process_line(&mut self, line: &str, ctx: &mut LineContext<'_, '_>) -> bool {
        match self {
            Rule::Compiler(rule) => rule.process_line(line, ctx),
            Rule::Assembler(rule) => rule.process_line(line, ctx),
            Rule::Linker(rule) => rule.process_line(line, ctx),
            Rule::Make(rule) => rule.process_line(line, ctx),
            Rule::Regex(rule) => rule.process_line(line, ctx),
        }
    }
}

impl From<RegexRule> for Rule {
    fn from(rule: RegexRule) -> Self {
        Rule::Regex(rule)
    }
}
