//! Rule registry.
//!
//! A [`ParserRegistry`] maps rule ids to rules. It holds one immutable
//! snapshot (built-ins, user-defined regex rules, default id list) behind an
//! [`ArcSwap`]: readers load the current snapshot without locking, and every
//! setter swaps in a whole new snapshot.
//!
//! Every query hands out **copies**. A session mutates its own rules (the
//! linker's function context, for example), and a caller may edit a rule it
//! got from [`ParserRegistry::get`]; neither ever reaches the registry or
//! another session.

use crate::{Error, RegexRule, Result, Rule};
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
struct Snapshot {
    builtin: Vec<Rule>,
    user: Vec<RegexRule>,
    default_ids: Vec<String>,
}

#[derive(Debug)]
pub struct ParserRegistry {
    current: ArcSwap<Snapshot>,
}

static GLOBAL: Lazy<ParserRegistry> = Lazy::new(ParserRegistry::new);

impl Default for ParserRegistry {
    fn default() -> Self {
        ParserRegistry::new()
    }
}

impl ParserRegistry {
    /// Built-in rules only, all of them active by default.
    pub fn new() -> Self {
        let builtin = Rule::builtins();
        let default_ids = builtin.iter().map(|r| r.id().to_string()).collect();
        ParserRegistry { current: ArcSwap::from_pointee(Snapshot { builtin, user: Vec::new(), default_ids }) }
    }

    /// Process-wide registry.
    pub fn global() -> &'static ParserRegistry {
        &GLOBAL
    }

    /// Built-in ids followed by user-defined ids. An id shared by both is
    /// listed once, in its built-in position.
    pub fn available_ids(&self) -> Vec<String> {
        let snapshot = self.current.load();
        let mut ids: Vec<String> = snapshot.builtin.iter().map(|r| r.id().to_string()).collect();
        for rule in &snapshot.user {
            if !ids.iter().any(|id| id == rule.id()) {
                ids.push(rule.id().to_string());
            }
        }
        ids
    }

    /// A fresh copy of the rule registered under `id`. User-defined rules
    /// shadow built-ins with the same id.
    pub fn get(&self, id: &str) -> Option<Rule> {
        let snapshot = self.current.load();
        if let Some(rule) = snapshot.user.iter().find(|r| r.id() == id) {
            return Some(Rule::Regex(rule.clone()));
        }
        snapshot.builtin.iter().find(|r| r.id() == id).cloned()
    }

    pub fn user_defined(&self) -> Vec<RegexRule> {
        self.current.load().user.clone()
    }

    /// Replace the whole list of user-defined rules.
    pub fn set_user_defined(&self, rules: Vec<RegexRule>) -> Result<()> {
        let mut seen = HashSet::new();
        if let Some(dup) = rules.iter().find(|r| !seen.insert(r.id())) {
            return Err(Error::DuplicateRuleId(dup.id().to_string()));
        }

        debug!(count = rules.len(), "user-defined rules replaced");
        self.current.rcu(|current| Snapshot { user: rules.clone(), ..Snapshot::clone(current) });
        Ok(())
    }

    pub fn default_ids(&self) -> Vec<String> {
        self.current.load().default_ids.clone()
    }

    /// Replace the ids a session uses when the caller names none.
    pub fn set_default_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        debug!(ids = ?ids, "default rule ids replaced");
        self.current.rcu(|current| Snapshot { default_ids: ids.clone(), ..Snapshot::clone(current) });
    }

    /// Copies of the rules named by `ids`, in that order. Unknown ids are
    /// skipped.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Rule> {
        ids.iter()
            .filter_map(|id| {
                let id = id.as_ref();
                let rule = self.get(id);
                if rule.is_none() {
                    debug!(id, "unknown rule id skipped");
                }
                rule
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GCC_RULE_ID, GLD_RULE_ID, GMAKE_RULE_ID, PatternSeverity, SubPattern};
    use pretty_assertions::assert_eq;

    fn custom(id: &str) -> RegexRule {
        RegexRule::new(id, "Custom")
            .with_pattern(SubPattern::new("ERR (.*)").unwrap().description("$1").severity(PatternSeverity::ErrorBuild))
    }

    #[test]
    fn defaults_are_the_builtins() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.default_ids(), vec!["gcc", "gas", "gld", "gmake"]);
        assert_eq!(registry.available_ids(), registry.default_ids());
    }

    #[test]
    fn returned_rules_are_copies() {
        let registry = ParserRegistry::new();
        registry.set_user_defined(vec![custom("mine")]).unwrap();

        let Some(Rule::Regex(mut copy)) = registry.get("mine") else { panic!("expected a regex rule") };
        copy.add_pattern(SubPattern::new("more").unwrap());

        let Some(Rule::Regex(again)) = registry.get("mine") else { panic!("expected a regex rule") };
        assert_eq!(again.patterns().len(), 1);
        assert_eq!(registry.user_defined(), vec![custom("mine")]);
    }

    #[test]
    fn duplicate_user_ids_are_rejected() {
        let registry = ParserRegistry::new();
        let err = registry.set_user_defined(vec![custom("a"), custom("b"), custom("a")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateRuleId(ref id) if id == "a"));
        assert!(registry.user_defined().is_empty());
    }

    #[test]
    fn user_rule_shadows_builtin_id() {
        let registry = ParserRegistry::new();
        registry.set_user_defined(vec![custom(GCC_RULE_ID), custom("extra")]).unwrap();

        assert!(matches!(registry.get(GCC_RULE_ID), Some(Rule::Regex(_))));
        assert_eq!(registry.available_ids(), vec!["gcc", "gas", "gld", "gmake", "extra"]);
    }

    #[test]
    fn select_keeps_order_and_skips_unknown_ids() {
        let registry = ParserRegistry::new();
        let ids: Vec<String> = registry.select(&[GMAKE_RULE_ID, "missing", GLD_RULE_ID]).iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, vec![GMAKE_RULE_ID, GLD_RULE_ID]);
    }

    #[test]
    fn default_ids_are_replaced_whole() {
        let registry = ParserRegistry::new();
        registry.set_default_ids(["gmake"]);
        assert_eq!(registry.default_ids(), vec!["gmake"]);
    }
}
