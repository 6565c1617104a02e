//! Active rule compilation.
//!
//! This module holds the *static* side of a session: the ordered rule list
//! selected by id, together with the per-rule data the session needs on every
//! line and does not want to recompute.
//!
//! A session works in two phases:
//!
//! 1. **Compile** (this module): copy the selected rules out of the registry,
//!    read each rule's [`LineBehavior`] once, and record which
//!    [`LineTraits`] it requires (all of them) or accepts on their own (any
//!    one of them).
//! 2. **Run** (see `session.rs`): scan each line for traits (`trigger.rs`),
//!    then offer it to the compiled rules in order.
//!
//! ## Invariants
//!
//! - `rules`, `behaviors`, `requires` and `sufficient` are index-aligned; the index is the
//!   rule's priority (lower wins).
//! - Rules are owned copies. Mutating them (per-session state) never reaches the
//!   registry they came from.

use crate::{LineBehavior, Rule};

bitflags::bitflags! {
    /// Coarse per-line traits used to skip rules that cannot match.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LineTraits: u8 {
        const HAS_COLON  = 1 << 0;
        const HAS_DIGITS = 1 << 1;
        const MAKEISH    = 1 << 2;
        const GCC_FOLLOWUP = 1 << 3;
    }
}

/// Ordered, session-owned rule set.
#[derive(Debug)]
pub(crate) struct CompiledRules {
    pub rules: Vec<Rule>,
    pub behaviors: Vec<LineBehavior>,
    pub requires: Vec<LineTraits>,
    pub sufficient: Vec<LineTraits>,
}

impl CompiledRules {
    pub fn new(rules: Vec<Rule>) -> Self {
        let behaviors = rules.iter().map(Rule::behavior).collect();
        let requires = rules.iter().map(Rule::requires).collect();
        let sufficient = rules.iter().map(Rule::sufficient).collect();
        CompiledRules { rules, behaviors, requires, sufficient }
    }

    /// Whether rule `i` could claim a line with `traits`.
    pub fn admits(&self, i: usize, traits: LineTraits) -> bool {
        traits.contains(self.requires[i]) || traits.intersects(self.sufficient[i])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.id().to_string()).collect()
    }
}
