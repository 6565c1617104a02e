//! Streaming classification engine.
//!
//! This module is the *public entry point* for the classifier. It is split into
//! focused submodules under `src/engine/` while keeping public paths stable
//! (for example `crate::engine::Session` and `crate::engine::LineContext`).
//!
//! ## How the parts work together
//!
//! Classifying a build log is a push pipeline, one logical line at a time:
//!
//! ```text
//! rules (by id) ──┐
//!                 │  CompiledRules::new              (compiled_rules.rs)
//!                 └────────────────┬────────────────
//!                                  │
//! bytes ── LineAccumulator ── line ┼─ TriggerInfo::scan (trigger.rs)
//!          (accumulator.rs)        │
//!                                  v
//!                      Session::classify (session.rs)
//!                        - trimmed / capped views
//!                        - rules in order, first claim wins
//!                        - LineContext per offer (context.rs)
//!                                  │
//!                                  v
//!                      Emitter (emitter.rs)
//!                        - pending continuation
//!                        - Resolver: token -> FileIdentity (resolve.rs)
//!                                  │
//!                                  v
//!                          sink(Diagnostic)
//! ```
//!
//! The engine never looks ahead: each rule sees one physical line, plus
//! whatever state it kept from earlier lines in its own session copy.
//!
//! ## Responsibilities by module
//!
//! - `accumulator.rs`: turns arbitrarily chunked bytes back into lines.
//! - `compiled_rules.rs`: owns the session's rule copies and per-rule
//!   metadata (behavior, required `LineTraits`).
//! - `trigger.rs`: scans a line for coarse traits used to skip rules.
//! - `context.rs`: the handle rules use to report and to reach session state.
//! - `emitter.rs`: pending-record state machine and sink delivery.
//! - `resolve.rs`: file-token resolution with the session-wide cache.
//! - `metrics.rs`: per-session and per-rule counters.
//! - `session.rs`: the orchestrator and its builder.
//!
//! ## Adding new rules
//!
//! - New fixed-algorithm rules are added under `src/rules/` as a `Rule`
//!   variant and listed in `Rule::builtins`.
//! - If a rule needs a new coarse trigger, add a `LineTraits` bit and teach
//!   `TriggerInfo::scan` to set it. Never let the scan miss a line the rule
//!   would claim.
//!
//! ## Debugging
//!
//! Set `BUILDMARK_LOG=buildmark=trace` when running the CLI to log every
//! claimed line and every finalized diagnostic.

#[path = "engine/accumulator.rs"]
mod accumulator;
#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/context.rs"]
mod context;
#[path = "engine/emitter.rs"]
mod emitter;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/session.rs"]
mod session;
#[path = "engine/trigger.rs"]
mod trigger;

pub(crate) use compiled_rules::LineTraits;
pub use context::LineContext;
pub use metrics::{RuleMetrics, SessionMetrics};
pub use resolve::{FileIndex, PathStrategy};
pub(crate) use resolve::base_name;
pub use session::{DEFAULT_MAX_LINE_LEN, Session, SessionBuilder};
