//! hookgate: a tool-use hook that gates an agent's file operations.
//!
//! Every invocation reads one JSON event from stdin, decides Allow or Block
//! against an ordered rule set, appends one line to an audit log, and
//! reports the decision through its exit status (0 allow, 2 block).
//!
//! # Architecture
//!
//! - **[`event`]** — Input decoding: field fallback chains, phase detection.
//! - **[`policy`]** — Rule engine: ordered predicates, first match wins.
//! - **[`audit`]** — Append-only audit log, one atomic write per line.
//! - **[`emit`]** — Decision → exit status translation, fail-open/closed.
//! - **[`gateway`]** — Per-invocation pipeline tying the above together.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — Diagnostic logger setup.

/// File-based audit trail.
pub mod audit;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Exit status contract with the host.
pub mod emit;
/// Error taxonomy.
pub mod error;
/// Tool invocation events and the input decoder.
pub mod event;
/// Decode → evaluate → log → emit for a single invocation.
pub mod gateway;
/// Diagnostic logging.
pub mod logging;
/// Policy rules and the evaluation engine.
pub mod policy;

use policy::Decision;

/// Decide a raw hook payload against the built-in secret-path rule only.
///
/// Nothing is logged and no configuration is read; the hook binary goes
/// through [`gateway::Gateway`] instead.
pub fn evaluate(input: &[u8]) -> Result<Decision, error::DecodeError> {
    let event = event::decode(input)?;
    Ok(policy::PolicyEngine::default().evaluate(&event))
}
