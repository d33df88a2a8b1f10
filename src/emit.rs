//! Decision emitter: the only place that knows the host's exit status contract.
//!
//! | Outcome                       | Status | Diagnostic channel       |
//! |-------------------------------|--------|--------------------------|
//! | Allow                         | 0      | nothing                  |
//! | Block                         | 2      | one line with the reason |
//! | Internal failure, fail-open   | 0      | nothing                  |
//! | Internal failure, fail-closed | 2      | one line                 |

use std::io::Write;

use crate::error::EmitError;
use crate::event::ToolInvocationEvent;
use crate::policy::{Decision, Verdict};

/// The tool call may proceed.
pub const STATUS_ALLOW: i32 = 0;
/// The tool call must not proceed; stderr is shown to the agent.
pub const STATUS_BLOCK: i32 = 2;

/// Diagnostic used when a fail-closed gateway cannot reach a decision.
pub const FAIL_CLOSED_REASON: &str = "blocked: tool gateway failed and is configured to fail closed";

/// What an internal failure turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Let the tool call proceed.
    #[default]
    Open,
    /// Block the tool call.
    Closed,
}

impl FailureMode {
    pub fn from_fail_closed(fail_closed: bool) -> Self {
        if fail_closed {
            FailureMode::Closed
        } else {
            FailureMode::Open
        }
    }
}

/// A status code plus an optional diagnostic line, ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub status: i32,
    pub message: Option<String>,
}

impl Emission {
    pub fn from_decision(decision: &Decision, event: &ToolInvocationEvent) -> Self {
        match decision.verdict() {
            Verdict::Allow => Self {
                status: STATUS_ALLOW,
                message: None,
            },
            Verdict::Block => {
                let reason = decision.reason().unwrap_or("blocked");
                let message = match describe(event) {
                    Some(target) => format!("{reason} ({target})"),
                    None => reason.to_owned(),
                };
                Self {
                    status: STATUS_BLOCK,
                    message: Some(single_line(&message)),
                }
            }
        }
    }

    pub fn internal_failure(mode: FailureMode) -> Self {
        match mode {
            FailureMode::Open => Self {
                status: STATUS_ALLOW,
                message: None,
            },
            FailureMode::Closed => Self {
                status: STATUS_BLOCK,
                message: Some(FAIL_CLOSED_REASON.to_owned()),
            },
        }
    }

    /// Write the diagnostic (if any) and return the status to exit with.
    pub fn emit<W: Write>(&self, diag: &mut W) -> Result<i32, EmitError> {
        if let Some(ref message) = self.message {
            writeln!(diag, "{message}")?;
            diag.flush()?;
        }
        Ok(self.status)
    }
}

/// "Read /project/.env", "/project/.env", "Read", or nothing.
fn describe(event: &ToolInvocationEvent) -> Option<String> {
    match (event.tool_name(), event.operation_path()) {
        (Some(tool), "") => Some(tool.to_owned()),
        (Some(tool), path) => Some(format!("{tool} {path}")),
        (None, "") => None,
        (None, path) => Some(path.to_owned()),
    }
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}
