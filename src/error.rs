//! Error taxonomy for the gateway.
//!
//! Only a policy match ever blocks a tool call. Every type here describes
//! a failure of the gateway itself, which the emitter maps through the
//! configured [`FailureMode`](crate::emit::FailureMode).

use std::path::PathBuf;

use thiserror::Error;

/// The hook payload could not be turned into a [`ToolInvocationEvent`](crate::event::ToolInvocationEvent).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty input")]
    Empty,

    #[error("input exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read input: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// A rule definition could not be turned into a predicate.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("rule {name:?} has no conditions")]
    NoConditions { name: String },

    #[error("rule {name:?} has unknown action {action:?}")]
    UnknownAction { name: String, action: String },

    #[error("rule {name:?} has unknown phase {phase:?}")]
    UnknownPhase { name: String, phase: String },

    #[error("rule at position {index} has no name")]
    Unnamed { index: usize },
}

/// Appending to the audit log failed. Never changes the decision.
#[derive(Debug, Error)]
pub enum AuditWriteError {
    #[error("cannot expand audit log path {path:?}: {message}")]
    Expand { path: String, message: String },

    #[error("cannot create audit log directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot open audit log {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write audit log {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("short write to audit log {}: {written} of {expected} bytes", .path.display())]
    ShortWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
    },
}

/// The diagnostic message could not be delivered to the agent.
#[derive(Debug, Error)]
#[error("failed to write diagnostic: {0}")]
pub struct EmitError(#[from] pub std::io::Error);

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Internal failure that stops an invocation before a decision is reached.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
