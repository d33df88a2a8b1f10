//! Normalized tool invocation events.
//!
//! Producers disagree on where they put the tool name and the path a tool
//! operates on. Each field is resolved through an ordered list of JSON
//! pointers; the first non-empty string wins. Supporting a new producer
//! means appending one pointer to the relevant chain.

pub mod decode;

pub use decode::{decode, read_event};

/// Locations tried, in order, for `operation_path`.
pub const OPERATION_PATH_CHAIN: &[&str] = &[
    "/tool_response/filePath",
    "/tool_input/file_path",
    "/tool_input/path",
    "/tool_input/filePath",
];

/// Locations tried, in order, for `tool_name`.
pub const TOOL_NAME_CHAIN: &[&str] = &["/tool_name", "/tool"];

/// Whether the event arrived before or after the tool ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreInvocation,
    PostInvocation,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::PreInvocation => "pre",
            Phase::PostInvocation => "post",
        }
    }

    /// Parse the short form used in rule configuration.
    pub fn from_config(s: &str) -> Option<Self> {
        match s {
            "pre" => Some(Phase::PreInvocation),
            "post" => Some(Phase::PostInvocation),
            _ => None,
        }
    }

    /// Parse the host's `hook_event_name` field.
    fn from_hook_event(s: &str) -> Option<Self> {
        match s {
            "PreToolUse" => Some(Phase::PreInvocation),
            "PostToolUse" => Some(Phase::PostInvocation),
            _ => None,
        }
    }
}

/// One decoded tool call attempt. Read-only after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationEvent {
    tool_name: Option<String>,
    operation_path: String,
    phase: Phase,
}

impl ToolInvocationEvent {
    pub fn new(tool_name: Option<String>, operation_path: impl Into<String>, phase: Phase) -> Self {
        Self {
            tool_name: tool_name.filter(|t| !t.is_empty()),
            operation_path: operation_path.into(),
            phase,
        }
    }

    /// Build an event from an already-parsed JSON document.
    pub fn from_value(doc: &serde_json::Value) -> Self {
        let tool_name = first_string(doc, TOOL_NAME_CHAIN).map(str::to_owned);
        let operation_path = first_string(doc, OPERATION_PATH_CHAIN)
            .unwrap_or_default()
            .to_owned();

        let phase = doc
            .get("hook_event_name")
            .and_then(|v| v.as_str())
            .and_then(Phase::from_hook_event)
            .unwrap_or_else(|| match doc.get("tool_response") {
                Some(serde_json::Value::Object(_)) => Phase::PostInvocation,
                _ => Phase::PreInvocation,
            });

        Self {
            tool_name,
            operation_path,
            phase,
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    /// Path or resource identifier the tool operates on; empty if none was sent.
    pub fn operation_path(&self) -> &str {
        &self.operation_path
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// First non-empty string found at any of the pointers, in order.
fn first_string<'a>(doc: &'a serde_json::Value, chain: &[&str]) -> Option<&'a str> {
    chain
        .iter()
        .filter_map(|pointer| doc.pointer(pointer))
        .filter_map(|v| v.as_str())
        .find(|s| !s.is_empty())
}
