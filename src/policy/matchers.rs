//! Predicates a rule can combine. Each one reads the event and nothing else.
//!
//! Missing data is a non-match: an event without a path never satisfies a
//! path predicate, and an event without a tool name never satisfies a tool
//! predicate.

use crate::event::{Phase, ToolInvocationEvent};
use crate::policy::rule::RuleMatcher;

/// Path contains any of the given substrings (case-sensitive).
#[derive(Debug)]
pub struct PathContains {
    needles: Vec<String>,
}

impl PathContains {
    pub fn new(needles: &[String]) -> Self {
        Self {
            needles: needles.iter().filter(|n| !n.is_empty()).cloned().collect(),
        }
    }
}

impl RuleMatcher for PathContains {
    fn matches(&self, event: &ToolInvocationEvent) -> bool {
        let path = event.operation_path();
        !path.is_empty() && self.needles.iter().any(|n| path.contains(n.as_str()))
    }
}

/// Path starts with any of the given prefixes.
#[derive(Debug)]
pub struct PathPrefix {
    prefixes: Vec<String>,
}

impl PathPrefix {
    pub fn new(prefixes: &[String]) -> Self {
        Self {
            prefixes: prefixes.iter().filter(|p| !p.is_empty()).cloned().collect(),
        }
    }
}

impl RuleMatcher for PathPrefix {
    fn matches(&self, event: &ToolInvocationEvent) -> bool {
        let path = event.operation_path();
        !path.is_empty() && self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Tool name equals one of the given names.
#[derive(Debug)]
pub struct ToolIs {
    names: Vec<String>,
}

impl ToolIs {
    pub fn new(names: &[String]) -> Self {
        Self {
            names: names.to_vec(),
        }
    }
}

impl RuleMatcher for ToolIs {
    fn matches(&self, event: &ToolInvocationEvent) -> bool {
        event
            .tool_name()
            .is_some_and(|tool| self.names.iter().any(|n| n == tool))
    }
}

/// Event arrived in the given phase.
#[derive(Debug)]
pub struct PhaseIs(pub Phase);

impl RuleMatcher for PhaseIs {
    fn matches(&self, event: &ToolInvocationEvent) -> bool {
        event.phase() == self.0
    }
}
