use std::fmt;

use crate::config::RuleConfig;
use crate::error::PolicyError;
use crate::event::{Phase, ToolInvocationEvent};
use crate::policy::Decision;
use crate::policy::matchers::{PathContains, PathPrefix, PhaseIs, ToolIs};

/// Reason reported when the secret-path rule blocks a call.
pub const SECRET_PATH_REASON: &str = "blocked: credential file access denied";

/// A pure predicate over an event.
pub trait RuleMatcher: Send + Sync + fmt::Debug {
    fn matches(&self, event: &ToolInvocationEvent) -> bool;
}

/// What happens when a rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Allow,
    Block,
}

impl Action {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(Action::Allow),
            "block" => Some(Action::Block),
            _ => None,
        }
    }
}

/// A named conjunction of matchers plus the action taken when all hold.
#[derive(Debug)]
pub struct PolicyRule {
    name: String,
    action: Action,
    reason: Option<String>,
    matchers: Vec<Box<dyn RuleMatcher>>,
}

impl PolicyRule {
    pub fn new(name: impl Into<String>, action: Action, matchers: Vec<Box<dyn RuleMatcher>>) -> Self {
        Self {
            name: name.into(),
            action,
            reason: None,
            matchers,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Block any path containing `.env`.
    pub fn secret_path() -> Self {
        Self::new(
            "secret-path",
            Action::Block,
            vec![Box::new(PathContains::new(&[".env".to_string()]))],
        )
        .with_reason(SECRET_PATH_REASON)
    }

    /// Build a rule from its TOML definition. `index` is only used in errors.
    pub fn from_config(index: usize, config: &RuleConfig) -> Result<Self, PolicyError> {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(PolicyError::Unnamed { index });
        }
        let action = Action::parse(&config.action).ok_or_else(|| PolicyError::UnknownAction {
            name: name.to_owned(),
            action: config.action.clone(),
        })?;

        let mut matchers: Vec<Box<dyn RuleMatcher>> = Vec::new();
        if !config.path_contains.is_empty() {
            matchers.push(Box::new(PathContains::new(&config.path_contains)));
        }
        if !config.path_prefix.is_empty() {
            matchers.push(Box::new(PathPrefix::new(&config.path_prefix)));
        }
        if !config.tool.is_empty() {
            matchers.push(Box::new(ToolIs::new(&config.tool)));
        }
        if let Some(ref phase) = config.phase {
            let phase = Phase::from_config(phase).ok_or_else(|| PolicyError::UnknownPhase {
                name: name.to_owned(),
                phase: phase.clone(),
            })?;
            matchers.push(Box::new(PhaseIs(phase)));
        }
        if matchers.is_empty() {
            return Err(PolicyError::NoConditions {
                name: name.to_owned(),
            });
        }

        let mut rule = Self::new(name, action, matchers);
        if let Some(ref reason) = config.reason {
            rule = rule.with_reason(reason.clone());
        }
        Ok(rule)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// True when every matcher holds. A rule without matchers never matches.
    pub fn matches(&self, event: &ToolInvocationEvent) -> bool {
        !self.matchers.is_empty() && self.matchers.iter().all(|m| m.matches(event))
    }

    /// The decision this rule produces when it matches.
    pub fn decision(&self) -> Decision {
        match self.action {
            Action::Allow => Decision::allow().with_rule(&self.name),
            Action::Block => {
                let reason = self
                    .reason
                    .clone()
                    .unwrap_or_else(|| format!("blocked: {}", self.name));
                Decision::block(reason).with_rule(&self.name)
            }
        }
    }
}
