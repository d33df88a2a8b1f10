pub mod decision;
pub mod matchers;
pub mod rule;

pub use decision::{Decision, Verdict};
pub use rule::{Action, PolicyRule, RuleMatcher, SECRET_PATH_REASON};

use crate::config::Config;
use crate::error::PolicyError;
use crate::event::ToolInvocationEvent;

/// Ordered rule set. First matching rule decides; no match means Allow.
#[derive(Debug)]
pub struct PolicyEngine {
    rules: Vec<PolicyRule>,
}

impl PolicyEngine {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Build the rule set from configuration, preserving declaration order.
    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(i, r)| PolicyRule::from_config(i, r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Evaluate an event. Holds no state between calls.
    pub fn evaluate(&self, event: &ToolInvocationEvent) -> Decision {
        self.rules
            .iter()
            .find(|rule| rule.matches(event))
            .map(PolicyRule::decision)
            .unwrap_or_else(Decision::allow)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(vec![PolicyRule::secret_path()])
    }
}
