/// Binary outcome of policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allow => "allow",
            Verdict::Block => "block",
        }
    }
}

/// Evaluator output. A blocking decision always carries a non-empty reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    verdict: Verdict,
    reason: Option<String>,
    rule: Option<String>,
}

impl Decision {
    /// Allow with no matching rule.
    pub fn allow() -> Self {
        Self {
            verdict: Verdict::Allow,
            reason: None,
            rule: None,
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            verdict: Verdict::Block,
            reason: Some(if reason.trim().is_empty() {
                "blocked".into()
            } else {
                reason
            }),
            rule: None,
        }
    }

    /// Attach the name of the rule that produced this decision.
    pub fn with_rule(mut self, rule: &str) -> Self {
        self.rule = Some(rule.to_owned());
        self
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Block
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Name of the rule that matched, if any.
    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }
}
