use std::fmt;
use std::time::Duration;

use crate::EngineError;

/// Records written by one action of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action_type: String,
    pub written: usize,
}

/// Result of applying one rule, returned by
/// [`Rule::apply()`](super::rule::Rule::apply).
#[derive(Debug, Clone)]
#[must_use]
pub struct ApplyReport {
    rule: String,
    matched: usize,
    actions: Vec<ActionOutcome>,
    duration: Duration,
}

impl ApplyReport {
    pub(crate) fn new(
        rule: String,
        matched: usize,
        actions: Vec<ActionOutcome>,
        duration: Duration,
    ) -> Self {
        Self {
            rule,
            matched,
            actions,
            duration,
        }
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Records the conditions matched, locked or not.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// One outcome per action, in declared order.
    #[must_use]
    pub fn actions(&self) -> &[ActionOutcome] {
        &self.actions
    }

    #[must_use]
    pub fn written(&self, action_type: &str) -> Option<usize> {
        self.actions
            .iter()
            .find(|a| a.action_type == action_type)
            .map(|a| a.written)
    }

    /// Sum of records written across all actions.
    #[must_use]
    pub fn total_written(&self) -> usize {
        self.actions.iter().map(|a| a.written).sum()
    }

    /// Wall-clock duration of evaluation plus execution.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule '{}': matched {}", self.rule, self.matched)?;
        let parts: Vec<String> = self
            .actions
            .iter()
            .map(|a| format!("{}={}", a.action_type, a.written))
            .collect();
        write!(f, ", written: [{}]", parts.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

/// A rule a batch pass could not apply.
#[derive(Debug)]
pub struct SkippedRule {
    pub rule: String,
    pub error: EngineError,
}

/// Result of [`apply_all()`](crate::apply_all).
#[derive(Debug, Default)]
#[must_use]
pub struct BatchReport {
    pub applied: Vec<ApplyReport>,
    pub skipped: Vec<SkippedRule>,
    /// Rules not run because they are inactive.
    pub inactive: usize,
}

impl BatchReport {
    #[must_use]
    pub fn total_written(&self) -> usize {
        self.applied.iter().map(ApplyReport::total_written).sum()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "applied: {}, skipped: {}, inactive: {}, written: {}",
            self.applied.len(),
            self.skipped.len(),
            self.inactive,
            self.total_written()
        )
    }
}
