use thiserror::Error;

/// Authoring and data-integrity failures of a rule. None of these are
/// transient; they are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unsupported condition type '{key}'")]
    UnsupportedConditionType { key: String },

    #[error("unsupported action type '{key}'")]
    UnsupportedActionType { key: String },

    #[error("operator '{operator}' is not allowed for condition type '{condition_type}'")]
    UnsupportedOperator {
        condition_type: String,
        operator: String,
    },

    #[error("invalid value {value} for condition type '{condition_type}': {reason}")]
    InvalidConditionValue {
        condition_type: String,
        value: String,
        reason: String,
    },

    #[error("malformed compound condition: operator '{operator}' with {children} children")]
    MalformedCompoundCondition { operator: String, children: usize },

    #[error("invalid value {value} for action type '{action_type}': {reason}")]
    InvalidActionValue {
        action_type: String,
        value: String,
        reason: String,
    },

    #[error("rule '{rule}' has no actions; at least one action is required")]
    MissingActions { rule: String },

    #[error("action type '{action_type}' appears more than once in rule '{rule}'")]
    DuplicateAction { rule: String, action_type: String },

    #[error("condition nesting depth {depth} exceeds the limit of {limit}")]
    ConditionTooDeep { depth: usize, limit: usize },

    #[error("condition {id} refers to a parent that is missing or not a compound condition")]
    OrphanedCondition { id: u64 },

    #[error("condition id {id} appears more than once")]
    DuplicateConditionId { id: u64 },

    #[error("cyclic condition parent chain: {}", path.iter().map(u64::to_string).collect::<Vec<_>>().join(" -> "))]
    CyclicCondition { path: Vec<u64> },

    #[error("rule targets domain '{rule}' but the registry serves '{registry}'")]
    DomainMismatch { rule: String, registry: String },

    #[error("action type '{action_type}' needs an enrichment provider, but none is configured")]
    EnrichmentUnavailable { action_type: String },
}
