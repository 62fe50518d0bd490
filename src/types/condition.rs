use std::fmt;

use serde::{Deserialize, Serialize};

use super::operator::{LogicalOp, Operator};
use super::Value;

/// One node of a rule's condition tree.
///
/// Type keys and operators are kept as the text they were authored or stored
/// with. They are resolved against the registry every time the tree is
/// evaluated, so stale or tampered data fails there instead of widening a
/// match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Leaf {
        condition_type: String,
        operator: String,
        value: Value,
    },
    /// Children are ordered as the user arranged them.
    Compound {
        operator: String,
        children: Vec<Condition>,
    },
}

impl Condition {
    /// Nesting depth in compound nodes. A leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Condition::Leaf { .. } => 0,
            Condition::Compound { children, .. } => {
                1 + children.iter().map(Condition::depth).max().unwrap_or(0)
            }
        }
    }

    /// Whether this node is a compound node.
    #[must_use]
    pub fn is_compound(&self) -> bool {
        matches!(self, Condition::Compound { .. })
    }

    /// Combine with `other` under AND. An existing AND node absorbs `other`
    /// as its last child instead of nesting.
    #[must_use]
    pub fn and(self, other: Condition) -> Condition {
        self.combine(LogicalOp::And, other)
    }

    /// Combine with `other` under OR. An existing OR node absorbs `other`.
    #[must_use]
    pub fn or(self, other: Condition) -> Condition {
        self.combine(LogicalOp::Or, other)
    }

    fn combine(self, op: LogicalOp, other: Condition) -> Condition {
        match self {
            Condition::Compound {
                operator,
                mut children,
            } if LogicalOp::from_key(&operator) == Some(op) => {
                children.push(other);
                Condition::Compound { operator, children }
            }
            lhs => compound(op, vec![lhs, other]),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf {
                condition_type,
                operator,
                value,
            } => write!(f, "{condition_type} {operator} {value}"),
            Condition::Compound { operator, children } => {
                let sep = format!(" {} ", operator.to_uppercase());
                let parts: Vec<String> = children.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(&sep))
            }
        }
    }
}

/// Intermediate builder for leaf conditions.
/// Created by [`condition()`]; an operator method produces the [`Condition`].
#[derive(Debug, Clone)]
pub struct ConditionBuilder {
    condition_type: String,
}

impl ConditionBuilder {
    fn leaf(self, op: Operator, value: impl Into<Value>) -> Condition {
        Condition::Leaf {
            condition_type: self.condition_type,
            operator: op.key().to_owned(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn like(self, value: impl Into<Value>) -> Condition {
        self.leaf(Operator::Like, value)
    }

    #[must_use]
    pub fn eq(self, value: impl Into<Value>) -> Condition {
        self.leaf(Operator::Eq, value)
    }

    #[must_use]
    pub fn gt(self, value: impl Into<Value>) -> Condition {
        self.leaf(Operator::Gt, value)
    }

    #[must_use]
    pub fn gte(self, value: impl Into<Value>) -> Condition {
        self.leaf(Operator::Gte, value)
    }

    #[must_use]
    pub fn lt(self, value: impl Into<Value>) -> Condition {
        self.leaf(Operator::Lt, value)
    }

    #[must_use]
    pub fn lte(self, value: impl Into<Value>) -> Condition {
        self.leaf(Operator::Lte, value)
    }
}

/// Start a leaf condition on the given condition type key.
#[must_use]
pub fn condition(condition_type: &str) -> ConditionBuilder {
    ConditionBuilder {
        condition_type: condition_type.to_owned(),
    }
}

/// AND of all `children`.
#[must_use]
pub fn all(children: Vec<Condition>) -> Condition {
    compound(LogicalOp::And, children)
}

/// OR of all `children`.
#[must_use]
pub fn any(children: Vec<Condition>) -> Condition {
    compound(LogicalOp::Or, children)
}

fn compound(op: LogicalOp, children: Vec<Condition>) -> Condition {
    Condition::Compound {
        operator: op.key().to_owned(),
        children,
    }
}
