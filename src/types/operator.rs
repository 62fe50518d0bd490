use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operators a leaf condition may use.
///
/// Conditions persist operators as text; [`Operator::from_key`] is the only
/// way back into this closed set, so an unknown key never reaches a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Case-insensitive substring match.
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
}

impl Operator {
    pub const ALL: [Operator; 6] = [
        Operator::Like,
        Operator::Eq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
    ];

    /// Look up an operator by its persisted key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Operator> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Operator::Like => "like",
            Operator::Eq => "=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }

    /// Human-readable label for authoring forms.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Operator::Like => "contains",
            Operator::Eq => "is equal to",
            Operator::Gt => "is greater than",
            Operator::Gte => "is greater than or equal to",
            Operator::Lt => "is less than",
            Operator::Lte => "is less than or equal to",
        }
    }
}

/// Boolean combinator of a compound condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    /// Parse a persisted compound operator. Matching is case-insensitive.
    #[must_use]
    pub fn from_key(key: &str) -> Option<LogicalOp> {
        if key.eq_ignore_ascii_case("and") {
            Some(LogicalOp::And)
        } else if key.eq_ignore_ascii_case("or") {
            Some(LogicalOp::Or)
        } else {
            None
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "AND"),
            LogicalOp::Or => write!(f, "OR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_key(op.key()), Some(op));
        }
    }

    #[test]
    fn unknown_operator_key() {
        assert_eq!(Operator::from_key("!="), None);
        assert_eq!(Operator::from_key("LIKE"), None);
        assert_eq!(Operator::from_key("= 1 OR 1=1 --"), None);
    }

    #[test]
    fn logical_op_is_case_insensitive() {
        assert_eq!(LogicalOp::from_key("AND"), Some(LogicalOp::And));
        assert_eq!(LogicalOp::from_key("or"), Some(LogicalOp::Or));
        assert_eq!(LogicalOp::from_key("xor"), None);
    }

    #[test]
    fn operator_serializes_as_key() {
        let json = serde_json::to_string(&Operator::Gte).unwrap();
        assert_eq!(json, "\">=\"");
    }
}
