use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::operator::Operator;

/// Scalar values carried by conditions, actions and stored records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number, used for money amounts.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A UTF-8 string.
    String(String),
    /// A calendar date.
    Date(NaiveDate),
}

/// Numeric type a number condition coerces its value to before comparing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    Integer,
    Decimal,
}

impl Value {
    /// Compare this value to another using the given operator.
    /// Returns `None` for incompatible types and for [`Operator::Like`], which
    /// is a pattern match rather than an ordering.
    #[must_use]
    pub fn compare(&self, op: Operator, other: &Value) -> Option<bool> {
        let ord = self.partial_cmp_value(other)?;
        match op {
            Operator::Eq => Some(ord == Ordering::Equal),
            Operator::Gt => Some(ord == Ordering::Greater),
            Operator::Gte => Some(ord != Ordering::Less),
            Operator::Lt => Some(ord == Ordering::Less),
            Operator::Lte => Some(ord != Ordering::Greater),
            Operator::Like => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Coerce to the given numeric type. Numeric strings are accepted;
    /// booleans, dates, non-finite floats and fractional integers are not.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn coerce_number(&self, numeric: NumericType) -> Option<Value> {
        let parsed = match self {
            Value::Int(i) => return Some(integral(*i, numeric)),
            Value::Float(f) => *f,
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Some(integral(i, numeric));
                }
                trimmed.parse::<f64>().ok()?
            }
            Value::Bool(_) | Value::Date(_) => return None,
        };
        if !parsed.is_finite() {
            return None;
        }
        match numeric {
            NumericType::Decimal => Some(Value::Float(parsed)),
            NumericType::Integer => {
                let in_range = parsed >= i64::MIN as f64 && parsed < i64::MAX as f64;
                (parsed.fract() == 0.0 && in_range).then(|| Value::Int(parsed as i64))
            }
        }
    }

    /// Coerce to plain text. Booleans have no text form here.
    #[must_use]
    pub fn coerce_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Date(d) => Some(d.to_string()),
            Value::Bool(_) => None,
        }
    }

    /// Coerce to a date. Strings must be ISO-8601 (`YYYY-MM-DD`).
    #[must_use]
    pub fn coerce_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
            _ => None,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn integral(i: i64, numeric: NumericType) -> Value {
    match numeric {
        NumericType::Integer => Value::Int(i),
        NumericType::Decimal => Value::Float(i as f64),
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::Date(v) => write!(f, "{v}"),
        }
    }
}
