use serde::Serialize;

use super::column::{Column, Relation};
use super::error::RuleError;
use super::operator::Operator;
use super::predicate::Predicate;
use super::value::{NumericType, Value};
use crate::store::Collection;

/// A `(label, value)` pair of a closed vocabulary, e.g. one merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Value domain of a condition type. Selects the operator whitelist and the
/// coercion applied before a value reaches a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    Text,
    Number(NumericType),
    Date,
    Select,
}

impl ConditionKind {
    #[must_use]
    pub fn operators(self) -> &'static [Operator] {
        match self {
            ConditionKind::Text => &[Operator::Like, Operator::Eq],
            ConditionKind::Number(_) | ConditionKind::Date => &[
                Operator::Gt,
                Operator::Gte,
                Operator::Lt,
                Operator::Lte,
                Operator::Eq,
            ],
            ConditionKind::Select => &[Operator::Eq],
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ConditionKind::Text => "text",
            ConditionKind::Number(_) => "number",
            ConditionKind::Date => "date",
            ConditionKind::Select => "select",
        }
    }
}

/// Declaration of one condition type a rule may reference.
#[derive(Debug, Clone)]
pub struct ConditionType {
    key: &'static str,
    label: &'static str,
    kind: ConditionKind,
    column: Column,
    join: Option<Relation>,
    options: Option<Vec<SelectOption>>,
}

impl ConditionType {
    #[must_use]
    pub fn new(key: &'static str, label: &'static str, kind: ConditionKind, column: Column) -> Self {
        Self {
            key,
            label,
            kind,
            column,
            join: None,
            options: None,
        }
    }

    /// Relation the column lives on; joined during preparation.
    #[must_use]
    pub fn joins(mut self, relation: Relation) -> Self {
        self.join = Some(relation);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    #[must_use]
    pub fn column(&self) -> Column {
        self.column
    }

    #[must_use]
    pub fn options(&self) -> Option<&[SelectOption]> {
        self.options.as_deref()
    }

    #[must_use]
    pub fn allowed_operators(&self) -> &'static [Operator] {
        self.kind.operators()
    }

    /// Add whatever the column needs to be readable. Joining is idempotent,
    /// so preparing the same type twice leaves the collection unchanged.
    pub fn prepare<C: Collection>(&self, collection: &C) -> C {
        match self.join {
            Some(relation) => collection.join(relation),
            None => collection.clone(),
        }
    }

    /// Turn `(operator, value)` into an atomic predicate on this type's
    /// column. The operator is checked against the whitelist and the value is
    /// coerced to the column's type.
    ///
    /// # Errors
    ///
    /// [`RuleError::UnsupportedOperator`] or [`RuleError::InvalidConditionValue`].
    pub fn build(&self, operator: &str, value: &Value) -> Result<Predicate, RuleError> {
        let op = Operator::from_key(operator)
            .filter(|op| self.allowed_operators().contains(op))
            .ok_or_else(|| RuleError::UnsupportedOperator {
                condition_type: self.key.to_owned(),
                operator: operator.to_owned(),
            })?;

        match self.kind {
            ConditionKind::Text => {
                let text = value
                    .coerce_text()
                    .ok_or_else(|| self.invalid(value, "expected text"))?;
                Ok(match op {
                    Operator::Like => Predicate::contains(self.column, &text),
                    _ => Predicate::compare(self.column, op, text),
                })
            }
            ConditionKind::Number(numeric) => {
                let number = value.coerce_number(numeric).ok_or_else(|| {
                    self.invalid(
                        value,
                        match numeric {
                            NumericType::Integer => "expected an integer",
                            NumericType::Decimal => "expected a decimal number",
                        },
                    )
                })?;
                Ok(Predicate::compare(self.column, op, number))
            }
            ConditionKind::Date => {
                let date = value
                    .coerce_date()
                    .ok_or_else(|| self.invalid(value, "expected a YYYY-MM-DD date"))?;
                Ok(Predicate::compare(self.column, op, date))
            }
            ConditionKind::Select => {
                let selected = value
                    .coerce_text()
                    .ok_or_else(|| self.invalid(value, "expected an option value"))?;
                if let Some(options) = &self.options
                    && !options.iter().any(|o| o.value == selected)
                {
                    return Err(self.invalid(value, "not one of the available options"));
                }
                Ok(Predicate::compare(self.column, op, selected))
            }
        }
    }

    fn invalid(&self, value: &Value, reason: &str) -> RuleError {
        RuleError::InvalidConditionValue {
            condition_type: self.key.to_owned(),
            value: value.to_string(),
            reason: reason.to_owned(),
        }
    }

    #[must_use]
    pub fn describe(&self) -> ConditionTypeDescription {
        ConditionTypeDescription {
            key: self.key,
            label: self.label,
            kind: self.kind.name(),
            operators: self
                .allowed_operators()
                .iter()
                .map(|op| OperatorDescription {
                    value: op.key(),
                    label: op.label(),
                })
                .collect(),
            options: self.options.clone(),
        }
    }
}

/// Whether an action's value comes from a closed option set or is an open
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Selection,
    Function,
}

/// What executing an action does with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    /// Write the chosen option into the column.
    Assign,
    /// Write the free-text value into the column.
    SetText,
    /// Ask the enrichment provider for a per-record value, then write it.
    Enrich,
}

impl ActionEffect {
    #[must_use]
    pub fn kind(self) -> ActionKind {
        match self {
            ActionEffect::Assign => ActionKind::Selection,
            ActionEffect::SetText | ActionEffect::Enrich => ActionKind::Function,
        }
    }
}

/// Declaration of one action type a rule may reference.
#[derive(Debug, Clone)]
pub struct ActionType {
    key: &'static str,
    label: &'static str,
    effect: ActionEffect,
    column: Column,
    options: Option<Vec<SelectOption>>,
}

impl ActionType {
    #[must_use]
    pub fn new(key: &'static str, label: &'static str, effect: ActionEffect, column: Column) -> Self {
        Self {
            key,
            label,
            effect,
            column,
            options: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[must_use]
    pub fn effect(&self) -> ActionEffect {
        self.effect
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.effect.kind()
    }

    /// The column this action writes.
    #[must_use]
    pub fn column(&self) -> Column {
        self.column
    }

    #[must_use]
    pub fn options(&self) -> Option<&[SelectOption]> {
        self.options.as_deref()
    }

    /// Check `value` against this action's value domain and return the value
    /// that will be written. Enrichment directives are opaque and pass as is.
    ///
    /// # Errors
    ///
    /// [`RuleError::InvalidActionValue`] when a selection value is not an
    /// option or a free-text value is blank.
    pub fn validate_value(&self, value: &Value) -> Result<Value, RuleError> {
        match self.effect {
            ActionEffect::Assign => {
                let selected = value
                    .coerce_text()
                    .ok_or_else(|| self.invalid(value, "expected an option value"))?;
                let known = self
                    .options
                    .as_ref()
                    .is_some_and(|options| options.iter().any(|o| o.value == selected));
                if known {
                    Ok(Value::String(selected))
                } else {
                    Err(self.invalid(value, "not one of the available options"))
                }
            }
            ActionEffect::SetText => match value.coerce_text() {
                Some(text) if !text.trim().is_empty() => Ok(Value::String(text)),
                _ => Err(self.invalid(value, "expected non-blank text")),
            },
            ActionEffect::Enrich => Ok(value.clone()),
        }
    }

    /// Whether `value` is acceptable for this action's column, used to screen
    /// provider suggestions. Open columns accept any value.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match &self.options {
            Some(options) => value
                .coerce_text()
                .is_some_and(|text| options.iter().any(|o| o.value == text)),
            None => true,
        }
    }

    fn invalid(&self, value: &Value, reason: &str) -> RuleError {
        RuleError::InvalidActionValue {
            action_type: self.key.to_owned(),
            value: value.to_string(),
            reason: reason.to_owned(),
        }
    }

    #[must_use]
    pub fn describe(&self) -> ActionTypeDescription {
        ActionTypeDescription {
            key: self.key,
            label: self.label,
            kind: self.kind(),
            options: self.options.clone(),
        }
    }
}

/// Authoring-form shape of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperatorDescription {
    pub value: &'static str,
    pub label: &'static str,
}

/// Authoring-form shape of a condition type. Carries no behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionTypeDescription {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    pub operators: Vec<OperatorDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
}

/// Authoring-form shape of an action type. Carries no behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionTypeDescription {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
}
