//! Closed, per-domain catalogs of condition and action types.
//!
//! A catalog is built from static declarations plus the owner's vocabulary
//! (merchants, categories). Nothing is registered at runtime: a key that is
//! not declared here can never mean anything.

pub mod transaction;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ActionType, ConditionType, Predicate, RuleError, SelectOption};

/// A kind of record rules can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    Transaction,
}

impl Domain {
    pub const ALL: [Domain; 1] = [Domain::Transaction];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Domain::Transaction => "transaction",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Domain> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Owner-specific option lists for selection-kind types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    categories: Vec<SelectOption>,
    merchants: Vec<SelectOption>,
}

impl Vocabulary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn category(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.categories.push(SelectOption::new(label, value));
        self
    }

    #[must_use]
    pub fn merchant(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.merchants.push(SelectOption::new(label, value));
        self
    }

    #[must_use]
    pub fn categories(&self) -> &[SelectOption] {
        &self.categories
    }

    #[must_use]
    pub fn merchants(&self) -> &[SelectOption] {
        &self.merchants
    }
}

/// Every condition and action type of one domain.
#[derive(Debug, Clone)]
pub struct Catalog {
    domain: Domain,
    scope: Predicate,
    conditions: Vec<ConditionType>,
    actions: Vec<ActionType>,
    effective_date: ConditionType,
}

impl Catalog {
    #[must_use]
    pub fn for_domain(domain: Domain, vocabulary: &Vocabulary) -> Self {
        match domain {
            Domain::Transaction => transaction::catalog(vocabulary),
        }
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Restriction every base collection gets, excluding records that rules
    /// must never see.
    #[must_use]
    pub fn scope(&self) -> &Predicate {
        &self.scope
    }

    /// # Errors
    ///
    /// [`RuleError::UnsupportedConditionType`] if `key` is not declared.
    pub fn condition_type(&self, key: &str) -> Result<&ConditionType, RuleError> {
        self.conditions
            .iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| RuleError::UnsupportedConditionType {
                key: key.to_owned(),
            })
    }

    /// # Errors
    ///
    /// [`RuleError::UnsupportedActionType`] if `key` is not declared.
    pub fn action_type(&self, key: &str) -> Result<&ActionType, RuleError> {
        self.actions
            .iter()
            .find(|a| a.key() == key)
            .ok_or_else(|| RuleError::UnsupportedActionType {
                key: key.to_owned(),
            })
    }

    #[must_use]
    pub fn condition_types(&self) -> &[ConditionType] {
        &self.conditions
    }

    #[must_use]
    pub fn action_types(&self) -> &[ActionType] {
        &self.actions
    }

    /// The date type a rule's effective date is checked against. It is not
    /// offered for authoring.
    #[must_use]
    pub fn effective_date(&self) -> &ConditionType {
        &self.effective_date
    }
}
