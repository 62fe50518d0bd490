use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::condition::Condition;
use super::error::RuleError;
use super::report::{ActionOutcome, ApplyReport};
use super::value::Value;
use crate::EngineError;
use crate::catalog::Domain;
use crate::registry::Registry;
use crate::store::Collection;

/// One mutation a rule performs on every matched record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: String,
    pub value: Value,
}

impl Action {
    #[must_use]
    pub fn new(action_type: &str, value: impl Into<Value>) -> Self {
        Self {
            action_type: action_type.to_owned(),
            value: value.into(),
        }
    }
}

/// Options for [`Rule::apply_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Write locked columns too. Reserved for trusted automated sources.
    pub ignore_attribute_locks: bool,
}

/// A condition forest plus the actions to run on what it matches.
///
/// Top-level conditions are implicitly AND-ed. A rule without conditions
/// matches every record in the registry's base collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Only records dated on or after this day match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn default_active() -> bool {
    true
}

impl Rule {
    #[must_use]
    pub fn new(domain: Domain) -> Self {
        Self {
            name: None,
            domain,
            active: true,
            effective_date: None,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Add a top-level condition.
    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Append an action.
    #[must_use]
    pub fn then(mut self, action_type: &str, value: impl Into<Value>) -> Self {
        self.actions.push(Action::new(action_type, value));
        self
    }

    #[must_use]
    pub fn effective_from(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Remove the top-level condition at `index`, if there is one.
    pub fn remove_condition(&mut self, index: usize) -> Option<Condition> {
        (index < self.conditions.len()).then(|| self.conditions.remove(index))
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Remove the action of the given type, if the rule has one.
    pub fn remove_action(&mut self, action_type: &str) -> Option<Action> {
        let index = self
            .actions
            .iter()
            .position(|a| a.action_type == action_type)?;
        Some(self.actions.remove(index))
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("untitled rule")
    }

    /// Check the rule can be saved: every type and operator resolves, values
    /// fit their types, compound nodes are well formed, and the actions are
    /// present and distinct.
    ///
    /// # Errors
    ///
    /// The first [`RuleError`] found.
    pub fn validate<C: Collection>(&self, registry: &Registry<C>) -> Result<(), RuleError> {
        crate::compile::validate(self, registry)
    }

    /// The registry's base collection restricted to what this rule matches.
    /// Nothing is read until the result is consumed.
    ///
    /// # Errors
    ///
    /// [`RuleError`] for a domain mismatch or an invalid condition.
    pub fn matching<C: Collection>(&self, registry: &Registry<C>) -> Result<C, RuleError> {
        crate::compile::check_domain(self, registry)?;
        crate::evaluate::evaluate(
            registry,
            &registry.base_collection(),
            &self.conditions,
            self.effective_date,
        )
    }

    /// How many records the rule would act on, ignoring locks.
    ///
    /// # Errors
    ///
    /// As [`Rule::matching`], plus any store failure.
    pub fn matching_count<C: Collection>(&self, registry: &Registry<C>) -> Result<usize, EngineError> {
        Ok(self.matching(registry)?.count()?)
    }

    /// Apply the rule, leaving locked columns untouched.
    ///
    /// # Errors
    ///
    /// As [`Rule::apply_with`].
    pub fn apply<C: Collection>(&self, registry: &Registry<C>) -> Result<ApplyReport, EngineError> {
        self.apply_with(registry, ApplyOptions::default())
    }

    /// Validate, evaluate the conditions once, then run each action in order
    /// against that same matched set.
    ///
    /// # Errors
    ///
    /// [`EngineError::Rule`] if validation fails, in which case nothing is
    /// written. Store and provider failures propagate unchanged; actions
    /// that ran before the failure stay applied.
    pub fn apply_with<C: Collection>(
        &self,
        registry: &Registry<C>,
        options: ApplyOptions,
    ) -> Result<ApplyReport, EngineError> {
        let start = Instant::now();
        self.validate(registry)?;

        let matched = self.matching(registry)?.pin()?;
        let matched_count = matched.count()?;
        debug!(
            rule = self.display_name(),
            matched = matched_count,
            "conditions evaluated"
        );

        let mut outcomes = Vec::with_capacity(self.actions.len());
        for action in &self.actions {
            let written = registry.execute(action, &matched, options.ignore_attribute_locks)?;
            outcomes.push(ActionOutcome {
                action_type: action.action_type.clone(),
                written,
            });
        }

        Ok(ApplyReport::new(
            self.display_name().to_owned(),
            matched_count,
            outcomes,
            start.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Vocabulary, transaction};
    use crate::store::{MemoryCollection, MemoryStore, OwnerId, RecordId};
    use crate::{any, condition};

    fn setup() -> (MemoryStore, Registry<MemoryCollection>, Vec<RecordId>) {
        let store = transaction::memory_store();
        let ids = [
            (100.0, "m1", "2024-02-01"),
            (-50.0, "m2", "2024-02-01"),
            (75.0, "m1", "2023-12-01"),
        ]
        .into_iter()
        .map(|(amount, merchant, date)| {
            store.insert(
                OwnerId(1),
                vec![
                    (transaction::AMOUNT, Value::Float(amount)),
                    (transaction::MERCHANT, Value::from(merchant)),
                    (
                        transaction::DATE,
                        Value::Date(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
                    ),
                ],
            )
        })
        .collect();
        let registry = Registry::new(
            Domain::Transaction,
            store.collection(OwnerId(1)),
            &Vocabulary::new()
                .merchant("X", "m1")
                .merchant("Y", "m2")
                .category("Dining", "dining"),
        );
        (store, registry, ids)
    }

    #[test]
    fn builder_sets_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rule = Rule::new(Domain::Transaction)
            .named("r")
            .effective_from(date)
            .inactive()
            .when(condition("transaction_amount").gt(0_i64))
            .then("set_transaction_category", "dining");
        assert_eq!(rule.display_name(), "r");
        assert_eq!(rule.effective_date, Some(date));
        assert!(!rule.active);
        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(rule.actions, vec![Action::new("set_transaction_category", "dining")]);
    }

    #[test]
    fn add_and_remove() {
        let mut rule = Rule::new(Domain::Transaction);
        rule.add_condition(condition("transaction_amount").gt(0_i64));
        rule.add_action(Action::new("set_transaction_name", "Rent"));
        assert!(rule.remove_condition(3).is_none());
        assert!(rule.remove_condition(0).is_some());
        assert!(rule.remove_action("set_transaction_category").is_none());
        assert_eq!(
            rule.remove_action("set_transaction_name"),
            Some(Action::new("set_transaction_name", "Rent"))
        );
        assert!(rule.actions.is_empty());
        assert_eq!(rule.display_name(), "untitled rule");
    }

    #[test]
    fn apply_reports_per_action() {
        let (store, registry, ids) = setup();
        let rule = Rule::new(Domain::Transaction)
            .named("Dining")
            .when(condition("transaction_merchant").eq("m1"))
            .then("set_transaction_category", "dining")
            .then("set_transaction_name", "Restaurant");
        let report = rule.apply(&registry).unwrap();
        assert_eq!(report.matched(), 2);
        assert_eq!(report.written("set_transaction_category"), Some(2));
        assert_eq!(report.written("set_transaction_name"), Some(2));
        assert_eq!(store.get(ids[1], transaction::CATEGORY), None);
    }

    #[test]
    fn matched_set_is_computed_once() {
        let (store, registry, ids) = setup();
        // the second action would change what the condition matches
        let rule = Rule::new(Domain::Transaction)
            .when(condition("transaction_merchant").eq("m1"))
            .then("set_transaction_merchant", "m2")
            .then("set_transaction_category", "dining");
        let report = rule.apply(&registry).unwrap();
        assert_eq!(report.written("set_transaction_category"), Some(2));
        assert_eq!(store.get(ids[0], transaction::CATEGORY), Some(Value::from("dining")));
    }

    #[test]
    fn effective_date_limits_matches() {
        let (_, registry, _) = setup();
        let rule = Rule::new(Domain::Transaction)
            .when(any(vec![
                condition("transaction_amount").gt(0_i64),
                condition("transaction_merchant").eq("m2"),
            ]))
            .effective_from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .then("set_transaction_category", "dining");
        assert_eq!(rule.matching_count(&registry).unwrap(), 2);
    }

    #[test]
    fn invalid_rule_writes_nothing() {
        let (store, registry, _) = setup();
        let rule = Rule::new(Domain::Transaction)
            .when(condition("transaction_merchant").eq("m1"))
            .then("set_transaction_name", "Renamed")
            .then("set_transaction_category", "unknown");
        assert!(rule.apply(&registry).is_err());
        assert!(store.enrichments().is_empty());
    }

    #[test]
    fn serde_round_trip_with_defaults() {
        let json = serde_json::json!({
            "name": "Streaming",
            "conditions": [
                {"kind": "leaf", "condition_type": "transaction_merchant", "operator": "=", "value": "m1"}
            ],
            "actions": [{"action_type": "set_transaction_category", "value": "dining"}]
        });
        let rule: Rule = serde_json::from_value(json).unwrap();
        assert!(rule.active);
        assert_eq!(rule.domain, Domain::Transaction);
        assert_eq!(rule.conditions[0], condition("transaction_merchant").eq("m1"));
        let back: Rule = serde_json::from_value(serde_json::to_value(&rule).unwrap()).unwrap();
        assert_eq!(back, rule);
    }
}
