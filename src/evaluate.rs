use chrono::NaiveDate;

use crate::catalog::Catalog;
use crate::registry::Registry;
use crate::store::Collection;
use crate::types::{Condition, LogicalOp, Operator, Predicate, RuleError, Value};

/// Restrict `collection` to the records matching the condition forest (its
/// roots AND-ed), and, when given, dated on or after `effective_date`.
///
/// Runs in two passes. The first joins whatever every leaf needs; the second
/// folds the whole forest into one predicate, which is applied exactly once.
pub(crate) fn evaluate<C: Collection>(
    registry: &Registry<C>,
    collection: &C,
    conditions: &[Condition],
    effective_date: Option<NaiveDate>,
) -> Result<C, RuleError> {
    let catalog = registry.catalog();
    crate::compile::check_depth(conditions, registry.config().max_condition_depth)?;

    let mut prepared = collection.clone();
    for condition in conditions {
        prepared = prepare(catalog, condition, prepared)?;
    }
    if effective_date.is_some() {
        prepared = catalog.effective_date().prepare(&prepared);
    }

    let predicate = combined_predicate(catalog, conditions, effective_date)?;
    Ok(prepared.restrict(predicate))
}

fn prepare<C: Collection>(
    catalog: &Catalog,
    condition: &Condition,
    collection: C,
) -> Result<C, RuleError> {
    match condition {
        Condition::Leaf { condition_type, .. } => {
            Ok(catalog.condition_type(condition_type)?.prepare(&collection))
        }
        Condition::Compound { children, .. } => children
            .iter()
            .try_fold(collection, |acc, child| prepare(catalog, child, acc)),
    }
}

/// The single predicate for a whole forest. Also used to validate conditions
/// without touching a collection.
pub(crate) fn combined_predicate(
    catalog: &Catalog,
    conditions: &[Condition],
    effective_date: Option<NaiveDate>,
) -> Result<Predicate, RuleError> {
    let mut parts = conditions
        .iter()
        .map(|c| predicate(catalog, c))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(date) = effective_date {
        parts.push(
            catalog
                .effective_date()
                .build(Operator::Gte.key(), &Value::Date(date))?,
        );
    }
    Ok(Predicate::and(parts))
}

fn predicate(catalog: &Catalog, condition: &Condition) -> Result<Predicate, RuleError> {
    match condition {
        Condition::Leaf {
            condition_type,
            operator,
            value,
        } => catalog.condition_type(condition_type)?.build(operator, value),
        Condition::Compound { operator, children } => {
            let op = LogicalOp::from_key(operator)
                .filter(|_| !children.is_empty())
                .ok_or_else(|| RuleError::MalformedCompoundCondition {
                    operator: operator.clone(),
                    children: children.len(),
                })?;
            let parts = children
                .iter()
                .map(|child| predicate(catalog, child))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match op {
                LogicalOp::And => Predicate::and(parts),
                LogicalOp::Or => Predicate::or(parts),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Domain, Vocabulary, transaction};
    use crate::store::{MemoryCollection, MemoryStore, OwnerId};
    use crate::{all, any, condition};

    fn setup() -> (MemoryStore, Registry<MemoryCollection>) {
        let store = transaction::memory_store();
        for (name, amount, merchant) in [
            ("Netflix", 15.0, "m1"),
            ("Refund", -20.0, "m2"),
            ("Grocer", 60.0, "m2"),
        ] {
            store.insert(
                OwnerId(1),
                vec![
                    (transaction::NAME, Value::from(name)),
                    (transaction::AMOUNT, Value::Float(amount)),
                    (transaction::MERCHANT, Value::from(merchant)),
                    (
                        transaction::DATE,
                        Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
                    ),
                ],
            );
        }
        let registry = Registry::new(
            Domain::Transaction,
            store.collection(OwnerId(1)),
            &Vocabulary::new().merchant("Netflix", "m1").merchant("Grocer", "m2"),
        );
        (store, registry)
    }

    #[test]
    fn or_is_applied_as_one_restriction() {
        let (_, registry) = setup();
        let tree = any(vec![
            condition("transaction_amount").gt(50_i64),
            condition("transaction_merchant").eq("m1"),
        ]);
        let matched = registry.evaluate(&[tree]).unwrap();
        assert_eq!(matched.count().unwrap(), 2);
        // scope, then the combined predicate
        let restrictions = matched.restrictions();
        assert_eq!(restrictions.len(), 2);
        assert!(matches!(restrictions[1], Predicate::Or(parts) if parts.len() == 2));
    }

    #[test]
    fn prepare_joins_once() {
        let (_, registry) = setup();
        let tree = all(vec![
            condition("transaction_amount").gt(0_i64),
            condition("transaction_name").like("net"),
        ]);
        let matched = registry.evaluate(&[tree]).unwrap();
        assert_eq!(matched.joins(), vec![transaction::ENTRIES]);
        assert_eq!(matched.count().unwrap(), 1);
    }

    #[test]
    fn empty_forest_matches_scope() {
        let (_, registry) = setup();
        let matched = registry.evaluate(&[]).unwrap();
        assert_eq!(matched.count().unwrap(), 3);
    }

    #[test]
    fn top_level_conditions_are_and_ed() {
        let (_, registry) = setup();
        let matched = registry
            .evaluate(&[
                condition("transaction_merchant").eq("m2"),
                condition("transaction_amount").gt(0_i64),
            ])
            .unwrap();
        assert_eq!(matched.count().unwrap(), 1);
    }

    #[test]
    fn unknown_type_fails() {
        let (_, registry) = setup();
        let err = registry
            .evaluate(&[condition("transaction_color").eq("red")])
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::UnsupportedConditionType {
                key: "transaction_color".into()
            }
        );
    }

    #[test]
    fn tampered_operator_fails() {
        let (_, registry) = setup();
        let tampered = Condition::Leaf {
            condition_type: "transaction_amount".into(),
            operator: "> 0 OR 1=1 --".into(),
            value: Value::Int(0),
        };
        assert!(matches!(
            registry.evaluate(&[tampered]),
            Err(RuleError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn empty_compound_is_malformed() {
        let (_, registry) = setup();
        assert_eq!(
            registry.evaluate(&[any(vec![])]).unwrap_err(),
            RuleError::MalformedCompoundCondition {
                operator: "or".into(),
                children: 0
            }
        );
    }

    #[test]
    fn unknown_compound_operator_is_malformed() {
        let (_, registry) = setup();
        let xor = Condition::Compound {
            operator: "xor".into(),
            children: vec![condition("transaction_amount").gt(0_i64)],
        };
        assert!(matches!(
            registry.evaluate(&[xor]),
            Err(RuleError::MalformedCompoundCondition { .. })
        ));
    }

    #[test]
    fn compound_operator_is_case_insensitive() {
        let (_, registry) = setup();
        let upper = Condition::Compound {
            operator: "OR".into(),
            children: vec![
                condition("transaction_amount").lt(0_i64),
                condition("transaction_merchant").eq("m1"),
            ],
        };
        assert_eq!(registry.evaluate(&[upper]).unwrap().count().unwrap(), 2);
    }

    #[test]
    fn effective_date_folds_into_root() {
        let (_, registry) = setup();
        let after = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let before = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let base = registry.base_collection();
        let none = evaluate(&registry, &base, &[], Some(after)).unwrap();
        let every = evaluate(&registry, &base, &[], Some(before)).unwrap();
        assert_eq!(none.count().unwrap(), 0);
        assert_eq!(every.count().unwrap(), 3);
        assert_eq!(every.joins(), vec![transaction::ENTRIES]);
    }

    #[test]
    fn too_deep_is_rejected() {
        let (_, registry) = setup();
        let mut tree = condition("transaction_amount").gt(0_i64);
        for _ in 0..9 {
            tree = all(vec![tree]);
        }
        assert_eq!(
            registry.evaluate(&[tree]).unwrap_err(),
            RuleError::ConditionTooDeep { depth: 9, limit: 8 }
        );
    }

    #[test]
    fn evaluation_does_not_mutate_base() {
        let (_, registry) = setup();
        let before = registry.base_collection().restrictions().len();
        registry
            .evaluate(&[condition("transaction_amount").gt(0_i64)])
            .unwrap();
        assert_eq!(registry.base_collection().restrictions().len(), before);
    }
}
