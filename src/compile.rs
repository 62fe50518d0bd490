use std::collections::HashSet;

use crate::registry::Registry;
use crate::store::Collection;
use crate::types::{ActionEffect, Condition, Rule, RuleError};

/// Check everything about `rule` that can be checked without reading
/// records: domain, conditions, actions.
pub(crate) fn validate<C: Collection>(rule: &Rule, registry: &Registry<C>) -> Result<(), RuleError> {
    check_domain(rule, registry)?;
    check_depth(&rule.conditions, registry.config().max_condition_depth)?;
    crate::evaluate::combined_predicate(registry.catalog(), &rule.conditions, rule.effective_date)?;
    check_actions(rule, registry)?;
    Ok(())
}

pub(crate) fn check_domain<C: Collection>(rule: &Rule, registry: &Registry<C>) -> Result<(), RuleError> {
    if rule.domain != registry.domain() {
        return Err(RuleError::DomainMismatch {
            rule: rule.domain.to_string(),
            registry: registry.domain().to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_depth(conditions: &[Condition], limit: usize) -> Result<(), RuleError> {
    let depth = conditions.iter().map(Condition::depth).max().unwrap_or(0);
    if depth > limit {
        return Err(RuleError::ConditionTooDeep { depth, limit });
    }
    Ok(())
}

fn check_actions<C: Collection>(rule: &Rule, registry: &Registry<C>) -> Result<(), RuleError> {
    if rule.actions.is_empty() {
        return Err(RuleError::MissingActions {
            rule: rule.display_name().to_owned(),
        });
    }

    let mut seen = HashSet::new();
    for action in &rule.actions {
        if !seen.insert(action.action_type.as_str()) {
            return Err(RuleError::DuplicateAction {
                rule: rule.display_name().to_owned(),
                action_type: action.action_type.clone(),
            });
        }
        let action_type = registry.resolve_action(&action.action_type)?;
        action_type.validate_value(&action.value)?;
        if action_type.effect() == ActionEffect::Enrich && registry.provider().is_none() {
            return Err(RuleError::EnrichmentUnavailable {
                action_type: action.action_type.clone(),
            });
        }
    }
    Ok(())
}
