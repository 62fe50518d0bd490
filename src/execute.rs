use tracing::debug;

use crate::EngineError;
use crate::enrich::EnrichmentRequest;
use crate::registry::Registry;
use crate::store::{Collection, RecordId};
use crate::types::{Action, ActionEffect, ActionType, RuleError, Value};

/// Write `action`'s value into every record of `matched` whose target
/// column is not locked, or into every record when `ignore_locks` is set.
///
/// A failing bulk write is reported as a failure; records it already wrote
/// stay written.
pub(crate) fn execute<C: Collection>(
    registry: &Registry<C>,
    action: &Action,
    matched: &C,
    ignore_locks: bool,
) -> Result<usize, EngineError> {
    let action_type = registry.resolve_action(&action.action_type)?;
    let value = action_type.validate_value(&action.value)?;
    let column = action_type.column();
    let target = if ignore_locks {
        matched.clone()
    } else {
        matched.enrichable(column)
    };
    let source = registry.config().enrichment_source.as_str();

    let written = match action_type.effect() {
        ActionEffect::Assign | ActionEffect::SetText => target.update_all(column, &value, source)?,
        ActionEffect::Enrich => enrich(registry, action_type, &value, &target, source)?,
    };

    debug!(
        action_type = action_type.key(),
        written, ignore_locks, "action executed"
    );
    Ok(written)
}

fn enrich<C: Collection>(
    registry: &Registry<C>,
    action_type: &ActionType,
    directive: &Value,
    target: &C,
    source: &str,
) -> Result<usize, EngineError> {
    let provider = registry
        .provider()
        .ok_or_else(|| RuleError::EnrichmentUnavailable {
            action_type: action_type.key().to_owned(),
        })?;

    let records = target.records()?;
    if records.is_empty() {
        return Ok(0);
    }

    let request = EnrichmentRequest {
        action_type: action_type.key(),
        column: action_type.column(),
        directive,
        records: &records,
        options: action_type.options(),
    };
    let suggestions = provider.suggest(&request)?;

    let writes: Vec<(RecordId, Value)> = suggestions
        .into_iter()
        .filter_map(|s| {
            if action_type.accepts(&s.value) {
                Some((s.record, s.value))
            } else {
                debug!(
                    action_type = action_type.key(),
                    record = s.record.0,
                    value = %s.value,
                    "dropping suggestion outside the action's options"
                );
                None
            }
        })
        .collect();

    if writes.is_empty() {
        return Ok(0);
    }
    Ok(target.update_each(action_type.column(), &writes, source)?)
}
