use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::error::RuleError;
use super::value::Value;

/// `condition_type` of a compound row in flat storage.
pub const COMPOUND_CONDITION_TYPE: &str = "compound";

/// One condition as persisted: a flat row pointing at its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionRow {
    pub id: u64,
    pub parent_id: Option<u64>,
    /// Order among siblings.
    pub position: u64,
    pub condition_type: String,
    pub operator: String,
    pub value: Option<Value>,
}

/// Rebuild the condition forest from flat rows.
///
/// Roots are the rows without a parent; siblings are ordered by `position`,
/// then `id`. The tree is built once here so evaluation never walks parent
/// pointers.
///
/// # Errors
///
/// [`RuleError::DuplicateConditionId`] when two rows share an id,
/// [`RuleError::OrphanedCondition`] for a row whose parent is missing or is a
/// leaf, [`RuleError::CyclicCondition`] for rows whose parent chain loops, and
/// [`RuleError::InvalidConditionValue`] for a leaf row without a value.
pub fn conditions_from_rows(rows: &[ConditionRow]) -> Result<Vec<Condition>, RuleError> {
    let mut by_id: HashMap<u64, &ConditionRow> = HashMap::with_capacity(rows.len());
    for row in rows {
        if by_id.insert(row.id, row).is_some() {
            return Err(RuleError::DuplicateConditionId { id: row.id });
        }
    }

    let mut children: HashMap<Option<u64>, Vec<&ConditionRow>> = HashMap::new();
    for row in rows {
        if let Some(parent) = row.parent_id {
            match by_id.get(&parent) {
                Some(p) if p.condition_type == COMPOUND_CONDITION_TYPE => {}
                _ => return Err(RuleError::OrphanedCondition { id: row.id }),
            }
        }
        children.entry(row.parent_id).or_default().push(row);
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|r| (r.position, r.id));
    }

    let mut visited = HashSet::new();
    let roots = children.get(&None).cloned().unwrap_or_default();
    let forest = roots
        .into_iter()
        .map(|row| build_node(row, &children, &by_id, &mut visited))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(stray) = rows.iter().find(|r| !visited.contains(&r.id)) {
        return Err(RuleError::CyclicCondition {
            path: parent_cycle(stray, &by_id),
        });
    }

    Ok(forest)
}

fn build_node(
    row: &ConditionRow,
    children: &HashMap<Option<u64>, Vec<&ConditionRow>>,
    by_id: &HashMap<u64, &ConditionRow>,
    visited: &mut HashSet<u64>,
) -> Result<Condition, RuleError> {
    if !visited.insert(row.id) {
        return Err(RuleError::CyclicCondition {
            path: parent_cycle(row, by_id),
        });
    }

    if row.condition_type == COMPOUND_CONDITION_TYPE {
        let kids = children
            .get(&Some(row.id))
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|child| build_node(child, children, by_id, visited))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Condition::Compound {
            operator: row.operator.clone(),
            children: kids,
        });
    }

    let value = row
        .value
        .clone()
        .ok_or_else(|| RuleError::InvalidConditionValue {
            condition_type: row.condition_type.clone(),
            value: "null".to_owned(),
            reason: "a value is required".to_owned(),
        })?;
    Ok(Condition::Leaf {
        condition_type: row.condition_type.clone(),
        operator: row.operator.clone(),
        value,
    })
}

/// Follow parent pointers from `start` until an id repeats; returns the loop
/// with its first id repeated at the end.
fn parent_cycle(start: &ConditionRow, by_id: &HashMap<u64, &ConditionRow>) -> Vec<u64> {
    let mut chain: Vec<u64> = Vec::new();
    let mut current = Some(start);
    while let Some(row) = current {
        if let Some(pos) = chain.iter().position(|&id| id == row.id) {
            let mut cycle = chain[pos..].to_vec();
            cycle.push(row.id);
            return cycle;
        }
        chain.push(row.id);
        current = row.parent_id.and_then(|p| by_id.get(&p).copied());
    }
    chain
}

/// Flatten a condition forest into rows. Ids are assigned depth-first from 1.
#[must_use]
pub fn conditions_to_rows(conditions: &[Condition]) -> Vec<ConditionRow> {
    let mut rows = Vec::new();
    let mut next_id = 1;
    for (position, condition) in (0_u64..).zip(conditions) {
        flatten(condition, None, position, &mut next_id, &mut rows);
    }
    rows
}

fn flatten(
    condition: &Condition,
    parent_id: Option<u64>,
    position: u64,
    next_id: &mut u64,
    rows: &mut Vec<ConditionRow>,
) {
    let id = *next_id;
    *next_id += 1;
    match condition {
        Condition::Leaf {
            condition_type,
            operator,
            value,
        } => rows.push(ConditionRow {
            id,
            parent_id,
            position,
            condition_type: condition_type.clone(),
            operator: operator.clone(),
            value: Some(value.clone()),
        }),
        Condition::Compound { operator, children } => {
            rows.push(ConditionRow {
                id,
                parent_id,
                position,
                condition_type: COMPOUND_CONDITION_TYPE.to_owned(),
                operator: operator.clone(),
                value: None,
            });
            for (i, child) in (0_u64..).zip(children) {
                flatten(child, Some(id), i, next_id, rows);
            }
        }
    }
}
