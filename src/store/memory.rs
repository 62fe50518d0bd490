use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use super::{Collection, OwnerId, RecordId, RecordSnapshot, StoreError};
use crate::types::{Column, Predicate, Relation, Value};

/// Errors raised by [`MemoryCollection`] when a query is executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryStoreError {
    #[error("column '{column}' needs relation '{relation}', which was not joined")]
    MissingJoin { column: Column, relation: Relation },
}

/// One write performed through a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub record: RecordId,
    pub column: Column,
    pub value: Value,
    pub source: String,
}

#[derive(Debug, Clone)]
struct Row {
    id: RecordId,
    owner: OwnerId,
    values: BTreeMap<Column, Value>,
    locked: BTreeSet<Column>,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: u64,
    defaults: BTreeMap<Column, Value>,
    enrichments: Vec<Enrichment>,
}

/// In-memory record table with per-record attribute locks.
///
/// Cloning shares the table. Columns of joined relations are stored flat on
/// each row, but reading them through a collection still requires the join.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    base_table: &'static str,
    table: Arc<RwLock<Table>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(base_table: &'static str) -> Self {
        Self {
            base_table,
            table: Arc::new(RwLock::new(Table::default())),
        }
    }

    /// Value `column` takes on records inserted without one.
    #[must_use]
    pub fn with_default(self, column: Column, value: impl Into<Value>) -> Self {
        write(&self.table).defaults.insert(column, value.into());
        self
    }

    /// Insert a record owned by `owner`.
    pub fn insert(
        &self,
        owner: OwnerId,
        values: impl IntoIterator<Item = (Column, Value)>,
    ) -> RecordId {
        let mut table = write(&self.table);
        table.next_id += 1;
        let id = RecordId(table.next_id);
        let mut row_values = table.defaults.clone();
        row_values.extend(values);
        table.rows.push(Row {
            id,
            owner,
            values: row_values,
            locked: BTreeSet::new(),
        });
        id
    }

    /// Lock `column` on a record, as an explicit user edit does.
    /// Returns `false` if the record does not exist.
    pub fn lock_attribute(&self, id: RecordId, column: Column) -> bool {
        self.with_row(id, |row| {
            row.locked.insert(column);
        })
    }

    /// Returns `false` if the record does not exist.
    pub fn unlock_attribute(&self, id: RecordId, column: Column) -> bool {
        self.with_row(id, |row| {
            row.locked.remove(&column);
        })
    }

    #[must_use]
    pub fn is_locked(&self, id: RecordId, column: Column) -> bool {
        read(&self.table)
            .rows
            .iter()
            .any(|row| row.id == id && row.locked.contains(&column))
    }

    #[must_use]
    pub fn get(&self, id: RecordId, column: Column) -> Option<Value> {
        read(&self.table)
            .rows
            .iter()
            .find(|row| row.id == id)
            .and_then(|row| row.values.get(&column).cloned())
    }

    /// Every write made through collections of this store, oldest first.
    #[must_use]
    pub fn enrichments(&self) -> Vec<Enrichment> {
        read(&self.table).enrichments.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.table).rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records of `owner`, unrestricted.
    #[must_use]
    pub fn collection(&self, owner: OwnerId) -> MemoryCollection {
        MemoryCollection {
            base_table: self.base_table,
            table: Arc::clone(&self.table),
            owner,
            joins: BTreeSet::new(),
            filters: Vec::new(),
        }
    }

    fn with_row(&self, id: RecordId, f: impl FnOnce(&mut Row)) -> bool {
        let mut table = write(&self.table);
        match table.rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                f(row);
                true
            }
            None => false,
        }
    }
}

fn read(table: &RwLock<Table>) -> RwLockReadGuard<'_, Table> {
    table.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(table: &RwLock<Table>) -> RwLockWriteGuard<'_, Table> {
    table.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
enum Filter {
    Restrict(Predicate),
    Unlocked(Column),
    Pinned(BTreeSet<RecordId>),
}

/// A lazily executed query over a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    base_table: &'static str,
    table: Arc<RwLock<Table>>,
    owner: OwnerId,
    joins: BTreeSet<Relation>,
    filters: Vec<Filter>,
}

impl MemoryCollection {
    /// Joined relations, in name order.
    #[must_use]
    pub fn joins(&self) -> Vec<Relation> {
        self.joins.iter().copied().collect()
    }

    /// Predicates applied so far, in application order.
    #[must_use]
    pub fn restrictions(&self) -> Vec<&Predicate> {
        self.filters
            .iter()
            .filter_map(|f| match f {
                Filter::Restrict(p) => Some(p),
                Filter::Unlocked(_) | Filter::Pinned(_) => None,
            })
            .collect()
    }

    fn check_joins(&self) -> Result<(), StoreError> {
        for filter in &self.filters {
            if let Filter::Restrict(predicate) = filter {
                for column in predicate.columns() {
                    if let Some(relation) = column.relation_from(self.base_table)
                        && !self.joins.contains(&relation)
                    {
                        return Err(StoreError::new(MemoryStoreError::MissingJoin {
                            column,
                            relation,
                        }));
                    }
                }
            }
        }
        Ok(())
    }

    fn selects(&self, row: &Row) -> bool {
        row.owner == self.owner
            && self.filters.iter().all(|filter| match filter {
                Filter::Restrict(predicate) => predicate.matches(&|c| row.values.get(&c)),
                Filter::Unlocked(column) => !row.locked.contains(column),
                Filter::Pinned(ids) => ids.contains(&row.id),
            })
    }

    fn with_filter(&self, filter: Filter) -> Self {
        let mut next = self.clone();
        next.filters.push(filter);
        next
    }
}

impl Collection for MemoryCollection {
    fn join(&self, relation: Relation) -> Self {
        let mut next = self.clone();
        next.joins.insert(relation);
        next
    }

    fn restrict(&self, predicate: Predicate) -> Self {
        self.with_filter(Filter::Restrict(predicate))
    }

    fn enrichable(&self, column: Column) -> Self {
        self.with_filter(Filter::Unlocked(column))
    }

    fn pin(&self) -> Result<Self, StoreError> {
        self.check_joins()?;
        let ids = read(&self.table)
            .rows
            .iter()
            .filter(|row| self.selects(row))
            .map(|row| row.id)
            .collect();
        let mut pinned = self.clone();
        pinned.filters = vec![Filter::Pinned(ids)];
        Ok(pinned)
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.check_joins()?;
        let table = read(&self.table);
        Ok(table.rows.iter().filter(|row| self.selects(row)).count())
    }

    fn records(&self) -> Result<Vec<RecordSnapshot>, StoreError> {
        self.check_joins()?;
        let table = read(&self.table);
        Ok(table
            .rows
            .iter()
            .filter(|row| self.selects(row))
            .map(|row| RecordSnapshot {
                id: row.id,
                values: row.values.clone(),
            })
            .collect())
    }

    fn update_all(&self, column: Column, value: &Value, source: &str) -> Result<usize, StoreError> {
        self.check_joins()?;
        let mut guard = write(&self.table);
        let table = &mut *guard;
        let mut written = 0;
        for row in table.rows.iter_mut() {
            if !self.selects(row) {
                continue;
            }
            row.values.insert(column, value.clone());
            table.enrichments.push(Enrichment {
                record: row.id,
                column,
                value: value.clone(),
                source: source.to_owned(),
            });
            written += 1;
        }
        Ok(written)
    }

    fn update_each(
        &self,
        column: Column,
        writes: &[(RecordId, Value)],
        source: &str,
    ) -> Result<usize, StoreError> {
        self.check_joins()?;
        let wanted: HashMap<RecordId, &Value> = writes.iter().map(|(id, v)| (*id, v)).collect();
        let mut guard = write(&self.table);
        let table = &mut *guard;
        let mut written = 0;
        for row in table.rows.iter_mut() {
            let Some(value) = wanted.get(&row.id) else {
                continue;
            };
            if !self.selects(row) {
                continue;
            }
            row.values.insert(column, (*value).clone());
            table.enrichments.push(Enrichment {
                record: row.id,
                column,
                value: (*value).clone(),
                source: source.to_owned(),
            });
            written += 1;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operator;

    const AMOUNT: Column = Column::new("entries", "amount");
    const CATEGORY: Column = Column::new("transactions", "category_id");
    const ENTRIES: Relation = Relation::new("entries");

    fn store() -> (MemoryStore, RecordId, RecordId) {
        let store = MemoryStore::new("transactions");
        let a = store.insert(OwnerId(1), [(AMOUNT, Value::Float(10.0))]);
        let b = store.insert(OwnerId(1), [(AMOUNT, Value::Float(-5.0))]);
        store.insert(OwnerId(2), [(AMOUNT, Value::Float(99.0))]);
        (store, a, b)
    }

    #[test]
    fn collection_is_owner_scoped() {
        let (store, _, _) = store();
        assert_eq!(store.collection(OwnerId(1)).count().unwrap(), 2);
        assert_eq!(store.collection(OwnerId(2)).count().unwrap(), 1);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn composition_is_lazy_and_non_mutating() {
        let (store, _, _) = store();
        let base = store.collection(OwnerId(1));
        let narrowed = base
            .join(ENTRIES)
            .restrict(Predicate::compare(AMOUNT, Operator::Gt, 0_i64));
        assert_eq!(narrowed.count().unwrap(), 1);
        assert_eq!(base.count().unwrap(), 2);
        assert!(base.restrictions().is_empty());
    }

    #[test]
    fn join_is_idempotent() {
        let (store, _, _) = store();
        let joined = store.collection(OwnerId(1)).join(ENTRIES).join(ENTRIES);
        assert_eq!(joined.joins(), vec![ENTRIES]);
    }

    #[test]
    fn restricting_without_join_fails_on_execution() {
        let (store, _, _) = store();
        let missing = store
            .collection(OwnerId(1))
            .restrict(Predicate::compare(AMOUNT, Operator::Gt, 0_i64));
        let err = missing.count().unwrap_err();
        assert_eq!(
            err.downcast_ref::<MemoryStoreError>(),
            Some(&MemoryStoreError::MissingJoin {
                column: AMOUNT,
                relation: ENTRIES
            })
        );
    }

    #[test]
    fn enrichable_skips_locked_rows() {
        let (store, a, b) = store();
        assert!(store.lock_attribute(a, CATEGORY));
        let written = store
            .collection(OwnerId(1))
            .enrichable(CATEGORY)
            .update_all(CATEGORY, &Value::from("c1"), "rule")
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.get(a, CATEGORY), None);
        assert_eq!(store.get(b, CATEGORY), Some(Value::from("c1")));
        assert_eq!(store.enrichments().len(), 1);
        assert_eq!(store.enrichments()[0].source, "rule");
    }

    #[test]
    fn update_each_ignores_ids_outside_collection() {
        let (store, a, _) = store();
        let positive = store
            .collection(OwnerId(1))
            .join(ENTRIES)
            .restrict(Predicate::compare(AMOUNT, Operator::Gt, 0_i64));
        let outsider = RecordId(3);
        let written = positive
            .update_each(
                CATEGORY,
                &[(a, Value::from("c1")), (outsider, Value::from("c2"))],
                "ai",
            )
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.get(outsider, CATEGORY), None);
    }

    #[test]
    fn defaults_fill_missing_columns() {
        let excluded = Column::new("transactions", "excluded");
        let store = MemoryStore::new("transactions").with_default(excluded, false);
        let a = store.insert(OwnerId(1), Vec::new());
        let b = store.insert(OwnerId(1), [(excluded, Value::Bool(true))]);
        assert_eq!(store.get(a, excluded), Some(Value::Bool(false)));
        assert_eq!(store.get(b, excluded), Some(Value::Bool(true)));
    }

    #[test]
    fn pinned_membership_ignores_later_writes() {
        let (store, a, b) = store();
        let positive = store
            .collection(OwnerId(1))
            .join(ENTRIES)
            .restrict(Predicate::compare(AMOUNT, Operator::Gt, 0_i64));
        let pinned = positive.pin().unwrap();
        positive
            .update_all(AMOUNT, &Value::Float(-1.0), "rule")
            .unwrap();
        assert_eq!(positive.count().unwrap(), 0);
        assert_eq!(pinned.count().unwrap(), 1);
        let ids: Vec<RecordId> = pinned.records().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a]);
        assert_eq!(store.get(b, AMOUNT), Some(Value::Float(-5.0)));
    }

    #[test]
    fn lock_unknown_record() {
        let (store, _, _) = store();
        assert!(!store.lock_attribute(RecordId(42), CATEGORY));
        assert!(!store.is_locked(RecordId(42), CATEGORY));
    }

    #[test]
    fn unlock_restores_enrichability() {
        let (store, a, _) = store();
        store.lock_attribute(a, CATEGORY);
        assert!(store.is_locked(a, CATEGORY));
        store.unlock_attribute(a, CATEGORY);
        assert!(!store.is_locked(a, CATEGORY));
    }
}
