//! The transaction domain: a family's ledger transactions and their entries.

use super::{Catalog, Domain, Vocabulary};
use crate::store::MemoryStore;
use crate::types::{
    ActionEffect, ActionType, Column, ConditionKind, ConditionType, NumericType, Operator,
    Predicate, Relation,
};

pub const BASE_TABLE: &str = "transactions";

/// Entry rows carry the transaction's display name, amount and date.
pub const ENTRIES: Relation = Relation::new("entries");

pub const NAME: Column = Column::new("entries", "name");
pub const AMOUNT: Column = Column::new("entries", "amount");
pub const DATE: Column = Column::new("entries", "date");
pub const MERCHANT: Column = Column::new("transactions", "merchant_id");
pub const CATEGORY: Column = Column::new("transactions", "category_id");
pub const EXCLUDED: Column = Column::new("transactions", "excluded");

pub(super) fn catalog(vocabulary: &Vocabulary) -> Catalog {
    let conditions = vec![
        ConditionType::new("transaction_name", "Name", ConditionKind::Text, NAME).joins(ENTRIES),
        ConditionType::new(
            "transaction_amount",
            "Amount",
            ConditionKind::Number(NumericType::Decimal),
            AMOUNT,
        )
        .joins(ENTRIES),
        ConditionType::new(
            "transaction_merchant",
            "Merchant",
            ConditionKind::Select,
            MERCHANT,
        )
        .with_options(vocabulary.merchants().to_vec()),
    ];

    let actions = vec![
        ActionType::new(
            "set_transaction_category",
            "Set category",
            ActionEffect::Assign,
            CATEGORY,
        )
        .with_options(vocabulary.categories().to_vec()),
        ActionType::new(
            "set_transaction_merchant",
            "Set merchant",
            ActionEffect::Assign,
            MERCHANT,
        )
        .with_options(vocabulary.merchants().to_vec()),
        ActionType::new("set_transaction_name", "Set name", ActionEffect::SetText, NAME),
        ActionType::new(
            "auto_categorize",
            "Auto-categorize",
            ActionEffect::Enrich,
            CATEGORY,
        )
        .with_options(vocabulary.categories().to_vec()),
        ActionType::new(
            "auto_detect_merchants",
            "Auto-detect merchants",
            ActionEffect::Enrich,
            MERCHANT,
        )
        .with_options(vocabulary.merchants().to_vec()),
    ];

    Catalog {
        domain: Domain::Transaction,
        scope: Predicate::compare(EXCLUDED, Operator::Eq, false),
        conditions,
        actions,
        effective_date: ConditionType::new("transaction_date", "Date", ConditionKind::Date, DATE)
            .joins(ENTRIES),
    }
}

/// An empty in-memory transaction table. Transactions are included unless
/// inserted with `excluded = true`.
#[must_use]
pub fn memory_store() -> MemoryStore {
    MemoryStore::new(BASE_TABLE).with_default(EXCLUDED, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Collection, OwnerId};
    use crate::types::{ActionKind, Value};

    fn vocabulary() -> Vocabulary {
        Vocabulary::new()
            .category("Dining", "c1")
            .category("Subscriptions", "c2")
            .merchant("Netflix", "m1")
    }

    #[test]
    fn condition_types_are_declared() {
        let catalog = catalog(&vocabulary());
        let keys: Vec<&str> = catalog.condition_types().iter().map(|c| c.key()).collect();
        assert_eq!(
            keys,
            vec!["transaction_name", "transaction_amount", "transaction_merchant"]
        );
    }

    #[test]
    fn merchant_condition_uses_vocabulary() {
        let catalog = catalog(&vocabulary());
        let merchant = catalog.condition_type("transaction_merchant").unwrap();
        assert_eq!(merchant.options().map(<[_]>::len), Some(1));
        assert_eq!(merchant.allowed_operators(), &[Operator::Eq]);
    }

    #[test]
    fn action_kinds() {
        let catalog = catalog(&vocabulary());
        let kind = |key: &str| catalog.action_type(key).unwrap().kind();
        assert_eq!(kind("set_transaction_category"), ActionKind::Selection);
        assert_eq!(kind("set_transaction_merchant"), ActionKind::Selection);
        assert_eq!(kind("set_transaction_name"), ActionKind::Function);
        assert_eq!(kind("auto_categorize"), ActionKind::Function);
        assert_eq!(kind("auto_detect_merchants"), ActionKind::Function);
    }

    #[test]
    fn scope_excludes_excluded_transactions() {
        let store = memory_store();
        store.insert(OwnerId(1), Vec::new());
        store.insert(OwnerId(1), vec![(EXCLUDED, Value::Bool(true))]);
        let scoped = store
            .collection(OwnerId(1))
            .restrict(catalog(&vocabulary()).scope().clone());
        assert_eq!(scoped.count().unwrap(), 1);
    }

    #[test]
    fn memory_store_defaults_to_included() {
        let store = memory_store();
        let id = store.insert(OwnerId(1), Vec::new());
        assert_eq!(store.get(id, EXCLUDED), Some(Value::Bool(false)));
    }
}
