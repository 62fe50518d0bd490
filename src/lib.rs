//! A rule engine that classifies and updates ledger records.
//!
//! Rules pair a tree of typed conditions with an ordered list of actions.
//! Conditions are folded into one predicate over a lazily executed
//! [`Collection`]; actions then write into the matched records, skipping any
//! column a person has locked.
//!
//! ```
//! use ledger_rules::catalog::{Domain, Vocabulary, transaction};
//! use ledger_rules::store::OwnerId;
//! use ledger_rules::{Registry, Rule, Value, condition};
//!
//! let store = transaction::memory_store();
//! store.insert(OwnerId(1), vec![
//!     (transaction::MERCHANT, Value::from("netflix")),
//!     (transaction::AMOUNT, Value::Float(15.49)),
//! ]);
//!
//! let vocabulary = Vocabulary::new()
//!     .merchant("Netflix", "netflix")
//!     .category("Subscriptions", "subscriptions");
//! let registry = Registry::new(Domain::Transaction, store.collection(OwnerId(1)), &vocabulary);
//!
//! let rule = Rule::new(Domain::Transaction)
//!     .named("Streaming")
//!     .when(condition("transaction_merchant").eq("netflix"))
//!     .then("set_transaction_category", "subscriptions");
//!
//! let report = rule.apply(&registry).unwrap();
//! assert_eq!(report.matched(), 1);
//! ```

mod apply;
pub mod catalog;
mod compile;
mod config;
pub mod enrich;
mod error;
mod evaluate;
mod execute;
pub mod parse;
mod registry;
pub mod store;
mod types;

pub use apply::apply_all;
pub use config::{ConfigError, EngineConfig};
pub use error::EngineError;
pub use registry::{Registry, RegistryDescription};
pub use store::Collection;
pub use types::{
    Action, ActionEffect, ActionKind, ActionOutcome, ActionType, ActionTypeDescription,
    ApplyOptions, ApplyReport, BatchReport, COMPOUND_CONDITION_TYPE, Column, Condition,
    ConditionBuilder, ConditionKind, ConditionRow, ConditionType, ConditionTypeDescription,
    LogicalOp, NumericType, Operator, OperatorDescription, Predicate, Relation, Rule, RuleError,
    SelectOption, SkippedRule, SqlFragment, Value, all, any, condition, conditions_from_rows,
    conditions_to_rows, escape_like,
};
