mod column;
mod condition;
mod descriptor;
mod error;
mod operator;
mod predicate;
mod report;
mod rows;
mod rule;
mod value;

pub use column::{Column, Relation};
pub use condition::{Condition, ConditionBuilder, all, any, condition};
pub use descriptor::{
    ActionEffect, ActionKind, ActionType, ActionTypeDescription, ConditionKind, ConditionType,
    ConditionTypeDescription, OperatorDescription, SelectOption,
};
pub use error::RuleError;
pub use operator::{LogicalOp, Operator};
pub use predicate::{Predicate, SqlFragment, escape_like};
pub use report::{ActionOutcome, ApplyReport, BatchReport, SkippedRule};
pub use rows::{COMPOUND_CONDITION_TYPE, ConditionRow, conditions_from_rows, conditions_to_rows};
pub use rule::{Action, ApplyOptions, Rule};
pub use value::{NumericType, Value};
