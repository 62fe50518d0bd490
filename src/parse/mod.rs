//! A small text format for authoring rules.
//!
//! ```text
//! rule "Streaming" (effective 2024-01-01):
//!     when transaction_merchant = "netflix" and transaction_amount > 0
//!     then set_transaction_category "subscriptions"
//! ```
//!
//! `AND` binds tighter than `OR`, parentheses group, `#` starts a comment.
//! Parsing only checks syntax; type keys and values are checked against a
//! registry by [`Rule::validate`](crate::Rule::validate).

mod error;
mod grammar;

use crate::{EngineError, Rule};

pub use error::ParseError;

/// Parse every rule in `input`.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid rule syntax.
pub fn parse(input: &str) -> Result<Vec<Rule>, ParseError> {
    use winnow::Parser;
    grammar::parse_rules
        .parse(input)
        .map_err(|e| ParseError::at(input, e.offset(), e.inner().to_string()))
}

/// Read and parse a rule file.
///
/// # Errors
///
/// Returns [`EngineError`] on I/O or parse failure.
pub fn parse_file(path: impl AsRef<std::path::Path>) -> Result<Vec<Rule>, EngineError> {
    let input = std::fs::read_to_string(path)?;
    Ok(parse(&input)?)
}
