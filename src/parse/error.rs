use thiserror::Error;

/// A syntax error in rule text, with the 1-based position it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    message: String,
    line: usize,
    column: usize,
}

impl ParseError {
    /// Locate byte `offset` of `input` and attach `message`.
    pub(crate) fn at(input: &str, offset: usize, message: impl Into<String>) -> Self {
        let consumed = input.get(..offset).unwrap_or(input);
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count())
            + 1;
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_of_offset() {
        let input = "rule r:\n  when x ! 1";
        let err = ParseError::at(input, 17, "expected operator");
        assert_eq!((err.line(), err.column()), (2, 10));
        assert_eq!(
            err.to_string(),
            "parse error at line 2, column 10: expected operator"
        );
    }

    #[test]
    fn offset_at_start() {
        let err = ParseError::at("x", 0, "expected rule");
        assert_eq!((err.line(), err.column()), (1, 1));
        assert_eq!(err.message(), "expected rule");
    }
}
