use std::fmt::Write as _;

use super::column::Column;
use super::operator::Operator;
use super::value::Value;

/// A single restriction over a resource collection.
///
/// The evaluator folds a whole condition tree into one `Predicate` so that a
/// disjunction stays one clause instead of becoming chained restrictions.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// No restriction.
    All,
    /// `column <op> value`. Never constructed with [`Operator::Like`].
    Compare {
        column: Column,
        op: Operator,
        value: Value,
    },
    /// Case-insensitive pattern match. `pattern` is already escaped.
    Like { column: Column, pattern: String },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

/// A parametrized SQL boolean expression with numbered (`$n`) placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub clause: String,
    pub binds: Vec<Value>,
}

impl Predicate {
    #[must_use]
    pub fn compare(column: Column, op: Operator, value: impl Into<Value>) -> Self {
        debug_assert!(op != Operator::Like, "use Predicate::contains for like");
        Predicate::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    /// Substring match on `text`, taken literally: `%`, `_` and `\` in it are
    /// escaped before it is wrapped in wildcards.
    #[must_use]
    pub fn contains(column: Column, text: &str) -> Self {
        Predicate::Like {
            column,
            pattern: format!("%{}%", escape_like(text)),
        }
    }

    /// Conjunction. `All` operands drop out; a single operand is returned as is.
    #[must_use]
    pub fn and(predicates: Vec<Predicate>) -> Self {
        let mut parts: Vec<Predicate> = predicates
            .into_iter()
            .filter(|p| *p != Predicate::All)
            .collect();
        match parts.len() {
            0 => Predicate::All,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Disjunction. Any `All` operand makes the whole disjunction `All`.
    /// An empty disjunction matches nothing.
    #[must_use]
    pub fn or(mut predicates: Vec<Predicate>) -> Self {
        if predicates.contains(&Predicate::All) {
            return Predicate::All;
        }
        if predicates.len() == 1 {
            return predicates.remove(0);
        }
        Predicate::Or(predicates)
    }

    /// Every column this predicate reads, in first-seen order.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut Vec<Column>) {
        match self {
            Predicate::All => {}
            Predicate::Compare { column, .. } | Predicate::Like { column, .. } => {
                if !out.contains(column) {
                    out.push(*column);
                }
            }
            Predicate::And(parts) | Predicate::Or(parts) => {
                for part in parts {
                    part.collect_columns(out);
                }
            }
        }
    }

    /// Test one record. `lookup` yields the record's value for a column;
    /// a missing value never matches, as with SQL `NULL`.
    pub fn matches<'a, F>(&self, lookup: &F) -> bool
    where
        F: Fn(Column) -> Option<&'a Value>,
    {
        match self {
            Predicate::All => true,
            Predicate::Compare { column, op, value } => lookup(*column)
                .and_then(|actual| actual.compare(*op, value))
                .unwrap_or(false),
            Predicate::Like { column, pattern } => match lookup(*column) {
                Some(Value::String(text)) => like_matches(pattern, text),
                _ => false,
            },
            Predicate::And(parts) => parts.iter().all(|p| p.matches(lookup)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(lookup)),
        }
    }

    /// Render as a parametrized SQL expression. Values only ever appear as
    /// bind parameters; identifiers come from the catalog and are quoted.
    #[must_use]
    pub fn to_sql(&self) -> SqlFragment {
        let mut clause = String::new();
        let mut binds = Vec::new();
        self.write_sql(&mut clause, &mut binds);
        SqlFragment { clause, binds }
    }

    fn write_sql(&self, out: &mut String, binds: &mut Vec<Value>) {
        match self {
            Predicate::All => out.push_str("TRUE"),
            Predicate::Compare { column, op, value } => {
                binds.push(value.clone());
                let _ = write!(out, "{} {} ${}", quote_column(*column), op.key(), binds.len());
            }
            Predicate::Like { column, pattern } => {
                binds.push(Value::String(pattern.clone()));
                let _ = write!(
                    out,
                    "{} ILIKE ${} ESCAPE '\\'",
                    quote_column(*column),
                    binds.len()
                );
            }
            Predicate::And(parts) => write_joined(out, binds, parts, " AND ", "TRUE"),
            Predicate::Or(parts) => write_joined(out, binds, parts, " OR ", "FALSE"),
        }
    }
}

fn write_joined(
    out: &mut String,
    binds: &mut Vec<Value>,
    parts: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        out.push_str(empty);
        return;
    }
    out.push('(');
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        part.write_sql(out, binds);
    }
    out.push(')');
}

fn quote_column(column: Column) -> String {
    format!("{}.{}", quote_ident(column.table()), quote_ident(column.name()))
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape the `LIKE` metacharacters `\`, `%` and `_` with a backslash.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    AnyRun,
    AnyOne,
    Literal(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => tokens.push(Token::AnyRun),
            '_' => tokens.push(Token::AnyOne),
            '\\' => {
                let escaped = chars.next().unwrap_or('\\');
                tokens.extend(escaped.to_lowercase().map(Token::Literal));
            }
            other => tokens.extend(other.to_lowercase().map(Token::Literal)),
        }
    }
    tokens
}

/// `ILIKE` semantics: `%` matches any run, `_` any one character, `\` escapes,
/// comparison ignores case.
pub(crate) fn like_matches(pattern: &str, text: &str) -> bool {
    let tokens = tokenize(pattern);
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::Literal(c)) if *c == text[t] => {
                p += 1;
                t += 1;
                continue;
            }
            Some(Token::AnyOne) => {
                p += 1;
                t += 1;
                continue;
            }
            Some(Token::AnyRun) => {
                backtrack = Some((p, t));
                p += 1;
                continue;
            }
            _ => {}
        }
        match backtrack {
            Some((star, consumed)) => {
                p = star + 1;
                t = consumed + 1;
                backtrack = Some((star, consumed + 1));
            }
            None => return false,
        }
    }

    tokens[p..].iter().all(|tok| *tok == Token::AnyRun)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: Column = Column::new("entries", "name");
    const AMOUNT: Column = Column::new("entries", "amount");

    fn lookup_in<'a>(values: &'a [(Column, Value)]) -> impl Fn(Column) -> Option<&'a Value> + 'a {
        move |c| values.iter().find(|(col, _)| *col == c).map(|(_, v)| v)
    }

    #[test]
    fn escape_like_metacharacters() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\tmp"), "c:\\\\tmp");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn like_is_case_insensitive_substring() {
        assert!(like_matches("%netflix%", "NETFLIX.COM subscription"));
        assert!(!like_matches("%netflix%", "Hulu"));
    }

    #[test]
    fn like_wildcards() {
        assert!(like_matches("a_c", "abc"));
        assert!(!like_matches("a_c", "abbc"));
        assert!(like_matches("a%c", "abbbc"));
        assert!(like_matches("%", ""));
        assert!(!like_matches("_", ""));
    }

    #[test]
    fn escaped_percent_is_literal() {
        let pattern = format!("%{}%", escape_like("50%"));
        assert!(like_matches(&pattern, "Save 50% today"));
        assert!(!like_matches(&pattern, "Save 500 today"));
    }

    #[test]
    fn escaped_underscore_is_literal() {
        let pattern = format!("%{}%", escape_like("a_b"));
        assert!(like_matches(&pattern, "xa_bx"));
        assert!(!like_matches(&pattern, "xacbx"));
    }

    #[test]
    fn and_drops_all_and_unwraps_single() {
        let leaf = Predicate::compare(AMOUNT, Operator::Gt, 0_i64);
        assert_eq!(Predicate::and(vec![]), Predicate::All);
        assert_eq!(
            Predicate::and(vec![Predicate::All, leaf.clone()]),
            leaf.clone()
        );
        assert_eq!(
            Predicate::and(vec![leaf.clone(), leaf.clone()]),
            Predicate::And(vec![leaf.clone(), leaf])
        );
    }

    #[test]
    fn or_with_all_is_all() {
        let leaf = Predicate::compare(AMOUNT, Operator::Gt, 0_i64);
        assert_eq!(Predicate::or(vec![leaf, Predicate::All]), Predicate::All);
    }

    #[test]
    fn empty_or_matches_nothing() {
        let values = [(AMOUNT, Value::Float(1.0))];
        assert!(!Predicate::Or(vec![]).matches(&lookup_in(&values)));
    }

    #[test]
    fn matches_or_and_and() {
        let values = [(AMOUNT, Value::Float(-50.0)), (NAME, Value::from("Rent"))];
        let lookup = lookup_in(&values);
        let positive = Predicate::compare(AMOUNT, Operator::Gt, 0.0_f64);
        let rent = Predicate::contains(NAME, "rent");

        assert!(Predicate::or(vec![positive.clone(), rent.clone()]).matches(&lookup));
        assert!(!Predicate::and(vec![positive, rent]).matches(&lookup));
    }

    #[test]
    fn missing_column_never_matches() {
        let values: [(Column, Value); 0] = [];
        let p = Predicate::compare(AMOUNT, Operator::Lt, 0_i64);
        assert!(!p.matches(&lookup_in(&values)));
    }

    #[test]
    fn columns_deduplicated() {
        let p = Predicate::or(vec![
            Predicate::compare(AMOUNT, Operator::Gt, 1_i64),
            Predicate::and(vec![
                Predicate::compare(AMOUNT, Operator::Lt, 9_i64),
                Predicate::contains(NAME, "x"),
            ]),
        ]);
        assert_eq!(p.columns(), vec![AMOUNT, NAME]);
    }

    #[test]
    fn sql_uses_binds_and_single_disjunction() {
        let p = Predicate::and(vec![
            Predicate::compare(AMOUNT, Operator::Gt, 90_i64),
            Predicate::or(vec![
                Predicate::contains(NAME, "50%'; DROP TABLE entries; --"),
                Predicate::compare(AMOUNT, Operator::Lte, -10_i64),
            ]),
        ]);
        let sql = p.to_sql();
        assert_eq!(
            sql.clause,
            "(\"entries\".\"amount\" > $1 AND (\"entries\".\"name\" ILIKE $2 ESCAPE '\\' \
             OR \"entries\".\"amount\" <= $3))"
        );
        assert_eq!(sql.binds.len(), 3);
        assert_eq!(
            sql.binds[1],
            Value::String("%50\\%'; DROP TABLE entries; --%".into())
        );
    }

    #[test]
    fn sql_for_all_and_empty_or() {
        assert_eq!(Predicate::All.to_sql().clause, "TRUE");
        assert_eq!(Predicate::Or(vec![]).to_sql().clause, "FALSE");
    }
}
