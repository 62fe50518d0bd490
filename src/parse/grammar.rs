use chrono::NaiveDate;
use winnow::ascii::{dec_int, till_line_ending};
use winnow::combinator::{
    alt, cut_err, delimited, not, opt, preceded, repeat, separated, terminated,
};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::catalog::Domain;
use crate::types::{Action, Condition, Operator, Rule, Value, all, any as any_of};

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers & keywords -------------------------------------------------

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

/// `word` not followed by another identifier character, so `order` is never
/// read as `or` + `der`.
fn keyword<'i>(word: &'static str) -> impl Parser<&'i str, &'i str, ErrMode<ContextError>> {
    terminated(word, not(one_of(is_ident_char)))
}

// -- Values -----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn date_literal(input: &mut &str) -> ModalResult<NaiveDate> {
    (
        take_while(4, |c: char| c.is_ascii_digit()),
        '-',
        take_while(2, |c: char| c.is_ascii_digit()),
        '-',
        take_while(2, |c: char| c.is_ascii_digit()),
    )
        .take()
        .try_map(|s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .parse_next(input)
}

fn decimal_literal(input: &mut &str) -> ModalResult<f64> {
    (
        opt('-'),
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

fn value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        string_literal.map(Value::String),
        date_literal.map(Value::Date),
        keyword("true").value(Value::Bool(true)),
        keyword("false").value(Value::Bool(false)),
        decimal_literal.map(Value::Float),
        dec_int::<_, i64, _>.map(Value::Int),
    ))
    .context(StrContext::Expected(StrContextValue::Description("value")))
    .parse_next(input)
}

// -- Comparison operators ---------------------------------------------------

fn compare_op(input: &mut &str) -> ModalResult<Operator> {
    ws.parse_next(input)?;
    alt((
        alt((keyword("like"), keyword("LIKE"))).value(Operator::Like),
        ">=".value(Operator::Gte),
        ">".value(Operator::Gt),
        "<=".value(Operator::Lte),
        "<".value(Operator::Lt),
        "=".value(Operator::Eq),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "operator",
    )))
    .parse_next(input)
}

// -- Conditions (precedence: OR < AND < primary) ----------------------------

fn leaf(input: &mut &str) -> ModalResult<Condition> {
    let condition_type = ident.parse_next(input)?;
    let op = cut_err(compare_op).parse_next(input)?;
    let value = cut_err(value).parse_next(input)?;
    Ok(Condition::Leaf {
        condition_type: condition_type.to_owned(),
        operator: op.key().to_owned(),
        value,
    })
}

fn primary(input: &mut &str) -> ModalResult<Condition> {
    ws.parse_next(input)?;
    alt((delimited('(', condition, (ws, cut_err(')'))), leaf))
        .context(StrContext::Expected(StrContextValue::Description(
            "condition",
        )))
        .parse_next(input)
}

fn and_condition(input: &mut &str) -> ModalResult<Condition> {
    let first = primary(input)?;
    let rest: Vec<Condition> = repeat(
        0..,
        preceded((ws, alt((keyword("AND"), keyword("and")))), cut_err(primary)),
    )
    .parse_next(input)?;
    Ok(group(first, rest, all))
}

fn or_condition(input: &mut &str) -> ModalResult<Condition> {
    let first = and_condition(input)?;
    let rest: Vec<Condition> = repeat(
        0..,
        preceded((ws, alt((keyword("OR"), keyword("or")))), cut_err(and_condition)),
    )
    .parse_next(input)?;
    Ok(group(first, rest, any_of))
}

fn group(
    first: Condition,
    rest: Vec<Condition>,
    combine: fn(Vec<Condition>) -> Condition,
) -> Condition {
    if rest.is_empty() {
        return first;
    }
    let mut children = Vec::with_capacity(rest.len() + 1);
    children.push(first);
    children.extend(rest);
    combine(children)
}

fn condition(input: &mut &str) -> ModalResult<Condition> {
    ws.parse_next(input)?;
    or_condition(input)
}

// -- Actions ----------------------------------------------------------------

fn action(input: &mut &str) -> ModalResult<Action> {
    ws.parse_next(input)?;
    let action_type = ident
        .context(StrContext::Expected(StrContextValue::Description(
            "action type",
        )))
        .parse_next(input)?;
    let value = cut_err(value).parse_next(input)?;
    Ok(Action::new(action_type, value))
}

// -- Rule definitions -------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum RuleOption {
    Effective(NaiveDate),
    Inactive,
}

fn rule_option(input: &mut &str) -> ModalResult<RuleOption> {
    ws.parse_next(input)?;
    alt((
        preceded((keyword("effective"), ws), cut_err(date_literal)).map(RuleOption::Effective),
        keyword("inactive").value(RuleOption::Inactive),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "rule option",
    )))
    .parse_next(input)
}

fn rule_options(input: &mut &str) -> ModalResult<Vec<RuleOption>> {
    delimited(
        (ws, '('),
        cut_err(separated(1.., rule_option, (ws, ','))),
        (ws, cut_err(')')),
    )
    .parse_next(input)
}

fn rule_def(input: &mut &str) -> ModalResult<Rule> {
    ws.parse_next(input)?;
    keyword("rule").parse_next(input)?;
    ws.parse_next(input)?;

    let name = cut_err(alt((string_literal, ident.map(str::to_owned))))
        .context(StrContext::Expected(StrContextValue::Description(
            "rule name",
        )))
        .parse_next(input)?;

    let options = opt(rule_options).parse_next(input)?.unwrap_or_default();

    ws.parse_next(input)?;
    cut_err(':').parse_next(input)?;

    let when = opt(preceded((ws, keyword("when")), cut_err(condition))).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err(keyword("then"))
        .context(StrContext::Expected(StrContextValue::StringLiteral("then")))
        .parse_next(input)?;
    let actions: Vec<Action> =
        cut_err(separated(1.., action, (ws, ','))).parse_next(input)?;

    let mut rule = Rule::new(Domain::Transaction).named(&name);
    rule.conditions.extend(when);
    rule.actions = actions;
    for option in options {
        match option {
            RuleOption::Effective(date) => rule.effective_date = Some(date),
            RuleOption::Inactive => rule.active = false,
        }
    }
    Ok(rule)
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_rules(input: &mut &str) -> ModalResult<Vec<Rule>> {
    let rules: Vec<Rule> = repeat(0.., rule_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(rules)
}
