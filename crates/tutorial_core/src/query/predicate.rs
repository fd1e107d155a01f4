use super::field::{QueryValue, TutorialField, ValueKind};
use super::{QueryError, QueryResult};
use std::cmp::Ordering;

/// Case handling for substring matches. Folding is ASCII-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMatch {
    Sensitive,
    Insensitive,
}

/// Type-checked filter over tutorial fields.
///
/// Only constructible through the checked builders below, so a predicate that
/// exists always binds values of the right kind to its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate(Node);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    All,
    Eq(TutorialField, QueryValue),
    Gte(TutorialField, QueryValue),
    Between(TutorialField, QueryValue, QueryValue),
    Contains(TutorialField, String, CaseMatch),
    And(Vec<Node>),
    Or(Vec<Node>),
}

impl Predicate {
    /// Matches every row.
    pub fn all() -> Self {
        Self(Node::All)
    }

    pub fn equals(field: TutorialField, value: impl Into<QueryValue>) -> QueryResult<Self> {
        let value = value.into();
        check_kind(field, &value)?;
        Ok(Self(Node::Eq(field, value)))
    }

    pub fn gte(field: TutorialField, value: impl Into<QueryValue>) -> QueryResult<Self> {
        let value = value.into();
        check_ordered(field)?;
        check_kind(field, &value)?;
        Ok(Self(Node::Gte(field, value)))
    }

    /// Inclusive range `start <= field <= end`.
    ///
    /// # Errors
    /// `QueryError::InvalidRange` when `start > end`.
    pub fn between(
        field: TutorialField,
        start: impl Into<QueryValue>,
        end: impl Into<QueryValue>,
    ) -> QueryResult<Self> {
        let start = start.into();
        let end = end.into();
        check_ordered(field)?;
        check_kind(field, &start)?;
        check_kind(field, &end)?;
        if compare(&start, &end) == Ordering::Greater {
            return Err(QueryError::InvalidRange { field, start, end });
        }
        Ok(Self(Node::Between(field, start, end)))
    }

    /// Literal substring match. `%` and `_` in `needle` carry no meaning.
    pub fn contains(
        field: TutorialField,
        needle: impl Into<String>,
        case: CaseMatch,
    ) -> QueryResult<Self> {
        if field.kind() != ValueKind::Text {
            return Err(QueryError::InvalidQuery(format!(
                "substring match requires a text field, got `{}`",
                field.name()
            )));
        }
        Ok(Self(Node::Contains(field, needle.into(), case)))
    }

    /// Conjunction. An empty conjunction matches every row.
    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Self {
        Self(Node::And(parts.into_iter().map(|part| part.0).collect()))
    }

    /// Disjunction. An empty disjunction matches nothing.
    pub fn or(parts: impl IntoIterator<Item = Predicate>) -> Self {
        Self(Node::Or(parts.into_iter().map(|part| part.0).collect()))
    }

    /// Appends this predicate as a SQL boolean expression with numbered
    /// positional parameters continuing after `params`.
    pub(crate) fn render(&self, sql: &mut String, params: &mut Vec<QueryValue>) {
        self.0.render(sql, params);
    }
}

impl Node {
    fn render(&self, sql: &mut String, params: &mut Vec<QueryValue>) {
        match self {
            Self::All => sql.push_str("1 = 1"),
            Self::Eq(field, value) => {
                let slot = bind(params, value.clone());
                sql.push_str(&format!("{} = ?{slot}", field.column()));
            }
            Self::Gte(field, value) => {
                let slot = bind(params, value.clone());
                sql.push_str(&format!("{} >= ?{slot}", field.column()));
            }
            Self::Between(field, start, end) => {
                let low = bind(params, start.clone());
                let high = bind(params, end.clone());
                sql.push_str(&format!("{} BETWEEN ?{low} AND ?{high}", field.column()));
            }
            Self::Contains(_, needle, _) if needle.is_empty() => sql.push_str("1 = 1"),
            Self::Contains(field, needle, CaseMatch::Sensitive) => {
                let slot = bind(params, QueryValue::Text(needle.clone()));
                sql.push_str(&format!("instr({}, ?{slot}) > 0", field.column()));
            }
            Self::Contains(field, needle, CaseMatch::Insensitive) => {
                let slot = bind(params, QueryValue::Text(needle.clone()));
                sql.push_str(&format!(
                    "instr(lower({}), lower(?{slot})) > 0",
                    field.column()
                ));
            }
            Self::And(parts) => render_group(parts, " AND ", "1 = 1", sql, params),
            Self::Or(parts) => render_group(parts, " OR ", "1 = 0", sql, params),
        }
    }
}

fn render_group(
    parts: &[Node],
    joiner: &str,
    empty: &str,
    sql: &mut String,
    params: &mut Vec<QueryValue>,
) {
    if parts.is_empty() {
        sql.push_str(empty);
        return;
    }
    sql.push('(');
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            sql.push_str(joiner);
        }
        part.render(sql, params);
    }
    sql.push(')');
}

fn bind(params: &mut Vec<QueryValue>, value: QueryValue) -> usize {
    params.push(value);
    params.len()
}

fn check_kind(field: TutorialField, value: &QueryValue) -> QueryResult<()> {
    if field.kind() == value.kind() {
        return Ok(());
    }
    Err(QueryError::InvalidQuery(format!(
        "value {value} does not match the type of field `{}`",
        field.name()
    )))
}

fn check_ordered(field: TutorialField) -> QueryResult<()> {
    if field.kind() == ValueKind::Bool {
        return Err(QueryError::InvalidQuery(format!(
            "field `{}` does not support range comparison",
            field.name()
        )));
    }
    Ok(())
}

fn compare(left: &QueryValue, right: &QueryValue) -> Ordering {
    match (left, right) {
        (QueryValue::Integer(a), QueryValue::Integer(b)) => a.cmp(b),
        (QueryValue::Text(a), QueryValue::Text(b)) => a.cmp(b),
        (QueryValue::Bool(a), QueryValue::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
