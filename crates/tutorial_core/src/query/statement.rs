use super::field::QueryValue;
use super::page::PageRequest;
use super::predicate::Predicate;
use super::sort::Sort;

pub(crate) const TUTORIAL_COLUMNS: &str = "id, title, description, level, created_at, published";

/// SQL text plus its positional parameters, ready for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SqlStatement {
    pub sql: String,
    pub params: Vec<QueryValue>,
}

/// Structured query over tutorials.
///
/// Built only from whitelisted fields, so it can be reordered and paged
/// safely at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeQuery {
    predicate: Predicate,
    sort: Sort,
}

impl SafeQuery {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            sort: Sort::unsorted(),
        }
    }

    pub fn all() -> Self {
        Self::new(Predicate::all())
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// `SELECT` for this query. A page request replaces the query's own
    /// ordering when it carries one, and adds `LIMIT`/`OFFSET`.
    pub(crate) fn select_statement(&self, page: Option<&PageRequest>) -> SqlStatement {
        let mut statement = self.filtered(&format!("SELECT {TUTORIAL_COLUMNS} FROM tutorials"));

        let sort = match page {
            Some(request) if !request.sort().is_unsorted() => request.sort(),
            _ => &self.sort,
        };
        statement.sql.push_str(&sort.order_by_clause());

        if let Some(request) = page {
            statement.params.push(QueryValue::Integer(i64::from(request.size())));
            let limit_slot = statement.params.len();
            statement
                .params
                .push(QueryValue::Integer(request.offset() as i64));
            let offset_slot = statement.params.len();
            statement
                .sql
                .push_str(&format!(" LIMIT ?{limit_slot} OFFSET ?{offset_slot}"));
        }

        statement
    }

    pub(crate) fn count_statement(&self) -> SqlStatement {
        self.filtered("SELECT COUNT(*) FROM tutorials")
    }

    pub(crate) fn where_statement(&self) -> SqlStatement {
        self.filtered("")
    }

    fn filtered(&self, head: &str) -> SqlStatement {
        let mut sql = String::from(head);
        let mut params = Vec::new();
        sql.push_str(" WHERE ");
        self.predicate.render(&mut sql, &mut params);
        SqlStatement { sql, params }
    }
}

/// Parameters for a raw statement: all positional (`?1`) or all named
/// (`:name`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawParams {
    Positional(Vec<QueryValue>),
    Named(Vec<(String, QueryValue)>),
}

/// Native SQL statement against the `tutorials` table.
///
/// The text is opaque to this crate, so there is deliberately no way to
/// attach a `Sort` or a `PageRequest` to it. The statement must select the
/// tutorial columns (`id, title, description, level, created_at, published`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuery {
    sql: String,
    params: RawParams,
}

impl RawQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self::positional(sql, Vec::new())
    }

    pub fn positional(sql: impl Into<String>, params: Vec<QueryValue>) -> Self {
        Self {
            sql: sql.into(),
            params: RawParams::Positional(params),
        }
    }

    /// Names may be given with or without the leading `:`.
    pub fn named<N, V>(sql: impl Into<String>, params: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<QueryValue>,
    {
        let params = params
            .into_iter()
            .map(|(name, value)| {
                let name = name.into();
                let name = if name.starts_with(':') {
                    name
                } else {
                    format!(":{name}")
                };
                (name, value.into())
            })
            .collect();
        Self {
            sql: sql.into(),
            params: RawParams::Named(params),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &RawParams {
        &self.params
    }
}
