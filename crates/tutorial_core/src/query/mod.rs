//! Structured query model for tutorial lookups.
//!
//! # Responsibility
//! - Describe filters, ordering and paging in terms of whitelisted
//!   `TutorialField`s instead of SQL text.
//! - Keep free-form statements (`RawQuery`) separate from composable ones
//!   (`SafeQuery`); only the latter accepts a sort or a page request.
//!
//! # Invariants
//! - Column names in generated SQL come only from `TutorialField::column`.
//! - Caller-provided values are always bound as parameters.
//! - Range bounds are checked when the predicate is built, before any I/O.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod field;
mod page;
mod predicate;
mod sort;
mod statement;

pub use field::{QueryValue, TutorialField};
pub use page::{Page, PageRequest};
pub use predicate::{CaseMatch, Predicate};
pub use sort::{Direction, Order, Sort};
pub use statement::{RawParams, RawQuery, SafeQuery};

pub(crate) use statement::{SqlStatement, TUTORIAL_COLUMNS};

pub type QueryResult<T> = Result<T, QueryError>;

/// Rejections raised while building a query, before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Malformed query: unknown field, value of the wrong kind, bad sort text,
    /// zero page size.
    InvalidQuery(String),
    /// Range whose lower bound is greater than its upper bound.
    InvalidRange {
        field: TutorialField,
        start: QueryValue,
        end: QueryValue,
    },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::InvalidRange { field, start, end } => write!(
                f,
                "invalid range on `{}`: start {start} is greater than end {end}",
                field.name()
            ),
        }
    }
}

impl Error for QueryError {}
