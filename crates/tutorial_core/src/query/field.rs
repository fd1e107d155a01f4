use super::{QueryError, QueryResult};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Tutorial attributes that queries may filter or sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TutorialField {
    Id,
    Title,
    Description,
    Level,
    CreatedAt,
    Published,
}

/// Storage type class of a field, used to type-check bound values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    Integer,
    Text,
    Bool,
}

impl TutorialField {
    pub const ALL: [TutorialField; 6] = [
        Self::Id,
        Self::Title,
        Self::Description,
        Self::Level,
        Self::CreatedAt,
        Self::Published,
    ];

    /// Entity attribute name as exposed to callers.
    pub fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Description => "description",
            Self::Level => "level",
            Self::CreatedAt => "createdAt",
            Self::Published => "published",
        }
    }

    /// Backing column in the `tutorials` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Description => "description",
            Self::Level => "level",
            Self::CreatedAt => "created_at",
            Self::Published => "published",
        }
    }

    pub(crate) fn kind(self) -> ValueKind {
        match self {
            Self::Id | Self::Level | Self::CreatedAt => ValueKind::Integer,
            Self::Title | Self::Description => ValueKind::Text,
            Self::Published => ValueKind::Bool,
        }
    }
}

impl FromStr for TutorialField {
    type Err = QueryError;

    /// Accepts attribute names (`createdAt`) and column names (`created_at`),
    /// ignoring ASCII case.
    fn from_str(value: &str) -> QueryResult<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|field| {
                field.name().eq_ignore_ascii_case(wanted)
                    || field.column().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| QueryError::InvalidQuery(format!("unknown tutorial field `{wanted}`")))
    }
}

/// A value bound into a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl QueryValue {
    pub(crate) fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Text(_) => ValueKind::Text,
            Self::Bool(_) => ValueKind::Bool,
        }
    }
}

impl Display for QueryValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "`{value}`"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
