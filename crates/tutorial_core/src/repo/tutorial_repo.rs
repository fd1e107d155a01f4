//! Tutorial store contract and SQLite implementation.
//!
//! # Responsibility
//! - Execute `SafeQuery`/`RawQuery` values against the `tutorials` table.
//! - Translate SQLite failures into the repository error taxonomy.
//!
//! # Invariants
//! - Read paths reject rows that cannot be decoded instead of masking them.
//! - Write paths validate before any SQL mutation.
//! - Log events carry counts and durations only.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::tutorial::{NewTutorial, Tutorial, TutorialId, TutorialValidationError};
use crate::query::{
    Page, PageRequest, Predicate, QueryError, QueryValue, RawParams, RawQuery, SafeQuery,
    SqlStatement, TutorialField, TUTORIAL_COLUMNS,
};
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, Row, ToSql, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "title",
    "description",
    "level",
    "created_at",
    "published",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors surfaced by tutorial store operations. Nothing is retried here.
#[derive(Debug)]
pub enum RepoError {
    /// Connection or transport failure: cannot open, busy, locked, I/O.
    StorageUnavailable(DbError),
    /// Query rejected before execution, or a raw statement SQLite refused.
    InvalidQuery(String),
    /// Range bounds given in the wrong order.
    InvalidRange {
        field: TutorialField,
        start: QueryValue,
        end: QueryValue,
    },
    /// Storage constraint rejected the write, e.g. duplicate id.
    ConstraintViolation(String),
    Validation(TutorialValidationError),
    /// Target of a full-row update does not exist.
    NotFound(TutorialId),
    /// Persisted row cannot be decoded into a `Tutorial`.
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "tutorial storage unavailable: {err}"),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::InvalidRange { field, start, end } => write!(
                f,
                "invalid range on `{}`: start {start} is greater than end {end}",
                field.name()
            ),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "tutorial not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted tutorial data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "tutorial store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "tutorial store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "tutorial store requires column `{column}` in table `{table}`"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) | Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TutorialValidationError> for RepoError {
    fn from(value: TutorialValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for RepoError {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::InvalidQuery(message) => Self::InvalidQuery(message),
            QueryError::InvalidRange { field, start, end } => {
                Self::InvalidRange { field, start, end }
            }
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        let code = value.sqlite_error_code();
        match code {
            Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation(value.to_string()),
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure,
            ) => Self::StorageUnavailable(DbError::Sqlite(value)),
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Partial update applied by [`TutorialStore::update_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TutorialPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub level: Option<i32>,
    pub published: Option<bool>,
}

impl TutorialPatch {
    pub fn publish() -> Self {
        Self {
            published: Some(true),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.level.is_none()
            && self.published.is_none()
    }

    fn assignments(&self) -> Vec<(TutorialField, QueryValue)> {
        let mut sets = Vec::new();
        if let Some(title) = &self.title {
            sets.push((TutorialField::Title, QueryValue::Text(title.clone())));
        }
        if let Some(description) = &self.description {
            sets.push((
                TutorialField::Description,
                QueryValue::Text(description.clone()),
            ));
        }
        if let Some(level) = self.level {
            sets.push((TutorialField::Level, QueryValue::from(level)));
        }
        if let Some(published) = self.published {
            sets.push((TutorialField::Published, QueryValue::Bool(published)));
        }
        sets
    }
}

/// Storage-access contract for tutorial queries and mutations.
pub trait TutorialStore {
    /// Inserts one tutorial; storage assigns the id.
    fn insert(&self, tutorial: &NewTutorial) -> RepoResult<Tutorial>;
    /// Inserts with a caller-chosen id. Duplicate ids are a constraint violation.
    fn insert_with_id(&self, id: TutorialId, tutorial: &NewTutorial) -> RepoResult<Tutorial>;
    fn find_by_id(&self, id: TutorialId) -> RepoResult<Option<Tutorial>>;
    fn find_many(&self, query: &SafeQuery) -> RepoResult<Vec<Tutorial>>;
    fn find_page(&self, query: &SafeQuery, page: &PageRequest) -> RepoResult<Page<Tutorial>>;
    fn count(&self, query: &SafeQuery) -> RepoResult<u64>;
    /// Runs a native statement as written; no reordering or paging.
    fn find_raw(&self, query: &RawQuery) -> RepoResult<Vec<Tutorial>>;
    /// Replaces every mutable field of an existing tutorial.
    fn update(&mut self, tutorial: &Tutorial) -> RepoResult<()>;
    /// Applies `patch` to every matching row in one transaction.
    fn update_many(&mut self, predicate: &Predicate, patch: &TutorialPatch) -> RepoResult<usize>;
    fn delete_many(&mut self, predicate: &Predicate) -> RepoResult<usize>;
}

/// SQLite-backed tutorial store.
pub struct SqliteTutorialStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTutorialStore<'conn> {
    /// Wraps a connection opened through `db::open_db*`.
    ///
    /// # Errors
    /// Rejects connections that are not migrated to the latest schema or lack
    /// the `tutorials` table and its columns.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn insert_row(&self, id: Option<TutorialId>, tutorial: &NewTutorial) -> RepoResult<Tutorial> {
        tutorial.validate()?;
        let started_at = Instant::now();

        let result = self
            .conn
            .query_row(
                &format!(
                    "INSERT INTO tutorials (id, title, description, level, created_at, published)
                     VALUES (
                        ?1, ?2, ?3, ?4,
                        COALESCE(?5, CAST(strftime('%s', 'now') AS INTEGER) * 1000),
                        ?6
                     )
                     RETURNING {TUTORIAL_COLUMNS};"
                ),
                rusqlite::params![
                    id.map(|value| value.0),
                    tutorial.title.as_str(),
                    tutorial.description.as_str(),
                    tutorial.level,
                    tutorial.created_at,
                    tutorial.published,
                ],
                |row| Ok(read_row(row)),
            )
            .map_err(RepoError::from)
            .and_then(|decoded| decoded);

        match &result {
            Ok(saved) => info!(
                "event=tutorial_insert module=repo status=ok id={} duration_ms={}",
                saved.id,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=tutorial_insert module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn select(&self, kind: &'static str, statement: &SqlStatement) -> RepoResult<Vec<Tutorial>> {
        let started_at = Instant::now();
        let result = query_rows(
            &*self.conn,
            &statement.sql,
            params_from_iter(statement.params.iter().map(to_sql_value)),
        );
        log_read(kind, started_at, &result);
        result
    }

    fn mutate(&mut self, kind: &'static str, statement: &SqlStatement) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = (|| -> RepoResult<usize> {
            let tx = self
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)?;
            let changed = tx.execute(
                &statement.sql,
                params_from_iter(statement.params.iter().map(to_sql_value)),
            )?;
            tx.commit()?;
            Ok(changed)
        })();

        match &result {
            Ok(changed) => info!(
                "event={kind} module=repo status=ok affected={changed} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={kind} module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

impl TutorialStore for SqliteTutorialStore<'_> {
    fn insert(&self, tutorial: &NewTutorial) -> RepoResult<Tutorial> {
        self.insert_row(None, tutorial)
    }

    fn insert_with_id(&self, id: TutorialId, tutorial: &NewTutorial) -> RepoResult<Tutorial> {
        self.insert_row(Some(id), tutorial)
    }

    fn find_by_id(&self, id: TutorialId) -> RepoResult<Option<Tutorial>> {
        let query = SafeQuery::new(Predicate::equals(TutorialField::Id, id.0)?);
        let mut rows = self.select("tutorial_find_by_id", &query.select_statement(None))?;
        Ok(rows.pop())
    }

    fn find_many(&self, query: &SafeQuery) -> RepoResult<Vec<Tutorial>> {
        self.select("tutorial_find_many", &query.select_statement(None))
    }

    fn find_page(&self, query: &SafeQuery, page: &PageRequest) -> RepoResult<Page<Tutorial>> {
        let total = self.count(query)?;
        let content = if page.offset() >= total {
            Vec::new()
        } else {
            self.select("tutorial_find_page", &query.select_statement(Some(page)))?
        };
        Ok(Page::new(content, page, total))
    }

    fn count(&self, query: &SafeQuery) -> RepoResult<u64> {
        let statement = query.count_statement();
        let total: i64 = self.conn.query_row(
            &statement.sql,
            params_from_iter(statement.params.iter().map(to_sql_value)),
            |row| row.get(0),
        )?;
        u64::try_from(total)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{total}`")))
    }

    fn find_raw(&self, query: &RawQuery) -> RepoResult<Vec<Tutorial>> {
        let started_at = Instant::now();
        let result = match query.params() {
            RawParams::Positional(values) => query_rows(
                &*self.conn,
                query.sql(),
                params_from_iter(values.iter().map(to_sql_value)),
            ),
            RawParams::Named(pairs) => {
                let values: Vec<(&str, Value)> = pairs
                    .iter()
                    .map(|(name, value)| (name.as_str(), to_sql_value(value)))
                    .collect();
                let bound: Vec<(&str, &dyn ToSql)> = values
                    .iter()
                    .map(|(name, value)| (*name, value as &dyn ToSql))
                    .collect();
                query_rows(&*self.conn, query.sql(), bound.as_slice())
            }
        }
        .map_err(raw_statement_error);
        log_read("tutorial_find_raw", started_at, &result);
        result
    }

    fn update(&mut self, tutorial: &Tutorial) -> RepoResult<()> {
        tutorial.validate()?;
        let predicate = Predicate::equals(TutorialField::Id, tutorial.id.0)?;
        let mut statement = SafeQuery::new(predicate).where_statement();
        let first = statement.params.len() + 1;
        statement.sql = format!(
            "UPDATE tutorials SET title = ?{}, description = ?{}, level = ?{}, created_at = ?{}, published = ?{}{}",
            first,
            first + 1,
            first + 2,
            first + 3,
            first + 4,
            statement.sql
        );
        statement.params.extend([
            QueryValue::Text(tutorial.title.clone()),
            QueryValue::Text(tutorial.description.clone()),
            QueryValue::from(tutorial.level),
            QueryValue::Integer(tutorial.created_at),
            QueryValue::Bool(tutorial.published),
        ]);

        if self.mutate("tutorial_update", &statement)? == 0 {
            return Err(RepoError::NotFound(tutorial.id));
        }
        Ok(())
    }

    fn update_many(&mut self, predicate: &Predicate, patch: &TutorialPatch) -> RepoResult<usize> {
        if patch.is_empty() {
            return Err(RepoError::InvalidQuery(
                "tutorial patch must set at least one field".to_string(),
            ));
        }
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(TutorialValidationError::BlankTitle.into());
            }
        }

        let mut statement = SafeQuery::new(predicate.clone()).where_statement();
        let mut sets = Vec::new();
        for (field, value) in patch.assignments() {
            statement.params.push(value);
            sets.push(format!("{} = ?{}", field.column(), statement.params.len()));
        }
        statement.sql = format!("UPDATE tutorials SET {}{}", sets.join(", "), statement.sql);

        self.mutate("tutorial_update_many", &statement)
    }

    fn delete_many(&mut self, predicate: &Predicate) -> RepoResult<usize> {
        let mut statement = SafeQuery::new(predicate.clone()).where_statement();
        statement.sql = format!("DELETE FROM tutorials{}", statement.sql);
        self.mutate("tutorial_delete_many", &statement)
    }
}

fn query_rows<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<Tutorial>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut tutorials = Vec::new();
    while let Some(row) = rows.next()? {
        tutorials.push(read_row(row)?);
    }
    Ok(tutorials)
}

fn read_row(row: &Row<'_>) -> RepoResult<Tutorial> {
    let published = match row.get::<_, i64>("published")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid published value `{other}` in tutorials.published"
            )));
        }
    };

    Ok(Tutorial {
        id: TutorialId(row.get("id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        level: row.get("level")?,
        created_at: row.get("created_at")?,
        published,
    })
}

fn to_sql_value(value: &QueryValue) -> Value {
    match value {
        QueryValue::Integer(number) => Value::Integer(*number),
        QueryValue::Text(text) => Value::Text(text.clone()),
        QueryValue::Bool(flag) => Value::Integer(i64::from(*flag)),
    }
}

/// SQLite rejects malformed native text and unknown parameter names before
/// running anything; report those as invalid queries.
fn raw_statement_error(err: RepoError) -> RepoError {
    match err {
        RepoError::Db(DbError::Sqlite(inner)) => match &inner {
            rusqlite::Error::InvalidParameterName(name) => {
                RepoError::InvalidQuery(format!("unknown parameter `{name}` in raw statement"))
            }
            rusqlite::Error::InvalidParameterCount(given, expected) => RepoError::InvalidQuery(
                format!("raw statement expects {expected} parameters, got {given}"),
            ),
            rusqlite::Error::InvalidColumnName(column) => RepoError::InvalidQuery(format!(
                "raw statement does not select tutorial column `{column}`"
            )),
            rusqlite::Error::SqlInputError { msg, .. } => RepoError::InvalidQuery(msg.clone()),
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::Unknown =>
            {
                RepoError::InvalidQuery(
                    message
                        .clone()
                        .unwrap_or_else(|| "malformed raw statement".to_string()),
                )
            }
            _ => RepoError::Db(DbError::Sqlite(inner)),
        },
        other => other,
    }
}

fn log_read(kind: &'static str, started_at: Instant, result: &RepoResult<Vec<Tutorial>>) {
    match result {
        Ok(rows) => debug!(
            "event={kind} module=repo status=ok rows={} duration_ms={}",
            rows.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={kind} module=repo status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'tutorials'
        );",
        [],
        |row| row.get(0),
    )?;
    if table_exists != 1 {
        return Err(RepoError::MissingRequiredTable("tutorials"));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(tutorials);")?;
    let mut rows = stmt.query([])?;
    let mut present = Vec::new();
    while let Some(row) = rows.next()? {
        present.push(row.get::<_, String>(1)?);
    }
    for column in REQUIRED_COLUMNS {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "tutorials",
                column,
            });
        }
    }

    Ok(())
}
