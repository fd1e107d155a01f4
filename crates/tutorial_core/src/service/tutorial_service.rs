//! Tutorial query repository.
//!
//! # Responsibility
//! - Turn each named lookup into a `SafeQuery` (or, for the `*_native`
//!   operations, a `RawQuery`) and hand it to the store.
//!
//! # Invariants
//! - Range operations fail with `InvalidRange` before touching storage when
//!   `start > end`.
//! - `publish_tutorial` reports the affected row count; 0 means no such id.
//! - Only structured queries accept a caller-supplied `Sort` or `PageRequest`.

use crate::config::StoreConfig;
use crate::db::open_db_with_config;
use crate::model::tutorial::{NewTutorial, Tutorial, TutorialId};
use crate::query::{
    CaseMatch, Page, PageRequest, Predicate, QueryValue, RawQuery, SafeQuery, Sort, TutorialField,
};
use crate::repo::tutorial_repo::{RepoResult, SqliteTutorialStore, TutorialPatch, TutorialStore};

const SELECT_ALL_NATIVE: &str =
    "SELECT id, title, description, level, created_at, published FROM tutorials";

/// Row counts for a quick catalog overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub total: u64,
    pub published: u64,
}

/// Opens the configured database and summarizes its catalog.
pub fn open_store_summary(config: &StoreConfig) -> RepoResult<CatalogSummary> {
    let mut conn = open_db_with_config(config)?;
    let service = TutorialService::new(SqliteTutorialStore::try_new(&mut conn)?);
    service.summary()
}

/// Query repository over a tutorial store.
pub struct TutorialService<S: TutorialStore> {
    store: S,
}

impl<S: TutorialStore> TutorialService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // Basic persistence.

    pub fn insert(&self, tutorial: &NewTutorial) -> RepoResult<Tutorial> {
        self.store.insert(tutorial)
    }

    /// Import path for records whose id already exists elsewhere.
    pub fn insert_with_id(&self, id: TutorialId, tutorial: &NewTutorial) -> RepoResult<Tutorial> {
        self.store.insert_with_id(id, tutorial)
    }

    pub fn find_by_id(&self, id: TutorialId) -> RepoResult<Option<Tutorial>> {
        self.store.find_by_id(id)
    }

    /// Returns `RepoError::NotFound` when the id does not exist.
    pub fn update(&mut self, tutorial: &Tutorial) -> RepoResult<()> {
        self.store.update(tutorial)
    }

    pub fn delete_by_id(&mut self, id: TutorialId) -> RepoResult<usize> {
        self.store
            .delete_many(&Predicate::equals(TutorialField::Id, id.0)?)
    }

    pub fn delete_all(&mut self) -> RepoResult<usize> {
        self.store.delete_many(&Predicate::all())
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.store.count(&SafeQuery::all())
    }

    pub fn summary(&self) -> RepoResult<CatalogSummary> {
        Ok(CatalogSummary {
            total: self.count()?,
            published: self.store.count(&SafeQuery::new(published(true)?))?,
        })
    }

    // Filters.

    /// All tutorials in insertion order.
    pub fn find_all(&self) -> RepoResult<Vec<Tutorial>> {
        self.store.find_many(&SafeQuery::all())
    }

    pub fn find_by_published(&self, is_published: bool) -> RepoResult<Vec<Tutorial>> {
        self.store.find_many(&SafeQuery::new(published(is_published)?))
    }

    /// Case-sensitive title substring.
    pub fn find_by_title_like(&self, title: &str) -> RepoResult<Vec<Tutorial>> {
        let predicate = Predicate::contains(TutorialField::Title, title, CaseMatch::Sensitive)?;
        self.store.find_many(&SafeQuery::new(predicate))
    }

    pub fn find_by_title_like_case_insensitive(&self, title: &str) -> RepoResult<Vec<Tutorial>> {
        self.store.find_many(&SafeQuery::new(title_contains(title)?))
    }

    /// Sets `published = true` for `id` inside one transaction.
    ///
    /// Returns the affected row count: 1 when the tutorial exists (also when it
    /// was already published), 0 when it does not.
    pub fn publish_tutorial(&mut self, id: TutorialId) -> RepoResult<usize> {
        let predicate = Predicate::equals(TutorialField::Id, id.0)?;
        self.store.update_many(&predicate, &TutorialPatch::publish())
    }

    pub fn find_by_level_greater_than_equal(&self, level: i32) -> RepoResult<Vec<Tutorial>> {
        let predicate = Predicate::gte(TutorialField::Level, level)?;
        self.store.find_many(&SafeQuery::new(predicate))
    }

    /// `created_at >= date`, epoch milliseconds.
    pub fn find_by_date_greater_than_equal(&self, date: i64) -> RepoResult<Vec<Tutorial>> {
        let predicate = Predicate::gte(TutorialField::CreatedAt, date)?;
        self.store.find_many(&SafeQuery::new(predicate))
    }

    /// Inclusive on both ends.
    pub fn find_by_level_between(&self, start: i32, end: i32) -> RepoResult<Vec<Tutorial>> {
        let predicate = Predicate::between(TutorialField::Level, start, end)?;
        self.store.find_many(&SafeQuery::new(predicate))
    }

    /// Inclusive on both ends, epoch milliseconds.
    pub fn find_by_date_between(&self, start: i64, end: i64) -> RepoResult<Vec<Tutorial>> {
        let predicate = Predicate::between(TutorialField::CreatedAt, start, end)?;
        self.store.find_many(&SafeQuery::new(predicate))
    }

    /// Published flag plus inclusive level range, bound by `:published`,
    /// `:start` and `:end`. Rows come back in id order.
    pub fn find_by_level_between_and_published(
        &self,
        start: i32,
        end: i32,
        is_published: bool,
    ) -> RepoResult<Vec<Tutorial>> {
        let query = level_range_query(start, end, is_published, " ORDER BY t.id ASC")?;
        self.store.find_raw(&query)
    }

    /// Case-insensitive keyword in the title or the description.
    pub fn find_by_title_or_description_containing_case_insensitive(
        &self,
        keyword: &str,
    ) -> RepoResult<Vec<Tutorial>> {
        let predicate = Predicate::or([
            title_contains(keyword)?,
            Predicate::contains(TutorialField::Description, keyword, CaseMatch::Insensitive)?,
        ]);
        self.store.find_many(&SafeQuery::new(predicate))
    }

    pub fn find_by_title_containing_case_insensitive_and_published(
        &self,
        title: &str,
        is_published: bool,
    ) -> RepoResult<Vec<Tutorial>> {
        let predicate = Predicate::and([title_contains(title)?, published(is_published)?]);
        self.store.find_many(&SafeQuery::new(predicate))
    }

    // Fixed ordering.

    pub fn find_all_order_by_level_desc(&self) -> RepoResult<Vec<Tutorial>> {
        self.store
            .find_many(&SafeQuery::all().sorted_by(Sort::desc(TutorialField::Level)))
    }

    pub fn find_by_title_order_by_level_asc(&self, title: &str) -> RepoResult<Vec<Tutorial>> {
        let query = SafeQuery::new(title_contains(title)?).sorted_by(Sort::asc(TutorialField::Level));
        self.store.find_many(&query)
    }

    pub fn find_all_published_order_by_created_desc(&self) -> RepoResult<Vec<Tutorial>> {
        let query =
            SafeQuery::new(published(true)?).sorted_by(Sort::desc(TutorialField::CreatedAt));
        self.store.find_many(&query)
    }

    // Caller-supplied ordering.

    pub fn find_by_title_and_sort(&self, title: &str, sort: &Sort) -> RepoResult<Vec<Tutorial>> {
        let query = SafeQuery::new(title_contains(title)?).sorted_by(sort.clone());
        self.store.find_many(&query)
    }

    pub fn find_by_published_and_sort(
        &self,
        is_published: bool,
        sort: &Sort,
    ) -> RepoResult<Vec<Tutorial>> {
        let query = SafeQuery::new(published(is_published)?).sorted_by(sort.clone());
        self.store.find_many(&query)
    }

    // Pagination.

    pub fn find_all_with_pagination(&self, page: &PageRequest) -> RepoResult<Page<Tutorial>> {
        self.store.find_page(&SafeQuery::all(), page)
    }

    pub fn find_by_published_with_pagination(
        &self,
        is_published: bool,
        page: &PageRequest,
    ) -> RepoResult<Page<Tutorial>> {
        self.store
            .find_page(&SafeQuery::new(published(is_published)?), page)
    }

    /// Case-insensitive title substring, paged.
    pub fn find_by_title_with_pagination(
        &self,
        title: &str,
        page: &PageRequest,
    ) -> RepoResult<Page<Tutorial>> {
        self.store
            .find_page(&SafeQuery::new(title_contains(title)?), page)
    }

    // Native statements. These take no sort or page argument.

    pub fn find_all_native(&self) -> RepoResult<Vec<Tutorial>> {
        self.store.find_raw(&RawQuery::new(SELECT_ALL_NATIVE))
    }

    pub fn find_by_published_native(&self) -> RepoResult<Vec<Tutorial>> {
        self.store.find_raw(&RawQuery::new(format!(
            "{SELECT_ALL_NATIVE} t WHERE t.published = 1"
        )))
    }

    /// Native variant of [`Self::find_by_level_between_and_published`] bound
    /// by named parameters.
    pub fn find_by_level_between_native(
        &self,
        start: i32,
        end: i32,
        is_published: bool,
    ) -> RepoResult<Vec<Tutorial>> {
        self.store
            .find_raw(&level_range_query(start, end, is_published, "")?)
    }
}

/// Named-parameter level range statement. Bounds are checked up front since
/// the statement text is opaque to the query builder.
fn level_range_query(
    start: i32,
    end: i32,
    is_published: bool,
    ordering: &str,
) -> RepoResult<RawQuery> {
    Predicate::between(TutorialField::Level, start, end)?;
    Ok(RawQuery::named(
        format!(
            "{SELECT_ALL_NATIVE} t
             WHERE t.published = :published AND t.level BETWEEN :start AND :end{ordering}"
        ),
        [
            ("published", QueryValue::Bool(is_published)),
            ("start", QueryValue::from(start)),
            ("end", QueryValue::from(end)),
        ],
    ))
}

fn published(is_published: bool) -> RepoResult<Predicate> {
    Ok(Predicate::equals(TutorialField::Published, is_published)?)
}

fn title_contains(title: &str) -> RepoResult<Predicate> {
    Ok(Predicate::contains(
        TutorialField::Title,
        title,
        CaseMatch::Insensitive,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RawParams;
    use crate::repo::tutorial_repo::RepoError;

    #[test]
    fn level_range_binds_by_name() {
        let query = level_range_query(1, 3, true, " ORDER BY t.id ASC").unwrap();
        assert!(query.sql().contains("t.published = :published"));
        assert!(query.sql().contains("BETWEEN :start AND :end ORDER BY t.id ASC"));
        assert_eq!(
            query.params(),
            &RawParams::Named(vec![
                (":published".to_string(), QueryValue::Bool(true)),
                (":start".to_string(), QueryValue::Integer(1)),
                (":end".to_string(), QueryValue::Integer(3)),
            ])
        );
    }

    #[test]
    fn level_range_rejects_reversed_bounds() {
        let err = level_range_query(5, 2, false, "").unwrap_err();
        assert!(matches!(
            err,
            RepoError::InvalidRange {
                field: TutorialField::Level,
                ..
            }
        ));
    }
}
