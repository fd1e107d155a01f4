//! Tutorial catalog data access.
//! Typed filter, range, sort and paging queries over the `tutorials` table.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::tutorial::{NewTutorial, Tutorial, TutorialId, TutorialValidationError};
pub use query::{
    CaseMatch, Direction, Order, Page, PageRequest, Predicate, QueryError, QueryResult,
    QueryValue, RawParams, RawQuery, SafeQuery, Sort, TutorialField,
};
pub use repo::tutorial_repo::{
    RepoError, RepoResult, SqliteTutorialStore, TutorialPatch, TutorialStore,
};
pub use service::tutorial_service::{open_store_summary, CatalogSummary, TutorialService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
