//! Tutorial entity and write models.
//!
//! # Invariants
//! - `id` is assigned once by storage and never reused.
//! - `title` is never blank for a persisted tutorial.
//! - `created_at` is Unix epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-generated tutorial identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TutorialId(pub i64);

impl Display for TutorialId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TutorialId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Validation failure for tutorial write models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorialValidationError {
    BlankTitle,
}

impl Display for TutorialValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "tutorial title must not be blank"),
        }
    }
}

impl Error for TutorialValidationError {}

/// Persisted tutorial row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutorial {
    pub id: TutorialId,
    pub title: String,
    pub description: String,
    pub level: i32,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub published: bool,
}

impl Tutorial {
    pub fn validate(&self) -> Result<(), TutorialValidationError> {
        validate_title(&self.title)
    }
}

/// Insert model. Storage assigns the id and, when absent, `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTutorial {
    pub title: String,
    pub description: String,
    pub level: i32,
    pub created_at: Option<i64>,
    pub published: bool,
}

impl NewTutorial {
    /// Creates an unpublished tutorial stamped with the insert time.
    pub fn new(title: impl Into<String>, description: impl Into<String>, level: i32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            level,
            created_at: None,
            published: false,
        }
    }

    pub fn created_at(mut self, epoch_ms: i64) -> Self {
        self.created_at = Some(epoch_ms);
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn validate(&self) -> Result<(), TutorialValidationError> {
        validate_title(&self.title)
    }
}

fn validate_title(title: &str) -> Result<(), TutorialValidationError> {
    if title.trim().is_empty() {
        return Err(TutorialValidationError::BlankTitle);
    }
    Ok(())
}
