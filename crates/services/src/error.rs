//! Shared error types for the services crate.

use thiserror::Error;

use jelajah_core::model::{PlaceId, ProfileError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the remote question source.
///
/// The session engine treats every variant the same way (substitute the
/// built-in fallback question); the split exists for logging and tests.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("question source is not configured")]
    Disabled,
    #[error("question service is overloaded")]
    Overloaded,
    #[error("question request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("question payload is malformed: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ScoreLedger`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("no learner profile is loaded")]
    NoProfile,
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `OnboardingService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OnboardingError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by quiz sessions.
///
/// The phase variants mark contract violations by the caller, not
/// recoverable runtime states.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("place {0} is not in the catalog")]
    UnknownPlace(PlaceId),
    #[error("place at catalog index {index} is still locked")]
    PlaceLocked { index: usize },
    #[error("session is not loading a question")]
    NotLoading,
    #[error("no question is awaiting an answer")]
    NotAwaitingAnswer,
    #[error("no feedback to advance from")]
    NotInFeedback,
    #[error("session already completed")]
    Completed,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
