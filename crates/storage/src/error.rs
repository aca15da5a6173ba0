use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    /// Postgres `lock_not_available`, raised when `lock_timeout` expires.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("55P03")
        )
    }
}

/// Errors surfaced by the rating and ranking core.
///
/// None of these leave partial state behind: every engine operation runs in a
/// unit of work that is only committed after the last step succeeded.
#[derive(Debug, Error)]
pub enum LadderError {
    /// The request itself is wrong (self-play, unranked participant, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request is well formed but conflicts with the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Stored ranks break the dense 1..N invariant. Not user recoverable.
    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Timed out waiting for the lock on ladder {0}")]
    LockTimeout(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type LadderResult<T> = std::result::Result<T, LadderError>;

impl From<sqlx::Error> for LadderError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage(StorageError::from(error))
    }
}

impl LadderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }
}
