use thiserror::Error;

/// Errors raised by the cron expression engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    /// The expression is malformed or a field is out of range.
    #[error("invalid cron expression '{expression}': {reason}")]
    Invalid { expression: String, reason: String },

    /// The minute scan ran out of its one-year budget without a match
    /// (e.g. `0 0 30 2 *`).
    #[error("no run time within one year matches '{expression}'")]
    NoMatchFound { expression: String },
}

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cron expression failed validation. Raised before any store write.
    #[error("Invalid cron expression: {0}")]
    InvalidExpression(String),

    /// No task with the given ID exists in the store.
    #[error("Task not found: {id}")]
    NotFound { id: String },

    /// The next-run scan exhausted its bound.
    #[error("No matching run time within one year for '{expression}'")]
    NoMatchFound { expression: String },

    /// A projection window the scheduler refuses to compute.
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store is unusable (poisoned lock, unreadable row).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<CronError> for SchedulerError {
    fn from(e: CronError) -> Self {
        match e {
            CronError::Invalid { .. } => SchedulerError::InvalidExpression(e.to_string()),
            CronError::NoMatchFound { expression } => SchedulerError::NoMatchFound { expression },
        }
    }
}

impl SchedulerError {
    /// Short error code string sent to clients in RPC response frames.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::InvalidExpression(_) => "INVALID_EXPRESSION",
            SchedulerError::NotFound { .. } => "NOT_FOUND",
            SchedulerError::NoMatchFound { .. } => "NO_MATCH_FOUND",
            SchedulerError::InvalidWindow(_) => "INVALID_PARAMS",
            SchedulerError::Database(_) => "DATABASE_ERROR",
            SchedulerError::Storage(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
