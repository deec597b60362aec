//! Core error type shared by every fallible operation in this crate.

/// Errors produced by the election core.
///
/// Decode failures and namespace mismatches are deliberately *not*
/// represented here: per the dispatcher's policy they are logged and
/// dropped at the call site rather than bubbled up as an `Error`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to decode message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid connection configuration: {0}")]
    Config(String),

    #[error("channel listener error: {0}")]
    Listener(String),
}

pub type Result<T> = std::result::Result<T, Error>;
