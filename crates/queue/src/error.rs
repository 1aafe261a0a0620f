//! Typed error type for the queue crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Another worker claimed the row first. Not an error of the run itself
    /// — callers must log and move on silently.
    #[error("execution already claimed by another worker")]
    ClaimLost,

    #[error(transparent)]
    Db(#[from] db::DbError),
}
