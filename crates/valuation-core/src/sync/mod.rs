//! Background sync: debounced live index writes and the change feed.
//!
//! Index fields are a best-effort projection of the report data; dropped
//! intermediate states are acceptable and the store is last-write-wins.

mod feed;
mod index;

pub use feed::*;
pub use index::*;

use crate::db::DbError;
use thiserror::Error;

/// Sync errors.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Sync state lock poisoned")]
    Poisoned,
}

pub type SyncResult<T> = Result<T, SyncError>;
