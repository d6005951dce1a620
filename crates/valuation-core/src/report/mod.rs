//! Report editing sessions and the finalize-on-save transaction.
//!
//! ```text
//!   ReportSession ── edit/blur ──▶ data + live number ──▶ IndexSync (debounced)
//!        │
//!        └── save ──▶ ReportSaver (one IMMEDIATE transaction)
//!                      1. resolve layout        4. write report
//!                      2. read existing report  5. append history
//!                      3. allocate number
//! ```

mod index;
mod save;
mod session;

pub use index::*;
pub use save::*;
pub use session::*;

use crate::db::DbError;
use crate::layout::LayoutError;
use crate::numbering::NumberingError;
use thiserror::Error;

/// Report errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Numbering error: {0}")]
    Numbering(#[from] NumberingError),

    #[error("{field} is required")]
    Validation { field: String },

    #[error("Invalid vehicle: {0}")]
    InvalidVehicle(String),

    #[error("Invalid branch code: {0}")]
    InvalidBranch(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

pub type ReportResult<T> = Result<T, ReportError>;
