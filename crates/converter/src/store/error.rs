//! Error — sink failures.
//!
//! Failures to reach the destination (open, create, name) are kept apart
//! from failures while writing rows; see [`StoreError::is_unavailable`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Could not create table {table:?}. Maybe the database already exists?")]
    TableExists { table: String },

    #[error("Could not create table {table:?}: {source}")]
    Create {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),

    #[error("Failed to write records: {0}")]
    Write(#[source] sqlx::Error),

    #[error("Source line {0} does not fit in an INTEGER column")]
    SourceLineOutOfRange(u64),
}

impl StoreError {
    /// True when the destination could not be prepared, as opposed to a
    /// failure part-way through writing.
    pub fn is_unavailable(&self) -> bool {
        !matches!(
            self,
            StoreError::Write(_) | StoreError::SourceLineOutOfRange(_)
        )
    }
}
