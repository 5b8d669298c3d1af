//! Store module — SQLite sink for completed records.

pub mod error;
pub mod sqlite;

pub use error::StoreError;
pub use sqlite::{SinkOptions, SqliteSink};
