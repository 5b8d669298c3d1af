//! Logs module — record boundary detection, classification and scanning.

pub mod model;
pub mod pattern;
pub mod record;
pub mod scan;

pub use model::{CodeLocation, ParseProgress, RecordError, Severity, SpecialMessageType};
pub use record::{Record, RecordBuilder};
pub use scan::{LogScanner, ScanError, ScanSummary};
