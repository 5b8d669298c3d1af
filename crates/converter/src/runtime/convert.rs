//! Convert — scan a log file and persist its records.
//!
//! The input is opened before the destination so a missing log never leaves
//! an empty database behind. Scanning runs on the blocking pool; the sink
//! then writes everything in one transaction.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::conf::ConverterConfig;
use crate::logs::{LogScanner, ScanError, ScanSummary};
use crate::store::{SinkOptions, SqliteSink, StoreError};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to open log file {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub rows_written: u64,
    pub summary: ScanSummary,
}

pub async fn convert(
    input: &Path,
    output: &Path,
    config: &ConverterConfig,
) -> Result<ConversionReport, ConvertError> {
    let file = File::open(input).map_err(|source| ConvertError::Input {
        path: input.display().to_string(),
        source,
    })?;

    let sink = SqliteSink::create(output, &SinkOptions::from(config)).await?;

    info!(input = %input.display(), "Scanning log");
    let (records, summary) =
        tokio::task::spawn_blocking(move || LogScanner::new(BufReader::new(file)).collect_records())
            .await??;

    let rows_written = sink.write_all(&records).await?;
    sink.close().await;

    if summary.dropped_lines > 0 {
        info!(
            dropped_lines = summary.dropped_lines,
            "Trailing lines did not form a complete record and were skipped"
        );
    }
    if summary.unknown_severity {
        warn!("Could not determine severity for at least one message");
    }
    info!(
        lines = summary.lines_read,
        rows = rows_written,
        output = %output.display(),
        "Conversion complete"
    );

    Ok(ConversionReport {
        rows_written,
        summary,
    })
}
