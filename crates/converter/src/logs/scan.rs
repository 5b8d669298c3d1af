//! Log scanner — drives [`RecordBuilder`] over a line source.
//!
//! Reads physical lines with one line of lookahead, feeds each into the
//! current builder and yields every record that completes. A record still
//! open at end of input is dropped.

use std::io::BufRead;
use thiserror::Error;

use super::model::{RecordError, Severity};
use super::record::{Record, RecordBuilder};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record error at input line {line}: {source}")]
    Record {
        line: u64,
        #[source]
        source: RecordError,
    },
}

/// Totals gathered while scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Physical lines consumed.
    pub lines_read: u64,
    /// Completed records yielded.
    pub records: u64,
    /// At least one yielded record had no determinable severity.
    pub unknown_severity: bool,
    /// Lines belonging to the incomplete record dropped at end of input.
    pub dropped_lines: u64,
}

pub struct LogScanner<R> {
    reader: R,
    buf: Vec<u8>,
    lookahead: Option<String>,
    started: bool,
    finished: bool,
    line_number: u64,
    current: RecordBuilder,
    summary: ScanSummary,
}

impl<R: BufRead> LogScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            lookahead: None,
            started: false,
            finished: false,
            line_number: 0,
            current: RecordBuilder::new(0),
            summary: ScanSummary::default(),
        }
    }

    /// Drain the scanner, returning every completed record and the totals.
    pub fn collect_records(mut self) -> Result<(Vec<Record>, ScanSummary), ScanError> {
        let mut records = Vec::new();
        for record in self.by_ref() {
            records.push(record?);
        }
        Ok((records, self.summary))
    }

    /// Read one physical line without its terminator. Invalid UTF-8 is
    /// replaced rather than rejected.
    fn read_line(&mut self) -> Result<Option<String>, ScanError> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    fn step(&mut self) -> Result<Option<Record>, ScanError> {
        loop {
            if !self.started {
                self.started = true;
                self.lookahead = self.read_line()?;
            }

            let Some(line) = self.lookahead.take() else {
                self.end_of_input();
                return Ok(None);
            };
            self.lookahead = self.read_line()?;
            let next_line = self.lookahead.as_deref().unwrap_or("");

            let line_number = self.line_number;
            self.line_number += 1;
            self.summary.lines_read += 1;

            self.current
                .feed_line(&line, next_line)
                .map_err(|source| ScanError::Record {
                    line: line_number,
                    source,
                })?;

            if self.current.is_complete() {
                let builder =
                    std::mem::replace(&mut self.current, RecordBuilder::new(self.line_number));
                let record = builder.finish().map_err(|source| ScanError::Record {
                    line: line_number,
                    source,
                })?;

                self.summary.records += 1;
                if record.severity() == Severity::Unknown {
                    self.summary.unknown_severity = true;
                }
                tracing::trace!(
                    source_line = record.source_line(),
                    end_line = line_number,
                    severity = record.severity().as_str(),
                    "scan: record complete"
                );
                return Ok(Some(record));
            }
        }
    }

    fn end_of_input(&mut self) {
        if !self.current.is_empty() {
            self.summary.dropped_lines = self.line_number - self.current.source_line();
            tracing::debug!(
                source_line = self.current.source_line(),
                dropped_lines = self.summary.dropped_lines,
                progress = ?self.current.progress(),
                "scan: dropping incomplete trailing record"
            );
        }
        self.finished = true;
    }
}

impl<R: BufRead> Iterator for LogScanner<R> {
    type Item = Result<Record, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
