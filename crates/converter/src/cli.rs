//! Command-line surface.
//!
//! Two positional arguments and nothing else. Any other shape prints the
//! usage line and exits successfully without touching the filesystem.

use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: converter log_file output_file";

/// Convert an engine log into a SQLite database.
#[derive(Debug, Parser)]
#[command(name = "converter", version, about)]
pub struct Cli {
    /// Log file to read.
    pub log_file: PathBuf,

    /// SQLite database to create.
    pub output_file: PathBuf,
}

impl Cli {
    /// Parse the process arguments, printing usage on any mismatch.
    pub fn parse_or_usage() -> Option<Self> {
        Self::parse_from_or_usage(std::env::args_os())
    }

    pub fn parse_from_or_usage<I, T>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => Some(cli),
            Err(err) => {
                match err.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                        let _ = err.print();
                    }
                    _ => println!("{USAGE}"),
                }
                None
            }
        }
    }
}
