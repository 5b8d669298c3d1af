use thiserror::Error;

/// How severe a log record is.
///
/// `Unknown` until a special-message marker, a stack-trace origin line or a
/// bracketed native-engine annotation says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Unknown,
    Info,
    Warning,
    Error,
    Exception,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Exception => "exception",
        }
    }

    /// Integer code stored in the `severity` column. `Unknown` has no code
    /// and is stored as NULL.
    pub fn code(&self) -> Option<i64> {
        match self {
            Severity::Unknown => None,
            Severity::Info => Some(0),
            Severity::Warning => Some(1),
            Severity::Error => Some(2),
            Severity::Exception => Some(3),
        }
    }
}

/// Source file and line a message is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeLocation {
    pub filename: String,
    pub line: u32,
}

impl CodeLocation {
    pub fn new(filename: impl Into<String>, line: u32) -> Self {
        Self {
            filename: filename.into(),
            line,
        }
    }
}

/// Where an in-progress record is in its linear lifecycle.
///
/// `Message -> Stacktrace -> BlankAfterStacktrace -> Location -> Done`.
/// Records may skip states; `Done` is the only terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ParseProgress {
    #[default]
    Message,
    Stacktrace,
    BlankAfterStacktrace,
    Location,
    Done,
}

/// Known multi-line shapes that close on their own marker line instead of
/// the stack-trace/location path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialMessageType {
    #[default]
    None,
    /// Engine startup banner (`Mono path[...]` up to the last thread line).
    LogHead,
    UnloadingSerialized,
    SystemMemory,
    UnloadingAssets,
}

impl SpecialMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialMessageType::None => "none",
            SpecialMessageType::LogHead => "log_head",
            SpecialMessageType::UnloadingSerialized => "unloading_serialized",
            SpecialMessageType::SystemMemory => "system_memory",
            SpecialMessageType::UnloadingAssets => "unloading_assets",
        }
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Invalid state: record starting at line {line} is already complete")]
    InvalidState { line: u64 },

    #[error("Incomplete record: record starting at line {line} has not reached its closing line")]
    Incomplete { line: u64 },

    #[error("Malformed location: line number {0:?} is not a valid integer")]
    MalformedLocation(String),
}
