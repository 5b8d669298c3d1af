//! Line-level pattern matchers.
//!
//! Pure helpers used by [`super::record::RecordBuilder`] to decide whether a
//! line is a stack frame, carries an origin annotation, or opens/closes one of
//! the engine's special multi-line messages. Nothing here keeps state.

use regex::Regex;
use std::sync::OnceLock;

use super::model::{CodeLocation, RecordError, Severity, SpecialMessageType};

/// Managed frame prefix; the first five characters (`"  at "`) are stripped.
pub(crate) const MANAGED_FRAME_PREFIX: &str = "  at";
pub(crate) const MANAGED_FRAME_STRIP: usize = 5;

const LOG_HEAD_START: &str = "Mono path[";
const LOG_HEAD_THREAD: &str = "  Thread -> id: ";
const UNLOADING_SERIALIZED_MARK: &str = "Unused Serialized";
const UNLOADING_SERIALIZED_END: &str = "UnloadTime: ";
const SYSTEM_MEMORY_START: &str = "System memory in use before: ";
const SYSTEM_MEMORY_END: &str = "System memory in use after: ";
const UNLOADING_ASSETS_MARK: &str = "unused Assets to reduce";
const UNLOADING_ASSETS_END: &str = "Total: ";

const DEBUG_LOG: &str = "UnityEngine.Debug:Log(";
const DEBUG_LOG_WARNING: &str = "UnityEngine.Debug:LogWarning";
const DEBUG_LOG_ERROR: &str = "UnityEngine.Debug:LogError";

/// `Namespace.Type:Method ...` call sites, or `  at ...` managed frames.
static STACK_TRACE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// `(Filename: Assets/Foo.cs Line: 42)`
static ORIGIN_PATTERN: OnceLock<Regex> = OnceLock::new();

/// `... in /src/Foo.cs:10`. Unanchored, so the first `in ` anywhere in the
/// frame wins, method names included.
static EXCEPTION_FRAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn stack_trace_pattern() -> &'static Regex {
    STACK_TRACE_PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?:[^\s.:]+\.)+[^\s.:]+:.*|  at .*)$").expect("Static regex is valid")
    })
}

fn origin_pattern() -> &'static Regex {
    ORIGIN_PATTERN.get_or_init(|| {
        Regex::new(r"^\(Filename: (.*) Line: (\d+)\)$").expect("Static regex is valid")
    })
}

fn exception_frame_pattern() -> &'static Regex {
    EXCEPTION_FRAME_PATTERN.get_or_init(|| {
        Regex::new(r"in ([^<>]*):(\d+)").expect("Static regex is valid")
    })
}

/// True if `line` looks like a stack frame.
pub fn is_stack_trace_line(line: &str) -> bool {
    stack_trace_pattern().is_match(line)
}

/// Parse a `(Filename: X Line: N)` annotation spanning the whole line.
pub fn origin_location(line: &str) -> Result<Option<CodeLocation>, RecordError> {
    let Some(caps) = origin_pattern().captures(line) else {
        return Ok(None);
    };
    let number = parse_line_number(&caps[2])?;
    Ok(Some(CodeLocation::new(&caps[1], number)))
}

/// Parse the first `in <path>:<line>` of an exception frame.
pub fn exception_frame_location(line: &str) -> Result<Option<CodeLocation>, RecordError> {
    let Some(caps) = exception_frame_pattern().captures(line) else {
        return Ok(None);
    };
    let number = parse_line_number(&caps[2])?;
    Ok(Some(CodeLocation::new(&caps[1], number)))
}

fn parse_line_number(digits: &str) -> Result<u32, RecordError> {
    digits
        .parse()
        .map_err(|_| RecordError::MalformedLocation(digits.to_string()))
}

/// Classify the first message line of a record as one of the special shapes.
pub(crate) fn classify_special(first_line: &str) -> SpecialMessageType {
    if first_line.starts_with(LOG_HEAD_START) {
        SpecialMessageType::LogHead
    } else if first_line.contains(UNLOADING_SERIALIZED_MARK) {
        SpecialMessageType::UnloadingSerialized
    } else if first_line.starts_with(SYSTEM_MEMORY_START) {
        SpecialMessageType::SystemMemory
    } else if first_line.contains(UNLOADING_ASSETS_MARK) {
        SpecialMessageType::UnloadingAssets
    } else {
        SpecialMessageType::None
    }
}

/// Whether `line` is the last line of a special message of kind `kind`.
///
/// The log head repeats its thread line once per thread, so it only closes on
/// a thread line whose successor is not one.
pub(crate) fn closes_special(kind: SpecialMessageType, line: &str, next_line: &str) -> bool {
    match kind {
        SpecialMessageType::None => false,
        SpecialMessageType::LogHead => {
            line.starts_with(LOG_HEAD_THREAD) && !next_line.starts_with(LOG_HEAD_THREAD)
        }
        SpecialMessageType::UnloadingSerialized => line.starts_with(UNLOADING_SERIALIZED_END),
        SpecialMessageType::SystemMemory => line.starts_with(SYSTEM_MEMORY_END),
        SpecialMessageType::UnloadingAssets => line.starts_with(UNLOADING_ASSETS_END),
    }
}

/// Severity implied by a `UnityEngine.Debug:*` frame.
///
/// `LogError` maps to `Warning`, matching the converter's historical output.
pub(crate) fn debug_call_severity(line: &str) -> Option<Severity> {
    if line.starts_with(DEBUG_LOG) {
        Some(Severity::Info)
    } else if line.starts_with(DEBUG_LOG_WARNING) {
        Some(Severity::Warning)
    } else if line.starts_with(DEBUG_LOG_ERROR) {
        Some(Severity::Warning)
    } else {
        None
    }
}

/// Drop the managed-frame prefix, counting characters rather than bytes.
pub(crate) fn strip_managed_frame(line: &str) -> &str {
    match line.char_indices().nth(MANAGED_FRAME_STRIP) {
        Some((offset, _)) => &line[offset..],
        None => "",
    }
}
