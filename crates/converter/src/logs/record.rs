//! Record state machine.
//!
//! A [`RecordBuilder`] owns one in-progress log entry and is fed the log one
//! physical line at a time, with one line of lookahead. Each call first
//! decides whether to advance [`ParseProgress`], then performs the action of
//! the (possibly new) state on the same line, so the line that triggers a
//! transition also takes part in the new state.
//!
//! Once the builder reaches `Done` it is consumed by [`RecordBuilder::finish`]
//! into an immutable [`Record`]; the origin is resolved exactly once there.

use super::model::{CodeLocation, ParseProgress, RecordError, Severity, SpecialMessageType};
use super::pattern::{
    classify_special, closes_special, debug_call_severity, exception_frame_location,
    is_stack_trace_line, origin_location, strip_managed_frame, MANAGED_FRAME_PREFIX,
};

/// In-progress log entry.
#[derive(Debug)]
pub struct RecordBuilder {
    source_line: u64,
    progress: ParseProgress,
    special: SpecialMessageType,
    severity: Severity,
    message_lines: Vec<String>,
    stack_trace_lines: Vec<String>,
    origin: Option<CodeLocation>,
}

impl RecordBuilder {
    /// Start an empty record whose first physical line is `source_line` (0-based).
    pub fn new(source_line: u64) -> Self {
        Self {
            source_line,
            progress: ParseProgress::Message,
            special: SpecialMessageType::None,
            severity: Severity::Unknown,
            message_lines: Vec::new(),
            stack_trace_lines: Vec::new(),
            origin: None,
        }
    }

    /// Feed one physical line. `next_line` is the following line, or `""`
    /// at end of input.
    pub fn feed_line(&mut self, line: &str, next_line: &str) -> Result<(), RecordError> {
        if self.is_complete() {
            return Err(RecordError::InvalidState {
                line: self.source_line,
            });
        }

        let next = self.next_progress(line)?;
        if next != self.progress {
            tracing::trace!(
                source_line = self.source_line,
                from = ?self.progress,
                to = ?next,
                "record: progress advanced"
            );
            self.progress = next;
        }

        match self.progress {
            ParseProgress::Message => self.on_message(line, next_line),
            ParseProgress::Stacktrace => self.on_stacktrace(line),
            ParseProgress::BlankAfterStacktrace => {}
            ParseProgress::Location => self.on_location(line)?,
            ParseProgress::Done => {}
        }

        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.progress == ParseProgress::Done
    }

    pub fn progress(&self) -> ParseProgress {
        self.progress
    }

    pub fn source_line(&self) -> u64 {
        self.source_line
    }

    /// True while nothing but leading blank lines has been seen.
    pub fn is_empty(&self) -> bool {
        self.message_lines.is_empty() && self.stack_trace_lines.is_empty()
    }

    /// Transition rule for the current state.
    fn next_progress(&self, line: &str) -> Result<ParseProgress, RecordError> {
        let next = match self.progress {
            ParseProgress::Message if self.special == SpecialMessageType::None => {
                if is_stack_trace_line(line) {
                    ParseProgress::Stacktrace
                } else if !self.message_lines.is_empty() && origin_location(line)?.is_some() {
                    ParseProgress::Location
                } else {
                    ParseProgress::Message
                }
            }
            ParseProgress::Stacktrace if line.trim().is_empty() => {
                ParseProgress::BlankAfterStacktrace
            }
            ParseProgress::BlankAfterStacktrace => ParseProgress::Location,
            current => current,
        };
        Ok(next)
    }

    fn on_message(&mut self, line: &str, next_line: &str) {
        if self.message_lines.is_empty() && line.is_empty() {
            return;
        }
        self.message_lines.push(line.to_string());

        if self.message_lines.len() == 1 {
            self.special = classify_special(line);
            if self.special != SpecialMessageType::None {
                tracing::trace!(
                    source_line = self.source_line,
                    special = self.special.as_str(),
                    "record: special message detected"
                );
                self.severity = Severity::Info;
            }
        }

        if closes_special(self.special, line, next_line) {
            self.progress = ParseProgress::Done;
        }
    }

    fn on_stacktrace(&mut self, line: &str) {
        let frame = if line.starts_with(MANAGED_FRAME_PREFIX) {
            self.severity = Severity::Exception;
            strip_managed_frame(line)
        } else {
            if let Some(severity) = debug_call_severity(line) {
                self.severity = severity;
            }
            line
        };
        self.stack_trace_lines.push(frame.to_string());
    }

    fn on_location(&mut self, line: &str) -> Result<(), RecordError> {
        if let Some(origin) = origin_location(line)? {
            self.origin = Some(origin);
            self.progress = ParseProgress::Done;
        } else if line.starts_with('[') {
            self.severity = Severity::Warning;
        }
        Ok(())
    }

    /// Consume a completed builder into an immutable [`Record`].
    ///
    /// Exceptions take their origin from the first stack frame that names a
    /// file and line; the `(Filename: ...)` origin is the fallback.
    pub fn finish(self) -> Result<Record, RecordError> {
        if !self.is_complete() {
            return Err(RecordError::Incomplete {
                line: self.source_line,
            });
        }

        let mut origin = self.origin;
        if self.severity == Severity::Exception {
            for frame in &self.stack_trace_lines {
                if let Some(location) = exception_frame_location(frame)? {
                    origin = Some(location);
                    break;
                }
            }
        }

        Ok(Record {
            severity: self.severity,
            special: self.special,
            message_lines: self.message_lines,
            stack_trace_lines: self.stack_trace_lines,
            origin,
            source_line: self.source_line,
        })
    }
}

/// One complete logical log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    severity: Severity,
    special: SpecialMessageType,
    message_lines: Vec<String>,
    stack_trace_lines: Vec<String>,
    origin: Option<CodeLocation>,
    source_line: u64,
}

impl Record {
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn special(&self) -> SpecialMessageType {
        self.special
    }

    pub fn message_lines(&self) -> &[String] {
        &self.message_lines
    }

    pub fn stack_trace_lines(&self) -> &[String] {
        &self.stack_trace_lines
    }

    /// Message body, newline-joined.
    pub fn message(&self) -> String {
        self.message_lines.join("\n")
    }

    /// Stack trace, newline-joined; `None` when no frame was captured.
    pub fn stacktrace(&self) -> Option<String> {
        if self.stack_trace_lines.is_empty() {
            None
        } else {
            Some(self.stack_trace_lines.join("\n"))
        }
    }

    pub fn origin(&self) -> Option<&CodeLocation> {
        self.origin.as_ref()
    }

    /// 0-based offset of the record's first physical line.
    pub fn source_line(&self) -> u64 {
        self.source_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `lines` with lookahead until the builder completes.
    fn feed(builder: &mut RecordBuilder, lines: &[&str]) {
        for (i, line) in lines.iter().enumerate() {
            let next = lines.get(i + 1).copied().unwrap_or("");
            builder.feed_line(line, next).unwrap();
            if builder.is_complete() {
                return;
            }
        }
    }

    fn build(lines: &[&str]) -> Record {
        let mut builder = RecordBuilder::new(0);
        feed(&mut builder, lines);
        builder.finish().unwrap()
    }

    // ─── Plain messages with an origin line ─────────────────────

    #[test]
    fn test_message_then_filename_line() {
        let record = build(&["Hello world", "(Filename: C:/Game.cs Line: 42)"]);

        assert_eq!(record.severity(), Severity::Unknown);
        assert_eq!(record.message(), "Hello world");
        assert_eq!(record.origin(), Some(&CodeLocation::new("C:/Game.cs", 42)));
        assert_eq!(record.stacktrace(), None);
    }

    #[test]
    fn test_multiline_message_kept_in_order() {
        let record = build(&[
            "first",
            "second",
            "",
            "third",
            "(Filename: a.cs Line: 1)",
        ]);
        assert_eq!(record.message(), "first\nsecond\n\nthird");
    }

    #[test]
    fn test_leading_blank_lines_suppressed() {
        let mut builder = RecordBuilder::new(3);
        builder.feed_line("", "").unwrap();
        builder.feed_line("", "Hello").unwrap();
        assert!(builder.is_empty());

        builder.feed_line("Hello", "(Filename: a.cs Line: 1)").unwrap();
        builder.feed_line("(Filename: a.cs Line: 1)", "").unwrap();
        let record = builder.finish().unwrap();

        assert_eq!(record.message_lines(), &["Hello".to_string()]);
        assert_eq!(record.source_line(), 3);
    }

    #[test]
    fn test_filename_line_first_is_message_text() {
        let mut builder = RecordBuilder::new(0);
        builder.feed_line("(Filename: a.cs Line: 1)", "next").unwrap();
        assert_eq!(builder.progress(), ParseProgress::Message);
        assert!(!builder.is_complete());
    }

    // ─── Stack traces ───────────────────────────────────────────

    #[test]
    fn test_debug_log_stack_trace() {
        let record = build(&[
            "Player spawned",
            "UnityEngine.Debug:Log (object)",
            "Player:Start () (at Assets/Player.cs:12)",
            "",
            "(Filename: Assets/Player.cs Line: 12)",
        ]);

        // `Debug:Log (` has a space before the paren, so no severity is implied.
        assert_eq!(record.severity(), Severity::Unknown);
        assert_eq!(record.message(), "Player spawned");
        assert_eq!(
            record.stacktrace().as_deref(),
            Some("UnityEngine.Debug:Log (object)\nPlayer:Start () (at Assets/Player.cs:12)")
        );
        assert_eq!(record.origin(), Some(&CodeLocation::new("Assets/Player.cs", 12)));
    }

    #[test]
    fn test_debug_call_prefixes_set_severity() {
        let info = build(&["a", "UnityEngine.Debug:Log(Object)", "", "(Filename: a.cs Line: 1)"]);
        assert_eq!(info.severity(), Severity::Info);

        let warning = build(&[
            "a",
            "UnityEngine.Debug:LogWarning(Object)",
            "",
            "(Filename: a.cs Line: 1)",
        ]);
        assert_eq!(warning.severity(), Severity::Warning);
    }

    #[test]
    fn test_log_error_is_recorded_as_warning() {
        let record = build(&[
            "bad thing",
            "UnityEngine.Debug:LogError(Object)",
            "",
            "(Filename: a.cs Line: 1)",
        ]);
        assert_eq!(record.severity(), Severity::Warning);
    }

    #[test]
    fn test_exception_origin_from_frame() {
        let record = build(&[
            "MyType.MyMethod: boom",
            "  at Foo.Bar () [0x00000] in /src/Foo.cs:10",
            "",
            "(Filename: /src/Other.cs Line: 99)",
        ]);

        assert_eq!(record.severity(), Severity::Exception);
        assert!(record.message_lines().is_empty());
        assert_eq!(
            record.stack_trace_lines(),
            &[
                "MyType.MyMethod: boom".to_string(),
                "Foo.Bar () [0x00000] in /src/Foo.cs:10".to_string(),
            ]
        );
        assert_eq!(record.origin(), Some(&CodeLocation::new("/src/Foo.cs", 10)));
    }

    #[test]
    fn test_exception_message_then_managed_frames() {
        let record = build(&[
            "NullReferenceException: Object reference not set to an instance of an object",
            "  at Enemy.Update () [0x00010] in /proj/Enemy.cs:33",
            "  at Game.Tick () [0x00000] in /proj/Game.cs:8",
            "",
            "(Filename: /proj/Enemy.cs Line: 33)",
        ]);

        assert_eq!(record.severity(), Severity::Exception);
        assert_eq!(
            record.message(),
            "NullReferenceException: Object reference not set to an instance of an object"
        );
        assert_eq!(record.stack_trace_lines().len(), 2);
        assert_eq!(record.origin(), Some(&CodeLocation::new("/proj/Enemy.cs", 33)));
    }

    #[test]
    fn test_exception_without_frame_location_keeps_direct_origin() {
        let record = build(&[
            "Oops",
            "  at Foo.Bar () <0x0001>",
            "",
            "(Filename: /src/Foo.cs Line: 4)",
        ]);
        assert_eq!(record.severity(), Severity::Exception);
        assert_eq!(record.origin(), Some(&CodeLocation::new("/src/Foo.cs", 4)));
    }

    #[test]
    fn test_whitespace_only_line_ends_stack_trace() {
        let mut builder = RecordBuilder::new(0);
        builder.feed_line("A.B: x", "   ").unwrap();
        builder.feed_line("   ", "next").unwrap();
        assert_eq!(builder.progress(), ParseProgress::BlankAfterStacktrace);
        assert_eq!(builder.stack_trace_lines.len(), 1);
    }

    #[test]
    fn test_blank_after_stacktrace_advances_unconditionally() {
        let mut builder = RecordBuilder::new(0);
        builder.feed_line("A.B: x", "").unwrap();
        builder.feed_line("", "whatever").unwrap();
        builder.feed_line("whatever", "").unwrap();
        assert_eq!(builder.progress(), ParseProgress::Location);
        assert!(!builder.is_complete());
    }

    // ─── Location state ─────────────────────────────────────────

    #[test]
    fn test_bracketed_native_annotation_sets_warning() {
        let record = build(&[
            "Shader warning",
            "Renderer.Draw: fallback",
            "",
            "[./Runtime/Graphics/Shader.cpp line 120]",
            "(Filename: ./Runtime/Graphics/Shader.cpp Line: 120)",
        ]);
        assert_eq!(record.severity(), Severity::Warning);
        assert_eq!(
            record.origin(),
            Some(&CodeLocation::new("./Runtime/Graphics/Shader.cpp", 120))
        );
    }

    #[test]
    fn test_location_waits_for_origin_line() {
        let mut builder = RecordBuilder::new(0);
        feed(&mut builder, &["A.B: x", "", "unrelated", "still unrelated"]);
        assert_eq!(builder.progress(), ParseProgress::Location);
        assert!(!builder.is_complete());
    }

    // ─── Special messages ───────────────────────────────────────

    #[test]
    fn test_log_head_closes_on_last_thread_line() {
        let lines = [
            "Mono path[0] = '/x'",
            "  Thread -> id: 1",
            "  Thread -> id: 1",
            "  Thread -> id: 2",
            "Initialize engine version: 2019.4",
        ];
        let mut builder = RecordBuilder::new(0);
        for (i, line) in lines.iter().enumerate() {
            builder.feed_line(line, lines[i + 1]).unwrap();
            if i < 3 {
                assert!(!builder.is_complete(), "closed early at line {}", i);
            }
            if builder.is_complete() {
                assert_eq!(i, 3);
                break;
            }
        }

        let record = builder.finish().unwrap();
        assert_eq!(record.severity(), Severity::Info);
        assert_eq!(record.special(), SpecialMessageType::LogHead);
        assert_eq!(record.message_lines().len(), 4);
    }

    #[test]
    fn test_special_message_ignores_stack_like_lines() {
        let record = build(&[
            "System memory in use before: 60.2 MB.",
            "Memory.Allocator: 12 MB",
            "System memory in use after: 58.1 MB.",
        ]);
        assert_eq!(record.special(), SpecialMessageType::SystemMemory);
        assert_eq!(record.severity(), Severity::Info);
        assert_eq!(record.message_lines().len(), 3);
        assert_eq!(record.stacktrace(), None);
    }

    #[test]
    fn test_unloading_serialized_closes_on_unload_time() {
        let record = build(&[
            "Unloading 4 Unused Serialized files (Serialized files now loaded: 0)",
            "UnloadTime: 0.512000 ms",
        ]);
        assert_eq!(record.special(), SpecialMessageType::UnloadingSerialized);
        assert_eq!(record.message_lines().len(), 2);
    }

    #[test]
    fn test_unloading_assets_closes_on_total() {
        let record = build(&[
            "Unloading 12 unused Assets to reduce memory usage. Loaded Objects now: 900.",
            "Total: 3.100000 ms (FindLiveObjects: 0.1 ms CreateObjectMapping: 0.1 ms)",
        ]);
        assert_eq!(record.special(), SpecialMessageType::UnloadingAssets);
        assert_eq!(record.severity(), Severity::Info);
    }

    // ─── Lifecycle ──────────────────────────────────────────────

    #[test]
    fn test_feed_after_complete_is_invalid_state() {
        let mut builder = RecordBuilder::new(7);
        builder.feed_line("Hello", "(Filename: a.cs Line: 1)").unwrap();
        builder.feed_line("(Filename: a.cs Line: 1)", "").unwrap();
        assert!(builder.is_complete());

        let err = builder.feed_line("more", "").unwrap_err();
        assert!(matches!(err, RecordError::InvalidState { line: 7 }));
    }

    #[test]
    fn test_finish_incomplete_is_error() {
        let mut builder = RecordBuilder::new(2);
        builder.feed_line("dangling", "").unwrap();
        assert!(matches!(
            builder.finish(),
            Err(RecordError::Incomplete { line: 2 })
        ));
    }

    #[test]
    fn test_malformed_origin_number_is_hard_error() {
        let mut builder = RecordBuilder::new(0);
        builder.feed_line("Hello", "").unwrap();
        let err = builder
            .feed_line("(Filename: a.cs Line: 4294967296)", "")
            .unwrap_err();
        assert!(matches!(err, RecordError::MalformedLocation(_)));
    }
}
