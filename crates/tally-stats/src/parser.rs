//! Transcript parser that folds a session log into [`Statistics`].
//!
//! A transcript is JSON Lines, one event per line, with a vendor-controlled
//! and unversioned schema. Lines that fail to decode are skipped; only a
//! failure to open or read the source aborts a parse.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use tracing::{debug, trace};

use crate::entry::{EntryKind, TranscriptEntry, decode_line};
use crate::error::{Result, StatsError};
use crate::limit::detect_limit;
use crate::models::Statistics;
use crate::tools::ToolUsage;

/// Default per-line ceiling (1 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Maximum characters kept from the first user prompt.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Characters of a tool result scanned for the word "error".
const ERROR_SCAN_CHARS: usize = 100;

/// Parser for session transcripts.
#[derive(Debug, Clone)]
pub struct TranscriptParser {
    max_line_bytes: usize,
}

impl TranscriptParser {
    /// Create a parser with the default 1 MiB line ceiling.
    pub fn new() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Create a parser that skips lines longer than `max_line_bytes`.
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self { max_line_bytes }
    }

    /// Parse a transcript file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a JSON Lines transcript
    ///
    /// # Returns
    ///
    /// The folded [`Statistics`]. Undecodable, oversized and non-UTF-8 lines
    /// are skipped. Fails with [`StatsError::Open`] if the file cannot be
    /// opened and [`StatsError::Read`] if reading stops part way.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tally_stats::TranscriptParser;
    ///
    /// let stats = TranscriptParser::new().parse_file("session.jsonl")?;
    /// println!("{} tool calls", stats.tool_calls);
    /// # Ok::<(), tally_stats::StatsError>(())
    /// ```
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Statistics> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StatsError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(file = %path.display(), "Parsing transcript");
        self.parse_reader(BufReader::new(file))
            .map_err(|source| StatsError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Parse a transcript from any buffered reader.
    ///
    /// Errors only if the reader itself fails.
    pub fn parse_reader<R: BufRead>(&self, mut reader: R) -> io::Result<Statistics> {
        let mut acc = StatsAccumulator::new();
        let mut buf = Vec::new();
        let mut line_number = 0usize;
        let mut skipped = 0usize;

        loop {
            let read = read_bounded_line(&mut reader, self.max_line_bytes, &mut buf)?;
            line_number += 1;

            match read {
                LineRead::Eof => break,
                LineRead::Oversized => {
                    trace!(line = line_number, limit = self.max_line_bytes, "Skipping oversized line");
                    skipped += 1;
                }
                LineRead::Line => {
                    let Ok(line) = std::str::from_utf8(&buf) else {
                        trace!(line = line_number, "Skipping non-UTF-8 line");
                        skipped += 1;
                        continue;
                    };
                    match decode_line(line) {
                        Some(entry) => acc.apply(&entry),
                        None if line.trim().is_empty() => {}
                        None => {
                            trace!(line = line_number, "Skipping undecodable line");
                            skipped += 1;
                        }
                    }
                }
            }
        }

        let stats = acc.finish();
        debug!(
            lines = line_number - 1,
            skipped,
            user_prompts = stats.user_prompts,
            assistant_responses = stats.assistant_responses,
            tool_calls = stats.tool_calls,
            "Parsed transcript"
        );
        Ok(stats)
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a transcript file with default settings.
pub fn parse_transcript<P: AsRef<Path>>(path: P) -> Result<Statistics> {
    TranscriptParser::new().parse_file(path)
}

/// Running fold state for one transcript.
///
/// Apply decoded entries in file order, then call [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    stats: Statistics,
    tools: ToolUsage,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one entry into the running statistics.
    pub fn apply(&mut self, entry: &TranscriptEntry) {
        if let Some(ts) = entry.parsed_timestamp() {
            if self.stats.start_time.is_none() {
                self.stats.start_time = Some(ts);
            }
            self.stats.end_time = Some(ts);
        }
        set_if_empty(&mut self.stats.git_branch, entry.git_branch());
        set_if_empty(&mut self.stats.tool_version, entry.version());

        match entry.kind() {
            EntryKind::User => self.apply_user(entry),
            EntryKind::Assistant => self.apply_assistant(entry),
            EntryKind::ToolUse => {
                self.tools.record_call(&entry.tool_name().unwrap_or_default());
            }
            EntryKind::ToolResult => self.apply_tool_result(entry),
            EntryKind::System => {
                if let Some(message) = detect_limit(entry) {
                    debug!(message = %message, "Limit notice detected");
                    self.stats.limit_message = Some(message);
                }
            }
            EntryKind::Other => {}
        }
    }

    fn apply_user(&mut self, entry: &TranscriptEntry) {
        self.stats.user_prompts += 1;

        if !self.stats.summary.is_empty() {
            return;
        }
        let text = entry
            .message()
            .map(|message| message.content_text())
            .unwrap_or_default();
        if !text.is_empty() {
            self.stats.summary = text.chars().take(SUMMARY_MAX_CHARS).collect();
        }
    }

    fn apply_assistant(&mut self, entry: &TranscriptEntry) {
        self.stats.assistant_responses += 1;

        let message = entry.message().unwrap_or_default();

        let usage = message.usage();
        let stats = &mut self.stats;
        stats.input_tokens = stats.input_tokens.saturating_add(usage.input);
        stats.output_tokens = stats.output_tokens.saturating_add(usage.output);
        stats.thinking_tokens = stats.thinking_tokens.saturating_add(usage.thinking);
        stats.cache_read_tokens = stats.cache_read_tokens.saturating_add(usage.cache_read);
        stats.cache_write_tokens = stats.cache_write_tokens.saturating_add(usage.cache_write);

        let model = message
            .model()
            .filter(|m| !m.is_empty())
            .or_else(|| entry.model());
        set_if_empty(&mut self.stats.model, model);

        for item in message.content_items() {
            if item.is_tool_use() {
                self.tools
                    .record(&item.name().unwrap_or_default(), item.input());
            }
        }
    }

    fn apply_tool_result(&mut self, entry: &TranscriptEntry) {
        if entry.is_error() == Some(true) {
            self.stats.errors += 1;
            return;
        }

        let head: String = entry.content_text().chars().take(ERROR_SCAN_CHARS).collect();
        if head.to_lowercase().contains("error") {
            self.stats.errors += 1;
        }
    }

    /// Finish the fold, materializing the tool usage into the statistics.
    pub fn finish(self) -> Statistics {
        let Self { mut stats, tools } = self;
        stats.tool_calls = tools.calls;
        stats.tool_counts = tools.by_name;
        stats.accessed_files = tools.accessed.into_iter().collect();
        stats.modified_files = tools.modified.into_iter().collect();
        stats
    }
}

/// Set a sticky field unless it already holds a value.
fn set_if_empty(field: &mut String, value: Option<String>) {
    if field.is_empty()
        && let Some(value) = value.filter(|v| !v.is_empty())
    {
        *field = value;
    }
}

enum LineRead {
    Line,
    Oversized,
    Eof,
}

/// Read one line into `buf` without ever buffering more than `max_bytes + 1`.
///
/// The line terminator is stripped. An over-long line is consumed up to and
/// including its newline and reported as [`LineRead::Oversized`].
fn read_bounded_line<R: BufRead>(
    reader: &mut R,
    max_bytes: usize,
    buf: &mut Vec<u8>,
) -> io::Result<LineRead> {
    buf.clear();
    let limit = max_bytes as u64 + 1;
    let n = reader.by_ref().take(limit).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        return Ok(LineRead::Line);
    }

    if buf.len() <= max_bytes {
        // last line without a trailing newline
        return Ok(LineRead::Line);
    }

    buf.clear();
    skip_past_newline(reader)?;
    Ok(LineRead::Oversized)
}

fn skip_past_newline<R: BufRead>(reader: &mut R) -> io::Result<()> {
    loop {
        let (found, used) = {
            let available = reader.fill_buf()?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (true, i + 1),
                None => (false, available.len()),
            }
        };
        reader.consume(used);
        if found {
            return Ok(());
        }
    }
}
