//! Decoding of individual transcript lines.
//!
//! Each line of a session transcript is a JSON object with a `type`
//! discriminator. A line only has to be a JSON object to decode; its fields
//! are kept as raw JSON and read on demand, so a vendor changing the shape
//! of one field cannot break decoding of the rest of the line.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value};

/// Kind of a transcript entry, taken from its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `user` or `human`
    User,
    Assistant,
    /// Standalone `tool_use` entry (not nested in an assistant message)
    ToolUse,
    ToolResult,
    System,
    /// Any type tag not listed above, including a missing one
    Other,
}

impl EntryKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "user" | "human" => EntryKind::User,
            "assistant" => EntryKind::Assistant,
            "tool_use" => EntryKind::ToolUse,
            "tool_result" => EntryKind::ToolResult,
            "system" => EntryKind::System,
            _ => EntryKind::Other,
        }
    }
}

/// One decoded transcript line.
///
/// Only the outer object shape is checked eagerly. Every field is kept as
/// raw JSON and read through an accessor, so a field of unexpected shape
/// reads as absent instead of failing the whole line. Unknown fields are
/// ignored.
#[derive(Debug, Deserialize)]
pub struct TranscriptEntry {
    #[serde(rename = "type", default)]
    entry_type: Option<Box<RawValue>>,

    #[serde(default)]
    timestamp: Option<Box<RawValue>>,

    #[serde(rename = "gitBranch", default)]
    git_branch: Option<Box<RawValue>>,

    /// Version of the CLI tool that wrote the entry
    #[serde(default)]
    version: Option<Box<RawValue>>,

    #[serde(default)]
    model: Option<Box<RawValue>>,

    /// Tool name on standalone `tool_use` entries
    #[serde(default)]
    name: Option<Box<RawValue>>,

    #[serde(default)]
    tool_name: Option<Box<RawValue>>,

    /// Error flag on `tool_result` entries
    #[serde(default)]
    is_error: Option<Box<RawValue>>,

    #[serde(rename = "isError", default)]
    is_error_camel: Option<Box<RawValue>>,

    #[serde(default)]
    subtype: Option<Box<RawValue>>,

    #[serde(default)]
    level: Option<Box<RawValue>>,

    #[serde(default)]
    message: Option<Box<RawValue>>,

    #[serde(default)]
    content: Option<Box<RawValue>>,
}

impl TranscriptEntry {
    /// Kind of this entry.
    pub fn kind(&self) -> EntryKind {
        decode_str(&self.entry_type)
            .map(|tag| EntryKind::from_tag(&tag))
            .unwrap_or(EntryKind::Other)
    }

    /// Parse the entry timestamp as RFC 3339.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = decode_str(&self.timestamp)?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }

    pub fn git_branch(&self) -> Option<String> {
        decode_str(&self.git_branch)
    }

    pub fn version(&self) -> Option<String> {
        decode_str(&self.version)
    }

    /// Top-level model name (some writers put it outside `message`).
    pub fn model(&self) -> Option<String> {
        decode_str(&self.model)
    }

    /// Tool name of a standalone `tool_use` entry, from `name` or `tool_name`.
    pub fn tool_name(&self) -> Option<String> {
        decode_str(&self.name).or_else(|| decode_str(&self.tool_name))
    }

    /// Error flag of a `tool_result` entry, from `is_error` or `isError`.
    pub fn is_error(&self) -> Option<bool> {
        decode_bool(&self.is_error).or_else(|| decode_bool(&self.is_error_camel))
    }

    pub fn subtype(&self) -> Option<String> {
        decode_str(&self.subtype)
    }

    pub fn level(&self) -> Option<String> {
        decode_str(&self.level)
    }

    /// Decode the nested `message` payload.
    ///
    /// Returns `None` when absent or when it is not an object.
    pub fn message(&self) -> Option<MessagePayload> {
        let raw = self.message.as_deref()?;
        serde_json::from_str(raw.get()).ok()
    }

    /// Top-level `content` as plain text, empty if it is not a string.
    pub fn content_text(&self) -> String {
        decode_text(self.content.as_deref())
    }
}

/// The `message` object nested in user and assistant entries.
#[derive(Debug, Default, Deserialize)]
pub struct MessagePayload {
    #[serde(default)]
    model: Option<Box<RawValue>>,

    #[serde(default)]
    content: Option<Box<RawValue>>,

    #[serde(default)]
    usage: Option<Box<RawValue>>,
}

impl MessagePayload {
    pub fn model(&self) -> Option<String> {
        decode_str(&self.model)
    }

    /// Message content as plain text, empty if it is not a string.
    pub fn content_text(&self) -> String {
        decode_text(self.content.as_deref())
    }

    /// Token usage, with any missing or malformed counter read as zero.
    pub fn usage(&self) -> TokenUsage {
        self.usage
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Map<String, Value>>(raw.get()).ok())
            .map(|usage| TokenUsage::from_map(&usage))
            .unwrap_or_default()
    }

    /// Content items of an array-shaped `content`.
    ///
    /// Items that are not objects are dropped individually.
    pub fn content_items(&self) -> Vec<ContentItem> {
        let Some(raw) = self.content.as_deref() else {
            return Vec::new();
        };
        let Ok(items) = serde_json::from_str::<Vec<Box<RawValue>>>(raw.get()) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| serde_json::from_str(item.get()).ok())
            .collect()
    }
}

/// One item of an array-shaped message `content`.
#[derive(Debug, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    item_type: Option<Box<RawValue>>,

    #[serde(default)]
    name: Option<Box<RawValue>>,

    /// Tool input, schema varies by tool
    #[serde(default)]
    input: Option<Box<RawValue>>,
}

impl ContentItem {
    pub fn is_tool_use(&self) -> bool {
        decode_str(&self.item_type).as_deref() == Some("tool_use")
    }

    pub fn name(&self) -> Option<String> {
        decode_str(&self.name)
    }

    pub fn input(&self) -> Option<&RawValue> {
        self.input.as_deref()
    }
}

/// Token counters from one `usage` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub thinking: u64,
    pub cache_read: u64,
    pub cache_write: u64,
}

impl TokenUsage {
    fn from_map(usage: &Map<String, Value>) -> Self {
        let count = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            input: count("input_tokens"),
            output: count("output_tokens"),
            thinking: count("thinking_tokens"),
            cache_read: count("cache_read_input_tokens"),
            cache_write: count("cache_creation_input_tokens"),
        }
    }
}

/// Decode a raw JSON value as a string, or empty if it is anything else.
pub fn decode_text(raw: Option<&RawValue>) -> String {
    raw.and_then(|raw| serde_json::from_str::<String>(raw.get()).ok())
        .unwrap_or_default()
}

fn decode_str(raw: &Option<Box<RawValue>>) -> Option<String> {
    raw.as_deref()
        .and_then(|raw| serde_json::from_str::<String>(raw.get()).ok())
}

fn decode_bool(raw: &Option<Box<RawValue>>) -> Option<bool> {
    raw.as_deref()
        .and_then(|raw| serde_json::from_str::<bool>(raw.get()).ok())
}

/// Decode one transcript line.
///
/// Blank lines and lines that are not a JSON object yield `None`.
pub fn decode_line(line: &str) -> Option<TranscriptEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    serde_json::from_str(line).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_decode_to_nothing() {
        assert!(decode_line("").is_none());
        assert!(decode_line("   \t ").is_none());
    }

    #[test]
    fn test_garbage_decodes_to_nothing() {
        assert!(decode_line("[2026-02-08 14:40:22] [INFO] Log rotated").is_none());
        assert!(decode_line(r#"{"type":"user","#).is_none());
        assert!(decode_line("42").is_none());
    }

    #[test]
    fn test_decode_envelope() {
        let line = r#"{"type":"assistant","timestamp":"2025-10-01T12:00:00Z","gitBranch":"main","version":"2.0.1","uuid":"abc","message":{"model":"claude-sonnet-4-5","content":[]}}"#;
        let entry = decode_line(line).unwrap();

        assert_eq!(entry.kind(), EntryKind::Assistant);
        assert_eq!(entry.git_branch().as_deref(), Some("main"));
        assert_eq!(entry.version().as_deref(), Some("2.0.1"));
        assert_eq!(
            entry.parsed_timestamp().unwrap().to_rfc3339(),
            "2025-10-01T12:00:00+00:00"
        );
        assert_eq!(entry.message().unwrap().model().as_deref(), Some("claude-sonnet-4-5"));
    }

    #[test]
    fn test_kind_mapping() {
        let kind = |line: &str| decode_line(line).unwrap().kind();
        assert_eq!(kind(r#"{"type":"human"}"#), EntryKind::User);
        assert_eq!(kind(r#"{"type":"tool_use"}"#), EntryKind::ToolUse);
        assert_eq!(kind(r#"{"type":"tool_result"}"#), EntryKind::ToolResult);
        assert_eq!(kind(r#"{"type":"system"}"#), EntryKind::System);
        assert_eq!(kind(r#"{"type":"file-history-snapshot"}"#), EntryKind::Other);
        assert_eq!(kind(r#"{"uuid":"no-type"}"#), EntryKind::Other);
    }

    #[test]
    fn test_bad_timestamp_is_ignored() {
        let entry = decode_line(r#"{"type":"user","timestamp":"yesterday"}"#).unwrap();
        assert!(entry.parsed_timestamp().is_none());
    }

    #[test]
    fn test_message_of_unexpected_shape() {
        let entry = decode_line(r#"{"type":"user","message":"hello"}"#).unwrap();
        assert!(entry.message().is_none());
    }

    #[test]
    fn test_usage_missing_and_malformed_fields_are_zero() {
        let entry = decode_line(
            r#"{"type":"assistant","message":{"usage":{"input_tokens":10,"output_tokens":"many","cache_read_input_tokens":-3,"thinking_tokens":7}}}"#,
        )
        .unwrap();
        let usage = entry.message().unwrap().usage();
        assert_eq!(
            usage,
            TokenUsage {
                input: 10,
                output: 0,
                thinking: 7,
                cache_read: 0,
                cache_write: 0,
            }
        );
    }

    #[test]
    fn test_content_items_skip_non_objects() {
        let entry = decode_line(
            r#"{"type":"assistant","message":{"content":["stray",{"type":"text","text":"hi"},{"type":"tool_use","name":"Read","input":{"file_path":"/x"}}]}}"#,
        )
        .unwrap();
        let items = entry.message().unwrap().content_items();
        assert_eq!(items.len(), 2);
        assert!(!items[0].is_tool_use());
        assert!(items[1].is_tool_use());
        assert_eq!(items[1].name().as_deref(), Some("Read"));
    }

    #[test]
    fn test_content_text_only_for_strings() {
        let entry = decode_line(r#"{"type":"system","content":"rate limited"}"#).unwrap();
        assert_eq!(entry.content_text(), "rate limited");

        let entry = decode_line(r#"{"type":"system","content":{"text":"nested"}}"#).unwrap();
        assert_eq!(entry.content_text(), "");
    }

    #[test]
    fn test_fields_of_unexpected_shape_read_as_absent() {
        let entry = decode_line(
            r#"{"type":"user","level":{"severity":"info"},"subtype":7,"gitBranch":["main"],"version":2,"timestamp":1759312800,"message":{"content":"hi"}}"#,
        )
        .unwrap();

        assert_eq!(entry.kind(), EntryKind::User);
        assert!(entry.level().is_none());
        assert!(entry.subtype().is_none());
        assert!(entry.git_branch().is_none());
        assert!(entry.version().is_none());
        assert!(entry.parsed_timestamp().is_none());
        assert_eq!(entry.message().unwrap().content_text(), "hi");

        let entry = decode_line(r#"{"type":7,"name":["x"],"is_error":"yes"}"#).unwrap();
        assert_eq!(entry.kind(), EntryKind::Other);
        assert!(entry.tool_name().is_none());
        assert!(entry.is_error().is_none());
    }

    #[test]
    fn test_message_model_of_unexpected_shape() {
        let entry = decode_line(
            r#"{"type":"assistant","message":{"model":{"id":"x"},"usage":{"input_tokens":4}}}"#,
        )
        .unwrap();
        let message = entry.message().unwrap();
        assert!(message.model().is_none());
        assert_eq!(message.usage().input, 4);
    }

    #[test]
    fn test_both_spellings_of_tool_fields() {
        let entry =
            decode_line(r#"{"type":"tool_result","is_error":true,"isError":true}"#).unwrap();
        assert_eq!(entry.is_error(), Some(true));

        let entry = decode_line(r#"{"type":"tool_result","isError":true}"#).unwrap();
        assert_eq!(entry.is_error(), Some(true));

        let entry = decode_line(r#"{"type":"tool_result","is_error":false,"isError":true}"#).unwrap();
        assert_eq!(entry.is_error(), Some(false));

        let entry = decode_line(r#"{"type":"tool_use","name":"Read","tool_name":"Read"}"#).unwrap();
        assert_eq!(entry.tool_name().as_deref(), Some("Read"));

        let entry = decode_line(r#"{"type":"tool_use","tool_name":"Grep"}"#).unwrap();
        assert_eq!(entry.tool_name().as_deref(), Some("Grep"));

        let entry = decode_line(r#"{"type":"tool_use","name":5,"tool_name":"Grep"}"#).unwrap();
        assert_eq!(entry.tool_name().as_deref(), Some("Grep"));
    }
}
