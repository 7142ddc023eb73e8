// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSONL parsing for Claude Code session logs.
//!
//! A session log has one JSON object per line. Each `user` or `assistant`
//! entry carries a `message.content` that is either a plain string or an array
//! of content items (text, thinking, tool calls and tool results). This module
//! flattens those entries into an ordered list of [`Record`]s, one per content
//! item, which is what the renderer consumes.
//!
//! # Format Overview
//!
//! ```text
//! {"type":"user","timestamp":"…","message":{"role":"user","content":"Fix the bug"}}
//! {"type":"assistant","message":{"content":[{"type":"tool_use","id":"t1","name":"Read","input":{…}}]}}
//! {"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":"…"}]}}
//! ```
//!
//! Tool results are correlated with the tool call that produced them through
//! `tool_use_id`. Results of `Edit` and `MultiEdit` calls become
//! [`ToolOutput::Edit`] payloads so they can be rendered as diffs.
//!
//! # Example
//!
//! ```
//! use cc2html::parser::{Content, parse_session};
//!
//! let jsonl = r#"{"type":"user","message":{"content":"Hello"}}
//! {"type":"assistant","message":{"content":[{"type":"text","text":"Hi!"}]}}"#;
//!
//! let session = parse_session(jsonl).unwrap();
//! assert_eq!(session.records.len(), 2);
//! assert!(matches!(&session.records[0].content, Content::User(text) if text == "Hello"));
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use snafu::prelude::*;
use std::collections::HashMap;

/// Error type for session log parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// No line of the input was valid JSON.
    #[snafu(display("no valid JSON records found: {source}"))]
    NoRecords {
        /// The error from the first line that failed to parse.
        source: serde_json::Error,
    },
}

/// A parsed session log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Renderable content, in log order.
    pub records: Vec<Record>,
    /// Every timestamped `user`, `assistant` and `system` entry, in log order,
    /// including entries that produced no records.
    pub activity: Vec<Activity>,
}

/// Who wrote a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The user, including tool results sent back on their behalf.
    User,
    /// The assistant.
    Assistant,
    /// Claude Code itself (notices, hook output).
    System,
}

/// When a log entry was written and by whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    /// The entry's author.
    pub role: Role,
    /// The entry's timestamp.
    pub timestamp: DateTime<Utc>,
}

/// One entry of the session, in log order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// When the enclosing log entry was written, if known.
    pub timestamp: Option<DateTime<Utc>>,
    /// What the record holds.
    pub content: Content,
}

/// The payload of a [`Record`], tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Text typed by the user.
    User(String),
    /// Text written by the assistant.
    Assistant(String),
    /// The assistant's extended thinking.
    Thinking(String),
    /// A tool invocation made by the assistant.
    ToolCall(ToolInvocation),
    /// The result returned for a tool invocation.
    ToolResult(ToolResult),
    /// A content item this parser does not understand.
    ///
    /// Kept so that new item types show up in the output instead of
    /// silently disappearing.
    Unknown {
        /// The item's `type` field.
        kind: String,
        /// A textual description of the item.
        text: String,
    },
}

/// A tool call made by the assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Identifier used to match the call with its result.
    pub id: String,
    /// The tool name (e.g., "Read", "Edit", "Bash").
    pub tool_name: String,
    /// The call's arguments.
    pub parameters: Map<String, Value>,
}

impl ToolInvocation {
    /// Returns a string parameter by name.
    #[must_use]
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }
}

/// The result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Identifier of the call this result answers.
    pub tool_use_id: String,
    /// Name of the tool that produced the result; empty if the call is unknown.
    pub tool_name: String,
    /// The result body.
    pub output: ToolOutput,
    /// Whether the tool reported a failure.
    pub is_error: bool,
}

/// The body of a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// Plain text output.
    Text(String),
    /// A file edit, rendered as a diff.
    Edit(EditPayload),
}

/// Before and after text of a file edit.
///
/// Either side may be missing in malformed logs; the diff treats a missing
/// side as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPayload {
    /// The edited file, if recorded.
    pub file_path: Option<String>,
    /// The replaced text.
    pub old_text: Option<String>,
    /// The replacement text.
    pub new_text: Option<String>,
}

/// Parses a JSONL session log into records.
///
/// Blank lines and lines that are not valid JSON are skipped. Only `user` and
/// `assistant` entries produce records; `system` entries count towards
/// [`Session::activity`] only, and everything else (summaries, snapshots) is
/// ignored.
///
/// # Errors
///
/// Returns [`ParseError::NoRecords`] if the input has content but not a
/// single line of it is valid JSON.
///
/// # Example
///
/// ```
/// use cc2html::parser::parse_session;
///
/// assert!(parse_session("").unwrap().records.is_empty());
/// assert!(parse_session("not json").is_err());
/// ```
pub fn parse_session(jsonl: &str) -> Result<Session, ParseError> {
    let mut parser = SessionParser::default();
    let mut first_error = None;
    let mut parsed_any = false;

    for line in jsonl.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<Value>(line) {
            Ok(value) => {
                parsed_any = true;
                parser.push_entry(&value);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    if !parsed_any && let Some(source) = first_error {
        return Err(source).context(NoRecordsSnafu);
    }

    Ok(parser.session)
}

/// The envelope of one log line. Content items stay raw since their shape
/// depends on their `type`.
#[derive(Deserialize)]
struct Entry {
    #[serde(rename = "type")]
    kind: String,
    timestamp: Option<String>,
    message: Option<EntryMessage>,
}

#[derive(Deserialize)]
struct EntryMessage {
    #[serde(default)]
    content: Value,
}

/// Accumulates records and remembers tool calls for result correlation.
#[derive(Default)]
struct SessionParser {
    session: Session,
    calls: HashMap<String, ToolInvocation>,
}

impl SessionParser {
    fn push_entry(&mut self, value: &Value) {
        let Ok(entry) = Entry::deserialize(value) else {
            return;
        };
        let role = match entry.kind.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            _ => return,
        };
        let timestamp = entry.timestamp.as_deref().and_then(parse_timestamp);
        if let Some(timestamp) = timestamp {
            self.session.activity.push(Activity { role, timestamp });
        }

        let from_user = match role {
            Role::User => true,
            Role::Assistant => false,
            Role::System => return,
        };

        match entry.message.map(|m| m.content) {
            Some(Value::String(text)) => self.push_text(from_user, &text, timestamp),
            Some(Value::Array(items)) => {
                for item in &items {
                    self.push_item(from_user, item, timestamp);
                }
            }
            _ => {}
        }
    }

    fn push(&mut self, content: Content, timestamp: Option<DateTime<Utc>>) {
        self.session.records.push(Record { timestamp, content });
    }

    fn push_text(&mut self, from_user: bool, text: &str, timestamp: Option<DateTime<Utc>>) {
        if text.trim().is_empty() {
            return;
        }
        let content = if from_user {
            Content::User(text.to_owned())
        } else {
            Content::Assistant(text.to_owned())
        };
        self.push(content, timestamp);
    }

    fn push_item(&mut self, from_user: bool, item: &Value, timestamp: Option<DateTime<Utc>>) {
        let kind = match item {
            Value::String(text) => return self.push_text(from_user, text, timestamp),
            Value::Object(_) => get_str(item, &["type"]).unwrap_or("unknown"),
            _ => return,
        };

        match kind {
            "text" => {
                let text = get_str(item, &["text"]).unwrap_or_default();
                self.push_text(from_user, text, timestamp);
            }
            "thinking" => {
                let text = get_str(item, &["thinking"]).unwrap_or_default();
                if !text.trim().is_empty() {
                    self.push(Content::Thinking(text.to_owned()), timestamp);
                }
            }
            "tool_use" => {
                let call = ToolInvocation {
                    id: get_string(item, &["id"]).unwrap_or_default(),
                    tool_name: get_string(item, &["name"]).unwrap_or_else(|| "Unknown".into()),
                    parameters: item
                        .get("input")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                };
                self.calls.insert(call.id.clone(), call.clone());
                self.push(Content::ToolCall(call), timestamp);
            }
            "tool_result" => {
                let result = self.tool_result(item);
                self.push(Content::ToolResult(result), timestamp);
            }
            other => {
                let content = Content::Unknown {
                    kind: other.to_owned(),
                    text: describe_unknown(other, item),
                };
                self.push(content, timestamp);
            }
        }
    }

    fn tool_result(&self, item: &Value) -> ToolResult {
        let tool_use_id = get_string(item, &["tool_use_id"]).unwrap_or_default();
        let is_error = item
            .get("is_error")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let call = self.calls.get(&tool_use_id);

        let output = call
            .filter(|_| !is_error)
            .and_then(edit_payload)
            .map_or_else(
                || ToolOutput::Text(result_text(item.get("content"))),
                ToolOutput::Edit,
            );

        ToolResult {
            tool_name: call.map(|c| c.tool_name.clone()).unwrap_or_default(),
            tool_use_id,
            output,
            is_error,
        }
    }
}

/// Builds the diff payload for edit-type tool calls.
fn edit_payload(call: &ToolInvocation) -> Option<EditPayload> {
    let file_path = call.param_str("file_path").map(str::to_owned);
    match call.tool_name.as_str() {
        "Edit" => Some(EditPayload {
            file_path,
            old_text: call.param_str("old_string").map(str::to_owned),
            new_text: call.param_str("new_string").map(str::to_owned),
        }),
        "MultiEdit" => {
            let edits = call.parameters.get("edits").and_then(Value::as_array)?;
            let join = |key: &str| {
                edits
                    .iter()
                    .filter_map(|edit| get_str(edit, &[key]))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            Some(EditPayload {
                file_path,
                old_text: Some(join("old_string")),
                new_text: Some(join("new_string")),
            })
        }
        _ => None,
    }
}

/// Flattens tool result content, which is either a string or a list of
/// `{"type": "text"}` items.
fn result_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.as_str()),
                Value::Object(_) if get_str(item, &["type"]) == Some("text") => {
                    get_str(item, &["text"])
                }
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Produces display text for an unrecognized content item.
fn describe_unknown(kind: &str, item: &Value) -> String {
    if kind == "image" {
        let media_type = get_str(item, &["source", "media_type"]).unwrap_or("unknown format");
        return format!("[image: {media_type}]");
    }
    serde_json::to_string_pretty(item).unwrap_or_else(|_| item.to_string())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Navigates a JSON path and returns the string value at the end.
fn get_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str()
}

/// Like [`get_str`] but returns an owned `String`.
fn get_string(value: &Value, path: &[&str]) -> Option<String> {
    get_str(value, path).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(jsonl: &str) -> Vec<Record> {
        parse_session(jsonl).unwrap().records
    }

    fn contents(jsonl: &str) -> Vec<Content> {
        parse(jsonl).into_iter().map(|r| r.content).collect()
    }

    #[test]
    fn parses_string_content() {
        let records = contents(r#"{"type":"user","message":{"content":"Hello"}}"#);
        assert_eq!(records, vec![Content::User("Hello".into())]);
    }

    #[test]
    fn parses_text_items_by_entry_type() {
        let records = contents(
            r#"{"type":"user","message":{"content":[{"type":"text","text":"Q"}]}}
{"type":"assistant","message":{"content":[{"type":"text","text":"A"}]}}"#,
        );
        assert_eq!(
            records,
            vec![Content::User("Q".into()), Content::Assistant("A".into())]
        );
    }

    #[test]
    fn preserves_item_order_within_entry() {
        let records = contents(
            r#"{"type":"assistant","message":{"content":[
                {"type":"thinking","thinking":"hmm"},
                {"type":"text","text":"Let me look."},
                {"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"/a.rs"}}
            ]}}"#
                .replace('\n', " ")
                .as_str(),
        );

        assert!(matches!(&records[0], Content::Thinking(t) if t == "hmm"));
        assert!(matches!(&records[1], Content::Assistant(t) if t == "Let me look."));
        match &records[2] {
            Content::ToolCall(call) => {
                assert_eq!(call.id, "t1");
                assert_eq!(call.tool_name, "Read");
                assert_eq!(call.param_str("file_path"), Some("/a.rs"));
            }
            other => panic!("Expected ToolCall, got {other:?}"),
        }
    }

    #[test]
    fn skips_blank_text_and_thinking() {
        let records = contents(
            r#"{"type":"assistant","message":{"content":[{"type":"text","text":"  "},{"type":"thinking","thinking":""}]}}"#,
        );
        assert!(records.is_empty());
    }

    #[test]
    fn skips_other_entry_types() {
        let records = contents(
            r#"{"type":"summary","summary":"Something"}
{"type":"system","content":"notice"}
{"type":"file-history-snapshot","snapshot":{}}"#,
        );
        assert!(records.is_empty());
    }

    #[test]
    fn skips_invalid_lines_and_blank_lines() {
        let records = contents(
            "\n{\"type\":\"user\",\"message\":{\"content\":\"ok\"}}\n{broken\n\n",
        );
        assert_eq!(records, vec![Content::User("ok".into())]);
    }

    #[test]
    fn errors_when_nothing_parses() {
        assert!(matches!(
            parse_session("{broken\nalso broken"),
            Err(ParseError::NoRecords { .. })
        ));
    }

    #[test]
    fn empty_input_is_empty_session() {
        assert!(parse("").is_empty());
        assert!(parse("\n \n").is_empty());
    }

    #[test]
    fn parses_timestamps() {
        let records = parse(
            r#"{"type":"user","timestamp":"2025-06-01T12:30:00.123Z","message":{"content":"hi"}}
{"type":"user","timestamp":"yesterday","message":{"content":"bad"}}"#,
        );

        let ts = records[0].timestamp.unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-06-01T12:30:00.123+00:00");
        assert!(records[1].timestamp.is_none());
    }

    #[test]
    fn records_activity_for_every_timestamped_entry() {
        let session = parse_session(
            r#"{"type":"user","timestamp":"2025-06-01T10:00:00Z","message":{"content":"go"}}
{"type":"system","timestamp":"2025-06-01T10:00:01Z","content":"hook ran"}
{"type":"assistant","timestamp":"2025-06-01T10:00:02Z","message":{"content":[{"type":"text","text":"  "}]}}
{"type":"user","timestamp":"2025-06-01T10:00:03Z","message":{"content":[{"type":"image","source":{"media_type":"image/png"}}]}}
{"type":"summary","timestamp":"2025-06-01T10:00:04Z","summary":"ignored"}
{"type":"assistant","message":{"content":"no timestamp"}}"#,
        )
        .unwrap();

        let roles: Vec<Role> = session.activity.iter().map(|a| a.role).collect();
        assert_eq!(
            roles,
            [Role::User, Role::System, Role::Assistant, Role::User]
        );
        assert_eq!(session.records.len(), 3);
    }

    #[test]
    fn correlates_tool_results_with_calls() {
        let records = contents(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t1","name":"Bash","input":{"command":"ls"}}]}}
{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":"a\nb"}]}}"#,
        );

        match &records[1] {
            Content::ToolResult(result) => {
                assert_eq!(result.tool_use_id, "t1");
                assert_eq!(result.tool_name, "Bash");
                assert_eq!(result.output, ToolOutput::Text("a\nb".into()));
                assert!(!result.is_error);
            }
            other => panic!("Expected ToolResult, got {other:?}"),
        }
    }

    #[test]
    fn joins_structured_result_content() {
        let records = contents(
            r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"x","content":[{"type":"text","text":"one"},{"type":"image"},{"type":"text","text":"two"}]}]}}"#,
        );

        match &records[0] {
            Content::ToolResult(result) => {
                assert_eq!(result.output, ToolOutput::Text("one\ntwo".into()));
                assert_eq!(result.tool_name, "");
            }
            other => panic!("Expected ToolResult, got {other:?}"),
        }
    }

    #[test]
    fn edit_results_carry_diff_payload() {
        let records = contents(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"e1","name":"Edit","input":{"file_path":"/src/lib.rs","old_string":"a","new_string":"b"}}]}}
{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"e1","content":"ok"}]}}"#,
        );

        match &records[1] {
            Content::ToolResult(result) => assert_eq!(
                result.output,
                ToolOutput::Edit(EditPayload {
                    file_path: Some("/src/lib.rs".into()),
                    old_text: Some("a".into()),
                    new_text: Some("b".into()),
                })
            ),
            other => panic!("Expected ToolResult, got {other:?}"),
        }
    }

    #[test]
    fn edit_with_missing_strings_keeps_none() {
        let records = contents(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"e1","name":"Edit","input":{"new_string":"b"}}]}}
{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"e1","content":"ok"}]}}"#,
        );

        match &records[1] {
            Content::ToolResult(ToolResult {
                output: ToolOutput::Edit(payload),
                ..
            }) => {
                assert!(payload.file_path.is_none());
                assert!(payload.old_text.is_none());
                assert_eq!(payload.new_text.as_deref(), Some("b"));
            }
            other => panic!("Expected edit ToolResult, got {other:?}"),
        }
    }

    #[test]
    fn multi_edit_concatenates_edits() {
        let records = contents(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"m1","name":"MultiEdit","input":{"file_path":"f","edits":[{"old_string":"a","new_string":"b"},{"old_string":"c","new_string":"d"}]}}]}}
{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"m1","content":"ok"}]}}"#,
        );

        match &records[1] {
            Content::ToolResult(ToolResult {
                output: ToolOutput::Edit(payload),
                ..
            }) => {
                assert_eq!(payload.old_text.as_deref(), Some("a\nc"));
                assert_eq!(payload.new_text.as_deref(), Some("b\nd"));
            }
            other => panic!("Expected edit ToolResult, got {other:?}"),
        }
    }

    #[test]
    fn failed_edit_keeps_error_text() {
        let records = contents(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"e1","name":"Edit","input":{"old_string":"a","new_string":"b"}}]}}
{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"e1","is_error":true,"content":"String not found"}]}}"#,
        );

        match &records[1] {
            Content::ToolResult(result) => {
                assert!(result.is_error);
                assert_eq!(result.output, ToolOutput::Text("String not found".into()));
            }
            other => panic!("Expected ToolResult, got {other:?}"),
        }
    }

    #[test]
    fn unknown_items_are_kept() {
        let records = contents(
            r#"{"type":"user","message":{"content":[{"type":"image","source":{"media_type":"image/png","data":"AAAA"}},{"type":"mystery","x":1}]}}"#,
        );

        assert_eq!(
            records[0],
            Content::Unknown {
                kind: "image".into(),
                text: "[image: image/png]".into(),
            }
        );
        match &records[1] {
            Content::Unknown { kind, text } => {
                assert_eq!(kind, "mystery");
                assert!(text.contains("\"x\": 1"));
            }
            other => panic!("Expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn tool_use_without_name_is_unknown_tool() {
        let records = contents(
            r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t"}]}}"#,
        );

        match &records[0] {
            Content::ToolCall(call) => {
                assert_eq!(call.tool_name, "Unknown");
                assert!(call.parameters.is_empty());
            }
            other => panic!("Expected ToolCall, got {other:?}"),
        }
    }
}
